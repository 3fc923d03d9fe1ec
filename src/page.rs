//! The page the controller drives.
//!
//! `Page` is the DOM contract: a browser binding, the terminal driver and the
//! test doubles all implement it. Methods take `&self`; implementations keep
//! their own interior mutability.

use crate::models::{CountAction, SelectedFile};
use std::collections::BTreeMap;

pub const ADD_MARKER_CLASS: &str = "add-pos-btn";
pub const REMOVE_MARKER_CLASS: &str = "remove-pos-btn";
pub const POSITION_DATA_KEY: &str = "position";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    UploadButton,
    FileInput,
    StatusMessage,
    DateInput,
    GoButton,
    LaborBoardGrid,
}

impl Handle {
    pub const REQUIRED: [Handle; 6] = [
        Handle::UploadButton,
        Handle::FileInput,
        Handle::StatusMessage,
        Handle::DateInput,
        Handle::GoButton,
        Handle::LaborBoardGrid,
    ];

    pub fn selector(self) -> &'static str {
        match self {
            Handle::UploadButton => "#upload-button",
            Handle::FileInput => "#file-upload",
            Handle::StatusMessage => "#status-message",
            Handle::DateInput => "#date-input",
            Handle::GoButton => "#go-button",
            Handle::LaborBoardGrid => ".labor-board-grid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Black,
    Green,
    Red,
}

impl StatusColor {
    pub fn css(self) -> &'static str {
        match self {
            StatusColor::Black => "black",
            StatusColor::Green => "green",
            StatusColor::Red => "red",
        }
    }
}

pub trait Page: Send + Sync {
    fn has_element(&self, handle: Handle) -> bool;

    /// First file of the file input, if any.
    fn selected_file(&self) -> Option<SelectedFile>;

    /// Current value of the date input.
    fn date_value(&self) -> String;

    fn set_status(&self, text: &str, color: StatusColor);

    fn reload(&self);

    /// Replaces the page with `location`, a root-relative URL.
    fn navigate(&self, location: &str);
}

/// The element a click inside the labor-board grid landed on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickTarget {
    pub classes: Vec<String>,
    pub dataset: BTreeMap<String, String>,
}

impl ClickTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dataset.insert(key.into(), value.into());
        self
    }

    /// Grid button for `position` carrying the marker class for `action`.
    pub fn count_button(position: impl Into<String>, action: CountAction) -> Self {
        let class = match action {
            CountAction::Add => ADD_MARKER_CLASS,
            CountAction::Remove => REMOVE_MARKER_CLASS,
        };
        Self::new()
            .with_class(class)
            .with_data(POSITION_DATA_KEY, position)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.dataset.get(key).map(String::as_str)
    }
}

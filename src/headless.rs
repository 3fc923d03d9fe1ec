//! In-memory page used by the command-line driver and the tests.

use crate::models::SelectedFile;
use crate::page::{Handle, Page, StatusColor};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Default)]
struct Inner {
    missing: HashSet<Handle>,
    file: Option<SelectedFile>,
    date: String,
    statuses: Vec<(String, StatusColor)>,
    reloads: usize,
    navigations: Vec<String>,
}

#[derive(Default)]
pub struct HeadlessPage {
    inner: Mutex<Inner>,
}

impl HeadlessPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date(self, date: impl Into<String>) -> Self {
        self.set_date(date);
        self
    }

    pub fn with_file(self, file: SelectedFile) -> Self {
        self.set_file(Some(file));
        self
    }

    /// Drops `handle` from the page, as if the markup never rendered it.
    pub fn without(self, handle: Handle) -> Self {
        self.lock().missing.insert(handle);
        self
    }

    pub fn set_date(&self, date: impl Into<String>) {
        self.lock().date = date.into();
    }

    pub fn set_file(&self, file: Option<SelectedFile>) {
        self.lock().file = file;
    }

    /// Latest status text and color.
    pub fn status(&self) -> Option<(String, StatusColor)> {
        self.lock().statuses.last().cloned()
    }

    pub fn status_history(&self) -> Vec<(String, StatusColor)> {
        self.lock().statuses.clone()
    }

    pub fn reload_count(&self) -> usize {
        self.lock().reloads
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    /// Where the page currently points, if it navigated away.
    pub fn location(&self) -> Option<String> {
        self.lock().navigations.last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Page for HeadlessPage {
    fn has_element(&self, handle: Handle) -> bool {
        !self.lock().missing.contains(&handle)
    }

    fn selected_file(&self) -> Option<SelectedFile> {
        self.lock().file.clone()
    }

    fn date_value(&self) -> String {
        self.lock().date.clone()
    }

    fn set_status(&self, text: &str, color: StatusColor) {
        debug!(color = color.css(), "status: {text}");
        self.lock().statuses.push((text.to_string(), color));
    }

    fn reload(&self) {
        debug!("page reload requested");
        self.lock().reloads += 1;
    }

    fn navigate(&self, location: &str) {
        debug!("navigating to {location}");
        self.lock().navigations.push(location.to_string());
    }
}

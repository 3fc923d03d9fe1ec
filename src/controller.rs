use crate::api::LaborBoardApi;
use crate::config::ClientConfig;
use crate::errors::{ApiError, AttachError};
use crate::models::{Assignment, CountAction, MessageResponse, PositionCountRequest};
use crate::page::{
    ADD_MARKER_CLASS, ClickTarget, Handle, POSITION_DATA_KEY, Page, REMOVE_MARKER_CLASS,
    StatusColor,
};
use crate::state::{ActionKind, InFlight};
use reqwest::StatusCode;
use std::fmt;
use tracing::{debug, error, info, warn};

pub const NO_FILE_MESSAGE: &str = "Please select a file to upload.";
pub const UPLOADING_MESSAGE: &str = "Uploading...";
pub const UPLOAD_FAILED_MESSAGE: &str = "An error occurred during the upload.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    UploadClicked,
    GoClicked,
    GridClicked(ClickTarget),
}

/// What an action did. Failures are already reported on the page when this is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The event did not concern the controller, or a required value was empty.
    Ignored,
    NoFileSelected,
    Navigated(String),
    Completed { message: String, reloaded: bool },
    Rejected { status: u16, message: String },
    Failed(String),
    Cancelled,
    /// Refused because a request of the same kind was still in flight.
    Busy,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ActionOutcome::Completed { .. } | ActionOutcome::Navigated(_)
        )
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Ignored => f.write_str("nothing to do"),
            ActionOutcome::NoFileSelected => f.write_str(NO_FILE_MESSAGE),
            ActionOutcome::Navigated(location) => write!(f, "navigated to {location}"),
            ActionOutcome::Completed { message, .. } => f.write_str(message),
            ActionOutcome::Rejected { status, message } => {
                write!(f, "rejected ({status}): {message}")
            }
            ActionOutcome::Failed(detail) => write!(f, "request failed: {detail}"),
            ActionOutcome::Cancelled => f.write_str("request cancelled"),
            ActionOutcome::Busy => f.write_str("a request of this kind is already in flight"),
        }
    }
}

pub struct PageController<P> {
    page: P,
    api: LaborBoardApi,
    config: ClientConfig,
    inflight: InFlight,
}

impl<P: Page> PageController<P> {
    /// Binds to `page`, which must provide every handle in [`Handle::REQUIRED`].
    pub fn attach(page: P, config: ClientConfig) -> Result<Self, AttachError> {
        if let Some(missing) = Handle::REQUIRED
            .into_iter()
            .find(|handle| !page.has_element(*handle))
        {
            return Err(AttachError::MissingElement(missing));
        }

        let api = LaborBoardApi::new(&config)?;
        debug!("controller attached to board at {}", api.base_url());

        Ok(Self {
            page,
            api,
            config,
            inflight: InFlight::new(),
        })
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn api(&self) -> &LaborBoardApi {
        &self.api
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn dispatch(&self, event: PageEvent) -> ActionOutcome {
        match event {
            PageEvent::UploadClicked => self.upload().await,
            PageEvent::GoClicked => self.navigate(),
            PageEvent::GridClicked(target) => self.handle_grid_click(&target).await,
        }
    }

    pub async fn upload(&self) -> ActionOutcome {
        let Some(file) = self.page.selected_file() else {
            self.page.set_status(NO_FILE_MESSAGE, StatusColor::Red);
            return ActionOutcome::NoFileSelected;
        };

        let Some(ticket) = self
            .inflight
            .begin(ActionKind::Upload, self.config.duplicate_policy)
        else {
            debug!("upload already in flight, ignoring click");
            return ActionOutcome::Busy;
        };

        self.page.set_status(UPLOADING_MESSAGE, StatusColor::Black);

        let Some(result) = ticket.guard(self.api.upload_file(file)).await else {
            debug!("upload cancelled");
            return ActionOutcome::Cancelled;
        };

        match self.judge(result) {
            Ok(response) => {
                self.page.set_status(
                    &format!("Success: {}", response.message),
                    StatusColor::Green,
                );
                self.page.reload();
                ActionOutcome::Completed {
                    message: response.message,
                    reloaded: true,
                }
            }
            Err(ApiError::Rejected { status, message }) => {
                self.page
                    .set_status(&format!("Error: {message}"), StatusColor::Red);
                ActionOutcome::Rejected {
                    status: status.as_u16(),
                    message,
                }
            }
            Err(err) => {
                self.page
                    .set_status(UPLOAD_FAILED_MESSAGE, StatusColor::Red);
                error!("Error: {err}");
                ActionOutcome::Failed(err.to_string())
            }
        }
    }

    pub fn navigate(&self) -> ActionOutcome {
        let date = self.page.date_value();
        if date.is_empty() {
            return ActionOutcome::Ignored;
        }

        let location = self.api.board_location(&date);
        self.page.navigate(&location);
        ActionOutcome::Navigated(location)
    }

    pub async fn handle_grid_click(&self, target: &ClickTarget) -> ActionOutcome {
        let action = if target.has_class(ADD_MARKER_CLASS) {
            CountAction::Add
        } else if target.has_class(REMOVE_MARKER_CLASS) {
            CountAction::Remove
        } else {
            return ActionOutcome::Ignored;
        };

        let Some(position) = target.data(POSITION_DATA_KEY) else {
            warn!("{action} button without data-{POSITION_DATA_KEY}, ignoring click");
            return ActionOutcome::Ignored;
        };

        let request = PositionCountRequest {
            position: position.to_string(),
            action,
        };

        let Some(ticket) = self
            .inflight
            .begin(ActionKind::PositionCount, self.config.duplicate_policy)
        else {
            debug!("count update already in flight, ignoring click");
            return ActionOutcome::Busy;
        };

        let Some(result) = ticket
            .guard(self.api.update_position_count(&request))
            .await
        else {
            debug!("count update for {} cancelled", request.position);
            return ActionOutcome::Cancelled;
        };

        match self.judge(result) {
            Ok(response) => {
                info!("{}", response.message);
                self.page.reload();
                ActionOutcome::Completed {
                    message: response.message,
                    reloaded: true,
                }
            }
            Err(ApiError::Rejected { status, message }) => {
                error!("Failed to update position count: {message}");
                ActionOutcome::Rejected {
                    status: status.as_u16(),
                    message,
                }
            }
            Err(err) => {
                error!("An error occurred during count update: {err}");
                ActionOutcome::Failed(err.to_string())
            }
        }
    }

    /// Assigns `associate` to `position` on the date currently selected on the page.
    pub async fn update_position(&self, position: &str, associate: &str) -> ActionOutcome {
        let assignment = Assignment {
            date: self.page.date_value(),
            position: position.to_string(),
            associate: associate.to_string(),
        };

        let Some(ticket) = self
            .inflight
            .begin(ActionKind::Assignment, self.config.duplicate_policy)
        else {
            debug!("assignment already in flight, ignoring call");
            return ActionOutcome::Busy;
        };

        let Some(result) = ticket.guard(self.api.update_position(&assignment)).await else {
            debug!("assignment of {position} cancelled");
            return ActionOutcome::Cancelled;
        };

        match self.judge(result) {
            Ok(response) => {
                info!("Updated {position} with {associate}");
                let reloaded = self.config.reload_after_assignment;
                if reloaded {
                    self.page.reload();
                }
                ActionOutcome::Completed {
                    message: response.message,
                    reloaded,
                }
            }
            Err(ApiError::Rejected { status, message }) => {
                error!("Failed to update position: {message}");
                ActionOutcome::Rejected {
                    status: status.as_u16(),
                    message,
                }
            }
            Err(err) => {
                error!("An error occurred during position update: {err}");
                ActionOutcome::Failed(err.to_string())
            }
        }
    }

    /// Cancels every in-flight request of `kind`.
    pub fn cancel(&self, kind: ActionKind) -> usize {
        let cancelled = self.inflight.cancel(kind);
        if cancelled > 0 {
            debug!("cancelled {cancelled} {kind:?} request(s)");
        }
        cancelled
    }

    pub fn in_flight(&self, kind: ActionKind) -> usize {
        self.inflight.in_flight(kind)
    }

    fn judge(
        &self,
        result: Result<MessageResponse, ApiError>,
    ) -> Result<MessageResponse, ApiError> {
        match result {
            Ok(response) if self.config.honor_body_status && response.reports_error() => {
                Err(ApiError::rejected(StatusCode::OK, response.message))
            }
            other => other,
        }
    }
}

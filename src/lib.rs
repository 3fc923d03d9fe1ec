pub mod api;
pub mod config;
pub mod controller;
pub mod errors;
pub mod headless;
pub mod models;
pub mod page;
pub mod state;

pub use api::LaborBoardApi;
pub use config::{ClientConfig, DuplicatePolicy};
pub use controller::{ActionOutcome, PageController, PageEvent};
pub use headless::HeadlessPage;
pub use page::{ClickTarget, Handle, Page, StatusColor};
pub use state::ActionKind;

//! Application wiring for tabstate.
//!
//! [`AppStore`] is the composition root: it seeds the application's state
//! schema, restores what earlier sessions persisted, and keeps the tree in
//! step with storage and with other contexts sharing it. [`init_tracing`]
//! sets up logging for binaries.

mod app;
mod config;
mod error;
mod logging;

pub use app::{AppStore, default_state};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use logging::init_tracing;

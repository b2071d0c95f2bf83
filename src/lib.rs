pub mod browser;
pub mod config;
pub mod core;
pub mod utils;

// re-export the ergonomic entry points
pub use crate::browser::driver::{PanelDriver, SessionCookie, WaitOutcome};
pub use crate::config::settings::Settings;
pub use crate::core::runner::{BatchRunner, RunSummary};

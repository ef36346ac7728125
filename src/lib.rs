//! Launchpad Indicator - a focus-aware status indicator for pull requests
//!
//! This library polls a categorized pull request feed on a focus-aware
//! schedule, renders a status display from it, and toggles inline
//! annotations, all driven by events from a hosting application.

pub mod annotations;
pub mod api;
pub mod config;
pub mod error;
pub mod indicator;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::{Config, ConfigStore, IndicatorSettings};
pub use error::{IndicatorError, IndicatorResult};
pub use indicator::{Indicator, IndicatorAction, RenderOutput};
pub use state::{AppState, IndicatorState};
pub use utils::signals::shutdown_signal;

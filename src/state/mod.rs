//! State management module
//!
//! Indicator state, the items it renders, and the shared state handed to
//! the HTTP layer.

pub mod app_state;
pub mod indicator_state;

// Re-export main types
pub use app_state::AppState;
pub use indicator_state::{Category, IndicatorState, IntegrationId, LaunchpadItem, LaunchpadSnapshot};

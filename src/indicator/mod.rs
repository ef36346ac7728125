//! Launchpad indicator module
//!
//! State machine, refresh scheduling, focus compensation and rendering for
//! the status indicator.

pub mod actions;
pub mod compensator;
pub mod controller;
pub mod render;
pub mod scheduler;
pub mod surface;

// Re-export main types
pub use actions::{ActionOutcome, Confirm, IndicatorAction, Preconfirmed};
pub use compensator::{compensated_delay, FocusPause, LOADING_RESUME_DELAY};
pub use controller::{Indicator, IndicatorStatus};
pub use render::{render, IndicatorColor, RenderOutput};
pub use scheduler::{RefreshScheduler, SchedulerTick};
pub use surface::{DisplaySurface, PresentationSurface, SurfaceSnapshot};

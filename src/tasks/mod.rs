//! Background tasks module
//!
//! This module contains the indicator event loop that runs alongside the
//! HTTP server.

pub mod indicator_loop;

// Re-export main items
pub use indicator_loop::{indicator_task, HostEvent, IndicatorChannels};

//! Utility functions module
//!
//! Process-level helpers for the indicator host.

pub mod signals;

pub use signals::shutdown_signal;

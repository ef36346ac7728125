//! Error types shared across the indicator

use std::path::PathBuf;

use thiserror::Error;

use crate::state::IntegrationId;

/// Failures surfaced by the library. Event handlers never return these;
/// they log and carry on. Only setup paths and command invocations do.
#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("failed to read settings from {path}: {source}")]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings in {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write settings to {path}: {message}")]
    SettingsWrite { path: PathBuf, message: String },

    #[error("unknown integration: {0}")]
    UnknownIntegration(String),

    #[error("integration {0} is not available")]
    IntegrationUnavailable(IntegrationId),

    #[error("indicator event loop is no longer running")]
    LoopClosed,

    #[error("failed to lock {0}")]
    Lock(&'static str),
}

pub type IndicatorResult<T> = Result<T, IndicatorError>;

//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    indicator::{ActionOutcome, IndicatorStatus, SurfaceSnapshot},
    state::IntegrationId,
};

/// Response for endpoints that deliver an event to the indicator
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub indicator: IndicatorStatus,
}

impl ApiResponse {
    pub fn new(status: &str, message: String, indicator: IndicatorStatus) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            indicator,
        }
    }

    /// The event was handed to the indicator loop
    pub fn accepted(message: String, indicator: IndicatorStatus) -> Self {
        Self::new("accepted", message, indicator)
    }

    /// The request was applied directly
    pub fn ok(message: String, indicator: IndicatorStatus) -> Self {
        Self::new("ok", message, indicator)
    }
}

/// Full indicator status with what the surface currently shows
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub indicator: IndicatorStatus,
    pub display: SurfaceSnapshot,
    pub connected: Vec<IntegrationId>,
    pub annotated: Vec<String>,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub command: String,
    pub outcome: ActionOutcome,
    pub timestamp: DateTime<Utc>,
}

impl CommandResponse {
    pub fn new(command: &str, outcome: ActionOutcome) -> Self {
        Self {
            command: command.to_string(),
            outcome,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotationResponse {
    pub document: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FocusRequest {
    pub focused: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HideRequest {
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationRequest {
    pub document: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{
    config::{IndicatorSettings, SettingsPatch},
    error::IndicatorError,
    indicator::IndicatorAction,
    state::{AppState, IntegrationId, LaunchpadItem},
};

use super::responses::{
    AnnotationRequest, AnnotationResponse, ApiResponse, CommandResponse, FocusRequest,
    HealthResponse, HideRequest, StatusResponse,
};

fn status_for(err: &IndicatorError) -> StatusCode {
    match err {
        IndicatorError::UnknownIntegration(_) => StatusCode::BAD_REQUEST,
        IndicatorError::IntegrationUnavailable(_) => StatusCode::CONFLICT,
        IndicatorError::LoopClosed => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Handle GET /status - Return indicator status and current display
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        indicator: state.status(),
        display: state.display(),
        connected: state.integrations.connected(),
        annotated: state.annotations.annotated(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Handle POST /focus - Host window focus changed
pub async fn focus_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FocusRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    state.set_focus(request.focused).map_err(|e| {
        error!("Failed to deliver focus change: {}", e);
        status_for(&e)
    })?;

    Ok(Json(ApiResponse::accepted(
        format!("Window {}", if request.focused { "focused" } else { "unfocused" }),
        state.status(),
    )))
}

/// Handle GET /settings
pub async fn get_settings_handler(State(state): State<Arc<AppState>>) -> Json<IndicatorSettings> {
    Json(state.config.current())
}

/// Handle PATCH /settings - Partial settings update
pub async fn patch_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<IndicatorSettings>, StatusCode> {
    match state.config.update(|settings| patch.apply(settings)) {
        Ok(settings) => Ok(Json(settings)),
        Err(e) => {
            error!("Failed to update settings: {}", e);
            Err(status_for(&e))
        }
    }
}

/// Handle GET /feed - Return the items the next refresh will serve
pub async fn get_feed_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LaunchpadItem>>, StatusCode> {
    state.feed.items().map(Json).map_err(|e| {
        error!("Failed to read feed: {}", e);
        status_for(&e)
    })
}

/// Handle PUT /feed - Replace the items served by the next refresh
pub async fn feed_handler(
    State(state): State<Arc<AppState>>,
    Json(items): Json<Vec<LaunchpadItem>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let count = items.len();
    state.feed.set_items(items).map_err(|e| {
        error!("Failed to replace feed: {}", e);
        status_for(&e)
    })?;

    Ok(Json(ApiResponse::ok(
        format!("Feed replaced with {} items", count),
        state.status(),
    )))
}

/// Handle POST /integrations/:integration/disconnect
pub async fn disconnect_handler(
    State(state): State<Arc<AppState>>,
    Path(integration): Path<IntegrationId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.integrations.disconnect(integration) {
        Ok(changed) => {
            info!("Disconnect requested for {} (changed={})", integration, changed);
            Ok(Json(ApiResponse::ok(
                format!("{} disconnected", integration),
                state.status(),
            )))
        }
        Err(e) => {
            error!("Failed to disconnect {}: {}", integration, e);
            Err(status_for(&e))
        }
    }
}

async fn run_command(
    state: &AppState,
    action: IndicatorAction,
    confirmed: bool,
) -> Result<Json<CommandResponse>, StatusCode> {
    match state.dispatch(action, confirmed).await {
        Ok(outcome) => Ok(Json(CommandResponse::new(action.command_id(), outcome))),
        Err(e) => {
            warn!("Command {} failed: {}", action.command_id(), e);
            Err(status_for(&e))
        }
    }
}

/// Handle POST /commands/hide - Hide the indicator once confirmed
pub async fn hide_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HideRequest>,
) -> Result<Json<CommandResponse>, StatusCode> {
    run_command(&state, IndicatorAction::Hide, request.confirmed).await
}

/// Handle POST /commands/connect/:integration
pub async fn connect_handler(
    State(state): State<Arc<AppState>>,
    Path(integration): Path<IntegrationId>,
) -> Result<Json<CommandResponse>, StatusCode> {
    run_command(&state, IndicatorAction::Connect { integration }, true).await
}

/// Handle POST /commands/refresh
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CommandResponse>, StatusCode> {
    run_command(&state, IndicatorAction::Refresh, true).await
}

/// Handle POST /annotations/toggle
pub async fn annotations_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnnotationRequest>,
) -> Result<Json<AnnotationResponse>, StatusCode> {
    let document = request.document;
    match state.toggle_annotations(document.clone()).await {
        Ok(enabled) => Ok(Json(AnnotationResponse { document, enabled })),
        Err(e) => {
            error!("Failed to toggle annotations: {}", e);
            Err(status_for(&e))
        }
    }
}

//! HTTP API module
//!
//! The host surface: delivers focus, settings, feed and command events to
//! the indicator and exposes what it currently displays.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .route("/focus", post(focus_handler))
        .route("/settings", get(get_settings_handler).patch(patch_settings_handler))
        .route("/feed", get(get_feed_handler).put(feed_handler))
        .route("/integrations/:integration/disconnect", post(disconnect_handler))
        .route("/commands/hide", post(hide_handler))
        .route("/commands/connect/:integration", post(connect_handler))
        .route("/commands/refresh", post(refresh_handler))
        .route("/annotations/toggle", post(annotations_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

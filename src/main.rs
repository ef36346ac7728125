//! Launchpad Indicator - a focus-aware status indicator for pull requests
//!
//! This is the main entry point: it hosts the indicator behind an HTTP
//! surface that delivers host events and exposes the rendered display.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use launchpad_indicator::{
    api::create_router,
    config::{Config, ConfigStore, IndicatorSettings},
    services::IntegrationRegistry,
    state::AppState,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "launchpad_indicator={},tower_http=info",
            config.log_level()
        ))
        .init();

    info!("Starting launchpad-indicator v{}", env!("CARGO_PKG_VERSION"));

    let mut settings = match &config.settings {
        Some(path) => ConfigStore::load(path)?,
        None => IndicatorSettings::default(),
    };
    config.apply_overrides(&mut settings);
    info!(
        "Configuration: host={}, port={}, polling={}, interval={}min",
        config.host,
        config.port,
        settings.polling_active(),
        settings.polling.interval_minutes
    );

    let store = Arc::new(ConfigStore::new(settings, config.settings.clone()));
    let integrations = Arc::new(IntegrationRegistry::default());
    for integration in &config.connect {
        if let Err(e) = integrations.connect(*integration) {
            warn!("Could not connect {} on startup: {}", integration, e);
        }
    }

    let state = AppState::launch(store, integrations, config.port, config.host.clone());
    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Indicator host running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET   /status                        - Indicator state and display");
    info!("  POST  /focus                         - Host window focus changed");
    info!("  GET   /settings, PATCH /settings     - Read or change settings");
    info!("  PUT   /feed                          - Replace feed items");
    info!("  POST  /commands/{{hide,refresh}}       - Indicator commands");
    info!("  POST  /commands/connect/:integration - Connect an integration");
    info!("  POST  /annotations/toggle            - Toggle inline annotations");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown().await;

    info!("Indicator host shutdown complete");
    Ok(())
}

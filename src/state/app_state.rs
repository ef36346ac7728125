//! Shared application state for the HTTP host

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{info, warn};

use crate::{
    annotations::{AnnotationProvider, AnnotationToggle, InlineAnnotations},
    config::ConfigStore,
    error::{IndicatorError, IndicatorResult},
    indicator::{
        ActionOutcome, DisplaySurface, Indicator, IndicatorAction, IndicatorStatus,
        RefreshScheduler, SurfaceSnapshot,
    },
    services::{DataProvider, FeedProvider, IntegrationRegistry},
    tasks::{indicator_task, HostEvent, IndicatorChannels},
};

/// Handles the HTTP layer uses to talk to the indicator loop
#[derive(Debug)]
pub struct AppState {
    pub config: Arc<ConfigStore>,
    pub feed: Arc<FeedProvider>,
    pub integrations: Arc<IntegrationRegistry>,
    pub annotations: InlineAnnotations,
    /// Events for the indicator loop
    pub events_tx: mpsc::UnboundedSender<HostEvent>,
    pub status_rx: watch::Receiver<IndicatorStatus>,
    pub display_rx: watch::Receiver<SurfaceSnapshot>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last command tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    /// Wire the indicator together and spawn its event loop
    pub fn launch(
        config: Arc<ConfigStore>,
        integrations: Arc<IntegrationRegistry>,
        port: u16,
        host: String,
    ) -> Arc<Self> {
        let feed = Arc::new(FeedProvider::new(Arc::clone(&integrations)));
        let (events_tx, host_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(IndicatorStatus::default());
        let (surface, display_rx) = DisplaySurface::new();

        let channels = IndicatorChannels {
            host_rx,
            tick_rx,
            settings_rx: config.subscribe(),
            refresh_rx: feed.subscribe(),
            connection_rx: integrations.subscribe(),
            status_tx,
        };

        let provider: Arc<dyn DataProvider> = feed.clone();
        let indicator = Indicator::new(
            Arc::clone(&config),
            provider,
            Some(Box::new(surface)),
            RefreshScheduler::new(tick_tx),
        );

        let annotations = InlineAnnotations::new();
        let factory_annotations = annotations.clone();
        let toggle = AnnotationToggle::new(
            Box::new(move || -> Box<dyn AnnotationProvider> { Box::new(factory_annotations) }),
            config.current().annotations.enabled,
        );

        let loop_handle = tokio::spawn(indicator_task(indicator, toggle, channels));

        Arc::new(Self {
            config,
            feed,
            integrations,
            annotations,
            events_tx,
            status_rx,
            display_rx,
            loop_handle: Mutex::new(Some(loop_handle)),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        })
    }

    fn send(&self, event: HostEvent) -> IndicatorResult<()> {
        self.events_tx.send(event).map_err(|_| IndicatorError::LoopClosed)
    }

    pub fn set_focus(&self, focused: bool) -> IndicatorResult<()> {
        self.send(HostEvent::FocusChanged(focused))
    }

    /// Run a command on the indicator loop and wait for its outcome
    pub async fn dispatch(
        &self,
        action: IndicatorAction,
        confirmed: bool,
    ) -> IndicatorResult<ActionOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(HostEvent::Action {
            action,
            confirmed,
            reply,
        })?;

        let outcome = rx.await.map_err(|_| IndicatorError::LoopClosed)??;
        self.record_action(action.command_id());
        info!("Command {} completed: {:?}", action.command_id(), outcome);
        Ok(outcome)
    }

    pub async fn toggle_annotations(&self, document: String) -> IndicatorResult<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(HostEvent::ToggleAnnotations { document, reply })?;
        rx.await.map_err(|_| IndicatorError::LoopClosed)
    }

    /// Ask the loop to dispose the indicator and wait for it to stop
    pub async fn shutdown(&self) {
        if self.send(HostEvent::Shutdown).is_err() {
            warn!("Indicator loop already stopped");
        }

        let handle = self.loop_handle.lock().ok().and_then(|mut handle| handle.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Indicator loop ended abnormally: {}", e);
            }
        }
    }

    pub fn status(&self) -> IndicatorStatus {
        self.status_rx.borrow().clone()
    }

    pub fn display(&self) -> SurfaceSnapshot {
        self.display_rx.borrow().clone()
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Get last command information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Calculate host uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

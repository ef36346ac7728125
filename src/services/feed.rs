//! In-memory notification feed backing the indicator

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    error::{IndicatorError, IndicatorResult},
    state::{IntegrationId, LaunchpadItem, LaunchpadSnapshot},
};

use super::{integrations::IntegrationRegistry, provider::DataProvider};

#[derive(Debug, Default)]
struct FeedInner {
    items: Vec<LaunchpadItem>,
    /// Last snapshot handed out; reused by non-forced refreshes
    cached: Option<LaunchpadSnapshot>,
}

/// Provider whose items are pushed in by the host
#[derive(Debug)]
pub struct FeedProvider {
    integrations: Arc<IntegrationRegistry>,
    inner: Mutex<FeedInner>,
    refresh_tx: broadcast::Sender<LaunchpadSnapshot>,
}

impl FeedProvider {
    pub fn new(integrations: Arc<IntegrationRegistry>) -> Self {
        let (refresh_tx, _) = broadcast::channel(16);
        Self {
            integrations,
            inner: Mutex::new(FeedInner::default()),
            refresh_tx,
        }
    }

    /// Replace the feed contents. Picked up by the next refresh.
    pub fn set_items(&self, items: Vec<LaunchpadItem>) -> IndicatorResult<()> {
        let mut inner = self.inner.lock().map_err(|_| IndicatorError::Lock("feed"))?;
        info!("Feed replaced with {} items", items.len());
        inner.items = items;
        inner.cached = None;
        Ok(())
    }

    pub fn items(&self) -> IndicatorResult<Vec<LaunchpadItem>> {
        self.inner
            .lock()
            .map(|inner| inner.items.clone())
            .map_err(|_| IndicatorError::Lock("feed"))
    }

    fn snapshot(&self, force: bool) -> IndicatorResult<LaunchpadSnapshot> {
        let mut inner = self.inner.lock().map_err(|_| IndicatorError::Lock("feed"))?;

        if !force {
            if let Some(cached) = &inner.cached {
                debug!("Serving cached feed snapshot");
                return Ok(cached.clone());
            }
        }

        let snapshot = LaunchpadSnapshot::new(inner.items.clone());
        inner.cached = Some(snapshot.clone());
        Ok(snapshot)
    }
}

impl DataProvider for FeedProvider {
    fn has_connected_integration(&self) -> bool {
        self.integrations.any_connected()
    }

    fn request_refresh(&self, force: bool) {
        if !self.has_connected_integration() {
            debug!("Refresh requested with no connected integration, skipping");
            return;
        }

        match self.snapshot(force) {
            Ok(snapshot) => {
                debug!("Refresh completed with {} items (force={})", snapshot.items.len(), force);
                if self.refresh_tx.send(snapshot).is_err() {
                    debug!("No refresh subscribers");
                }
            }
            Err(e) => warn!("Feed refresh failed: {}", e),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<LaunchpadSnapshot> {
        self.refresh_tx.subscribe()
    }

    fn connect(&self, integration: IntegrationId) -> IndicatorResult<()> {
        self.integrations.connect(integration).map(|_| ())
    }
}

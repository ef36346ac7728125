//! Connection state of integrations

use std::{
    collections::HashSet,
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    error::{IndicatorError, IndicatorResult},
    state::IntegrationId,
};

/// Emitted whenever an integration connects or disconnects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionChange {
    pub integration: IntegrationId,
    pub connected: bool,
}

/// Tracks which integrations are connected and broadcasts changes
#[derive(Debug)]
pub struct IntegrationRegistry {
    available: HashSet<IntegrationId>,
    connected: Mutex<HashSet<IntegrationId>>,
    change_tx: broadcast::Sender<ConnectionChange>,
}

impl IntegrationRegistry {
    pub fn new(available: &[IntegrationId]) -> Self {
        let (change_tx, _) = broadcast::channel(32);
        Self {
            available: available.iter().copied().collect(),
            connected: Mutex::new(HashSet::new()),
            change_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionChange> {
        self.change_tx.subscribe()
    }

    pub fn connect(&self, integration: IntegrationId) -> IndicatorResult<bool> {
        if !self.available.contains(&integration) {
            return Err(IndicatorError::IntegrationUnavailable(integration));
        }
        self.set(integration, true)
    }

    pub fn disconnect(&self, integration: IntegrationId) -> IndicatorResult<bool> {
        self.set(integration, false)
    }

    fn set(&self, integration: IntegrationId, connected: bool) -> IndicatorResult<bool> {
        let mut set = self
            .connected
            .lock()
            .map_err(|_| IndicatorError::Lock("integrations"))?;

        let changed = if connected {
            set.insert(integration)
        } else {
            set.remove(&integration)
        };
        drop(set);

        if changed {
            info!(
                "Integration {} {}",
                integration,
                if connected { "connected" } else { "disconnected" }
            );
            // No subscribers is fine, nothing is listening yet
            let _ = self.change_tx.send(ConnectionChange {
                integration,
                connected,
            });
        }
        Ok(changed)
    }

    pub fn is_connected(&self, integration: IntegrationId) -> bool {
        match self.connected.lock() {
            Ok(set) => set.contains(&integration),
            Err(_) => {
                warn!("Failed to lock integrations");
                false
            }
        }
    }

    pub fn any_connected(&self) -> bool {
        match self.connected.lock() {
            Ok(set) => !set.is_empty(),
            Err(_) => {
                warn!("Failed to lock integrations");
                false
            }
        }
    }

    /// Connected integrations in a stable order
    pub fn connected(&self) -> Vec<IntegrationId> {
        IntegrationId::ALL
            .into_iter()
            .filter(|integration| self.is_connected(*integration))
            .collect()
    }
}

impl Default for IntegrationRegistry {
    fn default() -> Self {
        Self::new(&IntegrationId::ALL)
    }
}

//! Indicator event loop
//!
//! Every event that can change the indicator funnels through this task, so
//! handlers run to completion one at a time and never overlap.

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::{
    annotations::AnnotationToggle,
    config::IndicatorSettings,
    error::IndicatorResult,
    indicator::{ActionOutcome, Indicator, IndicatorAction, IndicatorStatus, Preconfirmed, SchedulerTick},
    services::ConnectionChange,
    state::LaunchpadSnapshot,
};

/// Events delivered by the host
#[derive(Debug)]
pub enum HostEvent {
    FocusChanged(bool),
    Action {
        action: IndicatorAction,
        confirmed: bool,
        reply: oneshot::Sender<IndicatorResult<ActionOutcome>>,
    },
    ToggleAnnotations {
        document: String,
        reply: oneshot::Sender<bool>,
    },
    Shutdown,
}

/// Receiving ends the loop listens on
pub struct IndicatorChannels {
    pub host_rx: mpsc::UnboundedReceiver<HostEvent>,
    pub tick_rx: mpsc::UnboundedReceiver<SchedulerTick>,
    pub settings_rx: watch::Receiver<IndicatorSettings>,
    pub refresh_rx: broadcast::Receiver<LaunchpadSnapshot>,
    pub connection_rx: broadcast::Receiver<ConnectionChange>,
    pub status_tx: watch::Sender<IndicatorStatus>,
}

/// Run the indicator until the host shuts it down
pub async fn indicator_task(
    mut indicator: Indicator,
    mut annotations: AnnotationToggle,
    mut channels: IndicatorChannels,
) {
    info!("Starting indicator event loop");

    indicator.start();
    publish_status(&indicator, &channels.status_tx);

    loop {
        // Branches are polled top to bottom: host events (shutdown included)
        // come first and timer ticks last. Each channel keeps its own
        // delivery order.
        tokio::select! {
            biased;

            event = channels.host_rx.recv() => {
                match event {
                    Some(HostEvent::Shutdown) | None => {
                        info!("Indicator event loop shutting down");
                        break;
                    }
                    Some(event) => handle_host_event(&mut indicator, &mut annotations, event),
                }
            }

            changed = channels.settings_rx.changed() => {
                if changed.is_err() {
                    warn!("Settings store dropped, stopping indicator");
                    break;
                }
                let settings = channels.settings_rx.borrow_and_update().clone();
                annotations.on_settings_changed(&settings);
                indicator.on_settings_changed(settings);
            }

            result = channels.connection_rx.recv() => {
                match result {
                    Ok(change) => indicator.on_connection_changed(&change),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Missed {} connection changes, recomputing", skipped);
                        indicator.recompute();
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("Connection source closed");
                        break;
                    }
                }
            }

            result = channels.refresh_rx.recv() => {
                match result {
                    Ok(snapshot) => indicator.on_refresh_completed(snapshot),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Indicator lagged behind {} refresh results", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("Data provider closed its refresh channel");
                        break;
                    }
                }
            }

            Some(tick) = channels.tick_rx.recv() => {
                indicator.on_tick(tick);
            }
        }

        publish_status(&indicator, &channels.status_tx);
    }

    annotations.clear();
    indicator.dispose();
    publish_status(&indicator, &channels.status_tx);
    info!("Indicator event loop stopped");
}

fn handle_host_event(indicator: &mut Indicator, annotations: &mut AnnotationToggle, event: HostEvent) {
    match event {
        HostEvent::FocusChanged(focused) => {
            debug!("Window focus changed: {}", focused);
            indicator.on_focus_changed(focused);
        }
        HostEvent::Action {
            action,
            confirmed,
            reply,
        } => {
            let outcome = indicator.execute(action, &Preconfirmed(confirmed));
            if reply.send(outcome).is_err() {
                debug!("Caller went away before {} completed", action.command_id());
            }
        }
        HostEvent::ToggleAnnotations { document, reply } => {
            let enabled = annotations.toggle(&document);
            let _ = reply.send(enabled);
        }
        HostEvent::Shutdown => {}
    }
}

fn publish_status(indicator: &Indicator, status_tx: &watch::Sender<IndicatorStatus>) {
    // Receivers may all be gone during shutdown; the value is still kept
    status_tx.send_replace(indicator.status());
}

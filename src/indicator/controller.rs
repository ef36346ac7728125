//! Indicator state machine
//!
//! Owns the single state/timer pair. Every method runs on the indicator
//! event loop; nothing here is shared across tasks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    config::{ConfigStore, IndicatorSettings},
    error::IndicatorResult,
    services::{ConnectionChange, DataProvider},
    state::{IndicatorState, LaunchpadSnapshot},
};

use super::{
    actions::{ActionOutcome, Confirm, IndicatorAction},
    compensator::FocusPause,
    render::render,
    scheduler::{RefreshScheduler, SchedulerTick},
    surface::PresentationSurface,
};

const HIDE_PROMPT: &str =
    "Hide the launchpad indicator? You can show it again from the settings.";

/// Point-in-time view of the indicator for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorStatus {
    pub state: &'static str,
    pub focused: bool,
    pub timer_armed: bool,
    pub item_count: Option<usize>,
    pub last_refresh: Option<DateTime<Utc>>,
}

impl Default for IndicatorStatus {
    fn default() -> Self {
        Self {
            state: IndicatorState::Idle.name(),
            focused: true,
            timer_armed: false,
            item_count: None,
            last_refresh: None,
        }
    }
}

pub struct Indicator {
    state: IndicatorState,
    settings: IndicatorSettings,
    config: Arc<ConfigStore>,
    provider: Arc<dyn DataProvider>,
    surface: Option<Box<dyn PresentationSurface>>,
    scheduler: RefreshScheduler,
    pause: FocusPause,
    focused: bool,
    last_refresh: Option<DateTime<Utc>>,
}

impl Indicator {
    pub fn new(
        config: Arc<ConfigStore>,
        provider: Arc<dyn DataProvider>,
        surface: Option<Box<dyn PresentationSurface>>,
        scheduler: RefreshScheduler,
    ) -> Self {
        Self {
            state: IndicatorState::Idle,
            settings: config.current(),
            config,
            provider,
            surface,
            scheduler,
            pause: FocusPause::new(),
            focused: true,
            last_refresh: None,
        }
    }

    /// Initial state computation on startup
    pub fn start(&mut self) {
        info!("Starting launchpad indicator");
        if self.settings.enabled {
            if let Some(surface) = self.surface.as_mut() {
                surface.show();
            }
        }
        self.recompute();
        self.render();
    }

    pub fn state(&self) -> &IndicatorState {
        &self.state
    }

    pub fn is_timer_armed(&self) -> bool {
        self.scheduler.is_armed()
    }

    pub fn last_data_update(&self) -> Option<Instant> {
        self.pause.last_data_update()
    }

    pub fn status(&self) -> IndicatorStatus {
        IndicatorStatus {
            state: self.state.name(),
            focused: self.focused,
            timer_armed: self.scheduler.is_armed(),
            item_count: match &self.state {
                IndicatorState::Load(snapshot) => Some(snapshot.items.len()),
                _ => None,
            },
            last_refresh: self.last_refresh,
        }
    }

    pub fn on_settings_changed(&mut self, settings: IndicatorSettings) {
        let previous = std::mem::replace(&mut self.settings, settings);

        if previous.enabled != self.settings.enabled {
            if let Some(surface) = self.surface.as_mut() {
                if self.settings.enabled {
                    surface.show();
                } else {
                    surface.hide();
                }
            }
        }

        if previous.affects_polling(&self.settings) {
            debug!("Polling settings changed, recomputing indicator state");
            self.recompute();
            // Same-state recompute skips the rearm; the interval may differ
            if self.state.is_polling() {
                self.arm(None);
            }
        } else {
            self.render();
        }
    }

    pub fn on_connection_changed(&mut self, change: &ConnectionChange) {
        info!(
            "Connection state of {} changed (connected={})",
            change.integration, change.connected
        );
        self.recompute();
    }

    pub fn on_refresh_completed(&mut self, snapshot: LaunchpadSnapshot) {
        if !self.state.is_polling() || !self.settings.polling_active() {
            debug!("Ignoring refresh result in state {}", self.state.name());
            return;
        }

        self.pause.record_update(Instant::now());
        self.last_refresh = Some(snapshot.refreshed_at);
        self.transition(IndicatorState::Load(snapshot));
    }

    pub fn on_tick(&mut self, tick: SchedulerTick) {
        if !self.scheduler.is_current(&tick) {
            debug!("Dropping tick from cancelled timer {}", tick.generation);
            return;
        }
        debug!("Refresh timer fired, requesting refresh");
        self.provider.request_refresh(true);
    }

    pub fn on_focus_changed(&mut self, focused: bool) {
        if focused == self.focused {
            return;
        }
        self.focused = focused;

        if !focused {
            if self.state.is_polling() {
                self.scheduler.stop();
                self.pause.pause(Instant::now());
                debug!("Window unfocused, refresh timer paused");
            }
            return;
        }

        let loading = matches!(self.state, IndicatorState::Loading);
        let interval = self.settings.polling.interval();
        match self.pause.resume(loading, interval, Instant::now()) {
            Some(delay) => {
                self.scheduler.start(&self.settings, &self.state, Some(delay));
            }
            None => debug!("Window focused with no paused schedule"),
        }
    }

    pub fn execute(
        &mut self,
        action: IndicatorAction,
        confirm: &dyn Confirm,
    ) -> IndicatorResult<ActionOutcome> {
        match action {
            IndicatorAction::Hide => {
                if !confirm.confirm(HIDE_PROMPT) {
                    debug!("Hiding the indicator was declined");
                    return Ok(ActionOutcome::HideDeclined);
                }
                self.config.update(|settings| settings.enabled = false)?;
                info!("Launchpad indicator hidden");
                Ok(ActionOutcome::Hidden)
            }
            IndicatorAction::Connect { integration } => {
                info!("Connecting integration {}", integration);
                self.provider.connect(integration)?;
                Ok(ActionOutcome::ConnectRequested)
            }
            IndicatorAction::Refresh => {
                if !self.state.is_polling() {
                    debug!("Refresh requested in state {}, ignoring", self.state.name());
                    return Ok(ActionOutcome::Ignored);
                }
                self.provider.request_refresh(true);
                Ok(ActionOutcome::RefreshRequested)
            }
        }
    }

    /// Cancel the timer and release the surface
    pub fn dispose(&mut self) {
        self.scheduler.stop();
        if let Some(mut surface) = self.surface.take() {
            surface.dispose();
        }
        info!("Launchpad indicator disposed");
    }

    /// Derive the state from settings and connectivity
    pub fn recompute(&mut self) {
        let next = if !self.settings.polling_active() {
            IndicatorState::Idle
        } else if !self.provider.has_connected_integration() {
            IndicatorState::Disconnected
        } else {
            IndicatorState::Loading
        };
        self.transition(next);
    }

    fn transition(&mut self, next: IndicatorState) {
        let reload = matches!(next, IndicatorState::Load(_));
        if self.state.same_kind(&next) && !reload {
            debug!("Indicator already {}", next.name());
            return;
        }

        if !self.state.same_kind(&next) {
            info!("Indicator state: {} -> {}", self.state.name(), next.name());
        }
        self.state = next;
        self.render();

        if self.state.is_polling() {
            self.arm(None);
        } else {
            self.scheduler.stop();
            self.pause.clear_pause();
        }

        if matches!(self.state, IndicatorState::Loading) {
            self.provider.request_refresh(false);
        }
    }

    /// Arm the steady timer, or record a pause when the window is unfocused
    fn arm(&mut self, initial_delay: Option<std::time::Duration>) {
        if !self.focused {
            self.scheduler.stop();
            self.pause.pause(Instant::now());
            debug!("Window unfocused, deferring refresh timer until refocus");
            return;
        }
        self.scheduler.start(&self.settings, &self.state, initial_delay);
    }

    fn render(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            warn!("No presentation surface, skipping render");
            return;
        };
        surface.update(&render(&self.state, &self.settings));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Mutex,
        },
        time::Duration,
    };
    use tokio::sync::{broadcast, mpsc};

    use crate::{
        config::MAX_INTERVAL_MINUTES,
        indicator::{actions::Preconfirmed, render::RenderOutput},
        state::{Category, IntegrationId, LaunchpadItem},
    };

    #[derive(Default)]
    struct FakeProvider {
        connected: AtomicBool,
        refreshes: Mutex<Vec<bool>>,
    }

    impl FakeProvider {
        fn connected() -> Arc<Self> {
            let provider = Self::default();
            provider.connected.store(true, Ordering::SeqCst);
            Arc::new(provider)
        }

        fn refreshes(&self) -> Vec<bool> {
            self.refreshes.lock().unwrap().clone()
        }
    }

    impl DataProvider for FakeProvider {
        fn has_connected_integration(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        fn request_refresh(&self, force: bool) {
            self.refreshes.lock().unwrap().push(force);
        }

        fn subscribe(&self) -> broadcast::Receiver<LaunchpadSnapshot> {
            broadcast::channel(1).1
        }

        fn connect(&self, _integration: IntegrationId) -> IndicatorResult<()> {
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSurface {
        renders: Arc<Mutex<Vec<RenderOutput>>>,
        visible: Arc<AtomicBool>,
        disposed: Arc<AtomicBool>,
    }

    impl PresentationSurface for RecordingSurface {
        fn update(&mut self, output: &RenderOutput) {
            self.renders.lock().unwrap().push(output.clone());
        }
        fn show(&mut self) {
            self.visible.store(true, Ordering::SeqCst);
        }
        fn hide(&mut self) {
            self.visible.store(false, Ordering::SeqCst);
        }
        fn dispose(&mut self) {
            self.disposed.store(true, Ordering::SeqCst);
        }
    }

    struct Harness {
        indicator: Indicator,
        provider: Arc<FakeProvider>,
        surface: RecordingSurface,
        config: Arc<ConfigStore>,
        ticks: mpsc::UnboundedReceiver<SchedulerTick>,
    }

    fn harness(provider: Arc<FakeProvider>) -> Harness {
        let mut settings = IndicatorSettings::default();
        settings.polling.interval_minutes = 1;
        let config = Arc::new(ConfigStore::new(settings, None));
        let surface = RecordingSurface::default();
        let (tick_tx, ticks) = mpsc::unbounded_channel();
        let indicator = Indicator::new(
            Arc::clone(&config),
            provider.clone(),
            Some(Box::new(surface.clone())),
            RefreshScheduler::new(tick_tx),
        );
        Harness {
            indicator,
            provider,
            surface,
            config,
            ticks,
        }
    }

    fn snapshot(count: u64) -> LaunchpadSnapshot {
        LaunchpadSnapshot::new(
            (1..=count)
                .map(|number| LaunchpadItem {
                    repository: "acme/api".to_string(),
                    number,
                    title: "Tidy".to_string(),
                    category: Category::Mergeable,
                    url: None,
                })
                .collect(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_without_integration_is_disconnected() {
        let mut h = harness(Arc::new(FakeProvider::default()));
        h.indicator.start();

        assert_eq!(h.indicator.state(), &IndicatorState::Disconnected);
        assert!(!h.indicator.is_timer_armed());
        assert!(h.provider.refreshes().is_empty());
        assert!(h.surface.visible.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_connected_loads_and_arms() {
        let mut h = harness(FakeProvider::connected());
        h.indicator.start();

        assert_eq!(h.indicator.state(), &IndicatorState::Loading);
        assert!(h.indicator.is_timer_armed());
        assert_eq!(h.provider.refreshes(), vec![false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_disabled_is_idle() {
        let mut h = harness(FakeProvider::connected());
        h.config.update(|s| s.polling.enabled = false).unwrap();
        h.indicator.on_settings_changed(h.config.current());
        h.indicator.start();

        assert_eq!(h.indicator.state(), &IndicatorState::Idle);
        assert!(!h.indicator.is_timer_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_completion_moves_to_load_and_rerenders() {
        let mut h = harness(FakeProvider::connected());
        h.indicator.start();

        h.indicator.on_refresh_completed(snapshot(1));
        assert!(matches!(h.indicator.state(), IndicatorState::Load(_)));
        let renders_after_first = h.surface.renders.lock().unwrap().len();

        h.indicator.on_refresh_completed(snapshot(2));
        let renders = h.surface.renders.lock().unwrap();
        assert_eq!(renders.len(), renders_after_first + 1);
        assert!(renders.last().unwrap().tooltip.contains("2 pull requests can be merged"));
        assert_eq!(h.indicator.status().item_count, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_ignored_when_not_subscribed() {
        let mut h = harness(Arc::new(FakeProvider::default()));
        h.indicator.start();

        h.indicator.on_refresh_completed(snapshot(1));
        assert_eq!(h.indicator.state(), &IndicatorState::Disconnected);
        assert!(h.indicator.last_data_update().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_requests_forced_refresh() {
        let mut h = harness(FakeProvider::connected());
        h.indicator.start();

        let tick = h.ticks.recv().await.unwrap();
        h.indicator.on_tick(tick);
        assert_eq!(h.provider.refreshes(), vec![false, true]);

        h.indicator.on_tick(SchedulerTick { generation: 0 });
        assert_eq!(h.provider.refreshes().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refocus_compensates_for_unfocused_time() {
        let mut h = harness(FakeProvider::connected());
        h.indicator.start();
        h.indicator.on_refresh_completed(snapshot(1));

        tokio::time::advance(Duration::from_secs(5)).await;
        h.indicator.on_focus_changed(false);
        assert!(!h.indicator.is_timer_armed());

        tokio::time::advance(Duration::from_secs(5)).await;
        h.indicator.on_focus_changed(true);
        assert!(h.indicator.is_timer_armed());

        let resumed = Instant::now();
        h.ticks.recv().await.unwrap();
        assert_eq!(resumed.elapsed().as_secs(), 45);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refocus_after_long_pause_refreshes_immediately() {
        let mut h = harness(FakeProvider::connected());
        h.indicator.start();
        h.indicator.on_refresh_completed(snapshot(1));

        tokio::time::advance(Duration::from_secs(50)).await;
        h.indicator.on_focus_changed(false);
        tokio::time::advance(Duration::from_secs(20)).await;
        h.indicator.on_focus_changed(true);

        let resumed = Instant::now();
        h.ticks.recv().await.unwrap();
        assert_eq!(resumed.elapsed().as_secs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refocus_while_loading_uses_fixed_delay() {
        let mut h = harness(FakeProvider::connected());
        h.indicator.start();

        h.indicator.on_focus_changed(false);
        tokio::time::advance(Duration::from_secs(120)).await;
        h.indicator.on_focus_changed(true);

        let resumed = Instant::now();
        h.ticks.recv().await.unwrap();
        assert_eq!(resumed.elapsed().as_secs(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refocus_after_unfocus_while_disconnected_does_nothing() {
        let provider = Arc::new(FakeProvider::default());
        let mut h = harness(provider);
        h.indicator.start();

        h.indicator.on_focus_changed(false);
        tokio::time::advance(Duration::from_secs(30)).await;
        h.indicator.on_focus_changed(true);

        assert!(!h.indicator.is_timer_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_while_unfocused_defers_timer_to_refocus() {
        let provider = Arc::new(FakeProvider::default());
        let mut h = harness(provider.clone());
        h.indicator.start();
        h.indicator.on_focus_changed(false);

        provider.connected.store(true, Ordering::SeqCst);
        h.indicator.on_connection_changed(&ConnectionChange {
            integration: IntegrationId::GitHub,
            connected: true,
        });
        assert_eq!(h.indicator.state(), &IndicatorState::Loading);
        assert!(!h.indicator.is_timer_armed());

        h.indicator.on_focus_changed(true);
        assert!(h.indicator.is_timer_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_tears_down_timer() {
        let provider = FakeProvider::connected();
        let mut h = harness(provider.clone());
        h.indicator.start();
        assert!(h.indicator.is_timer_armed());

        provider.connected.store(false, Ordering::SeqCst);
        h.indicator.on_connection_changed(&ConnectionChange {
            integration: IntegrationId::GitHub,
            connected: false,
        });
        assert_eq!(h.indicator.state(), &IndicatorState::Disconnected);
        assert!(!h.indicator.is_timer_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cosmetic_settings_rerender_without_transition() {
        let mut h = harness(FakeProvider::connected());
        h.indicator.start();
        h.indicator.on_refresh_completed(snapshot(1));
        let refreshes = h.provider.refreshes().len();

        h.config.update(|s| s.use_colors = false).unwrap();
        h.indicator.on_settings_changed(h.config.current());

        assert!(matches!(h.indicator.state(), IndicatorState::Load(_)));
        assert_eq!(h.provider.refreshes().len(), refreshes);
        assert_eq!(h.surface.renders.lock().unwrap().last().unwrap().color, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_change_rearms_with_new_interval() {
        let mut h = harness(FakeProvider::connected());
        h.indicator.start();

        h.config.update(|s| s.polling.interval_minutes = 2).unwrap();
        h.indicator.on_settings_changed(h.config.current());

        let started = Instant::now();
        let tick = h.ticks.recv().await.unwrap();
        assert_eq!(started.elapsed().as_secs(), 120);
        h.indicator.on_tick(tick);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_interval_is_clamped_and_keeps_timer_armed() {
        let mut h = harness(FakeProvider::connected());
        h.indicator.start();
        h.indicator.on_refresh_completed(snapshot(1));

        let mut settings = h.config.current();
        settings.polling.interval_minutes = u64::MAX;
        h.indicator.on_settings_changed(settings);
        assert!(h.indicator.is_timer_armed());

        let started = Instant::now();
        let tick = h.ticks.recv().await.unwrap();
        assert_eq!(started.elapsed().as_secs(), MAX_INTERVAL_MINUTES * 60);
        h.indicator.on_tick(tick);
        assert!(h.indicator.is_timer_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refocus_after_unfocus_while_idle_does_nothing() {
        let mut h = harness(FakeProvider::connected());
        h.config.update(|s| s.polling.enabled = false).unwrap();
        h.indicator.on_settings_changed(h.config.current());
        h.indicator.start();
        assert_eq!(h.indicator.state(), &IndicatorState::Idle);

        h.indicator.on_focus_changed(false);
        tokio::time::advance(Duration::from_secs(30)).await;
        h.indicator.on_focus_changed(true);

        assert!(!h.indicator.is_timer_armed());
        assert!(h.provider.refreshes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_disabled_while_unfocused_prevents_rearm() {
        let mut h = harness(FakeProvider::connected());
        h.indicator.start();
        h.indicator.on_refresh_completed(snapshot(1));

        h.indicator.on_focus_changed(false);
        tokio::time::advance(Duration::from_secs(10)).await;

        h.config.update(|s| s.polling.enabled = false).unwrap();
        h.indicator.on_settings_changed(h.config.current());
        assert_eq!(h.indicator.state(), &IndicatorState::Idle);
        assert!(!h.indicator.is_timer_armed());

        tokio::time::advance(Duration::from_secs(10)).await;
        h.indicator.on_focus_changed(true);
        assert!(!h.indicator.is_timer_armed());

        tokio::time::advance(Duration::from_secs(600)).await;
        assert!(h.ticks.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hide_requires_confirmation() {
        let mut h = harness(FakeProvider::connected());
        h.indicator.start();

        let outcome = h
            .indicator
            .execute(IndicatorAction::Hide, &Preconfirmed(false))
            .unwrap();
        assert_eq!(outcome, ActionOutcome::HideDeclined);
        assert!(h.config.current().enabled);

        let outcome = h
            .indicator
            .execute(IndicatorAction::Hide, &Preconfirmed(true))
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Hidden);
        assert!(!h.config.current().enabled);

        h.indicator.on_settings_changed(h.config.current());
        assert_eq!(h.indicator.state(), &IndicatorState::Idle);
        assert!(!h.indicator.is_timer_armed());
        assert!(!h.surface.visible.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_action_only_while_polling() {
        let mut h = harness(Arc::new(FakeProvider::default()));
        h.indicator.start();

        let outcome = h
            .indicator
            .execute(IndicatorAction::Refresh, &Preconfirmed(true))
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Ignored);

        let outcome = h
            .indicator
            .execute(
                IndicatorAction::Connect {
                    integration: IntegrationId::GitHub,
                },
                &Preconfirmed(true),
            )
            .unwrap();
        assert_eq!(outcome, ActionOutcome::ConnectRequested);
        assert!(h.provider.has_connected_integration());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_cancels_timer_and_surface() {
        let mut h = harness(FakeProvider::connected());
        h.indicator.start();
        h.indicator.dispose();

        assert!(!h.indicator.is_timer_armed());
        assert!(h.surface.disposed.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_surface_is_a_no_op() {
        let mut settings = IndicatorSettings::default();
        settings.polling.interval_minutes = 1;
        let (tick_tx, _ticks) = mpsc::unbounded_channel();
        let mut indicator = Indicator::new(
            Arc::new(ConfigStore::new(settings, None)),
            FakeProvider::connected(),
            None,
            RefreshScheduler::new(tick_tx),
        );
        indicator.start();
        indicator.on_refresh_completed(snapshot(3));
        assert!(matches!(indicator.state(), IndicatorState::Load(_)));
    }
}

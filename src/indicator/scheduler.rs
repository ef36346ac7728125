//! Refresh scheduler owning the single live refresh timer

use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{interval_at, sleep, Instant, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::{config::IndicatorSettings, state::IndicatorState};

/// A timer firing, tagged with the generation of the timer that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTick {
    pub generation: u64,
}

/// Owns at most one armed timer. Ticks are sent into the indicator event
/// loop rather than acted on here.
#[derive(Debug)]
pub struct RefreshScheduler {
    tick_tx: mpsc::UnboundedSender<SchedulerTick>,
    timer: Option<JoinHandle<()>>,
    generation: u64,
}

impl RefreshScheduler {
    pub fn new(tick_tx: mpsc::UnboundedSender<SchedulerTick>) -> Self {
        Self {
            tick_tx,
            timer: None,
            generation: 0,
        }
    }

    /// Arm the timer, replacing any live one.
    ///
    /// With `initial_delay` the first tick fires once after that delay and
    /// the timer then repeats at the configured interval. Returns whether a
    /// timer was armed; when refused, no timer is left running.
    pub fn start(
        &mut self,
        settings: &IndicatorSettings,
        state: &IndicatorState,
        initial_delay: Option<Duration>,
    ) -> bool {
        let interval = settings.polling.interval();

        if !settings.polling_active() || interval.is_zero() || !state.is_polling() {
            debug!(
                "Not arming refresh timer (polling={}, interval={:?}, state={})",
                settings.polling_active(),
                interval,
                state.name()
            );
            self.stop();
            return false;
        }

        self.stop();
        self.generation += 1;

        let generation = self.generation;
        let tick_tx = self.tick_tx.clone();
        self.timer = Some(tokio::spawn(run_timer(tick_tx, generation, interval, initial_delay)));

        match initial_delay {
            Some(delay) => debug!(
                "Refresh timer armed: first refresh in {:?}, then every {:?}",
                delay, interval
            ),
            None => debug!("Refresh timer armed: every {:?}", interval),
        }
        true
    }

    /// Cancel the live timer if any
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            debug!("Refresh timer {} cancelled", self.generation);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Whether a tick came from the currently armed timer
    pub fn is_current(&self, tick: &SchedulerTick) -> bool {
        self.timer.is_some() && tick.generation == self.generation
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_timer(
    tick_tx: mpsc::UnboundedSender<SchedulerTick>,
    generation: u64,
    period: Duration,
    initial_delay: Option<Duration>,
) {
    let tick = SchedulerTick { generation };

    if let Some(delay) = initial_delay {
        sleep(delay).await;
        if tick_tx.send(tick).is_err() {
            return;
        }
    }

    let Some(first) = Instant::now().checked_add(period) else {
        warn!("Refresh interval {:?} is out of range, timer {} not started", period, generation);
        return;
    };
    let mut ticker = interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if tick_tx.send(tick).is_err() {
            debug!("Tick receiver gone, refresh timer {} exiting", generation);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LaunchpadSnapshot;

    fn settings(minutes: u64, polling: bool) -> IndicatorSettings {
        let mut settings = IndicatorSettings::default();
        settings.polling.interval_minutes = minutes;
        settings.polling.enabled = polling;
        settings
    }

    fn loaded() -> IndicatorState {
        IndicatorState::Load(LaunchpadSnapshot::new(Vec::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_steady_timer_ticks_every_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = RefreshScheduler::new(tx);
        let started = Instant::now();

        assert!(scheduler.start(&settings(1, true), &loaded(), None));

        let first = rx.recv().await.unwrap();
        assert_eq!(started.elapsed().as_secs(), 60);
        assert!(scheduler.is_current(&first));

        rx.recv().await.unwrap();
        assert_eq!(started.elapsed().as_secs(), 120);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_delay_fires_once_then_repeats() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = RefreshScheduler::new(tx);
        let started = Instant::now();

        scheduler.start(&settings(1, true), &loaded(), Some(Duration::from_secs(5)));

        rx.recv().await.unwrap();
        assert_eq!(started.elapsed().as_secs(), 5);
        rx.recv().await.unwrap();
        assert_eq!(started.elapsed().as_secs(), 65);
        rx.recv().await.unwrap();
        assert_eq!(started.elapsed().as_secs(), 125);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_initial_delay_fires_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = RefreshScheduler::new(tx);
        let started = Instant::now();

        scheduler.start(&settings(1, true), &IndicatorState::Loading, Some(Duration::ZERO));
        rx.recv().await.unwrap();
        assert_eq!(started.elapsed().as_secs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_previous_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = RefreshScheduler::new(tx);

        scheduler.start(&settings(1, true), &loaded(), Some(Duration::from_secs(1)));
        scheduler.start(&settings(1, true), &loaded(), Some(Duration::from_secs(10)));

        let started = Instant::now();
        let tick = rx.recv().await.unwrap();
        assert_eq!(started.elapsed().as_secs(), 10);
        assert_eq!(tick.generation, 2);
        assert!(scheduler.is_current(&tick));
        assert!(!scheduler.is_current(&SchedulerTick { generation: 1 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refuses_when_polling_off_or_interval_zero() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut scheduler = RefreshScheduler::new(tx);

        assert!(!scheduler.start(&settings(1, false), &loaded(), Some(Duration::from_secs(1))));
        assert!(!scheduler.is_armed());

        assert!(!scheduler.start(&settings(0, true), &loaded(), None));
        assert!(!scheduler.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refusal_tears_down_live_timer() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut scheduler = RefreshScheduler::new(tx);

        assert!(scheduler.start(&settings(1, true), &loaded(), None));
        assert!(scheduler.is_armed());

        assert!(!scheduler.start(&settings(1, true), &IndicatorState::Disconnected, None));
        assert!(!scheduler.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = RefreshScheduler::new(tx);

        scheduler.start(&settings(1, true), &loaded(), None);
        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_armed());

        tokio::time::advance(Duration::from_secs(600)).await;
        assert!(rx.try_recv().is_err());
    }
}

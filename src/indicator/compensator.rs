//! Focus-pause compensation for the refresh schedule

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Delay used when the window regains focus before the first fetch finished
pub const LOADING_RESUME_DELAY: Duration = Duration::from_millis(5000);

/// Delay until the next refresh after a pause.
///
/// Data that was never updated counts as a full interval old, so the next
/// refresh is due immediately. Both subtractions clamp at zero.
pub fn compensated_delay(
    interval: Duration,
    last_update: Option<Instant>,
    paused_at: Instant,
    now: Instant,
) -> Duration {
    let since_update = last_update
        .map(|at| now.saturating_duration_since(at))
        .unwrap_or(interval);
    let to_next_poll = interval.saturating_sub(since_update);
    let since_unfocused = now.saturating_duration_since(paused_at);
    to_next_poll.saturating_sub(since_unfocused)
}

/// Timestamps needed to compensate the schedule on refocus
#[derive(Debug, Default, Clone)]
pub struct FocusPause {
    last_data_update: Option<Instant>,
    paused_at: Option<Instant>,
}

impl FocusPause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_update(&mut self, at: Instant) {
        self.last_data_update = Some(at);
    }

    pub fn last_data_update(&self) -> Option<Instant> {
        self.last_data_update
    }

    /// Record the start of a pause, keeping an earlier one if already paused
    pub fn pause(&mut self, at: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(at);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn clear_pause(&mut self) {
        self.paused_at = None;
    }

    /// Consume the recorded pause and compute the rearm delay.
    ///
    /// Returns `None` when nothing was paused.
    pub fn resume(&mut self, loading: bool, interval: Duration, now: Instant) -> Option<Duration> {
        let paused_at = self.paused_at.take()?;

        if loading {
            return Some(LOADING_RESUME_DELAY);
        }

        let delay = compensated_delay(interval, self.last_data_update, paused_at, now);
        debug!(
            "Resuming refresh schedule after {:?} unfocused, next refresh in {:?}",
            now.saturating_duration_since(paused_at),
            delay
        );
        Some(delay)
    }
}

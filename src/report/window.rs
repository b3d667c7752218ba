use std::time::Duration;
use tokio::time::Instant;

/// Shortest elapsed time used as a rate denominator.
const MIN_ELAPSED: Duration = Duration::from_secs(1);

/// Start of the run and of the current reporting window.
#[derive(Debug, Clone, Copy)]
pub struct WindowState {
    started: Instant,
    last_rollover: Instant,
}

impl WindowState {
    pub fn new(now: Instant) -> Self {
        Self {
            started: now,
            last_rollover: now,
        }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// Minutes since the run started, never less than one second's worth.
    pub fn lifetime_minutes(&self, now: Instant) -> f64 {
        elapsed_minutes(self.started, now)
    }

    /// Minutes since the last rollover, never less than one second's worth.
    pub fn interval_minutes(&self, now: Instant) -> f64 {
        elapsed_minutes(self.last_rollover, now)
    }

    pub fn roll(&mut self, now: Instant) {
        self.last_rollover = now;
    }
}

fn elapsed_minutes(since: Instant, now: Instant) -> f64 {
    now.saturating_duration_since(since).max(MIN_ELAPSED).as_secs_f64() / 60.0
}

/// Queries per minute.
pub fn rate(count: u64, minutes: f64) -> f64 {
    count as f64 / minutes
}

mod format;
pub mod window;

pub use format::{FixedWidth, RateColumns, ReportFormatter, Table};
pub use window::WindowState;

use crate::dns::QueryCount;
use chrono::{DateTime, Local};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Emitted at every tick, covers the window that just closed.
    Interval,
    /// Emitted once on termination, covers the whole run.
    Final,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    /// Printable key: bytes outside printable ASCII are shown as `\xNN` escapes.
    pub key: String,
    pub total: u64,
    pub interval: u64,
    pub lifetime_rate: f64,
    pub interval_rate: f64,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub kind: ReportKind,
    pub generated_at: DateTime<Local>,
    pub lifetime_minutes: f64,
    pub interval_minutes: f64,
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn build(
        kind: ReportKind,
        snapshot: Vec<QueryCount>,
        window: &WindowState,
        now: Instant,
    ) -> Self {
        let lifetime_minutes = window.lifetime_minutes(now);
        let interval_minutes = window.interval_minutes(now);

        let rows = snapshot
            .into_iter()
            .map(|count| ReportRow {
                lifetime_rate: window::rate(count.total, lifetime_minutes),
                interval_rate: window::rate(count.interval, interval_minutes),
                key: count.key.escape_ascii().to_string(),
                total: count.total,
                interval: count.interval,
            })
            .collect();

        Self {
            kind,
            generated_at: Local::now(),
            lifetime_minutes,
            interval_minutes,
            rows,
        }
    }

    pub fn total_count(&self) -> u64 {
        self.rows.iter().map(|row| row.total).sum()
    }

    pub fn interval_count(&self) -> u64 {
        self.rows.iter().map(|row| row.interval).sum()
    }
}

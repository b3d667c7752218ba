use crate::dns::{Classifier, DnsQueryAggregator, Frame};
use crate::report::{Report, ReportFormatter, ReportKind, WindowState};
use anyhow::{Context, Result};
use log::{debug, info};
use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Owns the counter table and drives reporting.
///
/// Frames, ticks and the termination request are handled one at a time from a
/// single loop, so the table needs no locking and a report always covers
/// exactly one closed window.
pub struct DnsCollector {
    classifier: Classifier,
    aggregator: DnsQueryAggregator,
    window: WindowState,
    period: Duration,
    formatter: Box<dyn ReportFormatter + Send>,
    out: Box<dyn Write + Send>,
}

impl DnsCollector {
    pub fn new(
        classifier: Classifier,
        period: Duration,
        formatter: Box<dyn ReportFormatter + Send>,
        out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            classifier,
            aggregator: DnsQueryAggregator::new(),
            window: WindowState::new(Instant::now()),
            period,
            formatter,
            out,
        }
    }

    #[cfg(test)]
    pub fn aggregator(&self) -> &DnsQueryAggregator {
        &self.aggregator
    }

    /// Counts the frame if it classifies. Returns whether it was counted.
    pub fn observe(&mut self, frame: &Frame) -> bool {
        match self.classifier.classify(frame) {
            Some(key) => {
                self.aggregator.increment(key);
                true
            }
            None => false,
        }
    }

    /// Reports the window that just closed, then starts a new one.
    pub fn interval_report(&mut self, now: Instant) -> Result<()> {
        let report = Report::build(
            ReportKind::Interval,
            self.aggregator.snapshot(),
            &self.window,
            now,
        );
        self.emit(&report)?;
        self.aggregator.rollover();
        self.window.roll(now);
        Ok(())
    }

    pub fn final_report(&mut self, now: Instant) -> Result<()> {
        let report = Report::build(
            ReportKind::Final,
            self.aggregator.snapshot(),
            &self.window,
            now,
        );
        self.emit(&report)
    }

    fn emit(&mut self, report: &Report) -> Result<()> {
        // Render fully before touching the sink so a report is never half written.
        let mut rendered = Vec::new();
        self.formatter
            .write_report(&mut rendered, report)
            .context("Failed to format report")?;

        self.out
            .write_all(&rendered)
            .and_then(|()| self.out.flush())
            .context("Failed to write report")?;

        debug!(
            "Reported {} keys, {} queries total, {} this interval",
            report.rows.len(),
            report.total_count(),
            report.interval_count()
        );
        Ok(())
    }

    /// Consumes frames until `shutdown` resolves or the frame source closes,
    /// reporting every `period`. Ends with one final report.
    pub async fn run<S>(mut self, mut frames: mpsc::Receiver<Frame>, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        let mut ticker = time::interval_at(self.window.started() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!("Termination requested, writing totals for run");
                    break;
                }
                _ = ticker.tick() => {
                    info!(
                        "Reporting interval elapsed ({} keys, {} queries since start)",
                        self.aggregator.len(),
                        self.aggregator.total_count()
                    );
                    self.interval_report(Instant::now())?;
                }
                frame = frames.recv() => match frame {
                    Some(frame) => {
                        self.observe(&frame);
                    }
                    None => {
                        info!("Frame source closed, writing totals for run");
                        break;
                    }
                },
            }
        }

        self.final_report(Instant::now())
    }
}

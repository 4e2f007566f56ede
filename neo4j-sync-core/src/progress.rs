//! Progress tracking and reporting for sync phases

use crate::model::EntityKind;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Tracks phase progress with rate and ETA
pub struct ProgressTracker {
    kind: EntityKind,
    total: u64,
    processed: AtomicU64,
    start_time: Instant,
    last_report_time: Mutex<Instant>,
    report_interval: Duration,
}

impl ProgressTracker {
    /// Tracker for `total` items of `kind`
    #[must_use]
    pub fn new(kind: EntityKind, total: u64, report_interval: Duration) -> Self {
        Self {
            kind,
            total,
            processed: AtomicU64::new(0),
            start_time: Instant::now(),
            last_report_time: Mutex::new(Instant::now()),
            report_interval,
        }
    }

    /// Add `count` processed items
    pub fn increment(&self, count: u64) {
        self.processed.fetch_add(count, Ordering::Relaxed);
    }

    /// Items processed so far
    #[must_use]
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Whether the report interval has elapsed since the last report
    #[must_use]
    pub fn should_report(&self) -> bool {
        self.last_report_time.lock().elapsed() >= self.report_interval
    }

    /// Report only if the interval has elapsed
    pub fn maybe_report(&self) {
        if self.should_report() {
            self.report();
        }
    }

    /// Log current progress
    pub fn report(&self) {
        let processed = self.processed();
        let elapsed = self.start_time.elapsed();
        #[allow(clippy::cast_precision_loss)]
        let rate = if elapsed.as_secs_f64() > 0.0 {
            processed as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let remaining = self.total.saturating_sub(processed);
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_sign_loss,
            clippy::cast_possible_truncation
        )]
        let eta = if rate > 0.0 {
            Duration::from_secs((remaining as f64 / rate) as u64)
        } else {
            Duration::ZERO
        };
        #[allow(clippy::cast_precision_loss)]
        let percentage = if self.total > 0 {
            (processed as f64 / self.total as f64) * 100.0
        } else {
            100.0
        };

        tracing::info!(
            kind = %self.kind,
            processed = processed,
            total = self.total,
            percentage = format!("{percentage:.1}%"),
            rate = format!("{rate:.0} {}/sec", self.kind),
            eta = format!("{eta:?}"),
            "Sync progress"
        );

        *self.last_report_time.lock() = Instant::now();
    }
}

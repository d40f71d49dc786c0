//! Logger metrics for observability
//!
//! Counters describing what a logger did with the calls it received:
//! lines written, lines dropped by an exclude filter, failed writes and
//! calls dispatched to registered sinks.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// Shared by a logger and every logger derived from it.
///
/// # Example
///
/// ```
/// use rust_structured_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_written();
/// metrics.record_write_failure();
///
/// assert_eq!(metrics.lines_written(), 1);
/// assert_eq!(metrics.write_failures(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Lines handed to the output successfully
    lines_written: AtomicU64,

    /// Writes or flushes that returned an error
    write_failures: AtomicU64,

    /// Calls dropped by the exclude predicate
    excluded_count: AtomicU64,

    /// Individual sink `accept` calls made by an intercept logger
    sink_dispatches: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            lines_written: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            excluded_count: AtomicU64::new(0),
            sink_dispatches: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn lines_written(&self) -> u64 {
        self.lines_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn excluded_count(&self) -> u64 {
        self.excluded_count.load(Ordering::Relaxed)
    }

    /// Calls handed to an intercept sink. A sink whose own threshold
    /// drops the call still counts.
    #[inline]
    pub fn sink_dispatches(&self) -> u64 {
        self.sink_dispatches.load(Ordering::Relaxed)
    }

    /// Record a written line, returning the previous count
    #[inline]
    pub fn record_written(&self) -> u64 {
        self.lines_written.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a failed write, returning the previous count
    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_excluded(&self) -> u64 {
        self.excluded_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_dispatch(&self) -> u64 {
        self.sink_dispatches.fetch_add(1, Ordering::Relaxed)
    }

    /// Failure rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been written yet.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.write_failures() as f64;
        let total = self.lines_written() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.lines_written.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
        self.excluded_count.store(0, Ordering::Relaxed);
        self.sink_dispatches.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            lines_written: AtomicU64::new(self.lines_written()),
            write_failures: AtomicU64::new(self.write_failures()),
            excluded_count: AtomicU64::new(self.excluded_count()),
            sink_dispatches: AtomicU64::new(self.sink_dispatches()),
        }
    }
}

//! Batch accumulation for the incoming line stream

use crate::types::{LogBatch, LogLine};
use std::time::{Duration, Instant, SystemTime};

/// Line count that forces a flush
pub const DEFAULT_MAX_LINES: usize = 100;

/// Window age that forces a flush
pub const DEFAULT_MAX_AGE: Duration = Duration::from_millis(3000);

/// Buffer for incoming lines with size- and age-based flushing
///
/// Flush readiness is evaluated on demand; there is no background timer.
/// The buffer is unbounded between flushes.
#[derive(Debug)]
pub struct BatchAccumulator {
    /// Buffered lines
    lines: Vec<LogLine>,

    /// Line count threshold
    max_lines: usize,

    /// Age threshold
    max_age: Duration,

    /// Time of the last flush (or construction)
    last_flush: Instant,

    /// Wall-clock twin of `last_flush`, reported on the batch
    opened_at: SystemTime,
}

impl BatchAccumulator {
    /// Create an accumulator with the standard thresholds (100 lines / 3s)
    pub fn new() -> Self {
        Self::with_thresholds(DEFAULT_MAX_LINES, DEFAULT_MAX_AGE)
    }

    /// Create an accumulator with custom thresholds
    ///
    /// # Arguments
    /// * `max_lines` - Buffered line count at which a flush is due
    /// * `max_age` - Time since the last flush at which a flush is due
    pub fn with_thresholds(max_lines: usize, max_age: Duration) -> Self {
        Self {
            lines: Vec::with_capacity(max_lines),
            max_lines,
            max_age,
            last_flush: Instant::now(),
            opened_at: SystemTime::now(),
        }
    }

    /// Append a line; empty and whitespace-only lines are accepted
    pub fn add_line(&mut self, text: impl Into<String>) {
        self.lines.push(LogLine::new(text));
    }

    /// Whether either threshold has been reached
    pub fn should_flush(&self) -> bool {
        self.should_flush_at(Instant::now())
    }

    /// Threshold check against an explicit clock reading
    pub fn should_flush_at(&self, now: Instant) -> bool {
        let size_met = self.lines.len() >= self.max_lines;
        let time_passed = now.saturating_duration_since(self.last_flush) >= self.max_age;
        size_met || time_passed
    }

    /// Take the buffered lines as a batch and restart the window
    ///
    /// Flushing an empty buffer yields an empty batch; check
    /// [`has_pending`](Self::has_pending) first to avoid a wasted classifier call.
    pub fn flush(&mut self) -> LogBatch {
        let batch = LogBatch {
            lines: std::mem::take(&mut self.lines),
            opened_at: self.opened_at,
        };
        self.last_flush = Instant::now();
        self.opened_at = SystemTime::now();
        batch
    }

    /// Whether at least one line is buffered
    pub fn has_pending(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Get the current buffer length
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Time since the window opened
    pub fn elapsed(&self) -> Duration {
        self.last_flush.elapsed()
    }
}

impl Default for BatchAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

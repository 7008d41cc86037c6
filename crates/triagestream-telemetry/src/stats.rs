//! Session-level triage statistics

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use triagestream_core::Severity;

/// Manual triage time assumed saved per automated triage
pub const SECONDS_SAVED_PER_TRIAGE: u64 = 45;

/// Aggregate counters for one run
///
/// Constructed once by the top-level controller and handed to the stages
/// that record into it; clones share the same counters. Counters only
/// ever increase.
#[derive(Clone)]
pub struct SessionStats {
    inner: Arc<StatsInner>,
}

struct StatsInner {
    started: Instant,
    counts: Mutex<Counts>,
}

struct Counts {
    /// Created on first use
    triage: BTreeMap<Severity, u64>,
    deep_analysis: u64,
}

impl SessionStats {
    /// Start a new session clock with all counters at zero
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StatsInner {
                started: Instant::now(),
                counts: Mutex::new(Counts {
                    triage: BTreeMap::new(),
                    deep_analysis: 0,
                }),
            }),
        }
    }

    /// Count one triage outcome
    pub fn record_triage(&self, severity: Severity) {
        *self.inner.counts.lock().triage.entry(severity).or_insert(0) += 1;
        ::metrics::counter!("triagestream_triage_total", "severity" => severity.as_str()).increment(1);
        debug!(%severity, "Recorded triage");
    }

    /// Count one deep analysis
    pub fn record_deep_analysis(&self) {
        self.inner.counts.lock().deep_analysis += 1;
        ::metrics::counter!("triagestream_deep_analysis_total").increment(1);
        debug!("Recorded deep analysis");
    }

    /// Time since the session started
    pub fn elapsed(&self) -> Duration {
        self.inner.started.elapsed()
    }

    /// Read model for presentation
    pub fn summary(&self) -> StatsSummary {
        let counts = self.inner.counts.lock();
        let triage = Severity::ALL
            .iter()
            .map(|s| (*s, counts.triage.get(s).copied().unwrap_or(0)))
            .collect();
        StatsSummary::new(self.elapsed().as_secs(), triage, counts.deep_analysis)
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the session counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    /// Whole seconds since the session started
    pub duration_secs: u64,

    pub total_triages: u64,

    /// Per-severity breakdown; every severity is present
    pub triage_counts: BTreeMap<Severity, u64>,

    pub deep_analysis_count: u64,

    /// Estimated minutes of manual triage saved
    pub time_saved_minutes: u64,
}

impl StatsSummary {
    fn new(duration_secs: u64, triage_counts: BTreeMap<Severity, u64>, deep_analysis_count: u64) -> Self {
        let total_triages = triage_counts.values().sum();
        Self {
            duration_secs,
            total_triages,
            triage_counts,
            deep_analysis_count,
            time_saved_minutes: time_saved_minutes(total_triages),
        }
    }

    /// Count for one severity
    pub fn count(&self, severity: Severity) -> u64 {
        self.triage_counts.get(&severity).copied().unwrap_or(0)
    }
}

/// `floor(triages * 45 / 60)`
pub fn time_saved_minutes(total_triages: u64) -> u64 {
    total_triages * SECONDS_SAVED_PER_TRIAGE / 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_session() {
        let summary = SessionStats::new().summary();
        assert_eq!(summary.total_triages, 0);
        assert_eq!(summary.deep_analysis_count, 0);
        assert_eq!(summary.time_saved_minutes, 0);
        assert_eq!(summary.triage_counts.len(), 4);
        assert!(summary.triage_counts.values().all(|c| *c == 0));
    }

    #[test]
    fn test_record_triage_by_severity() {
        let stats = SessionStats::new();
        stats.record_triage(Severity::High);
        stats.record_triage(Severity::High);
        stats.record_triage(Severity::Low);
        stats.record_deep_analysis();

        let summary = stats.summary();
        assert_eq!(summary.total_triages, 3);
        assert_eq!(summary.count(Severity::High), 2);
        assert_eq!(summary.count(Severity::Low), 1);
        assert_eq!(summary.count(Severity::Critical), 0);
        assert_eq!(summary.triage_counts.get(&Severity::Medium), Some(&0));
        assert_eq!(summary.deep_analysis_count, 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let stats = SessionStats::new();
        let handle = stats.clone();
        handle.record_triage(Severity::Medium);
        assert_eq!(stats.summary().count(Severity::Medium), 1);
    }

    #[test]
    fn test_time_saved_formula() {
        for n in [0u64, 1, 2, 3, 4, 7, 80, 1001] {
            assert_eq!(time_saved_minutes(n), (n as f64 * 45.0 / 60.0).floor() as u64);
        }

        let stats = SessionStats::new();
        for _ in 0..5 {
            stats.record_triage(Severity::Critical);
        }
        assert_eq!(stats.summary().time_saved_minutes, 3);
    }
}

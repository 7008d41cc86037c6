//! Model call latency and token accounting

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Which collaborator a call went to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Triage,
    DeepAnalysis,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Triage => "triage",
            Self::DeepAnalysis => "deep_analysis",
        }
    }
}

/// Metrics collector for model calls
///
/// Every call is recorded, failed ones included; failures contribute
/// latency but no tokens.
#[derive(Clone)]
pub struct CallMetrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    total_calls: AtomicU64,
    failed_calls: AtomicU64,
    total_tokens: AtomicU64,
    total_latency_ms: AtomicU64,
}

impl CallMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                total_calls: AtomicU64::new(0),
                failed_calls: AtomicU64::new(0),
                total_tokens: AtomicU64::new(0),
                total_latency_ms: AtomicU64::new(0),
            }),
        }
    }

    /// Record a completed call
    pub fn record_success(&self, kind: CallKind, latency: Duration, tokens: u64) {
        self.record(kind, latency);
        self.inner.total_tokens.fetch_add(tokens, Ordering::Relaxed);
        ::metrics::counter!("triagestream_model_tokens_total", "kind" => kind.as_str()).increment(tokens);
    }

    /// Record a failed call
    pub fn record_failure(&self, kind: CallKind, latency: Duration) {
        self.record(kind, latency);
        self.inner.failed_calls.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("triagestream_model_errors_total", "kind" => kind.as_str()).increment(1);
    }

    fn record(&self, kind: CallKind, latency: Duration) {
        let ms = latency.as_millis() as u64;
        self.inner.total_calls.fetch_add(1, Ordering::Relaxed);
        self.inner.total_latency_ms.fetch_add(ms, Ordering::Relaxed);
        ::metrics::histogram!("triagestream_model_latency_ms", "kind" => kind.as_str()).record(ms as f64);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_calls: self.inner.total_calls.load(Ordering::Relaxed),
            failed_calls: self.inner.failed_calls.load(Ordering::Relaxed),
            total_tokens: self.inner.total_tokens.load(Ordering::Relaxed),
            total_latency_ms: self.inner.total_latency_ms.load(Ordering::Relaxed),
        }
    }
}

impl Default for CallMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_calls: u64,
    pub failed_calls: u64,
    pub total_tokens: u64,
    pub total_latency_ms: u64,
}

impl MetricsSnapshot {
    /// Calculate average latency per call
    pub fn avg_latency_ms(&self) -> u64 {
        if self.total_calls == 0 {
            0
        } else {
            self.total_latency_ms / self.total_calls
        }
    }

    /// Average tokens per successful call
    pub fn avg_tokens(&self) -> u64 {
        let succeeded = self.total_calls.saturating_sub(self.failed_calls);
        if succeeded == 0 {
            0
        } else {
            self.total_tokens / succeeded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let metrics = CallMetrics::new();

        metrics.record_success(CallKind::Triage, Duration::from_millis(400), 300);
        metrics.record_success(CallKind::DeepAnalysis, Duration::from_millis(1600), 900);
        metrics.record_failure(CallKind::Triage, Duration::from_millis(100));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_calls, 3);
        assert_eq!(snapshot.failed_calls, 1);
        assert_eq!(snapshot.total_tokens, 1200);
        assert_eq!(snapshot.avg_latency_ms(), 700);
        assert_eq!(snapshot.avg_tokens(), 600);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = CallMetrics::new().snapshot();
        assert_eq!(snapshot.avg_latency_ms(), 0);
        assert_eq!(snapshot.avg_tokens(), 0);
    }

    #[test]
    fn test_torn_snapshot_does_not_underflow() {
        // failures observed ahead of the matching total
        let snapshot = MetricsSnapshot {
            total_calls: 2,
            failed_calls: 3,
            total_tokens: 500,
            total_latency_ms: 800,
        };
        assert_eq!(snapshot.avg_tokens(), 0);
        assert_eq!(snapshot.avg_latency_ms(), 400);
    }
}

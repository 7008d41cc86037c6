//! triagestream telemetry
//!
//! Counters for a single triage session.
//!
//! Provides:
//! - Per-severity triage and deep-analysis counts with a time-saved estimate
//! - Latency and token accounting for model calls
//!
//! Counters are also emitted through the `metrics` facade; without an
//! installed recorder those emissions are no-ops.

pub mod metrics;
pub mod stats;

pub use self::metrics::{CallKind, CallMetrics, MetricsSnapshot};
pub use stats::{SessionStats, StatsSummary};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::{CallKind, CallMetrics};
    pub use crate::stats::{SessionStats, StatsSummary};
}

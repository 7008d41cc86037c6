//! Per-batch triage and escalation
//!
//! Each batch is summarized, triaged, and, when the outcome is uncertain or
//! the model asks for it, escalated to deep analysis. Failures end the
//! batch, never the stream.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use triagestream_alerts::NotificationQueue;
use triagestream_classifiers::{Classifier, Completion, DeepAnalyzer};
use triagestream_core::{
    DeepAnalysisResult, Digest, Error, LogBatch, Result, Summarizer, TriageResult,
};
use triagestream_telemetry::{CallKind, CallMetrics, SessionStats};

/// Triage results below this confidence are always escalated
pub const ESCALATION_CONFIDENCE: f32 = 0.65;

/// Source files are truncated to this many characters before analysis
pub const SOURCE_PREVIEW_CHARS: usize = 2000;

/// Spoken when a batch fails
const BATCH_ERROR_MESSAGE: &str = "API error occurred";

/// Whether a triage outcome warrants deep analysis
pub fn requires_escalation(result: &TriageResult) -> bool {
    result.needs_deeper || result.confidence < ESCALATION_CONFIDENCE
}

/// A model result with the cost of obtaining it
#[derive(Debug, Clone, PartialEq)]
pub struct Timed<T> {
    pub result: T,
    pub latency: Duration,
    pub tokens: u64,
}

/// What happened to one batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub digest: Digest,
    pub triage: Timed<TriageResult>,
    pub escalated: bool,

    /// Present when escalation ran and succeeded
    pub analysis: Option<Timed<DeepAnalysisResult>>,
}

/// Result of [`TriageController::process_batch`]
#[derive(Debug)]
pub enum BatchOutcome {
    /// Nothing worth classifying; no model call was made
    Skipped,

    Completed(BatchReport),

    /// A model call failed; the batch is dropped
    ///
    /// `partial` holds the triage outcome when only the escalation failed.
    Failed {
        partial: Option<BatchReport>,
        error: Error,
    },
}

/// Drives batches through triage, escalation and alerting
pub struct TriageController {
    summarizer: Summarizer,
    classifier: Arc<dyn Classifier>,
    analyzer: Arc<dyn DeepAnalyzer>,
    stats: SessionStats,
    metrics: CallMetrics,
    alerts: NotificationQueue,
}

impl TriageController {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        analyzer: Arc<dyn DeepAnalyzer>,
        stats: SessionStats,
        alerts: NotificationQueue,
    ) -> Self {
        Self {
            summarizer: Summarizer::default(),
            classifier,
            analyzer,
            stats,
            metrics: CallMetrics::new(),
            alerts,
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn metrics(&self) -> &CallMetrics {
        &self.metrics
    }

    pub fn alerts(&self) -> &NotificationQueue {
        &self.alerts
    }

    /// Run one batch to completion
    ///
    /// Model failures are logged, announced with priority, and returned
    /// as [`BatchOutcome::Failed`]. The controller stays usable.
    pub async fn process_batch(&self, batch: &LogBatch) -> BatchOutcome {
        let digest = self.summarizer.summarize(batch);
        if digest.is_empty() {
            debug!(lines = batch.len(), "Batch has no content, skipping triage");
            return BatchOutcome::Skipped;
        }
        let text = digest.render();

        let triage = match self.triage(&text).await {
            Ok(triage) => triage,
            Err(error) => return self.fail(None, error).await,
        };

        self.stats.record_triage(triage.result.severity);
        let escalated = requires_escalation(&triage.result);
        info!(
            severity = %triage.result.severity,
            confidence = triage.result.confidence,
            escalated,
            latency_ms = triage.latency.as_millis() as u64,
            "Batch triaged"
        );
        self.alerts.speak_triage(&triage.result, escalated).await;

        let mut report = BatchReport {
            digest,
            triage,
            escalated,
            analysis: None,
        };
        if !escalated {
            return BatchOutcome::Completed(report);
        }

        match self.analyze(&text, None).await {
            Ok(analysis) => {
                self.stats.record_deep_analysis();
                info!(
                    affected_files = analysis.result.affected_files.len(),
                    has_patch = analysis.result.has_patch(),
                    latency_ms = analysis.latency.as_millis() as u64,
                    "Deep analysis complete"
                );
                self.alerts.speak_deep_analysis(&analysis.result).await;
                report.analysis = Some(analysis);
                BatchOutcome::Completed(report)
            }
            Err(error) => self.fail(Some(report), error).await,
        }
    }

    /// Deep analysis of a source file outside the batch flow
    ///
    /// Only the first [`SOURCE_PREVIEW_CHARS`] characters are sent. Call
    /// metrics are recorded; session stats are not.
    pub async fn analyze_source(
        &self,
        name: &str,
        source: &str,
    ) -> Result<Timed<DeepAnalysisResult>> {
        let preview: String = source.chars().take(SOURCE_PREVIEW_CHARS).collect();
        let summary = format!("File: {}\n\nContent:\n{}", name, preview);
        self.analyze(&summary, None).await
    }

    async fn triage(&self, digest: &str) -> Result<Timed<TriageResult>> {
        let started = Instant::now();
        let completion = self.classifier.triage(digest).await;
        self.observe(CallKind::Triage, started.elapsed(), completion)
    }

    async fn analyze(
        &self,
        digest: &str,
        context: Option<&str>,
    ) -> Result<Timed<DeepAnalysisResult>> {
        let started = Instant::now();
        let completion = self.analyzer.analyze(digest, context).await;
        self.observe(CallKind::DeepAnalysis, started.elapsed(), completion)
    }

    fn observe<T>(
        &self,
        kind: CallKind,
        latency: Duration,
        completion: Result<Completion<T>>,
    ) -> Result<Timed<T>> {
        match completion {
            Ok(Completion { result, tokens }) => {
                self.metrics.record_success(kind, latency, tokens);
                Ok(Timed {
                    result,
                    latency,
                    tokens,
                })
            }
            Err(e) => {
                self.metrics.record_failure(kind, latency);
                Err(e)
            }
        }
    }

    async fn fail(&self, partial: Option<BatchReport>, error: Error) -> BatchOutcome {
        warn!(error = %error, "Batch skipped");
        self.alerts.speak_error(BATCH_ERROR_MESSAGE).await;
        BatchOutcome::Failed { partial, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triagestream_core::Severity;

    #[test]
    fn test_escalation_rule() {
        let cases = [
            (false, 0.5, true),
            (false, 0.9, false),
            (true, 0.99, true),
            (false, 0.65, false),
            (false, 0.6499, true),
        ];
        for (needs_deeper, confidence, expected) in cases {
            let result = TriageResult::new(Severity::Medium, "h", confidence, needs_deeper);
            assert_eq!(
                requires_escalation(&result),
                expected,
                "needs_deeper={needs_deeper} confidence={confidence}"
            );
        }
    }
}

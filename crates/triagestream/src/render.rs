//! Plain-text presentation of results and statistics

use crate::pipeline::{BatchOutcome, BatchReport, Timed};
use std::fmt::Write;
use triagestream_core::{DeepAnalysisResult, Severity, TriageResult};
use triagestream_telemetry::{MetricsSnapshot, StatsSummary};

pub fn triage(result: &Timed<TriageResult>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Triage result");
    let _ = writeln!(out, "  Severity:   {}", result.result.severity.as_str().to_uppercase());
    let _ = writeln!(out, "  Hypothesis: {}", result.result.hypothesis);
    let _ = writeln!(out, "  Confidence: {:.0}%", result.result.confidence * 100.0);
    let _ = writeln!(out, "  Deeper:     {}", if result.result.needs_deeper { "requested" } else { "no" });
    let _ = write!(out, "{}", call(result.latency.as_millis(), result.tokens));
    out
}

pub fn analysis(result: &Timed<DeepAnalysisResult>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Deep analysis");
    let _ = write!(out, "{}", analysis_body(&result.result));
    let _ = write!(out, "{}", call(result.latency.as_millis(), result.tokens));
    out
}

fn analysis_body(result: &DeepAnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Root cause: {}", result.root_cause);
    if result.affected_files.is_empty() {
        let _ = writeln!(out, "  Affected files: none reported");
    } else {
        let _ = writeln!(out, "  Affected files: {}", result.affected_files.join(", "));
    }
    if result.has_patch() {
        let _ = writeln!(out, "  Suggested patch:");
        for line in result.patch_diff.lines() {
            let _ = writeln!(out, "    {}", line);
        }
    }
    out
}

fn call(latency_ms: u128, tokens: u64) -> String {
    format!("  Latency: {}ms  Tokens: {}\n", latency_ms, tokens)
}

/// Everything worth printing for one batch
pub fn batch_report(report: &BatchReport) -> String {
    let mut out = triage(&report.triage);
    if report.escalated {
        out.push_str("Escalating to deep analysis\n");
    }
    if let Some(result) = &report.analysis {
        out.push_str(&analysis(result));
    }
    out
}

/// Printable form of a batch outcome; `None` when there is nothing to show
pub fn batch_outcome(outcome: &BatchOutcome) -> Option<String> {
    match outcome {
        BatchOutcome::Skipped => None,
        BatchOutcome::Completed(report) => Some(batch_report(report)),
        BatchOutcome::Failed { partial, error } => {
            let mut out = partial.as_ref().map(batch_report).unwrap_or_default();
            let _ = writeln!(out, "Batch skipped: {}", error);
            Some(out)
        }
    }
}

/// End-of-session statistics block
pub fn session_summary(summary: &StatsSummary, calls: &MetricsSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Session summary");
    let _ = writeln!(out, "  Duration:       {}", duration(summary.duration_secs));
    let _ = writeln!(out, "  Triages:        {}", summary.total_triages);
    for severity in Severity::ALL.iter().rev() {
        let _ = writeln!(out, "    {:<9} {}", severity.as_str(), summary.count(*severity));
    }
    let _ = writeln!(out, "  Deep analyses:  {}", summary.deep_analysis_count);
    let _ = writeln!(out, "  Model calls:    {} ({} failed)", calls.total_calls, calls.failed_calls);
    let _ = writeln!(out, "  Avg latency:    {}ms", calls.avg_latency_ms());
    let _ = writeln!(out, "  Avg tokens:     {}", calls.avg_tokens());
    let _ = writeln!(out, "  Time saved:     ~{} min", summary.time_saved_minutes);
    out
}

fn duration(secs: u64) -> String {
    match (secs / 3600, secs % 3600 / 60, secs % 60) {
        (0, 0, s) => format!("{}s", s),
        (0, m, s) => format!("{}m {}s", m, s),
        (h, m, _) => format!("{}h {}m", h, m),
    }
}

//! Core types for triagestream

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// A single ingested line of application output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Raw line text, unvalidated
    pub text: String,

    /// When the line arrived
    pub received_at: SystemTime,
}

impl LogLine {
    /// Create a line stamped with the current time
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            received_at: SystemTime::now(),
        }
    }
}

/// A bounded window of lines handed off for classification
#[derive(Debug, Clone)]
pub struct LogBatch {
    /// Lines in arrival order
    pub lines: Vec<LogLine>,

    /// When the window opened (the previous flush)
    pub opened_at: SystemTime,
}

impl LogBatch {
    /// Build a batch from raw text lines; mostly useful for tests and one-shot input
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(LogLine::new).collect(),
            opened_at: SystemTime::now(),
        }
    }

    /// Split a block of text on newlines into a batch
    pub fn from_text(text: &str) -> Self {
        Self::from_lines(text.split('\n'))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Redacted, deduplicated summary of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Digest {
    /// Non-blank lines in the batch
    pub total_lines: usize,

    /// Error-like lines, counted before deduplication
    pub error_count: usize,

    /// Warning-like lines
    pub warning_count: usize,

    /// Distinct error lines kept after deduplication (at most 10)
    pub unique_errors: usize,

    /// Redacted excerpt: kept errors followed by all warnings, newline separated
    pub excerpt: String,
}

impl Digest {
    /// Whether the batch carried anything worth classifying
    pub fn is_empty(&self) -> bool {
        self.total_lines == 0
    }

    /// Text submitted to the classifier
    pub fn render(&self) -> String {
        format!(
            "Total lines: {}\nErrors: {}\nWarnings: {}\n\nKey Issues:\n{}",
            self.total_lines, self.error_count, self.warning_count, self.excerpt
        )
    }
}

/// Incident severity reported by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// Output of light triage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    pub severity: Severity,

    /// Short explanation of the suspected issue
    pub hypothesis: String,

    /// Model confidence, always within [0, 1]
    #[serde(deserialize_with = "unit_interval")]
    pub confidence: f32,

    /// Explicit escalation request from the classifier
    #[serde(default)]
    pub needs_deeper: bool,
}

impl TriageResult {
    pub fn new(
        severity: Severity,
        hypothesis: impl Into<String>,
        confidence: f32,
        needs_deeper: bool,
    ) -> Self {
        Self {
            severity,
            hypothesis: hypothesis.into(),
            confidence: clamp_unit(confidence),
            needs_deeper,
        }
    }
}

/// Output of deep root-cause analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepAnalysisResult {
    pub root_cause: String,

    /// Unified diff suggestion; may be empty
    #[serde(default)]
    pub patch_diff: String,

    #[serde(default)]
    pub affected_files: Vec<String>,
}

impl DeepAnalysisResult {
    pub fn has_patch(&self) -> bool {
        !self.patch_diff.trim().is_empty()
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn unit_interval<'de, D>(deserializer: D) -> std::result::Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f32::deserialize(deserializer)?;
    if !value.is_finite() {
        return Err(serde::de::Error::custom("confidence must be a finite number"));
    }
    Ok(clamp_unit(value))
}

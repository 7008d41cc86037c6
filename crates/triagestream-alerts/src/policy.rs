//! Severity gating for spoken alerts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use triagestream_core::Severity;

/// Alert threshold vocabulary, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    #[default]
    Warning,
    Error,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl From<Severity> for AlertLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => Self::Info,
            Severity::Medium => Self::Warning,
            Severity::High => Self::Error,
            Severity::Critical => Self::Critical,
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(format!(
                "unknown alert level '{other}' (expected info, warning, error or critical)"
            )),
        }
    }
}

/// Decides which triage outcomes are worth speaking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlertPolicy {
    threshold: AlertLevel,
}

impl AlertPolicy {
    pub fn new(threshold: AlertLevel) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> AlertLevel {
        self.threshold
    }

    /// Whether a triage severity meets the threshold
    pub fn should_speak(&self, severity: Severity) -> bool {
        AlertLevel::from(severity) >= self.threshold
    }
}

//! Batch summarization: error/warning extraction, deduplication and redaction

use crate::redact::Redactor;
use crate::types::{Digest, LogBatch};
use crate::{Error, Result};
use regex::Regex;
use std::collections::HashSet;
use tracing::trace;

/// Characters of a normalized error line used as its dedup key
pub const DEDUP_PREFIX_CHARS: usize = 100;

/// Maximum distinct error lines carried into a digest
pub const MAX_UNIQUE_ERRORS: usize = 10;

/// Converts raw batches into compact digests
#[derive(Debug, Clone)]
pub struct Summarizer {
    error_regex: Regex,
    warning_regex: Regex,
    digits_regex: Regex,
    redactor: Redactor,
}

impl Summarizer {
    /// Create a new summarizer
    pub fn new() -> Result<Self> {
        Ok(Self {
            error_regex: Regex::new(r"(?i)error|exception|fail")
                .map_err(|e| Error::configuration(format!("Failed to compile error regex: {}", e)))?,
            warning_regex: Regex::new(r"(?i)warn")
                .map_err(|e| Error::configuration(format!("Failed to compile warning regex: {}", e)))?,
            digits_regex: Regex::new(r"\d+")
                .map_err(|e| Error::configuration(format!("Failed to compile digit regex: {}", e)))?,
            redactor: Redactor::new()?,
        })
    }

    /// Reduce a batch to a digest
    ///
    /// Counts are taken before deduplication. An empty batch yields an
    /// all-zero digest.
    pub fn summarize(&self, batch: &LogBatch) -> Digest {
        let lines: Vec<&str> = batch
            .lines
            .iter()
            .map(|l| l.text.as_str())
            .filter(|l| !l.trim().is_empty())
            .collect();

        let errors: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|l| self.error_regex.is_match(l))
            .collect();
        let warnings: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|l| self.warning_regex.is_match(l))
            .collect();

        let unique = self.deduplicate(&errors);

        let mut kept = unique.clone();
        kept.extend(warnings.iter().copied());
        let excerpt = self.redactor.redact(&kept.join("\n"));
        trace!(
            lines = lines.len(),
            errors = errors.len(),
            unique = unique.len(),
            "Batch summarized"
        );

        Digest {
            total_lines: lines.len(),
            error_count: errors.len(),
            warning_count: warnings.len(),
            unique_errors: unique.len(),
            excerpt,
        }
    }

    /// Dedup key: digit runs collapsed to `N`, truncated to the prefix length
    pub fn normalize(&self, line: &str) -> String {
        self.digits_regex
            .replace_all(line, "N")
            .chars()
            .take(DEDUP_PREFIX_CHARS)
            .collect()
    }

    /// First occurrence of each key, in order, capped
    fn deduplicate<'a>(&self, errors: &[&'a str]) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        errors
            .iter()
            .copied()
            .filter(|line| seen.insert(self.normalize(line)))
            .take(MAX_UNIQUE_ERRORS)
            .collect()
    }
}

impl Default for Summarizer {
    fn default() -> Self {
        Self::new().expect("Failed to create summarizer")
    }
}

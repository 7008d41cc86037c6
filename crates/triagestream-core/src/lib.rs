//! triagestream core
//!
//! Core types and the pure, synchronous front half of the triage pipeline.
//!
//! This crate provides:
//! - The error taxonomy shared by every stage
//! - Data model for lines, batches, digests and model results
//! - Batch accumulation with size/age flushing
//! - Redaction of emails, API keys and bearer tokens
//! - Summarization of batches into deduplicated digests

pub mod batch;
pub mod error;
pub mod redact;
pub mod summarize;
pub mod types;

pub use batch::BatchAccumulator;
pub use error::{Error, Result};
pub use redact::{redact, Redactor};
pub use summarize::Summarizer;
pub use types::{DeepAnalysisResult, Digest, LogBatch, LogLine, Severity, TriageResult};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::batch::BatchAccumulator;
    pub use crate::error::{Error, Result};
    pub use crate::summarize::Summarizer;
    pub use crate::types::{DeepAnalysisResult, Digest, LogBatch, Severity, TriageResult};
}

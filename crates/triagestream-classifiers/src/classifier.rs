//! Classifier and analyzer traits and common types

use async_trait::async_trait;
use triagestream_core::{DeepAnalysisResult, Result, TriageResult};

/// Fast, low-cost severity triage of a digest
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the rendered digest text
    ///
    /// Transport failures and unparseable responses both surface as
    /// [`Error::Classification`](triagestream_core::Error::Classification).
    async fn triage(&self, digest: &str) -> Result<Completion<TriageResult>>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

/// Slower, higher-cost root-cause analysis
#[async_trait]
pub trait DeepAnalyzer: Send + Sync {
    /// Analyze the digest, optionally with source code context appended
    async fn analyze(
        &self,
        digest: &str,
        context: Option<&str>,
    ) -> Result<Completion<DeepAnalysisResult>>;

    /// Get the analyzer name
    fn name(&self) -> &str;
}

/// A parsed model result together with its usage cost
#[derive(Debug, Clone, PartialEq)]
pub struct Completion<T> {
    pub result: T,

    /// Total tokens billed for the call (0 when not reported)
    pub tokens: u64,
}

impl<T> Completion<T> {
    pub fn new(result: T, tokens: u64) -> Self {
        Self { result, tokens }
    }
}

//! Gemini `generateContent` client
//!
//! One client serves both light triage and deep analysis; the two differ
//! only in prompt and in how failures are reported.

use crate::classifier::{Classifier, Completion, DeepAnalyzer};
use crate::response::{analysis_prompt, parse_analysis, parse_triage, triage_prompt};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use triagestream_core::{DeepAnalysisResult, Error, Result, TriageResult};

/// Default API base
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Client settings
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// HTTP client for the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a client; fails with a configuration error on an empty key
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::configuration("Gemini API key is empty"));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a prompt and return the response text plus token usage
    async fn generate(&self, prompt: String) -> std::result::Result<(String, u64), String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        debug!(model = %self.config.model, "Sending generateContent request");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(format!("API returned {}: {}", status, detail));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| format!("invalid response body: {}", e))?;

        let tokens = parsed.total_tokens();
        let text = parsed
            .text()
            .ok_or_else(|| "response contained no candidates".to_string())?;

        Ok((text, tokens))
    }
}

#[async_trait]
impl Classifier for GeminiClient {
    async fn triage(&self, digest: &str) -> Result<Completion<TriageResult>> {
        let (text, tokens) = self
            .generate(triage_prompt(digest))
            .await
            .map_err(Error::classification)?;
        Ok(Completion::new(parse_triage(&text)?, tokens))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[async_trait]
impl DeepAnalyzer for GeminiClient {
    async fn analyze(
        &self,
        digest: &str,
        context: Option<&str>,
    ) -> Result<Completion<DeepAnalysisResult>> {
        let (text, tokens) = self
            .generate(analysis_prompt(digest, context))
            .await
            .map_err(Error::analysis)?;
        Ok(Completion::new(parse_analysis(&text)?, tokens))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: u64,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        Some(content.parts.iter().map(|p| p.text.as_str()).collect())
    }

    fn total_tokens(&self) -> u64 {
        self.usage_metadata
            .as_ref()
            .map(|u| u.total_token_count)
            .unwrap_or(0)
    }
}

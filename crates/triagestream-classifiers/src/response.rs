//! Prompt construction and model response parsing
//!
//! Models are asked for bare JSON but routinely wrap it in prose or
//! markdown fences. The outermost `{ ... }` span is parsed; text without
//! braces is parsed as-is.

use serde::de::DeserializeOwned;
use triagestream_core::{DeepAnalysisResult, Error, Result, TriageResult};

/// Build the light triage prompt
pub fn triage_prompt(digest: &str) -> String {
    format!(
        r#"Analyze this log batch and classify the incident. Output ONLY valid JSON with no markdown formatting.

Log Summary:
{digest}

Respond with JSON in this exact format:
{{
  "severity": "low|medium|high|critical",
  "hypothesis": "brief explanation of the issue",
  "confidence": 0.0-1.0,
  "needs_deeper": true|false
}}"#
    )
}

/// Build the deep analysis prompt
pub fn analysis_prompt(digest: &str, context: Option<&str>) -> String {
    let context = context
        .map(|c| format!("Code Context:\n{c}\n"))
        .unwrap_or_default();
    format!(
        r#"Perform deep root cause analysis on this incident. Output ONLY valid JSON with no markdown formatting.

Log Summary:
{digest}

{context}
Respond with JSON in this exact format:
{{
  "root_cause": "detailed explanation of the root cause",
  "patch_diff": "unified diff format patch suggestion",
  "affected_files": ["file1.js", "file2.js"]
}}"#
    )
}

/// Slice out the outermost JSON object, if any
pub fn extract_json(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text.trim(),
    }
}

fn parse<T: DeserializeOwned>(text: &str) -> std::result::Result<T, serde_json::Error> {
    serde_json::from_str(extract_json(text))
}

/// Parse a triage response body
pub fn parse_triage(text: &str) -> Result<TriageResult> {
    parse(text).map_err(|e| Error::classification(format!("unparseable triage response: {}", e)))
}

/// Parse a deep analysis response body
pub fn parse_analysis(text: &str) -> Result<DeepAnalysisResult> {
    parse(text).map_err(|e| Error::analysis(format!("unparseable analysis response: {}", e)))
}

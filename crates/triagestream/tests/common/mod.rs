//! Mock collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use triagestream::TriageController;
use triagestream_alerts::{
    AlertLevel, AlertPolicy, AudioSink, AudioStream, NotificationQueue, SpeechSynthesizer, Voice,
};
use triagestream_classifiers::{Classifier, Completion, DeepAnalyzer};
use triagestream_core::{DeepAnalysisResult, Error, Result, Severity, TriageResult};
use triagestream_telemetry::SessionStats;

/// Scripted classifier; falls back to a confident low-severity result
#[derive(Default)]
pub struct MockClassifier {
    script: Mutex<VecDeque<Result<TriageResult>>>,
    digests: Mutex<Vec<String>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, outcome: Result<TriageResult>) -> Self {
        self.script.lock().push_back(outcome);
        self
    }

    pub fn calls(&self) -> usize {
        self.digests.lock().len()
    }

    pub fn digests(&self) -> Vec<String> {
        self.digests.lock().clone()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn triage(&self, digest: &str) -> Result<Completion<TriageResult>> {
        self.digests.lock().push(digest.to_string());
        let next = self.script.lock().pop_front();
        let result = next.unwrap_or_else(|| Ok(TriageResult::new(Severity::Low, "routine noise", 0.9, false)))?;
        Ok(Completion::new(result, 120))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Scripted analyzer; falls back to a fixed root cause
#[derive(Default)]
pub struct MockAnalyzer {
    script: Mutex<VecDeque<Result<DeepAnalysisResult>>>,
    digests: Mutex<Vec<String>>,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, outcome: Result<DeepAnalysisResult>) -> Self {
        self.script.lock().push_back(outcome);
        self
    }

    pub fn calls(&self) -> usize {
        self.digests.lock().len()
    }

    pub fn digests(&self) -> Vec<String> {
        self.digests.lock().clone()
    }
}

#[async_trait]
impl DeepAnalyzer for MockAnalyzer {
    async fn analyze(
        &self,
        digest: &str,
        _context: Option<&str>,
    ) -> Result<Completion<DeepAnalysisResult>> {
        self.digests.lock().push(digest.to_string());
        let next = self.script.lock().pop_front();
        let result = next.unwrap_or_else(|| {
            Ok(DeepAnalysisResult {
                root_cause: "connection pool exhausted".to_string(),
                patch_diff: "+pool.max = 50".to_string(),
                affected_files: vec!["db.js".to_string()],
            })
        })?;
        Ok(Completion::new(result, 900))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Synthesizer whose audio is the message text
pub struct EchoSynthesizer;

#[async_trait]
impl SpeechSynthesizer for EchoSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Bytes> {
        Ok(Bytes::from(text.to_string()))
    }

    async fn synthesize_stream(&self, _text: &str) -> Result<AudioStream> {
        Err(Error::synthesis("streaming not supported by mock"))
    }
}

/// Sink that records every message it plays
#[derive(Default)]
pub struct RecordingSink {
    spoken: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn play(&self, audio: Bytes) -> Result<()> {
        self.spoken.lock().push(String::from_utf8_lossy(&audio).into_owned());
        Ok(())
    }

    async fn play_stream(&self, _audio: AudioStream) -> Result<()> {
        Err(Error::playback("streaming not supported by mock"))
    }
}

/// Controller plus handles to everything it talks to
pub struct Harness {
    pub controller: TriageController,
    pub classifier: Arc<MockClassifier>,
    pub analyzer: Arc<MockAnalyzer>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    /// Controller with a voice queue speaking `warning` and above
    pub fn new(classifier: MockClassifier, analyzer: MockAnalyzer) -> Self {
        let classifier = Arc::new(classifier);
        let analyzer = Arc::new(analyzer);
        let sink = Arc::new(RecordingSink::default());

        let queue = NotificationQueue::new(
            Voice {
                synthesizer: Arc::new(EchoSynthesizer),
                sink: sink.clone(),
                streaming: false,
            },
            AlertPolicy::new(AlertLevel::Warning),
        );
        let controller = TriageController::new(
            classifier.clone(),
            analyzer.clone(),
            SessionStats::new(),
            queue,
        );

        Self {
            controller,
            classifier,
            analyzer,
            sink,
        }
    }

    /// Wait for background alerts, then report what was spoken
    pub async fn spoken(&self) -> Vec<String> {
        self.controller.alerts().wait_idle().await;
        self.sink.spoken()
    }
}

/// `Total lines: N` from a rendered digest
pub fn digest_lines(digest: &str) -> usize {
    digest
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("Total lines: "))
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

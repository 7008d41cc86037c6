//! Priority-aware spoken alert queue
//!
//! All speech goes through a single playback slot. Normal requests are
//! played in FIFO order. A priority request clears everything pending
//! and is played next; it never interrupts audio that is already playing.
//!
//! Draining is an explicit loop: whichever caller finds the slot free
//! owns it and keeps popping the head until the queue is empty. Callers
//! that find the slot taken return immediately, and the owner picks up
//! their requests when its current playback ends.

use crate::audio::AudioSink;
use crate::policy::AlertPolicy;
use crate::speech::SpeechSynthesizer;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use triagestream_core::{DeepAnalysisResult, Result, Severity, TriageResult};

/// A pending spoken alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub text: String,

    /// Clears the pending queue when enqueued
    pub priority: bool,
}

impl NotificationRequest {
    pub fn normal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority: false,
        }
    }

    pub fn priority(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority: true,
        }
    }
}

/// Speech output collaborators
#[derive(Clone)]
pub struct Voice {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub sink: Arc<dyn AudioSink>,

    /// Pipe audio to the sink while it is still being synthesized
    pub streaming: bool,
}

impl Voice {
    /// Synthesize and play one message, bypassing any queue
    pub async fn say(&self, text: &str) -> Result<()> {
        if self.streaming {
            let audio = self.synthesizer.synthesize_stream(text).await?;
            self.sink.play_stream(audio).await
        } else {
            let audio = self.synthesizer.synthesize(text).await?;
            self.sink.play(audio).await
        }
    }
}

/// Longest a single message may hold the playback slot
pub const DEFAULT_PLAYBACK_TIMEOUT: Duration = Duration::from_secs(60);

/// Spoken alert queue; clones share the same queue and playback slot
#[derive(Clone)]
pub struct NotificationQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    /// `None` when voice is disabled; every request is then dropped
    voice: Option<Voice>,
    policy: AlertPolicy,
    playback_timeout: Duration,
    state: Mutex<QueueState>,
    idle: Notify,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<NotificationRequest>,
    playing: bool,
}

/// Releases the playback slot even if the draining future is dropped
struct SlotGuard<'a> {
    state: &'a Mutex<QueueState>,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().playing = false;
    }
}

impl NotificationQueue {
    /// Create an active queue
    pub fn new(voice: Voice, policy: AlertPolicy) -> Self {
        Self::with_timeout(voice, policy, DEFAULT_PLAYBACK_TIMEOUT)
    }

    /// Create an active queue whose messages are abandoned after `playback_timeout`
    pub fn with_timeout(voice: Voice, policy: AlertPolicy, playback_timeout: Duration) -> Self {
        Self::build(Some(voice), policy, playback_timeout)
    }

    /// Create a queue that accepts and drops everything
    pub fn disabled() -> Self {
        Self::build(None, AlertPolicy::default(), DEFAULT_PLAYBACK_TIMEOUT)
    }

    fn build(voice: Option<Voice>, policy: AlertPolicy, playback_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                voice,
                policy,
                playback_timeout,
                state: Mutex::new(QueueState::default()),
                idle: Notify::new(),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.voice.is_some()
    }

    pub fn policy(&self) -> AlertPolicy {
        self.inner.policy
    }

    /// Number of requests waiting for the slot
    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Whether a message is currently being spoken
    pub fn is_playing(&self) -> bool {
        self.inner.state.lock().playing
    }

    /// Drop every pending request; in-flight playback is unaffected
    pub fn clear(&self) {
        self.inner.state.lock().pending.clear();
    }

    /// Add a request without starting playback
    ///
    /// A priority request discards all pending requests first. Returns
    /// `false` when the queue is disabled.
    pub fn enqueue(&self, request: NotificationRequest) -> bool {
        if !self.is_enabled() {
            return false;
        }

        let mut state = self.inner.state.lock();
        if request.priority {
            let dropped = state.pending.len();
            state.pending.clear();
            if dropped > 0 {
                debug!(dropped, "Priority alert cleared pending alerts");
            }
        }
        state.pending.push_back(request);
        true
    }

    /// Play pending requests until the queue is empty
    ///
    /// Returns immediately if another caller holds the playback slot.
    /// Playback failures and timeouts are logged and the failed request is
    /// discarded.
    pub async fn drain(&self) {
        let Some(voice) = &self.inner.voice else {
            return;
        };

        loop {
            let request = {
                let mut state = self.inner.state.lock();
                if state.playing {
                    return;
                }
                match state.pending.pop_front() {
                    Some(request) => {
                        state.playing = true;
                        request
                    }
                    None => break,
                }
            };

            let _slot = SlotGuard {
                state: &self.inner.state,
            };
            debug!(priority = request.priority, "Speaking alert");
            let limit = self.inner.playback_timeout;
            match tokio::time::timeout(limit, voice.say(&request.text)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Voice playback error"),
                Err(_) => warn!(timeout_ms = limit.as_millis() as u64, "Voice playback timed out"),
            }
        }

        self.inner.idle.notify_waiters();
    }

    /// Wait until nothing is pending or playing
    ///
    /// Only meaningful after [`speak`](Self::speak); requests added with a
    /// bare [`enqueue`](Self::enqueue) are not drained by anyone.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            {
                let state = self.inner.state.lock();
                if !state.playing && state.pending.is_empty() {
                    return;
                }
            }
            notified.await;
        }
    }

    /// Queue a message and start playback
    ///
    /// Priority messages are drained inline, so the call returns once the
    /// message has been spoken (or handed to the current slot owner).
    /// Normal messages are drained in a background task.
    pub async fn speak(&self, text: impl Into<String>, priority: bool) {
        let request = NotificationRequest {
            text: text.into(),
            priority,
        };
        if !self.enqueue(request) {
            return;
        }

        if priority {
            self.drain().await;
        } else {
            let queue = self.clone();
            tokio::spawn(async move { queue.drain().await });
        }
    }

    /// Announce a triage outcome if it meets the severity threshold
    ///
    /// Critical outcomes are spoken with priority.
    pub async fn speak_triage(&self, result: &TriageResult, escalating: bool) {
        if !self.is_enabled() {
            return;
        }
        if !self.inner.policy.should_speak(result.severity) {
            info!(
                severity = %result.severity,
                threshold = %self.inner.policy.threshold(),
                "Skipping voice alert"
            );
            return;
        }

        let message = triage_message(result, escalating);
        info!(message = %preview(&message), "Speaking triage alert");
        self.speak(message, result.severity == Severity::Critical).await;
    }

    /// Announce a deep analysis outcome
    pub async fn speak_deep_analysis(&self, result: &DeepAnalysisResult) {
        if !self.is_enabled() {
            return;
        }
        let message = analysis_message(result);
        info!(message = %preview(&message), "Speaking analysis alert");
        self.speak(message, false).await;
    }

    /// Announce a pipeline error with priority
    pub async fn speak_error(&self, error: &str) {
        self.speak(format!("Error: {}", error), true).await;
    }
}

/// Spoken text for a triage outcome
pub fn triage_message(result: &TriageResult, escalating: bool) -> String {
    let confidence = (result.confidence * 100.0).round() as u32;
    let mut message = format!(
        "{} alert. {}. Confidence: {} percent.",
        result.severity.as_str().to_uppercase(),
        result.hypothesis.trim_end_matches('.'),
        confidence
    );
    if escalating {
        message.push_str(" Escalating to deep analysis.");
    }
    message
}

/// Spoken text for a deep analysis outcome
pub fn analysis_message(result: &DeepAnalysisResult) -> String {
    let mut message = format!(
        "Root cause identified: {}.",
        result.root_cause.trim_end_matches('.')
    );
    if result.has_patch() {
        message.push_str(" Patch generated and ready for review.");
    }
    message
}

fn preview(message: &str) -> String {
    message.chars().take(50).collect()
}

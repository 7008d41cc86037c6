//! Text-to-speech through the ElevenLabs API

use crate::audio::AudioStream;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use triagestream_core::{Error, Result};

/// Default API base
pub const DEFAULT_ENDPOINT: &str = "https://api.elevenlabs.io";

/// Default synthesis model
pub const DEFAULT_MODEL: &str = "eleven_multilingual_v2";

/// Default voice ("George")
pub const DEFAULT_VOICE_ID: &str = "JBFqnCBsd6RMkjVDRZzb";

/// Default bound on one synthesis request, body included
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Turns alert text into encoded audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize the whole clip before returning
    async fn synthesize(&self, text: &str) -> Result<Bytes>;

    /// Start synthesis and return the audio as it is produced
    async fn synthesize_stream(&self, text: &str) -> Result<AudioStream>;
}

/// Voice tuning sent with every request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

/// ElevenLabs client settings
#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    pub model: String,
    pub voice_id: String,
    pub endpoint: String,
    pub settings: VoiceSettings,
    pub timeout: Duration,
}

impl ElevenLabsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            settings: VoiceSettings::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// ElevenLabs text-to-speech client
#[derive(Debug, Clone)]
pub struct ElevenLabsSynthesizer {
    http: reqwest::Client,
    config: ElevenLabsConfig,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

impl ElevenLabsSynthesizer {
    /// Create a synthesizer; fails with a configuration error on an empty key
    pub fn new(config: ElevenLabsConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::configuration("ElevenLabs API key is empty"));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    fn url(&self, streaming: bool) -> String {
        let base = format!(
            "{}/v1/text-to-speech/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.voice_id
        );
        if streaming {
            format!("{}/stream", base)
        } else {
            base
        }
    }

    fn body<'a>(&'a self, text: &'a str) -> SpeechRequest<'a> {
        SpeechRequest {
            text,
            model_id: &self.config.model,
            voice_settings: self.config.settings,
        }
    }

    async fn send(&self, text: &str, streaming: bool) -> Result<reqwest::Response> {
        debug!(voice = %self.config.voice_id, streaming, "Requesting speech");

        let response = self
            .http
            .post(self.url(streaming))
            .header("xi-api-key", &self.config.api_key)
            .header("accept", "audio/mpeg")
            .json(&self.body(text))
            .send()
            .await
            .map_err(|e| Error::synthesis(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::synthesis(format!(
                "ElevenLabs API error: {} - {}",
                status.as_u16(),
                detail
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Bytes> {
        self.send(text, false)
            .await?
            .bytes()
            .await
            .map_err(|e| Error::synthesis(format!("failed to read audio: {}", e)))
    }

    async fn synthesize_stream(&self, text: &str) -> Result<AudioStream> {
        let response = self.send(text, true).await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| Error::synthesis(format!("audio stream failed: {}", e))))
            .boxed())
    }
}

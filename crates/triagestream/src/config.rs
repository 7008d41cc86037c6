//! Application configuration
//!
//! Settings come from an optional YAML file; API keys in the environment
//! take priority over the file. Nothing here is ever written back.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use triagestream_alerts::{
    AlertLevel, AlertPolicy, ElevenLabsConfig, ElevenLabsSynthesizer, NotificationQueue,
    ProcessAudioSink, Voice, VoiceSettings,
};
use triagestream_classifiers::{GeminiClient, GeminiConfig};
use triagestream_core::{Error, Result};

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "triagestream.yaml";

/// Environment variable holding the classifier key
pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";

/// Environment variable holding the speech key
pub const ELEVENLABS_KEY_VAR: &str = "ELEVENLABS_API_KEY";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gemini API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Gemini model used for both triage and analysis
    #[serde(default = "default_model")]
    pub model: String,

    /// Gemini API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout for model calls
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Spoken alert settings
    #[serde(default)]
    pub voice: VoiceConfig,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// With no explicit path, `triagestream.yaml` in the working directory
    /// is tried first, then `triagestream/config.yaml` in the user config
    /// directory. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_path(path) {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "Loading configuration");
                Self::from_file(&path)?
            }
            _ => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse a YAML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| {
            Error::configuration(format!("invalid config file {}: {}", path.display(), e))
        })
    }

    /// Let environment keys take priority over file values
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(GEMINI_KEY_VAR) {
            self.api_key = Some(key);
        }
        if let Some(key) = non_empty(ELEVENLABS_KEY_VAR) {
            self.voice.api_key = Some(key);
        }
    }

    /// Apply a `--voice` / `--no-voice` override
    pub fn override_voice(&mut self, enabled: Option<bool>) {
        if let Some(enabled) = enabled {
            self.voice.enabled = enabled;
        }
    }

    /// The classifier key, or a configuration error if none is set
    pub fn classifier_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                Error::configuration(format!(
                    "Gemini API key not configured; set {} or api_key in {}",
                    GEMINI_KEY_VAR, DEFAULT_CONFIG_FILE
                ))
            })
    }

    /// Build the model client used for triage and deep analysis
    pub fn gemini_client(&self) -> Result<GeminiClient> {
        let mut gemini = GeminiConfig::new(self.classifier_key()?);
        gemini.model = self.model.clone();
        gemini.endpoint = self.endpoint.clone();
        gemini.timeout = Duration::from_secs(self.request_timeout_secs);
        GeminiClient::new(gemini)
    }

    /// Build the speech pipeline regardless of `voice.enabled`
    pub fn voice(&self) -> Result<Voice> {
        let key = self
            .voice
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::configuration(format!(
                    "ElevenLabs API key not configured; set {} or voice.api_key",
                    ELEVENLABS_KEY_VAR
                ))
            })?;

        let mut speech = ElevenLabsConfig::new(key);
        speech.model = self.voice.model.clone();
        speech.voice_id = self.voice.voice_id.clone();
        if let Some(endpoint) = &self.voice.endpoint {
            speech.endpoint = endpoint.clone();
        }
        speech.settings = self.voice.settings();
        speech.timeout = Duration::from_secs(self.voice.request_timeout_secs);

        Ok(Voice {
            synthesizer: Arc::new(ElevenLabsSynthesizer::new(speech)?),
            sink: Arc::new(self.voice.player_sink()?),
            streaming: self.voice.streaming,
        })
    }

    /// Build the alert queue
    ///
    /// Voice problems never stop triage: a disabled or unusable voice
    /// setup yields a queue that drops everything.
    pub fn notification_queue(&self) -> NotificationQueue {
        if !self.voice.enabled {
            debug!("Voice alerts disabled");
            return NotificationQueue::disabled();
        }

        match self.voice() {
            Ok(voice) => {
                info!(
                    threshold = %self.voice.severity_threshold,
                    streaming = self.voice.streaming,
                    "Voice alerts enabled"
                );
                NotificationQueue::with_timeout(
                    voice,
                    AlertPolicy::new(self.voice.severity_threshold),
                    Duration::from_secs(self.voice.playback_timeout_secs),
                )
            }
            Err(e) => {
                warn!(error = %e, "Voice alerts disabled");
                NotificationQueue::disabled()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
            request_timeout_secs: default_timeout_secs(),
            voice: VoiceConfig::default(),
        }
    }
}

/// Spoken alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default)]
    pub enabled: bool,

    /// ElevenLabs API key
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_voice_model")]
    pub model: String,

    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    /// ElevenLabs API base URL override
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Least severe alert level that is spoken
    #[serde(default)]
    pub severity_threshold: AlertLevel,

    /// Play audio while it is still being synthesized
    #[serde(default = "default_true")]
    pub streaming: bool,

    #[serde(default = "default_stability")]
    pub stability: f32,

    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,

    #[serde(default)]
    pub style: f32,

    #[serde(default = "default_true")]
    pub use_speaker_boost: bool,

    /// Player command reading encoded audio from stdin
    #[serde(default = "default_player")]
    pub player: Vec<String>,

    /// Per-request timeout for speech synthesis
    #[serde(default = "default_voice_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Longest one alert may take to synthesize and play
    #[serde(default = "default_playback_timeout_secs")]
    pub playback_timeout_secs: u64,
}

impl VoiceConfig {
    pub fn settings(&self) -> VoiceSettings {
        VoiceSettings {
            stability: self.stability,
            similarity_boost: self.similarity_boost,
            style: self.style,
            use_speaker_boost: self.use_speaker_boost,
        }
    }

    fn player_sink(&self) -> Result<ProcessAudioSink> {
        let (program, args) = self
            .player
            .split_first()
            .ok_or_else(|| Error::configuration("voice.player must name a program"))?;
        Ok(ProcessAudioSink::new(program.clone(), args.to_vec()))
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        let settings = VoiceSettings::default();
        Self {
            enabled: false,
            api_key: None,
            model: default_voice_model(),
            voice_id: default_voice_id(),
            endpoint: None,
            severity_threshold: AlertLevel::default(),
            streaming: true,
            stability: settings.stability,
            similarity_boost: settings.similarity_boost,
            style: settings.style,
            use_speaker_boost: settings.use_speaker_boost,
            player: default_player(),
            request_timeout_secs: default_voice_timeout_secs(),
            playback_timeout_secs: default_playback_timeout_secs(),
        }
    }
}

fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir().map(|dir| dir.join("triagestream").join("config.yaml"))
}

fn default_model() -> String {
    triagestream_classifiers::gemini::DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    triagestream_classifiers::gemini::DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_voice_timeout_secs() -> u64 {
    triagestream_alerts::speech::DEFAULT_TIMEOUT.as_secs()
}

fn default_playback_timeout_secs() -> u64 {
    triagestream_alerts::queue::DEFAULT_PLAYBACK_TIMEOUT.as_secs()
}

fn default_voice_model() -> String {
    triagestream_alerts::speech::DEFAULT_MODEL.to_string()
}

fn default_voice_id() -> String {
    triagestream_alerts::speech::DEFAULT_VOICE_ID.to_string()
}

fn default_stability() -> f32 {
    0.5
}

fn default_similarity_boost() -> f32 {
    0.75
}

fn default_player() -> Vec<String> {
    ["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet", "-"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.request_timeout_secs, 60);
        assert!(!config.voice.enabled);
        assert_eq!(config.voice.voice_id, "JBFqnCBsd6RMkjVDRZzb");
        assert_eq!(config.voice.severity_threshold, AlertLevel::Warning);
        assert!(config.voice.streaming);
        assert_eq!(config.voice.player[0], "ffplay");
        assert_eq!(config.voice.request_timeout_secs, 30);
        assert_eq!(config.voice.playback_timeout_secs, 60);
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_key: file-key\nmodel: gemini-2.5-pro\nvoice:\n  enabled: true\n  severity_threshold: error\n  streaming: false\n  playback_timeout_secs: 15"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.request_timeout_secs, 60);
        assert!(config.voice.enabled);
        assert_eq!(config.voice.severity_threshold, AlertLevel::Error);
        assert!(!config.voice.streaming);
        assert_eq!(config.voice.model, "eleven_multilingual_v2");
        assert_eq!(config.voice.stability, 0.5);
        assert_eq!(config.voice.playback_timeout_secs, 15);
        assert_eq!(config.voice.request_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_file_is_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "voice:\n  severity_threshold: deafening").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_missing_explicit_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(Some(&dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(config.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = AppConfig {
            api_key: Some("file-key".to_string()),
            ..Default::default()
        };
        config.apply_env(env(&[(GEMINI_KEY_VAR, "env-key"), (ELEVENLABS_KEY_VAR, "voice-key")]));
        assert_eq!(config.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.voice.api_key.as_deref(), Some("voice-key"));

        // empty variables do not clobber configured keys
        config.apply_env(env(&[(GEMINI_KEY_VAR, "  ")]));
        assert_eq!(config.api_key.as_deref(), Some("env-key"));
    }

    #[test]
    fn test_missing_classifier_key() {
        let config = AppConfig::default();
        let err = config.gemini_client().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains(GEMINI_KEY_VAR));
    }

    #[test]
    fn test_voice_override() {
        let mut config = AppConfig::default();
        config.override_voice(None);
        assert!(!config.voice.enabled);
        config.override_voice(Some(true));
        assert!(config.voice.enabled);
        config.override_voice(Some(false));
        assert!(!config.voice.enabled);
    }

    #[test]
    fn test_missing_voice_key_disables_queue() {
        let mut config = AppConfig::default();
        config.voice.enabled = true;

        assert!(matches!(config.voice(), Err(Error::Configuration(_))));
        assert!(!config.notification_queue().is_enabled());
    }

    #[test]
    fn test_enabled_voice_builds_queue() {
        let mut config = AppConfig::default();
        config.voice.enabled = true;
        config.voice.api_key = Some("voice-key".to_string());
        config.voice.severity_threshold = AlertLevel::Critical;

        let queue = config.notification_queue();
        assert!(queue.is_enabled());
        assert_eq!(queue.policy().threshold(), AlertLevel::Critical);
    }

    #[test]
    fn test_empty_player_rejected() {
        let mut config = AppConfig::default();
        config.voice.api_key = Some("voice-key".to_string());
        config.voice.player.clear();
        assert!(matches!(config.voice(), Err(Error::Configuration(_))));
    }
}

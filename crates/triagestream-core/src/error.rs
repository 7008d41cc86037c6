//! Error types for triagestream

/// Result type alias using triagestream's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for triagestream operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Light triage call failed or returned unparseable data
    #[error("classification error: {0}")]
    Classification(String),

    /// Deep analysis call failed or returned unparseable data
    #[error("analysis error: {0}")]
    Analysis(String),

    /// Audio output failed
    #[error("playback error: {0}")]
    Playback(String),

    /// Text-to-speech service failed
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Missing credentials or invalid settings, detected before any call
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new classification error
    pub fn classification(msg: impl Into<String>) -> Self {
        Self::Classification(msg.into())
    }

    /// Create a new analysis error
    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::Analysis(msg.into())
    }

    /// Create a new playback error
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    /// Create a new synthesis error
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether this error belongs to the voice path and must never reach triage
    pub fn is_voice(&self) -> bool {
        matches!(self, Self::Playback(_) | Self::Synthesis(_))
    }
}

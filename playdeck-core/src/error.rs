use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - please review it and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Missing required config field: {field}")]
    ConfigMissingField { field: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // Engine errors
    #[error("Audio engine failed: {reason}")]
    Engine { reason: String },

    #[error("Could not connect to voice channel: {reason}")]
    VoiceConnection { reason: String },

    // Interaction errors
    #[error("No handler registered for control {custom_id}")]
    UnknownControl { custom_id: String },

    #[error("Malformed interaction: {reason}")]
    MalformedInteraction { reason: String },
}

impl CoreError {
    /// Whether this error came from the audio engine and should be reported
    /// to the requesting user instead of propagated.
    #[must_use]
    pub const fn is_engine_failure(&self) -> bool {
        matches!(self, Self::Engine { .. } | Self::VoiceConnection { .. })
    }
}

/// Failure to push a payload to a chat surface.
///
/// No distinction is drawn between the variants when deciding what to do
/// with the surface; they exist for logging.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("surface no longer exists")]
    Gone,

    #[error("surface rejected the edit: {reason}")]
    Rejected { reason: String },

    #[error("transport failure: {reason}")]
    Transport { reason: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;

use playdeck_core::{CoreError, ScopeId, VoiceChannelId};
use thiserror::Error;

/// Errors raised by the in-memory engine.
#[derive(Debug, Error)]
pub enum MemoryEngineError {
    /// The voice channel is listed as unreachable.
    #[error("voice channel {channel} is unreachable")]
    ChannelUnreachable { channel: VoiceChannelId },

    /// Playback was requested before joining a voice channel.
    #[error("scope {scope} has no voice connection")]
    NotConnected { scope: ScopeId },
}

impl From<MemoryEngineError> for CoreError {
    fn from(err: MemoryEngineError) -> Self {
        match err {
            MemoryEngineError::ChannelUnreachable { .. } => Self::VoiceConnection {
                reason: err.to_string(),
            },
            MemoryEngineError::NotConnected { .. } => Self::Engine {
                reason: err.to_string(),
            },
        }
    }
}

/// Convenience type alias for Results with `MemoryEngineError`.
pub type Result<T> = std::result::Result<T, MemoryEngineError>;

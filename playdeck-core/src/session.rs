//! Read-only view of a scope's playback session.
//!
//! Sessions are owned by the audio engine. Everything here is a copy taken
//! at one instant; handlers must fetch a new snapshot after every await that
//! may have let another interaction mutate the session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::time::total_duration;

/// Opaque identifier of one community, stable for the lifetime of its session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Voice channel a requester is currently connected to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceChannelId(String);

impl VoiceChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoiceChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Community member who requested a track or triggered an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: String,
    /// Display tag shown on the player panel
    pub tag: String,
    pub avatar_url: Option<String>,
}

impl Requester {
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            avatar_url: None,
        }
    }

    #[must_use]
    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

/// A resolved track, opaque beyond what rendering and selection need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub url: String,
    pub duration: Duration,
    pub requester: Requester,
    pub thumbnail: Option<String>,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        duration: Duration,
        requester: Requester,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            duration,
            requester,
            thumbnail: None,
        }
    }

    #[must_use]
    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }
}

/// Repeat behaviour applied when the current track ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    #[default]
    Off,
    Queue,
    Track,
}

impl RepeatMode {
    pub const ALL: [Self; 3] = [Self::Off, Self::Queue, Self::Track];

    /// Stable value carried by the loop selector options.
    #[must_use]
    pub const fn as_value(self) -> &'static str {
        match self {
            Self::Off => "0",
            Self::Queue => "1",
            Self::Track => "2",
        }
    }

    #[must_use]
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_value() == value)
    }
}

/// Coarse player state derived from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Playing,
    Paused,
}

/// Copy of the engine's session state for one scope
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    /// Track currently loaded in the player (None when idle)
    pub current: Option<Track>,
    pub paused: bool,
    pub repeat_mode: RepeatMode,
    /// Tracks queued after the current one, in play order
    pub pending: Vec<Track>,
    /// Whether the engine holds a voice connection for this scope
    pub connected: bool,
    /// Set once the engine has torn the session down
    pub terminated: bool,
}

impl SessionSnapshot {
    #[must_use]
    pub const fn state(&self) -> PlayerState {
        if self.terminated || self.current.is_none() {
            PlayerState::Idle
        } else if self.paused {
            PlayerState::Paused
        } else {
            PlayerState::Playing
        }
    }

    /// The track being played, ignoring terminated sessions.
    #[must_use]
    pub fn now_playing(&self) -> Option<&Track> {
        if self.terminated {
            None
        } else {
            self.current.as_ref()
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() != PlayerState::Idle
    }

    /// Total duration of every pending track.
    #[must_use]
    pub fn pending_duration(&self) -> Duration {
        total_duration(self.pending.iter().map(|track| &track.duration))
    }
}

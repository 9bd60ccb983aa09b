//! In-memory engine configuration.

use const_format::concatcp;
use playdeck_core::{CoreError, EnginesConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Engine name used in config file
pub const ENGINE_NAME: &str = "memory";

/// Default capacity of the lifecycle event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// A track the engine can resolve queries to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Track length in milliseconds
    pub duration_ms: u64,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// A named list of catalog track ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPlaylist {
    pub name: String,
    pub tracks: Vec<String>,
}

/// In-memory engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEngineConfig {
    #[serde(default)]
    pub tracks: Vec<CatalogTrack>,
    #[serde(default)]
    pub playlists: Vec<CatalogPlaylist>,
    /// Voice channels that refuse connections
    #[serde(default)]
    pub unreachable_channels: Vec<String>,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

const fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

impl Default for MemoryEngineConfig {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            playlists: Vec::new(),
            unreachable_channels: Vec::new(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl MemoryEngineConfig {
    /// Extract the memory engine config from the dynamic engines config.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be parsed.
    pub fn from_engines(engines: &EnginesConfig) -> Result<Option<Self>, CoreError> {
        engines.get(ENGINE_NAME)
    }

    /// Check that the catalog is consistent.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate track ids, playlists naming unknown
    /// tracks, or a zero event capacity.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.event_capacity == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "engines.memory.event_capacity must be at least 1".into(),
            });
        }

        let mut ids = HashSet::new();
        for track in &self.tracks {
            if track.id.is_empty() {
                return Err(CoreError::ConfigMissingField {
                    field: "engines.memory.tracks.id".into(),
                });
            }
            if !ids.insert(track.id.as_str()) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("duplicate track id '{}' in engines.memory.tracks", track.id),
                });
            }
        }

        for playlist in &self.playlists {
            if let Some(missing) = playlist.tracks.iter().find(|id| !ids.contains(id.as_str())) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "playlist '{}' references unknown track '{}'",
                        playlist.name, missing
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Config template for the in-memory engine.
/// This is appended to the base config template when creating a new config file.
pub const CONFIG_TEMPLATE: &str = concatcp!(
    "[engines.",
    ENGINE_NAME,
    r#"]
# Voice channel ids that refuse connections (for trying out error paths)
unreachable_channels = []

[[engines.memory.tracks]]
id = "never-gonna"
title = "Never Gonna Give You Up"
url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
duration_ms = 213000

[[engines.memory.tracks]]
id = "take-on-me"
title = "Take On Me"
url = "https://www.youtube.com/watch?v=djV11Xbc914"
duration_ms = 225000

[[engines.memory.playlists]]
name = "eighties"
tracks = ["never-gonna", "take-on-me"]

"#
);

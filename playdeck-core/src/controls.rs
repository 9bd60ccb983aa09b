//! Stable identifiers attached to the player's buttons, menus and form.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CoreError;

/// Identifies an interactive control or form.
///
/// The string form is what the chat platform echoes back when the control is
/// used, so it must not change once messages carrying it have been sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlId {
    #[serde(rename = "playButton")]
    PlayButton,
    #[serde(rename = "stopButton")]
    StopButton,
    #[serde(rename = "addTrackButton")]
    AddTrackButton,
    #[serde(rename = "removeTrackButton")]
    RemoveTrackButton,
    #[serde(rename = "shuffleButton")]
    ShuffleButton,
    #[serde(rename = "loopButton")]
    LoopButton,
    #[serde(rename = "trackSelectMenu")]
    TrackSelectMenu,
    #[serde(rename = "loopSelectMenu")]
    LoopSelectMenu,
    #[serde(rename = "removeTrackSelectMenu")]
    RemoveTrackSelectMenu,
    /// Text field inside the add-track form
    #[serde(rename = "trackInput")]
    TrackInput,
    #[serde(rename = "addTrackModal")]
    AddTrackModal,
}

impl ControlId {
    pub const ALL: [Self; 11] = [
        Self::PlayButton,
        Self::StopButton,
        Self::AddTrackButton,
        Self::RemoveTrackButton,
        Self::ShuffleButton,
        Self::LoopButton,
        Self::TrackSelectMenu,
        Self::LoopSelectMenu,
        Self::RemoveTrackSelectMenu,
        Self::TrackInput,
        Self::AddTrackModal,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PlayButton => "playButton",
            Self::StopButton => "stopButton",
            Self::AddTrackButton => "addTrackButton",
            Self::RemoveTrackButton => "removeTrackButton",
            Self::ShuffleButton => "shuffleButton",
            Self::LoopButton => "loopButton",
            Self::TrackSelectMenu => "trackSelectMenu",
            Self::LoopSelectMenu => "loopSelectMenu",
            Self::RemoveTrackSelectMenu => "removeTrackSelectMenu",
            Self::TrackInput => "trackInput",
            Self::AddTrackModal => "addTrackModal",
        }
    }
}

impl std::fmt::Display for ControlId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| CoreError::UnknownControl {
                custom_id: s.to_string(),
            })
    }
}

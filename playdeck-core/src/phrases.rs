//! Display text used by the renderer and handlers.

use std::time::Duration;

use crate::session::RepeatMode;
use crate::time::DurationExt;

/// Text table for everything the player shows to users.
///
/// Kept as a plain value so rendering stays a pure function of its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrases {
    pub play_button_emoji: &'static str,
    pub stop_button_emoji: &'static str,
    pub shuffle_button_emoji: &'static str,
    pub add_track_button_emoji: &'static str,
    pub remove_track_button_emoji: &'static str,
    pub loop_button_emoji: &'static str,
    pub nothing_playing_title: &'static str,
    pub duration_field_name: &'static str,
    pub loop_field_name: &'static str,
    pub pause_field_name: &'static str,
    pub pause_enabled: &'static str,
    pub pause_disabled: &'static str,
    pub loop_off: &'static str,
    pub loop_queue: &'static str,
    pub loop_track: &'static str,
    pub loop_select_placeholder: &'static str,
    pub remove_select_placeholder: &'static str,
    pub add_track_form_title: &'static str,
    pub track_input_label: &'static str,
    pub tracks_not_found: &'static str,
    pub should_be_in_voice_channel: &'static str,
    pub could_not_connect_to_voice_channel: &'static str,
    pub no_tracks_in_queue: &'static str,
    pub engine_failure: &'static str,
}

impl Default for Phrases {
    fn default() -> Self {
        Self {
            play_button_emoji: "\u{23ef}\u{fe0f}",
            stop_button_emoji: "\u{23f9}\u{fe0f}",
            shuffle_button_emoji: "\u{1f500}",
            add_track_button_emoji: "\u{2795}",
            remove_track_button_emoji: "\u{2796}",
            loop_button_emoji: "\u{1f501}",
            nothing_playing_title: "Nothing is playing right now",
            duration_field_name: "Duration",
            loop_field_name: "Repeat",
            pause_field_name: "Pause",
            pause_enabled: "On",
            pause_disabled: "Off",
            loop_off: "Off",
            loop_queue: "Queue",
            loop_track: "Track",
            loop_select_placeholder: "Choose a repeat mode",
            remove_select_placeholder: "Choose a track to remove",
            add_track_form_title: "Add a track",
            track_input_label: "Track name or link",
            tracks_not_found: "No tracks found",
            should_be_in_voice_channel: "Join a voice channel first",
            could_not_connect_to_voice_channel: "Could not connect to your voice channel",
            no_tracks_in_queue: "There are no tracks in the queue",
            engine_failure: "The player ran into a problem, please try again",
        }
    }
}

impl Phrases {
    #[must_use]
    pub const fn loop_type(&self, mode: RepeatMode) -> &'static str {
        match mode {
            RepeatMode::Off => self.loop_off,
            RepeatMode::Queue => self.loop_queue,
            RepeatMode::Track => self.loop_track,
        }
    }

    #[must_use]
    pub fn loop_type_set(&self, mode: RepeatMode) -> String {
        format!("Repeat mode set to: {}", self.loop_type(mode))
    }

    #[must_use]
    pub fn track_removed(&self, title: &str) -> String {
        format!("Removed from the queue: {title}")
    }

    #[must_use]
    pub fn requested_by(&self, tag: &str) -> String {
        format!("Requested by {tag}")
    }

    /// Placeholder of the track-jump selector, summarising the whole queue.
    #[must_use]
    pub fn queue_summary(&self, count: usize, total: Duration) -> String {
        let noun = if count == 1 { "track" } else { "tracks" };
        format!("Up next: {count} {noun} \u{b7} {}", total.to_hms())
    }
}

//! Rendering of the player payload shown on chat surfaces.
//!
//! Every function here is pure: the same snapshot, config and phrases always
//! produce an equal [`PlayerView`] that serializes to the same bytes.

use serde::Serialize;
use std::collections::HashSet;

use crate::config::PlayerConfig;
use crate::controls::ControlId;
use crate::phrases::Phrases;
use crate::session::{RepeatMode, SessionSnapshot, Track};
use crate::time::DurationExt;

/// Complete payload pushed to a player surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub panel: Panel,
    pub controls: Vec<ControlRow>,
}

impl PlayerView {
    /// Serialize for transports that ship JSON payloads.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Whether the panel describes a playing track
    #[must_use]
    pub fn is_now_playing(&self) -> bool {
        self.panel.url.is_some()
    }

    /// Look up a control by identifier across all rows.
    #[must_use]
    pub fn control(&self, id: ControlId) -> Option<&Component> {
        self.controls
            .iter()
            .flat_map(|row| row.0.iter())
            .find(|component| component.custom_id() == id)
    }
}

/// Informational panel (title, link and fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub title: String,
    pub url: Option<String>,
    pub fields: Vec<PanelField>,
    pub thumbnail: Option<String>,
    pub author: Option<PanelAuthor>,
}

impl Panel {
    fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
            fields: Vec::new(),
            thumbnail: None,
            author: None,
        }
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelAuthor {
    pub name: String,
    pub icon_url: Option<String>,
}

/// One horizontal row of interactive components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ControlRow(pub Vec<Component>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    Button(Button),
    Select(SelectMenu),
}

impl Component {
    #[must_use]
    pub const fn custom_id(&self) -> ControlId {
        match self {
            Self::Button(button) => button.custom_id,
            Self::Select(menu) => menu.custom_id,
        }
    }

    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        match self {
            Self::Button(button) => button.disabled,
            Self::Select(menu) => menu.disabled,
        }
    }

    #[must_use]
    pub const fn as_select(&self) -> Option<&SelectMenu> {
        match self {
            Self::Select(menu) => Some(menu),
            Self::Button(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub custom_id: ControlId,
    pub emoji: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectMenu {
    pub custom_id: ControlId,
    pub placeholder: Option<String>,
    pub min_values: u8,
    pub max_values: u8,
    pub options: Vec<SelectOption>,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    pub description: Option<String>,
}

/// Short-lived data-entry form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Form {
    pub custom_id: ControlId,
    pub title: String,
    pub inputs: Vec<TextInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextInput {
    pub custom_id: ControlId,
    pub label: String,
    pub required: bool,
}

/// Render the shared player view for a session.
///
/// An absent, terminated or idle session renders the "nothing playing"
/// panel. Play, add-track and loop stay usable in that state so a session can
/// be started from scratch; the other buttons are disabled.
#[must_use]
pub fn render(
    session: Option<&SessionSnapshot>,
    config: &PlayerConfig,
    phrases: &Phrases,
) -> PlayerView {
    let playing = session.and_then(|s| s.now_playing().map(|track| (s, track)));

    let panel = match playing {
        Some((session, track)) => now_playing_panel(session, track, phrases),
        None => Panel::titled(phrases.nothing_playing_title),
    };
    let idle = playing.is_none();

    let mut controls = vec![
        ControlRow(vec![
            button(ControlId::PlayButton, phrases.play_button_emoji, false),
            button(ControlId::StopButton, phrases.stop_button_emoji, idle),
            button(ControlId::AddTrackButton, phrases.add_track_button_emoji, false),
        ]),
        ControlRow(vec![
            button(ControlId::LoopButton, phrases.loop_button_emoji, false),
            button(ControlId::ShuffleButton, phrases.shuffle_button_emoji, idle),
            button(ControlId::RemoveTrackButton, phrases.remove_track_button_emoji, idle),
        ]),
    ];

    if let Some(session) = session.filter(|s| !s.terminated && !s.pending.is_empty()) {
        controls.push(ControlRow(vec![Component::Select(SelectMenu {
            custom_id: ControlId::TrackSelectMenu,
            placeholder: Some(
                phrases.queue_summary(session.pending.len(), session.pending_duration()),
            ),
            min_values: 1,
            max_values: 1,
            options: track_options(&session.pending, config, phrases),
            disabled: false,
        })]));
    }

    PlayerView { panel, controls }
}

/// Ephemeral selector for choosing a repeat mode.
#[must_use]
pub fn loop_selector(phrases: &Phrases) -> Vec<ControlRow> {
    vec![ControlRow(vec![Component::Select(SelectMenu {
        custom_id: ControlId::LoopSelectMenu,
        placeholder: Some(phrases.loop_select_placeholder.to_string()),
        min_values: 1,
        max_values: 1,
        options: RepeatMode::ALL
            .into_iter()
            .map(|mode| SelectOption {
                label: phrases.loop_type(mode).to_string(),
                value: mode.as_value().to_string(),
                description: None,
            })
            .collect(),
        disabled: false,
    })])]
}

/// Ephemeral selector for removing one pending track.
#[must_use]
pub fn remove_selector(
    pending: &[Track],
    config: &PlayerConfig,
    phrases: &Phrases,
) -> Vec<ControlRow> {
    vec![ControlRow(vec![Component::Select(SelectMenu {
        custom_id: ControlId::RemoveTrackSelectMenu,
        placeholder: Some(phrases.remove_select_placeholder.to_string()),
        min_values: 1,
        max_values: 1,
        options: track_options(pending, config, phrases),
        disabled: false,
    })])]
}

/// Form asking for a track name or link.
#[must_use]
pub fn add_track_form(phrases: &Phrases) -> Form {
    Form {
        custom_id: ControlId::AddTrackModal,
        title: phrases.add_track_form_title.to_string(),
        inputs: vec![TextInput {
            custom_id: ControlId::TrackInput,
            label: phrases.track_input_label.to_string(),
            required: true,
        }],
    }
}

fn now_playing_panel(session: &SessionSnapshot, track: &Track, phrases: &Phrases) -> Panel {
    let pause_label = if session.paused {
        phrases.pause_enabled
    } else {
        phrases.pause_disabled
    };

    Panel {
        title: track.title.clone(),
        url: Some(track.url.clone()),
        fields: vec![
            inline_field(phrases.duration_field_name, track.duration.to_hms()),
            inline_field(phrases.loop_field_name, phrases.loop_type(session.repeat_mode)),
            inline_field(phrases.pause_field_name, pause_label),
        ],
        thumbnail: track.thumbnail.clone(),
        author: Some(PanelAuthor {
            name: track.requester.tag.clone(),
            icon_url: track.requester.avatar_url.clone(),
        }),
    }
}

fn inline_field(name: &str, value: impl Into<String>) -> PanelField {
    PanelField {
        name: name.to_string(),
        value: value.into(),
        inline: true,
    }
}

fn button(custom_id: ControlId, emoji: &str, disabled: bool) -> Component {
    Component::Button(Button {
        custom_id,
        emoji: emoji.to_string(),
        disabled,
    })
}

/// Select options for the first tracks of a queue.
///
/// Option values must be unique within a menu, so a track queued twice is
/// offered once, at its first position.
fn track_options(tracks: &[Track], config: &PlayerConfig, phrases: &Phrases) -> Vec<SelectOption> {
    let mut seen = HashSet::new();
    tracks
        .iter()
        .filter(|track| seen.insert(track.id.as_str()))
        .take(config.select_menu_max_options)
        .map(|track| SelectOption {
            label: option_label(track, config.option_label_max_chars),
            value: track.id.clone(),
            description: Some(phrases.requested_by(&track.requester.tag)),
        })
        .collect()
}

fn option_label(track: &Track, max_chars: usize) -> String {
    let title = if track.title.trim().is_empty() {
        track.id.as_str()
    } else {
        track.title.as_str()
    };
    title.chars().take(max_chars).collect()
}

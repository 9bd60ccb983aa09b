//! Player interaction handlers and the control dispatch table.

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::broadcast::BroadcastCoordinator;
use crate::controls::ControlId;
use crate::error::{CoreError, Result};
use crate::registry::SessionRegistry;
use crate::session::{RepeatMode, Requester, ScopeId, VoiceChannelId};
use crate::surface::Surface;
use crate::tracker::SurfaceTracker;
use crate::view::{
    add_track_form, loop_selector, remove_selector, render, ControlRow, Form, PlayerView,
};

const LOG_TARGET: &str = "playdeck::handlers";

/// Data carried by an interaction, by control kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionPayload {
    Button,
    Select { values: Vec<String> },
    Form { fields: HashMap<String, String> },
}

/// A user action on a player control, as delivered by the chat transport.
pub struct Interaction {
    pub scope: ScopeId,
    pub user: Requester,
    /// Voice channel the user is currently in
    pub voice_channel: Option<VoiceChannelId>,
    /// Player surface the control is attached to, if any
    pub surface: Option<Arc<dyn Surface>>,
    pub custom_id: String,
    pub payload: InteractionPayload,
}

impl Interaction {
    pub fn button(scope: ScopeId, user: Requester, custom_id: impl Into<String>) -> Self {
        Self::with_payload(scope, user, custom_id, InteractionPayload::Button)
    }

    pub fn select(
        scope: ScopeId,
        user: Requester,
        custom_id: impl Into<String>,
        values: Vec<String>,
    ) -> Self {
        Self::with_payload(scope, user, custom_id, InteractionPayload::Select { values })
    }

    pub fn form(
        scope: ScopeId,
        user: Requester,
        custom_id: impl Into<String>,
        fields: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self::with_payload(
            scope,
            user,
            custom_id,
            InteractionPayload::Form {
                fields: fields.into_iter().collect(),
            },
        )
    }

    fn with_payload(
        scope: ScopeId,
        user: Requester,
        custom_id: impl Into<String>,
        payload: InteractionPayload,
    ) -> Self {
        Self {
            scope,
            user,
            voice_channel: None,
            surface: None,
            custom_id: custom_id.into(),
            payload,
        }
    }

    #[must_use]
    pub fn on_surface(mut self, surface: Arc<dyn Surface>) -> Self {
        self.surface = Some(surface);
        self
    }

    #[must_use]
    pub fn in_voice_channel(mut self, channel: VoiceChannelId) -> Self {
        self.voice_channel = Some(channel);
        self
    }

    /// First value picked in a select menu.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedInteraction`] if this is not a select
    /// interaction or nothing was picked.
    pub fn selected_value(&self) -> Result<&str> {
        match &self.payload {
            InteractionPayload::Select { values } => {
                values.first().map(String::as_str).ok_or_else(|| CoreError::MalformedInteraction {
                    reason: format!("{} submitted without a value", self.custom_id),
                })
            }
            _ => Err(CoreError::MalformedInteraction {
                reason: format!("{} is not a select menu", self.custom_id),
            }),
        }
    }

    /// Value of a form field.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedInteraction`] if this is not a form
    /// submission or the field is missing.
    pub fn field(&self, id: ControlId) -> Result<&str> {
        match &self.payload {
            InteractionPayload::Form { fields } => {
                fields.get(id.as_str()).map(String::as_str).ok_or_else(|| {
                    CoreError::MalformedInteraction {
                        reason: format!("{} submitted without {}", self.custom_id, id),
                    }
                })
            }
            _ => Err(CoreError::MalformedInteraction {
                reason: format!("{} is not a form", self.custom_id),
            }),
        }
    }
}

/// What the transport should send back for an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The originating surface was refreshed by the broadcast; just acknowledge
    Refreshed,
    /// Initial reply carrying the player view
    Player(PlayerView),
    /// Open a data-entry form
    Form(Form),
    /// Reply visible only to the acting user
    Ephemeral {
        content: Option<String>,
        controls: Vec<ControlRow>,
    },
    /// Replace the content of the ephemeral reply the control lives on
    UpdateEphemeral { content: String },
    /// Acknowledge without any visible change
    Silent,
}

impl Response {
    pub fn notice(content: impl Into<String>) -> Self {
        Self::Ephemeral {
            content: Some(content.into()),
            controls: Vec::new(),
        }
    }

    fn selector(controls: Vec<ControlRow>) -> Self {
        Self::Ephemeral { content: None, controls }
    }
}

/// Applies player interactions to the engine and keeps surfaces in step.
pub struct PlayerController {
    registry: SessionRegistry,
    tracker: Arc<SurfaceTracker>,
    broadcaster: Arc<BroadcastCoordinator>,
}

impl PlayerController {
    #[must_use]
    pub fn new(registry: SessionRegistry, broadcaster: Arc<BroadcastCoordinator>) -> Self {
        Self {
            registry,
            tracker: broadcaster.tracker().clone(),
            broadcaster,
        }
    }

    /// Answer the player command: track the reply and return the view it
    /// should show.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot produce the session.
    pub async fn open_player(
        &self,
        scope: &ScopeId,
        surface: Arc<dyn Surface>,
    ) -> Result<Response> {
        let session = self.registry.get_or_create(scope).await?;
        self.tracker.track(scope, surface).await;
        let view = render(Some(&session), self.broadcaster.config(), self.broadcaster.phrases());
        Ok(Response::Player(view))
    }

    /// Play button: toggle pause, or ask for a track when idle.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails.
    pub async fn play(&self, interaction: Interaction) -> Result<Response> {
        let session = self.registry.get_or_create(&interaction.scope).await?;
        if !session.is_active() {
            return Ok(Response::Form(add_track_form(self.broadcaster.phrases())));
        }

        let paused = !session.paused;
        debug!(target: LOG_TARGET, "Setting paused={} for scope {}", paused, interaction.scope);
        self.registry.engine().set_paused(&interaction.scope, paused).await?;
        self.conclude(interaction).await;
        Ok(Response::Refreshed)
    }

    /// Add-track button: always the add-track form.
    #[allow(clippy::unused_async)]
    pub async fn add_track(&self, _interaction: Interaction) -> Result<Response> {
        Ok(Response::Form(add_track_form(self.broadcaster.phrases())))
    }

    /// Add-track form submitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the form lacks the track field or the engine fails
    /// outside of the voice connection step.
    pub async fn submit_track(&self, interaction: Interaction) -> Result<Response> {
        let phrases = self.broadcaster.phrases();
        let query = interaction.field(ControlId::TrackInput)?.trim();
        if query.is_empty() {
            return Ok(Response::notice(phrases.tracks_not_found));
        }

        let engine = self.registry.engine();
        let tracks = engine.search(query, &interaction.user).await?.into_tracks();
        if tracks.is_empty() {
            debug!(target: LOG_TARGET, "No tracks found for {:?}", query);
            return Ok(Response::notice(phrases.tracks_not_found));
        }

        let scope = &interaction.scope;
        let session = self.registry.get_or_create(scope).await?;
        if !session.connected {
            let Some(channel) = interaction.voice_channel.as_ref() else {
                return Ok(Response::notice(phrases.should_be_in_voice_channel));
            };
            match engine.connect(scope, channel).await {
                Ok(()) => {
                    info!(
                        target: LOG_TARGET,
                        "Connected scope {} to voice channel {}",
                        scope,
                        channel
                    );
                }
                Err(CoreError::VoiceConnection { reason }) => {
                    warn!(target: LOG_TARGET, "Voice connection to {} failed: {}", channel, reason);
                    return Ok(Response::notice(phrases.could_not_connect_to_voice_channel));
                }
                Err(e) => return Err(e),
            }
        }

        info!(target: LOG_TARGET, "Queueing {} track(s) for scope {}", tracks.len(), scope);
        engine.enqueue(scope, tracks).await?;
        if session.now_playing().is_none() {
            engine.play(scope).await?;
        }

        self.conclude(interaction).await;
        Ok(Response::Refreshed)
    }

    /// Stop button: clear the queue and go idle.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails.
    pub async fn stop(&self, interaction: Interaction) -> Result<Response> {
        self.registry.engine().stop(&interaction.scope).await?;
        self.conclude(interaction).await;
        Ok(Response::Refreshed)
    }

    /// # Errors
    ///
    /// Returns an error if the engine fails.
    pub async fn shuffle(&self, interaction: Interaction) -> Result<Response> {
        self.registry.engine().shuffle(&interaction.scope).await?;
        self.conclude(interaction).await;
        Ok(Response::Refreshed)
    }

    /// Loop button: offer the repeat-mode selector. The selector reply is not
    /// a player surface and is never tracked.
    #[allow(clippy::unused_async)]
    pub async fn loop_button(&self, _interaction: Interaction) -> Result<Response> {
        Ok(Response::selector(loop_selector(self.broadcaster.phrases())))
    }

    /// # Errors
    ///
    /// Returns an error if the selected value is not a repeat mode or the
    /// engine fails.
    pub async fn loop_select(&self, interaction: Interaction) -> Result<Response> {
        let value = interaction.selected_value()?;
        let mode = RepeatMode::from_value(value).ok_or_else(|| CoreError::MalformedInteraction {
            reason: format!("unknown repeat mode {value:?}"),
        })?;

        self.registry.engine().set_repeat_mode(&interaction.scope, mode).await?;
        self.broadcaster.refresh(&interaction.scope).await;
        Ok(Response::UpdateEphemeral {
            content: self.broadcaster.phrases().loop_type_set(mode),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the engine fails.
    pub async fn remove_button(&self, interaction: Interaction) -> Result<Response> {
        let session = self.registry.get_or_create(&interaction.scope).await?;
        let phrases = self.broadcaster.phrases();
        if session.pending.is_empty() {
            return Ok(Response::notice(phrases.no_tracks_in_queue));
        }
        Ok(Response::selector(remove_selector(
            &session.pending,
            self.broadcaster.config(),
            phrases,
        )))
    }

    /// Track picked in the removal selector. A track that already left the
    /// queue is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if no value was picked or the engine fails.
    pub async fn remove_select(&self, interaction: Interaction) -> Result<Response> {
        let track_id = interaction.selected_value()?;
        let removed = self.registry.engine().remove(&interaction.scope, track_id).await?;
        let Some(removed) = removed else {
            debug!(
                target: LOG_TARGET,
                "Track {} no longer pending in scope {}",
                track_id,
                interaction.scope
            );
            return Ok(Response::Silent);
        };

        self.broadcaster.refresh(&interaction.scope).await;
        Ok(Response::UpdateEphemeral {
            content: self.broadcaster.phrases().track_removed(&removed.title),
        })
    }

    /// Track picked in the player's jump selector. A track that already left
    /// the queue is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if no value was picked or the engine fails.
    pub async fn track_select(&self, interaction: Interaction) -> Result<Response> {
        let track_id = interaction.selected_value()?;
        if !self.registry.engine().skip_to(&interaction.scope, track_id).await? {
            debug!(
                target: LOG_TARGET,
                "Track {} no longer pending in scope {}",
                track_id,
                interaction.scope
            );
            return Ok(Response::Silent);
        }

        self.conclude(interaction).await;
        Ok(Response::Refreshed)
    }

    /// Track the originating surface, then refresh every surface of the scope.
    async fn conclude(&self, interaction: Interaction) {
        if let Some(surface) = interaction.surface {
            self.tracker.track(&interaction.scope, surface).await;
        }
        self.broadcaster.refresh(&interaction.scope).await;
    }
}

type HandlerFn = for<'a> fn(&'a PlayerController, Interaction) -> BoxFuture<'a, Result<Response>>;

fn handle_play(c: &PlayerController, i: Interaction) -> BoxFuture<'_, Result<Response>> {
    Box::pin(c.play(i))
}

fn handle_stop(c: &PlayerController, i: Interaction) -> BoxFuture<'_, Result<Response>> {
    Box::pin(c.stop(i))
}

fn handle_add_track(c: &PlayerController, i: Interaction) -> BoxFuture<'_, Result<Response>> {
    Box::pin(c.add_track(i))
}

fn handle_remove_button(c: &PlayerController, i: Interaction) -> BoxFuture<'_, Result<Response>> {
    Box::pin(c.remove_button(i))
}

fn handle_shuffle(c: &PlayerController, i: Interaction) -> BoxFuture<'_, Result<Response>> {
    Box::pin(c.shuffle(i))
}

fn handle_loop_button(c: &PlayerController, i: Interaction) -> BoxFuture<'_, Result<Response>> {
    Box::pin(c.loop_button(i))
}

fn handle_track_select(c: &PlayerController, i: Interaction) -> BoxFuture<'_, Result<Response>> {
    Box::pin(c.track_select(i))
}

fn handle_loop_select(c: &PlayerController, i: Interaction) -> BoxFuture<'_, Result<Response>> {
    Box::pin(c.loop_select(i))
}

fn handle_remove_select(c: &PlayerController, i: Interaction) -> BoxFuture<'_, Result<Response>> {
    Box::pin(c.remove_select(i))
}

fn handle_submit_track(c: &PlayerController, i: Interaction) -> BoxFuture<'_, Result<Response>> {
    Box::pin(c.submit_track(i))
}

/// Dispatches interactions to handlers by control identifier.
pub struct Router {
    controller: PlayerController,
    routes: HashMap<ControlId, HandlerFn>,
}

impl Router {
    #[must_use]
    pub fn new(controller: PlayerController) -> Self {
        let mut routes: HashMap<ControlId, HandlerFn> = HashMap::new();
        routes.insert(ControlId::PlayButton, handle_play);
        routes.insert(ControlId::StopButton, handle_stop);
        routes.insert(ControlId::AddTrackButton, handle_add_track);
        routes.insert(ControlId::RemoveTrackButton, handle_remove_button);
        routes.insert(ControlId::ShuffleButton, handle_shuffle);
        routes.insert(ControlId::LoopButton, handle_loop_button);
        routes.insert(ControlId::TrackSelectMenu, handle_track_select);
        routes.insert(ControlId::LoopSelectMenu, handle_loop_select);
        routes.insert(ControlId::RemoveTrackSelectMenu, handle_remove_select);
        routes.insert(ControlId::AddTrackModal, handle_submit_track);
        Self { controller, routes }
    }

    #[must_use]
    pub const fn controller(&self) -> &PlayerController {
        &self.controller
    }

    #[must_use]
    pub fn handles(&self, id: ControlId) -> bool {
        self.routes.contains_key(&id)
    }

    /// Route an interaction to its handler.
    ///
    /// Engine failures become a notice for the acting user.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownControl`] for identifiers without a
    /// handler, and [`CoreError::MalformedInteraction`] for payloads that do
    /// not match the control.
    pub async fn dispatch(&self, interaction: Interaction) -> Result<Response> {
        let id = ControlId::from_str(&interaction.custom_id)?;
        let handler = self.routes.get(&id).ok_or_else(|| CoreError::UnknownControl {
            custom_id: interaction.custom_id.clone(),
        })?;

        let scope = interaction.scope.clone();
        match handler(&self.controller, interaction).await {
            Err(e) if e.is_engine_failure() => {
                warn!(target: LOG_TARGET, "{} failed in scope {}: {}", id, scope, e);
                Ok(Response::notice(self.controller.broadcaster.phrases().engine_failure))
            }
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::engine::testing::StubEngine;
    use crate::phrases::Phrases;
    use crate::session::{SessionSnapshot, Track};
    use crate::surface::testing::RecordingSurface;
    use std::time::Duration;

    fn router(engine: &Arc<StubEngine>) -> (Arc<SurfaceTracker>, Router) {
        let tracker = SurfaceTracker::new();
        let registry = SessionRegistry::new(engine.clone());
        let broadcaster = BroadcastCoordinator::new(
            tracker.clone(),
            registry.clone(),
            PlayerConfig::default(),
            Phrases::default(),
        );
        (tracker, Router::new(PlayerController::new(registry, broadcaster)))
    }

    fn user() -> Requester {
        Requester::new("u1", "alice")
    }

    fn scope() -> ScopeId {
        ScopeId::from("s1")
    }

    #[test]
    fn test_every_dispatched_control_has_a_route() {
        let (_, router) = router(&StubEngine::new());
        for id in ControlId::ALL {
            assert_eq!(router.handles(id), id != ControlId::TrackInput, "{id}");
        }
    }

    #[tokio::test]
    async fn test_unknown_control_is_rejected() {
        let (_, router) = router(&StubEngine::new());
        let result = router.dispatch(Interaction::button(scope(), user(), "volumeKnob")).await;
        assert!(matches!(result, Err(CoreError::UnknownControl { .. })));

        let result = router
            .dispatch(Interaction::button(scope(), user(), ControlId::TrackInput.as_str()))
            .await;
        assert!(matches!(result, Err(CoreError::UnknownControl { .. })));
    }

    #[tokio::test]
    async fn test_play_while_idle_opens_form() {
        let (tracker, router) = router(&StubEngine::new());
        let surface = Arc::new(RecordingSurface::new("m1"));
        let interaction = Interaction::button(scope(), user(), ControlId::PlayButton.as_str())
            .on_surface(surface.clone());

        let response = router.dispatch(interaction).await;

        assert_eq!(response.ok(), Some(Response::Form(add_track_form(&Phrases::default()))));
        assert_eq!(surface.edit_count(), 0);
        assert_eq!(tracker.len(&scope()).await, 0);
    }

    #[tokio::test]
    async fn test_play_while_playing_tracks_and_refreshes() {
        let engine = StubEngine::new();
        engine.set_session(SessionSnapshot {
            current: Some(Track::new("t1", "Song", "https://x/t1", Duration::from_secs(1), user())),
            connected: true,
            ..Default::default()
        });
        let (tracker, router) = router(&engine);
        let surface = Arc::new(RecordingSurface::new("m1"));
        let interaction = Interaction::button(scope(), user(), ControlId::PlayButton.as_str())
            .on_surface(surface.clone());

        let response = router.dispatch(interaction).await;

        assert_eq!(response.ok(), Some(Response::Refreshed));
        assert_eq!(tracker.len(&scope()).await, 1);
        assert_eq!(surface.edit_count(), 1);
    }

    #[tokio::test]
    async fn test_loop_button_offers_untracked_selector() {
        let (tracker, router) = router(&StubEngine::new());
        let surface = Arc::new(RecordingSurface::new("ephemeral"));
        let interaction = Interaction::button(scope(), user(), ControlId::LoopButton.as_str())
            .on_surface(surface);

        let response = router.dispatch(interaction).await;

        assert_eq!(
            response.ok(),
            Some(Response::Ephemeral {
                content: None,
                controls: loop_selector(&Phrases::default()),
            })
        );
        assert_eq!(tracker.len(&scope()).await, 0);
    }

    #[tokio::test]
    async fn test_loop_select_rejects_unknown_mode() {
        let (_, router) = router(&StubEngine::new());
        let interaction = Interaction::select(
            scope(),
            user(),
            ControlId::LoopSelectMenu.as_str(),
            vec!["7".to_string()],
        );

        let result = router.dispatch(interaction).await;
        assert!(matches!(result, Err(CoreError::MalformedInteraction { .. })));
    }

    #[tokio::test]
    async fn test_select_without_value_is_malformed() {
        let (_, router) = router(&StubEngine::new());
        let interaction =
            Interaction::select(scope(), user(), ControlId::TrackSelectMenu.as_str(), vec![]);

        let result = router.dispatch(interaction).await;
        assert!(matches!(result, Err(CoreError::MalformedInteraction { .. })));
    }

    #[tokio::test]
    async fn test_remove_button_with_empty_queue() {
        let (_, router) = router(&StubEngine::new());
        let response = router
            .dispatch(Interaction::button(scope(), user(), ControlId::RemoveTrackButton.as_str()))
            .await;

        assert_eq!(
            response.ok(),
            Some(Response::notice(Phrases::default().no_tracks_in_queue))
        );
    }

    #[tokio::test]
    async fn test_empty_query_is_not_found() {
        let (_, router) = router(&StubEngine::new());
        let interaction = Interaction::form(
            scope(),
            user(),
            ControlId::AddTrackModal.as_str(),
            [(ControlId::TrackInput.as_str().to_string(), "   ".to_string())],
        );

        let response = router.dispatch(interaction).await;
        assert_eq!(response.ok(), Some(Response::notice(Phrases::default().tracks_not_found)));
    }

    #[tokio::test]
    async fn test_form_without_track_field_is_malformed() {
        let (_, router) = router(&StubEngine::new());
        let interaction =
            Interaction::form(scope(), user(), ControlId::AddTrackModal.as_str(), Vec::new());

        let result = router.dispatch(interaction).await;
        assert!(matches!(result, Err(CoreError::MalformedInteraction { .. })));
    }

    #[tokio::test]
    async fn test_engine_failure_becomes_notice() {
        let engine = StubEngine::new();
        engine.fail_sessions();
        let (_, router) = router(&engine);

        let response = router
            .dispatch(Interaction::button(scope(), user(), ControlId::StopButton.as_str()))
            .await;

        assert_eq!(response.ok(), Some(Response::notice(Phrases::default().engine_failure)));
    }

    #[tokio::test]
    async fn test_open_player_tracks_reply() {
        let engine = StubEngine::new();
        let (tracker, router) = router(&engine);
        let surface = Arc::new(RecordingSurface::new("reply"));

        let response = router.controller().open_player(&scope(), surface).await;

        assert!(matches!(response, Ok(Response::Player(ref view)) if !view.is_now_playing()));
        assert_eq!(tracker.len(&scope()).await, 1);
    }
}

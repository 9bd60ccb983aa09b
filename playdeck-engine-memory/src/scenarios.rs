//! End-to-end player scenarios against the in-memory engine.

use playdeck_core::surface::testing::{FailingSurface, RecordingSurface};
use playdeck_core::view::Component;
use playdeck_core::{
    AudioEngine, BroadcastCoordinator, ControlId, Interaction, PlaybackWatcher, PlayerConfig,
    PlayerController, PlayerState, PlayerView, Phrases, RepeatMode, Requester, Response, Router,
    ScopeId, SessionRegistry, SessionSnapshot, Surface, SurfaceTracker, VoiceChannelId,
};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CatalogPlaylist, CatalogTrack, MemoryEngineConfig};
use crate::engine::MemoryEngine;

const VOICE: &str = "vc1";
const DEAD_VOICE: &str = "vc-dead";

struct Harness {
    engine: Arc<MemoryEngine>,
    tracker: Arc<SurfaceTracker>,
    broadcaster: Arc<BroadcastCoordinator>,
    router: Router,
    scope: ScopeId,
    phrases: Phrases,
}

fn entry(id: &str, title: &str, duration_ms: u64) -> CatalogTrack {
    CatalogTrack {
        id: id.into(),
        title: title.into(),
        url: format!("https://example.com/{id}"),
        duration_ms,
        thumbnail: Some(format!("https://img.example.com/{id}.jpg")),
    }
}

fn harness() -> Harness {
    let engine = MemoryEngine::new(MemoryEngineConfig {
        tracks: vec![
            entry("first", "First Song", 125_000),
            entry("second", "Second Song", 60_000),
            entry("third", "Third Song", 30_000),
        ],
        playlists: vec![CatalogPlaylist {
            name: "all".into(),
            tracks: vec!["first".into(), "second".into(), "third".into()],
        }],
        unreachable_channels: vec![DEAD_VOICE.into()],
        ..Default::default()
    });
    let tracker = SurfaceTracker::new();
    let registry = SessionRegistry::new(engine.clone());
    let broadcaster = BroadcastCoordinator::new(
        tracker.clone(),
        registry.clone(),
        PlayerConfig::default(),
        Phrases::default(),
    );
    let router = Router::new(PlayerController::new(registry, broadcaster.clone()));

    Harness {
        engine,
        tracker,
        broadcaster,
        router,
        scope: ScopeId::from("guild-1"),
        phrases: Phrases::default(),
    }
}

fn alice() -> Requester {
    Requester::new("u1", "alice#0001").with_avatar("https://cdn.example.com/alice.png")
}

impl Harness {
    async fn open(&self, surface: Arc<dyn Surface>) -> Option<PlayerView> {
        match self.router.controller().open_player(&self.scope, surface).await {
            Ok(Response::Player(view)) => Some(view),
            _ => None,
        }
    }

    async fn submit(
        &self,
        query: &str,
        voice: Option<&str>,
        surface: Option<Arc<dyn Surface>>,
    ) -> Option<Response> {
        let mut interaction = Interaction::form(
            self.scope.clone(),
            alice(),
            ControlId::AddTrackModal.as_str(),
            [(ControlId::TrackInput.as_str().to_string(), query.to_string())],
        );
        if let Some(voice) = voice {
            interaction = interaction.in_voice_channel(VoiceChannelId::new(voice));
        }
        if let Some(surface) = surface {
            interaction = interaction.on_surface(surface);
        }
        self.router.dispatch(interaction).await.ok()
    }

    async fn press(&self, id: ControlId, surface: Option<Arc<dyn Surface>>) -> Option<Response> {
        let mut interaction = Interaction::button(self.scope.clone(), alice(), id.as_str());
        if let Some(surface) = surface {
            interaction = interaction.on_surface(surface);
        }
        self.router.dispatch(interaction).await.ok()
    }

    async fn pick(&self, id: ControlId, value: &str) -> Option<Response> {
        let interaction =
            Interaction::select(self.scope.clone(), alice(), id.as_str(), vec![value.to_string()]);
        self.router.dispatch(interaction).await.ok()
    }

    async fn current_id(&self) -> Option<String> {
        self.engine
            .session(&self.scope)
            .await
            .ok()
            .and_then(|s| s.current)
            .map(|t| t.id)
    }
}

fn placeholder(view: &PlayerView) -> Option<String> {
    view.control(ControlId::TrackSelectMenu)
        .and_then(Component::as_select)
        .and_then(|menu| menu.placeholder.clone())
}

#[tokio::test]
async fn test_first_track_shows_on_player() {
    let h = harness();
    let reply = Arc::new(RecordingSurface::new("reply"));

    let initial = h.open(reply.clone()).await;
    assert_eq!(initial.map(|v| v.is_now_playing()), Some(false));

    let response = h.submit("First Song", Some(VOICE), Some(reply.clone())).await;
    assert_eq!(response, Some(Response::Refreshed));

    let view = reply.last_view();
    let panel = view.as_ref().map(|v| &v.panel);
    assert_eq!(panel.map(|p| p.title.as_str()), Some("First Song"));
    assert_eq!(
        panel.and_then(|p| p.field(h.phrases.duration_field_name)),
        Some("00:02:05")
    );
    assert_eq!(
        panel.and_then(|p| p.author.as_ref()).map(|a| a.name.as_str()),
        Some("alice#0001")
    );

    let session = h.engine.session(&h.scope).await.ok();
    assert_eq!(session.as_ref().map(SessionSnapshot::state), Some(PlayerState::Playing));
    assert_eq!(session.map(|s| s.pending.is_empty()), Some(true));
}

#[tokio::test]
async fn test_failing_surface_is_pruned_and_others_updated() {
    let h = harness();
    let a = Arc::new(RecordingSurface::new("a"));
    let b = Arc::new(RecordingSurface::new("b"));
    let broken = Arc::new(FailingSurface::new("broken"));
    h.open(a.clone()).await;
    h.open(b.clone()).await;
    h.open(broken.clone()).await;
    assert_eq!(h.tracker.len(&h.scope).await, 3);

    h.submit("all", Some(VOICE), None).await;

    assert_eq!(h.tracker.len(&h.scope).await, 2);
    assert_eq!(broken.attempts(), 1);
    assert!(a.last_view().is_some_and(|v| v.is_now_playing()));
    assert_eq!(a.last_view(), b.last_view());

    h.press(ControlId::ShuffleButton, None).await;
    assert_eq!(broken.attempts(), 1);
    assert_eq!(a.edit_count(), 2);
}

#[tokio::test]
async fn test_adding_a_track_grows_queue_total() {
    let h = harness();
    let player = Arc::new(RecordingSurface::new("player"));
    h.open(player.clone()).await;

    h.submit("First Song", Some(VOICE), Some(player.clone())).await;
    h.submit("Second Song", Some(VOICE), Some(player.clone())).await;
    let before = player.last_view().as_ref().and_then(placeholder);

    h.submit("Third Song", Some(VOICE), Some(player.clone())).await;
    let after = player.last_view().as_ref().and_then(placeholder);

    assert_eq!(before, Some(h.phrases.queue_summary(1, Duration::from_secs(60))));
    assert_eq!(after, Some(h.phrases.queue_summary(2, Duration::from_secs(90))));
    assert_eq!(h.current_id().await.as_deref(), Some("first"));
}

#[tokio::test]
async fn test_removing_unknown_track_is_silent() {
    let h = harness();
    let player = Arc::new(RecordingSurface::new("player"));
    h.open(player.clone()).await;
    h.submit("all", Some(VOICE), Some(player.clone())).await;
    let edits = player.edit_count();

    let response = h.pick(ControlId::RemoveTrackSelectMenu, "never-queued").await;

    assert_eq!(response, Some(Response::Silent));
    assert_eq!(player.edit_count(), edits);
    let pending = h.engine.session(&h.scope).await.map(|s| s.pending.len()).ok();
    assert_eq!(pending, Some(2));
}

#[tokio::test]
async fn test_jump_to_removed_track_is_silent() {
    let h = harness();
    let player = Arc::new(RecordingSurface::new("player"));
    h.open(player.clone()).await;
    h.submit("all", Some(VOICE), Some(player.clone())).await;

    let removed = h.pick(ControlId::RemoveTrackSelectMenu, "second").await;
    assert_eq!(
        removed,
        Some(Response::UpdateEphemeral {
            content: h.phrases.track_removed("Second Song"),
        })
    );
    let edits = player.edit_count();

    let jumped = h.pick(ControlId::TrackSelectMenu, "second").await;

    assert_eq!(jumped, Some(Response::Silent));
    assert_eq!(player.edit_count(), edits);
    assert_eq!(h.current_id().await.as_deref(), Some("first"));
}

#[tokio::test]
async fn test_jump_plays_selected_track() {
    let h = harness();
    let player = Arc::new(RecordingSurface::new("player"));
    h.open(player.clone()).await;
    h.submit("all", Some(VOICE), Some(player.clone())).await;

    let response = h.pick(ControlId::TrackSelectMenu, "third").await;

    assert_eq!(response, Some(Response::Refreshed));
    assert_eq!(player.last_view().map(|v| v.panel.title), Some("Third Song".to_string()));
    assert!(player
        .last_view()
        .is_some_and(|v| v.control(ControlId::TrackSelectMenu).is_none()));
}

#[tokio::test]
async fn test_submit_without_voice_channel() {
    let h = harness();
    let player = Arc::new(RecordingSurface::new("player"));
    h.open(player.clone()).await;

    let response = h.submit("First Song", None, Some(player.clone())).await;

    assert_eq!(response, Some(Response::notice(h.phrases.should_be_in_voice_channel)));
    assert_eq!(player.edit_count(), 0);
    assert_eq!(h.current_id().await, None);
}

#[tokio::test]
async fn test_submit_with_unreachable_voice_channel() {
    let h = harness();

    let response = h.submit("First Song", Some(DEAD_VOICE), None).await;

    assert_eq!(
        response,
        Some(Response::notice(h.phrases.could_not_connect_to_voice_channel))
    );
    let session = h.engine.session(&h.scope).await.ok();
    assert_eq!(session.as_ref().map(|s| s.connected), Some(false));
    assert_eq!(session.map(|s| s.is_active()), Some(false));
}

#[tokio::test]
async fn test_submit_unknown_query() {
    let h = harness();
    let response = h.submit("nothing like this", Some(VOICE), None).await;
    assert_eq!(response, Some(Response::notice(h.phrases.tracks_not_found)));
}

#[tokio::test]
async fn test_play_button_toggles_pause() {
    let h = harness();
    let player = Arc::new(RecordingSurface::new("player"));
    h.open(player.clone()).await;
    h.submit("First Song", Some(VOICE), Some(player.clone())).await;

    h.press(ControlId::PlayButton, Some(player.clone())).await;
    let paused = player.last_view();
    h.press(ControlId::PlayButton, Some(player.clone())).await;
    let resumed = player.last_view();

    let pause_field = |view: Option<PlayerView>| {
        view.and_then(|v| v.panel.field(h.phrases.pause_field_name).map(str::to_string))
    };
    assert_eq!(pause_field(paused), Some(h.phrases.pause_enabled.to_string()));
    assert_eq!(pause_field(resumed), Some(h.phrases.pause_disabled.to_string()));
}

#[tokio::test]
async fn test_loop_selection_updates_every_surface() {
    let h = harness();
    let player = Arc::new(RecordingSurface::new("player"));
    let selector = Arc::new(RecordingSurface::new("selector"));
    h.open(player.clone()).await;
    h.submit("First Song", Some(VOICE), Some(player.clone())).await;

    let offered = h.press(ControlId::LoopButton, Some(selector.clone())).await;
    assert!(matches!(offered, Some(Response::Ephemeral { content: None, .. })));

    let confirmed = h.pick(ControlId::LoopSelectMenu, RepeatMode::Queue.as_value()).await;

    assert_eq!(
        confirmed,
        Some(Response::UpdateEphemeral {
            content: h.phrases.loop_type_set(RepeatMode::Queue),
        })
    );
    let loop_label = player
        .last_view()
        .and_then(|v| v.panel.field(h.phrases.loop_field_name).map(str::to_string));
    assert_eq!(loop_label.as_deref(), Some(h.phrases.loop_queue));
    assert_eq!(selector.edit_count(), 0);
    assert_eq!(h.tracker.len(&h.scope).await, 1);
}

#[tokio::test]
async fn test_remove_button_offers_pending_tracks() {
    let h = harness();
    h.submit("all", Some(VOICE), None).await;

    let response = h.press(ControlId::RemoveTrackButton, None).await;

    let values: Option<Vec<String>> = match response {
        Some(Response::Ephemeral { controls, .. }) => controls
            .first()
            .and_then(|row| row.0.first())
            .and_then(Component::as_select)
            .map(|menu| menu.options.iter().map(|o| o.value.clone()).collect()),
        _ => None,
    };
    assert_eq!(values, Some(vec!["second".to_string(), "third".to_string()]));
}

#[tokio::test]
async fn test_stop_returns_player_to_idle() {
    let h = harness();
    let player = Arc::new(RecordingSurface::new("player"));
    h.open(player.clone()).await;
    h.submit("all", Some(VOICE), Some(player.clone())).await;

    let response = h.press(ControlId::StopButton, Some(player.clone())).await;

    assert_eq!(response, Some(Response::Refreshed));
    let view = player.last_view();
    assert_eq!(view.as_ref().map(PlayerView::is_now_playing), Some(false));
    assert_eq!(
        view.as_ref()
            .and_then(|v| v.control(ControlId::StopButton))
            .map(Component::is_disabled),
        Some(true)
    );
    assert!(view.is_some_and(|v| v.control(ControlId::TrackSelectMenu).is_none()));
}

#[tokio::test]
async fn test_track_end_refreshes_without_interaction() {
    let h = harness();
    let player = Arc::new(RecordingSurface::new("player"));
    h.open(player.clone()).await;
    h.submit("all", Some(VOICE), Some(player.clone())).await;

    let watcher = Arc::new(PlaybackWatcher::new(h.engine.clone(), h.broadcaster.clone(), None));
    let token = watcher.cancel_token();
    let handle = watcher.start();

    let edits = player.edit_count();
    h.engine.finish_current(&h.scope).await;
    for _ in 0..100 {
        if player.edit_count() > edits {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(player.last_view().map(|v| v.panel.title), Some("Second Song".to_string()));

    token.cancel();
    assert!(handle.await.is_ok());
}

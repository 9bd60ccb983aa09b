//! Audio engine collaborator.

use crate::error::Result;
use crate::session::{RepeatMode, Requester, ScopeId, SessionSnapshot, Track, VoiceChannelId};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Lifecycle events emitted by the engine independently of user actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A track began playing (including advancing to the next track)
    TrackStarted { scope: ScopeId, track: Track },
    /// The last track ended and nothing else is queued
    QueueEnded { scope: ScopeId },
}

impl EngineEvent {
    #[must_use]
    pub const fn scope(&self) -> &ScopeId {
        match self {
            Self::TrackStarted { scope, .. } | Self::QueueEnded { scope } => scope,
        }
    }
}

/// Outcome of resolving a user query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// Tracks of a playlist, when the query named one
    pub playlist: Option<Vec<Track>>,
    /// Individual matches, best first
    pub tracks: Vec<Track>,
}

impl SearchResult {
    /// Tracks to enqueue: a whole non-empty playlist, else the best match only.
    #[must_use]
    pub fn into_tracks(self) -> Vec<Track> {
        match self.playlist {
            Some(playlist) if !playlist.is_empty() => playlist,
            _ => self.tracks.into_iter().take(1).collect(),
        }
    }
}

/// Trait for the audio engine that owns playback sessions.
///
/// The engine is the source of truth for session state. When two
/// interactions race, whichever mutation the engine applies first wins and
/// the next snapshot reflects it.
///
/// # Example
///
/// ```ignore
/// let engine: Arc<dyn AudioEngine> = Arc::new(MemoryEngine::new(catalog));
/// let snapshot = engine.session(&scope).await?;
/// ```
#[async_trait]
pub trait AudioEngine: Send + Sync {
    /// Returns a human-readable name for this engine.
    fn name(&self) -> &'static str;

    /// Snapshot of the session for `scope`, creating an idle session if none
    /// exists yet.
    async fn session(&self, scope: &ScopeId) -> Result<SessionSnapshot>;

    /// Resolve a free-text query or link.
    async fn search(&self, query: &str, requested_by: &Requester) -> Result<SearchResult>;

    /// Join `channel` for `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::VoiceConnection`](crate::CoreError::VoiceConnection)
    /// if the channel cannot be joined.
    async fn connect(&self, scope: &ScopeId, channel: &VoiceChannelId) -> Result<()>;

    /// Append tracks to the pending list.
    async fn enqueue(&self, scope: &ScopeId, tracks: Vec<Track>) -> Result<()>;

    /// Start playing the next pending track if nothing is current.
    async fn play(&self, scope: &ScopeId) -> Result<()>;

    async fn set_paused(&self, scope: &ScopeId, paused: bool) -> Result<()>;

    /// Clear the pending list and stop the current track.
    async fn stop(&self, scope: &ScopeId) -> Result<()>;

    async fn set_repeat_mode(&self, scope: &ScopeId, mode: RepeatMode) -> Result<()>;

    /// Randomize the pending list in place.
    async fn shuffle(&self, scope: &ScopeId) -> Result<()>;

    /// Remove a pending track, returning it if it was present.
    async fn remove(&self, scope: &ScopeId, track_id: &str) -> Result<Option<Track>>;

    /// Drop every pending track before `track_id` and start playing it.
    ///
    /// Returns `false` without changing anything if the track is no longer
    /// pending.
    async fn skip_to(&self, scope: &ScopeId, track_id: &str) -> Result<bool>;

    /// Subscribe to lifecycle events for every scope.
    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;
}

/// Engine double for tests that only need snapshots and events.
#[cfg(any(test, feature = "test-util"))]
pub mod testing {
    use super::{AudioEngine, EngineEvent, SearchResult};
    use crate::error::{CoreError, Result};
    use crate::session::{RepeatMode, Requester, ScopeId, SessionSnapshot, Track, VoiceChannelId};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::broadcast;

    /// Serves one fixed snapshot for every scope and ignores mutations.
    pub struct StubEngine {
        session: Mutex<SessionSnapshot>,
        fail: AtomicBool,
        events: broadcast::Sender<EngineEvent>,
    }

    impl StubEngine {
        #[must_use]
        pub fn new() -> Arc<Self> {
            let (events, _) = broadcast::channel(16);
            Arc::new(Self {
                session: Mutex::new(SessionSnapshot::default()),
                fail: AtomicBool::new(false),
                events,
            })
        }

        pub fn set_session(&self, snapshot: SessionSnapshot) {
            if let Ok(mut session) = self.session.lock() {
                *session = snapshot;
            }
        }

        /// Make every subsequent call fail with an engine error.
        pub fn fail_sessions(&self) {
            self.fail.store(true, Ordering::SeqCst);
        }

        pub fn emit(&self, event: EngineEvent) {
            let _ = self.events.send(event);
        }

        fn check(&self) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                Err(CoreError::Engine {
                    reason: "stub failure".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl AudioEngine for StubEngine {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn session(&self, _scope: &ScopeId) -> Result<SessionSnapshot> {
            self.check()?;
            Ok(self.session.lock().map(|s| s.clone()).unwrap_or_default())
        }

        async fn search(&self, _query: &str, _requested_by: &Requester) -> Result<SearchResult> {
            self.check()?;
            Ok(SearchResult::default())
        }

        async fn connect(&self, _scope: &ScopeId, _channel: &VoiceChannelId) -> Result<()> {
            self.check()
        }

        async fn enqueue(&self, _scope: &ScopeId, _tracks: Vec<Track>) -> Result<()> {
            self.check()
        }

        async fn play(&self, _scope: &ScopeId) -> Result<()> {
            self.check()
        }

        async fn set_paused(&self, _scope: &ScopeId, _paused: bool) -> Result<()> {
            self.check()
        }

        async fn stop(&self, _scope: &ScopeId) -> Result<()> {
            self.check()
        }

        async fn set_repeat_mode(&self, _scope: &ScopeId, _mode: RepeatMode) -> Result<()> {
            self.check()
        }

        async fn shuffle(&self, _scope: &ScopeId) -> Result<()> {
            self.check()
        }

        async fn remove(&self, _scope: &ScopeId, _track_id: &str) -> Result<Option<Track>> {
            self.check()?;
            Ok(None)
        }

        async fn skip_to(&self, _scope: &ScopeId, _track_id: &str) -> Result<bool> {
            self.check()?;
            Ok(false)
        }

        fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
            self.events.subscribe()
        }
    }
}

//! Audio engine that keeps every session in process memory.

use async_trait::async_trait;
use playdeck_core::{
    AudioEngine, CoreError, EngineEvent, RepeatMode, Requester, ScopeId, SearchResult,
    SessionSnapshot, Track, VoiceChannelId,
};
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use crate::config::{CatalogPlaylist, CatalogTrack, MemoryEngineConfig, ENGINE_NAME};
use crate::error::MemoryEngineError;

const LOG_TARGET: &str = "playdeck::engine::memory";

#[derive(Debug, Default)]
struct Session {
    current: Option<Track>,
    paused: bool,
    repeat_mode: RepeatMode,
    pending: VecDeque<Track>,
    channel: Option<VoiceChannelId>,
    terminated: bool,
}

impl Session {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current: self.current.clone(),
            paused: self.paused,
            repeat_mode: self.repeat_mode,
            pending: self.pending.iter().cloned().collect(),
            connected: self.channel.is_some(),
            terminated: self.terminated,
        }
    }

    /// Move the next pending track into the player.
    fn start_next(&mut self) -> Option<Track> {
        self.current = self.pending.pop_front();
        self.paused = false;
        self.current.clone()
    }

    fn ensure_connected(&self, scope: &ScopeId) -> Result<(), MemoryEngineError> {
        if self.channel.is_some() {
            Ok(())
        } else {
            Err(MemoryEngineError::NotConnected { scope: scope.clone() })
        }
    }
}

/// [`AudioEngine`] over a fixed catalog, with simulated voice connections.
///
/// Nothing is decoded; a track plays until [`MemoryEngine::finish_current`]
/// is called for its scope.
pub struct MemoryEngine {
    tracks: Vec<CatalogTrack>,
    playlists: Vec<CatalogPlaylist>,
    unreachable_channels: HashSet<String>,
    sessions: RwLock<HashMap<ScopeId, Session>>,
    event_tx: broadcast::Sender<EngineEvent>,
}

impl MemoryEngine {
    /// Create a new engine from its config
    #[must_use]
    pub fn new(config: MemoryEngineConfig) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        info!(
            target: LOG_TARGET,
            "Memory engine ready with {} tracks and {} playlists",
            config.tracks.len(),
            config.playlists.len()
        );

        Arc::new(Self {
            tracks: config.tracks,
            playlists: config.playlists,
            unreachable_channels: config.unreachable_channels.into_iter().collect(),
            sessions: RwLock::new(HashMap::new()),
            event_tx,
        })
    }

    /// End the current track as if it had played out, honouring the repeat
    /// mode. Returns the track now playing, if any.
    pub async fn finish_current(&self, scope: &ScopeId) -> Option<Track> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(scope.clone()).or_default();
        let finished = session.current.take()?;
        debug!(target: LOG_TARGET, "Track {} finished in scope {}", finished.id, scope);

        match session.repeat_mode {
            RepeatMode::Track => {
                session.current = Some(finished.clone());
                self.emit(EngineEvent::TrackStarted {
                    scope: scope.clone(),
                    track: finished.clone(),
                });
                return Some(finished);
            }
            RepeatMode::Queue => session.pending.push_back(finished),
            RepeatMode::Off => {}
        }

        let next = session.start_next();
        match &next {
            Some(track) => self.emit(EngineEvent::TrackStarted {
                scope: scope.clone(),
                track: track.clone(),
            }),
            None => self.emit(EngineEvent::QueueEnded { scope: scope.clone() }),
        }
        next
    }

    /// Tear the session down, as when the bot is removed from the voice
    /// channel.
    pub async fn terminate(&self, scope: &ScopeId) {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(scope.clone()).or_default();
        session.channel = None;
        session.current = None;
        session.pending.clear();
        session.terminated = true;
        info!(target: LOG_TARGET, "Session for scope {} terminated", scope);
        self.emit(EngineEvent::QueueEnded { scope: scope.clone() });
    }

    fn emit(&self, event: EngineEvent) {
        // No receivers is fine: nobody is watching yet
        let _ = self.event_tx.send(event);
    }

    fn to_track(entry: &CatalogTrack, requested_by: &Requester) -> Track {
        let track = Track::new(
            entry.id.clone(),
            entry.title.clone(),
            entry.url.clone(),
            Duration::from_millis(entry.duration_ms),
            requested_by.clone(),
        );
        match &entry.thumbnail {
            Some(url) => track.with_thumbnail(url.clone()),
            None => track,
        }
    }

    fn find_playlist(&self, query: &str, requested_by: &Requester) -> Option<Vec<Track>> {
        let playlist = self
            .playlists
            .iter()
            .find(|playlist| playlist.name.eq_ignore_ascii_case(query))?;

        let tracks = playlist
            .tracks
            .iter()
            .filter_map(|id| self.tracks.iter().find(|entry| &entry.id == id))
            .map(|entry| Self::to_track(entry, requested_by))
            .collect();
        Some(tracks)
    }

    /// Exact id, link or title matches first, then partial title matches.
    fn find_tracks(&self, query: &str, requested_by: &Requester) -> Vec<Track> {
        let needle = query.to_lowercase();
        let (exact, partial): (Vec<&CatalogTrack>, Vec<&CatalogTrack>) = self
            .tracks
            .iter()
            .filter(|entry| {
                entry.id.eq_ignore_ascii_case(query)
                    || entry.url == query
                    || entry.title.to_lowercase().contains(&needle)
            })
            .partition(|entry| {
                entry.id.eq_ignore_ascii_case(query)
                    || entry.url == query
                    || entry.title.to_lowercase() == needle
            });

        exact
            .into_iter()
            .chain(partial)
            .map(|entry| Self::to_track(entry, requested_by))
            .collect()
    }
}

#[async_trait]
impl AudioEngine for MemoryEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    async fn session(&self, scope: &ScopeId) -> Result<SessionSnapshot, CoreError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.entry(scope.clone()).or_default().snapshot())
    }

    async fn search(
        &self,
        query: &str,
        requested_by: &Requester,
    ) -> Result<SearchResult, CoreError> {
        let query = query.trim();
        let result = SearchResult {
            playlist: self.find_playlist(query, requested_by),
            tracks: self.find_tracks(query, requested_by),
        };
        debug!(
            target: LOG_TARGET,
            "Search {:?}: playlist={}, {} track(s)",
            query,
            result.playlist.is_some(),
            result.tracks.len()
        );
        Ok(result)
    }

    async fn connect(&self, scope: &ScopeId, channel: &VoiceChannelId) -> Result<(), CoreError> {
        if self.unreachable_channels.contains(channel.as_str()) {
            return Err(MemoryEngineError::ChannelUnreachable {
                channel: channel.clone(),
            }
            .into());
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(scope.clone()).or_default();
        session.channel = Some(channel.clone());
        session.terminated = false;
        info!(target: LOG_TARGET, "Scope {} joined voice channel {}", scope, channel);
        Ok(())
    }

    async fn enqueue(&self, scope: &ScopeId, tracks: Vec<Track>) -> Result<(), CoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(scope.clone()).or_default();
        session.ensure_connected(scope)?;
        session.pending.extend(tracks);
        Ok(())
    }

    async fn play(&self, scope: &ScopeId) -> Result<(), CoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(scope.clone()).or_default();
        session.ensure_connected(scope)?;
        if session.current.is_some() {
            return Ok(());
        }

        if let Some(track) = session.start_next() {
            info!(target: LOG_TARGET, "Scope {} now playing {}", scope, track.title);
            self.emit(EngineEvent::TrackStarted {
                scope: scope.clone(),
                track,
            });
        }
        Ok(())
    }

    async fn set_paused(&self, scope: &ScopeId, paused: bool) -> Result<(), CoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(scope.clone()).or_default();
        if session.current.is_some() {
            session.paused = paused;
        }
        Ok(())
    }

    async fn stop(&self, scope: &ScopeId) -> Result<(), CoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(scope.clone()).or_default();
        session.pending.clear();
        session.current = None;
        session.paused = false;
        Ok(())
    }

    async fn set_repeat_mode(&self, scope: &ScopeId, mode: RepeatMode) -> Result<(), CoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.entry(scope.clone()).or_default().repeat_mode = mode;
        Ok(())
    }

    async fn shuffle(&self, scope: &ScopeId) -> Result<(), CoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(scope.clone()).or_default();
        session.pending.make_contiguous().shuffle(&mut rand::thread_rng());
        Ok(())
    }

    async fn remove(&self, scope: &ScopeId, track_id: &str) -> Result<Option<Track>, CoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(scope.clone()).or_default();
        let removed = session
            .pending
            .iter()
            .position(|track| track.id == track_id)
            .and_then(|index| session.pending.remove(index));
        Ok(removed)
    }

    async fn skip_to(&self, scope: &ScopeId, track_id: &str) -> Result<bool, CoreError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(scope.clone()).or_default();
        let Some(index) = session.pending.iter().position(|track| track.id == track_id) else {
            return Ok(false);
        };

        session.pending.drain(..index);
        if let Some(track) = session.start_next() {
            self.emit(EngineEvent::TrackStarted {
                scope: scope.clone(),
                track,
            });
        }
        Ok(true)
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }
}

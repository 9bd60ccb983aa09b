//! Refreshes player surfaces on engine lifecycle events.

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::broadcast::BroadcastCoordinator;
use crate::engine::{AudioEngine, EngineEvent};
use crate::session::ScopeId;

const LOG_TARGET: &str = "playdeck::watcher";

/// Listens for engine events and republishes the affected scope.
pub struct PlaybackWatcher {
    engine: Arc<dyn AudioEngine>,
    broadcaster: Arc<BroadcastCoordinator>,
    cancel_token: CancellationToken,
}

impl PlaybackWatcher {
    /// Create a new watcher
    ///
    /// # Arguments
    /// * `engine` - Engine whose lifecycle events trigger refreshes
    /// * `broadcaster` - Coordinator that pushes the refreshed view
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    pub fn new(
        engine: Arc<dyn AudioEngine>,
        broadcaster: Arc<BroadcastCoordinator>,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            engine,
            broadcaster,
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    /// Get a clone of the cancellation token
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Start watching in a background task
    #[must_use]
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        // Subscribe before spawning so events emitted right after start are seen
        let rx = self.engine.subscribe();
        tokio::spawn(async move {
            self.run(rx).await;
        })
    }

    async fn run(&self, mut rx: tokio::sync::broadcast::Receiver<EngineEvent>) {
        info!(target: LOG_TARGET, "Watching {} engine events", self.engine.name());

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(target: LOG_TARGET, "Playback watcher shutting down");
                    break;
                }
                event = rx.recv() => {
                    match event {
                        Ok(event) => {
                            debug!(target: LOG_TARGET, "Engine event: {:?}", event);
                            self.spawn_refresh(event.scope().clone());
                        }
                        Err(RecvError::Lagged(n)) => {
                            // Unknown which scopes were affected, refresh them all
                            warn!(
                                target: LOG_TARGET,
                                "Missed {} engine events, refreshing every scope",
                                n
                            );
                            for scope in self.broadcaster.tracker().scopes().await {
                                self.spawn_refresh(scope);
                            }
                        }
                        Err(RecvError::Closed) => {
                            info!(target: LOG_TARGET, "Engine event channel closed");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Refresh in its own task so a slow surface in one scope never holds up
    /// events for another.
    fn spawn_refresh(&self, scope: ScopeId) {
        let broadcaster = self.broadcaster.clone();
        tokio::spawn(async move {
            broadcaster.refresh(&scope).await;
        });
    }
}

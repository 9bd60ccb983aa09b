//! Fan-out of the rendered player view to every tracked surface.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::PlayerConfig;
use crate::error::SurfaceError;
use crate::phrases::Phrases;
use crate::registry::SessionRegistry;
use crate::session::{ScopeId, SessionSnapshot};
use crate::tracker::SurfaceTracker;
use crate::view::render;

const LOG_TARGET: &str = "playdeck::broadcast";

/// What to do with a surface whose push failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushDisposition {
    /// Treat the surface as dead and stop tracking it
    Untrack,
    /// Keep the surface and report the failure
    Escalate,
}

impl PushDisposition {
    /// Every failure is treated as surface death. The platform gives no
    /// reliable way to tell a deleted message from a transient failure.
    ///
    /// [`PushDisposition::Escalate`] is never produced here. It stays as the
    /// place to keep a surface once transient failures can be told apart.
    #[must_use]
    pub const fn classify(_error: &SurfaceError) -> Self {
        Self::Untrack
    }
}

/// Outcome of one publish
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Surfaces that accepted the new view
    pub delivered: usize,
    /// Surfaces untracked after a failed push
    pub pruned: usize,
    /// Failed surfaces that were kept
    pub escalated: usize,
}

impl BroadcastReport {
    #[must_use]
    pub const fn attempted(&self) -> usize {
        self.delivered + self.pruned + self.escalated
    }
}

/// Keeps every surface of a scope showing the same, current player view.
pub struct BroadcastCoordinator {
    tracker: Arc<SurfaceTracker>,
    registry: SessionRegistry,
    config: PlayerConfig,
    phrases: Phrases,
}

impl BroadcastCoordinator {
    #[must_use]
    pub fn new(
        tracker: Arc<SurfaceTracker>,
        registry: SessionRegistry,
        config: PlayerConfig,
        phrases: Phrases,
    ) -> Arc<Self> {
        Arc::new(Self {
            tracker,
            registry,
            config,
            phrases,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &PlayerConfig {
        &self.config
    }

    #[must_use]
    pub const fn phrases(&self) -> &Phrases {
        &self.phrases
    }

    #[must_use]
    pub const fn tracker(&self) -> &Arc<SurfaceTracker> {
        &self.tracker
    }

    /// Fetch the scope's current session and publish it.
    pub async fn refresh(&self, scope: &ScopeId) -> BroadcastReport {
        let session = self.registry.snapshot(scope).await;
        self.publish(scope, session.as_ref()).await
    }

    /// Render `session` once and push it to every surface tracked for `scope`.
    ///
    /// Pushes run concurrently and fail independently. A failed surface is
    /// untracked; the failure never reaches the caller.
    pub async fn publish(
        &self,
        scope: &ScopeId,
        session: Option<&SessionSnapshot>,
    ) -> BroadcastReport {
        let view = render(session, &self.config, &self.phrases);

        let surfaces = self.tracker.surfaces(scope).await;
        if surfaces.is_empty() {
            debug!(target: LOG_TARGET, "No surfaces to refresh for scope {}", scope);
            return BroadcastReport::default();
        }

        let view = &view;
        let pushes = surfaces.iter().map(|surface| async move {
            let result = surface.edit(view).await;
            (surface, result)
        });
        let results = join_all(pushes).await;

        let mut report = BroadcastReport::default();
        for (surface, result) in results {
            let Err(e) = result else {
                report.delivered += 1;
                continue;
            };

            match PushDisposition::classify(&e) {
                PushDisposition::Untrack => {
                    debug!(
                        target: LOG_TARGET,
                        "Surface {} failed ({}), untracking from scope {}",
                        surface.id(),
                        e,
                        scope
                    );
                    self.tracker.untrack(scope, surface.id()).await;
                    report.pruned += 1;
                }
                PushDisposition::Escalate => {
                    warn!(target: LOG_TARGET, "Surface {} failed: {}", surface.id(), e);
                    report.escalated += 1;
                }
            }
        }

        info!(
            target: LOG_TARGET,
            "Refreshed scope {}: {} delivered, {} pruned",
            scope,
            report.delivered,
            report.pruned
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::StubEngine;
    use crate::session::{Requester, Track};
    use crate::surface::testing::{FailingSurface, RecordingSurface};
    use crate::surface::{Surface, SurfaceId};
    use crate::view::PlayerView;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Holds its edit open until released, then fails.
    struct HeldSurface {
        id: SurfaceId,
        entered: AtomicBool,
        release: Notify,
    }

    impl HeldSurface {
        fn new(id: &str) -> Self {
            Self {
                id: SurfaceId::from(id),
                entered: AtomicBool::new(false),
                release: Notify::new(),
            }
        }

        fn is_pending(&self) -> bool {
            self.entered.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Surface for HeldSurface {
        fn id(&self) -> &SurfaceId {
            &self.id
        }

        async fn edit(&self, _view: &PlayerView) -> std::result::Result<(), SurfaceError> {
            self.entered.store(true, Ordering::SeqCst);
            self.release.notified().await;
            Err(SurfaceError::Transport {
                reason: "timed out".into(),
            })
        }
    }

    fn coordinator(
        engine: Arc<StubEngine>,
    ) -> (Arc<SurfaceTracker>, Arc<BroadcastCoordinator>) {
        let tracker = SurfaceTracker::new();
        let broadcaster = BroadcastCoordinator::new(
            tracker.clone(),
            SessionRegistry::new(engine),
            PlayerConfig::default(),
            Phrases::default(),
        );
        (tracker, broadcaster)
    }

    fn playing_session() -> SessionSnapshot {
        SessionSnapshot {
            current: Some(Track::new(
                "t1",
                "First",
                "https://example.com/t1",
                Duration::from_millis(125_000),
                Requester::new("u1", "alice"),
            )),
            connected: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_empty_scope_makes_no_pushes() {
        let (tracker, broadcaster) = coordinator(StubEngine::new());
        let elsewhere = Arc::new(RecordingSurface::new("m1"));
        tracker.track(&ScopeId::from("other"), elsewhere.clone()).await;

        let session = playing_session();
        let report = broadcaster.publish(&ScopeId::from("s1"), Some(&session)).await;

        assert_eq!(report.attempted(), 0);
        assert_eq!(elsewhere.edit_count(), 0);
    }

    #[tokio::test]
    async fn test_every_surface_gets_the_same_view() {
        let (tracker, broadcaster) = coordinator(StubEngine::new());
        let scope = ScopeId::from("s1");
        let a = Arc::new(RecordingSurface::new("a"));
        let b = Arc::new(RecordingSurface::new("b"));
        tracker.track(&scope, a.clone()).await;
        tracker.track(&scope, b.clone()).await;

        let report = broadcaster.publish(&scope, Some(&playing_session())).await;

        assert_eq!(report.delivered, 2);
        assert!(a.last_view().is_some());
        assert_eq!(a.last_view(), b.last_view());
    }

    #[tokio::test]
    async fn test_failed_surfaces_are_untracked() {
        let (tracker, broadcaster) = coordinator(StubEngine::new());
        let scope = ScopeId::from("s2");
        let healthy: Vec<Arc<RecordingSurface>> =
            (0..3).map(|i| Arc::new(RecordingSurface::new(format!("ok{i}")))).collect();
        let broken = Arc::new(FailingSurface::with_error(
            "broken",
            SurfaceError::Rejected { reason: "missing access".into() },
        ));
        let gone = Arc::new(FailingSurface::new("gone"));
        for surface in &healthy {
            tracker.track(&scope, surface.clone()).await;
        }
        tracker.track(&scope, broken.clone()).await;
        tracker.track(&scope, gone.clone()).await;

        let report = broadcaster.publish(&scope, None).await;

        assert_eq!(
            report,
            BroadcastReport {
                delivered: 3,
                pruned: 2,
                escalated: 0
            }
        );
        assert_eq!(tracker.len(&scope).await, 3);
        assert!(!tracker.contains(&scope, &SurfaceId::from("broken")).await);
        assert!(healthy.iter().all(|s| s.edit_count() == 1));
    }

    #[tokio::test]
    async fn test_pruned_surface_not_pushed_again() {
        let (tracker, broadcaster) = coordinator(StubEngine::new());
        let scope = ScopeId::from("s1");
        let gone = Arc::new(FailingSurface::new("gone"));
        tracker.track(&scope, gone.clone()).await;

        broadcaster.publish(&scope, None).await;
        let second = broadcaster.publish(&scope, None).await;

        assert_eq!(gone.attempts(), 1);
        assert_eq!(second.attempted(), 0);
    }

    #[tokio::test]
    async fn test_refresh_reads_engine_session() {
        let engine = StubEngine::new();
        engine.set_session(playing_session());
        let (tracker, broadcaster) = coordinator(engine);
        let scope = ScopeId::from("s1");
        let surface = Arc::new(RecordingSurface::new("m1"));
        tracker.track(&scope, surface.clone()).await;

        broadcaster.refresh(&scope).await;

        let view = surface.last_view();
        assert_eq!(view.as_ref().map(|v| v.panel.title.as_str()), Some("First"));
    }

    #[tokio::test]
    async fn test_refresh_with_failing_engine_renders_nothing_playing() {
        let engine = StubEngine::new();
        engine.fail_sessions();
        let (tracker, broadcaster) = coordinator(engine);
        let scope = ScopeId::from("s1");
        let surface = Arc::new(RecordingSurface::new("m1"));
        tracker.track(&scope, surface.clone()).await;

        broadcaster.refresh(&scope).await;

        assert_eq!(surface.last_view().map(|v| v.is_now_playing()), Some(false));
    }

    #[tokio::test]
    async fn test_slow_surfaces_do_not_hold_back_others() {
        let (tracker, broadcaster) = coordinator(StubEngine::new());
        let scope = ScopeId::from("s1");
        let first = Arc::new(HeldSurface::new("held-1"));
        let second = Arc::new(HeldSurface::new("held-2"));
        let fast = Arc::new(RecordingSurface::new("fast"));
        tracker.track(&scope, first.clone()).await;
        tracker.track(&scope, second.clone()).await;
        tracker.track(&scope, fast.clone()).await;

        let publish = tokio::spawn({
            let broadcaster = broadcaster.clone();
            let scope = scope.clone();
            async move { broadcaster.publish(&scope, None).await }
        });

        // Both held pushes in flight at once, and the fast one already done
        let in_flight = tokio::time::timeout(Duration::from_secs(5), async {
            while !(first.is_pending() && second.is_pending()) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(in_flight.is_ok());
        assert_eq!(fast.edit_count(), 1);
        assert!(!publish.is_finished());

        first.release.notify_one();
        second.release.notify_one();
        let report = publish.await.ok();

        assert_eq!(
            report,
            Some(BroadcastReport {
                delivered: 1,
                pruned: 2,
                escalated: 0
            })
        );
        assert_eq!(tracker.len(&scope).await, 1);
        assert!(tracker.contains(&scope, &SurfaceId::from("fast")).await);
    }

    #[test]
    fn test_classify_always_untracks() {
        for error in [
            SurfaceError::Gone,
            SurfaceError::Rejected { reason: "x".into() },
            SurfaceError::Transport { reason: "timeout".into() },
        ] {
            assert_eq!(PushDisposition::classify(&error), PushDisposition::Untrack);
        }
    }
}

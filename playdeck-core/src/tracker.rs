//! Per-scope registry of surfaces showing a player view.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::session::ScopeId;
use crate::surface::{Surface, SurfaceId};

const LOG_TARGET: &str = "playdeck::tracker";

#[derive(Default)]
struct TrackerInner {
    scopes: HashMap<ScopeId, HashMap<SurfaceId, Arc<dyn Surface>>>,
    /// Scope each surface currently belongs to
    owners: HashMap<SurfaceId, ScopeId>,
}

impl TrackerInner {
    /// Surface set for `scope`, inserted empty on first access
    fn get_or_create(&mut self, scope: &ScopeId) -> &mut HashMap<SurfaceId, Arc<dyn Surface>> {
        self.scopes.entry(scope.clone()).or_default()
    }
}

/// Tracks which surfaces display the player for each scope.
///
/// The lock is only held for map operations, never across a push to a
/// surface, so scopes never wait on each other's network I/O.
#[derive(Default)]
pub struct SurfaceTracker {
    inner: RwLock<TrackerInner>,
}

impl SurfaceTracker {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `surface` under `scope`, replacing any entry with the same id.
    ///
    /// A surface belongs to one scope at a time; tracking it under a new
    /// scope removes it from the old one.
    pub async fn track(&self, scope: &ScopeId, surface: Arc<dyn Surface>) {
        let id = surface.id().clone();
        let mut inner = self.inner.write().await;

        if let Some(previous) = inner.owners.insert(id.clone(), scope.clone()) {
            if &previous != scope {
                if let Some(set) = inner.scopes.get_mut(&previous) {
                    set.remove(&id);
                }
            }
        }

        let replaced = inner.get_or_create(scope).insert(id.clone(), surface).is_some();
        debug!(
            target: LOG_TARGET,
            "Tracked surface {} for scope {} (replaced: {})",
            id,
            scope,
            replaced
        );
    }

    /// Snapshot of the surfaces tracked for `scope`.
    ///
    /// Unknown scopes yield an empty set and are not created.
    pub async fn surfaces(&self, scope: &ScopeId) -> SurfaceSet {
        let inner = self.inner.read().await;
        let surfaces = inner
            .scopes
            .get(scope)
            .map(|set| set.values().cloned().collect())
            .unwrap_or_default();
        SurfaceSet { surfaces }
    }

    /// Stop tracking one surface. No-op if it is not tracked under `scope`.
    pub async fn untrack(&self, scope: &ScopeId, surface_id: &SurfaceId) {
        let mut inner = self.inner.write().await;
        let removed = inner
            .scopes
            .get_mut(scope)
            .and_then(|set| set.remove(surface_id))
            .is_some();

        if removed {
            inner.owners.remove(surface_id);
            debug!(target: LOG_TARGET, "Untracked surface {} for scope {}", surface_id, scope);
        }
    }

    /// Scopes with at least one tracked surface.
    pub async fn scopes(&self) -> Vec<ScopeId> {
        self.inner
            .read()
            .await
            .scopes
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(scope, _)| scope.clone())
            .collect()
    }

    pub async fn len(&self, scope: &ScopeId) -> usize {
        self.inner.read().await.scopes.get(scope).map_or(0, HashMap::len)
    }

    pub async fn contains(&self, scope: &ScopeId, surface_id: &SurfaceId) -> bool {
        self.inner
            .read()
            .await
            .scopes
            .get(scope)
            .is_some_and(|set| set.contains_key(surface_id))
    }
}

/// Point-in-time copy of a scope's surfaces.
///
/// Later `track`/`untrack` calls do not affect an existing set. It can be
/// iterated any number of times.
#[derive(Clone, Default)]
pub struct SurfaceSet {
    surfaces: Vec<Arc<dyn Surface>>,
}

impl SurfaceSet {
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Surface>> {
        self.surfaces.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

impl IntoIterator for SurfaceSet {
    type Item = Arc<dyn Surface>;
    type IntoIter = std::vec::IntoIter<Arc<dyn Surface>>;

    fn into_iter(self) -> Self::IntoIter {
        self.surfaces.into_iter()
    }
}

impl<'a> IntoIterator for &'a SurfaceSet {
    type Item = &'a Arc<dyn Surface>;
    type IntoIter = std::slice::Iter<'a, Arc<dyn Surface>>;

    fn into_iter(self) -> Self::IntoIter {
        self.surfaces.iter()
    }
}

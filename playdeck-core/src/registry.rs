//! Scope to session lookup on top of the engine.

use std::sync::Arc;
use tracing::warn;

use crate::engine::AudioEngine;
use crate::error::Result;
use crate::session::{ScopeId, SessionSnapshot};

const LOG_TARGET: &str = "playdeck::registry";

/// Resolves a scope to its live session.
///
/// Sessions belong to the engine; the registry never creates or destroys
/// one beyond asking the engine for it.
#[derive(Clone)]
pub struct SessionRegistry {
    engine: Arc<dyn AudioEngine>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(engine: Arc<dyn AudioEngine>) -> Self {
        Self { engine }
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<dyn AudioEngine> {
        &self.engine
    }

    /// Snapshot of the scope's session, created idle on first access.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot produce the session.
    pub async fn get_or_create(&self, scope: &ScopeId) -> Result<SessionSnapshot> {
        self.engine.session(scope).await
    }

    /// Like [`get_or_create`](Self::get_or_create), but an engine failure
    /// yields `None`, which renders as "nothing playing".
    pub async fn snapshot(&self, scope: &ScopeId) -> Option<SessionSnapshot> {
        match self.engine.session(scope).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(target: LOG_TARGET, "No session for scope {}: {}", scope, e);
                None
            }
        }
    }
}

//! Chat surfaces that display a player view.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SurfaceError;
use crate::view::PlayerView;

/// Identifies one message or reply, unique across the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(String);

impl SurfaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SurfaceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A previously sent reply that can be edited in place.
///
/// Implementations wrap the chat platform's edit call. A surface may stop
/// accepting edits at any moment (deleted, expired, permissions revoked);
/// any error returned from [`Surface::edit`] is taken to mean the surface is
/// gone for good.
#[async_trait]
pub trait Surface: Send + Sync {
    fn id(&self) -> &SurfaceId;

    /// Replace the surface content with `view`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses or fails the edit.
    async fn edit(&self, view: &PlayerView) -> Result<(), SurfaceError>;
}

/// Surface doubles for tests.
#[cfg(any(test, feature = "test-util"))]
pub mod testing {
    use super::{Surface, SurfaceId};
    use crate::error::SurfaceError;
    use crate::view::PlayerView;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records every view it receives.
    pub struct RecordingSurface {
        id: SurfaceId,
        views: Mutex<Vec<PlayerView>>,
    }

    impl RecordingSurface {
        pub fn new(id: impl Into<String>) -> Self {
            Self {
                id: SurfaceId::new(id),
                views: Mutex::new(Vec::new()),
            }
        }

        /// Views received so far, oldest first.
        #[must_use]
        pub fn views(&self) -> Vec<PlayerView> {
            self.views.lock().map(|v| v.clone()).unwrap_or_default()
        }

        #[must_use]
        pub fn last_view(&self) -> Option<PlayerView> {
            self.views().pop()
        }

        #[must_use]
        pub fn edit_count(&self) -> usize {
            self.views.lock().map(|v| v.len()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl Surface for RecordingSurface {
        fn id(&self) -> &SurfaceId {
            &self.id
        }

        async fn edit(&self, view: &PlayerView) -> Result<(), SurfaceError> {
            if let Ok(mut views) = self.views.lock() {
                views.push(view.clone());
            }
            Ok(())
        }
    }

    /// Rejects every edit, counting the attempts.
    pub struct FailingSurface {
        id: SurfaceId,
        error: SurfaceError,
        attempts: AtomicUsize,
    }

    impl FailingSurface {
        pub fn new(id: impl Into<String>) -> Self {
            Self::with_error(id, SurfaceError::Gone)
        }

        pub fn with_error(id: impl Into<String>, error: SurfaceError) -> Self {
            Self {
                id: SurfaceId::new(id),
                error,
                attempts: AtomicUsize::new(0),
            }
        }

        #[must_use]
        pub fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Surface for FailingSurface {
        fn id(&self) -> &SurfaceId {
            &self.id
        }

        async fn edit(&self, _view: &PlayerView) -> Result<(), SurfaceError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }
    }
}

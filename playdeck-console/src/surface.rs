//! Player surface that logs each payload it receives.

use async_trait::async_trait;
use playdeck_core::view::Component;
use playdeck_core::{PlayerView, Surface, SurfaceError, SurfaceId};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info};

const LOG_TARGET: &str = "playdeck::console::surface";

pub struct ConsoleSurface {
    id: SurfaceId,
    deleted: AtomicBool,
    edits: AtomicUsize,
}

impl ConsoleSurface {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: SurfaceId::new(id),
            deleted: AtomicBool::new(false),
            edits: AtomicUsize::new(0),
        }
    }

    /// Simulate the message being deleted; later edits fail.
    pub fn delete(&self) {
        self.deleted.store(true, Ordering::SeqCst);
    }

    pub fn edits(&self) -> usize {
        self.edits.load(Ordering::SeqCst)
    }
}

/// One-line summary of a view for the log.
pub fn describe(view: &PlayerView) -> String {
    let fields = view
        .panel
        .fields
        .iter()
        .map(|field| format!("{}: {}", field.name, field.value))
        .collect::<Vec<_>>()
        .join(", ");

    let controls = view
        .controls
        .iter()
        .flat_map(|row| row.0.iter())
        .map(|component| {
            let marker = if component.is_disabled() { "-" } else { "+" };
            match component {
                Component::Select(menu) => {
                    format!("{marker}{}[{}]", component.custom_id(), menu.options.len())
                }
                Component::Button(_) => format!("{marker}{}", component.custom_id()),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if fields.is_empty() {
        format!("{} | {}", view.panel.title, controls)
    } else {
        format!("{} ({}) | {}", view.panel.title, fields, controls)
    }
}

#[async_trait]
impl Surface for ConsoleSurface {
    fn id(&self) -> &SurfaceId {
        &self.id
    }

    async fn edit(&self, view: &PlayerView) -> Result<(), SurfaceError> {
        if self.deleted.load(Ordering::SeqCst) {
            return Err(SurfaceError::Gone);
        }

        self.edits.fetch_add(1, Ordering::SeqCst);
        info!(target: LOG_TARGET, "[{}] {}", self.id, describe(view));
        if let Ok(json) = serde_json::to_string(view) {
            debug!(target: LOG_TARGET, "[{}] payload {}", self.id, json);
        }
        Ok(())
    }
}

//! Applies parsed commands to the player, standing in for a chat transport.

use playdeck_core::{
    ControlId, Interaction, Requester, Response, Router, ScopeId, Surface, VoiceChannelId,
};
use playdeck_engine_memory::MemoryEngine;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::command::{Command, HELP};
use crate::surface::{describe, ConsoleSurface};

const LOG_TARGET: &str = "playdeck::console";

/// Whether the read loop should keep going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console {
    router: Router,
    engine: Arc<MemoryEngine>,
    surfaces: HashMap<String, Arc<ConsoleSurface>>,
    scope: ScopeId,
    user: Requester,
    voice_channel: Option<VoiceChannelId>,
}

impl Console {
    pub fn new(router: Router, engine: Arc<MemoryEngine>) -> Self {
        Self {
            router,
            engine,
            surfaces: HashMap::new(),
            scope: ScopeId::from("console"),
            user: Requester::new("console-user", "you"),
            voice_channel: None,
        }
    }

    pub async fn execute(&mut self, command: Command) -> Flow {
        match command {
            Command::Open { surface } => {
                let surface = self.surface(&surface);
                match self.router.controller().open_player(&self.scope, surface).await {
                    Ok(response) => self.report(&response),
                    Err(e) => warn!(target: LOG_TARGET, "Could not open player: {}", e),
                }
            }
            Command::Press { control, surface } => {
                if !self.router.handles(control) {
                    warn!(target: LOG_TARGET, "{} cannot be pressed", control);
                    return Flow::Continue;
                }
                let mut interaction =
                    Interaction::button(self.scope.clone(), self.user.clone(), control.as_str());
                if let Some(surface) = surface {
                    interaction = interaction.on_surface(self.surface(&surface));
                }
                self.dispatch(interaction).await;
            }
            Command::Pick { control, value } => {
                let interaction = Interaction::select(
                    self.scope.clone(),
                    self.user.clone(),
                    control.as_str(),
                    vec![value],
                );
                self.dispatch(interaction).await;
            }
            Command::Add { query } => {
                let mut interaction = Interaction::form(
                    self.scope.clone(),
                    self.user.clone(),
                    ControlId::AddTrackModal.as_str(),
                    [(ControlId::TrackInput.as_str().to_string(), query)],
                );
                if let Some(channel) = &self.voice_channel {
                    interaction = interaction.in_voice_channel(channel.clone());
                }
                self.dispatch(interaction).await;
            }
            Command::Join { channel } => {
                info!(target: LOG_TARGET, "You are now in voice channel {}", channel);
                self.voice_channel = Some(VoiceChannelId::new(channel));
            }
            Command::Leave => {
                info!(target: LOG_TARGET, "You left voice");
                self.voice_channel = None;
            }
            Command::Scope { id } => {
                info!(target: LOG_TARGET, "Acting in scope {}", id);
                self.scope = ScopeId::new(id);
            }
            Command::Delete { surface } => match self.surfaces.get(&surface) {
                Some(existing) => {
                    existing.delete();
                    info!(
                        target: LOG_TARGET,
                        "Surface {} deleted after {} edit(s)",
                        surface,
                        existing.edits()
                    );
                }
                None => warn!(target: LOG_TARGET, "No surface named {}", surface),
            },
            Command::Finish => match self.engine.finish_current(&self.scope).await {
                Some(track) => info!(target: LOG_TARGET, "Advanced to {}", track.title),
                None => info!(target: LOG_TARGET, "Nothing left to play"),
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    async fn dispatch(&self, interaction: Interaction) {
        match self.router.dispatch(interaction).await {
            Ok(response) => self.report(&response),
            Err(e) => warn!(target: LOG_TARGET, "Interaction rejected: {}", e),
        }
    }

    #[allow(clippy::unused_self)]
    fn report(&self, response: &Response) {
        match response {
            Response::Refreshed => info!(target: LOG_TARGET, "ok"),
            Response::Player(view) => info!(target: LOG_TARGET, "reply: {}", describe(view)),
            Response::Form(form) => {
                let labels = form
                    .inputs
                    .iter()
                    .map(|input| input.label.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                info!(
                    target: LOG_TARGET,
                    "form '{}' asks for {} (answer with: add <query>)",
                    form.title,
                    labels
                );
            }
            Response::Ephemeral { content, controls } => {
                if let Some(content) = content {
                    info!(target: LOG_TARGET, "(only you) {}", content);
                }
                let menus = controls
                    .iter()
                    .flat_map(|row| row.0.iter())
                    .filter_map(|c| c.as_select());
                for menu in menus {
                    let options = menu
                        .options
                        .iter()
                        .map(|option| format!("{}={}", option.value, option.label))
                        .collect::<Vec<_>>()
                        .join(", ");
                    info!(
                        target: LOG_TARGET,
                        "(only you) pick {} from: {}",
                        menu.custom_id,
                        options
                    );
                }
            }
            Response::UpdateEphemeral { content } => {
                info!(target: LOG_TARGET, "(only you) {}", content);
            }
            Response::Silent => {}
        }
    }

    /// Console surface by name, created on first use.
    fn surface(&mut self, name: &str) -> Arc<dyn Surface> {
        self.surfaces
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(ConsoleSurface::new(name)))
            .clone()
    }
}

pub mod broadcast;
pub mod config;
pub mod controls;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod paths;
pub mod phrases;
pub mod registry;
pub mod session;
pub mod surface;
pub mod time;
pub mod tracker;
pub mod view;
pub mod watcher;

pub use broadcast::{BroadcastCoordinator, BroadcastReport, PushDisposition};
pub use config::{
    build_config_template, EnginesConfig, LoggingConfig, PlayerConfig, PlaydeckConfig,
};
pub use controls::ControlId;
pub use engine::{AudioEngine, EngineEvent, SearchResult};
pub use error::{CoreError, Result, SurfaceError};
pub use handlers::{Interaction, InteractionPayload, PlayerController, Response, Router};
pub use paths::{config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use phrases::Phrases;
pub use registry::SessionRegistry;
pub use session::{
    PlayerState, RepeatMode, Requester, ScopeId, SessionSnapshot, Track, VoiceChannelId,
};
pub use surface::{Surface, SurfaceId};
pub use time::{total_duration, DurationExt};
pub use tracker::{SurfaceSet, SurfaceTracker};
pub use view::{render, PlayerView};
pub use watcher::PlaybackWatcher;

pub mod config;
pub mod engine;
pub mod error;

#[cfg(test)]
mod scenarios;

pub use config::{
    CatalogPlaylist, CatalogTrack, MemoryEngineConfig, CONFIG_TEMPLATE as MEMORY_CONFIG_TEMPLATE,
    ENGINE_NAME,
};
pub use engine::MemoryEngine;
pub use error::MemoryEngineError;

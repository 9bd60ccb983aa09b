mod command;
mod console;
mod surface;

use crate::command::{Command, HELP};
use crate::console::{Console, Flow};
use playdeck_core::{
    BroadcastCoordinator, CoreError, PlaybackWatcher, PlayerController, PlaydeckConfig, Phrases,
    Router, SessionRegistry, SurfaceTracker,
};
use playdeck_engine_memory::{MemoryEngine, MemoryEngineConfig, MEMORY_CONFIG_TEMPLATE};
use std::fs::File;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    // Load config or create template on first run
    let engine_templates: &[&str] = &[MEMORY_CONFIG_TEMPLATE];
    let config = match PlaydeckConfig::load_or_create(Some(engine_templates)) {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            info!("Created a config template at {}. Review it and run again.", path.display());
            std::process::exit(0);
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let engine_config = match MemoryEngineConfig::from_engines(&config.engines) {
        Ok(Some(engine_config)) => engine_config,
        Ok(None) => {
            warn!("No [engines.memory] section in config, starting with an empty catalog");
            MemoryEngineConfig::default()
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = engine_config.validate() {
        error!("{e}");
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Set up Ctrl+C handler to trigger graceful shutdown
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    runtime.block_on(run(config, engine_config, cancel_token));
}

async fn run(
    config: PlaydeckConfig,
    engine_config: MemoryEngineConfig,
    cancel_token: CancellationToken,
) {
    let engine = MemoryEngine::new(engine_config);
    let tracker = SurfaceTracker::new();
    let registry = SessionRegistry::new(engine.clone());
    let broadcaster = BroadcastCoordinator::new(
        tracker,
        registry.clone(),
        config.player,
        Phrases::default(),
    );
    let router = Router::new(PlayerController::new(registry, broadcaster.clone()));

    let watcher = Arc::new(PlaybackWatcher::new(
        engine.clone(),
        broadcaster,
        Some(cancel_token.clone()),
    ));
    let watcher_handle = watcher.start();

    let mut console = Console::new(router, engine);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        error!("Failed to read input: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        if console.execute(command).await == Flow::Quit {
                            break;
                        }
                    }
                    Err(e) => warn!("{e}"),
                }
            }
        }
    }

    cancel_token.cancel();
    let _ = watcher_handle.await;
    info!("Bye");
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let Ok(content) = std::fs::read_to_string(PlaydeckConfig::config_path()) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with console output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer();

    if file_logging_enabled {
        let log_path = playdeck_core::paths::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

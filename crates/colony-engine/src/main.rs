//! Engine binary for the colony decision engine.
//!
//! Wires the sandbox room, the tick driver, and the run loop together.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `colony-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the starting room
//! 4. Build the tick driver from configuration
//! 5. Install the Ctrl-C stop handler
//! 6. Run the colony until a bound is hit
//! 7. Log the result

mod error;
mod status_callback;

use std::path::Path;

use colony_core::{ColonyConfig, InMemoryTaskMemory, StopHandle, TickDriver, runner};
use colony_world::{WorldView, create_starting_room};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::status_callback::StatusCallback;

const CONFIG_PATH: &str = "colony-config.yaml";

/// Ticks between status lines.
const STATUS_INTERVAL: u64 = 50;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration or the starting room cannot be built.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        colony = %config.colony.name,
        from_file,
        tick_interval_ms = config.world.tick_interval_ms,
        max_ticks = config.world.max_ticks,
        claims = config.claims.enabled,
        "Configuration loaded"
    );

    // 3. Build the starting room.
    let (mut world, ids) = create_starting_room().map_err(EngineError::from)?;
    info!(
        spawn = %ids.spawn,
        controller = %ids.controller,
        rally_point = ?world.rally_point(),
        "Starting room created"
    );

    // 4. Build the tick driver.
    let driver = TickDriver::from_config(&config).map_err(EngineError::from)?;
    let mut memory = InMemoryTaskMemory::new();

    // 5. Stop cleanly on Ctrl-C.
    let stop = StopHandle::new();
    let ctrl_c_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping after the current tick");
            ctrl_c_stop.request_stop();
        }
    });

    // 6. Run.
    let mut callback = StatusCallback::new(STATUS_INTERVAL);
    let result = runner::run_colony(
        &driver,
        &mut world,
        &mut memory,
        &config.world,
        &stop,
        &mut callback,
    )
    .await;

    // 7. Log the result.
    runner::log_run_end(&result);
    let totals = callback.totals();
    info!(
        spawned = totals.spawned,
        transitions = totals.transitions,
        targets_lost = totals.targets_lost,
        spawn_waits = totals.waits,
        remembered_agents = memory.len(),
        "Run totals"
    );

    Ok(())
}

/// Load configuration from `colony-config.yaml`, falling back to defaults
/// when the file does not exist. Also reports whether the file was used.
fn load_config() -> Result<(ColonyConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok((ColonyConfig::from_file(config_path)?, true))
    } else {
        let mut config = ColonyConfig::default();
        config.world.apply_env_overrides();
        Ok((config, false))
    }
}

//! Engine binary for the Appraisal game.
//!
//! Runs the game core as a line-oriented process: commands are read from
//! stdin and events are written to stdout as JSON lines, so any renderer
//! (a terminal UI, a web view behind a pipe) can drive it. Logs go to
//! stderr.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `appraisal-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Create the session controller and start the first round
//! 4. Spawn the stdin reader thread and the stdout writer task
//! 5. Run the game loop until `quit` or end of input
//! 6. Log the result

mod bridge;
mod error;

use std::path::Path;

use appraisal_core::config::GameConfig;
use appraisal_core::runner;
use appraisal_core::session::SessionController;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file looked up relative to the working directory.
const CONFIG_PATH: &str = "appraisal-config.yaml";

/// Capacity of the command channel between the stdin reader and the loop.
const COMMAND_BUFFER: usize = 64;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the game loop fails, or
/// the event stream cannot be written.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("appraisal-engine starting");
    info!(
        from_file,
        duration_sec = config.game.duration_sec,
        seed = config.game.seed,
        threshold_sec = config.ambient.threshold_sec,
        "Configuration loaded"
    );

    // 3. Create the controller and start the first round.
    let unit = config.display.unit.clone();
    let mut controller = SessionController::from_config(config).map_err(EngineError::from)?;
    controller.start();

    // 4. Wire stdin and stdout.
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let forwarded = bridge::read_commands(stdin.lock(), &command_tx);
        info!(forwarded, "Input closed");
    });

    let writer_unit = unit.clone();
    let writer = tokio::spawn(async move {
        bridge::write_events(event_rx, tokio::io::stdout(), &writer_unit).await
    });

    // 5. Run the game loop.
    let summary = runner::run_game(&mut controller, command_rx, &event_tx)
        .await
        .map_err(EngineError::from)?;
    drop(event_tx);

    let written = writer
        .await
        .map_err(EngineError::from)?
        .map_err(EngineError::from)?;

    // 6. Log results.
    runner::log_run_end(&summary, &unit);
    info!(
        end_reason = ?summary.end_reason,
        sessions_played = summary.sessions_played,
        events_written = written,
        "appraisal-engine shutdown complete"
    );

    Ok(())
}

/// Load the game configuration from `appraisal-config.yaml`.
///
/// Falls back to defaults when the file does not exist. Returns whether
/// the file was used.
fn load_config() -> Result<(GameConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        let config = GameConfig::from_file(config_path)?;
        Ok((config, true))
    } else {
        let mut config = GameConfig::default();
        config.game.apply_env_overrides();
        config.validate()?;
        Ok((config, false))
    }
}

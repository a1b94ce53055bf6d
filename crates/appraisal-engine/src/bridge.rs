//! Line-oriented command input and event output for the engine.
//!
//! Commands arrive on stdin, one per line, either as the JSON form of
//! [`Command`] or as a shorthand word:
//!
//! | Input          | Command                        |
//! |----------------|--------------------------------|
//! | `start`        | `Start`                        |
//! | `submit`       | `Submit`                       |
//! | `reset`        | `Reset`                        |
//! | `quit`, `exit` | `Shutdown`                     |
//! | `left`, `right`| `Key` step down / up           |
//! | `home`, `end`  | `Key` to min / max             |
//! | `down <f>`     | `PointerDown { fraction: f }`  |
//! | `move <f>`     | `PointerMove { fraction: f }`  |
//! | `up`           | `PointerUp`                    |
//!
//! Events leave on stdout as one JSON object per line.
//!
//! # Threading
//!
//! Reading stdin blocks, so [`read_commands`] runs on a plain OS thread and
//! hands commands to the async side with `blocking_send`. The writer is
//! async and runs as a tokio task.

use std::io::BufRead;

use appraisal_core::display;
use appraisal_types::{Command, GameEvent, KeyInput};
use tokio::io::{AsyncWrite, AsyncWriteExt as _};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Errors from parsing input lines or writing events.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A line starting with `{` was not a valid command object.
    #[error("invalid command JSON: {source}")]
    Json {
        /// The underlying deserialization error.
        #[from]
        source: serde_json::Error,
    },

    /// A shorthand word was not recognised.
    #[error("unknown command: {input}")]
    Unknown {
        /// The offending line.
        input: String,
    },

    /// A pointer command was missing its position or it was not a number.
    #[error("expected a track position after '{word}'")]
    Fraction {
        /// The pointer command word.
        word: String,
    },

    /// Writing to the output failed.
    #[error("output error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, BridgeError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    if line.starts_with('{') {
        return Ok(Some(serde_json::from_str(line)?));
    }

    let mut words = line.split_whitespace();
    let word = words.next().unwrap_or_default().to_ascii_lowercase();
    let command = match word.as_str() {
        "start" => Command::Start,
        "submit" => Command::Submit,
        "reset" => Command::Reset,
        "quit" | "exit" => Command::Shutdown,
        "left" => Command::Key {
            key: KeyInput::StepDown,
        },
        "right" => Command::Key {
            key: KeyInput::StepUp,
        },
        "home" => Command::Key {
            key: KeyInput::Home,
        },
        "end" => Command::Key { key: KeyInput::End },
        "up" => Command::PointerUp,
        "down" | "move" => {
            let fraction = words
                .next()
                .and_then(|w| w.parse::<f64>().ok())
                .ok_or_else(|| BridgeError::Fraction { word: word.clone() })?;
            if word == "down" {
                Command::PointerDown { fraction }
            } else {
                Command::PointerMove { fraction }
            }
        }
        _ => {
            return Err(BridgeError::Unknown {
                input: line.to_owned(),
            });
        }
    };
    Ok(Some(command))
}

/// Read commands from `input` until EOF or until the runner stops
/// listening. Unparseable lines are logged and skipped.
///
/// Returns the number of commands forwarded.
///
/// Must not be called from inside an async context.
pub fn read_commands(input: impl BufRead, commands: &mpsc::Sender<Command>) -> u64 {
    let mut forwarded: u64 = 0;
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to read input, stopping");
                break;
            }
        };
        match parse_command(&line) {
            Ok(Some(command)) => {
                if commands.blocking_send(command).is_err() {
                    debug!("game loop stopped, no longer reading input");
                    break;
                }
                forwarded = forwarded.saturating_add(1);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "skipping input line"),
        }
    }
    forwarded
}

/// Write every event from `events` to `output` as JSON lines until the
/// sender side closes. Each round's result is also logged as text.
///
/// Returns the number of events written.
pub async fn write_events(
    mut events: mpsc::UnboundedReceiver<GameEvent>,
    mut output: impl AsyncWrite + Unpin,
    unit: &str,
) -> Result<u64, BridgeError> {
    let mut written: u64 = 0;
    while let Some(event) = events.recv().await {
        if let GameEvent::SessionEnded { ref outcome } = event {
            info!("{}", display::summary_line(outcome, unit));
        }
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        output.write_all(&line).await?;
        output.flush().await?;
        written = written.saturating_add(1);
    }
    Ok(written)
}

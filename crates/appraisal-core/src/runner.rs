//! Real-time game loop.
//!
//! [`run_game`] drives a [`SessionController`] against the tokio clock:
//!
//! - **Timed callbacks**: sleeps until the controller's next due time and
//!   fires everything due.
//! - **Input**: applies [`Command`]s from a channel as they arrive.
//! - **Output**: forwards every queued [`GameEvent`] to the renderer channel
//!   after each step.
//! - **Clean shutdown**: stops on [`Command::Shutdown`] or when the command
//!   channel closes.
//!
//! Virtual time is the tokio time elapsed since the loop started, and it is
//! always advanced before a command is applied, so input can never land
//! "before" a callback that was already due.

use appraisal_types::{Command, GameEvent, SessionOutcome};
use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::display;
use crate::session::SessionController;

/// Errors that can occur while the game loop runs.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The event receiver was dropped, so nothing can be rendered.
    #[error("event receiver closed")]
    EventsClosed,
}

/// Why the game loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// A [`Command::Shutdown`] was received.
    Shutdown,
    /// Every command sender was dropped.
    CommandsClosed,
}

/// Result of a game loop run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Why the loop stopped.
    pub end_reason: RunEndReason,
    /// Sessions started over the controller's lifetime.
    pub sessions_played: u64,
    /// Result of the last session, if it ended.
    pub last_outcome: Option<SessionOutcome>,
    /// Events forwarded to the renderer.
    pub events_sent: u64,
}

/// Run the game loop until shutdown.
///
/// Events already queued on the controller (for example from a `start`
/// before the loop) are forwarded first.
///
/// # Errors
///
/// Returns [`RunnerError::EventsClosed`] if the event receiver is dropped.
pub async fn run_game<R: Rng>(
    controller: &mut SessionController<R>,
    mut commands: mpsc::Receiver<Command>,
    events: &mpsc::UnboundedSender<GameEvent>,
) -> Result<RunSummary, RunnerError> {
    let epoch = Instant::now();
    let base = controller.now();
    let mut events_sent: u64 = 0;

    info!(
        duration_sec = controller.config().game.duration_sec,
        "Game loop starting"
    );

    let end_reason = loop {
        events_sent = events_sent.saturating_add(flush(controller, events)?);

        let deadline = controller
            .next_due()
            .and_then(|due| epoch.checked_add(due.saturating_sub(base)));

        let received = match deadline {
            Some(deadline) => {
                tokio::select! {
                    () = tokio::time::sleep_until(deadline) => None,
                    command = commands.recv() => Some(command),
                }
            }
            None => Some(commands.recv().await),
        };

        controller.advance_to(base.saturating_add(epoch.elapsed()));

        match received {
            // Timer fired; the advance above handled it.
            None => {}
            Some(None) => break RunEndReason::CommandsClosed,
            Some(Some(Command::Shutdown)) => break RunEndReason::Shutdown,
            Some(Some(command)) => {
                debug!(?command, "applying command");
                controller.apply(command);
            }
        }
    };

    events_sent = events_sent.saturating_add(flush(controller, events)?);

    Ok(RunSummary {
        end_reason,
        sessions_played: controller.sessions_started(),
        last_outcome: controller.last_outcome().cloned(),
        events_sent,
    })
}

/// Forward every queued event. Returns how many were sent.
fn flush<R: Rng>(
    controller: &mut SessionController<R>,
    events: &mpsc::UnboundedSender<GameEvent>,
) -> Result<u64, RunnerError> {
    let mut sent: u64 = 0;
    for event in controller.drain_events() {
        if events.send(event).is_err() {
            return Err(RunnerError::EventsClosed);
        }
        sent = sent.saturating_add(1);
    }
    Ok(sent)
}

/// Log how the game loop ended.
pub fn log_run_end(summary: &RunSummary, unit: &str) {
    info!(
        reason = ?summary.end_reason,
        sessions_played = summary.sessions_played,
        events_sent = summary.events_sent,
        "Game loop ended"
    );
    if let Some(ref outcome) = summary.last_outcome {
        info!(
            score = outcome.score,
            reason = ?outcome.reason,
            "{}",
            display::summary_line(outcome, unit)
        );
    } else {
        warn!("Game loop ended with no finished session");
    }
}

//! Input commands accepted by the game core and events it emits.
//!
//! Both enums are internally tagged (`{"type": "..."}`) so the renderer
//! can exchange them as JSON lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::KeyInput;
use crate::ids::{NotificationId, SessionId};
use crate::structs::{NotificationItem, SessionOutcome, SliderBounds};

/// Input from the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Begin a new round (same as `Reset` once a round exists).
    Start,
    /// Pointer pressed on the track at a normalized position.
    PointerDown {
        /// Position along the track, nominally in `[0, 1]`.
        fraction: f64,
    },
    /// Pointer moved while pressed.
    PointerMove {
        /// Position along the track, nominally in `[0, 1]`.
        fraction: f64,
    },
    /// Pointer released.
    PointerUp,
    /// Keyboard stepping on the selector handle.
    Key {
        /// Which key was pressed.
        key: KeyInput,
    },
    /// Lock in the current value.
    Submit,
    /// Abandon or restart the round with a fresh target.
    Reset,
    /// Stop the runtime loop.
    Shutdown,
}

/// Output for the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A new round began.
    SessionStarted {
        /// The new round.
        session_id: SessionId,
        /// Wall-clock start time.
        started_at: DateTime<Utc>,
        /// Round length in seconds.
        duration_sec: u32,
        /// Initial selector value.
        value: f64,
        /// Selector domain, for positioning the handle.
        bounds: SliderBounds,
    },
    /// The countdown decremented.
    Tick {
        /// The running round.
        session_id: SessionId,
        /// Seconds remaining after the decrement.
        time_left_sec: u32,
    },
    /// The quantized selector value changed.
    ValueChanged {
        /// The running round.
        session_id: SessionId,
        /// New value.
        value: f64,
    },
    /// The countdown crossed the ambient threshold.
    AmbientActivated {
        /// The running round.
        session_id: SessionId,
        /// Seconds remaining when the latch closed.
        time_left_sec: u32,
    },
    /// An ambient notification appeared.
    NotificationSpawned {
        /// The round that spawned it.
        session_id: SessionId,
        /// The item to render.
        item: NotificationItem,
    },
    /// An ambient notification reached the end of its lifetime.
    NotificationExpired {
        /// The item to remove.
        id: NotificationId,
    },
    /// The round ended and the target is revealed.
    SessionEnded {
        /// Final score and reveal.
        outcome: SessionOutcome,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_parses_from_tagged_json() {
        let cmd: Result<Command, _> =
            serde_json::from_str(r#"{"type":"pointer_down","fraction":0.25}"#);
        assert!(matches!(
            cmd,
            Ok(Command::PointerDown { fraction }) if (fraction - 0.25).abs() < f64::EPSILON
        ));

        let cmd: Result<Command, _> = serde_json::from_str(r#"{"type":"key","key":"end"}"#);
        assert!(matches!(cmd, Ok(Command::Key { key: KeyInput::End })));

        let cmd: Result<Command, _> = serde_json::from_str(r#"{"type":"submit"}"#);
        assert!(matches!(cmd, Ok(Command::Submit)));
    }

    #[test]
    fn unknown_command_is_rejected() {
        let cmd: Result<Command, _> = serde_json::from_str(r#"{"type":"teleport"}"#);
        assert!(cmd.is_err());
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = GameEvent::NotificationExpired {
            id: NotificationId(3),
        };
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(json["type"], "notification_expired");
        assert_eq!(json["id"], 3);
    }
}

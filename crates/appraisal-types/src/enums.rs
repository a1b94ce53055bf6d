//! Enumeration types shared between the game core and its renderer.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle state of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// The countdown is live and input is accepted.
    Running,
    /// The round is over; the selector is frozen and the score is final.
    Ended,
}

/// Why a session ended. Only used to pick the summary wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The player pressed submit.
    Manual,
    /// The countdown reached zero.
    Timeout,
}

/// Screen side an ambient notification is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Left gutter, beside the focal content.
    Left,
    /// Right gutter, beside the focal content.
    Right,
}

/// Visual size variant of an ambient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum NotificationSize {
    /// Default text size.
    Regular,
    /// Reduced text size.
    Small,
}

/// Discrete keyboard input accepted by the value selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum KeyInput {
    /// Decrease by the keyboard increment (`ArrowLeft`).
    StepDown,
    /// Increase by the keyboard increment (`ArrowRight`).
    StepUp,
    /// Jump to the lower bound.
    Home,
    /// Jump to the upper bound.
    End,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&EndReason::Timeout).ok().as_deref(),
            Some("\"timeout\"")
        );
        assert_eq!(
            serde_json::to_string(&KeyInput::StepDown).ok().as_deref(),
            Some("\"step_down\"")
        );
    }

    #[test]
    fn key_input_parses() {
        let key: Result<KeyInput, _> = serde_json::from_str("\"home\"");
        assert!(matches!(key, Ok(KeyInput::Home)));
    }
}

//! Core record types: notification items, slider bounds, and round outcomes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EndReason, NotificationSize, Side};
use crate::ids::{NotificationId, SessionId};

/// Where an ambient notification is drawn.
///
/// Percentages are relative to the viewport (`vh` for `top_percent`, `vw`
/// for `left_percent`). Each side has its own horizontal range so items
/// never cover the shared focal content in the middle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Placement {
    /// Which gutter the item belongs to.
    pub side: Side,
    /// Vertical offset from the top of the viewport.
    pub top_percent: f64,
    /// Horizontal offset from the left of the viewport.
    pub left_percent: f64,
}

/// An ephemeral "someone else appraised this" message.
///
/// Items are not owned by the session: once spawned they live for
/// `lifetime_ms` and are then removed, even if the round has ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NotificationItem {
    /// Process-unique identifier.
    pub id: NotificationId,
    /// Batch this item was spawned in (1-based within the session).
    pub batch: u64,
    /// Message text.
    pub text: String,
    /// Size variant.
    pub size: NotificationSize,
    /// Screen placement.
    pub placement: Placement,
    /// Small rotation for visual variety, in degrees.
    pub rotation_deg: f64,
    /// Time until the item removes itself, in milliseconds.
    pub lifetime_ms: u64,
}

/// Legal domain and quantization grid of the value selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SliderBounds {
    /// Lower bound (inclusive).
    pub min: f64,
    /// Upper bound (inclusive).
    pub max: f64,
    /// Quantization step, measured from `min`.
    pub step: f64,
}

impl SliderBounds {
    /// Width of the legal domain (`max - min`).
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Final result of a round, revealed when the session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionOutcome {
    /// The round this outcome belongs to.
    pub session_id: SessionId,
    /// Value on the selector when the round ended.
    pub submitted_value: f64,
    /// The hidden target, now revealed.
    pub target_value: f64,
    /// Absolute distance between submitted and target values.
    pub diff: f64,
    /// Accuracy in `[0, 100]`.
    pub score: f64,
    /// Manual submit or countdown expiry.
    pub reason: EndReason,
}

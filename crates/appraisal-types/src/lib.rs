//! Shared type definitions for the Appraisal game.
//!
//! This crate holds every type that crosses the boundary between the game
//! core and the rendering collaborator. Types flow to `TypeScript` via
//! `ts-rs` so the view can consume the JSON event stream with static types.
//!
//! # Modules
//!
//! - [`ids`] -- Session and notification identifiers
//! - [`enums`] -- Session state, end reason, placement side, key input
//! - [`structs`] -- Notification items, slider bounds, round outcomes
//! - [`events`] -- Input [`Command`]s and output [`GameEvent`]s

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EndReason, KeyInput, NotificationSize, SessionState, Side};
pub use events::{Command, GameEvent};
pub use ids::{NotificationId, SessionId};
pub use structs::{NotificationItem, Placement, SessionOutcome, SliderBounds};

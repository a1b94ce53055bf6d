//! Round logic for the Appraisal value-estimation game.
//!
//! A player drags a slider to guess a hidden appraisal value before a
//! countdown runs out. Submitting (or running out of time) reveals the
//! target and scores the guess. Late in the round, ambient "social proof"
//! notifications appear around the slider.
//!
//! # Modules
//!
//! - [`ambient`] -- Threshold-latched, probabilistic notification spawner.
//! - [`config`] -- Configuration loading from `appraisal-config.yaml` into
//!   strongly-typed structs.
//! - [`countdown`] -- One-tick-per-second round countdown.
//! - [`display`] -- Clock, amount, and result formatting.
//! - [`runner`] -- Real-time tokio loop around the controller.
//! - [`scheduler`] -- Virtual-time task queue with cancellable handles.
//! - [`scoring`] -- Distance-based accuracy score.
//! - [`selector`] -- Bounded, quantized value selector.
//! - [`session`] -- [`SessionController`], which owns one round at a time.
//!
//! [`SessionController`]: session::SessionController

pub mod ambient;
pub mod config;
pub mod countdown;
pub mod display;
pub mod runner;
pub mod scheduler;
pub mod scoring;
pub mod selector;
pub mod session;

//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and the game loop.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: appraisal_core::config::ConfigError,
    },

    /// The game loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: appraisal_core::runner::RunnerError,
    },

    /// Writing the event stream failed.
    #[error("bridge error: {source}")]
    Bridge {
        /// The underlying bridge error.
        #[from]
        source: crate::bridge::BridgeError,
    },

    /// The event writer task panicked or was cancelled.
    #[error("writer task failed: {source}")]
    Task {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}

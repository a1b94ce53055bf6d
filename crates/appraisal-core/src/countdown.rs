//! Round countdown: one decrement per second until zero, then expiry.
//!
//! The countdown is the single source of truth for remaining time. It owns
//! at most one repeating [`TaskKind::CountdownTick`] handle; starting again
//! cancels the previous handle first, so two timers can never run at once.
//!
//! # Design Principles
//!
//! - Remaining time only decreases, and never below zero.
//! - A callback fired under a handle that is no longer current is ignored.
//! - Stopping is idempotent.

use std::time::Duration;

use tracing::debug;

use crate::scheduler::{Scheduler, TaskHandle, TaskKind};

/// Real time between two decrements.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// What one countdown callback produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownStep {
    /// Remaining seconds after this callback.
    pub time_left_sec: u32,
    /// Whether the remaining time was decremented (a tick to report).
    pub decremented: bool,
    /// Whether the countdown reached zero and stopped itself.
    pub expired: bool,
}

/// Monotonic one-tick-per-second countdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    /// Seconds remaining.
    time_left_sec: u32,
    /// Handle of the repeating tick task while running.
    handle: Option<TaskHandle>,
}

impl Countdown {
    /// Create a stopped countdown at zero.
    pub const fn new() -> Self {
        Self {
            time_left_sec: 0,
            handle: None,
        }
    }

    /// Reset to `duration_sec` and begin ticking.
    ///
    /// Any previous run is stopped first.
    pub fn start(&mut self, duration_sec: u32, scheduler: &mut Scheduler) {
        self.stop(scheduler);
        self.time_left_sec = duration_sec;
        self.handle = Some(scheduler.schedule_every(TICK_INTERVAL, TaskKind::CountdownTick));
        debug!(duration_sec, "countdown started");
    }

    /// Halt ticking. Returns `true` if the countdown was running.
    pub fn stop(&mut self, scheduler: &mut Scheduler) -> bool {
        self.handle.take().is_some_and(|handle| scheduler.cancel(handle))
    }

    /// Whether a tick task is armed.
    pub const fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Seconds remaining.
    pub const fn time_left_sec(&self) -> u32 {
        self.time_left_sec
    }

    /// Handle a fired [`TaskKind::CountdownTick`].
    ///
    /// Returns `None` when `handle` is not the current run's handle.
    /// Otherwise decrements once (unless already at zero) and, on reaching
    /// zero, stops and reports expiry in the same step.
    pub fn on_tick(
        &mut self,
        handle: TaskHandle,
        scheduler: &mut Scheduler,
    ) -> Option<CountdownStep> {
        if self.handle != Some(handle) {
            debug!("ignoring stale countdown tick");
            return None;
        }

        let decremented = self.time_left_sec > 0;
        self.time_left_sec = self.time_left_sec.saturating_sub(1);

        let expired = self.time_left_sec == 0;
        if expired {
            self.stop(scheduler);
        }

        Some(CountdownStep {
            time_left_sec: self.time_left_sec,
            decremented,
            expired,
        })
    }
}

//! Game session controller: one round from start to reveal.
//!
//! [`SessionController`] owns every component (countdown, selector, ambient
//! notifier, scheduler, RNG) and the live [`GameSession`] record. All
//! mutation goes through its public operations, and every event for the
//! renderer is queued in an outbox drained with
//! [`SessionController::drain_events`].
//!
//! # Lifecycle
//!
//! ```text
//! (none) --start--> Running --submit / expiry--> Ended
//!                      ^                           |
//!                      +-----------reset-----------+
//! ```
//!
//! The Running to Ended transition is guarded: whichever of manual submit
//! and countdown expiry arrives first wins, and the other is ignored.
//!
//! # Ordering
//!
//! Within one countdown tick the decrement is reported first, then the
//! ambient threshold is checked, then expiry is handled.

use std::time::Duration;

use appraisal_types::{
    Command, EndReason, GameEvent, KeyInput, NotificationItem, SessionId, SessionOutcome,
    SessionState,
};
use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::ambient::{AmbientNotifier, AmbientPhase};
use crate::config::{ConfigError, GameConfig};
use crate::countdown::Countdown;
use crate::scheduler::{DueTask, Scheduler, TaskKind};
use crate::scoring;
use crate::selector::ValueSelector;

/// One play-through.
///
/// The target is only readable through [`GameSession::revealed_target`]
/// once the round has ended.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    /// Identifier of this round.
    id: SessionId,
    /// Running or Ended.
    state: SessionState,
    /// Wall-clock start time.
    started_at: DateTime<Utc>,
    /// Seconds remaining, mirrored from the countdown.
    time_left_sec: u32,
    /// Hidden target.
    target_value: f64,
    /// Selector value, mirrored from the selector.
    current_value: f64,
    /// Final result once ended.
    outcome: Option<SessionOutcome>,
}

impl GameSession {
    /// Identifier of this round.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Running or Ended.
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Seconds remaining.
    pub const fn time_left_sec(&self) -> u32 {
        self.time_left_sec
    }

    /// Current selector value.
    pub const fn current_value(&self) -> f64 {
        self.current_value
    }

    /// The target, once the round has ended.
    pub fn revealed_target(&self) -> Option<f64> {
        match self.state {
            SessionState::Ended => Some(self.target_value),
            SessionState::Running => None,
        }
    }

    /// Final result, once the round has ended.
    pub const fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }
}

/// Orchestrates one session at a time over a virtual-time scheduler.
#[derive(Debug)]
pub struct SessionController<R = SmallRng> {
    /// Validated configuration.
    config: GameConfig,
    /// Shared task queue for every timed callback.
    scheduler: Scheduler,
    /// Round countdown.
    countdown: Countdown,
    /// Value input.
    selector: ValueSelector,
    /// Background notification spawner.
    ambient: AmbientNotifier,
    /// The live session, if one was ever started.
    session: Option<GameSession>,
    /// Randomness for targets and ambient items.
    rng: R,
    /// Events not yet handed to the renderer.
    outbox: Vec<GameEvent>,
    /// Sessions created so far.
    sessions_started: u64,
}

impl SessionController<SmallRng> {
    /// Create a controller seeded from `game.seed`, or from OS entropy when
    /// no seed is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails validation.
    pub fn from_config(config: GameConfig) -> Result<Self, ConfigError> {
        let rng = match config.game.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self::new(config, rng)
    }
}

impl<R: Rng> SessionController<R> {
    /// Create a controller with no session yet.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration fails validation.
    pub fn new(config: GameConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let selector = ValueSelector::new(&config.slider);
        let ambient = AmbientNotifier::new(config.ambient.clone());
        Ok(Self {
            config,
            scheduler: Scheduler::new(),
            countdown: Countdown::new(),
            selector,
            ambient,
            session: None,
            rng,
            outbox: Vec::new(),
            sessions_started: 0,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The configuration in use.
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The live session, if any.
    pub const fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// State of the live session, if any.
    pub fn state(&self) -> Option<SessionState> {
        self.session.as_ref().map(GameSession::state)
    }

    /// Whether a session is running.
    pub fn is_running(&self) -> bool {
        self.state() == Some(SessionState::Running)
    }

    /// Current selector value.
    pub fn current_value(&self) -> f64 {
        self.selector.value()
    }

    /// Seconds remaining on the countdown.
    pub const fn time_left_sec(&self) -> u32 {
        self.countdown.time_left_sec()
    }

    /// Phase of the ambient notifier.
    pub const fn ambient_phase(&self) -> AmbientPhase {
        self.ambient.phase()
    }

    /// Result of the live session once it has ended.
    pub fn last_outcome(&self) -> Option<&SessionOutcome> {
        self.session.as_ref().and_then(GameSession::outcome)
    }

    /// Number of sessions created so far.
    pub const fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    /// Virtual time since the controller was created.
    pub const fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Due time of the next scheduled callback.
    pub fn next_due(&mut self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    /// Take every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.outbox)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Begin a new session, replacing any existing one.
    ///
    /// Draws a fresh target, restarts the countdown, resets the selector to
    /// `min`, and returns the ambient notifier to Idle.
    pub fn start(&mut self) -> SessionId {
        self.countdown.stop(&mut self.scheduler);
        self.ambient.reset(&mut self.scheduler);
        self.selector.reset();

        let duration_sec = self.config.game.duration_sec;
        let target_value = self.draw_target();
        let session = GameSession {
            id: SessionId::new(),
            state: SessionState::Running,
            started_at: Utc::now(),
            time_left_sec: duration_sec,
            target_value,
            current_value: self.selector.value(),
            outcome: None,
        };
        let id = session.id;
        self.sessions_started = self.sessions_started.saturating_add(1);

        self.outbox.push(GameEvent::SessionStarted {
            session_id: id,
            started_at: session.started_at,
            duration_sec,
            value: session.current_value,
            bounds: self.selector.bounds(),
        });
        self.session = Some(session);
        self.countdown.start(duration_sec, &mut self.scheduler);
        info!(session_id = %id, duration_sec, "session started");

        // A round shorter than the threshold is inside it from the start.
        self.check_ambient(duration_sec);
        id
    }

    /// Abandon or restart: always re-enters [`start`](Self::start).
    pub fn reset(&mut self) -> SessionId {
        if self.is_running() {
            info!("abandoning running session");
        }
        self.start()
    }

    /// Lock in the current value. Has no effect unless running.
    pub fn submit(&mut self) -> Option<SessionOutcome> {
        self.end(EndReason::Manual)
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Set the selector from a raw value.
    pub fn set_raw(&mut self, raw: f64) {
        if self.is_running() {
            let changed = self.selector.set_raw(raw);
            self.publish_value(changed);
        }
    }

    /// Pointer pressed on the track.
    pub fn pointer_down(&mut self, fraction: f64) {
        if self.is_running() {
            let changed = self.selector.pointer_down(fraction);
            self.publish_value(changed);
        }
    }

    /// Pointer moved.
    pub fn pointer_move(&mut self, fraction: f64) {
        if self.is_running() {
            let changed = self.selector.pointer_move(fraction);
            self.publish_value(changed);
        }
    }

    /// Pointer released.
    pub const fn pointer_up(&mut self) {
        self.selector.pointer_up();
    }

    /// Keyboard stepping.
    pub fn key(&mut self, key: KeyInput) {
        if self.is_running() {
            let changed = self.selector.apply_key(key);
            self.publish_value(changed);
        }
    }

    /// Dispatch an input command. [`Command::Shutdown`] is handled by the
    /// runtime loop and ignored here.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Start => {
                if self.session.is_some() {
                    self.reset();
                } else {
                    self.start();
                }
            }
            Command::PointerDown { fraction } => self.pointer_down(fraction),
            Command::PointerMove { fraction } => self.pointer_move(fraction),
            Command::PointerUp => self.pointer_up(),
            Command::Key { key } => self.key(key),
            Command::Submit => {
                self.submit();
            }
            Command::Reset => {
                self.reset();
            }
            Command::Shutdown => {}
        }
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Fire every callback due at or before `elapsed`, in due order, then
    /// move the clock to `elapsed`.
    pub fn advance_to(&mut self, elapsed: Duration) {
        while let Some(task) = self.scheduler.pop_due(elapsed) {
            self.dispatch(task);
        }
        self.scheduler.advance_clock(elapsed);
    }

    /// Advance the clock by `delta`.
    pub fn advance_by(&mut self, delta: Duration) {
        let target = self.scheduler.now().saturating_add(delta);
        self.advance_to(target);
    }

    fn dispatch(&mut self, task: DueTask) {
        match task.kind {
            TaskKind::CountdownTick => {
                let Some(step) = self.countdown.on_tick(task.handle, &mut self.scheduler) else {
                    return;
                };
                if step.decremented {
                    if let Some(session) = self.session.as_mut() {
                        session.time_left_sec = step.time_left_sec;
                        self.outbox.push(GameEvent::Tick {
                            session_id: session.id,
                            time_left_sec: step.time_left_sec,
                        });
                    }
                    self.check_ambient(step.time_left_sec);
                }
                if step.expired {
                    self.end(EndReason::Timeout);
                }
            }
            TaskKind::AmbientBatch => {
                let items = self
                    .ambient
                    .on_batch(task.handle, &mut self.scheduler, &mut self.rng);
                self.publish_items(items);
            }
            TaskKind::AmbientFollowUp { batch } => {
                let item = self.ambient.on_follow_up(
                    task.handle,
                    batch,
                    &mut self.scheduler,
                    &mut self.rng,
                );
                self.publish_items(item);
            }
            TaskKind::NotificationExpiry(id) => {
                self.outbox.push(GameEvent::NotificationExpired { id });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Running to Ended, at most once per session.
    fn end(&mut self, reason: EndReason) -> Option<SessionOutcome> {
        let session = self.session.as_mut()?;
        if session.state != SessionState::Running {
            debug!(?reason, "session already ended, ignoring");
            return None;
        }
        session.state = SessionState::Ended;

        self.countdown.stop(&mut self.scheduler);
        self.ambient.stop(&mut self.scheduler);
        self.selector.freeze();

        let bounds = self.selector.bounds();
        let submitted_value = self.selector.value();
        let outcome = SessionOutcome {
            session_id: session.id,
            submitted_value,
            target_value: session.target_value,
            diff: scoring::diff(submitted_value, session.target_value),
            score: scoring::score(submitted_value, session.target_value, bounds.min, bounds.max),
            reason,
        };
        session.current_value = submitted_value;
        session.outcome = Some(outcome.clone());

        info!(
            session_id = %outcome.session_id,
            ?reason,
            submitted = outcome.submitted_value,
            target = outcome.target_value,
            diff = outcome.diff,
            score = outcome.score,
            "session ended"
        );
        self.outbox.push(GameEvent::SessionEnded {
            outcome: outcome.clone(),
        });
        Some(outcome)
    }

    fn check_ambient(&mut self, time_left_sec: u32) {
        let Some(session_id) = self.session.as_ref().map(GameSession::id) else {
            return;
        };
        if let Some(items) = self
            .ambient
            .observe(time_left_sec, &mut self.scheduler, &mut self.rng)
        {
            self.outbox.push(GameEvent::AmbientActivated {
                session_id,
                time_left_sec,
            });
            self.publish_items(items);
        }
    }

    fn publish_items(&mut self, items: impl IntoIterator<Item = NotificationItem>) {
        let Some(session_id) = self.session.as_ref().map(GameSession::id) else {
            return;
        };
        self.outbox.extend(
            items
                .into_iter()
                .map(|item| GameEvent::NotificationSpawned { session_id, item }),
        );
    }

    fn publish_value(&mut self, changed: Option<f64>) {
        let (Some(value), Some(session)) = (changed, self.session.as_mut()) else {
            return;
        };
        session.current_value = value;
        self.outbox.push(GameEvent::ValueChanged {
            session_id: session.id,
            value,
        });
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw_target(&mut self) -> f64 {
        let range = self.config.target;
        self.rng.random_range(range.min..=range.max) as f64
    }
}

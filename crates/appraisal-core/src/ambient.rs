//! Ambient "social proof" notification spawner.
//!
//! Once the countdown first drops to the activation threshold, the notifier
//! latches active and spawns a batch immediately, then one batch every
//! `batch_interval_ms`. A batch is one item, or two items where the second
//! follows after a short random delay. The latch is edge-triggered: it
//! closes at most once per session and only [`AmbientNotifier::reset`]
//! reopens it.
//!
//! ```text
//! Idle --(0 < left <= threshold)--> Active --(stop)--> Stopped
//!   \________________________(stop)_______________________/
//! ```
//!
//! Items are not tracked after spawning. Each one schedules its own
//! [`TaskKind::NotificationExpiry`], which stopping does not cancel: items
//! already on screen fade out on their own.

use std::time::Duration;

use appraisal_types::{NotificationId, NotificationItem, NotificationSize, Placement, Side};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, info};

use crate::config::{AmbientConfig, PercentRange};
use crate::scheduler::{Scheduler, TaskHandle, TaskKind};

/// Lifecycle phase of the notifier within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmbientPhase {
    /// Waiting for the countdown to reach the threshold.
    Idle,
    /// Spawning batches.
    Active,
    /// Session ended; nothing more will spawn until reset.
    Stopped,
}

/// Time-gated, probabilistic spawner of notification items.
#[derive(Debug, Clone)]
pub struct AmbientNotifier {
    /// Spawner parameters.
    config: AmbientConfig,
    /// Current phase.
    phase: AmbientPhase,
    /// One-shot latch, set on the Idle to Active transition.
    activated: bool,
    /// Recurring batch task while active.
    batch_handle: Option<TaskHandle>,
    /// Delayed second spawns not yet fired.
    follow_ups: Vec<TaskHandle>,
    /// Batches spawned this session.
    batches: u64,
    /// Scheduler time of the most recent batch.
    last_batch_at: Option<Duration>,
    /// Identifier for the next spawned item.
    next_id: NotificationId,
}

impl AmbientNotifier {
    /// Create an idle, unlatched notifier.
    pub const fn new(config: AmbientConfig) -> Self {
        Self {
            config,
            phase: AmbientPhase::Idle,
            activated: false,
            batch_handle: None,
            follow_ups: Vec::new(),
            batches: 0,
            last_batch_at: None,
            next_id: NotificationId(0),
        }
    }

    /// Current phase.
    pub const fn phase(&self) -> AmbientPhase {
        self.phase
    }

    /// Whether the latch has closed this session.
    pub const fn is_activated(&self) -> bool {
        self.activated
    }

    /// Number of batches spawned this session.
    pub const fn batches(&self) -> u64 {
        self.batches
    }

    /// Scheduler time of the most recent batch, if any.
    pub const fn last_batch_at(&self) -> Option<Duration> {
        self.last_batch_at
    }

    /// Return to Idle with the latch open, cancelling all pending tasks.
    pub fn reset(&mut self, scheduler: &mut Scheduler) {
        self.cancel_pending(scheduler);
        self.phase = AmbientPhase::Idle;
        self.activated = false;
        self.batches = 0;
        self.last_batch_at = None;
    }

    /// Enter Stopped and cancel the recurring batch and any pending
    /// second spawn. Returns `true` if the phase changed.
    pub fn stop(&mut self, scheduler: &mut Scheduler) -> bool {
        self.cancel_pending(scheduler);
        if self.phase == AmbientPhase::Stopped {
            return false;
        }
        debug!(batches = self.batches, "ambient notifier stopped");
        self.phase = AmbientPhase::Stopped;
        true
    }

    /// Check the remaining time after a countdown step.
    ///
    /// Activates when idle, unlatched, and `0 < time_left_sec <= threshold`,
    /// returning the items of the immediate first batch. Returns `None`
    /// when no transition happened.
    pub fn observe(
        &mut self,
        time_left_sec: u32,
        scheduler: &mut Scheduler,
        rng: &mut impl Rng,
    ) -> Option<Vec<NotificationItem>> {
        if self.phase != AmbientPhase::Idle || self.activated {
            return None;
        }
        if time_left_sec == 0 || time_left_sec > self.config.threshold_sec {
            return None;
        }

        self.activated = true;
        self.phase = AmbientPhase::Active;
        self.batch_handle = Some(scheduler.schedule_every(
            Duration::from_millis(self.config.batch_interval_ms),
            TaskKind::AmbientBatch,
        ));
        info!(
            time_left_sec,
            threshold_sec = self.config.threshold_sec,
            "ambient notifications activated"
        );

        Some(self.spawn_batch(scheduler, rng))
    }

    /// Handle a fired [`TaskKind::AmbientBatch`].
    pub fn on_batch(
        &mut self,
        handle: TaskHandle,
        scheduler: &mut Scheduler,
        rng: &mut impl Rng,
    ) -> Vec<NotificationItem> {
        if self.phase != AmbientPhase::Active || self.batch_handle != Some(handle) {
            return Vec::new();
        }
        self.spawn_batch(scheduler, rng)
    }

    /// Handle a fired [`TaskKind::AmbientFollowUp`].
    pub fn on_follow_up(
        &mut self,
        handle: TaskHandle,
        batch: u64,
        scheduler: &mut Scheduler,
        rng: &mut impl Rng,
    ) -> Option<NotificationItem> {
        let position = self.follow_ups.iter().position(|h| *h == handle)?;
        self.follow_ups.swap_remove(position);
        if self.phase != AmbientPhase::Active {
            return None;
        }
        Some(self.spawn_item(batch, scheduler, rng))
    }

    /// Spawn the first item of a new batch now and, with probability
    /// `1 - single_probability`, schedule its second item.
    fn spawn_batch(
        &mut self,
        scheduler: &mut Scheduler,
        rng: &mut impl Rng,
    ) -> Vec<NotificationItem> {
        self.batches = self.batches.saturating_add(1);
        self.last_batch_at = Some(scheduler.now());
        let batch = self.batches;

        let single = rng.random_bool(self.config.single_probability);
        let first = self.spawn_item(batch, scheduler, rng);

        if !single {
            let delay_ms = rng.random_range(0..=self.config.follow_up_max_delay_ms);
            let handle = scheduler.schedule_once(
                Duration::from_millis(delay_ms),
                TaskKind::AmbientFollowUp { batch },
            );
            self.follow_ups.push(handle);
        }

        debug!(batch, count = if single { 1 } else { 2 }, "ambient batch");
        vec![first]
    }

    fn spawn_item(
        &mut self,
        batch: u64,
        scheduler: &mut Scheduler,
        rng: &mut impl Rng,
    ) -> NotificationItem {
        let id = self.next_id;
        self.next_id = id.next();

        let text = self.config.messages.choose(rng).cloned().unwrap_or_default();
        let size = if rng.random_bool(self.config.small_probability) {
            NotificationSize::Small
        } else {
            NotificationSize::Regular
        };
        let side = if rng.random_bool(0.5) {
            Side::Left
        } else {
            Side::Right
        };
        let horizontal = match side {
            Side::Left => self.config.left_side_percent,
            Side::Right => self.config.right_side_percent,
        };
        let placement = Placement {
            side,
            top_percent: sample(rng, self.config.top_percent),
            left_percent: sample(rng, horizontal),
        };
        let rotation_deg = sample(
            rng,
            PercentRange::new(-self.config.max_rotation_deg, self.config.max_rotation_deg),
        );

        scheduler.schedule_once(
            Duration::from_millis(self.config.lifetime_ms),
            TaskKind::NotificationExpiry(id),
        );

        NotificationItem {
            id,
            batch,
            text,
            size,
            placement,
            rotation_deg,
            lifetime_ms: self.config.lifetime_ms,
        }
    }

    fn cancel_pending(&mut self, scheduler: &mut Scheduler) {
        if let Some(handle) = self.batch_handle.take() {
            scheduler.cancel(handle);
        }
        for handle in self.follow_ups.drain(..) {
            scheduler.cancel(handle);
        }
    }
}

/// Uniform sample from `[range.min, range.max)`, or `range.min` when the
/// range is empty.
fn sample(rng: &mut impl Rng, range: PercentRange) -> f64 {
    if range.max > range.min {
        rng.random_range(range.min..range.max)
    } else {
        range.min
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn notifier() -> AmbientNotifier {
        AmbientNotifier::new(AmbientConfig::default())
    }

    /// Fire every due task up to `until`, returning the spawned items.
    fn drive(
        ambient: &mut AmbientNotifier,
        sched: &mut Scheduler,
        rng: &mut SmallRng,
        until: Duration,
    ) -> Vec<NotificationItem> {
        let mut items = Vec::new();
        while let Some(task) = sched.pop_due(until) {
            match task.kind {
                TaskKind::AmbientBatch => items.extend(ambient.on_batch(task.handle, sched, rng)),
                TaskKind::AmbientFollowUp { batch } => {
                    items.extend(ambient.on_follow_up(task.handle, batch, sched, rng));
                }
                TaskKind::CountdownTick | TaskKind::NotificationExpiry(_) => {}
            }
        }
        items
    }

    #[test]
    fn activates_only_inside_threshold() {
        let mut sched = Scheduler::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut ambient = notifier();

        assert!(ambient.observe(46, &mut sched, &mut rng).is_none());
        assert!(ambient.observe(0, &mut sched, &mut rng).is_none());
        assert_eq!(ambient.phase(), AmbientPhase::Idle);

        let first = ambient.observe(45, &mut sched, &mut rng).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(ambient.phase(), AmbientPhase::Active);
        assert_eq!(ambient.batches(), 1);
    }

    #[test]
    fn latch_is_one_shot() {
        let mut sched = Scheduler::new();
        let mut rng = SmallRng::seed_from_u64(2);
        let mut ambient = notifier();

        assert!(ambient.observe(45, &mut sched, &mut rng).is_some());
        for left in (1..45).rev() {
            assert!(ambient.observe(left, &mut sched, &mut rng).is_none());
        }

        ambient.stop(&mut sched);
        assert!(ambient.observe(30, &mut sched, &mut rng).is_none());
        assert!(ambient.is_activated());

        ambient.reset(&mut sched);
        assert!(!ambient.is_activated());
        assert!(ambient.observe(30, &mut sched, &mut rng).is_some());
    }

    #[test]
    fn batches_hold_one_or_two_items() {
        let mut sched = Scheduler::new();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut ambient = notifier();

        let mut items = ambient.observe(45, &mut sched, &mut rng).unwrap();
        items.extend(drive(&mut ambient, &mut sched, &mut rng, Duration::from_secs(300)));

        let mut per_batch: BTreeMap<u64, usize> = BTreeMap::new();
        for item in &items {
            *per_batch.entry(item.batch).or_default() += 1;
        }
        // Batch 1 at t=0, then every 3 s through t=300 s.
        assert_eq!(per_batch.len(), 101);
        assert!(per_batch.values().all(|n| (1..=2).contains(n)));
        assert!(per_batch.values().any(|n| *n == 1));
        assert!(per_batch.values().any(|n| *n == 2));
    }

    #[test]
    fn items_respect_side_scoped_placement() {
        let mut sched = Scheduler::new();
        let mut rng = SmallRng::seed_from_u64(4);
        let mut ambient = notifier();
        let config = AmbientConfig::default();

        let mut items = ambient.observe(10, &mut sched, &mut rng).unwrap();
        items.extend(drive(&mut ambient, &mut sched, &mut rng, Duration::from_secs(120)));

        for item in &items {
            let horizontal = match item.placement.side {
                Side::Left => config.left_side_percent,
                Side::Right => config.right_side_percent,
            };
            assert!(horizontal.contains(item.placement.left_percent));
            assert!(config.top_percent.contains(item.placement.top_percent));
            assert!(item.rotation_deg.abs() <= config.max_rotation_deg);
            assert_eq!(item.lifetime_ms, config.lifetime_ms);
            assert!(config.messages.contains(&item.text));
        }
        assert!(items.iter().any(|i| i.placement.side == Side::Left));
        assert!(items.iter().any(|i| i.placement.side == Side::Right));
    }

    #[test]
    fn second_item_follows_within_delay_bound() {
        let mut sched = Scheduler::new();
        let mut rng = SmallRng::seed_from_u64(5);
        let config = AmbientConfig {
            single_probability: 0.0,
            ..AmbientConfig::default()
        };
        let mut ambient = AmbientNotifier::new(config);

        let first = ambient.observe(45, &mut sched, &mut rng).unwrap();
        assert_eq!(first.len(), 1);

        let follow = drive(&mut ambient, &mut sched, &mut rng, Duration::from_millis(250));
        assert_eq!(follow.len(), 1);
        assert_eq!(follow.first().map(|i| i.batch), Some(1));
        assert_ne!(follow.first().map(|i| i.id), first.first().map(|i| i.id));
    }

    #[test]
    fn stop_cancels_pending_follow_up_and_batches() {
        let mut sched = Scheduler::new();
        let mut rng = SmallRng::seed_from_u64(6);
        let config = AmbientConfig {
            single_probability: 0.0,
            ..AmbientConfig::default()
        };
        let mut ambient = AmbientNotifier::new(config);

        ambient.observe(45, &mut sched, &mut rng).unwrap();
        assert!(ambient.stop(&mut sched));
        assert!(!ambient.stop(&mut sched));

        let later = drive(&mut ambient, &mut sched, &mut rng, Duration::from_secs(60));
        assert!(later.is_empty());
        assert_eq!(ambient.batches(), 1);
    }

    #[test]
    fn expiry_outlives_stop() {
        let mut sched = Scheduler::new();
        let mut rng = SmallRng::seed_from_u64(7);
        let config = AmbientConfig {
            single_probability: 1.0,
            ..AmbientConfig::default()
        };
        let mut ambient = AmbientNotifier::new(config);

        let item = ambient.observe(45, &mut sched, &mut rng).unwrap().remove(0);
        ambient.stop(&mut sched);

        let task = sched.pop_due(Duration::from_secs(10)).unwrap();
        assert_eq!(task.kind, TaskKind::NotificationExpiry(item.id));
        assert_eq!(task.due, Duration::from_millis(3000));
    }
}

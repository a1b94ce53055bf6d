//! Virtual-time task scheduler with cancellable handles.
//!
//! Every timed callback in the game (countdown ticks, ambient batches,
//! delayed second spawns, notification expiry) is an entry in one
//! [`Scheduler`]. Time is a [`Duration`] since the controller was created
//! and only moves when the owner calls [`Scheduler::pop_due`] or
//! [`Scheduler::advance_clock`], so the whole game can be driven either by
//! a real-time loop or step by step in tests.
//!
//! # Cancellation
//!
//! [`Scheduler::cancel`] removes a handle from the live set. Entries are
//! left in the queue and discarded lazily when they reach the front, so a
//! cancelled callback can never fire, no matter how close to its due time
//! it was cancelled. Cancelling twice is a no-op.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use appraisal_types::NotificationId;
use tracing::trace;

/// Smallest repeat interval accepted by [`Scheduler::schedule_every`].
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Opaque handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(u64);

/// What a scheduled task does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskKind {
    /// One-second countdown decrement.
    CountdownTick,
    /// Recurring ambient batch.
    AmbientBatch,
    /// Delayed second spawn of an ambient batch.
    AmbientFollowUp {
        /// Batch the spawn belongs to.
        batch: u64,
    },
    /// End of a notification's on-screen lifetime.
    NotificationExpiry(NotificationId),
}

/// A task whose due time has been reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTask {
    /// Handle the task was scheduled under.
    pub handle: TaskHandle,
    /// What to do.
    pub kind: TaskKind,
    /// When the task was due.
    pub due: Duration,
}

/// Queue entry. Ordered by due time, then by insertion sequence so tasks
/// due at the same instant fire in the order they were scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    due: Duration,
    seq: u64,
    handle: TaskHandle,
    kind: TaskKind,
}

/// Due-time ordered task queue.
#[derive(Debug, Default)]
pub struct Scheduler {
    /// Current virtual time.
    now: Duration,
    /// Next insertion sequence number.
    next_seq: u64,
    /// Next handle number.
    next_handle: u64,
    /// Min-heap of pending entries (cancelled ones included until popped).
    queue: BinaryHeap<Reverse<Entry>>,
    /// Live handles and their repeat interval (`None` for one-shot tasks).
    live: HashMap<TaskHandle, Option<Duration>>,
}

impl Scheduler {
    /// Create an empty scheduler at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Number of live (not cancelled, not yet completed) tasks.
    pub fn pending(&self) -> usize {
        self.live.len()
    }

    /// Whether `handle` can still fire.
    pub fn is_live(&self, handle: TaskHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Schedule `kind` to fire once, `delay` from now.
    pub fn schedule_once(&mut self, delay: Duration, kind: TaskKind) -> TaskHandle {
        let handle = self.allocate_handle();
        self.live.insert(handle, None);
        self.push(self.now.saturating_add(delay), handle, kind);
        handle
    }

    /// Schedule `kind` to fire every `interval`, first at `now + interval`.
    pub fn schedule_every(&mut self, interval: Duration, kind: TaskKind) -> TaskHandle {
        let interval = interval.max(MIN_INTERVAL);
        let handle = self.allocate_handle();
        self.live.insert(handle, Some(interval));
        self.push(self.now.saturating_add(interval), handle, kind);
        handle
    }

    /// Invalidate `handle`. Returns `true` if it was live.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        self.live.remove(&handle).is_some()
    }

    /// Due time of the earliest live task, discarding cancelled entries
    /// at the front of the queue.
    pub fn next_due(&mut self) -> Option<Duration> {
        self.discard_cancelled();
        self.queue.peek().map(|Reverse(entry)| entry.due)
    }

    /// Pop the earliest live task due at or before `until`.
    ///
    /// The clock moves forward to the task's due time. Repeating tasks are
    /// re-armed one interval after their due time before being returned,
    /// so the callback may cancel them.
    pub fn pop_due(&mut self, until: Duration) -> Option<DueTask> {
        loop {
            let Reverse(entry) = *self.queue.peek()?;
            if entry.due > until {
                return None;
            }
            self.queue.pop();

            let Some(&repeat) = self.live.get(&entry.handle) else {
                trace!(handle = entry.handle.0, kind = ?entry.kind, "discarding cancelled task");
                continue;
            };

            self.now = self.now.max(entry.due);
            match repeat {
                Some(interval) => {
                    self.push(entry.due.saturating_add(interval), entry.handle, entry.kind);
                }
                None => {
                    self.live.remove(&entry.handle);
                }
            }

            return Some(DueTask {
                handle: entry.handle,
                kind: entry.kind,
                due: entry.due,
            });
        }
    }

    /// Move the clock forward to `to` without firing anything.
    ///
    /// The clock never moves backwards.
    pub fn advance_clock(&mut self, to: Duration) {
        self.now = self.now.max(to);
    }

    fn allocate_handle(&mut self) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        handle
    }

    fn push(&mut self, due: Duration, handle: TaskHandle, kind: TaskKind) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.queue.push(Reverse(Entry {
            due,
            seq,
            handle,
            kind,
        }));
    }

    fn discard_cancelled(&mut self) {
        while let Some(Reverse(entry)) = self.queue.peek() {
            if self.live.contains_key(&entry.handle) {
                break;
            }
            self.queue.pop();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn one_shot_fires_once() {
        let mut sched = Scheduler::new();
        let handle = sched.schedule_once(ms(100), TaskKind::AmbientBatch);

        assert!(sched.pop_due(ms(99)).is_none());
        let task = sched.pop_due(ms(100)).unwrap();
        assert_eq!(task.handle, handle);
        assert_eq!(task.due, ms(100));
        assert_eq!(sched.now(), ms(100));
        assert!(sched.pop_due(ms(10_000)).is_none());
        assert!(!sched.is_live(handle));
    }

    #[test]
    fn repeating_task_rearms() {
        let mut sched = Scheduler::new();
        let handle = sched.schedule_every(ms(1000), TaskKind::CountdownTick);

        let mut fired = Vec::new();
        while let Some(task) = sched.pop_due(ms(3500)) {
            fired.push(task.due);
        }
        assert_eq!(fired, vec![ms(1000), ms(2000), ms(3000)]);
        assert!(sched.is_live(handle));
        assert_eq!(sched.next_due(), Some(ms(4000)));
    }

    #[test]
    fn cancelled_task_never_fires() {
        let mut sched = Scheduler::new();
        let handle = sched.schedule_every(ms(1000), TaskKind::CountdownTick);
        assert!(sched.cancel(handle));
        assert!(!sched.cancel(handle));
        assert!(sched.pop_due(ms(60_000)).is_none());
        assert_eq!(sched.next_due(), None);
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn same_due_time_fires_in_schedule_order() {
        let mut sched = Scheduler::new();
        sched.schedule_once(ms(50), TaskKind::AmbientFollowUp { batch: 1 });
        sched.schedule_once(ms(50), TaskKind::AmbientFollowUp { batch: 2 });

        let first = sched.pop_due(ms(50)).unwrap();
        let second = sched.pop_due(ms(50)).unwrap();
        assert_eq!(first.kind, TaskKind::AmbientFollowUp { batch: 1 });
        assert_eq!(second.kind, TaskKind::AmbientFollowUp { batch: 2 });
    }

    #[test]
    fn zero_interval_is_clamped() {
        let mut sched = Scheduler::new();
        sched.schedule_every(Duration::ZERO, TaskKind::AmbientBatch);
        assert_eq!(sched.next_due(), Some(MIN_INTERVAL));
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut sched = Scheduler::new();
        sched.advance_clock(ms(500));
        sched.advance_clock(ms(200));
        assert_eq!(sched.now(), ms(500));

        // Delays are measured from the current time.
        sched.schedule_once(ms(10), TaskKind::AmbientBatch);
        assert_eq!(sched.next_due(), Some(ms(510)));
    }
}

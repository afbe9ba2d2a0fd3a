#![forbid(unsafe_code)]

//! Deterministic timers driven by the host clock.
//!
//! The engine never sleeps. Hold delays, leave grace periods and animation
//! stages are queued here as plain data and fire when the host advances the
//! monotonic clock past their due time. Timers due at the same instant fire in
//! scheduling order, and a timer that fires observes the clock at its own due
//! time, so anything it schedules is offset from that instant rather than from
//! wherever the host jumped to.

use std::time::Duration;

/// Handle for a scheduled timer, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Scheduled<T> {
    due: Duration,
    id: TimerId,
    task: T,
}

/// A queue of pending tasks keyed by due time.
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    now: Duration,
    next_id: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    /// Create an empty queue with the clock at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 1,
            pending: Vec::new(),
        }
    }

    /// Current clock value.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock forward. Going backwards is ignored.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Schedule `task` to fire `delay` after the current clock value.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.pending.push(Scheduled {
            due: self.now.saturating_add(delay),
            id,
            task,
        });
        id
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.pending.iter().position(|entry| entry.id == id) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove and return the earliest task due at or before `now`.
    ///
    /// The clock is moved to the task's due time.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerId, T)> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= now)
            .min_by_key(|(_, entry)| (entry.due, entry.id))
            .map(|(index, _)| index)?;
        let entry = self.pending.remove(index);
        self.set_now(entry.due);
        Some((entry.id, entry.task))
    }

    /// Due time of the earliest pending task.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.iter().map(|entry| entry.due).min()
    }

    /// Remove every pending task in firing order.
    pub fn drain(&mut self) -> Vec<T> {
        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_by_key(|entry| (entry.due, entry.id));
        pending.into_iter().map(|entry| entry.task).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_100: Duration = Duration::from_millis(100);

    #[test]
    fn nothing_fires_before_due() {
        let mut queue = TimerQueue::new();
        queue.schedule(MS_100, "hold");
        assert_eq!(queue.pop_due(Duration::from_millis(99)), None);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn fires_in_due_then_schedule_order() {
        let mut queue = TimerQueue::new();
        let late = queue.schedule(Duration::from_millis(200), "late");
        let first = queue.schedule(MS_100, "first");
        let second = queue.schedule(MS_100, "second");

        let now = Duration::from_secs(1);
        assert_eq!(queue.pop_due(now), Some((first, "first")));
        assert_eq!(queue.now(), MS_100);
        assert_eq!(queue.pop_due(now), Some((second, "second")));
        assert_eq!(queue.pop_due(now), Some((late, "late")));
        assert_eq!(queue.pop_due(now), None);
    }

    #[test]
    fn scheduling_from_a_fired_timer_uses_its_due_time() {
        let mut queue = TimerQueue::new();
        queue.schedule(MS_100, 1);
        let (_, task) = queue.pop_due(Duration::from_secs(5)).unwrap();
        assert_eq!(task, 1);
        queue.schedule(Duration::from_millis(1), 2);
        assert_eq!(queue.next_due(), Some(Duration::from_millis(101)));
    }

    #[test]
    fn cancel_removes_once() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule(MS_100, ());
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert!(queue.is_empty());
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut queue: TimerQueue<()> = TimerQueue::new();
        queue.set_now(MS_100);
        queue.set_now(Duration::from_millis(10));
        assert_eq!(queue.now(), MS_100);
    }

    #[test]
    fn drain_returns_firing_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(Duration::from_millis(300), 'c');
        queue.schedule(Duration::from_millis(100), 'a');
        queue.schedule(Duration::from_millis(200), 'b');
        assert_eq!(queue.drain(), vec!['a', 'b', 'c']);
        assert!(queue.is_empty());
    }
}

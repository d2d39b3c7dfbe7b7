//! Cooperative periodic timers over a virtual clock.
//!
//! Nothing here sleeps.  The owner calls [`Scheduler::advance`] with the
//! elapsed wall time (the TUI does so from a tokio interval) and gets back the
//! payloads of every task that came due.  Tests advance time by hand.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Task<T> {
    handle: TaskHandle,
    period: Duration,
    due: Duration,
    payload: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    tasks: Vec<Task<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            tasks: Vec::new(),
        }
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time since the scheduler was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Register `payload` to fire every `period`, first at `now + period`.
    pub fn every(&mut self, period: Duration, payload: T) -> TaskHandle {
        let period = period.max(Duration::from_millis(1));
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task {
            handle,
            period,
            due: self.now + period,
            payload,
        });
        handle
    }

    /// Returns false if the handle was unknown or already cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        self.tasks.len() != before
    }

    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|t| t.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Move the clock forward and return the payloads of due tasks, earliest
    /// deadline first (ties by registration order).
    ///
    /// A task fires at most once per call: deadlines missed during a long
    /// stall are skipped, not replayed.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<T> {
        self.now += elapsed;
        let now = self.now;

        let mut due: Vec<(Duration, TaskHandle, T)> = Vec::new();
        for task in self.tasks.iter_mut().filter(|t| t.due <= now) {
            due.push((task.due, task.handle, task.payload.clone()));
            while task.due <= now {
                task.due += task.period;
            }
        }

        due.sort_by_key(|(at, handle, _)| (*at, *handle));
        due.into_iter().map(|(_, _, payload)| payload).collect()
    }
}

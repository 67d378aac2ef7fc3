//! Virtual-clock task scheduler.
//!
//! Timers never run on their own: the host advances the clock with
//! [`Page::advance_time`](crate::Page::advance_time) and every task that came
//! due runs in `(due time, scheduling order)` order. Tasks are one-shot.
//! [`Debouncer`] layers "cancel the previous pending task" on top for
//! operations that must only ever have one evaluation in flight.

use std::collections::BTreeMap;
use std::fmt;

use crate::page::Page;

/// A one-shot callback run when its task comes due
pub type TaskFn = Box<dyn FnOnce(&mut Page)>;

/// Handle to a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// A task that is due, removed from the queue and ready to run
pub struct DueTask {
    pub handle: TaskHandle,
    pub due_ms: u64,
    pub callback: TaskFn,
}

/// Queue of pending one-shot tasks keyed by due time
#[derive(Default)]
pub struct Scheduler {
    now_ms: u64,
    next_id: u64,
    // (due, handle) orders by time, then by scheduling order
    queue: BTreeMap<(u64, TaskHandle), TaskFn>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now_ms", &self.now_ms)
            .field("pending", &self.queue.len())
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `callback` to run `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: u64, callback: impl FnOnce(&mut Page) + 'static) -> TaskHandle {
        self.next_id += 1;
        let handle = TaskHandle(self.next_id);
        let due = self.now_ms.saturating_add(delay_ms);
        self.queue.insert((due, handle), Box::new(callback));
        handle
    }

    /// Drop a pending task; `false` if it already ran or was canceled
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let key = self.queue.keys().find(|(_, h)| *h == handle).copied();
        match key {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.queue.keys().any(|(_, h)| *h == handle)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Pop the earliest task due at or before `until_ms`, moving the clock to it
    pub fn pop_due(&mut self, until_ms: u64) -> Option<DueTask> {
        let (&(due, handle), _) = self.queue.iter().next()?;
        if due > until_ms {
            return None;
        }
        let callback = self.queue.remove(&(due, handle))?;
        self.now_ms = self.now_ms.max(due);
        Some(DueTask {
            handle,
            due_ms: due,
            callback,
        })
    }

    /// Move the clock forward without running anything
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

/// A cancelable scheduled evaluation: scheduling again cancels the
/// previous pending one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Debouncer {
    pending: Option<TaskHandle>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(
        &mut self,
        scheduler: &mut Scheduler,
        delay_ms: u64,
        callback: impl FnOnce(&mut Page) + 'static,
    ) -> TaskHandle {
        self.cancel(scheduler);
        let handle = scheduler.schedule(delay_ms, callback);
        self.pending = Some(handle);
        handle
    }

    /// Cancel the pending evaluation, if it has not run yet
    pub fn cancel(&mut self, scheduler: &mut Scheduler) -> bool {
        self.pending
            .take()
            .map(|handle| scheduler.cancel(handle))
            .unwrap_or(false)
    }

    pub fn is_pending(&self, scheduler: &Scheduler) -> bool {
        self.pending.is_some_and(|h| scheduler.is_pending(h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_due_orders_by_time_then_sequence() {
        let mut scheduler = Scheduler::new();
        let late = scheduler.schedule(500, |_| {});
        let first = scheduler.schedule(100, |_| {});
        let second = scheduler.schedule(100, |_| {});

        assert!(scheduler.pop_due(99).is_none());
        assert_eq!(scheduler.pop_due(1000).unwrap().handle, first);
        assert_eq!(scheduler.pop_due(1000).unwrap().handle, second);
        assert_eq!(scheduler.now_ms(), 100);
        assert_eq!(scheduler.pop_due(1000).unwrap().handle, late);
        assert_eq!(scheduler.now_ms(), 500);
    }

    #[test]
    fn test_cancel_only_once() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule(10, |_| {});
        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_debouncer_keeps_one_pending() {
        let mut scheduler = Scheduler::new();
        let mut debouncer = Debouncer::new();

        let first = debouncer.schedule(&mut scheduler, 300, |_| {});
        let second = debouncer.schedule(&mut scheduler, 300, |_| {});

        assert!(!scheduler.is_pending(first));
        assert!(scheduler.is_pending(second));
        assert_eq!(scheduler.pending(), 1);
        assert!(debouncer.is_pending(&scheduler));

        assert!(debouncer.cancel(&mut scheduler));
        assert!(!debouncer.is_pending(&scheduler));
    }
}

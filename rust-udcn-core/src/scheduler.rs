//! Timer wheel for PIT timers, route expiry, and idle-face cleanup
//! (spec.md §4.9, §9 "Scheduler" design note).
//!
//! A monotonic clock is used for every timer; only status datasets report
//! wall-clock time, and that conversion happens outside this module.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(u64);

struct Event {
    due: Instant,
    id: EventId,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due
    }
}
impl Eq for Event {}
impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Event {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.due.cmp(&other.due)
    }
}

/// A cooperative scheduler: the event loop calls [`Scheduler::pop_due`]
/// each turn and runs whatever callbacks come back. There's no background
/// thread — this matches the single-threaded event-loop model of spec.md
/// §5, where "timers are delivered as callbacks posted to the same loop."
pub struct Scheduler {
    next_id: u64,
    // Reverse so the BinaryHeap (a max-heap) pops the earliest-due event.
    heap: BinaryHeap<Reverse<Event>>,
    callbacks: std::collections::HashMap<EventId, Box<dyn FnOnce()>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            heap: BinaryHeap::new(),
            callbacks: std::collections::HashMap::new(),
        }
    }

    /// `schedule(delay, fn) -> EventId`.
    pub fn schedule(&mut self, delay: Duration, callback: impl FnOnce() + 'static) -> EventId {
        self.schedule_at(Instant::now() + delay, callback)
    }

    pub fn schedule_at(&mut self, due: Instant, callback: impl FnOnce() + 'static) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse(Event { due, id }));
        self.callbacks.insert(id, Box::new(callback));
        id
    }

    /// `cancel(id)`: idempotent — cancelling an already-fired or
    /// already-cancelled id is a no-op (spec.md §5 "cancellation is
    /// idempotent and synchronous").
    pub fn cancel(&mut self, id: EventId) {
        self.callbacks.remove(&id);
    }

    pub fn is_pending(&self, id: EventId) -> bool {
        self.callbacks.contains_key(&id)
    }

    /// Drain and run every callback whose deadline has passed.
    pub fn run_due(&mut self, now: Instant) {
        while let Some(Reverse(event)) = self.heap.peek() {
            if event.due > now {
                break;
            }
            let Reverse(event) = self.heap.pop().unwrap();
            if let Some(callback) = self.callbacks.remove(&event.id) {
                callback();
            }
        }
    }

    /// Duration until the next pending event, for an event-loop `select!`
    /// to sleep on.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse(e)| e.due)
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn schedule_runs_due_callbacks() {
        let mut sched = Scheduler::new();
        let fired = Rc::new(RefCell::new(false));
        let fired2 = fired.clone();
        sched.schedule(Duration::from_millis(0), move || {
            *fired2.borrow_mut() = true;
        });
        sched.run_due(Instant::now() + Duration::from_millis(1));
        assert!(*fired.borrow());
    }

    #[test]
    fn cancel_prevents_firing() {
        let mut sched = Scheduler::new();
        let fired = Rc::new(RefCell::new(false));
        let fired2 = fired.clone();
        let id = sched.schedule(Duration::from_millis(0), move || {
            *fired2.borrow_mut() = true;
        });
        sched.cancel(id);
        sched.run_due(Instant::now() + Duration::from_millis(1));
        assert!(!*fired.borrow());
    }

    #[test]
    fn run_due_respects_deadline_order() {
        let mut sched = Scheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let now = Instant::now();
        let o1 = order.clone();
        sched.schedule_at(now + Duration::from_millis(20), move || o1.borrow_mut().push(2));
        let o2 = order.clone();
        sched.schedule_at(now + Duration::from_millis(10), move || o2.borrow_mut().push(1));

        sched.run_due(now + Duration::from_millis(30));
        assert_eq!(*order.borrow(), vec![1, 2]);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut sched = Scheduler::new();
        let id = sched.schedule(Duration::from_millis(0), || {});
        sched.cancel(id);
        sched.cancel(id); // no panic
        assert!(!sched.is_pending(id));
    }
}

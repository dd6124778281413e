use crate::clock::Clock;
use std::cell::RefCell;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

pub type Task<T> = Box<dyn FnOnce(&mut T)>;

struct Pending<T> {
    due: Duration,
    seq: u64,
    task: Task<T>,
}

impl<T> PartialEq for Pending<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Pending<T> {}

impl<T> PartialOrd for Pending<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Pending<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

struct Queue<T> {
    next_seq: u64,
    heap: BinaryHeap<Reverse<Pending<T>>>,
}

/// Single-threaded queue of delayed tasks run against a `T`
///
/// Clones share one queue. Nothing runs on its own: the owner of the `T`
/// calls [`Scheduler::run_due`] from its event loop. Tasks due at the same
/// instant run in the order they were deferred.
pub struct Scheduler<T> {
    clock: Rc<dyn Clock>,
    queue: Rc<RefCell<Queue<T>>>,
}

impl<T> Clone for Scheduler<T> {
    fn clone(&self) -> Self {
        Self {
            clock: self.clock.clone(),
            queue: self.queue.clone(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            queue: Rc::new(RefCell::new(Queue {
                next_seq: 0,
                heap: BinaryHeap::new(),
            })),
        }
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Handle that does not keep the queue alive
    ///
    /// Tasks and callbacks that defer more work should capture this rather
    /// than a clone: a pending task holding a strong handle keeps its own
    /// queue alive and is never freed.
    pub fn downgrade(&self) -> WeakScheduler<T> {
        WeakScheduler {
            clock: self.clock.clone(),
            queue: Rc::downgrade(&self.queue),
        }
    }

    /// Queue `task` to run once `delay` has elapsed
    pub fn defer(&self, delay: Duration, task: impl FnOnce(&mut T) + 'static) {
        let due = self.clock.now() + delay;
        let mut queue = self.queue.borrow_mut();
        let seq = queue.next_seq;
        queue.next_seq += 1;
        queue.heap.push(Reverse(Pending {
            due,
            seq,
            task: Box::new(task),
        }));
    }

    /// When the earliest pending task becomes due
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.borrow().heap.peek().map(|Reverse(p)| p.due)
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().heap.len()
    }

    /// Run every task whose due time has been reached
    ///
    /// Tasks deferred while running with no delay are picked up in the
    /// same call. Returns the number of tasks run.
    pub fn run_due(&self, target: &mut T) -> usize {
        let mut ran = 0;
        while let Some(task) = self.pop_due() {
            task(target);
            ran += 1;
        }
        ran
    }

    fn pop_due(&self) -> Option<Task<T>> {
        let now = self.clock.now();
        let mut queue = self.queue.borrow_mut();
        let due = queue.heap.peek().map(|Reverse(p)| p.due)?;
        if due > now {
            return None;
        }
        queue.heap.pop().map(|Reverse(p)| p.task)
    }
}

/// Non-owning [`Scheduler`] handle
pub struct WeakScheduler<T> {
    clock: Rc<dyn Clock>,
    queue: Weak<RefCell<Queue<T>>>,
}

impl<T> Clone for WeakScheduler<T> {
    fn clone(&self) -> Self {
        Self {
            clock: self.clock.clone(),
            queue: self.queue.clone(),
        }
    }
}

impl<T> WeakScheduler<T> {
    pub fn upgrade(&self) -> Option<Scheduler<T>> {
        Some(Scheduler {
            clock: self.clock.clone(),
            queue: self.queue.upgrade()?,
        })
    }

    /// Queue `task` if the scheduler still exists; returns whether it did
    pub fn defer(&self, delay: Duration, task: impl FnOnce(&mut T) + 'static) -> bool {
        match self.upgrade() {
            Some(scheduler) => {
                scheduler.defer(delay, task);
                true
            }
            None => {
                log::debug!("Dropping deferred task: scheduler is gone");
                false
            }
        }
    }
}

impl<T> fmt::Debug for Scheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("next_due", &self.next_due())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn scheduler() -> (ManualClock, Scheduler<Vec<&'static str>>) {
        let clock = ManualClock::new();
        let scheduler = Scheduler::new(Rc::new(clock.clone()));
        (clock, scheduler)
    }

    #[test]
    fn test_tasks_wait_for_their_delay() {
        let (clock, scheduler) = scheduler();
        let mut log = Vec::new();

        scheduler.defer(Duration::from_millis(75), |log| log.push("stop"));
        assert_eq!(scheduler.run_due(&mut log), 0);

        clock.advance(Duration::from_millis(74));
        assert_eq!(scheduler.run_due(&mut log), 0);

        clock.advance(Duration::from_millis(1));
        assert_eq!(scheduler.run_due(&mut log), 1);
        assert_eq!(log, vec!["stop"]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_order_is_by_due_time_then_insertion() {
        let (clock, scheduler) = scheduler();
        let mut log = Vec::new();

        scheduler.defer(Duration::from_millis(75), |log| log.push("late"));
        scheduler.defer(Duration::from_millis(1), |log| log.push("first"));
        scheduler.defer(Duration::from_millis(1), |log| log.push("second"));
        assert_eq!(scheduler.next_due(), Some(Duration::from_millis(1)));

        clock.advance(Duration::from_millis(100));
        scheduler.run_due(&mut log);
        assert_eq!(log, vec!["first", "second", "late"]);
    }

    #[test]
    fn test_pending_task_with_weak_handle_does_not_leak_queue() {
        let (_clock, scheduler) = scheduler();
        let weak = scheduler.downgrade();

        let handle = scheduler.downgrade();
        scheduler.defer(Duration::from_secs(60), move |log| {
            handle.defer(Duration::ZERO, |log| log.push("never"));
            log.push("never");
        });
        assert_eq!(scheduler.pending(), 1);

        drop(scheduler);
        assert!(weak.upgrade().is_none());
        assert!(!weak.defer(Duration::ZERO, |log| log.push("late")));
    }

    #[test]
    fn test_task_may_defer_another() {
        let (_clock, scheduler) = scheduler();
        let mut log = Vec::new();

        let handle = scheduler.downgrade();
        scheduler.defer(Duration::ZERO, move |log| {
            log.push("outer");
            handle.defer(Duration::ZERO, |log| log.push("inner"));
        });

        assert_eq!(scheduler.run_due(&mut log), 2);
        assert_eq!(log, vec!["outer", "inner"]);
    }
}

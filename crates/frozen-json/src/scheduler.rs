//! Cooperative, single-threaded tick scheduler.
//!
//! Deferred notification delivery is the only suspension point in the crate.
//! Callers own the event loop: they decide when a tick happens by calling
//! [`Scheduler::tick`] (or [`Scheduler::run_until_idle`]). Everything queued
//! with [`Scheduler::schedule_once`] during one synchronous burst runs on the
//! next tick, exactly once.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// Shared handle to a queue of one-shot tasks.
#[derive(Clone, Default)]
pub struct Scheduler {
    queue: Rc<RefCell<VecDeque<Task>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run on the next tick.
    pub fn schedule_once<F>(&self, task: F)
    where
        F: FnOnce() + 'static,
    {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Number of tasks waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run every task queued before this call and return how many ran.
    ///
    /// Tasks queued while the tick executes wait for the following tick.
    pub fn tick(&self) -> usize {
        let batch = std::mem::take(&mut *self.queue.borrow_mut());
        let ran = batch.len();
        for task in batch {
            task();
        }
        ran
    }

    /// Tick until the queue stays empty. Returns the total number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let ran = self.tick();
            if ran == 0 {
                return total;
            }
            total += ran;
        }
    }

    pub fn ptr_eq(&self, other: &Scheduler) -> bool {
        Rc::ptr_eq(&self.queue, &other.queue)
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

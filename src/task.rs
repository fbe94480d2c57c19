//! Microtask queue - deferred callbacks for the single event-loop thread.
//!
//! Mutation batches are delivered here instead of synchronously. Nothing runs
//! until [`flush_microtasks`] is called, which models the end of the current
//! task in a browser.

use std::cell::RefCell;
use std::collections::VecDeque;

type Microtask = Box<dyn FnOnce()>;

thread_local! {
    static MICROTASKS: RefCell<VecDeque<Microtask>> = RefCell::new(VecDeque::new());
}

/// Queue a callback to run on the next microtask flush.
pub fn queue_microtask(task: impl FnOnce() + 'static) {
    MICROTASKS.with(|queue| queue.borrow_mut().push_back(Box::new(task)));
}

/// Run queued microtasks until the queue is empty.
///
/// Tasks queued while flushing run in the same flush. Returns how many ran.
pub fn flush_microtasks() -> usize {
    let mut ran = 0;
    loop {
        // Pop before running so a task may queue more work
        let next = MICROTASKS.with(|queue| queue.borrow_mut().pop_front());
        let Some(task) = next else { break };
        task();
        ran += 1;
    }
    ran
}

/// Number of microtasks waiting for the next flush.
pub fn pending_microtasks() -> usize {
    MICROTASKS.with(|queue| queue.borrow().len())
}

/// Drop all queued microtasks without running them (for testing)
pub fn reset_microtasks() {
    // Drop outside the borrow; a discarded task may release state on drop
    let discarded = MICROTASKS.with(|queue| std::mem::take(&mut *queue.borrow_mut()));
    drop(discarded);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn setup() {
        reset_microtasks();
    }

    #[test]
    fn test_tasks_wait_for_flush() {
        setup();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        queue_microtask(move || flag.set(true));

        assert!(!ran.get());
        assert_eq!(pending_microtasks(), 1);

        assert_eq!(flush_microtasks(), 1);
        assert!(ran.get());
        assert_eq!(pending_microtasks(), 0);
    }

    #[test]
    fn test_nested_tasks_run_in_same_flush() {
        setup();
        let order = Rc::new(RefCell::new(Vec::new()));
        let outer = order.clone();
        queue_microtask(move || {
            outer.borrow_mut().push(1);
            let inner = outer.clone();
            queue_microtask(move || inner.borrow_mut().push(3));
        });
        let second = order.clone();
        queue_microtask(move || second.borrow_mut().push(2));

        assert_eq!(flush_microtasks(), 3);
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_reset_discards_pending() {
        setup();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        queue_microtask(move || flag.set(true));
        reset_microtasks();

        assert_eq!(flush_microtasks(), 0);
        assert!(!ran.get());
    }
}

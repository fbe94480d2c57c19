//! ReactiveCell - settable observable with change notification.
//!
//! Two ways to depend on the value:
//! - read it through [`ReactiveCell::get`] inside a spark-signals `effect`
//!   or `derived` (automatic dependency tracking)
//! - register a callback with [`ReactiveCell::subscribe`] (explicit observer
//!   list, invoked synchronously on change)
//!
//! Writes compare with `PartialEq` before notifying. For element handles
//! that is identity, so re-resolving to the same element is silent.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

type Subscriber<T> = Rc<dyn Fn(&T)>;

/// Cleanup returned by `subscribe`.
pub type Unsubscribe = Box<dyn FnOnce()>;

struct Inner<T> {
    signal: Signal<T>,
    // Untracked mirror so `set` can compare without registering a dependency
    current: RefCell<T>,
    subscribers: RefCell<Vec<(usize, Subscriber<T>)>>,
    next_id: Cell<usize>,
}

/// Shared reactive value. Clones observe and write the same cell.
pub struct ReactiveCell<T: Clone + PartialEq + 'static> {
    inner: Rc<Inner<T>>,
}

impl<T: Clone + PartialEq + 'static> Clone for ReactiveCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> ReactiveCell<T> {
    /// Cell holding `value`, with no subscribers.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                signal: signal(value.clone()),
                current: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Tracked read.
    pub fn get(&self) -> T {
        self.inner.signal.get()
    }

    /// Untracked read.
    pub fn peek(&self) -> T {
        self.inner.current.borrow().clone()
    }

    /// Underlying signal, for composing with `derived`/`effect`.
    pub fn signal(&self) -> Signal<T> {
        self.inner.signal.clone()
    }

    /// Store `value`, notifying dependents if it differs. Returns whether it changed.
    pub fn set(&self, value: T) -> bool {
        if *self.inner.current.borrow() == value {
            return false;
        }
        *self.inner.current.borrow_mut() = value.clone();
        self.inner.signal.set(value.clone());

        // Snapshot so callbacks may subscribe/unsubscribe
        let subscribers: Vec<Subscriber<T>> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in subscribers {
            callback(&value);
        }
        true
    }

    /// Register `callback` for changes. Returns cleanup function to unregister.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Unsubscribe {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Rc::new(callback)));

        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.borrow_mut().retain(|(sub_id, _)| *sub_id != id);
            }
        })
    }

    /// Number of registered `subscribe` callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_signals::effect;

    #[test]
    fn test_set_notifies_only_on_change() {
        let cell = ReactiveCell::new(1);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let _unsubscribe = cell.subscribe(move |_| counter.set(counter.get() + 1));

        assert!(!cell.set(1));
        assert_eq!(calls.get(), 0);

        assert!(cell.set(2));
        assert_eq!(calls.get(), 1);
        assert_eq!(cell.peek(), 2);
        assert_eq!(cell.get(), 2);
    }

    #[test]
    fn test_unsubscribe_stops_callbacks() {
        let cell = ReactiveCell::new("a".to_string());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let unsubscribe = cell.subscribe(move |value: &String| sink.borrow_mut().push(value.clone()));

        cell.set("b".to_string());
        unsubscribe();
        cell.set("c".to_string());

        assert_eq!(*seen.borrow(), vec!["b".to_string()]);
        assert_eq!(cell.subscriber_count(), 0);
    }

    #[test]
    fn test_effect_tracks_get() {
        let cell = ReactiveCell::new(0);
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let reader = cell.clone();
        let _stop = effect(move || {
            let _ = reader.get();
            counter.set(counter.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        cell.set(5);
        assert_eq!(runs.get(), 2);

        // Same value: no re-run
        cell.set(5);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_subscriber_may_unsubscribe_during_notify() {
        let cell = ReactiveCell::new(0);
        let slot: Rc<RefCell<Option<Unsubscribe>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let inner_slot = slot.clone();
        let counter = calls.clone();
        let unsubscribe = cell.subscribe(move |_| {
            counter.set(counter.get() + 1);
            if let Some(cleanup) = inner_slot.borrow_mut().take() {
                cleanup();
            }
        });
        *slot.borrow_mut() = Some(unsubscribe);

        cell.set(1);
        cell.set(2);
        assert_eq!(calls.get(), 1);
    }
}

//! Active element tracker - a reactive view of the focused element.
//!
//! Wires the resolver, the focus binder and (optionally) the removal watcher
//! to one [`ReactiveCell`]:
//!
//! ```text
//! focus/blur events ──┐
//!                     ├─> resolve(root) ─> ReactiveCell ─> effects / subscribers
//! mutation batches ───┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use spark_active_element::{create_active_element_tracker, ActiveElementOptions, Document};
//!
//! let doc = Document::new();
//! let input = doc.create_element("input");
//! doc.body().append_child(&input)?;
//!
//! let active = create_active_element_tracker(ActiveElementOptions {
//!     document: Some(doc.as_root()),
//!     trigger_on_removal: true,
//!     ..Default::default()
//! })?;
//!
//! input.focus();
//! assert_eq!(active.get(), Some(input));
//! ```

use std::cell::Cell;
use std::fmt;

use spark_signals::{derived, Derived, Signal};
use tracing::debug;

use crate::dom::Root;
use crate::error::TrackerError;
use crate::platform::FocusRoot;

use super::binder::FocusEventBinder;
use super::cell::{ReactiveCell, Unsubscribe};
use super::resolver::resolve;
use super::watcher::RemovalWatcher;

/// Tracker configuration, fixed at construction.
#[derive(Clone, Debug)]
pub struct ActiveElementOptions<R: FocusRoot = Root> {
    /// Root to resolve against. `None` means the global document.
    pub document: Option<R>,
    /// Re-resolve after child-list mutations so removing the focused element
    /// is noticed.
    pub trigger_on_removal: bool,
    /// Descend through shadow roots to the focused leaf.
    pub deep: bool,
}

impl<R: FocusRoot> Default for ActiveElementOptions<R> {
    fn default() -> Self {
        Self {
            document: None,
            trigger_on_removal: false,
            deep: true,
        }
    }
}

/// Live handle on the active element of one root.
///
/// Listeners and the observer are released on [`dispose`](Self::dispose)
/// or drop. The last resolved value stays readable afterwards.
pub struct ActiveElement<R: FocusRoot = Root> {
    root: R,
    deep: bool,
    cell: ReactiveCell<Option<R::Element>>,
    binder: FocusEventBinder,
    watcher: Option<RemovalWatcher>,
    disposed: Cell<bool>,
}

/// Start tracking the active element described by `options` in the
/// in-memory document model.
///
/// The initial value is resolved immediately, so focus that predates the
/// tracker is reported.
pub fn create_active_element_tracker(options: ActiveElementOptions) -> Result<ActiveElement, TrackerError> {
    track_active_element(options)
}

/// [`create_active_element_tracker`] for any [`FocusRoot`].
pub fn track_active_element<R: FocusRoot>(
    options: ActiveElementOptions<R>,
) -> Result<ActiveElement<R>, TrackerError> {
    let root = match options.document {
        Some(root) => root,
        None => R::global().ok_or(TrackerError::NoDocument)?,
    };
    let deep = options.deep;

    let cell = ReactiveCell::new(resolve(&root, deep));
    let binder = FocusEventBinder::bind(&root, cell.clone(), deep).map_err(TrackerError::Listener)?;
    let watcher = if options.trigger_on_removal {
        match RemovalWatcher::watch(&root, cell.clone(), deep) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                binder.dispose();
                return Err(TrackerError::Observer(err));
            }
        }
    } else {
        None
    };

    debug!(
        ?root,
        deep,
        trigger_on_removal = watcher.is_some(),
        initial = ?cell.peek(),
        "active element tracker created"
    );

    Ok(ActiveElement {
        root,
        deep,
        cell,
        binder,
        watcher,
        disposed: Cell::new(false),
    })
}

impl<R: FocusRoot> ActiveElement<R> {
    /// Current value (tracked inside effects and deriveds).
    pub fn get(&self) -> Option<R::Element> {
        self.cell.get()
    }

    /// Current value without registering a dependency.
    pub fn peek(&self) -> Option<R::Element> {
        self.cell.peek()
    }

    /// Backing signal. Writing to it bypasses the tracker; treat it as
    /// read-only.
    pub fn signal(&self) -> Signal<Option<R::Element>> {
        self.cell.signal()
    }

    /// Read-only reactive view for composing with other deriveds.
    pub fn derived(&self) -> Derived<Option<R::Element>> {
        let cell = self.cell.clone();
        derived(move || cell.get())
    }

    /// Register a change callback. Returns cleanup function to unregister.
    pub fn subscribe(&self, callback: impl Fn(&Option<R::Element>) + 'static) -> Unsubscribe {
        self.cell.subscribe(callback)
    }

    /// Re-resolve now, outside of any event. No-op once disposed.
    pub fn refresh(&self) {
        if self.disposed.get() {
            return;
        }
        self.cell.set(resolve(&self.root, self.deep));
    }

    pub fn root(&self) -> &R {
        &self.root
    }

    pub fn triggers_on_removal(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Release listeners and the observer. Safe to call repeatedly.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.binder.dispose();
        if let Some(watcher) = &self.watcher {
            watcher.dispose();
        }
        debug!(root = ?self.root, "active element tracker disposed");
    }
}

impl<R: FocusRoot> Drop for ActiveElement<R> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<R: FocusRoot> fmt::Debug for ActiveElement<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveElement")
            .field("root", &self.root)
            .field("value", &self.cell.peek())
            .field("deep", &self.deep)
            .field("trigger_on_removal", &self.watcher.is_some())
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use spark_signals::effect;

    use super::*;
    use crate::dom::{clear_global_document, set_global_document, Document, Element, ShadowRoot};
    use crate::task::{flush_microtasks, reset_microtasks};

    struct Fixture {
        doc: Document,
        input: Element,
        shadow_root: ShadowRoot,
        shadow_input: Element,
    }

    fn setup() -> Fixture {
        reset_microtasks();
        clear_global_document();

        let doc = Document::new();
        set_global_document(doc.clone());

        let shadow_host = doc.create_element("div");
        let shadow_root = shadow_host.attach_shadow().unwrap();
        let input = doc.create_element("input");
        let shadow_input = doc.create_element("input");
        shadow_root.append_child(&shadow_input).unwrap();
        doc.body().append_child(&input).unwrap();
        doc.body().append_child(&shadow_host).unwrap();
        flush_microtasks();

        Fixture {
            doc,
            input,
            shadow_root,
            shadow_input,
        }
    }

    #[test]
    fn test_initialises_to_body() {
        let fx = setup();
        let active = create_active_element_tracker(ActiveElementOptions::default()).unwrap();
        assert_eq!(active.get(), Some(fx.doc.body()));
        assert!(!active.triggers_on_removal());
    }

    #[test]
    fn test_initialises_with_already_active_element() {
        let fx = setup();
        fx.input.focus();
        let active = create_active_element_tracker(ActiveElementOptions::default()).unwrap();
        assert_eq!(active.get(), Some(fx.input.clone()));
    }

    #[test]
    fn test_accepts_custom_root() {
        let fx = setup();
        let active = create_active_element_tracker(ActiveElementOptions {
            document: Some(fx.shadow_root.as_root()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(active.get(), None);

        fx.shadow_input.focus();
        assert_eq!(active.get(), Some(fx.shadow_input.clone()));
    }

    #[test]
    fn test_observes_focus_and_blur() {
        let fx = setup();
        let active = create_active_element_tracker(ActiveElementOptions::default()).unwrap();

        fx.input.focus();
        assert_eq!(active.get(), Some(fx.input.clone()));

        fx.input.blur();
        assert_eq!(active.get(), Some(fx.doc.body()));
    }

    #[test]
    fn test_document_root_sees_shadow_leaf() {
        let fx = setup();
        let active = create_active_element_tracker(ActiveElementOptions::default()).unwrap();
        fx.shadow_input.focus();
        assert_eq!(active.get(), Some(fx.shadow_input.clone()));

        let shallow = create_active_element_tracker(ActiveElementOptions {
            deep: false,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(shallow.get(), fx.shadow_root.host());
    }

    #[test]
    fn test_removal_with_document_root() {
        let fx = setup();
        let active = create_active_element_tracker(ActiveElementOptions {
            trigger_on_removal: true,
            ..Default::default()
        })
        .unwrap();

        fx.input.focus();
        assert_eq!(active.get(), Some(fx.input.clone()));

        fx.input.remove();
        assert_eq!(active.get(), Some(fx.input.clone()));

        flush_microtasks();
        assert_eq!(active.get(), Some(fx.doc.body()));
    }

    #[test]
    fn test_removal_with_shadow_root() {
        let fx = setup();
        let active = create_active_element_tracker(ActiveElementOptions {
            document: Some(fx.shadow_root.as_root()),
            trigger_on_removal: true,
            ..Default::default()
        })
        .unwrap();

        fx.shadow_input.focus();
        assert_eq!(active.get(), Some(fx.shadow_input.clone()));

        fx.shadow_input.remove();
        flush_microtasks();
        assert_eq!(active.get(), None);
    }

    #[test]
    fn test_removal_ignored_without_trigger() {
        let fx = setup();
        let active = create_active_element_tracker(ActiveElementOptions::default()).unwrap();
        fx.input.focus();
        fx.input.remove();
        flush_microtasks();

        // No blur fires on removal, so the stale value remains
        assert_eq!(active.get(), Some(fx.input.clone()));

        active.refresh();
        assert_eq!(active.get(), Some(fx.doc.body()));
    }

    #[test]
    fn test_focus_then_removal_same_tick_converges() {
        let fx = setup();
        let active = create_active_element_tracker(ActiveElementOptions {
            trigger_on_removal: true,
            ..Default::default()
        })
        .unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _unsubscribe = active.subscribe(move |value| sink.borrow_mut().push(value.clone()));

        fx.input.focus();
        fx.input.remove();
        assert_eq!(*seen.borrow(), vec![Some(fx.input.clone())]);

        flush_microtasks();
        assert_eq!(
            *seen.borrow(),
            vec![Some(fx.input.clone()), Some(fx.doc.body())]
        );
        assert_eq!(active.get(), fx.doc.active_element());
    }

    #[test]
    fn test_effect_reruns_on_change() {
        let fx = setup();
        let active = create_active_element_tracker(ActiveElementOptions::default()).unwrap();
        let view = active.derived();
        let runs = Rc::new(RefCell::new(Vec::new()));
        let sink = runs.clone();
        let _stop = effect(move || {
            sink.borrow_mut().push(view.get());
        });

        fx.input.focus();
        // Re-focusing the same element does not notify
        fx.input.focus();
        fx.input.blur();

        assert_eq!(
            *runs.borrow(),
            vec![Some(fx.doc.body()), Some(fx.input.clone()), Some(fx.doc.body())]
        );
    }

    #[test]
    fn test_signal_drives_effects() {
        let fx = setup();
        let active = create_active_element_tracker(ActiveElementOptions::default()).unwrap();
        let signal = active.signal();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _stop = effect(move || {
            sink.borrow_mut().push(signal.get());
        });

        fx.shadow_input.focus();
        assert_eq!(
            *seen.borrow(),
            vec![Some(fx.doc.body()), Some(fx.shadow_input.clone())]
        );
        assert_eq!(active.signal().get(), active.peek());
    }

    #[test]
    fn test_removal_noticed_after_discarded_microtasks() {
        let fx = setup();
        let active = create_active_element_tracker(ActiveElementOptions {
            trigger_on_removal: true,
            ..Default::default()
        })
        .unwrap();

        // Queues a delivery that never runs
        fx.doc.body().append_child(&fx.doc.create_element("div")).unwrap();
        reset_microtasks();

        fx.input.focus();
        fx.input.remove();
        assert_eq!(flush_microtasks(), 1);
        assert_eq!(active.get(), Some(fx.doc.body()));
    }

    #[test]
    fn test_dispose_stops_updates_and_is_idempotent() {
        let fx = setup();
        let active = create_active_element_tracker(ActiveElementOptions {
            trigger_on_removal: true,
            ..Default::default()
        })
        .unwrap();

        fx.input.focus();
        fx.input.remove();
        active.dispose();
        active.dispose();
        flush_microtasks();

        assert!(active.is_disposed());
        assert_eq!(active.get(), Some(fx.input.clone()));

        fx.doc.body().append_child(&fx.input).unwrap();
        fx.input.focus();
        assert_eq!(active.get(), Some(fx.input.clone()));
        fx.input.blur();
        assert_eq!(active.get(), Some(fx.input.clone()));

        active.refresh();
        assert_eq!(active.get(), Some(fx.input.clone()));
    }

    #[test]
    fn test_drop_releases_listeners() {
        let fx = setup();
        let updates = Rc::new(RefCell::new(0));
        {
            let active = create_active_element_tracker(ActiveElementOptions::default()).unwrap();
            let counter = updates.clone();
            let _unsubscribe = active.subscribe(move |_| *counter.borrow_mut() += 1);
        }
        fx.input.focus();
        assert_eq!(*updates.borrow(), 0);
    }

    #[test]
    fn test_missing_global_document_fails() {
        setup();
        clear_global_document();
        let result = create_active_element_tracker(ActiveElementOptions::default());
        assert!(matches!(result, Err(TrackerError::NoDocument)));
    }

    #[test]
    fn test_dropped_document_fails_fast() {
        reset_microtasks();
        let doc = Document::new();
        let root = doc.as_root();
        drop(doc);

        let result = create_active_element_tracker(ActiveElementOptions {
            document: Some(root),
            trigger_on_removal: true,
            ..Default::default()
        });
        assert!(matches!(result, Err(TrackerError::Listener(_))));
    }
}

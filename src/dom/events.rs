//! Focus events - capture-phase dispatch along the composed path.
//!
//! `focus` and `blur` do not bubble. Dispatch runs capture listeners from
//! the document inward, through every shadow root and host on the way, and
//! then the listeners registered on the target itself.

use std::cell::Cell;
use std::rc::Rc;

use super::node::Element;
use super::tree::{NodeId, TreeRef};

/// Which focus transition an event reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FocusEventKind {
    Focus,
    Blur,
}

impl FocusEventKind {
    /// DOM event type name.
    pub fn event_type(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Blur => "blur",
        }
    }
}

/// Handle returned by `add_event_listener`, used to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Listener registration options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Fire during the capture phase, before descendants see the event.
    pub capture: bool,
}

impl ListenerOptions {
    pub fn capture() -> Self {
        Self { capture: true }
    }
}

/// A dispatched focus event, as seen by one listener.
#[derive(Debug)]
pub struct FocusEvent {
    kind: FocusEventKind,
    target: Element,
    stopped: Rc<Cell<bool>>,
}

impl FocusEvent {
    pub fn kind(&self) -> FocusEventKind {
        self.kind
    }

    /// Event target, retargeted for the listener's position in the tree.
    ///
    /// A listener on the document sees a shadow host, not the focused
    /// element inside its shadow root.
    pub fn target(&self) -> &Element {
        &self.target
    }

    /// Stop the event from reaching listeners further along the path.
    pub fn stop_propagation(&self) {
        self.stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// Dispatch `kind` at `target`. Must be called with no outstanding borrow.
pub(crate) fn dispatch(tree: &TreeRef, target: NodeId, kind: FocusEventKind) {
    let path = tree.borrow().composed_path(target);
    let stopped = Rc::new(Cell::new(false));

    tracing::trace!(target = target.0, ?kind, depth = path.len(), "dispatching focus event");

    // Capture phase: outermost first, target excluded
    for &node in path.iter().skip(1).rev() {
        invoke(tree, node, target, kind, false, &stopped);
        if stopped.get() {
            return;
        }
    }
    invoke(tree, target, target, kind, true, &stopped);
}

fn invoke(
    tree: &TreeRef,
    node: NodeId,
    target: NodeId,
    kind: FocusEventKind,
    at_target: bool,
    stopped: &Rc<Cell<bool>>,
) {
    let (listeners, retargeted) = {
        let tree = tree.borrow();
        (tree.listeners_for(node, kind, at_target), tree.retarget(target, node))
    };
    if listeners.is_empty() {
        return;
    }

    let event = FocusEvent {
        kind,
        target: Element::from_parts(retargeted, Rc::downgrade(tree)),
        stopped: stopped.clone(),
    };
    for (callback, live) in listeners {
        // Removed mid-dispatch
        if !live.get() {
            continue;
        }
        callback(&event);
    }
}

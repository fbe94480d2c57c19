//! Mutation observation - batched child-list change notification.
//!
//! Structural changes are recorded synchronously but delivered on the next
//! microtask flush: one delivery per document per flush, one callback per
//! observer carrying the whole batch.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use bitflags::bitflags;

use super::node::{Element, Root};
use super::tree::{self, RawRecord, TreeRef, WeakTree};
use crate::error::DomError;
use crate::task::queue_microtask;

bitflags! {
    /// What a [`MutationObserver`] watches.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ObserveFlags: u8 {
        /// Children added to or removed from the target.
        const CHILD_LIST = 1 << 0;
        /// Extend observation to the target's descendants (same tree only).
        const SUBTREE = 1 << 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct ObserverId(pub(crate) u64);

/// Node whose child list changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationTarget {
    Element(Element),
    Root(Root),
}

/// One child-list change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: MutationTarget,
    pub added: Vec<Element>,
    pub removed: Vec<Element>,
}

/// Registered child-list observer. Stops on [`disconnect`](Self::disconnect).
///
/// Dropping the handle does not disconnect; the owner decides when
/// observation ends.
#[derive(Debug)]
pub struct MutationObserver {
    id: ObserverId,
    tree: WeakTree,
    live: Rc<Cell<bool>>,
}

impl MutationObserver {
    /// Start observing `target`.
    pub fn observe(
        target: &Root,
        flags: ObserveFlags,
        callback: impl Fn(&[MutationRecord]) + 'static,
    ) -> Result<Self, DomError> {
        let strong = tree::upgrade(target.tree())?;
        let live = Rc::new(Cell::new(true));
        let id = strong
            .borrow_mut()
            .add_observer(target.id(), flags, Rc::new(callback), live.clone());
        Ok(Self {
            id,
            tree: target.tree().clone(),
            live,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.live.get()
    }

    /// Stop observing and drop undelivered records. Safe to call repeatedly.
    pub fn disconnect(&self) {
        if !self.live.replace(false) {
            return;
        }
        if let Some(tree) = self.tree.upgrade() {
            tree.borrow_mut().remove_observer(self.id);
        }
    }
}

/// Queue the delivery microtask for `tree`.
pub(crate) fn schedule_delivery(tree: &TreeRef) {
    let weak = Rc::downgrade(tree);
    let pending = PendingDelivery {
        queued: tree.borrow().delivery_queued.clone(),
        armed: true,
    };
    queue_microtask(move || {
        pending.disarm();
        deliver(&weak);
    });
}

/// Owned by the queued delivery task. Clears the document's queued flag if
/// the task is discarded without running, so the next change schedules again.
struct PendingDelivery {
    queued: Rc<Cell<bool>>,
    armed: bool,
}

impl PendingDelivery {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingDelivery {
    fn drop(&mut self) {
        if self.armed {
            self.queued.set(false);
        }
    }
}

fn deliver(weak: &WeakTree) {
    let Some(tree) = weak.upgrade() else { return };
    let batches = tree.borrow_mut().take_batches();
    for (callback, live, raw) in batches {
        if !live.get() {
            continue;
        }
        let records = {
            let tree = tree.borrow();
            raw.into_iter()
                .map(|record| to_record(&tree, weak, record))
                .collect::<Vec<_>>()
        };
        tracing::trace!(records = records.len(), "delivering mutation batch");
        callback(&records);
    }
}

fn to_record(tree: &tree::Tree, weak: &WeakTree, raw: RawRecord) -> MutationRecord {
    let element = |id| Element::from_parts(id, Weak::clone(weak));
    let target = if tree.tag(raw.target).is_some() {
        MutationTarget::Element(element(raw.target))
    } else {
        MutationTarget::Root(Root::from_parts(raw.target, Weak::clone(weak)))
    };
    MutationRecord {
        target,
        added: raw.added.into_iter().map(element).collect(),
        removed: raw.removed.into_iter().map(element).collect(),
    }
}

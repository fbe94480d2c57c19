//! Removal watching - re-resolves after structural changes under the root.
//!
//! Removing the focused element clears focus without a blur event, so the
//! focus listeners never hear about it. A child-list observer on the root
//! catches the batch on the next microtask flush and re-resolves.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::DomError;
use crate::platform::{FocusRoot, Release};

use super::cell::ReactiveCell;
use super::resolver::resolve;

/// Subtree child-list observation feeding one tracker cell. Ends on
/// [`dispose`](Self::dispose).
pub struct RemovalWatcher {
    observer: RefCell<Option<Release>>,
}

impl RemovalWatcher {
    /// Observe `root`'s subtree and write a fresh resolution into `cell` once
    /// per mutation batch.
    ///
    /// Every batch re-resolves, whether or not the tracked element was among
    /// the removed nodes.
    pub fn watch<R: FocusRoot>(
        root: &R,
        cell: ReactiveCell<Option<R::Element>>,
        deep: bool,
    ) -> Result<Self, DomError> {
        let target = root.clone();
        let release = root.observe_child_list(Rc::new(move |records: usize| {
            let resolved = resolve(&target, deep);
            tracing::trace!(records, ?resolved, "mutation batch re-resolved");
            cell.set(resolved);
        }))?;
        Ok(Self {
            observer: RefCell::new(Some(release)),
        })
    }

    pub fn is_watching(&self) -> bool {
        self.observer.borrow().is_some()
    }

    /// Disconnect the observer. Safe to call repeatedly.
    pub fn dispose(&self) {
        let observer = self.observer.borrow_mut().take();
        if let Some(disconnect) = observer {
            disconnect();
        }
    }
}

impl fmt::Debug for RemovalWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemovalWatcher")
            .field("watching", &self.is_watching())
            .finish()
    }
}

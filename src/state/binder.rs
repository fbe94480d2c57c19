//! Focus event binding - keeps a cell in sync with focus and blur.
//!
//! Both listeners are capture-phase on the root so they run before any
//! descendant can stop propagation. Each event triggers a full
//! re-resolution; the event target is never used directly because it is
//! retargeted to the outermost shadow host.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::dom::FocusEventKind;
use crate::error::DomError;
use crate::platform::{FocusRoot, Release};

use super::cell::ReactiveCell;
use super::resolver::resolve;

/// Registered focus/blur listeners for one root.
pub struct FocusEventBinder {
    listeners: RefCell<Option<(Release, Release)>>,
}

impl FocusEventBinder {
    /// Register capture listeners on `root` that write into `cell`.
    pub fn bind<R: FocusRoot>(
        root: &R,
        cell: ReactiveCell<Option<R::Element>>,
        deep: bool,
    ) -> Result<Self, DomError> {
        let focus = Self::listen(root, FocusEventKind::Focus, cell.clone(), deep)?;
        let blur = match Self::listen(root, FocusEventKind::Blur, cell, deep) {
            Ok(release) => release,
            Err(err) => {
                focus();
                return Err(err);
            }
        };
        Ok(Self {
            listeners: RefCell::new(Some((focus, blur))),
        })
    }

    fn listen<R: FocusRoot>(
        root: &R,
        kind: FocusEventKind,
        cell: ReactiveCell<Option<R::Element>>,
        deep: bool,
    ) -> Result<Release, DomError> {
        let target = root.clone();
        root.listen_focus(
            kind,
            Rc::new(move || {
                let resolved = resolve(&target, deep);
                tracing::trace!(?kind, ?resolved, "focus event re-resolved");
                cell.set(resolved);
            }),
        )
    }

    /// Whether the listeners are still registered.
    pub fn is_bound(&self) -> bool {
        self.listeners.borrow().is_some()
    }

    /// Remove both listeners. Safe to call repeatedly.
    pub fn dispose(&self) {
        let listeners = self.listeners.borrow_mut().take();
        if let Some((focus, blur)) = listeners {
            focus();
            blur();
        }
    }
}

impl fmt::Debug for FocusEventBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusEventBinder")
            .field("bound", &self.is_bound())
            .finish()
    }
}

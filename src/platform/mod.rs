//! Platform seam - what the tracker needs from a DOM.
//!
//! The tracker only ever asks a root four things: its active element, the
//! active element inside an element's shadow root, to run a callback on
//! capture-phase focus and blur, and to run a callback per child-list
//! mutation batch over its subtree. [`FocusRoot`] is that surface.
//!
//! - [`Root`](crate::dom::Root) implements it over the in-memory model (see
//!   `memory.rs`), which is also what the tests drive.
//! - `WebRoot` implements it over `web-sys` when the `web` feature is on and
//!   the target is `wasm32`.

mod memory;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
mod web;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use web::WebRoot;

use std::fmt::Debug;
use std::rc::Rc;

use crate::dom::FocusEventKind;
use crate::error::DomError;

/// Undoes a registration made through [`FocusRoot`].
pub type Release = Box<dyn FnOnce()>;

/// A document or shadow root the tracker can resolve against and listen on.
pub trait FocusRoot: Clone + Debug + 'static {
    /// Element handle. Equality must be identity.
    type Element: Clone + PartialEq + Debug + 'static;

    /// Ambient document, if the environment has one.
    fn global() -> Option<Self>;

    /// The root's own `activeElement`.
    fn active_element(&self) -> Option<Self::Element>;

    /// `activeElement` of `element`'s shadow root. `None` if it has no
    /// shadow root or nothing inside it is focused.
    fn shadow_active_element(element: &Self::Element) -> Option<Self::Element>;

    /// Call `callback` on every `kind` event passing through this root,
    /// during the capture phase.
    fn listen_focus(&self, kind: FocusEventKind, callback: Rc<dyn Fn()>) -> Result<Release, DomError>;

    /// Call `callback` once per child-list mutation batch anywhere in this
    /// root's subtree, with the number of records in the batch.
    fn observe_child_list(&self, callback: Rc<dyn Fn(usize)>) -> Result<Release, DomError>;
}

//! # spark-active-element
//!
//! Reactive tracking of the focused element across documents and shadow roots.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for fine-grained reactivity.
//!
//! ## Architecture
//!
//! The tracker holds one reactive cell whose value is always the resolved
//! active element of its root. Nothing polls; every update is driven by an
//! inbound event or mutation batch:
//! ```text
//! focus/blur (capture) ─┐
//!                       ├─> resolve_active_element(root) ─> ReactiveCell ─> effects / subscribers
//! mutation batch ───────┘        (microtask)
//! ```
//!
//! ## Modules
//!
//! - [`dom`] - In-memory document model (nodes, focus, events, mutation observers)
//! - [`platform`] - [`FocusRoot`] seam over the in-memory model or a browser DOM (`web` feature)
//! - [`state`] - Resolver, reactive cell, binder, removal watcher, tracker
//! - [`task`] - Microtask queue used for mutation delivery
//! - [`error`] - Error types

pub mod dom;
pub mod error;
pub mod platform;
pub mod state;
pub mod task;

pub use dom::{
    clear_global_document, global_document, set_global_document, Document, Element, FocusEvent,
    FocusEventKind, ListenerId, ListenerOptions, MutationObserver, MutationRecord, MutationTarget,
    ObserveFlags, Root, ShadowRoot,
};

pub use error::{DomError, TrackerError};

pub use platform::{FocusRoot, Release};
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use platform::WebRoot;

pub use state::{
    create_active_element_tracker, resolve, resolve_active_element, track_active_element,
    ActiveElement, ActiveElementOptions, FocusEventBinder, ReactiveCell, RemovalWatcher,
    Unsubscribe,
};

pub use task::{flush_microtasks, pending_microtasks, queue_microtask, reset_microtasks};

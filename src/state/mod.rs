//! State Module - Reactive active-element tracking
//!
//! - **ReactiveCell** - settable observable, signal-backed with subscribers
//! - **Resolver** - deepest focused element through nested shadow roots
//! - **FocusEventBinder** - capture-phase focus/blur listeners on a root
//! - **RemovalWatcher** - child-list observer that re-resolves per batch
//! - **ActiveElement** - the tracker wiring all of the above

mod active_element;
mod binder;
mod cell;
mod resolver;
mod watcher;

pub use active_element::*;
pub use binder::*;
pub use cell::*;
pub use resolver::*;
pub use watcher::*;

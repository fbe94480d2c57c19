//! DOM Module - In-memory document model
//!
//! The platform primitives the focus tracker reads from:
//!
//! - **Nodes** - `Document`, `Element`, `ShadowRoot`, and the `Root` union
//! - **Focus** - one focused element per document, per-root `activeElement`
//! - **Events** - capture-phase `focus`/`blur` dispatch with retargeting
//! - **Mutations** - child-list observers delivered on microtask flush
//! - **Global** - the thread's default document

mod events;
mod global;
mod mutation;
mod node;
mod tree;

pub use events::{FocusEvent, FocusEventKind, ListenerId, ListenerOptions};
pub use global::{clear_global_document, global_document, set_global_document};
pub use mutation::{MutationObserver, MutationRecord, MutationTarget, ObserveFlags};
pub use node::{Document, Element, Root, ShadowRoot};

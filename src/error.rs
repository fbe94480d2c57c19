//! Error types for the document model and tracker construction.

use thiserror::Error;

/// Failures raised by the document model or a platform binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("the owning document has been dropped")]
    DocumentDropped,
    #[error("element <{0}> already hosts a shadow root")]
    ShadowRootExists(String),
    #[error("cannot insert a node into its own subtree")]
    HierarchyRequest,
    #[error("node belongs to a different document")]
    WrongDocument,
    /// Exception thrown by a host DOM call, rendered with `Debug`.
    #[error("platform call failed: {0}")]
    Platform(String),
}

/// Failures raised while constructing an active-element tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("no global document is installed; pass `document` explicitly or call `set_global_document`")]
    NoDocument,
    #[error("failed to register focus listeners: {0}")]
    Listener(#[source] DomError),
    #[error("failed to observe removals: {0}")]
    Observer(#[source] DomError),
}

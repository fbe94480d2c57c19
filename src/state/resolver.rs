//! Active element resolution through nested shadow roots.

use crate::platform::FocusRoot;

/// Deepest focused element under `root`.
///
/// Starts from `root`'s own `activeElement` (`<body>` for an unfocused
/// document, `None` for a shadow root without focus inside it) and follows
/// each candidate's shadow root while that shadow root reports an active
/// element of its own.
pub fn resolve_active_element<R: FocusRoot>(root: &R) -> Option<R::Element> {
    resolve(root, true)
}

/// Like [`resolve_active_element`], descending only when `deep` is set.
pub fn resolve<R: FocusRoot>(root: &R, deep: bool) -> Option<R::Element> {
    let mut candidate = root.active_element()?;
    if !deep {
        return Some(candidate);
    }
    while let Some(inner) = R::shadow_active_element(&candidate) {
        candidate = inner;
    }
    Some(candidate)
}

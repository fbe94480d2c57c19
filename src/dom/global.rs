//! Thread-local global document, the stand-in for `window.document`.

use std::cell::RefCell;

use super::node::Document;

thread_local! {
    static GLOBAL_DOCUMENT: RefCell<Option<Document>> = const { RefCell::new(None) };
}

/// Install `document` as the global document, returning the previous one.
pub fn set_global_document(document: Document) -> Option<Document> {
    GLOBAL_DOCUMENT.with(|slot| slot.borrow_mut().replace(document))
}

/// The installed global document, if any.
pub fn global_document() -> Option<Document> {
    GLOBAL_DOCUMENT.with(|slot| slot.borrow().clone())
}

/// Remove the global document (for testing)
pub fn clear_global_document() -> Option<Document> {
    GLOBAL_DOCUMENT.with(|slot| slot.borrow_mut().take())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_and_clear() {
        clear_global_document();
        assert!(global_document().is_none());

        let doc = Document::new();
        assert!(set_global_document(doc.clone()).is_none());
        assert_eq!(global_document(), Some(doc.clone()));

        assert_eq!(clear_global_document(), Some(doc));
        assert!(global_document().is_none());
    }
}

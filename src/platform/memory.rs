use std::rc::Rc;

use super::{FocusRoot, Release};
use crate::dom::{
    global_document, Element, FocusEventKind, ListenerOptions, MutationObserver, ObserveFlags, Root,
};
use crate::error::DomError;

impl FocusRoot for Root {
    type Element = Element;

    fn global() -> Option<Self> {
        global_document().map(|doc| doc.as_root())
    }

    fn active_element(&self) -> Option<Element> {
        Root::active_element(self)
    }

    fn shadow_active_element(element: &Element) -> Option<Element> {
        element.shadow_root().and_then(|shadow| shadow.active_element())
    }

    fn listen_focus(&self, kind: FocusEventKind, callback: Rc<dyn Fn()>) -> Result<Release, DomError> {
        let id = self.add_event_listener(kind, ListenerOptions::capture(), move |_event| callback())?;
        let root = self.clone();
        Ok(Box::new(move || {
            root.remove_event_listener(id);
        }))
    }

    fn observe_child_list(&self, callback: Rc<dyn Fn(usize)>) -> Result<Release, DomError> {
        let observer = MutationObserver::observe(
            self,
            ObserveFlags::CHILD_LIST | ObserveFlags::SUBTREE,
            move |records| callback(records.len()),
        )?;
        Ok(Box::new(move || observer.disconnect()))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::dom::{clear_global_document, set_global_document, Document};
    use crate::task::{flush_microtasks, reset_microtasks};

    #[test]
    fn test_global_follows_installed_document() {
        clear_global_document();
        assert!(<Root as FocusRoot>::global().is_none());

        let doc = Document::new();
        set_global_document(doc.clone());
        assert_eq!(<Root as FocusRoot>::global(), Some(doc.as_root()));
        clear_global_document();
    }

    #[test]
    fn test_shadow_active_element_looks_one_level_in() {
        let doc = Document::new();
        let host = doc.create_element("div");
        doc.body().append_child(&host).unwrap();
        let shadow = host.attach_shadow().unwrap();
        let input = doc.create_element("input");
        shadow.append_child(&input).unwrap();

        assert_eq!(Root::shadow_active_element(&host), None);
        input.focus();
        assert_eq!(Root::shadow_active_element(&host), Some(input.clone()));
        assert_eq!(Root::shadow_active_element(&input), None);
    }

    #[test]
    fn test_focus_release_removes_listener() {
        let doc = Document::new();
        let input = doc.create_element("input");
        doc.body().append_child(&input).unwrap();
        let kinds = Rc::new(RefCell::new(Vec::new()));

        let sink = kinds.clone();
        let release_focus = doc
            .as_root()
            .listen_focus(FocusEventKind::Focus, Rc::new(move || sink.borrow_mut().push("focus")))
            .unwrap();
        let sink = kinds.clone();
        let release_blur = doc
            .as_root()
            .listen_focus(FocusEventKind::Blur, Rc::new(move || sink.borrow_mut().push("blur")))
            .unwrap();

        input.focus();
        input.blur();
        release_focus();
        release_blur();
        input.focus();

        assert_eq!(*kinds.borrow(), vec!["focus", "blur"]);
    }

    #[test]
    fn test_child_list_reports_batch_size() {
        reset_microtasks();
        let doc = Document::new();
        let sizes = Rc::new(RefCell::new(Vec::new()));
        let sink = sizes.clone();
        let release = doc
            .as_root()
            .observe_child_list(Rc::new(move |count: usize| sink.borrow_mut().push(count)))
            .unwrap();

        let wrapper = doc.create_element("section");
        doc.body().append_child(&wrapper).unwrap();
        wrapper.append_child(&doc.create_element("input")).unwrap();
        flush_microtasks();
        assert_eq!(*sizes.borrow(), vec![2]);

        release();
        wrapper.remove();
        flush_microtasks();
        assert_eq!(*sizes.borrow(), vec![2]);
    }

    #[test]
    fn test_registration_on_dropped_document_fails() {
        let doc = Document::new();
        let root = doc.as_root();
        drop(doc);

        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let result = root.listen_focus(FocusEventKind::Focus, Rc::new(move || counter.set(counter.get() + 1)));
        assert_eq!(result.err(), Some(DomError::DocumentDropped));
        assert!(root.observe_child_list(Rc::new(|_count: usize| {})).is_err());
    }
}

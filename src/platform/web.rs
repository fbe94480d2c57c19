//! Browser binding over `web-sys`.
//!
//! Each registration owns its `Closure`; the returned [`Release`] detaches
//! the listener (or disconnects the observer) and then drops the closure.

use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use super::{FocusRoot, Release};
use crate::dom::FocusEventKind;
use crate::error::DomError;

/// A browser document or shadow root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebRoot {
    Document(web_sys::Document),
    Shadow(web_sys::ShadowRoot),
}

impl WebRoot {
    fn node(&self) -> &web_sys::Node {
        match self {
            Self::Document(doc) => doc.as_ref(),
            Self::Shadow(shadow) => shadow.as_ref(),
        }
    }

    fn target(&self) -> &web_sys::EventTarget {
        match self {
            Self::Document(doc) => doc.as_ref(),
            Self::Shadow(shadow) => shadow.as_ref(),
        }
    }
}

impl From<web_sys::Document> for WebRoot {
    fn from(doc: web_sys::Document) -> Self {
        Self::Document(doc)
    }
}

impl From<web_sys::ShadowRoot> for WebRoot {
    fn from(shadow: web_sys::ShadowRoot) -> Self {
        Self::Shadow(shadow)
    }
}

fn platform_error(err: JsValue) -> DomError {
    DomError::Platform(format!("{err:?}"))
}

impl FocusRoot for WebRoot {
    type Element = web_sys::Element;

    fn global() -> Option<Self> {
        web_sys::window()?.document().map(Self::Document)
    }

    fn active_element(&self) -> Option<web_sys::Element> {
        match self {
            Self::Document(doc) => doc.active_element(),
            Self::Shadow(shadow) => shadow.active_element(),
        }
    }

    fn shadow_active_element(element: &web_sys::Element) -> Option<web_sys::Element> {
        element.shadow_root()?.active_element()
    }

    fn listen_focus(&self, kind: FocusEventKind, callback: Rc<dyn Fn()>) -> Result<Release, DomError> {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| callback());
        let target = self.target().clone();
        let event_type = kind.event_type();
        target
            .add_event_listener_with_callback_and_bool(event_type, closure.as_ref().unchecked_ref(), true)
            .map_err(platform_error)?;

        Ok(Box::new(move || {
            let _ = target.remove_event_listener_with_callback_and_bool(
                event_type,
                closure.as_ref().unchecked_ref(),
                true,
            );
            drop(closure);
        }))
    }

    fn observe_child_list(&self, callback: Rc<dyn Fn(usize)>) -> Result<Release, DomError> {
        let closure = Closure::<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>::new(
            move |records: js_sys::Array, _observer: web_sys::MutationObserver| {
                callback(records.length() as usize)
            },
        );
        let observer =
            web_sys::MutationObserver::new(closure.as_ref().unchecked_ref()).map_err(platform_error)?;

        let init = web_sys::MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer
            .observe_with_options(self.node(), &init)
            .map_err(platform_error)?;

        Ok(Box::new(move || {
            observer.disconnect();
            drop(closure);
        }))
    }
}

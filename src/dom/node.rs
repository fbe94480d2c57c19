//! Node handles - `Document`, `Element`, `ShadowRoot`, `Root`.
//!
//! `Document` owns the tree. Every other handle is a weak lookup that
//! degrades to "nothing there" once the document is dropped, and compares
//! by node identity.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::events::{self, FocusEvent, FocusEventKind, ListenerId, ListenerOptions};
use super::mutation;
use super::tree::{self, NodeId, Tree, TreeRef, WeakTree};
use crate::error::DomError;

// =============================================================================
// Document
// =============================================================================

/// Owner of a node tree. Cloning shares the same document.
#[derive(Clone)]
pub struct Document {
    tree: TreeRef,
}

impl Document {
    pub fn new() -> Self {
        Self {
            tree: Rc::new(RefCell::new(Tree::new())),
        }
    }

    fn handle(&self, id: NodeId) -> Element {
        Element::from_parts(id, Rc::downgrade(&self.tree))
    }

    pub fn create_element(&self, tag: &str) -> Element {
        let id = self.tree.borrow_mut().alloc_element(tag);
        self.handle(id)
    }

    pub fn body(&self) -> Element {
        let id = self.tree.borrow().body;
        self.handle(id)
    }

    pub fn document_element(&self) -> Element {
        let id = self.tree.borrow().document_element;
        self.handle(id)
    }

    /// Focused element retargeted to the document's own tree, or `<body>`.
    pub fn active_element(&self) -> Option<Element> {
        let tree = self.tree.borrow();
        tree.active_element(tree.document).map(|id| self.handle(id))
    }

    /// The element that actually holds focus, however deeply encapsulated.
    pub fn focused_element(&self) -> Option<Element> {
        let focused = self.tree.borrow().focused;
        focused.map(|id| self.handle(id))
    }

    pub fn as_root(&self) -> Root {
        let id = self.tree.borrow().document;
        Root {
            id,
            tree: Rc::downgrade(&self.tree),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree)
    }
}

impl Eq for Document {}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tree.try_borrow() {
            Ok(tree) => f.debug_struct("Document").field("nodes", &tree.nodes.len()).finish(),
            Err(_) => f.write_str("Document(<busy>)"),
        }
    }
}

// =============================================================================
// Element
// =============================================================================

/// Non-owning handle to an element node.
#[derive(Clone)]
pub struct Element {
    id: NodeId,
    tree: WeakTree,
}

impl Element {
    pub(crate) fn from_parts(id: NodeId, tree: WeakTree) -> Self {
        Self { id, tree }
    }

    /// Lowercase tag name, empty once the document is gone.
    pub fn tag(&self) -> String {
        self.tree
            .upgrade()
            .and_then(|tree| tree.borrow().tag(self.id).map(str::to_string))
            .unwrap_or_default()
    }

    pub fn is_connected(&self) -> bool {
        self.tree
            .upgrade()
            .is_some_and(|tree| tree.borrow().is_connected(self.id))
    }

    pub fn parent_element(&self) -> Option<Element> {
        let tree = self.tree.upgrade()?;
        let tree = tree.borrow();
        let parent = tree.node(self.id).parent?;
        tree.tag(parent)?;
        Some(Element::from_parts(parent, self.tree.clone()))
    }

    pub fn children(&self) -> Vec<Element> {
        let Some(tree) = self.tree.upgrade() else {
            return Vec::new();
        };
        let tree = tree.borrow();
        tree.node(self.id)
            .children
            .iter()
            .map(|&id| Element::from_parts(id, self.tree.clone()))
            .collect()
    }

    pub fn append_child(&self, child: &Element) -> Result<(), DomError> {
        append_to(&self.tree, self.id, child)
    }

    /// Detach from the parent. Focus inside the removed subtree is dropped
    /// without a blur event.
    pub fn remove(&self) {
        let Some(tree) = self.tree.upgrade() else { return };
        let schedule = tree.borrow_mut().detach(self.id);
        if schedule {
            mutation::schedule_delivery(&tree);
        }
    }

    pub fn attach_shadow(&self) -> Result<ShadowRoot, DomError> {
        let tree = tree::upgrade(&self.tree)?;
        let id = tree.borrow_mut().attach_shadow(self.id)?;
        Ok(ShadowRoot {
            id,
            tree: self.tree.clone(),
        })
    }

    pub fn shadow_root(&self) -> Option<ShadowRoot> {
        let tree = self.tree.upgrade()?;
        let id = tree.borrow().node(self.id).shadow_root?;
        Some(ShadowRoot {
            id,
            tree: self.tree.clone(),
        })
    }

    pub fn is_focusable(&self) -> bool {
        self.tree
            .upgrade()
            .is_some_and(|tree| tree.borrow().node(self.id).focusable)
    }

    /// Opt an element in or out of focus (like setting `tabindex`).
    pub fn set_focusable(&self, focusable: bool) {
        if let Some(tree) = self.tree.upgrade() {
            tree.borrow_mut().node_mut(self.id).focusable = focusable;
        }
    }

    pub fn is_focused(&self) -> bool {
        self.tree
            .upgrade()
            .is_some_and(|tree| tree.borrow().focused == Some(self.id))
    }

    /// Move focus here. Ignored for disconnected or unfocusable elements.
    ///
    /// The previously focused element receives `blur` first, while nothing
    /// is focused, then this element receives `focus`.
    pub fn focus(&self) {
        let Some(tree) = self.tree.upgrade() else { return };
        let previous = {
            let mut t = tree.borrow_mut();
            if t.focused == Some(self.id) || !t.node(self.id).focusable || !t.is_connected(self.id) {
                return;
            }
            t.focused.take()
        };
        if let Some(previous) = previous {
            events::dispatch(&tree, previous, FocusEventKind::Blur);
        }

        {
            let mut t = tree.borrow_mut();
            // A blur listener may have detached us or moved focus elsewhere
            if t.focused.is_some() || !t.is_connected(self.id) {
                return;
            }
            t.focused = Some(self.id);
        }
        events::dispatch(&tree, self.id, FocusEventKind::Focus);
    }

    /// Drop focus if this element holds it.
    pub fn blur(&self) {
        let Some(tree) = self.tree.upgrade() else { return };
        {
            let mut t = tree.borrow_mut();
            if t.focused != Some(self.id) {
                return;
            }
            t.focused = None;
        }
        events::dispatch(&tree, self.id, FocusEventKind::Blur);
    }

    pub fn add_event_listener(
        &self,
        kind: FocusEventKind,
        options: ListenerOptions,
        listener: impl Fn(&FocusEvent) + 'static,
    ) -> Result<ListenerId, DomError> {
        add_listener(&self.tree, self.id, kind, options, listener)
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        remove_listener(&self.tree, id)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.tree, &other.tree)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self
            .tree
            .upgrade()
            .and_then(|tree| tree.try_borrow().ok().and_then(|t| t.tag(self.id).map(str::to_string)));
        match tag {
            Some(tag) => write!(f, "Element(<{}>#{})", tag, self.id.0),
            None => write!(f, "Element(#{})", self.id.0),
        }
    }
}

// =============================================================================
// ShadowRoot
// =============================================================================

/// Encapsulated subtree attached to a host element.
#[derive(Clone)]
pub struct ShadowRoot {
    id: NodeId,
    tree: WeakTree,
}

impl ShadowRoot {
    pub fn host(&self) -> Option<Element> {
        let tree = self.tree.upgrade()?;
        let host = tree.borrow().host_of(self.id)?;
        Some(Element::from_parts(host, self.tree.clone()))
    }

    pub fn append_child(&self, child: &Element) -> Result<(), DomError> {
        append_to(&self.tree, self.id, child)
    }

    pub fn children(&self) -> Vec<Element> {
        let Some(tree) = self.tree.upgrade() else {
            return Vec::new();
        };
        let tree = tree.borrow();
        tree.node(self.id)
            .children
            .iter()
            .map(|&id| Element::from_parts(id, self.tree.clone()))
            .collect()
    }

    /// Focused element retargeted into this shadow tree, if focus is inside.
    pub fn active_element(&self) -> Option<Element> {
        active_element(&self.tree, self.id)
    }

    pub fn as_root(&self) -> Root {
        Root {
            id: self.id,
            tree: self.tree.clone(),
        }
    }
}

impl PartialEq for ShadowRoot {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.tree, &other.tree)
    }
}

impl Eq for ShadowRoot {}

impl fmt::Debug for ShadowRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShadowRoot(#{})", self.id.0)
    }
}

// =============================================================================
// Root
// =============================================================================

/// The document or a shadow root, held weakly.
#[derive(Clone)]
pub struct Root {
    id: NodeId,
    tree: WeakTree,
}

impl Root {
    pub(crate) fn from_parts(id: NodeId, tree: WeakTree) -> Self {
        Self { id, tree }
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn tree(&self) -> &WeakTree {
        &self.tree
    }

    /// False once the owning document has been dropped.
    pub fn is_alive(&self) -> bool {
        self.tree.strong_count() > 0
    }

    pub fn is_document(&self) -> bool {
        self.tree
            .upgrade()
            .is_some_and(|tree| tree.borrow().is_document(self.id))
    }

    /// `activeElement` of this root. `None` for a dropped document.
    pub fn active_element(&self) -> Option<Element> {
        active_element(&self.tree, self.id)
    }

    pub fn add_event_listener(
        &self,
        kind: FocusEventKind,
        options: ListenerOptions,
        listener: impl Fn(&FocusEvent) + 'static,
    ) -> Result<ListenerId, DomError> {
        add_listener(&self.tree, self.id, kind, options, listener)
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        remove_listener(&self.tree, id)
    }
}

impl From<&Document> for Root {
    fn from(document: &Document) -> Self {
        document.as_root()
    }
}

impl From<Document> for Root {
    fn from(document: Document) -> Self {
        document.as_root()
    }
}

impl From<&ShadowRoot> for Root {
    fn from(shadow: &ShadowRoot) -> Self {
        shadow.as_root()
    }
}

impl From<ShadowRoot> for Root {
    fn from(shadow: ShadowRoot) -> Self {
        shadow.as_root()
    }
}

impl PartialEq for Root {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.tree, &other.tree)
    }
}

impl Eq for Root {}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let is_document = self
            .tree
            .upgrade()
            .and_then(|tree| tree.try_borrow().ok().map(|t| t.is_document(self.id)));
        match is_document {
            Some(true) => f.write_str("Root(document)"),
            Some(false) => write!(f, "Root(shadow #{})", self.id.0),
            None => write!(f, "Root(#{} dropped)", self.id.0),
        }
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

fn active_element(tree: &WeakTree, root: NodeId) -> Option<Element> {
    let strong = tree.upgrade()?;
    let active = strong.borrow().active_element(root)?;
    Some(Element::from_parts(active, tree.clone()))
}

fn append_to(tree: &WeakTree, parent: NodeId, child: &Element) -> Result<(), DomError> {
    if !Weak::ptr_eq(tree, &child.tree) {
        return Err(DomError::WrongDocument);
    }
    let strong = tree::upgrade(tree)?;
    let schedule = strong.borrow_mut().append(parent, child.id)?;
    if schedule {
        mutation::schedule_delivery(&strong);
    }
    Ok(())
}

fn add_listener(
    tree: &WeakTree,
    node: NodeId,
    kind: FocusEventKind,
    options: ListenerOptions,
    listener: impl Fn(&FocusEvent) + 'static,
) -> Result<ListenerId, DomError> {
    let strong = tree::upgrade(tree)?;
    let id = strong
        .borrow_mut()
        .add_listener(node, kind, options.capture, Rc::new(listener));
    Ok(id)
}

fn remove_listener(tree: &WeakTree, id: ListenerId) -> bool {
    tree.upgrade()
        .is_some_and(|tree| tree.borrow_mut().remove_listener(id))
}

//! Node arena shared by every handle of one document.
//!
//! Handles ([`Element`](super::Element), [`ShadowRoot`](super::ShadowRoot),
//! [`Root`](super::Root)) hold a `Weak` reference to the tree plus a
//! [`NodeId`]. Nodes are never freed while the document lives; removal only
//! unlinks them, so ids stay valid and identity comparison stays sound.
//!
//! Nothing in here calls user code. Listener and observer callbacks are
//! collected under a borrow and invoked by the caller after the borrow ends.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use super::events::{FocusEvent, FocusEventKind, ListenerId};
use super::mutation::{MutationRecord, ObserveFlags, ObserverId};
use crate::error::DomError;

pub(crate) type TreeRef = Rc<RefCell<Tree>>;
pub(crate) type WeakTree = Weak<RefCell<Tree>>;

pub(crate) type ListenerFn = Rc<dyn Fn(&FocusEvent)>;
pub(crate) type ObserverFn = Rc<dyn Fn(&[MutationRecord])>;

/// Tags that accept focus without an explicit opt-in.
const FOCUSABLE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(pub(crate) usize);

#[derive(Debug)]
pub(crate) enum NodeKind {
    Document,
    Element { tag: String },
    ShadowRoot { host: NodeId },
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) shadow_root: Option<NodeId>,
    pub(crate) focusable: bool,
}

pub(crate) struct ListenerEntry {
    pub(crate) id: ListenerId,
    pub(crate) node: NodeId,
    pub(crate) kind: FocusEventKind,
    pub(crate) capture: bool,
    pub(crate) callback: ListenerFn,
    pub(crate) live: Rc<Cell<bool>>,
}

/// Child-list change recorded by node id; converted to handles on delivery.
#[derive(Clone, Debug)]
pub(crate) struct RawRecord {
    pub(crate) target: NodeId,
    pub(crate) added: Vec<NodeId>,
    pub(crate) removed: Vec<NodeId>,
}

pub(crate) struct ObserverEntry {
    pub(crate) registrations: Vec<(NodeId, ObserveFlags)>,
    pub(crate) pending: Vec<RawRecord>,
    pub(crate) callback: ObserverFn,
    pub(crate) live: Rc<Cell<bool>>,
}

pub(crate) struct Tree {
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) document: NodeId,
    pub(crate) document_element: NodeId,
    pub(crate) body: NodeId,
    pub(crate) focused: Option<NodeId>,
    pub(crate) listeners: Vec<ListenerEntry>,
    pub(crate) observers: BTreeMap<ObserverId, ObserverEntry>,
    /// Set while a delivery microtask is queued for this document. Shared
    /// with the queued task, which clears it if dropped unrun.
    pub(crate) delivery_queued: Rc<Cell<bool>>,
    next_listener: u64,
    next_observer: u64,
}

impl Tree {
    /// Fresh document with `<html>` and `<body>` already attached.
    pub(crate) fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            document: NodeId(0),
            document_element: NodeId(0),
            body: NodeId(0),
            focused: None,
            listeners: Vec::new(),
            observers: BTreeMap::new(),
            delivery_queued: Rc::new(Cell::new(false)),
            next_listener: 0,
            next_observer: 0,
        };
        let document = tree.alloc(NodeKind::Document, false);
        let html = tree.alloc_element("html");
        let body = tree.alloc_element("body");
        tree.link(document, html);
        tree.link(html, body);
        tree.document = document;
        tree.document_element = html;
        tree.body = body;
        tree
    }

    fn alloc(&mut self, kind: NodeKind, focusable: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            shadow_root: None,
            focusable,
        });
        id
    }

    pub(crate) fn alloc_element(&mut self, tag: &str) -> NodeId {
        let tag = tag.to_ascii_lowercase();
        let focusable = FOCUSABLE_TAGS.contains(&tag.as_str());
        self.alloc(NodeKind::Element { tag }, focusable)
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub(crate) fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    pub(crate) fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { tag } => Some(tag),
            _ => None,
        }
    }

    pub(crate) fn is_document(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Document)
    }

    pub(crate) fn host_of(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id).kind {
            NodeKind::ShadowRoot { host } => Some(host),
            _ => None,
        }
    }

    // =========================================================================
    // Tree queries
    // =========================================================================

    /// Topmost ancestor inside the same tree (does not cross shadow hosts).
    pub(crate) fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            current = parent;
        }
        current
    }

    /// Parent, or the host when `id` is a shadow root.
    fn composed_parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent.or_else(|| self.host_of(id))
    }

    pub(crate) fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            let root = self.root_of(current);
            if root == self.document {
                return true;
            }
            match self.host_of(root) {
                Some(host) => current = host,
                None => return false,
            }
        }
    }

    pub(crate) fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.node(node).parent;
        }
        false
    }

    pub(crate) fn is_shadow_including_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.composed_parent(node);
        }
        false
    }

    /// `[target, ..., document]`, shadow roots and hosts included.
    pub(crate) fn composed_path(&self, target: NodeId) -> Vec<NodeId> {
        let mut path = vec![target];
        let mut current = target;
        while let Some(next) = self.composed_parent(current) {
            path.push(next);
            current = next;
        }
        path
    }

    /// Retarget `target` for an observer sitting at `relative_to`.
    ///
    /// Climbs out of every shadow tree that does not also contain
    /// `relative_to`, so encapsulated nodes are reported as their host.
    pub(crate) fn retarget(&self, target: NodeId, relative_to: NodeId) -> NodeId {
        let mut current = target;
        loop {
            let root = self.root_of(current);
            match self.host_of(root) {
                Some(host) if !self.is_shadow_including_inclusive_ancestor(root, relative_to) => {
                    current = host;
                }
                _ => return current,
            }
        }
    }

    /// `activeElement` of the document or shadow root `root`.
    ///
    /// Documents fall back to `<body>` when nothing is focused; shadow roots
    /// report `None` unless focus sits somewhere inside them.
    pub(crate) fn active_element(&self, root: NodeId) -> Option<NodeId> {
        let fallback = if self.is_document(root) && self.is_inclusive_ancestor(root, self.body) {
            Some(self.body)
        } else {
            None
        };
        let Some(focused) = self.focused else {
            return fallback;
        };
        let candidate = self.retarget(focused, root);
        if self.root_of(candidate) == root {
            Some(candidate)
        } else {
            fallback
        }
    }

    // =========================================================================
    // Structure
    // =========================================================================

    pub(crate) fn attach_shadow(&mut self, host: NodeId) -> Result<NodeId, DomError> {
        if self.node(host).shadow_root.is_some() {
            let tag = self.tag(host).unwrap_or_default().to_string();
            return Err(DomError::ShadowRootExists(tag));
        }
        let root = self.alloc(NodeKind::ShadowRoot { host }, false);
        self.node_mut(host).shadow_root = Some(root);
        Ok(root)
    }

    /// Append `child` to `parent`, moving it if it already has a parent.
    ///
    /// Returns true when a mutation delivery microtask must be queued.
    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) -> Result<bool, DomError> {
        if self.is_shadow_including_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        let mut schedule = self.detach(child);
        self.link(parent, child);
        schedule |= self.queue_record(RawRecord {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(schedule)
    }

    /// Unlink `id` from its parent. No-op for parentless nodes.
    ///
    /// Clears focus without a blur event when the focused element goes with
    /// the removed subtree. Returns true when a delivery must be queued.
    pub(crate) fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.node(id).parent else {
            return false;
        };
        self.node_mut(parent).children.retain(|&child| child != id);
        self.node_mut(id).parent = None;

        if let Some(focused) = self.focused {
            if self.is_shadow_including_inclusive_ancestor(id, focused) {
                tracing::trace!(node = id.0, focused = focused.0, "focused element detached");
                self.focused = None;
            }
        }

        self.queue_record(RawRecord {
            target: parent,
            added: Vec::new(),
            removed: vec![id],
        })
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    pub(crate) fn add_listener(
        &mut self,
        node: NodeId,
        kind: FocusEventKind,
        capture: bool,
        callback: ListenerFn,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(ListenerEntry {
            id,
            node,
            kind,
            capture,
            callback,
            live: Rc::new(Cell::new(true)),
        });
        id
    }

    pub(crate) fn remove_listener(&mut self, id: ListenerId) -> bool {
        let Some(pos) = self.listeners.iter().position(|entry| entry.id == id) else {
            return false;
        };
        let entry = self.listeners.remove(pos);
        entry.live.set(false);
        true
    }

    /// Listeners at `node` for `kind`. Capture-only unless `at_target`.
    pub(crate) fn listeners_for(
        &self,
        node: NodeId,
        kind: FocusEventKind,
        at_target: bool,
    ) -> Vec<(ListenerFn, Rc<Cell<bool>>)> {
        self.listeners
            .iter()
            .filter(|entry| entry.node == node && entry.kind == kind && (at_target || entry.capture))
            .map(|entry| (entry.callback.clone(), entry.live.clone()))
            .collect()
    }

    // =========================================================================
    // Mutation observers
    // =========================================================================

    pub(crate) fn add_observer(
        &mut self,
        target: NodeId,
        flags: ObserveFlags,
        callback: ObserverFn,
        live: Rc<Cell<bool>>,
    ) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.insert(
            id,
            ObserverEntry {
                registrations: vec![(target, flags)],
                pending: Vec::new(),
                callback,
                live,
            },
        );
        id
    }

    pub(crate) fn remove_observer(&mut self, id: ObserverId) -> bool {
        match self.observers.remove(&id) {
            Some(entry) => {
                entry.live.set(false);
                true
            }
            None => false,
        }
    }

    /// Hand `record` to every interested observer.
    fn queue_record(&mut self, record: RawRecord) -> bool {
        let mut queued = false;
        for entry in self.observers.values_mut() {
            let interested = entry.registrations.iter().any(|&(node, flags)| {
                flags.contains(ObserveFlags::CHILD_LIST)
                    && (node == record.target
                        || (flags.contains(ObserveFlags::SUBTREE)
                            && is_ancestor_in(&self.nodes, node, record.target)))
            });
            if interested {
                entry.pending.push(record.clone());
                queued = true;
            }
        }
        queued && !self.delivery_queued.replace(true)
    }

    /// Drain pending batches for delivery.
    pub(crate) fn take_batches(&mut self) -> Vec<(ObserverFn, Rc<Cell<bool>>, Vec<RawRecord>)> {
        self.delivery_queued.set(false);
        self.observers
            .values_mut()
            .filter(|entry| !entry.pending.is_empty())
            .map(|entry| {
                (
                    entry.callback.clone(),
                    entry.live.clone(),
                    std::mem::take(&mut entry.pending),
                )
            })
            .collect()
    }
}

// Free function so `queue_record` can borrow `nodes` while iterating observers.
fn is_ancestor_in(nodes: &[NodeData], ancestor: NodeId, id: NodeId) -> bool {
    let mut current = Some(id);
    while let Some(node) = current {
        if node == ancestor {
            return true;
        }
        current = nodes[node.0].parent;
    }
    false
}

pub(crate) fn upgrade(tree: &WeakTree) -> Result<TreeRef, DomError> {
    tree.upgrade().ok_or(DomError::DocumentDropped)
}

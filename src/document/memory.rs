//! In-memory document.
//!
//! Nodes live in an arena indexed by [`NodeId`]. Released indices go to a
//! free pool and are handed out again by later creates. Every mutation is
//! appended to a log so callers can observe exactly what a patch touched.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

use super::{Document, NativeListener};
use crate::types::{ListenerId, NodeId};

// =============================================================================
// Types
// =============================================================================

/// One recorded document write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateElement { node: NodeId, tag: String },
    CreateText { node: NodeId, text: String },
    SetAttribute { node: NodeId, name: String, value: String },
    RemoveAttribute { node: NodeId, name: String },
    /// Also recorded for moves.
    InsertChild { parent: NodeId, child: NodeId, index: usize },
    RemoveChild { parent: NodeId, child: NodeId },
    SetText { node: NodeId, text: String },
}

enum NodeKind {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<(ListenerId, String, NativeListener)>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

pub struct MemoryDocument {
    nodes: Vec<Option<NodeData>>,
    free: Vec<usize>,
    body: NodeId,
    next_listener: usize,
    log: Vec<Mutation>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create a document with an empty `<body>` root.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            body: NodeId(0),
            next_listener: 0,
            log: Vec::new(),
        };
        doc.body = doc.create_element("body");
        doc.log.clear();
        doc
    }

    /// Wrap in the shared handle components are constructed with.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.log
    }

    pub fn mutation_count(&self) -> usize {
        self.log.len()
    }

    pub fn clear_mutations(&mut self) {
        self.log.clear();
    }

    /// Nodes currently allocated, the body included.
    pub fn live_node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        super::outer_html(self, node)
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        super::inner_html(self, node)
    }

    pub fn text_content(&self, node: NodeId) -> String {
        super::text_content(self, node)
    }

    // -------------------------------------------------------------------------
    // Arena
    // -------------------------------------------------------------------------

    fn allocate(&mut self, data: NodeData) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(data);
                NodeId(index)
            }
            None => {
                self.nodes.push(Some(data));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn get(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(node.0).and_then(Option::as_mut)
    }

    fn live(&self, node: NodeId, op: &str) -> bool {
        let live = self.contains(node);
        if !live {
            warn!(%node, op, "ignoring operation on a released node");
        }
        live
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == candidate {
                return true;
            }
            match self.get(node).and_then(|data| data.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.get(child).and_then(|data| data.parent) else {
            return;
        };
        if let Some(data) = self.get_mut(parent) {
            data.children.retain(|&c| c != child);
        }
        if let Some(data) = self.get_mut(child) {
            data.parent = None;
        }
    }

    fn free_subtree(&mut self, node: NodeId) {
        let Some(data) = self.nodes.get_mut(node.0).and_then(Option::take) else {
            return;
        };
        self.free.push(node.0);
        for child in data.children {
            self.free_subtree(child);
        }
    }
}

// =============================================================================
// Document
// =============================================================================

impl Document for MemoryDocument {
    fn create_element(&mut self, tag: &str) -> NodeId {
        let node = self.allocate(NodeData::new(NodeKind::Element {
            tag: tag.to_string(),
            attributes: Vec::new(),
        }));
        self.log.push(Mutation::CreateElement { node, tag: tag.to_string() });
        node
    }

    fn create_text_node(&mut self, text: &str) -> NodeId {
        let node = self.allocate(NodeData::new(NodeKind::Text(text.to_string())));
        self.log.push(Mutation::CreateText { node, text: text.to_string() });
        node
    }

    fn contains(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.get(node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match &self.get(node)?.kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if !self.live(node, "set_text") {
            return;
        }
        let Some(NodeData { kind: NodeKind::Text(current), .. }) = self.get_mut(node) else {
            return;
        };
        *current = text.to_string();
        self.log.push(Mutation::SetText { node, text: text.to_string() });
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.get(node)?.kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        match self.get(node).map(|data| &data.kind) {
            Some(NodeKind::Element { attributes, .. }) => attributes.clone(),
            _ => Vec::new(),
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if !self.live(node, "set_attribute") {
            return;
        }
        let Some(NodeData { kind: NodeKind::Element { attributes, .. }, .. }) = self.get_mut(node) else {
            return;
        };
        match attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
        self.log.push(Mutation::SetAttribute {
            node,
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if !self.live(node, "remove_attribute") {
            return;
        }
        let Some(NodeData { kind: NodeKind::Element { attributes, .. }, .. }) = self.get_mut(node) else {
            return;
        };
        let before = attributes.len();
        attributes.retain(|(n, _)| n != name);
        if attributes.len() != before {
            self.log.push(Mutation::RemoveAttribute { node, name: name.to_string() });
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node).map(|data| data.children.clone()).unwrap_or_default()
    }

    fn insert_child(&mut self, parent: NodeId, child: NodeId, index: usize) {
        if !self.live(parent, "insert_child") || !self.live(child, "insert_child") {
            return;
        }
        if self.tag_name(parent).is_none() {
            warn!(%parent, "cannot insert into a text node");
            return;
        }
        if self.is_ancestor_or_self(child, parent) {
            warn!(%parent, %child, "refusing to insert a node into its own subtree");
            return;
        }

        self.detach(child);
        let Some(data) = self.get_mut(parent) else {
            return;
        };
        let index = index.min(data.children.len());
        data.children.insert(index, child);
        if let Some(data) = self.get_mut(child) {
            data.parent = Some(parent);
        }
        self.log.push(Mutation::InsertChild { parent, child, index });
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.parent(child) != Some(parent) {
            warn!(%parent, %child, "remove_child on a node that is not a child");
            return;
        }
        self.detach(child);
        self.log.push(Mutation::RemoveChild { parent, child });
    }

    fn release(&mut self, node: NodeId) {
        if node == self.body {
            warn!("the body cannot be released");
            return;
        }
        if !self.contains(node) {
            return;
        }
        self.detach(node);
        self.free_subtree(node);
    }

    fn add_event_listener(&mut self, node: NodeId, event_type: &str, listener: NativeListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        match self.get_mut(node) {
            Some(data) => data.listeners.push((id, event_type.to_string(), listener)),
            None => warn!(%node, event_type, "listener added to a released node"),
        }
        id
    }

    fn remove_event_listener(&mut self, node: NodeId, id: ListenerId) {
        if let Some(data) = self.get_mut(node) {
            data.listeners.retain(|(existing, _, _)| *existing != id);
        }
    }

    fn event_listeners(&self, node: NodeId, event_type: &str) -> Vec<NativeListener> {
        self.get(node)
            .map(|data| {
                data.listeners
                    .iter()
                    .filter(|(_, t, _)| t == event_type)
                    .map(|(_, _, listener)| Rc::clone(listener))
                    .collect()
            })
            .unwrap_or_default()
    }
}

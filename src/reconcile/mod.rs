//! Reconciler - keeps a live document subtree in step with successive trees.
//!
//! # Architecture
//!
//! ```text
//! prev VNode ──┐
//!              ├── Patcher ──> document writes (create, insert/move, remove,
//! next VNode ──┘                set/remove attribute, set text)
//!                   │
//!                   └── nested placeholders ──> Mount (materialize / unmount)
//! ```
//!
//! Children are matched by key within one parent only. Matched pairs are
//! patched in place, unmatched old children are removed, unmatched new
//! children are created, and the survivors are reordered with the minimum
//! number of moves (everything outside one longest increasing run).
//!
//! Nested components are addressed by [`SlotPath`]: the kind, tag and key of
//! every node from the root down to the placeholder. Two placeholders have
//! the same path exactly when the diff matches them, so a slot survives a
//! re-render precisely when its placeholder does.

mod lis;
mod patch;

use std::collections::HashMap;
use std::rc::Rc;

use crate::config::Config;
use crate::document::Document;
use crate::markup::{VComponent, VElement, VNode, VText};
use crate::types::{Key, NodeId};

pub(crate) use patch::Patcher;

// =============================================================================
// Mount seam
// =============================================================================

/// Something that owns the live subtree behind a placeholder.
pub(crate) trait Mount {
    /// Build the live subtree and return its root, detached.
    fn materialize(&self, doc: &mut dyn Document) -> NodeId;

    /// Tear the subtree down: detach its root, release it, drop listeners.
    fn unmount(&self, doc: &mut dyn Document);

    /// Root of the live subtree while materialized.
    fn mounted_node(&self) -> Option<NodeId>;
}

/// Nested instances by slot.
pub(crate) type Slots<M> = HashMap<SlotPath, Rc<M>>;

// =============================================================================
// Slot paths
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SegmentKind {
    Element,
    Text,
    Component,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Segment {
    kind: SegmentKind,
    name: String,
    key: Key,
}

/// Location of a node by kind, tag and key from the root down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub(crate) struct SlotPath(Vec<Segment>);

impl SlotPath {
    /// Path of `node` as a child of the node at `self`.
    pub fn join(&self, node: &VNode) -> SlotPath {
        let segment = match node {
            VNode::Element(element) => Segment {
                kind: SegmentKind::Element,
                name: element.tag.clone(),
                key: element.key.clone(),
            },
            VNode::Text(text) => Segment {
                kind: SegmentKind::Text,
                name: String::new(),
                key: text.key.clone(),
            },
            VNode::Component(component) => Segment {
                kind: SegmentKind::Component,
                name: component.name.clone(),
                key: component.key.clone(),
            },
        };
        let mut segments = self.0.clone();
        segments.push(segment);
        SlotPath(segments)
    }
}

/// Every placeholder in `tree` with its path, in document order.
pub(crate) fn placeholders(tree: &VNode) -> Vec<(SlotPath, &VComponent)> {
    fn walk<'a>(base: &SlotPath, node: &'a VNode, out: &mut Vec<(SlotPath, &'a VComponent)>) {
        let path = base.join(node);
        match node {
            VNode::Component(component) => out.push((path, component)),
            VNode::Element(element) => {
                for child in &element.children {
                    walk(&path, child, out);
                }
            }
            VNode::Text(_) => {}
        }
    }

    let mut out = Vec::new();
    walk(&SlotPath::default(), tree, &mut out);
    out
}

// =============================================================================
// Entry points
// =============================================================================

/// Build a detached live subtree for `tree`.
pub(crate) fn create<M: Mount + ?Sized>(doc: &mut dyn Document, tree: &VNode, slots: &Slots<M>) -> NodeId {
    Patcher::new(doc, slots, slots, None).create(&SlotPath::default(), tree)
}

/// Patch the live subtree at `live` from `prev` to `next`.
///
/// `old` holds the slots `prev` was rendered with, `new` the slots for
/// `next`. `retain` names a node that is detached but never released.
/// Returns the subtree root, which differs from `live` when the root was
/// replaced.
pub(crate) fn patch<M: Mount + ?Sized>(
    doc: &mut dyn Document,
    live: NodeId,
    prev: &VNode,
    next: &VNode,
    old: &Slots<M>,
    new: &Slots<M>,
    retain: Option<NodeId>,
) -> NodeId {
    Patcher::new(doc, old, new, retain).patch_node(&SlotPath::default(), live, prev, next)
}

// =============================================================================
// Read-back
// =============================================================================

/// Read the live subtree at `node` back into a tree.
///
/// Every live child is kept, whitespace included, so the result lines up
/// one-to-one with the document. Keys come from the configured key
/// attribute, falling back to position.
pub fn read_tree(doc: &dyn Document, node: NodeId, config: &Config) -> Option<VNode> {
    read_node(doc, node, 0, config)
}

fn read_node(doc: &dyn Document, node: NodeId, position: usize, config: &Config) -> Option<VNode> {
    if let Some(text) = doc.text(node) {
        return Some(VNode::Text(VText {
            key: Key::Index(position),
            text: text.to_string(),
        }));
    }

    let tag = doc.tag_name(node)?.to_string();
    let attributes: std::collections::BTreeMap<String, String> = doc.attributes(node).into_iter().collect();
    let key = attributes
        .get(&config.key_attribute)
        .map_or(Key::Index(position), |value| Key::Explicit(value.clone()));
    let children = doc
        .children(node)
        .into_iter()
        .enumerate()
        .filter_map(|(index, child)| read_node(doc, child, index, config))
        .collect();

    Some(VNode::Element(VElement {
        tag,
        key,
        attributes,
        children,
    }))
}

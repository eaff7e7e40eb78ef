//! Document Adapter - the host tree the framework writes into.
//!
//! Components never touch a concrete document type. Every create, insert,
//! attribute write and listener registration goes through [`Document`], so a
//! browser binding, a server-side tree or the in-memory [`MemoryDocument`]
//! all drive the same lifecycle code.
//!
//! # Example
//!
//! ```
//! use spark_dom::document::{Document, MemoryDocument, outer_html};
//!
//! let mut doc = MemoryDocument::new();
//! let body = doc.body();
//! let p = doc.create_element("p");
//! let text = doc.create_text_node("hi");
//! doc.insert_child(p, text, 0);
//! doc.insert_child(body, p, 0);
//! assert_eq!(outer_html(&doc, p), "<p>hi</p>");
//! ```

mod memory;
mod selector;

use std::cell::RefCell;
use std::rc::Rc;

use crate::events::Event;
use crate::markup::{escape_text, write_close_tag, write_open_tag};
use crate::types::{ListenerId, NodeId};

pub use memory::{MemoryDocument, Mutation};
pub use selector::{Selector, query_selector, query_selector_all};

/// A callback registered natively on a document node.
pub type NativeListener = Rc<dyn Fn(&Event)>;

/// A document shared between every component attached into it.
pub type SharedDocument = Rc<RefCell<dyn Document>>;

// =============================================================================
// Document trait
// =============================================================================

/// Operations the framework needs from a host document.
///
/// Node handles that do not name a live node are ignored by mutating
/// operations and yield `None` or empty results from queries.
pub trait Document {
    fn create_element(&mut self, tag: &str) -> NodeId;

    fn create_text_node(&mut self, text: &str) -> NodeId;

    /// Whether `node` names a live node.
    fn contains(&self, node: NodeId) -> bool;

    /// Tag name of an element, `None` for text nodes.
    fn tag_name(&self, node: NodeId) -> Option<&str>;

    /// Content of a text node, `None` for elements.
    fn text(&self, node: NodeId) -> Option<&str>;

    fn set_text(&mut self, node: NodeId, text: &str);

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    /// Attributes in insertion order.
    fn attributes(&self, node: NodeId) -> Vec<(String, String)>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    fn remove_attribute(&mut self, node: NodeId, name: &str);

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Insert `child` under `parent` at `index` (clamped to the child count).
    ///
    /// A child that already has a parent is detached first, so this also
    /// moves nodes. Inserting a node into its own subtree is ignored.
    fn insert_child(&mut self, parent: NodeId, child: NodeId, index: usize);

    /// Detach `child` from `parent`. The node stays alive until released.
    fn remove_child(&mut self, parent: NodeId, child: NodeId);

    /// Free a detached subtree. Documents without explicit ownership may
    /// leave this as a no-op.
    fn release(&mut self, _node: NodeId) {}

    fn add_event_listener(&mut self, node: NodeId, event_type: &str, listener: NativeListener) -> ListenerId;

    fn remove_event_listener(&mut self, node: NodeId, id: ListenerId);

    /// Listeners for `event_type` on `node`, in registration order.
    fn event_listeners(&self, node: NodeId, event_type: &str) -> Vec<NativeListener>;

    /// Append `child` as the last child of `parent`.
    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, child, len);
    }

    /// Position of `node` among its parent's children.
    fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&child| child == node)
    }
}

// =============================================================================
// Serialization
// =============================================================================

/// Markup of `node` and its subtree.
pub fn outer_html(doc: &dyn Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

/// Markup of the children of `node`.
pub fn inner_html(doc: &dyn Document, node: NodeId) -> String {
    let mut out = String::new();
    for child in doc.children(node) {
        write_node(doc, child, &mut out);
    }
    out
}

/// Concatenated text of every text node under `node`.
pub fn text_content(doc: &dyn Document, node: NodeId) -> String {
    if let Some(text) = doc.text(node) {
        return text.to_string();
    }
    doc.children(node)
        .into_iter()
        .map(|child| text_content(doc, child))
        .collect()
}

fn write_node(doc: &dyn Document, node: NodeId, out: &mut String) {
    if let Some(text) = doc.text(node) {
        out.push_str(&escape_text(text));
        return;
    }
    let Some(tag) = doc.tag_name(node) else {
        return;
    };
    let attributes = doc.attributes(node);
    write_open_tag(out, tag, attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    for child in doc.children(node) {
        write_node(doc, child, out);
    }
    write_close_tag(out, tag);
}

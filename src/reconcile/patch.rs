use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, error, trace, warn};

use super::lis::longest_increasing_subsequence;
use super::{Mount, SlotPath, Slots};
use crate::document::Document;
use crate::markup::{VElement, VNode};
use crate::types::{Key, NodeId};

/// Applies one tree transition to a live subtree.
///
/// Every method takes the path of the node's *parent* as `base`.
pub(crate) struct Patcher<'a, M: Mount + ?Sized> {
    doc: &'a mut dyn Document,
    old: &'a Slots<M>,
    new: &'a Slots<M>,
    retain: Option<NodeId>,
}

impl<'a, M: Mount + ?Sized> Patcher<'a, M> {
    pub fn new(doc: &'a mut dyn Document, old: &'a Slots<M>, new: &'a Slots<M>, retain: Option<NodeId>) -> Self {
        Self { doc, old, new, retain }
    }

    // =========================================================================
    // Create
    // =========================================================================

    pub fn create(&mut self, base: &SlotPath, node: &VNode) -> NodeId {
        match node {
            VNode::Text(text) => self.doc.create_text_node(&text.text),
            VNode::Element(element) => {
                let path = base.join(node);
                let live = self.doc.create_element(&element.tag);
                for (name, value) in &element.attributes {
                    self.doc.set_attribute(live, name, value);
                }
                for child in &element.children {
                    let child_node = self.create(&path, child);
                    self.doc.append_child(live, child_node);
                }
                live
            }
            VNode::Component(component) => {
                let path = base.join(node);
                match self.new.get(&path) {
                    Some(slot) => match slot.mounted_node().filter(|&n| self.doc.contains(n)) {
                        // kept across a rebuild
                        Some(existing) => existing,
                        None => slot.materialize(&mut *self.doc),
                    },
                    None => {
                        error!(name = %component.name, key = %component.key, "no instance prepared for placeholder");
                        self.doc.create_element(&component.name)
                    }
                }
            }
        }
    }

    // =========================================================================
    // Patch
    // =========================================================================

    pub fn patch_node(&mut self, base: &SlotPath, live: NodeId, prev: &VNode, next: &VNode) -> NodeId {
        if !prev.same_kind(next) || prev.key() != next.key() {
            return self.replace(base, live, prev, next);
        }

        match (prev, next) {
            (VNode::Text(a), VNode::Text(b)) => {
                if a.text != b.text {
                    self.doc.set_text(live, &b.text);
                }
            }
            (VNode::Element(a), VNode::Element(b)) => {
                self.patch_attributes(live, a, b);
                let path = base.join(next);
                self.patch_children(&path, live, &a.children, &b.children);
            }
            // props flow to the nested instance after the patch completes
            _ => {}
        }
        live
    }

    fn replace(&mut self, base: &SlotPath, live: NodeId, prev: &VNode, next: &VNode) -> NodeId {
        trace!(%live, from = ?prev.tag(), to = ?next.tag(), "replace");
        let fresh = self.create(base, next);
        if let Some(parent) = self.doc.parent(live) {
            let index = self.doc.index_in_parent(live).unwrap_or(0);
            self.doc.insert_child(parent, fresh, index);
        }
        self.remove(base, live, prev);
        fresh
    }

    fn patch_attributes(&mut self, live: NodeId, prev: &VElement, next: &VElement) {
        for name in prev.attributes.keys() {
            if !next.attributes.contains_key(name) {
                self.doc.remove_attribute(live, name);
            }
        }
        for (name, value) in &next.attributes {
            if prev.attributes.get(name) != Some(value) {
                self.doc.set_attribute(live, name, value);
            }
        }
    }

    // =========================================================================
    // Children
    // =========================================================================

    fn patch_children(&mut self, path: &SlotPath, live: NodeId, prev: &[VNode], next: &[VNode]) {
        let Some(aligned) = self.align(path, live, prev) else {
            warn!(%live, "live children out of step with the previous tree, rebuilding");
            self.rebuild_children(path, live, prev, next);
            return;
        };

        let by_key: HashMap<&Key, usize> = prev.iter().enumerate().map(|(j, child)| (child.key(), j)).collect();
        let mut matched = vec![false; prev.len()];
        let sources: Vec<Option<usize>> = next
            .iter()
            .map(|child| {
                let j = *by_key.get(child.key())?;
                (prev[j].same_kind(child) && aligned[j].is_some()).then(|| {
                    matched[j] = true;
                    j
                })
            })
            .collect();

        for (j, child) in prev.iter().enumerate() {
            if matched[j] {
                continue;
            }
            if let Some(node) = aligned[j] {
                self.remove(path, node, child);
            }
        }

        for (i, source) in sources.iter().enumerate() {
            if let (Some(j), Some(node)) = (*source, source.and_then(|j| aligned[j])) {
                self.patch_node(path, node, &prev[j], &next[i]);
            }
        }

        // Reorder. Survivors in one longest increasing run of old positions
        // stay put; everything else is inserted before its right neighbour.
        let surviving: Vec<usize> = (0..next.len()).filter(|&i| sources[i].is_some()).collect();
        let old_positions: Vec<usize> = surviving.iter().filter_map(|&i| sources[i]).collect();
        let mut stable = vec![false; next.len()];
        for position in longest_increasing_subsequence(&old_positions) {
            stable[surviving[position]] = true;
        }

        let mut current = self.doc.children(live);
        let mut anchor: Option<NodeId> = None;
        for i in (0..next.len()).rev() {
            let node = match sources[i].and_then(|j| aligned[j]) {
                Some(node) if stable[i] => {
                    anchor = Some(node);
                    continue;
                }
                Some(node) => node,
                None => self.create(path, &next[i]),
            };
            if let Some(position) = current.iter().position(|&n| n == node) {
                current.remove(position);
            }
            let index = anchor
                .and_then(|a| current.iter().position(|&n| n == a))
                .unwrap_or(current.len());
            self.doc.insert_child(live, node, index);
            current.insert(index, node);
            anchor = Some(node);
        }
    }

    /// Pair each previous child with its live node.
    ///
    /// Placeholders whose instance is no longer mounted have no live node.
    /// Returns `None` when the live children cannot be lined up.
    fn align(&self, path: &SlotPath, live: NodeId, prev: &[VNode]) -> Option<Vec<Option<NodeId>>> {
        let children = self.doc.children(live);
        let mut remaining = children.iter().copied();
        let mut aligned = Vec::with_capacity(prev.len());
        for child in prev {
            let unmounted = matches!(child, VNode::Component(_))
                && self
                    .old
                    .get(&path.join(child))
                    .is_some_and(|slot| slot.mounted_node().is_none());
            if unmounted {
                aligned.push(None);
            } else {
                aligned.push(Some(remaining.next()?));
            }
        }
        remaining.next().is_none().then_some(aligned)
    }

    fn rebuild_children(&mut self, path: &SlotPath, live: NodeId, prev: &[VNode], next: &[VNode]) {
        for child in prev {
            self.discard_slots(path, child);
        }
        for child in self.doc.children(live) {
            self.detach_and_release(child);
        }
        for child in next {
            let node = self.create(path, child);
            self.doc.append_child(live, node);
        }
    }

    // =========================================================================
    // Remove
    // =========================================================================

    fn remove(&mut self, base: &SlotPath, live: NodeId, prev: &VNode) {
        if let VNode::Component(_) = prev {
            let path = base.join(prev);
            if let Some(slot) = self.old.get(&path).filter(|slot| slot.mounted_node() == Some(live)) {
                let slot = Rc::clone(slot);
                self.discard(&path, &slot);
                return;
            }
        } else {
            self.discard_slots(base, prev);
        }
        self.detach_and_release(live);
    }

    /// Unmount every nested instance under `node`, or detach it if the next
    /// tree keeps it.
    fn discard_slots(&mut self, base: &SlotPath, node: &VNode) {
        let path = base.join(node);
        match node {
            VNode::Component(_) => {
                if let Some(slot) = self.old.get(&path).cloned() {
                    self.discard(&path, &slot);
                }
            }
            VNode::Element(element) => {
                for child in &element.children {
                    self.discard_slots(&path, child);
                }
            }
            VNode::Text(_) => {}
        }
    }

    fn discard(&mut self, path: &SlotPath, slot: &Rc<M>) {
        let kept = self
            .new
            .get(path)
            .is_some_and(|next| std::ptr::addr_eq(Rc::as_ptr(next), Rc::as_ptr(slot)));
        match slot.mounted_node() {
            Some(node) if kept => {
                if let Some(parent) = self.doc.parent(node) {
                    self.doc.remove_child(parent, node);
                }
            }
            Some(_) => slot.unmount(&mut *self.doc),
            None => {}
        }
    }

    fn detach_and_release(&mut self, node: NodeId) {
        if let Some(parent) = self.doc.parent(node) {
            self.doc.remove_child(parent, node);
        }
        if self.retain == Some(node) {
            debug!(%node, "keeping adopted node alive");
        } else {
            self.doc.release(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::document::{MemoryDocument, Mutation};
    use crate::markup::build_tree;
    use crate::reconcile::{create, patch, read_tree};
    use proptest::prelude::*;

    fn tree(markup: &str) -> VNode {
        build_tree(markup, |_| false, &Config::default()).unwrap()
    }

    fn empty() -> Slots<dyn Mount> {
        Slots::new()
    }

    /// Mount `markup` under the body, returning the subtree root.
    fn mount(doc: &mut MemoryDocument, markup: &str) -> (NodeId, VNode) {
        let t = tree(markup);
        let node = create(doc, &t, &empty());
        let body = doc.body();
        doc.append_child(body, node);
        doc.clear_mutations();
        (node, t)
    }

    fn apply(doc: &mut MemoryDocument, live: NodeId, prev: &VNode, next: &str) -> NodeId {
        let next = tree(next);
        let slots = empty();
        patch(doc, live, prev, &next, &slots, &slots, None)
    }

    #[test]
    fn test_equal_trees_write_nothing() {
        let mut doc = MemoryDocument::new();
        let markup = r#"<ul class="x"><li data-hkey="a">a</li><li data-hkey="b">b</li>text</ul>"#;
        let (live, prev) = mount(&mut doc, markup);
        assert_eq!(apply(&mut doc, live, &prev, markup), live);
        assert_eq!(doc.mutation_count(), 0);
    }

    #[test]
    fn test_text_updates_in_place() {
        let mut doc = MemoryDocument::new();
        let (live, prev) = mount(&mut doc, "<p>0</p>");
        let text = doc.children(live)[0];
        apply(&mut doc, live, &prev, "<p>10</p>");
        assert_eq!(doc.mutations(), &[Mutation::SetText { node: text, text: "10".into() }]);
    }

    #[test]
    fn test_attribute_diff() {
        let mut doc = MemoryDocument::new();
        let (live, prev) = mount(&mut doc, r#"<a href="/a" title="t" id="x"></a>"#);
        apply(&mut doc, live, &prev, r#"<a href="/b" id="x" rel="next"></a>"#);
        assert_eq!(
            doc.mutations(),
            &[
                Mutation::RemoveAttribute { node: live, name: "title".into() },
                Mutation::SetAttribute { node: live, name: "href".into(), value: "/b".into() },
                Mutation::SetAttribute { node: live, name: "rel".into(), value: "next".into() },
            ]
        );
    }

    #[test]
    fn test_tag_change_replaces_root_in_place() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        let (live, prev) = mount(&mut doc, "<p>x</p>");
        let replaced = apply(&mut doc, live, &prev, "<div>x</div>");
        assert_ne!(replaced, live);
        assert_eq!(doc.children(body), vec![replaced]);
        assert!(!doc.contains(live));
        assert_eq!(doc.inner_html(body), "<div>x</div>");
    }

    #[test]
    fn test_keyed_move_is_a_single_insert() {
        let mut doc = MemoryDocument::new();
        let (live, prev) = mount(
            &mut doc,
            r#"<ul><li data-hkey="a">a</li><li data-hkey="b">b</li><li data-hkey="c">c</li></ul>"#,
        );
        let before = doc.children(live);
        apply(
            &mut doc,
            live,
            &prev,
            r#"<ul><li data-hkey="c">c</li><li data-hkey="a">a</li><li data-hkey="b">b</li></ul>"#,
        );
        assert_eq!(doc.children(live), vec![before[2], before[0], before[1]]);
        assert_eq!(
            doc.mutations(),
            &[Mutation::InsertChild { parent: live, child: before[2], index: 0 }]
        );
    }

    #[test]
    fn test_removed_child_is_released() {
        let mut doc = MemoryDocument::new();
        let (live, prev) = mount(&mut doc, r#"<ul><li data-hkey="a">a</li><li data-hkey="b">b</li></ul>"#);
        let nodes_before = doc.live_node_count();
        let removed = doc.children(live)[0];
        apply(&mut doc, live, &prev, r#"<ul><li data-hkey="b">b</li></ul>"#);
        assert!(!doc.contains(removed));
        assert_eq!(doc.live_node_count(), nodes_before - 2);
    }

    #[test]
    fn test_retained_root_is_detached_not_released() {
        let mut doc = MemoryDocument::new();
        let (live, prev) = mount(&mut doc, "<p>x</p>");
        let next = tree("<div/>");
        let slots = empty();
        let replaced = patch(&mut doc, live, &prev, &next, &slots, &slots, Some(live));
        assert_ne!(replaced, live);
        assert!(doc.contains(live));
        assert_eq!(doc.parent(live), None);
    }

    #[test]
    fn test_out_of_step_children_are_rebuilt() {
        let mut doc = MemoryDocument::new();
        let (live, prev) = mount(&mut doc, "<ul><li>a</li><li>b</li></ul>");
        let before = doc.live_node_count();
        let stray = doc.create_element("hr");
        doc.append_child(live, stray);
        apply(&mut doc, live, &prev, "<ul><li>a</li></ul>");
        assert_eq!(doc.inner_html(live), "<li>a</li>");
        // The stray's slot may be reused by the rebuild, so count instead.
        assert_eq!(doc.live_node_count(), before - 2);
        assert_ne!(doc.tag_name(stray), Some("hr"));
    }

    // -------------------------------------------------------------------------
    // Property: patching any tree into any other yields the other
    // -------------------------------------------------------------------------

    fn arb_tree() -> impl Strategy<Value = String> {
        let leaf = prop_oneof!["[a-z]{1,3}", Just("<br>".to_string())];
        leaf.prop_recursive(3, 24, 5, |inner| {
            (
                prop::sample::select(vec!["div", "p", "span"]),
                prop::collection::vec((inner, prop::option::of(0u8..6)), 0..5),
                prop::option::of("[a-c]"),
            )
                .prop_map(|(tag, children, class)| {
                    let mut out = format!("<{tag}");
                    if let Some(class) = class {
                        out.push_str(&format!(r#" class="{class}""#));
                    }
                    out.push('>');
                    let mut used = std::collections::HashSet::new();
                    for (child, key) in children {
                        match key.filter(|k| child.starts_with('<') && used.insert(*k)) {
                            Some(key) => out.push_str(&child.replacen('>', &format!(r#" data-hkey="k{key}">"#), 1)),
                            None => out.push_str(&child),
                        }
                    }
                    out.push_str(&format!("</{tag}>"));
                    out
                })
        })
    }

    fn rooted(markup: String) -> String {
        format!("<section>{markup}</section>")
    }

    proptest! {
        #[test]
        fn test_patch_reaches_next_tree(a in arb_tree(), b in arb_tree()) {
            let mut doc = MemoryDocument::new();
            let (live, prev) = mount(&mut doc, &rooted(a));
            let next = tree(&rooted(b));
            let slots = empty();
            let result = patch(&mut doc, live, &prev, &next, &slots, &slots, None);
            prop_assert_eq!(read_tree(&doc, result, &Config::default()), Some(next));
        }

        #[test]
        fn test_patching_equal_trees_writes_nothing(a in arb_tree()) {
            let mut doc = MemoryDocument::new();
            let (live, prev) = mount(&mut doc, &rooted(a));
            let slots = empty();
            let result = patch(&mut doc, live, &prev, &prev.clone(), &slots, &slots, None);
            prop_assert_eq!(result, live);
            prop_assert_eq!(doc.mutation_count(), 0);
        }
    }
}

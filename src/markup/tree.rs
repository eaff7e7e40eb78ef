//! Structured Node Tree - the in-memory result of one render.
//!
//! A tree is an immutable snapshot: every render builds a fresh one, the
//! controller keeps the previous tree only until the next patch completes.
//! Trees compare by value, which is how unchanged renders are detected.

use std::collections::{BTreeMap, HashSet};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{Key, Props};
use super::parser::{self, RawElement, RawNode};
use super::serialize::{escape_text, is_void, write_close_tag, write_open_tag};

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VNode {
    Element(VElement),
    Text(VText),
    /// Placeholder for a nested component, resolved through `components`.
    Component(VComponent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VElement {
    pub tag: String,
    pub key: Key,
    /// Includes the key attribute when the key is explicit.
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<VNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VText {
    pub key: Key,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VComponent {
    /// Placeholder tag, i.e. the name the component is registered under.
    pub name: String,
    pub key: Key,
    /// Placeholder attributes without the key attribute.
    pub props: Props,
}

impl VNode {
    pub fn key(&self) -> &Key {
        match self {
            Self::Element(element) => &element.key,
            Self::Text(text) => &text.key,
            Self::Component(component) => &component.key,
        }
    }

    /// Element tag or placeholder name.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Element(element) => Some(&element.tag),
            Self::Component(component) => Some(&component.name),
            Self::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            Self::Element(element) => &element.children,
            _ => &[],
        }
    }

    pub fn as_element(&self) -> Option<&VElement> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Same node type and tag: the patcher may reuse the live node.
    pub fn same_kind(&self, other: &VNode) -> bool {
        match (self, other) {
            (Self::Element(a), Self::Element(b)) => a.tag == b.tag,
            (Self::Component(a), Self::Component(b)) => a.name == b.name,
            (Self::Text(_), Self::Text(_)) => true,
            _ => false,
        }
    }

    /// Concatenated text of this subtree. Placeholders contribute nothing.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(&text.text),
            Self::Element(element) => element.children.iter().for_each(|c| c.collect_text(out)),
            Self::Component(_) => {}
        }
    }

    /// Serialize back to markup with attributes in sorted order.
    ///
    /// Placeholders serialize as self-closing tags carrying their props.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(&escape_text(&text.text)),
            Self::Element(element) => {
                write_open_tag(
                    out,
                    &element.tag,
                    element.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                );
                for child in &element.children {
                    child.write_markup(out);
                }
                write_close_tag(out, &element.tag);
            }
            Self::Component(component) => {
                write_open_tag(
                    out,
                    &component.name,
                    component.props.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                );
                // `<name ...>` becomes `<name .../>`
                out.pop();
                out.push_str("/>");
            }
        }
    }
}

// =============================================================================
// Tree Builder
// =============================================================================

/// Build a [`VNode`] tree from render output.
///
/// `is_component` decides which tags are nested-component placeholders.
/// The markup must contain exactly one root element, and that root may not
/// itself be a placeholder.
pub fn build_tree(markup: &str, is_component: impl Fn(&str) -> bool, config: &Config) -> Result<VNode> {
    let nodes = parser::parse(markup)?;
    let mut roots = nodes.into_iter().filter(|node| !node.is_blank_text());

    let root = match roots.next() {
        Some(RawNode::Element(element)) => element,
        Some(RawNode::Text { offset, .. }) => {
            return Err(Error::markup(offset, "text outside of the root element"));
        }
        None => return Err(Error::markup(markup.len(), "expected a root element")),
    };
    if let Some(extra) = roots.next() {
        return Err(Error::markup(extra.offset(), "more than one root element"));
    }
    if is_component(&root.tag) {
        return Err(Error::markup(
            root.offset,
            format!("root element <{}> cannot be a nested component", root.tag),
        ));
    }

    let builder = Builder { is_component: &is_component, config };
    builder.element(root, 0)
}

struct Builder<'a, F: Fn(&str) -> bool> {
    is_component: &'a F,
    config: &'a Config,
}

impl<F: Fn(&str) -> bool> Builder<'_, F> {
    fn key(&self, attributes: &[(String, String)], position: usize) -> Key {
        attributes
            .iter()
            .find(|(name, _)| *name == self.config.key_attribute)
            .map_or(Key::Index(position), |(_, value)| Key::Explicit(value.clone()))
    }

    fn element(&self, raw: RawElement, position: usize) -> Result<VNode> {
        let key = self.key(&raw.attributes, position);

        if (self.is_component)(&raw.tag) {
            if raw.children.iter().any(|child| !child.is_blank_text()) {
                return Err(Error::markup(
                    raw.offset,
                    format!("<{}> is a nested component and cannot have children", raw.tag),
                ));
            }
            let props = raw
                .attributes
                .into_iter()
                .filter(|(name, _)| *name != self.config.key_attribute)
                .collect();
            return Ok(VNode::Component(VComponent { name: raw.tag, key, props }));
        }

        if is_void(&raw.tag) && !raw.children.is_empty() {
            return Err(Error::markup(raw.offset, format!("void element <{}> has children", raw.tag)));
        }

        let children = raw
            .children
            .into_iter()
            .filter(|child| self.config.preserve_whitespace || !child.is_blank_text())
            .enumerate()
            .map(|(index, child)| match child {
                RawNode::Element(element) => self.element(element, index),
                RawNode::Text { text, .. } => Ok(VNode::Text(VText { key: Key::Index(index), text })),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(VNode::Element(VElement {
            tag: raw.tag,
            key,
            attributes: raw.attributes.into_iter().collect(),
            children,
        }))
    }
}

// =============================================================================
// Key validation
// =============================================================================

/// Check that no two siblings anywhere in the tree share a key.
pub fn validate_keys(tree: &VNode) -> Result<()> {
    let VNode::Element(element) = tree else {
        return Ok(());
    };

    let mut seen = HashSet::with_capacity(element.children.len());
    for child in &element.children {
        if !seen.insert(child.key()) {
            return Err(Error::KeyCollision {
                key: child.key().clone(),
                parent: element.tag.clone(),
            });
        }
    }
    element.children.iter().try_for_each(validate_keys)
}

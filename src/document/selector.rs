//! Simple selectors for event delegation.
//!
//! Supported: `tag`, `*`, `.class`, `#id`, `[attr]`, `[attr=value]`, any
//! compound of those (`button.primary[type=submit]`), and comma-separated
//! groups. Combinators are rejected.

use std::fmt;
use std::str::FromStr;

use super::Document;
use crate::error::{Error, Result};
use crate::types::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Simple {
    Tag(String),
    Universal,
    Class(String),
    Id(String),
    Attribute { name: String, value: Option<String> },
}

/// A parsed selector group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    groups: Vec<Vec<Simple>>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self> {
        let groups = source
            .split(',')
            .map(|group| parse_compound(source, group.trim()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            source: source.trim().to_string(),
            groups,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the element `node` matches any group.
    pub fn matches(&self, doc: &dyn Document, node: NodeId) -> bool {
        let Some(tag) = doc.tag_name(node) else {
            return false;
        };
        self.groups
            .iter()
            .any(|group| group.iter().all(|simple| matches_simple(doc, node, tag, simple)))
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn matches_simple(doc: &dyn Document, node: NodeId, tag: &str, simple: &Simple) -> bool {
    match simple {
        Simple::Universal => true,
        Simple::Tag(expected) => expected.eq_ignore_ascii_case(tag),
        Simple::Id(id) => doc.attribute(node, "id") == Some(id.as_str()),
        Simple::Class(class) => doc
            .attribute(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class)),
        Simple::Attribute { name, value } => match (doc.attribute(node, name), value) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        },
    }
}

// =============================================================================
// Parsing
// =============================================================================

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_')
}

fn take_ident<'a>(selector: &str, rest: &mut &'a str, what: &str) -> Result<&'a str> {
    let end = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
    if end == 0 {
        return Err(Error::selector(selector, format!("expected {what}")));
    }
    let (ident, tail) = rest.split_at(end);
    *rest = tail;
    Ok(ident)
}

fn parse_compound(selector: &str, group: &str) -> Result<Vec<Simple>> {
    if group.is_empty() {
        return Err(Error::selector(selector, "empty selector"));
    }

    let mut parts = Vec::new();
    let mut rest = group;

    if let Some(tail) = rest.strip_prefix('*') {
        parts.push(Simple::Universal);
        rest = tail;
    } else if rest.starts_with(is_ident_char) {
        parts.push(Simple::Tag(take_ident(selector, &mut rest, "tag name")?.to_string()));
    }

    while let Some(c) = rest.chars().next() {
        rest = &rest[c.len_utf8()..];
        match c {
            '.' => parts.push(Simple::Class(take_ident(selector, &mut rest, "class name")?.to_string())),
            '#' => parts.push(Simple::Id(take_ident(selector, &mut rest, "id")?.to_string())),
            '[' => {
                let close = rest
                    .find(']')
                    .ok_or_else(|| Error::selector(selector, "unterminated attribute selector"))?;
                let body = &rest[..close];
                rest = &rest[close + 1..];
                parts.push(parse_attribute(selector, body)?);
            }
            c if c.is_whitespace() || matches!(c, '>' | '+' | '~') => {
                return Err(Error::selector(selector, "combinators are not supported"));
            }
            c => return Err(Error::selector(selector, format!("unexpected `{c}`"))),
        }
    }
    Ok(parts)
}

fn parse_attribute(selector: &str, body: &str) -> Result<Simple> {
    let (name, value) = match body.split_once('=') {
        Some((name, value)) => {
            let value = value.trim();
            let unquoted = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (name.trim(), Some(unquoted.to_string()))
        }
        None => (body.trim(), None),
    };
    if name.is_empty() || !name.chars().all(|c| is_ident_char(c) || c == ':') {
        return Err(Error::selector(selector, format!("invalid attribute name `{name}`")));
    }
    Ok(Simple::Attribute {
        name: name.to_string(),
        value,
    })
}

// =============================================================================
// Queries
// =============================================================================

/// First descendant of `root` matching `selector`, in document order.
pub fn query_selector(doc: &dyn Document, root: NodeId, selector: &Selector) -> Option<NodeId> {
    let mut stack: Vec<NodeId> = doc.children(root).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        if selector.matches(doc, node) {
            return Some(node);
        }
        stack.extend(doc.children(node).into_iter().rev());
    }
    None
}

/// Every descendant of `root` matching `selector`, in document order.
pub fn query_selector_all(doc: &dyn Document, root: NodeId, selector: &Selector) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack: Vec<NodeId> = doc.children(root).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        if selector.matches(doc, node) {
            found.push(node);
        }
        stack.extend(doc.children(node).into_iter().rev());
    }
    found
}

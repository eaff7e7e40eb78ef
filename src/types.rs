//! Core types shared by the tree builder, the patcher and the lifecycle controller.

use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Node handles
// =============================================================================

/// Handle to a node owned by a [`Document`](crate::document::Document).
///
/// Handles are plain indices. A document may hand a released index out again,
/// so a handle is only meaningful while the node it names is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Handle to a native listener registered on a document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub usize);

// =============================================================================
// Keys
// =============================================================================

/// Sibling identity used to match nodes across renders.
///
/// Explicit keys come from the key attribute (`data-hkey` by default).
/// Everything else falls back to its position in the parent's child list,
/// which is only stable for as long as the siblings before it are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Explicit(String),
    Index(usize),
}

impl Key {
    /// The literal key attribute value, if this key is explicit.
    pub fn as_explicit(&self) -> Option<&str> {
        match self {
            Self::Explicit(value) => Some(value),
            Self::Index(_) => None,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(value) => f.write_str(value),
            Self::Index(index) => write!(f, "#{index}"),
        }
    }
}

impl PartialEq<str> for Key {
    fn eq(&self, other: &str) -> bool {
        self.as_explicit() == Some(other)
    }
}

impl PartialEq<&str> for Key {
    fn eq(&self, other: &&str) -> bool {
        self.as_explicit() == Some(*other)
    }
}

// =============================================================================
// Props
// =============================================================================

/// Externally supplied component inputs.
///
/// Nested components receive the attributes of their placeholder tag, so props
/// are string-valued and ordered for value comparison.
pub type Props = BTreeMap<String, String>;

/// Build [`Props`] from key/value pairs.
///
/// ```
/// let props = spark_dom::props([("greeting", "hi")]);
/// assert_eq!(props["greeting"], "hi");
/// ```
pub fn props<I, K, V>(pairs: I) -> Props
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

// =============================================================================
// Lifecycle (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Lifecycle state of a component instance.
    ///
    /// A freshly constructed instance has no flags set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Lifecycle: u8 {
        /// Tree rendered ahead of insertion (nested components only).
        const PREPARED = 1 << 0;
        /// Owns a live node.
        const ATTACHED = 1 << 1;
        /// The live node pre-existed and was adopted rather than created.
        const ADOPTED = 1 << 2;
        /// Terminal.
        const DESTROYED = 1 << 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_compares_with_literal() {
        assert_eq!(Key::Explicit("foo".into()), "foo");
        assert_ne!(Key::Index(0), "0");
        assert_eq!(Key::Index(3).to_string(), "#3");
    }

    #[test]
    fn test_explicit_and_positional_keys_differ() {
        assert_ne!(Key::Explicit("0".into()), Key::Index(0));
    }

    #[test]
    fn test_props_builder() {
        let props = props([("a", "1"), ("b", "2")]);
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("b").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_lifecycle_flags() {
        let mut state = Lifecycle::default();
        assert!(state.is_empty());
        state |= Lifecycle::ATTACHED | Lifecycle::ADOPTED;
        state.remove(Lifecycle::ATTACHED);
        assert!(state.contains(Lifecycle::ADOPTED));
        assert!(!state.contains(Lifecycle::ATTACHED));
    }
}

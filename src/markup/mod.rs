//! Markup - render output to structured trees.
//!
//! # Architecture
//!
//! ```text
//! render(props, data) -> String
//!        |
//!   parser::parse      raw elements + text, byte offsets for errors
//!        |
//!   tree::build_tree   keys, placeholders, whitespace filtering
//!        |
//!      VNode           compared by value, diffed by the reconciler
//! ```

mod parser;
mod serialize;
mod tree;

pub use serialize::{VOID_ELEMENTS, escape_attribute, escape_text, is_void};
pub use tree::{VComponent, VElement, VNode, VText, build_tree, validate_keys};

pub(crate) use serialize::{write_close_tag, write_open_tag};

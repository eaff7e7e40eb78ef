//! # spark-dom
//!
//! Keyed component framework that renders markup into a live document tree.
//!
//! ## Architecture
//!
//! Components declare markup as a function of their props and data. Every
//! render is parsed into a structured tree, diffed against the previous one
//! by key, and applied to the live document as a minimal set of writes:
//! ```text
//! render(props, data) → markup → VNode tree → keyed diff → Document writes
//!                                     │
//!                       nested placeholders → child components
//! ```
//!
//! Everything runs synchronously on one thread. A data change re-renders
//! before the call that made it returns, and renders whose tree is unchanged
//! are suppressed entirely.
//!
//! ## Modules
//!
//! - [`types`] - Node handles, keys, props, lifecycle flags
//! - [`markup`] - Markup parser and tree builder
//! - [`document`] - Document adapter trait, selectors, in-memory document
//! - [`reconcile`] - Keyed diff and patch
//! - [`events`] - Events, bubbling dispatch, listener registry
//! - [`component`] - Component definitions and the lifecycle controller

pub mod component;
pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod markup;
pub mod reconcile;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use component::{Component, ComponentDef, Handler, Hook, handler};
pub use config::Config;
pub use document::{Document, MemoryDocument, Mutation, NativeListener, Selector, SharedDocument};
pub use error::{Error, Result};
pub use events::{Event, click, dispatch_event};
pub use markup::{VNode, build_tree, validate_keys};
pub use reconcile::read_tree;

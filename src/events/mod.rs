//! Events - native dispatch and component-level delegation.
//!
//! Components register one native listener per event type on their root
//! node. When it fires, the component walks from the event target up to its
//! root and runs every registration whose selector matches a node on that
//! path. See [`Component::on`](crate::Component::on).

mod dispatch;
mod event;
mod registry;

pub use dispatch::{click, dispatch_event};
pub use event::Event;
pub use registry::{ListenerRegistry, RESERVED_EVENTS, Registration, is_reserved, same_handler};

//! Native event dispatch through a document.
//!
//! The propagation path is fixed before any listener runs. Listeners are
//! collected per node under a short borrow and invoked with the document
//! released, so a listener may freely mutate the document (or destroy the
//! component that owns it).

use std::cell::RefCell;

use tracing::trace;

use super::Event;
use crate::document::Document;
use crate::types::NodeId;

/// Dispatch `event` at `event.target`, bubbling to the root.
pub fn dispatch_event<D: Document + ?Sized>(document: &RefCell<D>, event: Event) {
    let path = {
        let doc = document.borrow();
        let mut path = vec![event.target];
        let mut node = event.target;
        while let Some(parent) = doc.parent(node) {
            path.push(parent);
            node = parent;
        }
        path
    };
    trace!(event_type = %event.event_type, target = %event.target, depth = path.len(), "dispatch");

    for node in path {
        let listeners = document.borrow().event_listeners(node, &event.event_type);
        let here = event.at(node);
        for listener in listeners {
            listener(&here);
        }
        if event.is_propagation_stopped() {
            break;
        }
    }
}

/// Dispatch a `click` at `node`.
pub fn click<D: Document + ?Sized>(document: &RefCell<D>, node: NodeId) {
    dispatch_event(document, Event::new("click", node));
}

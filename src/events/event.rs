use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::types::NodeId;

/// An event travelling from its target up through its ancestors.
///
/// Clones share the propagation flag, so stopping propagation from any
/// listener stops it for the whole dispatch.
#[derive(Clone)]
pub struct Event {
    pub event_type: String,
    /// Node the event was dispatched at.
    pub target: NodeId,
    /// Node whose listeners are currently running.
    pub current_target: NodeId,
    detail: Option<Rc<dyn Any>>,
    stopped: Rc<Cell<bool>>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, target: NodeId) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            current_target: target,
            detail: None,
            stopped: Rc::new(Cell::new(false)),
        }
    }

    /// Attach a payload, as carried by [`Component::emit`](crate::Component::emit).
    pub fn with_detail<T: Any>(mut self, detail: T) -> Self {
        self.detail = Some(Rc::new(detail));
        self
    }

    /// The payload, if one of type `T` is attached.
    pub fn detail<T: Any>(&self) -> Option<&T> {
        self.detail.as_deref()?.downcast_ref()
    }

    pub fn stop_propagation(&self) {
        self.stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped.get()
    }

    /// Same event, seen from `node`.
    pub(crate) fn at(&self, node: NodeId) -> Self {
        let mut event = self.clone();
        event.current_target = node;
        event
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("event_type", &self.event_type)
            .field("target", &self.target)
            .field("current_target", &self.current_target)
            .field("has_detail", &self.detail.is_some())
            .field("stopped", &self.stopped.get())
            .finish()
    }
}

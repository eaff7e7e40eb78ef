use super::instance::Component;
use crate::document::Document;
use crate::error::Result;
use crate::reconcile::Mount;
use crate::types::{NodeId, Props};

/// A nested instance as its parent sees it, with the data type erased.
pub(crate) trait Nested: Mount {
    /// Render ahead of insertion. Nothing is written to the document.
    fn prepare(&self) -> Result<()>;

    /// Run attach and render hooks for the freshly inserted subtree.
    fn settle(&self);

    /// Placeholder props from the parent's latest render.
    fn receive_props(&self, props: Props) -> Result<()>;

    fn is_destroyed(&self) -> bool;
}

impl<S: 'static> Mount for Component<S> {
    fn materialize(&self, doc: &mut dyn Document) -> NodeId {
        Component::materialize(self, doc)
    }

    fn unmount(&self, doc: &mut dyn Document) {
        self.teardown(doc);
    }

    fn mounted_node(&self) -> Option<NodeId> {
        self.node()
    }
}

impl<S: 'static> Nested for Component<S> {
    fn prepare(&self) -> Result<()> {
        Component::prepare(self)
    }

    fn settle(&self) {
        Component::settle(self);
    }

    fn receive_props(&self, props: Props) -> Result<()> {
        Component::receive_props(self, props)
    }

    fn is_destroyed(&self) -> bool {
        Component::is_destroyed(self)
    }
}

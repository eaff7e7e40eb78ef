//! Component instances and the lifecycle controller.
//!
//! # Lifecycle
//!
//! ```text
//! construct ──> attach_to ──> (update_data | set_props)* ──> destroy
//!                  │                    │
//!           render + create      render + patch, or suppressed
//!           nested settle        nested props / settle
//!           on_attach, on_render on_render
//! ```
//!
//! No `RefCell` borrow is held while user code runs: render functions,
//! hooks and handlers may call straight back into the component (or any
//! other component sharing the document).

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use super::definition::{ComponentDef, Hook};
use super::nested::Nested;
use crate::config::Config;
use crate::document::{Document, NativeListener, Selector, SharedDocument};
use crate::error::{Error, Result};
use crate::events::{Event, ListenerRegistry, dispatch_event, is_reserved};
use crate::markup::{VNode, build_tree, validate_keys};
use crate::reconcile::{self, Slots, placeholders, read_tree};
use crate::types::{Key, Lifecycle, ListenerId, NodeId, Props};

/// Delegated event handler signature.
pub type HandlerFn<S> = dyn Fn(&Component<S>, &Event);

/// Shared handler. Keep a clone to remove it again later.
pub type Handler<S> = Rc<HandlerFn<S>>;

/// Wrap a closure as a [`Handler`].
pub fn handler<S, F>(f: F) -> Handler<S>
where
    F: Fn(&Component<S>, &Event) + 'static,
{
    Rc::new(f)
}

// =============================================================================
// Component
// =============================================================================

/// Handle to a component instance. Clones refer to the same instance.
pub struct Component<S> {
    inner: Rc<Inner<S>>,
}

struct Inner<S> {
    def: ComponentDef<S>,
    document: SharedDocument,
    config: Config,
    props: RefCell<Props>,
    data: RefCell<S>,
    state: Cell<Lifecycle>,
    /// Bumped by every applied patch.
    generation: Cell<u64>,
    tree: RefCell<Option<VNode>>,
    node: Cell<Option<NodeId>>,
    /// The adopted node is the container passed to `attach_to`.
    adopted_container: Cell<bool>,
    children: RefCell<Slots<dyn Nested>>,
    listeners: RefCell<ListenerRegistry<HandlerFn<S>>>,
    /// Native listener per bound event type.
    bindings: RefCell<HashMap<String, ListenerId>>,
}

impl<S> Clone for Component<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// A nested instance due for hooks or props after a patch.
struct Pending {
    child: Rc<dyn Nested>,
    props: Props,
    fresh: bool,
}

impl<S: Default + 'static> Component<S> {
    pub(crate) fn new(def: ComponentDef<S>, document: SharedDocument, props: Props, config: Config) -> Self {
        Self {
            inner: Rc::new(Inner {
                def,
                document,
                config,
                props: RefCell::new(props),
                data: RefCell::new(S::default()),
                state: Cell::new(Lifecycle::empty()),
                generation: Cell::new(0),
                tree: RefCell::new(None),
                node: Cell::new(None),
                adopted_container: Cell::new(false),
                children: RefCell::new(Slots::new()),
                listeners: RefCell::new(ListenerRegistry::new()),
                bindings: RefCell::new(HashMap::new()),
            }),
        }
    }
}

impl<S: 'static> Component<S> {
    // =========================================================================
    // Queries
    // =========================================================================

    pub fn name(&self) -> &str {
        self.inner.def.name()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn document(&self) -> SharedDocument {
        Rc::clone(&self.inner.document)
    }

    pub fn props(&self) -> Props {
        self.inner.props.borrow().clone()
    }

    /// Read the component's data.
    ///
    /// The data stays borrowed while `f` runs, so `f` must not call
    /// `set_data` or `update_data` on this component.
    pub fn with_data<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.data.borrow())
    }

    /// Live root node while attached.
    pub fn node(&self) -> Option<NodeId> {
        self.inner.node.get()
    }

    /// Last rendered tree.
    pub fn tree(&self) -> Option<VNode> {
        self.inner.tree.borrow().clone()
    }

    /// Key of the last rendered root.
    pub fn key(&self) -> Option<Key> {
        self.inner.tree.borrow().as_ref().map(|tree| tree.key().clone())
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.state.get()
    }

    pub fn is_attached(&self) -> bool {
        self.lifecycle().contains(Lifecycle::ATTACHED)
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle().contains(Lifecycle::DESTROYED)
    }

    /// Number of live nested instances.
    pub fn children_count(&self) -> usize {
        self.inner.children.borrow().len()
    }

    fn ensure_alive(&self, operation: &str) -> Result<()> {
        if self.is_destroyed() {
            return Err(Error::Lifecycle(format!(
                "`{operation}` called on destroyed component `{}`",
                self.name()
            )));
        }
        Ok(())
    }

    fn set_state(&self, insert: Lifecycle, remove: Lifecycle) {
        let mut state = self.inner.state.get();
        state.remove(remove);
        state.insert(insert);
        self.inner.state.set(state);
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Markup for the current props and data. Does not touch the document.
    pub fn render(&self) -> Result<String> {
        self.ensure_alive("render")?;
        Ok(self.render_markup())
    }

    fn render_markup(&self) -> String {
        let props = self.inner.props.borrow();
        let data = self.inner.data.borrow();
        self.inner.def.render_markup(&props, &data)
    }

    /// Render, then build and validate the tree.
    fn build(&self) -> Result<VNode> {
        let markup = self.render_markup();
        let def = &self.inner.def;
        let tree = build_tree(&markup, |tag| def.has_component(tag), &self.inner.config)?;
        validate_keys(&tree)?;
        Ok(tree)
    }

    /// Resolve every placeholder in `tree` to an instance, reusing live ones
    /// from `current`. New instances are constructed and pre-rendered here,
    /// before any document write.
    fn prepare_slots(&self, tree: &VNode, current: &Slots<dyn Nested>) -> Result<(Slots<dyn Nested>, Vec<Pending>)> {
        let mut slots = Slots::new();
        let mut pending = Vec::new();
        for (path, placeholder) in placeholders(tree) {
            let reused = current.get(&path).filter(|child| !child.is_destroyed()).cloned();
            let fresh = reused.is_none();
            let child = match reused {
                Some(child) => child,
                None => {
                    let factory = self.inner.def.factory(&placeholder.name).ok_or_else(|| {
                        Error::Lifecycle(format!("no component registered for <{}>", placeholder.name))
                    })?;
                    let child = factory.instantiate(&self.inner.document, placeholder.props.clone(), &self.inner.config);
                    child.prepare()?;
                    child
                }
            };
            pending.push(Pending {
                child: Rc::clone(&child),
                props: placeholder.props.clone(),
                fresh,
            });
            slots.insert(path, child);
        }
        Ok((slots, pending))
    }

    /// Nested instances in document order.
    fn ordered_children(&self) -> Vec<Rc<dyn Nested>> {
        let tree = self.inner.tree.borrow();
        let children = self.inner.children.borrow();
        let Some(tree) = tree.as_ref() else {
            return Vec::new();
        };
        placeholders(tree)
            .into_iter()
            .filter_map(|(path, _)| children.get(&path).cloned())
            .collect()
    }

    // =========================================================================
    // Attach
    // =========================================================================

    /// Render into `container`.
    ///
    /// If `container`, or one of its direct children, is an element with the
    /// rendered root's tag and explicit key, that node is adopted and patched
    /// in place. Otherwise a new node is appended to `container`.
    pub fn attach_to(&self, container: NodeId) -> Result<Self> {
        let state = self.lifecycle();
        if state.contains(Lifecycle::DESTROYED) {
            return Err(Error::Attach(format!("component `{}` is destroyed", self.name())));
        }
        if state.contains(Lifecycle::ATTACHED) {
            return Err(Error::Attach(format!("component `{}` is already attached", self.name())));
        }
        if !self.inner.document.borrow().contains(container) {
            return Err(Error::Attach(format!("container {container} is not a live node")));
        }

        let tree = self.build()?;
        let (children, _) = self.prepare_slots(&tree, &Slots::new())?;

        {
            let mut doc = self.inner.document.borrow_mut();
            let doc: &mut dyn Document = &mut *doc;
            let adopted = find_adoptable(doc, container, &tree, &self.inner.config);
            let node = match adopted {
                Some(existing) => {
                    let prev = read_tree(doc, existing, &self.inner.config).unwrap_or_else(|| tree.clone());
                    let node = reconcile::patch(doc, existing, &prev, &tree, &Slots::new(), &children, Some(existing));
                    debug!(component = self.name(), node = %existing, "adopted existing node");
                    if node == existing {
                        self.set_state(Lifecycle::ADOPTED, Lifecycle::empty());
                        self.inner.adopted_container.set(existing == container);
                    }
                    node
                }
                None => {
                    let node = reconcile::create(doc, &tree, &children);
                    doc.append_child(container, node);
                    node
                }
            };
            self.inner.node.set(Some(node));
            self.set_state(Lifecycle::ATTACHED, Lifecycle::PREPARED);
            self.bind_all(doc);
        }

        *self.inner.tree.borrow_mut() = Some(tree);
        *self.inner.children.borrow_mut() = children;
        self.inner.generation.set(self.inner.generation.get() + 1);
        debug!(component = self.name(), %container, "attached");

        self.settle();
        Ok(self.clone())
    }

    /// Run hooks for a freshly attached subtree: nested instances first,
    /// depth-first in document order, then this component.
    pub(crate) fn settle(&self) {
        for child in self.ordered_children() {
            if self.is_destroyed() {
                return;
            }
            child.settle();
        }
        self.fire(self.inner.def.attach_hook(), "attach");
        self.fire(self.inner.def.render_hook(), "render");
    }

    /// Run a definition hook, then the zero-selector pseudo-listeners.
    fn fire(&self, hook: Option<Hook<S>>, event_type: &str) {
        if self.is_destroyed() {
            return;
        }
        if let Some(hook) = hook {
            hook(self);
        }
        let registrations = self.inner.listeners.borrow().registrations(event_type);
        for registration in registrations.into_iter().filter(|r| r.selector.is_none()) {
            let Some(node) = self.node() else {
                return;
            };
            if self.is_destroyed() {
                return;
            }
            (registration.handler)(self, &Event::new(event_type, node));
        }
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Replace the data and re-render if the output changes.
    pub fn set_data(&self, data: S) -> Result<()> {
        self.ensure_alive("set_data")?;
        *self.inner.data.borrow_mut() = data;
        self.refresh()
    }

    /// Mutate the data in place and re-render if the output changes.
    ///
    /// `f` must not call back into this component.
    pub fn update_data(&self, f: impl FnOnce(&mut S)) -> Result<()> {
        self.ensure_alive("update_data")?;
        f(&mut self.inner.data.borrow_mut());
        self.refresh()
    }

    pub fn set_props(&self, props: Props) -> Result<()> {
        self.ensure_alive("set_props")?;
        *self.inner.props.borrow_mut() = props;
        self.refresh()
    }

    /// Re-render and patch. Suppressed when the tree is unchanged.
    pub(crate) fn refresh(&self) -> Result<()> {
        if !self.is_attached() {
            return Ok(());
        }
        let next = self.build()?;
        if self.inner.tree.borrow().as_ref() == Some(&next) {
            debug!(component = self.name(), "render suppressed, tree unchanged");
            return Ok(());
        }

        let current = self.inner.children.borrow().clone();
        let (slots, pending) = self.prepare_slots(&next, &current)?;
        let (Some(live), Some(prev)) = (self.node(), self.tree()) else {
            return Ok(());
        };

        {
            let mut doc = self.inner.document.borrow_mut();
            let doc: &mut dyn Document = &mut *doc;
            let adopted = self.lifecycle().contains(Lifecycle::ADOPTED);
            let root = reconcile::patch(doc, live, &prev, &next, &current, &slots, adopted.then_some(live));

            for (path, child) in &current {
                let kept = slots
                    .get(path)
                    .is_some_and(|c| std::ptr::addr_eq(Rc::as_ptr(c), Rc::as_ptr(child)));
                if !kept && !child.is_destroyed() {
                    child.unmount(doc);
                }
            }

            if root != live {
                debug!(component = self.name(), from = %live, to = %root, "root replaced, rebinding");
                self.unbind_all(doc, live);
                self.inner.node.set(Some(root));
                self.set_state(Lifecycle::empty(), Lifecycle::ADOPTED);
                self.inner.adopted_container.set(false);
                self.bind_all(doc);
            }
        }

        *self.inner.tree.borrow_mut() = Some(next);
        *self.inner.children.borrow_mut() = slots;
        let generation = self.inner.generation.get() + 1;
        self.inner.generation.set(generation);
        debug!(component = self.name(), generation, "rendered");

        let mut first_error = None;
        for Pending { child, props, fresh } in pending {
            if self.is_destroyed() {
                break;
            }
            // Fresh children are live once patched in, whatever renders
            // happened since. Props from a superseded render are dropped.
            if fresh {
                if !child.is_destroyed() {
                    child.settle();
                }
            } else if self.inner.generation.get() == generation {
                if let Err(err) = child.receive_props(props) {
                    first_error.get_or_insert(err);
                }
            }
        }

        self.fire(self.inner.def.render_hook(), "render");
        first_error.map_or(Ok(()), Err)
    }

    // =========================================================================
    // Destroy
    // =========================================================================

    /// Detach and release the live subtree, destroy nested instances and
    /// drop every listener. Calling it again does nothing.
    ///
    /// An adopted container stays where it is, content included; only
    /// listeners and nested instances go.
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        let document = Rc::clone(&self.inner.document);
        let mut doc = document.borrow_mut();
        self.teardown(&mut *doc);
    }

    pub(crate) fn teardown(&self, doc: &mut dyn Document) {
        if self.is_destroyed() {
            return;
        }
        let adopted = self.lifecycle().contains(Lifecycle::ADOPTED);
        let in_place = adopted && self.inner.adopted_container.get();
        self.inner.state.set(Lifecycle::DESTROYED);

        let children: Vec<Rc<dyn Nested>> = self.inner.children.borrow_mut().drain().map(|(_, c)| c).collect();
        for child in children {
            child.unmount(doc);
        }

        if let Some(node) = self.inner.node.take() {
            self.unbind_all(doc, node);
            if in_place {
                debug!(component = self.name(), %node, "leaving adopted container in place");
            } else if let Some(parent) = doc.parent(node) {
                doc.remove_child(parent, node);
            }
            if !adopted {
                doc.release(node);
            }
        }

        self.inner.listeners.borrow_mut().clear();
        self.inner.tree.borrow_mut().take();
        debug!(component = self.name(), "destroyed");
    }

    // =========================================================================
    // Nesting
    // =========================================================================

    /// Render ahead of insertion, recursively preparing nested instances.
    pub(crate) fn prepare(&self) -> Result<()> {
        let tree = self.build()?;
        let (children, _) = self.prepare_slots(&tree, &Slots::new())?;
        *self.inner.tree.borrow_mut() = Some(tree);
        *self.inner.children.borrow_mut() = children;
        self.set_state(Lifecycle::PREPARED, Lifecycle::empty());
        Ok(())
    }

    /// Create the live subtree from the prepared tree.
    pub(crate) fn materialize(&self, doc: &mut dyn Document) -> NodeId {
        let node = {
            let tree = self.inner.tree.borrow();
            let children = self.inner.children.borrow();
            match tree.as_ref() {
                Some(tree) => reconcile::create(doc, tree, &*children),
                None => {
                    warn!(component = self.name(), "materialized without a prepared tree");
                    doc.create_element(self.name())
                }
            }
        };
        self.inner.node.set(Some(node));
        self.set_state(Lifecycle::ATTACHED, Lifecycle::PREPARED);
        self.bind_all(doc);
        self.inner.generation.set(self.inner.generation.get() + 1);
        debug!(component = self.name(), %node, "materialized");
        node
    }

    /// New props from the parent's placeholder. Re-renders only on change.
    pub(crate) fn receive_props(&self, props: Props) -> Result<()> {
        if self.is_destroyed() || *self.inner.props.borrow() == props {
            return Ok(());
        }
        *self.inner.props.borrow_mut() = props;
        self.refresh()
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Register a delegated handler.
    ///
    /// With a selector, `handler` runs for every node between the event
    /// target and this component's root (inclusive) that matches it, target
    /// first. Without one it runs once per event, seen from the root.
    /// `render` and `attach` register lifecycle listeners instead.
    pub fn on(&self, event_type: &str, selector: Option<&str>, handler: Handler<S>) -> Result<&Self> {
        self.ensure_alive("on")?;
        let selector = selector.map(Selector::parse).transpose()?;
        if selector.is_some() && is_reserved(event_type) {
            warn!(event_type, "selector ignored for lifecycle listener");
        }
        let first = self.inner.listeners.borrow_mut().add(event_type, selector, handler);

        // One native listener per type, shared by every registration.
        if first && self.is_attached() && !is_reserved(event_type) {
            let mut doc = self.inner.document.borrow_mut();
            self.bind(&mut *doc, event_type);
        }
        Ok(self)
    }

    /// Remove a handler registered with the same type, selector and handler.
    pub fn remove_listener(&self, event_type: &str, selector: Option<&str>, handler: &Handler<S>) -> Result<&Self> {
        self.ensure_alive("remove_listener")?;
        let normalized = selector.map(Selector::parse).transpose()?;
        let source = normalized.as_ref().map(Selector::as_str);
        let removed = self.inner.listeners.borrow_mut().remove(event_type, source, handler);
        if !removed {
            debug!(event_type, "remove_listener matched nothing");
        }

        if !self.inner.listeners.borrow().contains(event_type) {
            let binding = self.inner.bindings.borrow_mut().remove(event_type);
            if let (Some(id), Some(node)) = (binding, self.node()) {
                self.inner.document.borrow_mut().remove_event_listener(node, id);
                debug!(event_type, "native listener released");
            }
        }
        Ok(self)
    }

    /// Dispatch `event_type` at this component's root, carrying `payload`
    /// as the event detail. Bubbles like a native event.
    pub fn emit<T: Any>(&self, event_type: &str, payload: T) -> Result<()> {
        self.ensure_alive("emit")?;
        let Some(node) = self.node() else {
            return Err(Error::Lifecycle(format!(
                "`emit` called on component `{}` before attach",
                self.name()
            )));
        };
        dispatch_event(&*self.inner.document, Event::new(event_type, node).with_detail(payload));
        Ok(())
    }

    pub(crate) fn bind_all(&self, doc: &mut dyn Document) {
        for event_type in self.inner.listeners.borrow().event_types() {
            if !is_reserved(&event_type) {
                self.bind(doc, &event_type);
            }
        }
    }

    fn bind(&self, doc: &mut dyn Document, event_type: &str) {
        let Some(node) = self.node() else {
            return;
        };
        if self.inner.bindings.borrow().contains_key(event_type) {
            return;
        }
        let id = doc.add_event_listener(node, event_type, self.native_listener());
        self.inner.bindings.borrow_mut().insert(event_type.to_string(), id);
        debug!(component = self.name(), event_type, %node, "native listener bound");
    }

    fn unbind_all(&self, doc: &mut dyn Document, node: NodeId) {
        let bindings: Vec<ListenerId> = self.inner.bindings.borrow_mut().drain().map(|(_, id)| id).collect();
        if !doc.contains(node) {
            return;
        }
        for id in bindings {
            doc.remove_event_listener(node, id);
        }
    }

    fn native_listener(&self) -> NativeListener {
        let weak: Weak<Inner<S>> = Rc::downgrade(&self.inner);
        Rc::new(move |event: &Event| {
            if let Some(inner) = weak.upgrade() {
                Component { inner }.delegate(event);
            }
        })
    }

    /// Run matching handlers for a native event reaching the root.
    fn delegate(&self, event: &Event) {
        let Some(root) = self.node() else {
            return;
        };
        let registrations = self.inner.listeners.borrow().registrations(&event.event_type);
        if registrations.is_empty() {
            return;
        }

        let mut calls: Vec<(Handler<S>, NodeId)> = Vec::new();
        {
            let doc = self.inner.document.borrow();
            let mut cursor = Some(event.target);
            while let Some(node) = cursor {
                for registration in &registrations {
                    let hit = match &registration.selector {
                        Some(selector) => selector.matches(&*doc, node),
                        None => node == root,
                    };
                    if hit {
                        calls.push((Rc::clone(&registration.handler), node));
                    }
                }
                if node == root {
                    break;
                }
                cursor = doc.parent(node);
            }
        }

        let mut stopped_at = None;
        for (handler, node) in calls {
            if self.is_destroyed() {
                break;
            }
            if stopped_at.is_some_and(|at| at != node) {
                break;
            }
            handler(self, &event.at(node));
            if stopped_at.is_none() && event.is_propagation_stopped() {
                stopped_at = Some(node);
            }
        }
    }
}

/// The container or one of its element children, when its tag and explicit
/// key match the rendered root.
fn find_adoptable(doc: &dyn Document, container: NodeId, tree: &VNode, config: &Config) -> Option<NodeId> {
    let key = tree.key().as_explicit()?;
    let tag = tree.tag()?;
    let matches = |node: NodeId| {
        doc.tag_name(node) == Some(tag) && doc.attribute(node, &config.key_attribute) == Some(key)
    };
    if matches(container) {
        return Some(container);
    }
    doc.children(container).into_iter().find(|&child| matches(child))
}

impl<S: 'static> std::fmt::Debug for Component<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.inner.def.name())
            .field("state", &self.inner.state.get())
            .field("node", &self.inner.node.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::events::click;
    use crate::types::props;

    fn setup() -> (Rc<RefCell<MemoryDocument>>, NodeId) {
        let doc = MemoryDocument::shared();
        let container = {
            let mut d = doc.borrow_mut();
            let container = d.create_element("div");
            let body = d.body();
            d.append_child(body, container);
            container
        };
        (doc, container)
    }

    fn list_def() -> ComponentDef<Vec<&'static str>> {
        ComponentDef::new("list", |_, items: &Vec<&'static str>| {
            let items: String = items
                .iter()
                .map(|item| format!(r#"<li data-hkey="{item}">{item}</li>"#))
                .collect();
            format!("<ul>{items}</ul>")
        })
    }

    #[test]
    fn test_attach_appends_to_container() {
        let (doc, container) = setup();
        let component = list_def().construct(doc.clone(), Props::new()).attach_to(container).unwrap();
        let node = component.node().unwrap();
        assert_eq!(doc.borrow().parent(node), Some(container));
        assert!(component.is_attached());
        assert_eq!(doc.borrow().outer_html(node), "<ul></ul>");
    }

    #[test]
    fn test_attach_twice_fails() {
        let (doc, container) = setup();
        let component = list_def().construct(doc.clone(), Props::new());
        component.attach_to(container).unwrap();
        assert!(matches!(component.attach_to(container), Err(Error::Attach(_))));
        component.destroy();
        assert!(matches!(component.attach_to(container), Err(Error::Attach(_))));
    }

    #[test]
    fn test_keyed_update_moves_nodes() {
        let (doc, container) = setup();
        let component = list_def().construct(doc.clone(), Props::new());
        component.set_data(vec!["a", "b", "c"]).unwrap();
        component.attach_to(container).unwrap();
        let ul = component.node().unwrap();
        let before = doc.borrow().children(ul);

        doc.borrow_mut().clear_mutations();
        component.set_data(vec!["c", "a", "b"]).unwrap();
        assert_eq!(doc.borrow().children(ul), vec![before[2], before[0], before[1]]);
        assert_eq!(doc.borrow().mutation_count(), 1);
    }

    #[test]
    fn test_unchanged_render_is_suppressed() {
        let (doc, container) = setup();
        let renders = Rc::new(Cell::new(0));
        let counter = Rc::clone(&renders);
        let component = list_def()
            .on_render(move |_| counter.set(counter.get() + 1))
            .construct(doc.clone(), Props::new())
            .attach_to(container)
            .unwrap();
        let generation = component.inner.generation.get();

        component.set_data(Vec::new()).unwrap();
        assert_eq!(renders.get(), 1);
        assert_eq!(component.inner.generation.get(), generation);
    }

    #[test]
    fn test_failed_render_leaves_state_intact() {
        let (doc, container) = setup();
        let component = list_def().construct(doc.clone(), Props::new());
        component.set_data(vec!["a"]).unwrap();
        component.attach_to(container).unwrap();
        let tree = component.tree();

        doc.borrow_mut().clear_mutations();
        let err = component.set_data(vec!["a", "a"]).unwrap_err();
        assert!(err.is_key_collision());
        assert_eq!(component.tree(), tree);
        assert_eq!(doc.borrow().mutation_count(), 0);
    }

    #[test]
    fn test_destroy_is_idempotent_and_releases_nodes() {
        let (doc, container) = setup();
        let before = doc.borrow().live_node_count();
        let component = list_def().construct(doc.clone(), Props::new());
        component.set_data(vec!["a", "b"]).unwrap();
        component.attach_to(container).unwrap();
        assert!(doc.borrow().live_node_count() > before);

        component.destroy();
        component.destroy();
        assert_eq!(doc.borrow().live_node_count(), before);
        assert!(component.node().is_none());
        assert!(component.is_destroyed());
        assert!(matches!(component.set_data(Vec::new()), Err(Error::Lifecycle(_))));
        assert!(matches!(component.render(), Err(Error::Lifecycle(_))));
    }

    #[test]
    fn test_one_native_binding_per_type() {
        let (doc, container) = setup();
        let hits = Rc::new(Cell::new(0));
        let component = list_def().construct(doc.clone(), Props::new());
        component.set_data(vec!["a"]).unwrap();
        for _ in 0..3 {
            let hits = Rc::clone(&hits);
            component
                .on("click", Some("li"), handler(move |_, _| hits.set(hits.get() + 1)))
                .unwrap();
        }
        component.attach_to(container).unwrap();

        let ul = component.node().unwrap();
        assert_eq!(doc.borrow().event_listeners(ul, "click").len(), 1);
        let li = doc.borrow().children(ul)[0];
        click(&doc, li);
        assert_eq!(hits.get(), 3);

        let after = Rc::clone(&hits);
        component
            .on("click", None, handler(move |_, _| after.set(after.get() + 10)))
            .unwrap();
        assert_eq!(doc.borrow().event_listeners(ul, "click").len(), 1);
        click(&doc, li);
        assert_eq!(hits.get(), 16);
    }

    #[test]
    fn test_debug_names_component_and_state() {
        let (doc, container) = setup();
        let component = list_def().construct(doc.clone(), Props::new());
        component.attach_to(container).unwrap();
        let debug = format!("{component:?}");
        assert!(debug.contains("list"), "{debug}");
    }

    #[test]
    fn test_root_replacement_rebinds_listeners() {
        let (doc, container) = setup();
        let def = ComponentDef::<bool>::new("toggle", |_, on: &bool| {
            if *on { "<p><b>on</b></p>".into() } else { "<div><b>off</b></div>".into() }
        });
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let component = def.construct(doc.clone(), Props::new()).attach_to(container).unwrap();
        component
            .on("click", Some("b"), handler(move |_, _| counter.set(counter.get() + 1)))
            .unwrap();

        let old = component.node().unwrap();
        component.set_data(true).unwrap();
        let new = component.node().unwrap();
        assert_ne!(old, new);
        assert_eq!(doc.borrow().parent(new), Some(container));
        assert_eq!(doc.borrow().event_listeners(new, "click").len(), 1);

        let b = doc.borrow().children(new)[0];
        click(&doc, b);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_adopts_keyed_child_of_container() {
        let (doc, container) = setup();
        let existing = {
            let mut d = doc.borrow_mut();
            let section = d.create_element("section");
            d.set_attribute(section, "data-hkey", "app");
            let text = d.create_text_node("server");
            d.append_child(section, text);
            d.append_child(container, section);
            section
        };
        let def = ComponentDef::<()>::new("app", |props, _| {
            format!(r#"<section data-hkey="app">{}</section>"#, props["text"])
        });
        let component = def
            .construct(doc.clone(), props([("text", "client")]))
            .attach_to(container)
            .unwrap();

        assert_eq!(component.node(), Some(existing));
        assert!(component.lifecycle().contains(Lifecycle::ADOPTED));
        assert_eq!(doc.borrow().text_content(existing), "client");
        assert_eq!(doc.borrow().children(container), vec![existing]);

        component.destroy();
        assert!(doc.borrow().contains(existing));
        assert_eq!(doc.borrow().parent(existing), None);
    }

    #[test]
    fn test_emit_requires_attach() {
        let (doc, _) = setup();
        let component = list_def().construct(doc.clone(), Props::new());
        assert!(matches!(component.emit("x", ()), Err(Error::Lifecycle(_))));
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let (doc, _) = setup();
        let component = list_def().construct(doc.clone(), Props::new());
        let result = component.on("click", Some("ul > li"), handler(|_, _| {}));
        assert!(matches!(result, Err(Error::Selector { .. })));
    }
}

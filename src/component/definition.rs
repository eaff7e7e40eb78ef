use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::instance::Component;
use super::nested::Nested;
use crate::config::Config;
use crate::document::SharedDocument;
use crate::types::Props;

/// Lifecycle hook, called with the instance it fires for.
pub type Hook<S> = Rc<dyn Fn(&Component<S>)>;

type RenderFn<S> = Rc<dyn Fn(&Props, &S) -> String>;

// =============================================================================
// ComponentDef
// =============================================================================

/// Descriptor for a component type.
///
/// `S` is the component's internal data. Every instance starts from
/// `S::default()`; `on_construct` runs after that base initialization and
/// may set data or register listeners.
///
/// # Example
///
/// ```
/// use spark_dom::{ComponentDef, MemoryDocument, props};
///
/// let greeting = ComponentDef::<()>::new("greeting", |props, _| {
///     format!("<p>{}</p>", props["name"])
/// });
/// let doc = MemoryDocument::shared();
/// let component = greeting.construct(doc.clone(), props([("name", "Ada")]));
/// assert_eq!(component.render().unwrap(), "<p>Ada</p>");
/// ```
pub struct ComponentDef<S> {
    inner: Rc<Definition<S>>,
}

struct Definition<S> {
    name: String,
    render: RenderFn<S>,
    components: HashMap<String, Rc<dyn Factory>>,
    on_attach: Option<Hook<S>>,
    on_render: Option<Hook<S>>,
    on_construct: Option<Hook<S>>,
    config: Config,
}

impl<S> Clone for Definition<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            render: Rc::clone(&self.render),
            components: self.components.clone(),
            on_attach: self.on_attach.clone(),
            on_render: self.on_render.clone(),
            on_construct: self.on_construct.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S> Clone for ComponentDef<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for ComponentDef<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut components: Vec<&String> = self.inner.components.keys().collect();
        components.sort();
        f.debug_struct("ComponentDef")
            .field("name", &self.inner.name)
            .field("components", &components)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<S: Default + 'static> ComponentDef<S> {
    pub fn new(name: impl Into<String>, render: impl Fn(&Props, &S) -> String + 'static) -> Self {
        Self {
            inner: Rc::new(Definition {
                name: name.into(),
                render: Rc::new(render),
                components: HashMap::new(),
                on_attach: None,
                on_render: None,
                on_construct: None,
                config: Config::default(),
            }),
        }
    }

    /// Register a nested component under the placeholder tag `tag`.
    pub fn component<T: Default + 'static>(mut self, tag: impl Into<String>, def: ComponentDef<T>) -> Self {
        Rc::make_mut(&mut self.inner)
            .components
            .insert(tag.into(), Rc::new(def));
        self
    }

    pub fn on_attach(mut self, hook: impl Fn(&Component<S>) + 'static) -> Self {
        Rc::make_mut(&mut self.inner).on_attach = Some(Rc::new(hook));
        self
    }

    pub fn on_render(mut self, hook: impl Fn(&Component<S>) + 'static) -> Self {
        Rc::make_mut(&mut self.inner).on_render = Some(Rc::new(hook));
        self
    }

    pub fn on_construct(mut self, hook: impl Fn(&Component<S>) + 'static) -> Self {
        Rc::make_mut(&mut self.inner).on_construct = Some(Rc::new(hook));
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        Rc::make_mut(&mut self.inner).config = config;
        self
    }

    /// Create an instance bound to `document`.
    pub fn construct(&self, document: SharedDocument, props: Props) -> Component<S> {
        let config = self.inner.config.clone();
        self.construct_with(document, props, config)
    }

    pub(crate) fn construct_with(&self, document: SharedDocument, props: Props, config: Config) -> Component<S> {
        let component = Component::new(self.clone(), document, props, config);
        if let Some(hook) = self.inner.on_construct.clone() {
            hook(&component);
        }
        component
    }
}

impl<S: 'static> ComponentDef<S> {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn has_component(&self, tag: &str) -> bool {
        self.inner.components.contains_key(tag)
    }

    pub(crate) fn render_markup(&self, props: &Props, data: &S) -> String {
        (self.inner.render)(props, data)
    }

    pub(crate) fn factory(&self, tag: &str) -> Option<Rc<dyn Factory>> {
        self.inner.components.get(tag).cloned()
    }

    pub(crate) fn attach_hook(&self) -> Option<Hook<S>> {
        self.inner.on_attach.clone()
    }

    pub(crate) fn render_hook(&self) -> Option<Hook<S>> {
        self.inner.on_render.clone()
    }
}

// =============================================================================
// Factory
// =============================================================================

/// Type-erased constructor for nested components.
pub(crate) trait Factory {
    /// Nested instances share the parent's document and config.
    fn instantiate(&self, document: &SharedDocument, props: Props, config: &Config) -> Rc<dyn Nested>;
}

impl<S: Default + 'static> Factory for ComponentDef<S> {
    fn instantiate(&self, document: &SharedDocument, props: Props, config: &Config) -> Rc<dyn Nested> {
        Rc::new(self.construct_with(Rc::clone(document), props, config.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use std::cell::Cell;

    #[derive(Default)]
    struct Count(u32);

    #[test]
    fn test_builder_registers_components() {
        let child = ComponentDef::<()>::new("child", |_, _| "<span/>".into());
        let def = ComponentDef::<()>::new("app", |_, _| "<div><child/></div>".into()).component("child", child);
        assert_eq!(def.name(), "app");
        assert!(def.has_component("child"));
        assert!(!def.has_component("div"));
    }

    #[test]
    fn test_builder_does_not_affect_clones() {
        let base = ComponentDef::<()>::new("a", |_, _| "<a/>".into());
        let extended = base.clone().with_config(Config::new().with_key_attribute("key"));
        assert_eq!(base.config().key_attribute, "data-hkey");
        assert_eq!(extended.config().key_attribute, "key");
    }

    #[test]
    fn test_construct_runs_after_base_init() {
        let seen = Rc::new(Cell::new(None));
        let observed = Rc::clone(&seen);
        let def = ComponentDef::<Count>::new("counter", |_, data| format!("<b>{}</b>", data.0))
            .on_construct(move |c| {
                observed.set(Some(c.with_data(|d| d.0)));
                c.update_data(|d| d.0 = 7).unwrap();
            });
        let component = def.construct(MemoryDocument::shared(), Props::new());
        assert_eq!(seen.get(), Some(0));
        assert_eq!(component.render().unwrap(), "<b>7</b>");
    }

    #[test]
    fn test_nested_instances_inherit_config() {
        let config = Config::new().with_key_attribute("key");
        let child = ComponentDef::<()>::new("child", |_, _| "<span/>".into());
        let document: SharedDocument = MemoryDocument::shared();
        let nested = child.construct_with(Rc::clone(&document), Props::new(), config.clone());
        assert_eq!(nested.config(), &config);
    }
}

//! Per-component listener registry.
//!
//! Registrations are grouped by event type and kept in registration order.
//! A registration without a selector fires for events reaching the
//! component's root. `render` and `attach` are lifecycle pseudo-events: they
//! are never bound natively and fire from the lifecycle controller instead.

use std::collections::HashMap;
use std::rc::Rc;

use crate::document::Selector;

/// Event types reserved for lifecycle notifications.
pub const RESERVED_EVENTS: [&str; 2] = ["render", "attach"];

pub fn is_reserved(event_type: &str) -> bool {
    RESERVED_EVENTS.contains(&event_type)
}

/// One `on(type, selector, handler)` call.
pub struct Registration<H: ?Sized> {
    pub selector: Option<Selector>,
    /// Selector text as given, used to match removals.
    pub source: Option<String>,
    pub handler: Rc<H>,
}

impl<H: ?Sized> Clone for Registration<H> {
    fn clone(&self) -> Self {
        Self {
            selector: self.selector.clone(),
            source: self.source.clone(),
            handler: Rc::clone(&self.handler),
        }
    }
}

pub struct ListenerRegistry<H: ?Sized> {
    by_type: HashMap<String, Vec<Registration<H>>>,
}

impl<H: ?Sized> Default for ListenerRegistry<H> {
    fn default() -> Self {
        Self {
            by_type: HashMap::new(),
        }
    }
}

/// Handlers are identified by allocation, not by value.
pub fn same_handler<H: ?Sized>(a: &Rc<H>, b: &Rc<H>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

impl<H: ?Sized> ListenerRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if this is the first registration for `event_type`.
    pub fn add(&mut self, event_type: &str, selector: Option<Selector>, handler: Rc<H>) -> bool {
        let list = self.by_type.entry(event_type.to_string()).or_default();
        let first = list.is_empty();
        list.push(Registration {
            source: selector.as_ref().map(|s| s.as_str().to_string()),
            selector,
            handler,
        });
        first
    }

    /// Remove the first registration matching type, selector text and handler.
    pub fn remove(&mut self, event_type: &str, source: Option<&str>, handler: &Rc<H>) -> bool {
        let Some(list) = self.by_type.get_mut(event_type) else {
            return false;
        };
        let Some(position) = list
            .iter()
            .position(|r| r.source.as_deref() == source && same_handler(&r.handler, handler))
        else {
            return false;
        };
        list.remove(position);
        if list.is_empty() {
            self.by_type.remove(event_type);
        }
        true
    }

    /// Snapshot of the registrations for `event_type`.
    pub fn registrations(&self, event_type: &str) -> Vec<Registration<H>> {
        self.by_type.get(event_type).cloned().unwrap_or_default()
    }

    pub fn contains(&self, event_type: &str) -> bool {
        self.by_type.contains_key(event_type)
    }

    pub fn event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.by_type.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn clear(&mut self) {
        self.by_type.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Handler = dyn Fn() -> u8;

    fn handler(n: u8) -> Rc<Handler> {
        Rc::new(move || n)
    }

    #[test]
    fn test_reserved() {
        assert!(is_reserved("render"));
        assert!(is_reserved("attach"));
        assert!(!is_reserved("click"));
    }

    #[test]
    fn test_registration_order() {
        let mut registry: ListenerRegistry<Handler> = ListenerRegistry::new();
        assert!(registry.add("click", None, handler(1)));
        assert!(!registry.add("click", Some(Selector::parse("button").unwrap()), handler(2)));
        let order: Vec<u8> = registry.registrations("click").iter().map(|r| (r.handler)()).collect();
        assert_eq!(order, vec![1, 2]);
        assert_eq!(registry.event_types(), vec!["click".to_string()]);
    }

    #[test]
    fn test_remove_matches_selector_and_handler() {
        let mut registry: ListenerRegistry<Handler> = ListenerRegistry::new();
        let h = handler(1);
        registry.add("click", Some(Selector::parse("button").unwrap()), Rc::clone(&h));

        assert!(!registry.remove("click", None, &h));
        assert!(!registry.remove("click", Some("button"), &handler(1)));
        assert!(registry.remove("click", Some("button"), &h));
        assert!(!registry.contains("click"));
        assert!(registry.event_types().is_empty());
        assert!(registry.add("click", None, h));
    }

    #[test]
    fn test_remove_only_first_duplicate() {
        let mut registry: ListenerRegistry<Handler> = ListenerRegistry::new();
        let h = handler(7);
        registry.add("input", None, Rc::clone(&h));
        registry.add("input", None, Rc::clone(&h));
        assert!(registry.remove("input", None, &h));
        assert_eq!(registry.registrations("input").len(), 1);
        assert_eq!(registry.event_types(), vec!["input".to_string()]);
    }
}

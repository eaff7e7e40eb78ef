//! Components - descriptors, instances and the lifecycle controller.
//!
//! A [`ComponentDef`] describes a component type: its render function, the
//! nested components its markup may reference, and its hooks. Constructing
//! a def yields a [`Component`] handle bound to a shared document.
//!
//! # Example
//!
//! ```
//! use spark_dom::document::Document;
//! use spark_dom::{ComponentDef, Event, MemoryDocument, Props, handler};
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: u32,
//! }
//!
//! let def = ComponentDef::<Counter>::new("counter", |_, data| {
//!     format!("<div><button>+</button><span>{}</span></div>", data.count)
//! });
//!
//! let doc = MemoryDocument::shared();
//! let body = doc.borrow().body();
//! let counter = def.construct(doc.clone(), Props::new()).attach_to(body).unwrap();
//! counter
//!     .on("click", Some("button"), handler(|c: &spark_dom::Component<Counter>, _: &Event| {
//!         c.update_data(|d| d.count += 1).unwrap();
//!     }))
//!     .unwrap();
//!
//! let button = doc.borrow().children(counter.node().unwrap())[0];
//! spark_dom::click(&doc, button);
//! assert_eq!(doc.borrow().text_content(body), "+1");
//! ```

mod definition;
mod instance;
mod nested;

pub use definition::{ComponentDef, Hook};
pub use instance::{Component, Handler, HandlerFn, handler};

//! # tether
//!
//! Reactive view-model binding engine.
//!
//! Connects a plain nested data object (the view-model) to a tree of UI
//! elements: writes to view-model fields are reflected in element properties
//! automatically, and user input events write back into the view-model. No
//! compiler step and no virtual DOM - dependency tracking is ad-hoc, built
//! from text-level static analysis of binding expressions plus interception
//! of view-model writes.
//!
//! ## Architecture
//!
//! ```text
//! bootstrap scan → Expression compile + dependency extraction → BindingRegistry
//!                                                                    ▲
//! user input / programmatic write → ViewModel::set ── notify(path) ──┘
//!                                                          │
//!                                   actions re-evaluate and push to elements
//! ```
//!
//! All propagation is synchronous, single-threaded and depth-first: a write
//! re-runs every binding registered under that exact dotted path before the
//! write returns.
//!
//! ## Modules
//!
//! - [`value`] - the dynamic value tree view-models are made of
//! - [`expr`] - expression compiler (lexer, parser, evaluator)
//! - [`deps`] - textual dependency extraction from expression text
//! - [`registry`] - dotted path → ordered binding actions
//! - [`store`] - the reactive wrapper intercepting view-model writes
//! - [`element`] - the host element boundary the engine binds against
//! - [`binder`] - the orchestration pass wiring it all together
//!
//! ## Example
//!
//! ```
//! use tether::{bootstrap, Element, Value};
//!
//! let label = Element::new("span").attr("bind", "this.user.name");
//! let root = Element::new("div").child(label.clone());
//!
//! let vm = bootstrap(
//!     &root,
//!     Value::from([("user", Value::from([("name", Value::from("Ann"))]))]),
//! )
//! .unwrap();
//!
//! assert_eq!(label.get("textContent"), Value::from("Ann"));
//! vm.set("user.name", Value::from("Bea")).unwrap();
//! assert_eq!(label.get("textContent"), Value::from("Bea"));
//! ```

pub mod binder;
pub mod deps;
pub mod element;
pub mod error;
pub mod expr;
pub mod registry;
pub mod store;
pub mod value;

pub use binder::bootstrap;
pub use element::{Element, Event, InputType};
pub use error::{BindError, Result};
pub use expr::{EvalContext, Expression, Role};
pub use registry::{BindingAction, BindingRegistry};
pub use store::ViewModel;
pub use value::Value;

//! # formwork
//!
//! A reactive form-state engine: signal-driven field nodes, dependency-aware
//! validation, nested and repeatable sub-forms, and stepped wizards — with no
//! rendering layer of its own. Renderers read the reactive cells and mutate
//! through them; everything downstream recomputes automatically.
//!
//! ## Core Systems
//!
//! - **[`reactive`]** — Signals, effects, memos (Leptos-style auto-tracking)
//! - **[`value`]** — The dynamic `Value` model fields and forms hold
//! - **[`schema`]** — Declarative field/form/array/step descriptors
//! - **[`form`]** — Live containers: `Field`, `Form`, `ArrayForm`, `SteppedForm`
//! - **[`path`]** — Dotted/bracketed field addressing (`items[2].id`)
//! - **[`validate`]** — Sync, cross-field, and async validators
//!
//! ## Example
//!
//! ```
//! use formwork::schema::{FieldSchema, FormSchema};
//! use formwork::form::Form;
//! use formwork::validate::Validator;
//! use formwork::value::Value;
//!
//! let schema = FormSchema::new()
//!     .field(FieldSchema::text("name").required("name is required"))
//!     .field(FieldSchema::integer("age")
//!         .with_validator(Validator::int_range(0, 120, "age must be 0-120")));
//!
//! let form = Form::build(&schema, Value::map().with("name", "ada"));
//! form.field("age").unwrap().value().set(Value::Int(40));
//! assert!(form.validate_form());
//! let saved = form.save().unwrap();
//! assert_eq!(saved.get("age"), Some(&Value::Int(40)));
//! ```

// Foundation
pub mod error;
pub mod value;

// Reactivity
pub mod reactive;

// Declarative layer
pub mod schema;
pub mod validate;

// Live form graph
pub mod form;
pub mod path;

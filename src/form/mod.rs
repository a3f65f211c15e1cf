//! Live form containers and field nodes.
//!
//! Schemas ([`crate::schema`]) are declarative; everything here is the live
//! reactive graph built from them:
//! - [`Field`] — one reactive field node and its [`Control`] shape;
//! - [`Form`] — an ordered container of fields with save/reset lifecycle;
//! - [`ArrayForm`] — the manager behind a repeatable field;
//! - [`SteppedForm`] — a wizard cursor over one container.

pub mod array;
pub mod container;
pub mod field;
pub mod stepped;

pub use array::ArrayForm;
pub use container::Form;
pub use field::{Control, Field};
pub use stepped::SteppedForm;

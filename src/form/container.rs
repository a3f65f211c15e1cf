//! Container: an ordered collection of field nodes forming one form, one
//! wizard step's slice, or one array item.
//!
//! The container orchestrates cross-field validation, aggregates validity /
//! dirtiness / touch state over its fields and their nested containers, and
//! owns the save/reset lifecycle against its backing model slice.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::error::FormError;
use crate::form::field::{Control, Field};
use crate::reactive::untrack;
use crate::schema::FormSchema;
use crate::value::Value;

pub(crate) struct FormInner {
    /// Address prefix from the form root: `""` at the root, `"address"` for a
    /// nested group, `"items[2]"` for an array item.
    prefix: RefCell<String>,
    /// Insertion order is semantically meaningful: traversal, display, and
    /// step partitioning all follow it.
    fields: RefCell<Vec<Field>>,
    /// Backing model slice; rewritten on successful save.
    model: RefCell<Value>,
    on_save: Option<Rc<dyn Fn(&Value)>>,
}

/// Handle to one form container. Cheap to clone.
#[derive(Clone)]
pub struct Form {
    pub(crate) inner: Rc<FormInner>,
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("path", &self.path())
            .field("fields", &self.inner.fields.borrow().len())
            .finish()
    }
}

impl Form {
    /// Build a live container from a schema and an initial model value.
    ///
    /// Each field seeds from the model entry under its name, falling back to
    /// the schema default, then to the kind's zero value. Fields are created
    /// first and attached afterwards, so validators that read a sibling
    /// declared later still find it on their first evaluation.
    pub fn build(schema: &FormSchema, model: Value) -> Self {
        let form = Self {
            inner: Rc::new(FormInner {
                prefix: RefCell::new(String::new()),
                fields: RefCell::new(Vec::with_capacity(schema.fields.len())),
                model: RefCell::new(model.clone()),
                on_save: schema.on_save.clone(),
            }),
        };

        for field_schema in &schema.fields {
            let initial = model
                .get(&field_schema.name)
                .cloned()
                .or_else(|| field_schema.default.clone())
                .unwrap_or_else(|| field_schema.kind.zero_value());
            let field = Field::build(field_schema, initial);
            form.inner.fields.borrow_mut().push(field);
        }
        for field in form.fields() {
            field.attach(&form);
        }
        form
    }

    pub(crate) fn from_inner(inner: Rc<FormInner>) -> Self {
        Self { inner }
    }

    // ── Addressing ───────────────────────────────────────────────────

    /// The container's own address prefix (empty at the root).
    pub fn path(&self) -> String {
        self.inner.prefix.borrow().clone()
    }

    /// Rewrite the prefix and cascade into every field (and through them
    /// into nested and repeatable containers).
    pub(crate) fn set_prefix(&self, prefix: String) {
        *self.inner.prefix.borrow_mut() = prefix.clone();
        for field in self.fields() {
            field.set_prefix(prefix.clone());
        }
    }

    /// Look up an own field by name. Names are unique per container by
    /// schema contract; the first match wins.
    pub fn field(&self, name: &str) -> Option<Field> {
        self.inner
            .fields
            .borrow()
            .iter()
            .find(|field| field.name() == name)
            .cloned()
    }

    /// All own fields, in declaration order.
    pub fn fields(&self) -> Vec<Field> {
        self.inner.fields.borrow().clone()
    }

    /// Resolve a dotted/bracketed path against this container.
    pub fn field_at_path(&self, path: &str) -> Option<Field> {
        crate::path::resolve(self, path)
    }

    /// Like [`field_at_path`](Form::field_at_path), reporting the failed
    /// path in the error.
    pub fn try_field_at_path(&self, path: &str) -> Result<Field, FormError> {
        self.field_at_path(path)
            .ok_or_else(|| FormError::Unresolved(path.to_string()))
    }

    /// A sibling field's current value, read reactively. `None` when the
    /// field does not exist (yet) — cross-field validators treat that as
    /// "no constraint".
    pub fn value_of(&self, name: &str) -> Option<Value> {
        self.field(name).map(|field| field.value().get())
    }

    // ── Aggregate state ──────────────────────────────────────────────

    /// True iff every own field is error-free with no pending async
    /// validation AND every nested / repeatable container is recursively
    /// valid. Tracked: reading this inside an effect subscribes it.
    pub fn is_valid(&self) -> bool {
        self.fields().iter().all(branch_valid)
    }

    /// True if any field (recursively) diverges from its clean baseline.
    pub fn is_dirty(&self) -> bool {
        self.fields().iter().any(|field| {
            field.dirty().get()
                || match field.control() {
                    Control::Leaf => false,
                    Control::Group(form) => form.is_dirty(),
                    Control::Repeatable(array) => array.any_dirty(),
                }
        })
    }

    /// True if any field (recursively) has been touched.
    pub fn is_touched(&self) -> bool {
        self.fields().iter().any(|field| {
            field.touched().get()
                || match field.control() {
                    Control::Leaf => false,
                    Control::Group(form) => form.is_touched(),
                    Control::Repeatable(array) => array.any_touched(),
                }
        })
    }

    // ── Validation orchestration ─────────────────────────────────────

    /// Force every field to re-evaluate its composed validator immediately,
    /// recursing into nested and repeatable containers, and return overall
    /// validity.
    ///
    /// Side effect: every visited field becomes `touched`, so errors become
    /// visible. That is the deliberate UX contract of an explicit validate.
    /// Idempotent, and never toggles `dirty`.
    pub fn validate_form(&self) -> bool {
        let fields = self.fields();
        for field in &fields {
            field.touched().set(true);
            field.revalidate();
            match field.control() {
                Control::Leaf => {}
                Control::Group(form) => {
                    form.validate_form();
                }
                Control::Repeatable(array) => {
                    array.validate_all();
                }
            }
        }
        let valid = untrack(|| self.is_valid());
        tracing::debug!(path = %self.path(), valid, "validate_form");
        valid
    }

    /// Validate only the named own fields (a wizard step's slice), touching
    /// and forcing exactly those. Unknown names are skipped.
    pub(crate) fn validate_fields(&self, names: &[String]) -> bool {
        let fields: Vec<Field> = names.iter().filter_map(|name| self.field(name)).collect();
        for field in &fields {
            field.touched().set(true);
            field.revalidate();
            match field.control() {
                Control::Leaf => {}
                Control::Group(form) => {
                    form.validate_form();
                }
                Control::Repeatable(array) => {
                    array.validate_all();
                }
            }
        }
        untrack(|| fields.iter().all(branch_valid))
    }

    /// Run sync validation, then drive every async validator (recursively)
    /// to completion, and report settled validity.
    pub fn validate_async(&self) -> Pin<Box<dyn Future<Output = bool> + '_>> {
        Box::pin(async move {
            self.validate_form();
            let fields = self.fields();
            for field in &fields {
                field.validate_async().await;
                match field.control() {
                    Control::Leaf => {}
                    Control::Group(form) => {
                        form.validate_async().await;
                    }
                    Control::Repeatable(array) => {
                        for item in array.items() {
                            item.validate_async().await;
                        }
                    }
                }
            }
            untrack(|| self.is_valid())
        })
    }

    // ── Model lifecycle ──────────────────────────────────────────────

    /// Read-only projection of current field values into the model shape.
    /// Does not mutate dirty/touched, and does not subscribe a caller effect.
    pub fn value(&self) -> Value {
        let mut out = Value::map();
        for field in self.fields() {
            let entry = match field.control() {
                Control::Leaf => field.value().get_untracked(),
                Control::Group(form) => form.value(),
                Control::Repeatable(array) => array.value(),
            };
            out.set(field.name().to_string(), entry);
        }
        out
    }

    /// The backing model slice as of the last save (or construction).
    pub fn model(&self) -> Value {
        self.inner.model.borrow().clone()
    }

    /// Validate, and if valid materialize into the backing model, make the
    /// saved values the new clean baseline (clearing `dirty`), and fire the
    /// save callback with the materialized value.
    ///
    /// While invalid this refuses without mutating the model or firing the
    /// callback.
    pub fn save(&self) -> Result<Value, FormError> {
        if !self.validate_form() {
            tracing::debug!(path = %self.path(), "save refused: validation failed");
            return Err(FormError::Invalid);
        }
        let materialized = self.value();
        *self.inner.model.borrow_mut() = materialized.clone();
        self.commit_baselines();
        tracing::debug!(path = %self.path(), "saved");
        if let Some(on_save) = &self.inner.on_save {
            on_save(&materialized);
        }
        Ok(materialized)
    }

    /// Restore every field to its clean baseline, clearing touch state; the
    /// validation effects recompute errors from the restored values.
    pub fn reset(&self) {
        for field in self.fields() {
            field.reset_to_baseline();
        }
    }

    /// Shift every field's clean baseline to its current value and bring
    /// this container's model slice up to date. Recursion through `Group`
    /// fields keeps nested slices in step with the root on save.
    pub(crate) fn commit_baselines(&self) {
        for field in self.fields() {
            field.commit_baseline();
        }
        *self.inner.model.borrow_mut() = self.value();
    }

    /// Release all reactive resources owned by this container's fields.
    /// Called when an array item is removed; no node outlives its container.
    pub(crate) fn detach(&self) {
        for field in self.fields() {
            field.detach();
        }
        self.inner.fields.borrow_mut().clear();
    }
}

/// Own-field validity plus recursive container validity.
fn branch_valid(field: &Field) -> bool {
    field.is_valid()
        && match field.control() {
            Control::Leaf => true,
            Control::Group(form) => form.is_valid(),
            Control::Repeatable(array) => array.all_valid(),
        }
}

//! Field node: the atomic reactive unit of a form.
//!
//! A [`Field`] bundles the reactive cells for one form field (value, error,
//! dirty, touched, focus, validating), its validator list, an optional
//! raw-input parser, and its structural shape ([`Control`]): a plain leaf, a
//! nested sub-form, or a repeatable array of sub-forms.
//!
//! The cells are the sole mutation surface for collaborators: renderers read
//! them and call `value().set(..)`, `touched().set(true)`,
//! `request_focus()` — there is no back-door mutation path.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::form::array::ArrayForm;
use crate::form::container::{Form, FormInner};
use crate::reactive::{
    create_effect_with_id, create_memo, create_signal, dispose_effect, dispose_signal, untrack,
    EffectId, Memo, Signal,
};
use crate::schema::{FieldKind, FieldSchema};
use crate::validate::{self, Validator};
use crate::value::Value;

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

/// A field's structural shape. Exactly one variant — a field can own a
/// nested sub-form or a repeatable array of sub-forms, never both.
#[derive(Clone)]
pub enum Control {
    /// A plain value-holding field.
    Leaf,
    /// A single nested sub-form.
    Group(Form),
    /// A dynamic ordered sequence of sub-forms.
    Repeatable(ArrayForm),
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

pub(crate) struct FieldInner {
    name: String,
    label: Option<String>,
    /// Path of the owning container; `path()` appends the field name.
    /// Rewritten when the node's position changes (array reindexing).
    prefix: RefCell<String>,
    value: Signal<Value>,
    /// The "clean" comparison baseline for dirtiness. Reset on save.
    baseline: Signal<Value>,
    error: Signal<Option<String>>,
    touched: Signal<bool>,
    focus: Signal<bool>,
    validating: Signal<bool>,
    dirty: Memo<bool>,
    validators: Rc<[Validator]>,
    parser: Option<Rc<dyn Fn(&str) -> Value>>,
    control: Control,
    owner: RefCell<Weak<FormInner>>,
    /// The auto-tracking validation effect, installed at attach time.
    effect: Cell<Option<EffectId>>,
    /// Supersession counter for async validation (last-request-wins).
    ticket: Cell<u64>,
}

/// Handle to one field node. Cheap to clone.
#[derive(Clone)]
pub struct Field {
    pub(crate) inner: Rc<FieldInner>,
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("path", &self.path())
            .field("validators", &self.inner.validators.len())
            .finish()
    }
}

impl Field {
    /// Build a field from its schema and initial value. The field is inert
    /// until [`attach`](Field::attach)ed to its owning container.
    pub(crate) fn build(schema: &FieldSchema, initial: Value) -> Self {
        let control = match &schema.kind {
            FieldKind::Group(form_schema) => {
                Control::Group(Form::build(form_schema, initial.clone()))
            }
            FieldKind::List(array_schema) => {
                Control::Repeatable(ArrayForm::build(array_schema, initial.clone()))
            }
            _ => Control::Leaf,
        };

        let value = create_signal(initial.clone());
        let baseline = create_signal(initial);
        let dirty = create_memo(move || {
            let current = value.get();
            baseline.with(|clean| *clean != current)
        });

        Self {
            inner: Rc::new(FieldInner {
                name: schema.name.clone(),
                label: schema.label.clone(),
                prefix: RefCell::new(String::new()),
                value,
                baseline,
                error: create_signal(None),
                touched: create_signal(false),
                focus: create_signal(false),
                validating: create_signal(false),
                dirty,
                validators: schema.validators.clone().into(),
                parser: schema.parser.clone(),
                control,
                owner: RefCell::new(Weak::new()),
                effect: Cell::new(None),
                ticket: Cell::new(0),
            }),
        }
    }

    /// Wire the field into its owning container: record the owner, derive the
    /// path prefix, and install the auto-tracking validation effect.
    ///
    /// Installed after *all* sibling fields exist, so a cross-field validator
    /// establishes its dependency edges on the first run even when it reads a
    /// field declared later in the schema.
    pub(crate) fn attach(&self, owner: &Form) {
        *self.inner.owner.borrow_mut() = Rc::downgrade(&owner.inner);
        self.set_prefix(owner.path());

        let inner = self.inner.clone();
        let weak = Rc::downgrade(&owner.inner);
        let eid = create_effect_with_id(move || {
            let current = inner.value.get();
            let owner = weak.upgrade().map(Form::from_inner);
            let message = validate::evaluate(&inner.validators, &current, owner.as_ref());
            // Any change of input supersedes an in-flight async evaluation.
            inner.ticket.set(inner.ticket.get() + 1);
            if inner.validating.get_untracked() {
                inner.validating.set(false);
            }
            if inner.error.with_untracked(|previous| *previous != message) {
                inner.error.set(message);
            }
        });
        self.inner.effect.set(Some(eid));
    }

    /// Rewrite this node's container prefix and cascade into nested and
    /// repeatable sub-forms.
    pub(crate) fn set_prefix(&self, prefix: String) {
        *self.inner.prefix.borrow_mut() = prefix;
        match &self.inner.control {
            Control::Leaf => {}
            Control::Group(form) => form.set_prefix(self.path()),
            Control::Repeatable(array) => array.set_base(self.path()),
        }
    }

    /// Tear down reactive resources: the validation effect, the dirty memo,
    /// and every owned cell, recursing into nested containers. In-flight
    /// async validations are superseded and their results discarded.
    pub(crate) fn detach(&self) {
        if let Some(eid) = self.inner.effect.take() {
            dispose_effect(eid);
        }
        match &self.inner.control {
            Control::Leaf => {}
            Control::Group(form) => form.detach(),
            Control::Repeatable(array) => array.detach_all(),
        }
        self.inner.ticket.set(self.inner.ticket.get() + 1);
        self.inner.dirty.dispose();
        for id in [
            self.inner.value.id(),
            self.inner.baseline.id(),
            self.inner.error.id(),
            self.inner.touched.id(),
            self.inner.focus.id(),
            self.inner.validating.id(),
        ] {
            dispose_signal(id);
        }
    }

    // ── Identity ─────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn label(&self) -> Option<&str> {
        self.inner.label.as_deref()
    }

    /// Fully resolved address from the form root, e.g. `items[2].id`.
    /// Always resolvable back to this node while it remains attached.
    pub fn path(&self) -> String {
        let prefix = self.inner.prefix.borrow();
        if prefix.is_empty() {
            self.inner.name.clone()
        } else {
            format!("{}.{}", prefix, self.inner.name)
        }
    }

    // ── Reactive cells ───────────────────────────────────────────────

    /// The value cell. Consumers mutate through `set` / `update`.
    pub fn value(&self) -> Signal<Value> {
        self.inner.value
    }

    /// The current validation message, `None` while valid.
    pub fn error(&self) -> Signal<Option<String>> {
        self.inner.error
    }

    /// True while the value differs from the clean baseline (construction
    /// value, or the value at the last successful save).
    pub fn dirty(&self) -> Memo<bool> {
        self.inner.dirty
    }

    pub fn touched(&self) -> Signal<bool> {
        self.inner.touched
    }

    /// One-shot attention request. A collaborator sets it true (or calls
    /// [`request_focus`](Field::request_focus)) and it is cleared after a
    /// bounded time via [`release_focus_after`](Field::release_focus_after).
    pub fn focus(&self) -> Signal<bool> {
        self.inner.focus
    }

    /// True while an asynchronous validator is pending.
    pub fn validating(&self) -> Signal<bool> {
        self.inner.validating
    }

    // ── Structure ────────────────────────────────────────────────────

    pub fn control(&self) -> &Control {
        &self.inner.control
    }

    /// The nested sub-form, for `Group` fields.
    pub fn subform(&self) -> Option<Form> {
        match &self.inner.control {
            Control::Group(form) => Some(form.clone()),
            _ => None,
        }
    }

    /// The array manager, for `Repeatable` fields.
    pub fn repeatable(&self) -> Option<ArrayForm> {
        match &self.inner.control {
            Control::Repeatable(array) => Some(array.clone()),
            _ => None,
        }
    }

    /// The current ordered sequence of item containers, for `Repeatable`
    /// fields.
    pub fn repeatable_forms(&self) -> Option<Vec<Form>> {
        self.repeatable().map(|array| array.items())
    }

    // ── Validation ───────────────────────────────────────────────────

    /// Whether any validator carries the `required` metadata tag. Answered
    /// without running validators.
    pub fn is_required(&self) -> bool {
        validate::any_required(&self.inner.validators)
    }

    /// Own-state validity: no error and no pending async validator. Nested
    /// containers are aggregated by the owning [`Form`].
    ///
    /// Reads are tracked, so calling this inside an effect subscribes it.
    pub fn is_valid(&self) -> bool {
        self.inner.error.with(Option::is_none) && !self.inner.validating.get()
    }

    pub(crate) fn is_valid_untracked(&self) -> bool {
        self.inner.error.with_untracked(Option::is_none)
            && !self.inner.validating.get_untracked()
    }

    /// Re-run the composed sync validator immediately and update the error
    /// cell. Untracked: safe to call from inside a consumer effect.
    pub fn revalidate(&self) -> bool {
        let current = self.inner.value.get_untracked();
        let owner = self.inner.owner.borrow().upgrade().map(Form::from_inner);
        let message = untrack(|| validate::evaluate(&self.inner.validators, &current, owner.as_ref()));
        if self.inner.error.with_untracked(|previous| *previous != message) {
            self.inner.error.set(message);
        }
        self.inner.error.with_untracked(Option::is_none)
    }

    /// Drive this field's asynchronous validators to completion.
    ///
    /// Bumps the supersession ticket, flags `validating`, and awaits each
    /// async validator in declared order (first message wins). A resolution
    /// that is no longer the latest request is discarded rather than
    /// overwriting `error` with stale results. An async message never
    /// overrides a present sync error (sync rules are declared first).
    ///
    /// Returns own-state validity once settled.
    pub async fn validate_async(&self) -> bool {
        if !self.inner.validators.iter().any(Validator::is_async) {
            return self.is_valid_untracked();
        }
        let owner = self.inner.owner.borrow().upgrade().map(Form::from_inner);
        let Some(owner) = owner else {
            return self.is_valid_untracked();
        };

        let ticket = self.inner.ticket.get() + 1;
        self.inner.ticket.set(ticket);
        self.inner.validating.set(true);
        let current = self.inner.value.get_untracked();

        let mut message = None;
        for validator in self.inner.validators.iter() {
            if let Some(future) = validator.run_async(current.clone(), owner.clone()) {
                if let Some(found) = future.await {
                    message = Some(found);
                    break;
                }
            }
        }

        if self.inner.ticket.get() != ticket {
            tracing::trace!(path = %self.path(), "stale async validation discarded");
            return self.is_valid_untracked();
        }

        self.inner.validating.set(false);
        if message.is_some() && self.inner.error.with_untracked(Option::is_none) {
            self.inner.error.set(message);
        }
        self.is_valid_untracked()
    }

    // ── Input and lifecycle helpers ──────────────────────────────────

    /// Feed raw external input through the parser (if any) into the value
    /// cell, and mark the field touched.
    pub fn input(&self, raw: &str) {
        let parsed = match &self.inner.parser {
            Some(parser) => parser(raw),
            None => Value::Text(raw.to_string()),
        };
        self.inner.value.set(parsed);
        self.inner.touched.set(true);
    }

    /// Request attention: sets the one-shot `focus` cell.
    pub fn request_focus(&self) {
        self.inner.focus.set(true);
    }

    /// Clear the `focus` cell after a bounded delay. Harmless if the field
    /// was detached in the meantime.
    pub async fn release_focus_after(&self, after: Duration) {
        tokio::time::sleep(after).await;
        self.inner.focus.set(false);
    }

    /// Make the current value the new clean baseline (post-save state).
    pub(crate) fn commit_baseline(&self) {
        self.inner.baseline.set(self.inner.value.get_untracked());
        match &self.inner.control {
            Control::Leaf => {}
            Control::Group(form) => form.commit_baselines(),
            Control::Repeatable(array) => array.commit_baselines(),
        }
    }

    /// Restore the clean baseline and clear touch state. The validation
    /// effect recomputes `error` from the restored value.
    pub(crate) fn reset_to_baseline(&self) {
        self.inner.value.set(self.inner.baseline.get_untracked());
        self.inner.touched.set(false);
        match &self.inner.control {
            Control::Leaf => {}
            Control::Group(form) => form.reset(),
            Control::Repeatable(array) => array.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSchema;
    use crate::validate::Validator;

    fn leaf(schema: FieldSchema, initial: Value) -> Field {
        Field::build(&schema, initial)
    }

    #[test]
    fn path_without_prefix_is_the_name() {
        let field = leaf(FieldSchema::text("name"), Value::from(""));
        assert_eq!(field.path(), "name");
    }

    #[test]
    fn path_with_prefix_is_dotted() {
        let field = leaf(FieldSchema::text("street"), Value::from(""));
        field.set_prefix("address".into());
        assert_eq!(field.path(), "address.street");
    }

    #[test]
    fn dirty_tracks_baseline_divergence() {
        let field = leaf(FieldSchema::text("name"), Value::from("ada"));
        assert!(!field.dirty().get());
        field.value().set(Value::from("grace"));
        assert!(field.dirty().get());
        field.value().set(Value::from("ada"));
        assert!(!field.dirty().get());
    }

    #[test]
    fn commit_baseline_clears_dirty() {
        let field = leaf(FieldSchema::text("name"), Value::from("ada"));
        field.value().set(Value::from("grace"));
        assert!(field.dirty().get());
        field.commit_baseline();
        assert!(!field.dirty().get());
        // The baseline moved: reverting to the original is now a change.
        field.value().set(Value::from("ada"));
        assert!(field.dirty().get());
    }

    #[test]
    fn reset_restores_baseline_and_clears_touched() {
        let field = leaf(FieldSchema::text("name"), Value::from("ada"));
        field.value().set(Value::from("grace"));
        field.touched().set(true);
        field.reset_to_baseline();
        assert_eq!(field.value().get(), Value::from("ada"));
        assert!(!field.touched().get());
    }

    #[test]
    fn input_uses_parser_and_touches() {
        let field = leaf(FieldSchema::integer("age"), Value::Null);
        field.input("42");
        assert_eq!(field.value().get(), Value::Int(42));
        assert!(field.touched().get());
        field.input("not a number");
        assert_eq!(field.value().get(), Value::from("not a number"));
    }

    #[test]
    fn input_without_parser_stores_text() {
        let field = leaf(FieldSchema::text("name"), Value::Null);
        field.input("ada");
        assert_eq!(field.value().get(), Value::from("ada"));
    }

    #[test]
    fn required_metadata_readable_without_running() {
        let field = leaf(
            FieldSchema::text("name").required("name is required"),
            Value::Null,
        );
        assert!(field.is_required());
        // Nothing evaluated yet: error cell still clean.
        assert_eq!(field.error().get(), None);
    }

    #[test]
    fn revalidate_writes_the_error_cell() {
        let field = leaf(
            FieldSchema::text("name").with_validator(Validator::min_len(3, "too short")),
            Value::from("ab"),
        );
        assert!(!field.revalidate());
        assert_eq!(field.error().get(), Some("too short".to_string()));
        field.value().set(Value::from("abc"));
        assert!(field.revalidate());
        assert_eq!(field.error().get(), None);
    }

    #[test]
    fn leaf_has_no_nested_accessors() {
        let field = leaf(FieldSchema::text("name"), Value::Null);
        assert!(field.subform().is_none());
        assert!(field.repeatable().is_none());
        assert!(field.repeatable_forms().is_none());
    }

    #[test]
    fn focus_request_sets_the_cell() {
        let field = leaf(FieldSchema::text("name"), Value::Null);
        assert!(!field.focus().get());
        field.request_focus();
        assert!(field.focus().get());
    }

    #[tokio::test]
    async fn focus_release_clears_after_delay() {
        let field = leaf(FieldSchema::text("name"), Value::Null);
        field.request_focus();
        field.release_focus_after(Duration::from_millis(1)).await;
        assert!(!field.focus().get());
    }

    #[test]
    fn detach_disposes_cells() {
        let field = leaf(FieldSchema::text("name"), Value::from("x"));
        field.detach();
        // Writes through stale handles are no-ops, not panics.
        field.value().set(Value::from("y"));
        field.touched().set(true);
    }
}

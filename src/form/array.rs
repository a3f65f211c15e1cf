//! Repeatable arrays of sub-forms.
//!
//! An [`ArrayForm`] manages the dynamic ordered sequence of item containers
//! behind a `Repeatable` field: appending and removing items, keeping every
//! item's address prefix (`items[0]`, `items[1]`, …) consistent with its
//! current position, and rolling validity / dirtiness / touch state up over
//! the sequence.
//!
//! Structural mutations bump an internal generation signal, so aggregate
//! reads made inside an effect re-run when items are added or removed, not
//! just when existing item values change.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::FormError;
use crate::form::container::Form;
use crate::reactive::{create_signal, dispose_signal, Signal};
use crate::schema::{ArraySchema, FormSchema};
use crate::value::Value;

pub(crate) struct ArrayInner {
    /// Address of the owning field, e.g. `items` or `orders[1].lines`.
    /// Item `n` lives at `{base}[{n}]`.
    base: RefCell<String>,
    item_schema: FormSchema,
    default_item: Value,
    items: RefCell<Vec<Form>>,
    /// The model slice this manager exclusively owns. Mirrors `items` after
    /// every mutation; rewritten with materialized values on save.
    backing: RefCell<Vec<Value>>,
    /// Item values as of the last save (or construction): the structural
    /// baseline that `reset` restores.
    saved: RefCell<Vec<Value>>,
    /// Bumped on every structural mutation; aggregate reads track it.
    generation: Signal<u64>,
    on_item_add: Option<Rc<dyn Fn(usize, &Form)>>,
    on_item_remove: Option<Rc<dyn Fn(usize)>>,
}

/// Handle to one repeatable array manager. Cheap to clone.
#[derive(Clone)]
pub struct ArrayForm {
    pub(crate) inner: Rc<ArrayInner>,
}

impl std::fmt::Debug for ArrayForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayForm")
            .field("base", &self.inner.base.borrow())
            .field("len", &self.len())
            .finish()
    }
}

impl ArrayForm {
    /// Build the manager and one item container per entry of the initial
    /// list value. Prefixes are assigned when the owning field attaches.
    pub(crate) fn build(schema: &ArraySchema, initial: Value) -> Self {
        let seed: Vec<Value> = initial.as_list().map(<[Value]>::to_vec).unwrap_or_default();
        let array = Self {
            inner: Rc::new(ArrayInner {
                base: RefCell::new(String::new()),
                item_schema: schema.item.clone(),
                default_item: schema.default_item.clone(),
                items: RefCell::new(Vec::with_capacity(seed.len())),
                backing: RefCell::new(seed.clone()),
                saved: RefCell::new(seed.clone()),
                generation: create_signal(0u64),
                on_item_add: schema.on_item_add.clone(),
                on_item_remove: schema.on_item_remove.clone(),
            }),
        };
        for value in seed {
            let item = Form::build(&array.inner.item_schema, value);
            array.inner.items.borrow_mut().push(item);
        }
        array
    }

    // ── Structure ────────────────────────────────────────────────────

    /// Current item containers, in order.
    pub fn items(&self) -> Vec<Form> {
        self.inner.items.borrow().clone()
    }

    pub fn item(&self, index: usize) -> Option<Form> {
        self.inner.items.borrow().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Append a new item container seeded from `value`, or from the schema's
    /// default-item template when `None`. The new container is addressed at
    /// `{base}[{len}]` before the add callback fires.
    pub fn add_item(&self, value: Option<Value>) -> Form {
        let seed = value.unwrap_or_else(|| self.inner.default_item.clone());
        let item = Form::build(&self.inner.item_schema, seed.clone());

        let index = {
            let mut items = self.inner.items.borrow_mut();
            let index = items.len();
            self.inner.backing.borrow_mut().push(seed);
            item.set_prefix(self.item_prefix(index));
            items.push(item.clone());
            index
        };
        self.bump_generation();
        tracing::debug!(path = %item.path(), "array item added");

        if let Some(on_item_add) = &self.inner.on_item_add {
            on_item_add(index, &item);
        }
        item
    }

    /// Remove the item at `index`, release its reactive resources, and
    /// rewrite the prefixes of every item that shifted down.
    pub fn remove_item(&self, index: usize) -> Result<(), FormError> {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            if index >= items.len() {
                return Err(FormError::IndexOutOfBounds {
                    index,
                    len: items.len(),
                });
            }
            self.inner.backing.borrow_mut().remove(index);
            let removed = items.remove(index);
            for (i, item) in items.iter().enumerate().skip(index) {
                item.set_prefix(self.item_prefix(i));
            }
            removed
        };
        removed.detach();
        self.bump_generation();
        tracing::debug!(base = %self.inner.base.borrow(), index, "array item removed");

        if let Some(on_item_remove) = &self.inner.on_item_remove {
            on_item_remove(index);
        }
        Ok(())
    }

    /// Rewrite the base address and reindex every item under it.
    pub(crate) fn set_base(&self, base: String) {
        *self.inner.base.borrow_mut() = base;
        for (i, item) in self.items().iter().enumerate() {
            item.set_prefix(self.item_prefix(i));
        }
    }

    fn item_prefix(&self, index: usize) -> String {
        format!("{}[{}]", self.inner.base.borrow(), index)
    }

    fn bump_generation(&self) {
        self.inner.generation.update(|g| *g += 1);
    }

    // ── Aggregates ───────────────────────────────────────────────────

    /// True iff every item container is recursively valid. Tracked, and
    /// sensitive to structural mutation via the generation signal.
    pub fn all_valid(&self) -> bool {
        self.inner.generation.get();
        self.items().iter().all(Form::is_valid)
    }

    /// True if any item diverges from its baseline, or the sequence itself
    /// grew or shrank since the last save.
    pub fn any_dirty(&self) -> bool {
        self.inner.generation.get();
        self.len() != self.inner.saved.borrow().len()
            || self.items().iter().any(Form::is_dirty)
    }

    pub fn any_touched(&self) -> bool {
        self.inner.generation.get();
        self.items().iter().any(Form::is_touched)
    }

    /// Force validation of every item container; true iff all are valid.
    pub fn validate_all(&self) -> bool {
        let mut valid = true;
        for item in self.items() {
            valid &= item.validate_form();
        }
        valid
    }

    /// Project current item values into a list.
    pub fn value(&self) -> Value {
        Value::List(self.items().iter().map(Form::value).collect())
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Make the current items and their materialized values the new
    /// structural baseline, and bring the model slice up to date.
    pub(crate) fn commit_baselines(&self) {
        let items = self.items();
        for item in &items {
            item.commit_baselines();
        }
        let materialized: Vec<Value> = items.iter().map(Form::value).collect();
        *self.inner.backing.borrow_mut() = materialized.clone();
        *self.inner.saved.borrow_mut() = materialized;
    }

    /// Restore the structural baseline. Items that survived are reset in
    /// place; if the sequence grew or shrank since the last save, the whole
    /// sequence is rebuilt from the saved values.
    pub(crate) fn reset(&self) {
        let saved = self.inner.saved.borrow().clone();
        if self.len() == saved.len() {
            for item in self.items() {
                item.reset();
            }
            return;
        }
        for item in self.items() {
            item.detach();
        }
        self.inner.items.borrow_mut().clear();
        *self.inner.backing.borrow_mut() = saved.clone();
        for (i, value) in saved.into_iter().enumerate() {
            let item = Form::build(&self.inner.item_schema, value);
            item.set_prefix(self.item_prefix(i));
            self.inner.items.borrow_mut().push(item);
        }
        self.bump_generation();
    }

    /// Release every item's reactive resources and the generation signal.
    pub(crate) fn detach_all(&self) {
        for item in self.items() {
            item.detach();
        }
        self.inner.items.borrow_mut().clear();
        dispose_signal(self.inner.generation.id());
    }
}

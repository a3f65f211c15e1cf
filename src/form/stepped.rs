//! Stepped (wizard) forms.
//!
//! A [`SteppedForm`] wraps one underlying container and partitions its fields
//! into ordered steps. Navigation is gated: advancing validates the current
//! step's slice and refuses while it is invalid, while moving backwards is
//! always allowed. The step cursor is a reactive cell, so renderers tracking
//! it re-run on navigation.

use crate::error::FormError;
use crate::form::container::Form;
use crate::form::field::Field;
use crate::reactive::{create_signal, Signal};
use crate::schema::{Step, SteppedSchema};
use crate::value::Value;

/// Handle to one wizard. Cheap to clone.
#[derive(Clone)]
pub struct SteppedForm {
    form: Form,
    steps: Vec<Step>,
    /// Current step index; writes go through navigation methods only.
    current: Signal<usize>,
}

impl std::fmt::Debug for SteppedForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SteppedForm")
            .field("step", &self.current_step())
            .field("steps", &self.steps.len())
            .finish()
    }
}

impl SteppedForm {
    /// Build the underlying container and place the cursor on step 0.
    pub fn build(schema: &SteppedSchema, model: Value) -> Self {
        Self {
            form: Form::build(&schema.form, model),
            steps: schema.steps.clone(),
            current: create_signal(0),
        }
    }

    /// The underlying container; fields, paths, and values are addressed
    /// through it regardless of which step they belong to.
    pub fn form(&self) -> &Form {
        &self.form
    }

    // ── Cursor ───────────────────────────────────────────────────────

    /// The current step index. Tracked: reading inside an effect subscribes.
    pub fn current_step(&self) -> usize {
        self.current.get()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step() + 1 >= self.steps.len()
    }

    pub fn current_title(&self) -> Option<String> {
        self.steps
            .get(self.current_step())
            .and_then(|step| step.title())
            .map(str::to_string)
    }

    /// The field nodes belonging to the current step, in step order.
    pub fn step_fields(&self) -> Vec<Field> {
        self.steps
            .get(self.current_step())
            .map(|step| {
                step.field_names()
                    .iter()
                    .filter_map(|name| self.form.field(name))
                    .collect()
            })
            .unwrap_or_default()
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Validate only the current step's fields, touching them.
    pub fn validate_step(&self) -> bool {
        match self.steps.get(self.current.get_untracked()) {
            Some(step) => self.form.validate_fields(step.field_names()),
            None => true,
        }
    }

    /// Advance to the next step. Refuses (returning `false`) on the last
    /// step or while the current step's fields are invalid; the validation
    /// side effect still touches them so errors become visible.
    pub fn next(&self) -> bool {
        let at = self.current.get_untracked();
        if at + 1 >= self.steps.len() {
            return false;
        }
        if !self.validate_step() {
            tracing::debug!(step = at, "step advance refused: validation failed");
            return false;
        }
        self.current.set(at + 1);
        true
    }

    /// Move back one step. Never validates; returns `false` only on step 0.
    pub fn previous(&self) -> bool {
        let at = self.current.get_untracked();
        if at == 0 {
            return false;
        }
        self.current.set(at - 1);
        true
    }

    /// Jump directly to a step. Backward (or same-step) jumps are free;
    /// forward jumps are refused; steps are passed through
    /// [`next`](SteppedForm::next) one gate at a time.
    pub fn go_to(&self, step: usize) -> Result<(), FormError> {
        if step >= self.steps.len() {
            return Err(FormError::IndexOutOfBounds {
                index: step,
                len: self.steps.len(),
            });
        }
        let at = self.current.get_untracked();
        if step > at {
            return Err(FormError::Invalid);
        }
        if step != at {
            self.current.set(step);
        }
        Ok(())
    }

    /// Save the whole underlying form: every field validates, not just the
    /// steps already visited.
    pub fn save(&self) -> Result<Value, FormError> {
        self.form.save()
    }
}

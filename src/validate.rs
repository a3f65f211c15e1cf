//! Validators and their composition into one evaluation per field.
//!
//! A field carries an ordered list of [`Validator`]s. Evaluation runs them in
//! declared order and the first one returning a message short-circuits the
//! rest. A validator may carry a `required` metadata tag that consumers can
//! read without running anything (e.g. to mark a control required).
//!
//! Three shapes are supported:
//! - value-only: `Fn(&Value) -> Option<String>`;
//! - form-aware: `Fn(&Value, &Form) -> Option<String>` — reads sibling fields
//!   through the container, which establishes reactive dependency edges, so
//!   cross-field (and cross-step) rules re-evaluate when the dependency
//!   changes. A dependency that does not exist in the container must be
//!   treated as "no constraint", never as a failure;
//! - async: returns a future; driven by the field's async path with
//!   last-request-wins supersession.
//!
//! Validators are pure with respect to engine state: they read cells and
//! return a message, they never mutate the form.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::form::Form;
use crate::value::Value;

/// Future produced by an async validator. Single-threaded, so not `Send`.
pub type ValidationFuture = Pin<Box<dyn Future<Output = Option<String>>>>;

enum Rule {
    Value(Box<dyn Fn(&Value) -> Option<String>>),
    WithForm(Box<dyn Fn(&Value, &Form) -> Option<String>>),
    Async(Box<dyn Fn(Value, Form) -> ValidationFuture>),
}

/// One validation rule plus its inspectable metadata. Cheap to clone.
#[derive(Clone)]
pub struct Validator {
    required: bool,
    rule: Rc<Rule>,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shape = match *self.rule {
            Rule::Value(_) => "value",
            Rule::WithForm(_) => "with-form",
            Rule::Async(_) => "async",
        };
        f.debug_struct("Validator")
            .field("shape", &shape)
            .field("required", &self.required)
            .finish()
    }
}

impl Validator {
    /// A value-only validator.
    pub fn new(f: impl Fn(&Value) -> Option<String> + 'static) -> Self {
        Self {
            required: false,
            rule: Rc::new(Rule::Value(Box::new(f))),
        }
    }

    /// A form-aware validator. The second argument is the owning container;
    /// read sibling fields through it to establish dependency edges.
    pub fn with_form(f: impl Fn(&Value, &Form) -> Option<String> + 'static) -> Self {
        Self {
            required: false,
            rule: Rc::new(Rule::WithForm(Box::new(f))),
        }
    }

    /// An asynchronous validator. Excluded from synchronous composition;
    /// driven by [`Field::validate_async`](crate::form::Field::validate_async).
    pub fn async_fn<Fut>(f: impl Fn(Value, Form) -> Fut + 'static) -> Self
    where
        Fut: Future<Output = Option<String>> + 'static,
    {
        Self {
            required: false,
            rule: Rc::new(Rule::Async(Box::new(move |value, form| {
                Box::pin(f(value, form))
            }))),
        }
    }

    /// Tag this validator as marking its field required (builder).
    pub fn mark_required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Metadata read without invocation.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether this rule is asynchronous.
    pub fn is_async(&self) -> bool {
        matches!(*self.rule, Rule::Async(_))
    }

    // ── Built-in rules ───────────────────────────────────────────────

    /// Rejects empty values (`Null`, empty text, empty list). Carries the
    /// `required` tag.
    pub fn required(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |value| value.is_empty().then(|| message.clone())).mark_required()
    }

    /// Minimum text length in characters.
    pub fn min_len(min: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |value| match value.as_str() {
            Some(s) if s.chars().count() < min => Some(message.clone()),
            _ => None,
        })
    }

    /// Maximum text length in characters.
    pub fn max_len(max: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |value| match value.as_str() {
            Some(s) if s.chars().count() > max => Some(message.clone()),
            _ => None,
        })
    }

    /// Inclusive integer range. Non-numeric values pass (pair with a kind or
    /// parser constraint when the field must be numeric).
    pub fn int_range(min: i64, max: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |value| match value.as_int() {
            Some(n) if n < min || n > max => Some(message.clone()),
            _ => None,
        })
    }

    /// Restricts text values to a fixed option set.
    pub fn one_of(options: Vec<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |value| match value.as_str() {
            Some(s) if !options.iter().any(|o| o == s) => Some(message.clone()),
            _ => None,
        })
    }

    pub(crate) fn run_sync(&self, value: &Value, form: Option<&Form>) -> Option<String> {
        match &*self.rule {
            Rule::Value(f) => f(value),
            // No container in scope yet: no constraint.
            Rule::WithForm(f) => form.and_then(|form| f(value, form)),
            Rule::Async(_) => None,
        }
    }

    pub(crate) fn run_async(&self, value: Value, form: Form) -> Option<ValidationFuture> {
        match &*self.rule {
            Rule::Async(f) => Some(f(value, form)),
            _ => None,
        }
    }
}

/// Run the sync portion of a validator list in declared order; the first
/// message wins and short-circuits the remainder.
pub(crate) fn evaluate(
    validators: &[Validator],
    value: &Value,
    form: Option<&Form>,
) -> Option<String> {
    validators
        .iter()
        .find_map(|validator| validator.run_sync(value, form))
}

/// Whether any validator in the list carries the `required` tag.
pub(crate) fn any_required(validators: &[Validator]) -> bool {
    validators.iter().any(Validator::is_required)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_empty_and_tags_metadata() {
        let v = Validator::required("name is required");
        assert!(v.is_required());
        assert_eq!(
            v.run_sync(&Value::Null, None),
            Some("name is required".to_string())
        );
        assert_eq!(v.run_sync(&Value::from("ada"), None), None);
    }

    #[test]
    fn plain_validator_carries_no_required_tag() {
        let v = Validator::min_len(2, "too short");
        assert!(!v.is_required());
    }

    #[test]
    fn first_message_wins() {
        let validators = vec![
            Validator::required("required"),
            Validator::min_len(3, "too short"),
        ];
        assert_eq!(
            evaluate(&validators, &Value::from(""), None),
            Some("required".to_string())
        );
        assert_eq!(
            evaluate(&validators, &Value::from("ab"), None),
            Some("too short".to_string())
        );
        assert_eq!(evaluate(&validators, &Value::from("abc"), None), None);
    }

    #[test]
    fn declared_order_short_circuits() {
        // Both rules fire on the same input; order decides the message.
        let validators = vec![
            Validator::max_len(1, "first"),
            Validator::max_len(1, "second"),
        ];
        assert_eq!(
            evaluate(&validators, &Value::from("xyz"), None),
            Some("first".to_string())
        );
    }

    #[test]
    fn int_range_bounds_inclusive() {
        let v = Validator::int_range(0, 120, "out of range");
        assert_eq!(v.run_sync(&Value::Int(0), None), None);
        assert_eq!(v.run_sync(&Value::Int(120), None), None);
        assert_eq!(
            v.run_sync(&Value::Int(121), None),
            Some("out of range".to_string())
        );
        // Non-numeric passes.
        assert_eq!(v.run_sync(&Value::from("n/a"), None), None);
    }

    #[test]
    fn one_of_accepts_only_listed_options() {
        let v = Validator::one_of(vec!["a".into(), "b".into()], "unknown option");
        assert_eq!(v.run_sync(&Value::from("a"), None), None);
        assert_eq!(
            v.run_sync(&Value::from("c"), None),
            Some("unknown option".to_string())
        );
    }

    #[test]
    fn with_form_without_container_is_no_constraint() {
        let v = Validator::with_form(|_, _| Some("should not fire".into()));
        assert_eq!(v.run_sync(&Value::Null, None), None);
    }

    #[test]
    fn async_rules_are_skipped_by_sync_evaluation() {
        let validators = vec![Validator::async_fn(|_, _| async {
            Some("async message".to_string())
        })];
        assert_eq!(evaluate(&validators, &Value::Null, None), None);
        assert!(validators[0].is_async());
    }

    #[test]
    fn any_required_scans_metadata_only() {
        let validators = vec![
            Validator::min_len(1, "x"),
            Validator::required("y"),
        ];
        assert!(any_required(&validators));
        assert!(!any_required(&validators[..1]));
    }
}

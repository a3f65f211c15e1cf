//! Declarative form schemas.
//!
//! A schema describes a form's fields, validators, and callbacks; containers
//! are built from it at form-build time ([`Form::build`](crate::form::Form)).
//! Schemas are cheap to clone (callbacks and parsers are `Rc`) and consumed
//! by reference, so the same item schema can seed every element of a
//! repeatable array.
//!
//! Construction follows the builder idiom: kind-specific constructors plus
//! chained `with_*` methods.

use std::rc::Rc;

use crate::form::Form;
use crate::validate::Validator;
use crate::value::Value;

// ---------------------------------------------------------------------------
// FieldKind
// ---------------------------------------------------------------------------

/// What a field holds. `Group` and `List` are the two structured shapes: a
/// single nested sub-form and a repeatable array of sub-forms. A field is
/// exactly one of these — it can never be both.
#[derive(Clone)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    Flag,
    /// Text constrained to an option set (presentation reads the options;
    /// enforcement is a validator concern).
    Choice(Vec<String>),
    /// A nested sub-form.
    Group(FormSchema),
    /// A repeatable array of sub-forms.
    List(Box<ArraySchema>),
}

impl FieldKind {
    /// The construction-time default when neither the model nor the schema
    /// supplies a value.
    pub fn zero_value(&self) -> Value {
        match self {
            FieldKind::Text | FieldKind::Choice(_) => Value::Text(String::new()),
            FieldKind::Integer => Value::Null,
            FieldKind::Decimal => Value::Null,
            FieldKind::Flag => Value::Bool(false),
            FieldKind::Group(_) => Value::map(),
            FieldKind::List(_) => Value::List(Vec::new()),
        }
    }
}

impl std::fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Text => write!(f, "Text"),
            FieldKind::Integer => write!(f, "Integer"),
            FieldKind::Decimal => write!(f, "Decimal"),
            FieldKind::Flag => write!(f, "Flag"),
            FieldKind::Choice(options) => f.debug_tuple("Choice").field(options).finish(),
            FieldKind::Group(_) => write!(f, "Group(..)"),
            FieldKind::List(_) => write!(f, "List(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// FieldSchema
// ---------------------------------------------------------------------------

/// Declarative descriptor for one field.
#[derive(Clone)]
pub struct FieldSchema {
    pub(crate) name: String,
    pub(crate) label: Option<String>,
    pub(crate) kind: FieldKind,
    pub(crate) validators: Vec<Validator>,
    pub(crate) default: Option<Value>,
    pub(crate) parser: Option<Rc<dyn Fn(&str) -> Value>>,
}

impl FieldSchema {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind,
            validators: Vec::new(),
            default: None,
            parser: None,
        }
    }

    /// A free-text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// An integer field. Installs a parser that turns clean numeric input
    /// into `Value::Int` and keeps anything else as raw text for validators
    /// to reject.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer).with_parser(|raw| match raw.trim().parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Text(raw.to_string()),
        })
    }

    /// A floating-point field, parsed like [`integer`](FieldSchema::integer).
    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Decimal).with_parser(|raw| match raw.trim().parse::<f64>() {
            Ok(n) => Value::Float(n),
            Err(_) => Value::Text(raw.to_string()),
        })
    }

    /// A boolean field.
    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Flag)
    }

    /// A text field with a fixed option set.
    pub fn choice(name: impl Into<String>, options: Vec<String>) -> Self {
        Self::new(name, FieldKind::Choice(options))
    }

    /// A nested sub-form field.
    pub fn group(name: impl Into<String>, schema: FormSchema) -> Self {
        Self::new(name, FieldKind::Group(schema))
    }

    /// A repeatable array-of-sub-forms field.
    pub fn list(name: impl Into<String>, schema: ArraySchema) -> Self {
        Self::new(name, FieldKind::List(Box::new(schema)))
    }

    /// Set the display label (builder).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Append a validator (builder). Declaration order is evaluation order.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Shorthand for appending [`Validator::required`] (builder).
    pub fn required(self, message: impl Into<String>) -> Self {
        self.with_validator(Validator::required(message))
    }

    /// Set the default value used when the model has none (builder).
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Replace the raw-input parser (builder).
    pub fn with_parser(mut self, parser: impl Fn(&str) -> Value + 'static) -> Self {
        self.parser = Some(Rc::new(parser));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }
}

impl std::fmt::Debug for FieldSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSchema")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("validators", &self.validators.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// FormSchema
// ---------------------------------------------------------------------------

/// Ordered field descriptors for one form (or one array item, or the form
/// under a wizard). Field order is meaningful: it defines traversal, display,
/// and step-partition order.
#[derive(Clone, Default)]
pub struct FormSchema {
    pub(crate) fields: Vec<FieldSchema>,
    pub(crate) on_save: Option<Rc<dyn Fn(&Value)>>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field (builder).
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the save callback, fired with the materialized value (builder).
    pub fn on_save(mut self, f: impl Fn(&Value) + 'static) -> Self {
        self.on_save = Some(Rc::new(f));
        self
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }
}

// ---------------------------------------------------------------------------
// ArraySchema
// ---------------------------------------------------------------------------

/// Descriptor for a repeatable array of sub-forms: the per-item schema, the
/// template appended when no explicit item is given, and mutation callbacks.
#[derive(Clone)]
pub struct ArraySchema {
    pub(crate) item: FormSchema,
    pub(crate) default_item: Value,
    pub(crate) on_item_add: Option<Rc<dyn Fn(usize, &Form)>>,
    pub(crate) on_item_remove: Option<Rc<dyn Fn(usize)>>,
}

impl ArraySchema {
    pub fn new(item: FormSchema) -> Self {
        Self {
            item,
            default_item: Value::map(),
            on_item_add: None,
            on_item_remove: None,
        }
    }

    /// Set the template value for [`ArrayForm::add_item`](crate::form::ArrayForm::add_item)
    /// calls without an explicit item (builder).
    pub fn default_item(mut self, value: Value) -> Self {
        self.default_item = value;
        self
    }

    /// Callback fired after an item container is built and indexed (builder).
    pub fn on_item_add(mut self, f: impl Fn(usize, &Form) + 'static) -> Self {
        self.on_item_add = Some(Rc::new(f));
        self
    }

    /// Callback fired after an item is removed and paths are repaired (builder).
    pub fn on_item_remove(mut self, f: impl Fn(usize) + 'static) -> Self {
        self.on_item_remove = Some(Rc::new(f));
        self
    }
}

// ---------------------------------------------------------------------------
// SteppedSchema
// ---------------------------------------------------------------------------

/// One step of a wizard: a title and the names of the fields it gates.
#[derive(Clone, Debug)]
pub struct Step {
    pub(crate) title: Option<String>,
    pub(crate) fields: Vec<String>,
}

impl Step {
    pub fn new(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            title: None,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Set the step title (builder).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn field_names(&self) -> &[String] {
        &self.fields
    }
}

/// A form schema partitioned into ordered steps.
#[derive(Clone)]
pub struct SteppedSchema {
    pub(crate) form: FormSchema,
    pub(crate) steps: Vec<Step>,
}

impl SteppedSchema {
    pub fn new(form: FormSchema) -> Self {
        Self {
            form,
            steps: Vec::new(),
        }
    }

    /// Append a step (builder). Step order is navigation order.
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain_collects_fields_in_order() {
        let schema = FormSchema::new()
            .field(FieldSchema::text("name").required("name is required"))
            .field(FieldSchema::integer("age").with_label("Age"));
        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.fields()[0].name(), "name");
        assert_eq!(schema.fields()[1].name(), "age");
    }

    #[test]
    fn integer_parser_produces_typed_values() {
        let schema = FieldSchema::integer("age");
        let parser = schema.parser.as_ref().unwrap();
        assert_eq!(parser(" 42 "), Value::Int(42));
        assert_eq!(parser("nope"), Value::Text("nope".into()));
    }

    #[test]
    fn zero_values_match_kinds() {
        assert_eq!(FieldKind::Text.zero_value(), Value::Text(String::new()));
        assert_eq!(FieldKind::Flag.zero_value(), Value::Bool(false));
        assert_eq!(FieldKind::Integer.zero_value(), Value::Null);
        assert_eq!(
            FieldKind::List(Box::new(ArraySchema::new(FormSchema::new()))).zero_value(),
            Value::List(Vec::new())
        );
    }

    #[test]
    fn required_shorthand_tags_metadata() {
        let schema = FieldSchema::text("name").required("required");
        assert!(schema.validators[0].is_required());
    }

    #[test]
    fn schemas_clone_cheaply_for_array_reuse() {
        let item = FormSchema::new().field(FieldSchema::text("id"));
        let array = ArraySchema::new(item.clone()).default_item(Value::map().with("id", ""));
        let copy = array.clone();
        assert_eq!(copy.item.fields().len(), 1);
    }
}

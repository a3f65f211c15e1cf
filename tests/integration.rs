//! Integration tests for formwork.
//!
//! These tests exercise the public API from outside the crate: schema
//! building, reactive validation, path addressing, repeatable arrays, and
//! wizard navigation working together.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use formwork::error::FormError;
use formwork::form::{Form, SteppedForm};
use formwork::reactive::create_effect;
use formwork::schema::{ArraySchema, FieldSchema, FormSchema, Step, SteppedSchema};
use formwork::validate::Validator;
use formwork::value::Value;

fn person_schema() -> FormSchema {
    FormSchema::new()
        .field(FieldSchema::text("name").required("name is required"))
        .field(
            FieldSchema::integer("age")
                .with_validator(Validator::int_range(0, 120, "age must be 0-120")),
        )
}

// ---------------------------------------------------------------------------
// Basic form round trip
// ---------------------------------------------------------------------------

#[test]
fn test_person_form_round_trip() {
    let form = Form::build(&person_schema(), Value::map().with("name", "ada"));
    let age = form.field("age").unwrap();

    age.input("150");
    assert!(!form.validate_form());
    assert_eq!(age.error().get(), Some("age must be 0-120".to_string()));

    age.input("40");
    assert!(form.validate_form());

    let saved = form.save().unwrap();
    assert_eq!(saved.get("name"), Some(&Value::from("ada")));
    assert_eq!(saved.get("age"), Some(&Value::Int(40)));
    assert!(!form.is_dirty());
}

#[test]
fn test_save_refused_while_invalid() {
    let form = Form::build(&person_schema(), Value::map());
    assert!(matches!(form.save(), Err(FormError::Invalid)));
    // The refusal touched fields so errors are visible.
    let name = form.field("name").unwrap();
    assert!(name.touched().get());
    assert_eq!(name.error().get(), Some("name is required".to_string()));
}

#[test]
fn test_reset_restores_last_saved_state() {
    let form = Form::build(&person_schema(), Value::map().with("name", "ada"));
    form.field("age").unwrap().input("30");
    form.save().unwrap();

    form.field("age").unwrap().input("99");
    assert!(form.is_dirty());
    form.reset();
    assert_eq!(form.field("age").unwrap().value().get(), Value::Int(30));
    assert!(!form.is_dirty());
    assert!(!form.is_touched());
}

// ---------------------------------------------------------------------------
// Reactive validation
// ---------------------------------------------------------------------------

#[test]
fn test_validity_is_observable_from_an_effect() {
    let form = Form::build(&person_schema(), Value::map().with("name", "ada"));
    let valid = Rc::new(Cell::new(false));
    let valid_c = valid.clone();
    let probe = form.clone();
    create_effect(move || valid_c.set(probe.is_valid()));
    assert!(valid.get());

    form.field("name").unwrap().value().set(Value::from(""));
    assert!(!valid.get());
    form.field("name").unwrap().value().set(Value::from("grace"));
    assert!(valid.get());
}

#[test]
fn test_cross_field_rule_recomputes_without_explicit_revalidate() {
    let schema = FormSchema::new()
        .field(FieldSchema::text("password").required("password is required"))
        .field(
            FieldSchema::text("confirm").with_validator(Validator::with_form(|value, form| {
                let original = form.value_of("password")?;
                (value != &original).then(|| "passwords do not match".to_string())
            })),
        );
    let form = Form::build(
        &schema,
        Value::map().with("password", "secret").with("confirm", "secret"),
    );
    let confirm = form.field("confirm").unwrap();
    assert_eq!(confirm.error().get(), None);

    // Only the dependency changes; the dependent error updates on its own.
    form.field("password").unwrap().value().set(Value::from("changed"));
    assert_eq!(
        confirm.error().get(),
        Some("passwords do not match".to_string())
    );
}

// ---------------------------------------------------------------------------
// Repeatable arrays
// ---------------------------------------------------------------------------

fn order_schema() -> FormSchema {
    let item = FormSchema::new()
        .field(FieldSchema::text("id").required("id is required"))
        .field(FieldSchema::text("tags"));
    FormSchema::new()
        .field(FieldSchema::text("customer"))
        .field(FieldSchema::list(
            "items",
            ArraySchema::new(item).default_item(Value::map().with("id", "new").with("tags", "")),
        ))
}

#[test]
fn test_array_add_and_remove_keep_paths_consistent() {
    let form = Form::build(&order_schema(), Value::map());
    let array = form.field("items").unwrap().repeatable().unwrap();

    let first = array.add_item(None);
    let second = array.add_item(Some(Value::map().with("id", "b")));
    assert_eq!(first.field("id").unwrap().path(), "items[0].id");
    assert_eq!(second.field("id").unwrap().path(), "items[1].id");
    assert_eq!(
        form.field_at_path("items[1].id").unwrap().value().get(),
        Value::from("b")
    );

    array.remove_item(0).unwrap();
    assert_eq!(array.len(), 1);
    // The survivor shifted down and its printed path resolves again.
    let shifted = array.item(0).unwrap().field("id").unwrap();
    assert_eq!(shifted.path(), "items[0].id");
    assert_eq!(
        form.field_at_path(&shifted.path()).unwrap().value().get(),
        Value::from("b")
    );
    assert!(form.field_at_path("items[1].id").is_none());
}

#[test]
fn test_array_items_participate_in_form_validity() {
    let form = Form::build(&order_schema(), Value::map());
    let array = form.field("items").unwrap().repeatable().unwrap();
    assert!(form.validate_form());

    array.add_item(Some(Value::map().with("id", "")));
    assert!(!form.validate_form());

    form.field_at_path("items[0].id")
        .unwrap()
        .value()
        .set(Value::from("ok"));
    assert!(form.validate_form());
}

#[test]
fn test_array_saves_as_a_list() {
    let form = Form::build(&order_schema(), Value::map());
    let array = form.field("items").unwrap().repeatable().unwrap();
    array.add_item(Some(Value::map().with("id", "a")));
    array.add_item(Some(Value::map().with("id", "b")));

    let saved = form.save().unwrap();
    let items = saved.get("items").and_then(Value::as_list).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].get("id"), Some(&Value::from("a")));
    assert_eq!(items[1].get("id"), Some(&Value::from("b")));
}

#[test]
fn test_bare_numeric_path_segments_address_indices() {
    let form = Form::build(&order_schema(), Value::map());
    let array = form.field("items").unwrap().repeatable().unwrap();
    array.add_item(Some(Value::map().with("id", "a")));

    let via_bracket = form.field_at_path("items[0].id").unwrap();
    let via_dot = form.field_at_path("items.0.id").unwrap();
    // Both spellings hit the same node; printing normalizes to the bracket
    // form, which is the round-trip-stable canonical spelling.
    assert_eq!(via_dot.path(), "items[0].id");
    assert_eq!(via_bracket.path(), via_dot.path());
    assert_eq!(
        form.field_at_path(&via_dot.path()).unwrap().path(),
        via_dot.path()
    );
}

#[test]
fn test_unresolved_paths_return_errors_not_panics() {
    let form = Form::build(&order_schema(), Value::map());
    assert!(form.field_at_path("items[5].id").is_none());
    assert!(form.field_at_path("customer.nested").is_none());
    assert!(form.field_at_path("items").is_some()); // the field itself
    assert!(form.field_at_path("items[0]").is_none()); // a container, not a field
    let err = form.try_field_at_path("nope").unwrap_err();
    assert!(matches!(err, FormError::Unresolved(_)));
}

// ---------------------------------------------------------------------------
// Stepped wizard
// ---------------------------------------------------------------------------

#[test]
fn test_wizard_gates_each_step_then_saves() {
    let schema = SteppedSchema::new(
        FormSchema::new()
            .field(FieldSchema::text("name").required("name is required"))
            .field(FieldSchema::text("email").required("email is required"))
            .field(FieldSchema::flag("accept")),
    )
    .step(Step::new(["name"]).with_title("Identity"))
    .step(Step::new(["email", "accept"]).with_title("Contact"));

    let wizard = SteppedForm::build(&schema, Value::map());
    assert_eq!(wizard.current_step(), 0);

    // Gate: empty name blocks the advance and surfaces the error.
    assert!(!wizard.next());
    assert_eq!(
        wizard.form().field("name").unwrap().error().get(),
        Some("name is required".to_string())
    );

    wizard.form().field("name").unwrap().input("ada");
    assert!(wizard.next());
    assert_eq!(wizard.current_title(), Some("Contact".to_string()));

    // Back is free; forward re-validates.
    assert!(wizard.previous());
    assert!(wizard.next());

    wizard.form().field("email").unwrap().input("ada@example.com");
    let saved = wizard.save().unwrap();
    assert_eq!(saved.get("accept"), Some(&Value::Bool(false)));
}

#[test]
fn test_wizard_step_cursor_is_reactive() {
    let schema = SteppedSchema::new(
        FormSchema::new()
            .field(FieldSchema::text("a"))
            .field(FieldSchema::text("b")),
    )
    .step(Step::new(["a"]))
    .step(Step::new(["b"]));
    let wizard = SteppedForm::build(&schema, Value::map());

    let observed = Rc::new(Cell::new(usize::MAX));
    let observed_c = observed.clone();
    let probe = wizard.clone();
    create_effect(move || observed_c.set(probe.current_step()));
    assert_eq!(observed.get(), 0);

    wizard.next();
    assert_eq!(observed.get(), 1);
}

// ---------------------------------------------------------------------------
// Async validation
// ---------------------------------------------------------------------------

fn handle_schema() -> FormSchema {
    FormSchema::new().field(FieldSchema::text("handle").with_validator(Validator::async_fn(
        |value, _form| async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            (value.as_str() == Some("taken")).then(|| "handle is taken".to_string())
        },
    )))
}

#[tokio::test]
async fn test_async_validation_settles() {
    let form = Form::build(&handle_schema(), Value::map().with("handle", "taken"));
    let field = form.field("handle").unwrap();

    assert!(!form.validate_async().await);
    assert_eq!(field.error().get(), Some("handle is taken".to_string()));
    assert!(!field.validating().get());

    field.value().set(Value::from("free"));
    assert!(form.validate_async().await);
    assert_eq!(field.error().get(), None);
}

#[tokio::test]
async fn test_pending_async_counts_as_not_yet_valid() {
    let form = Form::build(&handle_schema(), Value::map().with("handle", "free"));
    let field = form.field("handle").unwrap();
    assert!(form.is_valid());

    // While the async check is in flight the field reports `validating`
    // and synchronous validity treats it as not-yet-valid.
    let check = field.validate_async();
    let observe = async {
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(field.validating().get());
        assert!(!form.is_valid());
        assert!(!form.validate_form());
    };
    tokio::join!(check, observe);

    assert!(!field.validating().get());
    assert_eq!(field.error().get(), None);
    assert!(form.is_valid());
}

#[tokio::test]
async fn test_stale_async_result_is_discarded() {
    let form = Form::build(&handle_schema(), Value::map().with("handle", "taken"));
    let field = form.field("handle").unwrap();

    // Change the value while the async check for the old value is in
    // flight; the stale rejection must not land on the fresh value.
    let check = field.validate_async();
    let edit = async {
        tokio::time::sleep(Duration::from_millis(1)).await;
        field.value().set(Value::from("fresh"));
    };
    tokio::join!(check, edit);

    assert_eq!(field.error().get(), None);
    assert!(!field.validating().get());
}

// ---------------------------------------------------------------------------
// Nested groups
// ---------------------------------------------------------------------------

#[test]
fn test_nested_group_full_round_trip() {
    let address = FormSchema::new()
        .field(FieldSchema::text("street").required("street is required"))
        .field(FieldSchema::text("city"));
    let schema = FormSchema::new()
        .field(FieldSchema::text("name"))
        .field(FieldSchema::group("address", address));
    let form = Form::build(&schema, Value::map().with("name", "ada"));

    assert!(!form.validate_form());
    form.field_at_path("address.street")
        .unwrap()
        .input("Main St 1");
    let saved = form.save().unwrap();
    assert_eq!(
        saved.get("address").and_then(|a| a.get("street")),
        Some(&Value::from("Main St 1"))
    );
}

#[test]
fn test_on_save_callback_receives_materialized_value() {
    let seen = Rc::new(Cell::new(false));
    let seen_c = seen.clone();
    let schema = FormSchema::new()
        .field(FieldSchema::text("name"))
        .on_save(move |value| {
            assert_eq!(value.get("name"), Some(&Value::from("ada")));
            seen_c.set(true);
        });
    let form = Form::build(&schema, Value::map().with("name", "ada"));
    form.save().unwrap();
    assert!(seen.get());
}

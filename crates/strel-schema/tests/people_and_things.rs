//! # Model Validation Scenarios
//!
//! End-to-end checks over the Person/Thing models: recursion through
//! references, failure trees and reports, equality references, and the
//! unknown-model error path.

mod common;

use serde_json::json;
use strel_schema::element::PREDICATE_REASON;
use strel_schema::{Api, ApiConfig, Expectation, FailureKey, SchemaError, Structure, Value};

use common::{api, valid_person, valid_thing};

#[test]
fn test_valid_thing_and_person() {
    let api = api();
    let things = api.validator("Thing", Structure::Item).unwrap();
    let people = api.validator("Person", Structure::Item).unwrap();

    let result = things.validate(&valid_thing("1"), "thing").unwrap();
    assert!(result.is_valid(), "{:?}", result.report("thing"));
    assert!(result.failures().is_empty());
    assert_eq!(result.valid_subject(), Some(&valid_thing("1")));

    assert!(people.is_valid(&valid_person(), "person").unwrap());
}

#[test]
fn test_things_recurse_through_parts() {
    let api = api();
    let things = api.validator("Thing", Structure::Item).unwrap();
    let nested = Value::from(json!({
        "id": "1",
        "name": "Outer",
        "parts": {
            "a": {"id": "a", "name": "A", "parts": {
                "b": {"id": "b", "name": "B", "parts": {}, "type": "widget", "weight": null}
            }, "type": "gadget", "weight": 2}
        },
        "type": "gadget",
        "weight": 3,
    }));
    assert!(things.is_valid(&nested, "thing").unwrap());
}

#[test]
fn test_nested_failure_report_paths() {
    let api = api();
    let things = api.validator("Thing", Structure::Item).unwrap();
    let subject = Value::from(json!({
        "id": "1",
        "name": "Outer",
        "parts": {
            "a": {"id": "a", "name": "A", "parts": {}, "type": "gadget", "weight": "heavy"}
        },
        "type": "gadget",
        "weight": 3,
    }));

    let result = things.validate(&subject, "thing").unwrap();
    assert!(!result.is_valid());
    assert_eq!(result.failures().len(), 1);

    let top = &result.failures()[0];
    assert_eq!(top.key, FailureKey::Field("parts".into()));
    assert_eq!(top.name, "thing.parts");
    let nested = top.failures.as_ref().expect("parts failure must be nested");
    assert_eq!(nested[0].key, FailureKey::Field("a".into()));
    assert_eq!(nested[0].name, "thing.parts.a");

    let report = result.report("thing");
    let reasons: Vec<_> = report.iter().map(|r| (r.path.as_str(), r.reason.as_str())).collect();
    assert_eq!(
        reasons,
        vec![
            ("thing.parts.a.weight", "expected number, got string"),
            ("thing.parts.a.weight", "expected null, got string"),
        ]
    );
    assert_eq!(report[0].value, Value::from("heavy"));
}

#[test]
fn test_equality_reference_rejects_other_values() {
    let api = api();
    let things = api.validator("Thing", Structure::Item).unwrap();
    let mut fields = valid_thing("1").as_record().unwrap().clone();
    fields.insert("type".into(), Value::from("sprocket"));

    let result = things.validate(&Value::from(fields), "thing").unwrap();
    let report = result.report("thing");
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].path, "thing.type");
    assert_eq!(report[0].reason, PREDICATE_REASON);
}

#[test]
fn test_person_inventory_reports_index() {
    let api = api();
    let people = api.validator("Person", Structure::Item).unwrap();
    let subject = Value::from(json!({
        "inventory": [
            {"id": "1", "name": "Fine", "parts": {}, "type": "widget", "weight": 1},
            {"id": 2, "name": "Broken", "parts": {}, "type": "widget", "weight": 1}
        ],
        "name": "Owner",
        "roleId": 4,
    }));

    let report = people.validate(&subject, "person").unwrap().report("person");
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].path, "person.inventory[1].id");
    assert_eq!(report[0].reason, "expected string, got number");
    assert_eq!(report[0].expected, "string");
}

#[test]
fn test_missing_required_field() {
    let api = api();
    let people = api.validator("Person", Structure::Item).unwrap();
    let failures = people
        .get_failures(&Value::from(json!({"inventory": []})), "person")
        .unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].key, FailureKey::Field("name".into()));
    assert!(failures[0].element.is_undefined());
}

#[test]
fn test_wrong_shapes_fail_up_front() {
    let api = api();
    for (structure, subject) in [
        (Structure::Array, json!({})),
        (Structure::Collection, json!([])),
        (Structure::Item, json!("a string")),
        (Structure::Mirror, json!({"array": []})),
    ] {
        let validator = api.validator("Thing", structure).unwrap();
        let result = validator.validate(&Value::from(subject), "subject").unwrap();
        assert_eq!(result.failures().len(), 1, "{structure}");
        assert_eq!(result.failures()[0].key, FailureKey::Subject);
        assert_eq!(result.salvage(), None);
    }
}

#[test]
fn test_shape_failures_are_not_cached() {
    let api = api();
    let validator = api.validator("Thing", Structure::Array).unwrap();
    validator.validate(&Value::from(json!({})), "things").unwrap();
    assert_eq!(api.cached_results(), 0);
}

#[test]
fn test_dates() {
    let api = Api::setup(ApiConfig::new().model("Event", || {
        Expectation::record([("at", Expectation::DATE)])
    }));
    let events = api.validator("Event", Structure::Item).unwrap();

    let ok = Value::record([("at", Value::date_from_millis(1_700_000_000_000.0))]);
    assert!(events.is_valid(&ok, "event").unwrap());

    let invalid = Value::record([("at", Value::Date(None))]);
    let report = events.validate(&invalid, "event").unwrap().report("event");
    assert_eq!(report[0].reason, "expected a valid date, got an invalid date");

    let text = Value::record([("at", Value::from("2024-01-01"))]);
    assert!(!events.is_valid(&text, "event").unwrap());
}

#[test]
fn test_predicate_expectation() {
    let api = Api::setup(ApiConfig::new());
    let even = Expectation::predicate("even", |v| v.as_f64().is_some_and(|n| n % 2.0 == 0.0));
    let validator = api.validator(even, Structure::Array).unwrap();
    let result = validator.validate(&Value::from(json!([2, 3])), "numbers").unwrap();
    assert_eq!(result.failures().len(), 1);
    assert_eq!(result.failures()[0].name, "numbers[1]");
    assert_eq!(result.report("numbers")[0].reason, PREDICATE_REASON);
}

#[test]
fn test_predicate_failure_records_the_predicate() {
    let api = Api::setup(ApiConfig::new());
    let even = Expectation::predicate("even", |v| v.as_f64().is_some_and(|n| n % 2.0 == 0.0));
    let either = Expectation::any_of([even, Expectation::STRING]);
    let validator = api.validator(either, Structure::Item).unwrap();
    let result = validator.validate(&Value::from(3), "n").unwrap();
    let expected: Vec<_> = result.report("n").into_iter().map(|r| r.expected).collect();
    assert_eq!(expected, vec!["(even)".to_string(), "[(even), string]".to_string()]);
}

#[test]
fn test_inline_record_expectation() {
    let api = Api::setup(ApiConfig::new());
    let point = Expectation::record([("x", Expectation::NUMBER), ("y", Expectation::NUMBER)]);
    let validator = api.validator(point, Structure::Collection).unwrap();
    let subject = Value::from(json!({"a": {"x": 1, "y": 2}, "b": {"x": 1}}));
    let result = validator.validate(&subject, "points").unwrap();
    assert_eq!(result.report("points")[0].path, "points.b.y");
    assert_eq!(result.salvage(), Some(&Value::from(json!({"a": {"x": 1, "y": 2}}))));
}

#[test]
fn test_unknown_model_inside_schema_is_error() {
    let api = Api::setup(ApiConfig::new().model("Owner", || {
        Expectation::record([("pet", Expectation::model("Pet"))])
    }));
    let owners = api.validator("Owner", Structure::Item).unwrap();
    let err = owners
        .validate(&Value::from(json!({"pet": {}})), "owner")
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownModel { ref model, ref context } if model == "Pet" && context == "owner.pet"));
    assert!(api.verify_models().is_err());
}

#[test]
fn test_empty_alternation_rejects_and_logs() {
    let messages = std::sync::Arc::new(parking_lot::Mutex::new(Vec::<String>::new()));
    let sink = std::sync::Arc::clone(&messages);
    let api = Api::setup(
        ApiConfig::new()
            .debug_enabled(|| true)
            .log_debug_message(move |message, _| sink.lock().push(message.to_string())),
    );
    let validator = api
        .validator(Expectation::any_of([]), Structure::Item)
        .unwrap();
    assert!(!validator.is_valid(&Value::from(1), "n").unwrap());
    assert_eq!(messages.lock().len(), 1);
    assert!(api.debug_enabled());
}

#[test]
fn test_unknown_model_reaches_debug_sink() {
    let messages = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = std::sync::Arc::clone(&messages);
    let api = Api::setup(
        ApiConfig::new()
            .debug_enabled(|| true)
            .log_debug_message(move |message, payload| {
                sink.lock().push((message.to_string(), payload.clone()))
            })
            .model("Owner", || Expectation::record([("pet", Expectation::model("Pet"))])),
    );
    let owners = api.validator("Owner", Structure::Item).unwrap();
    let err = owners
        .validate(&Value::from(json!({"pet": {}})), "owner")
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownModel { .. }));

    let messages = messages.lock();
    assert_eq!(messages.len(), 1);
    let (message, payload) = &messages[0];
    assert_eq!(message, "Unknown model referenced");
    assert_eq!(payload["model"], "Pet");
    assert_eq!(payload["context"], "owner.pet");
    assert_eq!(payload["known"], json!(["Owner"]));
}

#[test]
fn test_nested_alternations_flatten() {
    let api = Api::setup(ApiConfig::new());
    let e = Expectation::any_of([
        Expectation::any_of([Expectation::STRING, Expectation::Null]),
        Expectation::BOOLEAN,
    ]);
    let validator = api.validator(e, Structure::Array).unwrap();
    let result = validator
        .validate(&Value::from(json!(["a", null, true, 1])), "mixed")
        .unwrap();
    assert_eq!(result.failures().len(), 3);
    assert!(result.failures().iter().all(|f| f.key == FailureKey::Index(3)));
}

//! # Declarative Definitions
//!
//! Models loaded from YAML and JSON documents behave like models built in
//! code.

use std::io::Write;

use serde_json::json;
use strel_schema::{Api, ModelDefinitions, SchemaError, Structure, Value};

const MODELS: &str = r#"
models:
  Person:
    inventory:
      _StructuredElementReference: { structure: array, target: Thing }
    name: string
    roleId: [number, undefined]
  Thing:
    id: string
    name: string
    parts:
      _StructuredElementReference: { structure: collection, target: Thing }
    type:
      _StructuredElementReference: { structure: item, equals: [gadget, widget] }
    weight: [number, null]
"#;

fn api() -> Api {
    Api::setup(ModelDefinitions::from_yaml_str(MODELS).unwrap().into_config())
}

#[test]
fn test_yaml_models_validate_people() {
    let api = api();
    api.verify_models().unwrap();
    let people = api.validator("Person", Structure::Array).unwrap();
    let subject = Value::from(json!([
        {"inventory": [{"id": "1", "name": "T", "parts": {}, "type": "widget", "weight": null}], "name": "A"},
        {"inventory": [], "name": "B", "roleId": "admin"},
    ]));
    let result = people.validate(&subject, "people").unwrap();
    let paths: Vec<_> = result.report("people").into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["people[1].roleId", "people[1].roleId"]);
    assert_eq!(result.salvage().and_then(Value::as_array).map(<[Value]>::len), Some(1));
}

#[test]
fn test_equality_from_definitions() {
    let api = api();
    let things = api.validator("Thing", Structure::Item).unwrap();
    let widget = Value::from(json!({"id": "1", "name": "T", "parts": {}, "type": "widget", "weight": 2}));
    let gizmo = Value::from(json!({"id": "1", "name": "T", "parts": {}, "type": "gizmo", "weight": 2}));
    assert!(things.is_valid(&widget, "thing").unwrap());
    assert!(!things.is_valid(&gizmo, "thing").unwrap());
}

#[test]
fn test_load_from_files() {
    let dir = tempfile::tempdir().unwrap();

    let yaml_path = dir.path().join("models.yaml");
    std::fs::File::create(&yaml_path)
        .unwrap()
        .write_all(MODELS.as_bytes())
        .unwrap();
    let defs = ModelDefinitions::from_path(&yaml_path).unwrap();
    let ids: Vec<_> = defs.ids().map(|id| id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["Person", "Thing"]);

    let json_path = dir.path().join("models.json");
    std::fs::write(&json_path, r#"{"models": {"Tag": {"label": "string"}}}"#).unwrap();
    assert_eq!(ModelDefinitions::from_path(&json_path).unwrap().len(), 1);

    let bad_path = dir.path().join("bad.json");
    std::fs::write(&bad_path, "{").unwrap();
    let err = ModelDefinitions::from_path(&bad_path).unwrap_err();
    assert!(matches!(err, SchemaError::DefinitionLoad { ref source_name, .. } if source_name.ends_with("bad.json")));

    let missing = ModelDefinitions::from_path(&dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(missing, SchemaError::Io(_)));
}

#[test]
fn test_type_name_as_reference_target() {
    let defs = ModelDefinitions::from_json_str(
        r#"{"models": {"A": {"b": {"_StructuredElementReference": {"structure": "array", "target": "string"}}}}}"#,
    )
    .unwrap();
    let api = Api::setup(defs.into_config());
    api.verify_models().unwrap();
    let validator = api.validator("A", Structure::Item).unwrap();
    assert!(validator.is_valid(&Value::from(json!({"b": ["x"]})), "a").unwrap());
}

//! Shared models for the integration tests: people own things, things
//! are made of other things.

#![allow(dead_code)]

use serde_json::json;
use strel_schema::{Api, ApiConfig, Expectation, Structure, Value};

pub fn person() -> Expectation {
    Expectation::record([
        ("inventory", Expectation::reference(Structure::Array, "Thing")),
        ("name", Expectation::STRING),
        (
            "roleId",
            Expectation::any_of([Expectation::NUMBER, Expectation::Undefined]),
        ),
    ])
}

pub fn thing() -> Expectation {
    Expectation::record([
        ("id", Expectation::STRING),
        ("name", Expectation::STRING),
        ("parts", Expectation::reference(Structure::Collection, "Thing")),
        ("type", Expectation::equality(Structure::Item, ["gadget", "widget"])),
        (
            "weight",
            Expectation::any_of([Expectation::NUMBER, Expectation::Null]),
        ),
    ])
}

pub fn config() -> ApiConfig {
    ApiConfig::new().model("Person", person).model("Thing", thing)
}

pub fn api() -> Api {
    Api::setup(config())
}

pub fn valid_thing(id: &str) -> Value {
    Value::from(json!({
        "id": id,
        "name": "Valid Thing",
        "parts": {},
        "type": "gadget",
        "weight": 1,
    }))
}

pub fn valid_person() -> Value {
    Value::from(json!({"inventory": [], "name": "Valid Person"}))
}

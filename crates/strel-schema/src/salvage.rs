//! # Salvage Strategies
//!
//! After validating, a structural validator hands its failures and the
//! elements that passed to a salvage strategy, which decides what, if
//! anything, can be recovered from the subject. Each structure has a
//! default strategy; [`item_via_blanking`] is an opt-in alternative for
//! records whose invalid fields may be dropped or nulled.
//!
//! Any `Fn(SalvageInput<'_>) -> Option<Value>` is a strategy.

use std::collections::BTreeMap;

use strel_core::{Mirror, Record, Value};

use crate::debug::DebugChannel;
use crate::expectation::Structure;
use crate::failure::{Failure, FailureKey};

/// Everything a strategy may look at.
#[derive(Debug, Clone, Copy)]
pub struct SalvageInput<'a> {
    pub failures: &'a [Failure],
    pub name: &'a str,
    pub subject: &'a Value,
    /// The elements that passed, in the structure's own shape: an array
    /// for arrays, a record for collections and record items, a
    /// `{array, collection}` pair of salvages for mirrors. `None` when
    /// the validator produced none.
    pub valid_elements: Option<&'a Value>,
    pub debug: &'a DebugChannel,
}

impl SalvageInput<'_> {
    fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A salvage strategy.
pub trait AttemptSalvage {
    fn attempt(&self, input: SalvageInput<'_>) -> Option<Value>;
}

impl<F> AttemptSalvage for F
where
    F: Fn(SalvageInput<'_>) -> Option<Value>,
{
    fn attempt(&self, input: SalvageInput<'_>) -> Option<Value> {
        self(input)
    }
}

/// Function-pointer form of a strategy, used for the defaults.
pub type SalvageFn = fn(SalvageInput<'_>) -> Option<Value>;

/// The default strategy for a structure.
pub fn default_for(structure: Structure) -> SalvageFn {
    match structure {
        Structure::Array => array,
        Structure::Collection => collection,
        Structure::Item => item,
        Structure::Mirror => mirror,
    }
}

/// The subject when valid, otherwise the elements that passed, otherwise
/// an empty array.
pub fn array(input: SalvageInput<'_>) -> Option<Value> {
    if input.is_valid() {
        return Some(input.subject.clone());
    }
    Some(
        input
            .valid_elements
            .cloned()
            .unwrap_or_else(|| Value::array([])),
    )
}

/// The subject when valid, otherwise the entries that passed, otherwise
/// an empty record.
pub fn collection(input: SalvageInput<'_>) -> Option<Value> {
    if input.is_valid() {
        return Some(input.subject.clone());
    }
    Some(
        input
            .valid_elements
            .cloned()
            .unwrap_or_else(|| Value::record::<String>([])),
    )
}

/// The subject when valid; nothing otherwise.
pub fn item(input: SalvageInput<'_>) -> Option<Value> {
    input.is_valid().then(|| input.subject.clone())
}

/// Recover an invalid record by blanking its invalid fields.
///
/// Starting from the fields that passed, every failed field with a
/// failure whose expectation admits `undefined` is dropped, and every
/// other failed field with one admitting `null` is set to `null`. If any
/// failed field admits neither, nothing is recovered.
pub fn item_via_blanking(input: SalvageInput<'_>) -> Option<Value> {
    if input.is_valid() {
        return Some(input.subject.clone());
    }

    let mut by_field: BTreeMap<&str, Vec<&Failure>> = BTreeMap::new();
    for failure in input.failures {
        let FailureKey::Field(field) = &failure.key else {
            input.debug.log("Blanking salvage needs a record subject", || {
                serde_json::json!({ "name": input.name, "subject": input.subject })
            });
            return None;
        };
        by_field.entry(field.as_str()).or_default().push(failure);
    }

    let mut salvaged: Record = input
        .valid_elements
        .and_then(Value::as_record)
        .cloned()
        .unwrap_or_default();

    for (field, failures) in by_field {
        if failures.iter().any(|f| f.expectation.admits_undefined()) {
            salvaged.remove(field);
        } else if failures.iter().any(|f| f.expectation.admits_null()) {
            salvaged.insert(field.to_string(), Value::Null);
        } else {
            input.debug.log("Unsalvageable field", || {
                serde_json::json!({
                    "name": input.name,
                    "field": field,
                    "expectation": failures[0].expectation,
                    "value": failures[0].element,
                })
            });
            return None;
        }
    }

    Some(Value::from(salvaged))
}

/// The subject when valid; otherwise a mirror rebuilt from the salvaged
/// collection half, so both halves agree again.
pub fn mirror(input: SalvageInput<'_>) -> Option<Value> {
    if input.is_valid() {
        return Some(input.subject.clone());
    }
    let Some(valid) = input.valid_elements else {
        return Some(Mirror::empty().into_value());
    };
    let collection = valid.field("collection").as_record().cloned().unwrap_or_default();
    Some(Mirror::build(collection).into_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectation::Expectation;
    use serde_json::json;

    fn failure(key: &str, expectation: Expectation) -> Failure {
        Failure::new(
            Value::from("bad"),
            &expectation,
            FailureKey::Field(key.into()),
            key,
            "rejected",
            &Value::Null,
        )
    }

    fn input<'a>(
        failures: &'a [Failure],
        subject: &'a Value,
        valid: Option<&'a Value>,
        debug: &'a DebugChannel,
    ) -> SalvageInput<'a> {
        SalvageInput {
            failures,
            name: "subject",
            subject,
            valid_elements: valid,
            debug,
        }
    }

    #[test]
    fn test_array_prefers_valid_elements() {
        let debug = DebugChannel::disabled();
        let subject = Value::from(json!([1, "x", 3]));
        let valid = Value::from(json!([1, 3]));
        let failures = [failure("1", Expectation::NUMBER)];
        assert_eq!(array(input(&failures, &subject, Some(&valid), &debug)), Some(valid.clone()));
        assert_eq!(array(input(&failures, &subject, None, &debug)), Some(Value::array([])));
        assert_eq!(array(input(&[], &subject, Some(&valid), &debug)), Some(subject.clone()));
    }

    #[test]
    fn test_collection_defaults_to_empty_record() {
        let debug = DebugChannel::disabled();
        let subject = Value::from(json!({"a": 1}));
        let failures = [failure("a", Expectation::STRING)];
        assert_eq!(
            collection(input(&failures, &subject, None, &debug)),
            Some(Value::from(json!({})))
        );
    }

    #[test]
    fn test_item_recovers_nothing_when_invalid() {
        let debug = DebugChannel::disabled();
        let subject = Value::from(json!({"a": 1}));
        let failures = [failure("a", Expectation::STRING)];
        assert_eq!(item(input(&failures, &subject, None, &debug)), None);
        assert_eq!(item(input(&[], &subject, None, &debug)), Some(subject.clone()));
    }

    #[test]
    fn test_blanking_drops_optional_and_nulls_nullable() {
        let debug = DebugChannel::disabled();
        let subject = Value::from(json!({"name": "x", "roleId": "r", "weight": "w"}));
        let valid = Value::from(json!({"name": "x"}));
        let failures = [
            failure("roleId", Expectation::any_of([Expectation::NUMBER, Expectation::Undefined])),
            failure("weight", Expectation::any_of([Expectation::NUMBER, Expectation::Null])),
        ];
        assert_eq!(
            item_via_blanking(input(&failures, &subject, Some(&valid), &debug)),
            Some(Value::from(json!({"name": "x", "weight": null})))
        );
    }

    #[test]
    fn test_blanking_gives_up_on_required_field() {
        let debug = DebugChannel::disabled();
        let subject = Value::from(json!({"roleId": "r"}));
        let failures = [failure("roleId", Expectation::any_of([Expectation::NUMBER]))];
        assert_eq!(item_via_blanking(input(&failures, &subject, None, &debug)), None);
    }

    #[test]
    fn test_mirror_rebuilds_from_collection() {
        let debug = DebugChannel::disabled();
        let subject = Value::Null;
        let valid = Value::from(json!({"array": [], "collection": {"a": {"id": "a"}}}));
        let failures = [failure("b", Expectation::STRING)];
        let salvaged = mirror(input(&failures, &subject, Some(&valid), &debug)).unwrap();
        assert_eq!(salvaged.field("array").as_array().map(<[Value]>::len), Some(1));
        assert_eq!(
            mirror(input(&failures, &subject, None, &debug)),
            Some(Mirror::empty().into_value())
        );
    }

    #[test]
    fn test_default_for_structures() {
        let debug = DebugChannel::disabled();
        let subject = Value::from(json!({}));
        let strategy = default_for(Structure::Collection);
        assert_eq!(strategy.attempt(input(&[], &subject, None, &debug)), Some(subject.clone()));
    }
}

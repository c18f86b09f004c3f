//! # Element Validation
//!
//! Checks one value against one declared expectation. The expectation is
//! treated as a list of alternatives (a non-alternation is a list of one);
//! the first alternative that accepts short-circuits, otherwise the
//! failures of every alternative are returned together.
//!
//! A predicate failure records the rejecting predicate; every other
//! failure records the declared expectation.
//!
//! Model, reference and inline-record alternatives delegate to a
//! structural validator and wrap its failures in a single nested
//! [`Failure`]. Subjects are immutable `Arc` trees, so delegation always
//! descends into strictly smaller values and terminates.

use std::sync::Arc;

use strel_core::Value;

use crate::api::Api;
use crate::error::SchemaError;
use crate::expectation::{Expectation, TypeTag};
use crate::failure::{Failure, FailureKey};
use crate::result::ValidationResult;

/// Reason given when a predicate rejects.
pub const PREDICATE_REASON: &str = "functional expectation did not return true";

/// Validate `element`, found at `key` within `subject` and named `name`,
/// against `expectation`. Returns no failures when the element is
/// accepted.
///
/// # Errors
///
/// Returns `SchemaError::UnknownModel` if an alternative names a model
/// that is not registered.
pub fn validate_element(
    api: &Api,
    element: &Value,
    expectation: &Expectation,
    key: &FailureKey,
    subject: &Value,
    name: &str,
) -> Result<Vec<Failure>, SchemaError> {
    let alternatives = expectation.alternatives();
    if alternatives.is_empty() {
        api.debug().log("Empty alternation can never be satisfied", || {
            serde_json::json!({ "name": name, "element": element })
        });
        return Ok(vec![Failure::new(
            element.clone(),
            expectation,
            key.clone(),
            name,
            "empty alternation accepts no value",
            subject,
        )]);
    }

    let check = Check {
        api,
        element,
        declared: expectation,
        key,
        subject,
        name,
    };
    let mut failures = Vec::new();
    for candidate in alternatives {
        let rejected = check.against(candidate)?;
        if rejected.is_empty() {
            return Ok(Vec::new());
        }
        failures.extend(rejected);
    }
    Ok(failures)
}

struct Check<'a> {
    api: &'a Api,
    element: &'a Value,
    declared: &'a Expectation,
    key: &'a FailureKey,
    subject: &'a Value,
    name: &'a str,
}

impl Check<'_> {
    fn against(&self, candidate: &Expectation) -> Result<Vec<Failure>, SchemaError> {
        let element = self.element;
        let failures = match candidate {
            Expectation::Predicate(predicate) => self.unless_candidate(
                predicate.test(element),
                candidate,
                || PREDICATE_REASON.to_string(),
            ),
            Expectation::Type(tag) => {
                self.unless(tag.accepts(element), || type_reason(*tag, element))
            }
            Expectation::Null => self.unless(element.is_null(), || {
                format!("expected null, got {}", element.kind())
            }),
            Expectation::Undefined => self.unless(element.is_undefined(), || {
                format!("expected undefined, got {}", element.kind())
            }),
            Expectation::Model(id) => {
                let entry = self.api.model(id, self.name)?;
                self.nested(entry.validators().item().run(self.api, element, self.name, None)?)
            }
            Expectation::Reference(reference) => {
                let validator =
                    self.api
                        .resolve(&reference.target, reference.structure, self.name)?;
                self.nested(validator.run(self.api, element, self.name, None)?)
            }
            Expectation::Record(_) => {
                let bundle = self.api.bundle_for(candidate);
                self.nested(bundle.item().run(self.api, element, self.name, None)?)
            }
            Expectation::Alternation(_) => validate_element(
                self.api,
                element,
                candidate,
                self.key,
                self.subject,
                self.name,
            )?,
        };
        Ok(failures)
    }

    fn unless(&self, accepted: bool, reason: impl FnOnce() -> String) -> Vec<Failure> {
        self.unless_candidate(accepted, self.declared, reason)
    }

    /// Like `unless`, recording `expectation` instead of the declared one.
    fn unless_candidate(
        &self,
        accepted: bool,
        expectation: &Expectation,
        reason: impl FnOnce() -> String,
    ) -> Vec<Failure> {
        if accepted {
            return Vec::new();
        }
        vec![Failure::new(
            self.element.clone(),
            expectation,
            self.key.clone(),
            self.name,
            reason(),
            self.subject,
        )]
    }

    fn nested(&self, result: Arc<ValidationResult>) -> Vec<Failure> {
        if result.is_valid() {
            return Vec::new();
        }
        vec![Failure::nested(
            self.element.clone(),
            self.declared,
            self.key.clone(),
            self.name,
            result.failures().to_vec(),
            self.subject,
        )]
    }
}

fn type_reason(tag: TypeTag, element: &Value) -> String {
    match (tag, element) {
        (TypeTag::Date, Value::Date(None)) => "expected a valid date, got an invalid date".into(),
        _ => format!("expected {tag}, got {}", element.kind()),
    }
}

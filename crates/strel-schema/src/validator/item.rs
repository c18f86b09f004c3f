//! Item validation. Record schemas are checked field by field; any other
//! expectation is checked against the subject as a whole.

use std::sync::Arc;

use strel_core::predicates::is_string_keyed_record;
use strel_core::Record;

use crate::error::SchemaError;
use crate::expectation::{Expectation, RecordSchema};
use crate::failure::FailureKey;
use crate::result::ValidationResult;
use crate::Value;

use super::Pass;

pub(super) fn validate(pass: &Pass<'_>) -> Result<Arc<ValidationResult>, SchemaError> {
    match pass.expectation {
        Expectation::Record(schema) => validate_record(pass, schema),
        _ => validate_whole(pass),
    }
}

fn validate_record(
    pass: &Pass<'_>,
    schema: &RecordSchema,
) -> Result<Arc<ValidationResult>, SchemaError> {
    if !is_string_keyed_record(pass.subject) {
        return Ok(pass.rejected_shape(format!(
            "{} expected to be a record, but it is not. It has kind: {}.",
            pass.name,
            pass.subject.kind()
        )));
    }
    if let Some(cached) = pass.cached() {
        return Ok(cached);
    }

    let mut failures = Vec::new();
    let mut valid = Record::new();
    for (key, expectation) in schema.iter() {
        let element = pass.subject.field(key);
        let rejected = pass.element(element, expectation, FailureKey::Field(key.clone()))?;
        if !rejected.is_empty() {
            failures.extend(rejected);
        } else if !element.is_undefined() {
            valid.insert(key.clone(), element.clone());
        }
    }

    Ok(pass.finish(failures, Some(Value::from(valid))))
}

fn validate_whole(pass: &Pass<'_>) -> Result<Arc<ValidationResult>, SchemaError> {
    if let Some(cached) = pass.cached() {
        return Ok(cached);
    }
    let failures = pass.element(pass.subject, pass.expectation, FailureKey::Subject)?;
    Ok(pass.finish(failures, None))
}

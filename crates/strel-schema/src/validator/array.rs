use std::sync::Arc;

use crate::error::SchemaError;
use crate::failure::FailureKey;
use crate::result::ValidationResult;
use crate::Value;

use super::Pass;

pub(super) fn validate(pass: &Pass<'_>) -> Result<Arc<ValidationResult>, SchemaError> {
    let Some(items) = pass.subject.as_array() else {
        return Ok(pass.rejected_shape(format!(
            "{} expected to be an array, but it is not. It has kind: {}.",
            pass.name,
            pass.subject.kind()
        )));
    };
    if let Some(cached) = pass.cached() {
        return Ok(cached);
    }

    let mut failures = Vec::new();
    let mut valid = Vec::with_capacity(items.len());
    for (index, element) in items.iter().enumerate() {
        let rejected = pass.element(element, pass.expectation, FailureKey::Index(index))?;
        if rejected.is_empty() {
            valid.push(element.clone());
        } else {
            failures.extend(rejected);
        }
    }

    Ok(pass.finish(failures, Some(Value::from(valid))))
}

use std::sync::Arc;

use strel_core::{Record, RESERVED_REFERENCE_KEY};

use crate::error::SchemaError;
use crate::failure::{Failure, FailureKey};
use crate::result::ValidationResult;
use crate::Value;

use super::Pass;

pub(super) fn validate(pass: &Pass<'_>) -> Result<Arc<ValidationResult>, SchemaError> {
    let Some(entries) = pass.subject.as_record() else {
        return Ok(pass.rejected_shape(format!(
            "{} expected to be a string-keyed collection, but it is not. It has kind: {}.",
            pass.name,
            pass.subject.kind()
        )));
    };
    if let Some(cached) = pass.cached() {
        return Ok(cached);
    }

    let mut failures = Vec::new();
    let mut valid = Record::new();
    for (key, element) in entries.iter() {
        let failure_key = FailureKey::Field(key.clone());
        if key == RESERVED_REFERENCE_KEY {
            let name = failure_key.append_to(pass.name);
            failures.push(Failure::new(
                element.clone(),
                pass.expectation,
                failure_key,
                name,
                format!("{RESERVED_REFERENCE_KEY} is a reserved key and cannot be used in a collection"),
                pass.subject,
            ));
            continue;
        }
        let rejected = pass.element(element, pass.expectation, failure_key)?;
        if rejected.is_empty() {
            valid.insert(key.clone(), element.clone());
        } else {
            failures.extend(rejected);
        }
    }

    Ok(pass.finish(failures, Some(Value::from(valid))))
}

//! Mirror validation: the `array` and `collection` halves are validated
//! with the array and collection validators of the same expectation, and
//! their element failures are unioned, each key tagged with its half.

use std::sync::Arc;

use strel_core::predicates::is_mirror;

use crate::error::SchemaError;
use crate::failure::{Failure, FailureKey};
use crate::result::ValidationResult;
use crate::Value;

use super::Pass;

const ARRAY: &str = "array";
const COLLECTION: &str = "collection";

pub(super) fn validate(pass: &Pass<'_>) -> Result<Arc<ValidationResult>, SchemaError> {
    if !is_mirror(pass.subject) {
        return Ok(pass.rejected_shape(format!(
            "{} expected to be a Mirror, but it is not. It has kind: {}.",
            pass.name,
            pass.subject.kind()
        )));
    }

    let array = pass.subject.field(ARRAY);
    let collection = pass.subject.field(COLLECTION);
    let array_len = array.as_array().map_or(0, <[Value]>::len);
    let collection_len = collection.as_record().map_or(0, |c| c.len());
    if array_len != collection_len {
        return Ok(pass.rejected_shape(format!(
            "Mirror {} has mismatched length, with {collection_len} collection entries and {array_len} array entries.",
            pass.name
        )));
    }

    if let Some(cached) = pass.cached() {
        return Ok(cached);
    }

    let bundle = pass.api.bundle_for(pass.expectation);
    let array_result = bundle
        .array()
        .run(pass.api, array, &format!("{}.{ARRAY}", pass.name), None)?;
    let collection_result = bundle.collection().run(
        pass.api,
        collection,
        &format!("{}.{COLLECTION}", pass.name),
        None,
    )?;

    let mut failures = Vec::new();
    for (half, result) in [(ARRAY, &array_result), (COLLECTION, &collection_result)] {
        failures.extend(result.failures().iter().map(|failure| Failure {
            key: FailureKey::Half {
                half,
                key: Box::new(failure.key.clone()),
            },
            ..failure.clone()
        }));
    }

    let valid_elements = Value::record([
        (
            ARRAY,
            array_result.salvage().cloned().unwrap_or_else(|| Value::array([])),
        ),
        (
            COLLECTION,
            collection_result
                .salvage()
                .cloned()
                .unwrap_or_else(|| Value::record::<String>([])),
        ),
    ]);

    Ok(pass.finish(failures, Some(valid_elements)))
}

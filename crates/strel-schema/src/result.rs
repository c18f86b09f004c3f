//! Validation outcome.

use strel_core::Value;

use crate::failure::{build_failure_report, Failure, FailureReport};

/// The outcome of validating one subject with one validator.
///
/// `is_valid()` holds exactly when there are no failures. Results may be
/// cached and shared; they are never mutated after construction.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    failures: Vec<Failure>,
    subject: Value,
    salvage: Option<Value>,
    valid: bool,
}

impl ValidationResult {
    pub fn new(failures: Vec<Failure>, subject: Value, salvage: Option<Value>) -> Self {
        let valid = failures.is_empty();
        Self {
            failures,
            subject,
            salvage,
            valid,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// The validated subject.
    pub fn subject(&self) -> &Value {
        &self.subject
    }

    /// The subject, only if it conforms.
    pub fn valid_subject(&self) -> Option<&Value> {
        self.valid.then_some(&self.subject)
    }

    /// Whatever the salvage strategy recovered. `None` when nothing could
    /// be recovered.
    pub fn salvage(&self) -> Option<&Value> {
        self.salvage.as_ref()
    }

    /// Flattened failure report, with paths rooted at `name`.
    pub fn report(&self, name: &str) -> Vec<FailureReport> {
        build_failure_report(&self.failures, name)
    }
}

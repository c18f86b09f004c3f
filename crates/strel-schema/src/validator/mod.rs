//! # Structural Validators
//!
//! A [`StructuralValidator`] pairs an expectation with a [`Structure`].
//! Validators are plain data: they resolve models, nested validators and
//! caches through the [`Api`] passed to each run, never through a stored
//! back-reference.
//!
//! Every run follows the same pattern:
//!
//! 1. Shape check. A subject of the wrong shape yields one failure with
//!    key `Subject`, no salvage, and is not cached.
//! 2. Cache lookup by (expectation, structure, subject node).
//! 3. Element validation, collecting failures and the elements that
//!    passed.
//! 4. Salvage, then cache insertion.

mod array;
mod collection;
mod item;
mod mirror;

use std::sync::Arc;

use strel_core::Value;

use crate::api::Api;
use crate::element::validate_element;
use crate::error::SchemaError;
use crate::expectation::{Expectation, Structure};
use crate::failure::{Failure, FailureKey};
use crate::result::ValidationResult;
use crate::salvage::{self, AttemptSalvage, SalvageInput};

/// A validator for one expectation and one structure.
#[derive(Debug, Clone)]
pub struct StructuralValidator {
    expectation: Expectation,
    structure: Structure,
}

impl StructuralValidator {
    pub fn new(expectation: Expectation, structure: Structure) -> Self {
        Self {
            expectation,
            structure,
        }
    }

    pub fn structure(&self) -> Structure {
        self.structure
    }

    pub fn expectation(&self) -> &Expectation {
        &self.expectation
    }

    /// Validate `subject`, salvaging with `strategy` or the structure's
    /// default.
    ///
    /// A cached result is returned as is, whichever strategy is passed.
    pub(crate) fn run(
        &self,
        api: &Api,
        subject: &Value,
        name: &str,
        strategy: Option<&dyn AttemptSalvage>,
    ) -> Result<Arc<ValidationResult>, SchemaError> {
        let default = salvage::default_for(self.structure);
        let pass = Pass {
            api,
            expectation: &self.expectation,
            structure: self.structure,
            subject,
            name,
            strategy: strategy.unwrap_or(&default),
        };
        match self.structure {
            Structure::Array => array::validate(&pass),
            Structure::Collection => collection::validate(&pass),
            Structure::Item => item::validate(&pass),
            Structure::Mirror => mirror::validate(&pass),
        }
    }
}

/// The four structural validators of one expectation.
#[derive(Debug, Clone)]
pub struct ValidatorBundle {
    array: StructuralValidator,
    collection: StructuralValidator,
    item: StructuralValidator,
    mirror: StructuralValidator,
}

impl ValidatorBundle {
    pub fn new(expectation: Expectation) -> Self {
        Self {
            array: StructuralValidator::new(expectation.clone(), Structure::Array),
            collection: StructuralValidator::new(expectation.clone(), Structure::Collection),
            item: StructuralValidator::new(expectation.clone(), Structure::Item),
            mirror: StructuralValidator::new(expectation, Structure::Mirror),
        }
    }

    pub fn get(&self, structure: Structure) -> &StructuralValidator {
        match structure {
            Structure::Array => &self.array,
            Structure::Collection => &self.collection,
            Structure::Item => &self.item,
            Structure::Mirror => &self.mirror,
        }
    }

    pub fn array(&self) -> &StructuralValidator {
        &self.array
    }

    pub fn collection(&self) -> &StructuralValidator {
        &self.collection
    }

    pub fn item(&self) -> &StructuralValidator {
        &self.item
    }

    pub fn mirror(&self) -> &StructuralValidator {
        &self.mirror
    }
}

/// State of a single validator run.
struct Pass<'a> {
    api: &'a Api,
    expectation: &'a Expectation,
    structure: Structure,
    subject: &'a Value,
    name: &'a str,
    strategy: &'a dyn AttemptSalvage,
}

impl Pass<'_> {
    fn cached(&self) -> Option<Arc<ValidationResult>> {
        let hit = self
            .api
            .results()
            .get(self.expectation, self.structure, self.subject)?;
        tracing::trace!(name = self.name, structure = %self.structure, "result cache hit");
        Some(hit)
    }

    fn rejected_shape(&self, reason: String) -> Arc<ValidationResult> {
        let failure = Failure::new(
            self.subject.clone(),
            self.expectation,
            FailureKey::Subject,
            self.name,
            reason,
            self.subject,
        );
        Arc::new(ValidationResult::new(vec![failure], self.subject.clone(), None))
    }

    fn element(
        &self,
        element: &Value,
        expectation: &Expectation,
        key: FailureKey,
    ) -> Result<Vec<Failure>, SchemaError> {
        let name = key.append_to(self.name);
        validate_element(self.api, element, expectation, &key, self.subject, &name)
    }

    fn finish(&self, failures: Vec<Failure>, valid_elements: Option<Value>) -> Arc<ValidationResult> {
        let salvage = self.strategy.attempt(SalvageInput {
            failures: &failures,
            name: self.name,
            subject: self.subject,
            valid_elements: valid_elements.as_ref(),
            debug: self.api.debug(),
        });
        self.api.results().insert(
            self.expectation,
            self.structure,
            ValidationResult::new(failures, self.subject.clone(), salvage),
        )
    }
}

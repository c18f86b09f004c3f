//! # strel-schema — Runtime Shape Validation
//!
//! Validates untyped [`Value`]s against declarative [`Expectation`]s,
//! collects structured [`Failure`] trees when they do not conform, and
//! optionally salvages the parts that do.
//!
//! ## Structures
//!
//! Every validator checks one [`Structure`]:
//!
//! - `item` — a single value (a record schema, or any other expectation).
//! - `array` — every element satisfies the expectation.
//! - `collection` — every entry of a string-keyed record does.
//! - `mirror` — both halves of a [`strel_core::Mirror`] do, and the halves
//!   have the same length.
//!
//! ## Entry Point
//!
//! An application registers named models once, through [`ApiConfig`], and
//! calls [`Api::validator`] wherever it needs to check data:
//!
//! ```rust
//! use strel_schema::{Api, ApiConfig, Expectation, Structure};
//! use strel_core::Value;
//!
//! let api = Api::setup(ApiConfig::new().model("Person", || {
//!     Expectation::record([
//!         ("name", Expectation::STRING),
//!         ("roleId", Expectation::any_of([Expectation::NUMBER, Expectation::Undefined])),
//!     ])
//! }));
//!
//! let validator = api.validator("Person", Structure::Array).unwrap();
//! let people = Value::from(serde_json::json!([{"name": "Ada"}, {"name": 7}]));
//! let result = validator.validate(&people, "people").unwrap();
//! assert!(!result.is_valid());
//! assert_eq!(result.salvage(), Some(&Value::from(serde_json::json!([{"name": "Ada"}]))));
//! ```
//!
//! ## Crate Policy
//!
//! - Invalid data is never an error: it is reported as `Failure` values.
//! - Schema misconfiguration (an unknown model id) is always an error,
//!   [`SchemaError::UnknownModel`], raised where it is detected.
//! - Results are cached per expectation, structure and subject identity.
//!   A validated subject must not be mutated in place.

pub mod api;
pub mod cache;
pub mod debug;
pub mod declarative;
pub mod element;
pub mod error;
pub mod expectation;
pub mod failure;
pub mod registry;
pub mod result;
pub mod salvage;
pub mod validator;

pub use api::{Api, ApiConfig, Validator};
pub use cache::ResultCache;
pub use debug::DebugChannel;
pub use declarative::ModelDefinitions;
pub use error::SchemaError;
pub use expectation::{
    Expectation, ExpectationKey, ModelId, Predicate, RecordSchema, Reference, ReferenceTarget,
    Structure, TypeTag,
};
pub use failure::{build_failure_report, Failure, FailureKey, FailureReport, Reason};
pub use registry::{ModelBuilder, ModelEntry, ModelRegistry};
pub use result::ValidationResult;
pub use salvage::{AttemptSalvage, SalvageInput};
pub use validator::{StructuralValidator, ValidatorBundle};

pub use strel_core::Value;

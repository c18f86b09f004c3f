//! # Error Types
//!
//! Only schema misconfiguration is an error. A subject that fails its
//! expectation produces `Failure` values inside a `ValidationResult`;
//! it never produces a `SchemaError`.

use thiserror::Error;

/// Error raised when models or expectations are wired incorrectly.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A reference named a model id that is not registered.
    #[error("model '{model}' was not found in the registry (referenced from {context})")]
    UnknownModel {
        /// The unresolved model id.
        model: String,
        /// Where the reference was encountered.
        context: String,
    },

    /// A declared expectation has a shape that is not an expectation.
    #[error("malformed expectation at '{path}': {reason}")]
    MalformedExpectation {
        /// Dotted path of the offending node within the definitions.
        path: String,
        /// Why the node was rejected.
        reason: String,
    },

    /// A model definition document could not be read or parsed.
    #[error("model definition load error for '{source_name}': {reason}")]
    DefinitionLoad {
        /// File path or other description of the document.
        source_name: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// IO error reading a definition document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

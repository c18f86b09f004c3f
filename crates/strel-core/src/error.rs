//! # Error Types
//!
//! Errors raised by the core value model and the mirror builders. Data
//! that merely fails validation is never an error; these cover misuse of
//! the builders and unreadable input.

use thiserror::Error;

/// Error converting external data into a [`crate::Value`].
#[derive(Error, Debug)]
pub enum CoreError {
    /// The input text was not valid JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error building or extending a [`crate::Mirror`].
#[derive(Error, Debug)]
pub enum MirrorError {
    /// An element had no key: it is not a record with a string `id` and
    /// no key extractor was supplied (or the extractor returned nothing).
    #[error("mirror element at position {position} has no id and no key extractor produced a key: {element}")]
    MissingKey {
        /// Position of the element in the input sequence.
        position: usize,
        /// JSON rendering of the offending element.
        element: String,
    },
}

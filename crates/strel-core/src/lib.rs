//! # strel-core — Foundational Types for Structured Elements
//!
//! This crate is the leaf of the workspace. It defines the untyped
//! subject model that validators inspect, the shape predicates they rely
//! on, and the `Mirror` dual view of keyed data.
//!
//! ## Key Design Principles
//!
//! 1. **Closed value model.** [`Value`] is a sum type. Every shape test is
//!    an exhaustive `match`, never a probe of runtime properties.
//!
//! 2. **Identity is the node address.** Arrays and records are shared
//!    behind `Arc`. Cloning a `Value` shares the node, and the node's
//!    address ([`Identity`]) is what result caches key on. Primitives have
//!    no identity and are never cached.
//!
//! 3. **Absent is not null.** A missing record field reads back as
//!    [`Value::Undefined`], distinct from [`Value::Null`], so optionality
//!    must be declared explicitly by the schema.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `strel-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod mirror;
pub mod predicates;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use error::{CoreError, MirrorError};
pub use mirror::{Mirror, MirrorOptions};
pub use value::{Identity, Record, Value};

/// Record key reserved for reference containers in serialised schemas.
///
/// Application data must never use it as a key: collection validation
/// rejects any entry stored under it.
pub const RESERVED_REFERENCE_KEY: &str = "_StructuredElementReference";

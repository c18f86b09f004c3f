//! # Subject Values — The Untyped Data Model
//!
//! Validators accept arbitrary data. This module defines [`Value`], the
//! closed representation of that data: the JSON data model plus two
//! extra variants, `Undefined` (an absent field) and `Date`.
//!
//! ## Identity
//!
//! `Array` and `Record` nodes live behind `Arc`. Cloning a `Value` clones
//! the pointer, never the contents, so one node may be reachable from
//! many places in a subject graph (a diamond). The address of the node is
//! exposed as an [`Identity`]; result caches key on it so a shared node is
//! validated once per expectation.
//!
//! Because caches rely on identity, a validated node must be treated as
//! immutable. `Arc` already enforces this for shared nodes: mutation goes
//! through `Arc::make_mut`, which copies a shared node and thereby gives
//! the mutated data a new identity.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// String-keyed mapping stored inside [`Value::Record`].
pub type Record = BTreeMap<String, Value>;

/// Address of a shared compound node.
///
/// Two values have the same identity exactly when they point at the same
/// `Arc` allocation. Identities are only meaningful while the node is
/// alive; holders that outlive the node must also hold the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(usize);

impl Identity {
    fn of<T: ?Sized>(node: &Arc<T>) -> Self {
        Self(Arc::as_ptr(node) as *const () as usize)
    }
}

/// An untyped subject.
///
/// Equality (`==`) is structural. Use [`Value::strict_eq`] for the
/// identity-sensitive comparison used by equality expectations.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// An absent value, e.g. a record field that is not present.
    #[default]
    Undefined,
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number. `NaN` is still a number.
    Number(f64),
    /// A string.
    String(Arc<str>),
    /// A point in time. `None` is an invalid date.
    Date(Option<DateTime<Utc>>),
    /// An ordered sequence, shared by identity.
    Array(Arc<Vec<Value>>),
    /// A string-keyed mapping, shared by identity.
    Record(Arc<Record>),
}

static UNDEFINED: Value = Value::Undefined;

impl Value {
    /// Build an array node.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Arc::new(items.into_iter().collect()))
    }

    /// Build a record node from key/value pairs. Later duplicates win.
    pub fn record<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Record(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Wrap a valid point in time.
    pub fn date(at: DateTime<Utc>) -> Self {
        Value::Date(Some(at))
    }

    /// Build a date from milliseconds since the Unix epoch.
    ///
    /// Non-finite or out-of-range input produces an invalid date.
    pub fn date_from_millis(millis: f64) -> Self {
        if !millis.is_finite() {
            return Value::Date(None);
        }
        Value::Date(Utc.timestamp_millis_opt(millis.trunc() as i64).single())
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if the text is not valid JSON.
    pub fn from_json_str(text: &str) -> Result<Self, CoreError> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Ok(Value::from(json))
    }

    /// The runtime kind of this value, as used in failure reasons.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
        }
    }

    /// Node identity for compound values; `None` for primitives.
    pub fn identity(&self) -> Option<Identity> {
        match self {
            Value::Array(items) => Some(Identity::of(items)),
            Value::Record(entries) => Some(Identity::of(entries)),
            _ => None,
        }
    }

    /// Identity-sensitive equality: primitives compare by value, compound
    /// values only when they are the same node.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a.is_some() && a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Read a record field. Absent fields, and fields of non-records,
    /// read as `Undefined`.
    pub fn field(&self, key: &str) -> &Value {
        match self {
            Value::Record(entries) => entries.get(key).unwrap_or(&UNDEFINED),
            _ => &UNDEFINED,
        }
    }

    /// Returns true for [`Value::Undefined`].
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The elements of an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// The entries of a record.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(entries) => Some(entries),
            _ => None,
        }
    }

    /// The contents of a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The number, if this is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert to a JSON value.
    ///
    /// Undefined record fields are dropped; undefined array slots and
    /// top-level undefined become `null`. Dates render as RFC 3339 with
    /// millisecond precision, invalid dates as `null`. Integral numbers
    /// render as integers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null | Value::Date(None) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Date(Some(at)) => {
                serde_json::Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Record(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    const SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= SAFE_INTEGER {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Date(None) => f.write_str("Invalid Date"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            // Without `arbitrary_precision`, every JSON number has an f64 view.
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.into()),
            serde_json::Value::Array(items) => Value::array(items.into_iter().map(Value::from)),
            serde_json::Value::Object(entries) => {
                Value::record(entries.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(at: DateTime<Utc>) -> Self {
        Value::date(at)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }
}

impl From<Record> for Value {
    fn from(entries: Record) -> Self {
        Value::Record(Arc::new(entries))
    }
}

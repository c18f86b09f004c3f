//! # Shape Predicates
//!
//! Primitive type guards over [`Value`]. Structural validators use these
//! for their up-front shape checks before touching any element.

use crate::value::Value;

/// Returns true for arrays.
pub fn is_array(subject: &Value) -> bool {
    matches!(subject, Value::Array(_))
}

/// Returns true for any object-like value: records, arrays and dates.
pub fn is_record(subject: &Value) -> bool {
    matches!(subject, Value::Record(_) | Value::Array(_) | Value::Date(_))
}

/// Returns true for string-keyed records. Arrays and dates are excluded.
pub fn is_string_keyed_record(subject: &Value) -> bool {
    matches!(subject, Value::Record(_))
}

/// Returns true for dates holding a valid timestamp.
pub fn is_date(subject: &Value) -> bool {
    matches!(subject, Value::Date(Some(_)))
}

/// Returns true for numbers other than `NaN`.
pub fn is_number(subject: &Value) -> bool {
    matches!(subject, Value::Number(n) if !n.is_nan())
}

/// Returns true for records carrying a string `id` field.
pub fn is_record_with_id(subject: &Value) -> bool {
    is_string_keyed_record(subject) && subject.field("id").as_str().is_some()
}

/// Returns true when the subject has the mirror shape: an `array` field
/// holding an array and a `collection` field holding a record.
///
/// This is a shape test only. Whether both halves hold the same elements
/// is the mirror validator's concern.
pub fn is_mirror(subject: &Value) -> bool {
    is_string_keyed_record(subject)
        && is_array(subject.field("array"))
        && is_string_keyed_record(subject.field("collection"))
}

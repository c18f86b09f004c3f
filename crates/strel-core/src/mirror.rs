//! # Mirror — Dual Array/Collection View
//!
//! A `Mirror` stores the same elements twice: as an ordered array and as
//! a string-keyed collection. Consumers read whichever form suits the
//! operation at hand.
//!
//! ## Invariants
//!
//! - The collection's values are exactly the array's elements.
//! - `collection.len() == array.len()`.
//!
//! Mirrors are immutable. Every change builds a new mirror; both halves
//! are shared nodes, so the record form produced by [`Mirror::into_value`]
//! carries the same identities as the mirror itself.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::MirrorError;
use crate::predicates::{is_array, is_string_keyed_record};
use crate::value::{Record, Value};

/// Extracts the collection key for an element.
pub type ExtractKey = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Orders elements of the array half.
pub type SortElements = Arc<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>;

/// Options for building a mirror.
#[derive(Clone, Default)]
pub struct MirrorOptions {
    /// Existing mirror whose entries seed the new one.
    pub base: Option<Mirror>,
    /// Key extractor; defaults to the element's string `id` field.
    pub extract_key: Option<ExtractKey>,
    /// Ordering applied to the array half.
    pub sort: Option<SortElements>,
}

impl MirrorOptions {
    /// Default options: no base, `id` keys, no sorting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the new mirror with the entries of `base`.
    pub fn base(mut self, base: Mirror) -> Self {
        self.base = Some(base);
        self
    }

    /// Use `extract` instead of the `id` field to key elements.
    pub fn extract_key(
        mut self,
        extract: impl Fn(&Value) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.extract_key = Some(Arc::new(extract));
        self
    }

    /// Sort the array half with `compare`.
    pub fn sort(
        mut self,
        compare: impl Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.sort = Some(Arc::new(compare));
        self
    }

    fn key_of(&self, element: &Value) -> Option<String> {
        match &self.extract_key {
            Some(extract) => extract(element),
            None => element.field("id").as_str().map(str::to_string),
        }
    }
}

impl fmt::Debug for MirrorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorOptions")
            .field("base", &self.base)
            .field("extract_key", &self.extract_key.is_some())
            .field("sort", &self.sort.is_some())
            .finish()
    }
}

/// The same elements held as an array and as a keyed collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Mirror {
    array: Arc<Vec<Value>>,
    collection: Arc<Record>,
}

impl Default for Mirror {
    fn default() -> Self {
        Self::empty()
    }
}

impl Mirror {
    /// A mirror with no elements.
    pub fn empty() -> Self {
        Self {
            array: Arc::new(Vec::new()),
            collection: Arc::new(Record::new()),
        }
    }

    /// Build a mirror from a keyed collection. The array half lists the
    /// collection's values in key order.
    pub fn build(collection: Record) -> Self {
        Self::build_with(collection, &MirrorOptions::default())
    }

    /// Build a mirror from a keyed collection, merging `options.base`
    /// first and sorting the array half when a comparator is given.
    pub fn build_with(collection: Record, options: &MirrorOptions) -> Self {
        let mut merged = options
            .base
            .as_ref()
            .map(|base| base.collection().clone())
            .unwrap_or_default();
        merged.extend(collection);

        let mut array: Vec<Value> = merged.values().cloned().collect();
        if let Some(compare) = &options.sort {
            array.sort_by(|a, b| compare(a, b));
        }

        Self {
            array: Arc::new(array),
            collection: Arc::new(merged),
        }
    }

    /// Build a mirror from a sequence, keying each element with the
    /// options' extractor or its string `id` field.
    ///
    /// Elements keep their input order, after any base entries. An
    /// element whose key is already present replaces the earlier entry in
    /// place.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::MissingKey` if an element has no key.
    pub fn from_array(
        elements: impl IntoIterator<Item = Value>,
        options: &MirrorOptions,
    ) -> Result<Self, MirrorError> {
        let mut ordered: Vec<(String, Value)> = Vec::new();
        let mut positions: BTreeMap<String, usize> = BTreeMap::new();

        if let Some(base) = &options.base {
            for element in base.array() {
                if let Some(key) = options.key_of(element) {
                    upsert(&mut ordered, &mut positions, key, element.clone());
                }
            }
        }

        for (position, element) in elements.into_iter().enumerate() {
            let key = options
                .key_of(&element)
                .ok_or_else(|| MirrorError::MissingKey {
                    position,
                    element: element.to_string(),
                })?;
            upsert(&mut ordered, &mut positions, key, element);
        }

        let collection: Record = ordered.iter().cloned().collect();
        let mut array: Vec<Value> = ordered.into_iter().map(|(_, v)| v).collect();
        if let Some(compare) = &options.sort {
            array.sort_by(|a, b| compare(a, b));
        }

        Ok(Self {
            array: Arc::new(array),
            collection: Arc::new(collection),
        })
    }

    /// Return a new mirror with `element` added under its key, replacing
    /// any element already stored under that key.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::MissingKey` if the element has no key.
    pub fn add_element(&self, element: Value, options: &MirrorOptions) -> Result<Self, MirrorError> {
        let key = options
            .key_of(&element)
            .ok_or_else(|| MirrorError::MissingKey {
                position: self.array.len(),
                element: element.to_string(),
            })?;

        let mut array: Vec<Value> = self.array.as_ref().clone();
        match self.collection.get(&key) {
            Some(existing) => {
                if let Some(slot) = array.iter_mut().find(|v| v.strict_eq(existing)) {
                    *slot = element.clone();
                }
            }
            None => array.push(element.clone()),
        }
        if let Some(compare) = &options.sort {
            array.sort_by(|a, b| compare(a, b));
        }

        let mut collection = self.collection.as_ref().clone();
        collection.insert(key, element);

        Ok(Self {
            array: Arc::new(array),
            collection: Arc::new(collection),
        })
    }

    /// Return a copy whose array half is ordered by `compare`.
    pub fn sorted(&self, compare: impl Fn(&Value, &Value) -> Ordering) -> Self {
        let mut array = self.array.as_ref().clone();
        array.sort_by(compare);
        Self {
            array: Arc::new(array),
            collection: Arc::clone(&self.collection),
        }
    }

    /// The array half.
    pub fn array(&self) -> &[Value] {
        &self.array
    }

    /// The collection half.
    pub fn collection(&self) -> &Record {
        &self.collection
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Returns true if the mirror holds no elements.
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// The record form `{array, collection}` consumed by validators.
    pub fn into_value(self) -> Value {
        let mut record = Record::new();
        record.insert("array".to_string(), Value::Array(self.array));
        record.insert("collection".to_string(), Value::Record(self.collection));
        Value::from(record)
    }

    /// Recover a mirror from its record form, sharing both halves.
    ///
    /// Returns `None` if the value does not have the mirror shape. The
    /// element invariants are not checked here.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !is_string_keyed_record(value) || !is_array(value.field("array")) {
            return None;
        }
        match (value.field("array"), value.field("collection")) {
            (Value::Array(array), Value::Record(collection)) => Some(Self {
                array: Arc::clone(array),
                collection: Arc::clone(collection),
            }),
            _ => None,
        }
    }
}

impl From<Mirror> for Value {
    fn from(mirror: Mirror) -> Self {
        mirror.into_value()
    }
}

fn upsert(
    ordered: &mut Vec<(String, Value)>,
    positions: &mut BTreeMap<String, usize>,
    key: String,
    element: Value,
) {
    match positions.get(&key) {
        Some(&index) => ordered[index].1 = element,
        None => {
            positions.insert(key.clone(), ordered.len());
            ordered.push((key, element));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn thing(id: &str) -> Value {
        Value::from(json!({"id": id, "name": format!("thing {id}")}))
    }

    fn keyed(entries: &[(&str, Value)]) -> Record {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_build_from_collection_keeps_lengths_equal() {
        let mirror = Mirror::build(keyed(&[("a", thing("a")), ("b", thing("b"))]));
        assert_eq!(mirror.array().len(), 2);
        assert_eq!(mirror.collection().len(), 2);
    }

    #[test]
    fn test_build_shares_nodes_between_halves() {
        let a = thing("a");
        let mirror = Mirror::build(keyed(&[("a", a.clone())]));
        assert!(mirror.array()[0].strict_eq(&a));
        assert!(mirror.collection()["a"].strict_eq(&a));
    }

    #[test]
    fn test_from_array_uses_id_by_default() {
        let mirror = Mirror::from_array([thing("x"), thing("y")], &MirrorOptions::new()).unwrap();
        assert!(mirror.collection().contains_key("x"));
        assert_eq!(mirror.array()[1], thing("y"));
    }

    #[test]
    fn test_from_array_without_key_fails() {
        let err = Mirror::from_array([Value::from(json!({"name": "no id"}))], &MirrorOptions::new())
            .unwrap_err();
        assert!(matches!(err, MirrorError::MissingKey { position: 0, .. }));
    }

    #[test]
    fn test_from_array_with_extractor() {
        let options = MirrorOptions::new()
            .extract_key(|v| v.field("name").as_str().map(str::to_string));
        let mirror = Mirror::from_array([Value::from(json!({"name": "k"}))], &options).unwrap();
        assert!(mirror.collection().contains_key("k"));
    }

    #[test]
    fn test_from_array_duplicate_keys_replace_in_place() {
        let replacement = Value::from(json!({"id": "a", "name": "second"}));
        let mirror =
            Mirror::from_array([thing("a"), thing("b"), replacement.clone()], &MirrorOptions::new())
                .unwrap();
        assert_eq!(mirror.len(), 2);
        assert_eq!(mirror.array()[0], replacement);
        assert_eq!(mirror.collection().len(), mirror.array().len());
    }

    #[test]
    fn test_add_element_appends_and_replaces() {
        let mirror = Mirror::from_array([thing("a")], &MirrorOptions::new()).unwrap();
        let added = mirror.add_element(thing("b"), &MirrorOptions::new()).unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(mirror.len(), 1);

        let renamed = Value::from(json!({"id": "a", "name": "renamed"}));
        let replaced = added.add_element(renamed.clone(), &MirrorOptions::new()).unwrap();
        assert_eq!(replaced.len(), 2);
        assert_eq!(replaced.array()[0], renamed);
        assert_eq!(replaced.collection()["a"], renamed);
    }

    #[test]
    fn test_sort_orders_array_only() {
        let options = MirrorOptions::new().sort(|a, b| {
            b.field("id").as_str().cmp(&a.field("id").as_str())
        });
        let mirror = Mirror::from_array([thing("a"), thing("b")], &options).unwrap();
        assert_eq!(mirror.array()[0], thing("b"));
        assert_eq!(mirror.collection().len(), 2);
    }

    #[test]
    fn test_base_entries_are_merged() {
        let base = Mirror::from_array([thing("a")], &MirrorOptions::new()).unwrap();
        let mirror = Mirror::build_with(keyed(&[("b", thing("b"))]), &MirrorOptions::new().base(base));
        assert_eq!(mirror.len(), 2);
    }

    #[test]
    fn test_value_round_trip_shares_halves() {
        let mirror = Mirror::build(keyed(&[("a", thing("a"))]));
        let value = mirror.clone().into_value();
        assert!(crate::predicates::is_mirror(&value));
        let back = Mirror::from_value(&value).unwrap();
        assert_eq!(back, mirror);
        assert!(Mirror::from_value(&Value::from(json!({"array": []}))).is_none());
    }
}

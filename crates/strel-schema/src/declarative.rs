//! # Declarative Model Definitions
//!
//! Loads models from YAML or JSON documents so that schemas can live
//! outside the program, e.g. for the `strel` CLI.
//!
//! ## Format
//!
//! ```yaml
//! models:
//!   Person:
//!     name: string
//!     roleId: [number, undefined]
//!     inventory:
//!       _StructuredElementReference: { structure: array, target: Thing }
//!   Thing:
//!     id: string
//!     type:
//!       _StructuredElementReference: { structure: item, equals: [gadget, widget] }
//!     weight: [number, null]
//! ```
//!
//! A node is read as follows:
//!
//! - a string names a declared model, else a type tag (`string`,
//!   `number`, `boolean`, `date`), else `undefined` or `null`;
//! - `null` is the null marker;
//! - a sequence is an alternation;
//! - a mapping whose only key is `_StructuredElementReference` is a
//!   reference, either `{structure, target}` or `{structure, equals}`;
//! - any other mapping is an inline record schema.
//!
//! Numbers and booleans are not expectations; to accept a literal, use
//! an `equals` reference. A mapping that repeats a key is rejected, in
//! either format.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::Value as Json;
use strel_core::{Value, RESERVED_REFERENCE_KEY};

use crate::api::ApiConfig;
use crate::error::SchemaError;
use crate::expectation::{Expectation, ModelId, ReferenceTarget, Structure, TypeTag};

/// Models parsed from a definition document.
#[derive(Debug, Clone, Default)]
pub struct ModelDefinitions {
    models: BTreeMap<ModelId, Expectation>,
}

impl ModelDefinitions {
    /// Parse a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        let Document(json) =
            serde_yaml::from_str(text).map_err(|e| load_error("<yaml>", format!("invalid YAML: {e}")))?;
        Self::from_document(&json)
    }

    /// Parse a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let Document(json) =
            serde_json::from_str(text).map_err(|e| load_error("<json>", format!("invalid JSON: {e}")))?;
        Self::from_document(&json)
    }

    /// Load a document from disk. `.yaml` and `.yml` files are read as
    /// YAML, anything else as JSON.
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let parsed = match ext {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        };
        parsed.map_err(|e| match e {
            SchemaError::DefinitionLoad { reason, .. } => load_error(&path.display().to_string(), reason),
            other => other,
        })
    }

    /// Parse an already-decoded document.
    pub fn from_document(document: &Json) -> Result<Self, SchemaError> {
        let Some(models) = document.get("models").and_then(Json::as_object) else {
            return Err(load_error("<document>", "expected a top-level `models` mapping".into()));
        };
        let known: BTreeSet<&str> = models.keys().map(String::as_str).collect();
        let parser = Parser { known: &known };
        let models = models
            .iter()
            .map(|(id, node)| Ok((ModelId::from(id.as_str()), parser.expectation(node, id)?)))
            .collect::<Result<_, SchemaError>>()?;
        Ok(Self { models })
    }

    pub fn get(&self, id: &str) -> Option<&Expectation> {
        self.models.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ModelId> {
        self.models.keys()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Register every model on `config`.
    pub fn apply(self, config: ApiConfig) -> ApiConfig {
        self.models.into_iter().fold(config, |config, (id, expectation)| {
            config.model(id, move || expectation.clone())
        })
    }

    /// A fresh configuration registering every model.
    pub fn into_config(self) -> ApiConfig {
        self.apply(ApiConfig::new())
    }
}

fn load_error(source_name: &str, reason: String) -> SchemaError {
    SchemaError::DefinitionLoad {
        source_name: source_name.to_string(),
        reason,
    }
}

fn malformed(path: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::MalformedExpectation {
        path: path.to_string(),
        reason: reason.into(),
    }
}

struct Parser<'a> {
    known: &'a BTreeSet<&'a str>,
}

impl Parser<'_> {
    fn expectation(&self, node: &Json, path: &str) -> Result<Expectation, SchemaError> {
        match node {
            Json::Null => Ok(Expectation::Null),
            Json::String(name) => self.named(name, path),
            Json::Array(items) => {
                let alternatives = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.expectation(item, &format!("{path}[{i}]")))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Expectation::any_of(alternatives))
            }
            Json::Object(fields) => match fields.get(RESERVED_REFERENCE_KEY) {
                Some(reference) if fields.len() == 1 => {
                    self.reference(reference, &format!("{path}.{RESERVED_REFERENCE_KEY}"))
                }
                Some(_) => Err(malformed(
                    path,
                    format!("{RESERVED_REFERENCE_KEY} must be the only key of a reference"),
                )),
                None => {
                    let schema = fields
                        .iter()
                        .map(|(key, field)| Ok((key.clone(), self.expectation(field, &format!("{path}.{key}"))?)))
                        .collect::<Result<Vec<_>, SchemaError>>()?;
                    Ok(Expectation::record(schema))
                }
            },
            Json::Bool(_) | Json::Number(_) => Err(malformed(
                path,
                format!("{node} is not an expectation; use an `equals` reference to accept a literal"),
            )),
        }
    }

    fn named(&self, name: &str, path: &str) -> Result<Expectation, SchemaError> {
        if self.known.contains(name) {
            return Ok(Expectation::model(name));
        }
        if let Some(tag) = TypeTag::parse(name) {
            return Ok(Expectation::Type(tag));
        }
        match name {
            "undefined" => Ok(Expectation::Undefined),
            "null" => Ok(Expectation::Null),
            _ => Err(malformed(
                path,
                format!("'{name}' is neither a declared model nor a type (string, number, boolean, date, null, undefined)"),
            )),
        }
    }

    fn reference(&self, node: &Json, path: &str) -> Result<Expectation, SchemaError> {
        let structure = node
            .get("structure")
            .and_then(Json::as_str)
            .ok_or_else(|| malformed(path, "reference needs a `structure` string"))?
            .parse::<Structure>()
            .map_err(|reason| malformed(path, reason))?;

        match (node.get("target"), node.get("equals")) {
            (Some(target), None) => {
                let target = match target {
                    Json::String(id) if self.known.contains(id.as_str()) => {
                        ReferenceTarget::Model(ModelId::from(id.as_str()))
                    }
                    other => ReferenceTarget::from(self.expectation(other, &format!("{path}.target"))?),
                };
                Ok(Expectation::reference(structure, target))
            }
            (None, Some(Json::Array(allowed))) => Ok(Expectation::equality(
                structure,
                allowed.iter().cloned().map(Value::from),
            )),
            (None, Some(single)) => Ok(Expectation::equality(structure, [Value::from(single.clone())])),
            _ => Err(malformed(path, "reference needs exactly one of `target` or `equals`")),
        }
    }
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Definitions use only the JSON-compatible subset of YAML. Scalar map
/// keys are stringified and tags are ignored.
/// A parsed definition document. Deserializes like `serde_json::Value`
/// but fails on a repeated mapping key instead of keeping the last one.
struct Document(Json);

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DocumentVisitor).map(Document)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Json;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a model definition document")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Json, E> {
        Ok(Json::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Json, E> {
        Ok(Json::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Json, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Json, E> {
        Ok(Json::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> Result<Json, E> {
        Ok(Json::from(n))
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> Result<Json, E> {
        Ok(Json::from(n))
    }

    fn visit_f64<E: de::Error>(self, n: f64) -> Result<Json, E> {
        Ok(serde_json::Number::from_f64(n).map_or(Json::Null, Json::Number))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Json, E> {
        Ok(Json::String(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Json, E> {
        Ok(Json::String(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Json, A::Error> {
        let mut items = Vec::new();
        while let Some(Document(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Json::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Json, A::Error> {
        let mut object = serde_json::Map::new();
        while let Some(key) = map.next_key::<String>()? {
            if object.contains_key(&key) {
                return Err(de::Error::custom(format_args!("duplicate key `{key}`")));
            }
            let Document(value) = map.next_value()?;
            object.insert(key, value);
        }
        Ok(Json::Object(object))
    }
}

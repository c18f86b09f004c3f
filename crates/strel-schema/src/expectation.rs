//! # Expectations — What a Value Must Look Like
//!
//! An [`Expectation`] is a closed description of an acceptable value:
//! a named model, a primitive type tag, the null/undefined markers, an
//! alternation of other expectations, an inline record schema, a
//! reference to a structural validator, or an arbitrary predicate.
//!
//! Compound expectations live behind `Arc`. Cloning an expectation shares
//! the node, and the node address is its cache identity
//! ([`ExpectationKey`]). Two separately built but structurally equal
//! record schemas are different expectations as far as caching goes.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use strel_core::predicates::is_date;
use strel_core::Value;

/// The kind of container a validator checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    /// Every element of an array.
    Array,
    /// Every entry of a string-keyed record.
    Collection,
    /// A single value.
    Item,
    /// Both halves of a mirror.
    Mirror,
}

impl Structure {
    /// All structures, in declaration order.
    pub const ALL: [Structure; 4] = [
        Structure::Array,
        Structure::Collection,
        Structure::Item,
        Structure::Mirror,
    ];

    /// Lowercase name, as used in declarative definitions.
    pub fn as_str(self) -> &'static str {
        match self {
            Structure::Array => "array",
            Structure::Collection => "collection",
            Structure::Item => "item",
            Structure::Mirror => "mirror",
        }
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Structure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Structure::ALL
            .into_iter()
            .find(|structure| structure.as_str() == s)
            .ok_or_else(|| format!("unknown structure '{s}' (expected array, collection, item or mirror)"))
    }
}

/// Identifier of a registered model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(Arc<str>);

impl ModelId {
    /// Wrap a model name.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// The model name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ModelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ModelId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// Primitive type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String,
    Number,
    Boolean,
    /// A date holding a valid timestamp.
    Date,
}

impl TypeTag {
    /// The tag's name in definitions and failure reasons.
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Boolean => "boolean",
            TypeTag::Date => "date",
        }
    }

    /// Parse a tag name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(TypeTag::String),
            "number" => Some(TypeTag::Number),
            "boolean" => Some(TypeTag::Boolean),
            "date" => Some(TypeTag::Date),
            _ => None,
        }
    }

    /// Whether `value` has this type.
    ///
    /// `NaN` is a number here; an invalid date is not a date.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            TypeTag::Date => is_date(value),
            other => value.kind() == other.name(),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inline record schema: field name to field expectation.
pub type RecordSchema = BTreeMap<String, Expectation>;

/// A user-supplied test. Accepts when it returns `true`.
#[derive(Clone)]
pub struct Predicate {
    label: Arc<str>,
    test: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl Predicate {
    /// Wrap a test function. The label only appears in diagnostics.
    pub fn new(
        label: impl Into<Arc<str>>,
        test: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            test: Arc::new(test),
        }
    }

    /// Run the test.
    pub fn test(&self, value: &Value) -> bool {
        (self.test)(value)
    }

    /// Diagnostic label.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").field("label", &self.label).finish_non_exhaustive()
    }
}

/// What a reference points at: a registered model, or an inline
/// expectation.
#[derive(Debug, Clone)]
pub enum ReferenceTarget {
    Model(ModelId),
    Inline(Expectation),
}

impl From<ModelId> for ReferenceTarget {
    fn from(id: ModelId) -> Self {
        ReferenceTarget::Model(id)
    }
}

impl From<&str> for ReferenceTarget {
    fn from(id: &str) -> Self {
        ReferenceTarget::Model(ModelId::from(id))
    }
}

impl From<Expectation> for ReferenceTarget {
    /// A bare model expectation targets the model itself.
    fn from(expectation: Expectation) -> Self {
        match expectation {
            Expectation::Model(id) => ReferenceTarget::Model(id),
            other => ReferenceTarget::Inline(other),
        }
    }
}

impl fmt::Display for ReferenceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceTarget::Model(id) => write!(f, "{id}"),
            ReferenceTarget::Inline(expectation) => write!(f, "{expectation}"),
        }
    }
}

/// "Validate this value with the `structure` validator for `target`."
#[derive(Debug, Clone)]
pub struct Reference {
    pub structure: Structure,
    pub target: ReferenceTarget,
}

/// A description of acceptable values.
#[derive(Debug, Clone)]
pub enum Expectation {
    /// Validate with the item validator of a registered model.
    Model(ModelId),
    /// Primitive type check.
    Type(TypeTag),
    /// Accepts exactly `null`.
    Null,
    /// Accepts exactly an absent value.
    Undefined,
    /// Accepts when any alternative accepts.
    Alternation(Arc<[Expectation]>),
    /// Inline record schema.
    Record(Arc<RecordSchema>),
    /// Delegate to a structural validator.
    Reference(Arc<Reference>),
    /// Arbitrary test.
    Predicate(Predicate),
}

impl Expectation {
    pub const STRING: Expectation = Expectation::Type(TypeTag::String);
    pub const NUMBER: Expectation = Expectation::Type(TypeTag::Number);
    pub const BOOLEAN: Expectation = Expectation::Type(TypeTag::Boolean);
    pub const DATE: Expectation = Expectation::Type(TypeTag::Date);

    /// Named model.
    pub fn model(id: impl Into<ModelId>) -> Self {
        Expectation::Model(id.into())
    }

    /// Alternation of the given expectations.
    pub fn any_of(alternatives: impl IntoIterator<Item = Expectation>) -> Self {
        Expectation::Alternation(alternatives.into_iter().collect())
    }

    /// Inline record schema.
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Expectation)>) -> Self {
        Expectation::Record(Arc::new(
            fields.into_iter().map(|(k, e)| (k.into(), e)).collect(),
        ))
    }

    /// Predicate expectation.
    pub fn predicate(
        label: impl Into<Arc<str>>,
        test: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Expectation::Predicate(Predicate::new(label, test))
    }

    /// Reference expectation. Each call builds a new reference node.
    pub fn reference(structure: Structure, target: impl Into<ReferenceTarget>) -> Self {
        Expectation::Reference(Arc::new(Reference {
            structure,
            target: target.into(),
        }))
    }

    /// Reference to a generated predicate accepting values strictly equal
    /// to one of `allowed`.
    ///
    /// Compound allowed values match only the same node, never a copy.
    pub fn equality<V: Into<Value>>(
        structure: Structure,
        allowed: impl IntoIterator<Item = V>,
    ) -> Self {
        let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
        let label = allowed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ");
        let test = move |value: &Value| allowed.iter().any(|a| a.strict_eq(value));
        Self::reference(
            structure,
            Expectation::Predicate(Predicate::new(format!("equals {label}"), test)),
        )
    }

    /// The alternatives this expectation offers: the list itself for an
    /// alternation, a single entry otherwise.
    pub fn alternatives(&self) -> &[Expectation] {
        match self {
            Expectation::Alternation(list) => list,
            other => std::slice::from_ref(other),
        }
    }

    /// Whether an absent value is one of the top-level alternatives.
    pub fn admits_undefined(&self) -> bool {
        self.alternatives()
            .iter()
            .any(|e| matches!(e, Expectation::Undefined))
    }

    /// Whether `null` is one of the top-level alternatives.
    pub fn admits_null(&self) -> bool {
        self.alternatives()
            .iter()
            .any(|e| matches!(e, Expectation::Null))
    }

    /// Cache identity.
    pub fn key(&self) -> ExpectationKey {
        match self {
            Expectation::Model(id) => ExpectationKey::Model(id.clone()),
            Expectation::Type(tag) => ExpectationKey::Type(*tag),
            Expectation::Null => ExpectationKey::Null,
            Expectation::Undefined => ExpectationKey::Undefined,
            Expectation::Alternation(list) => ExpectationKey::node(list),
            Expectation::Record(schema) => ExpectationKey::node(schema),
            Expectation::Reference(reference) => ExpectationKey::node(reference),
            Expectation::Predicate(predicate) => ExpectationKey::node(&predicate.test),
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Model(id) => write!(f, "{id}"),
            Expectation::Type(tag) => write!(f, "{tag}"),
            Expectation::Null => f.write_str("null"),
            Expectation::Undefined => f.write_str("undefined"),
            Expectation::Alternation(list) => {
                f.write_str("[")?;
                for (i, e) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{e}")?;
                }
                f.write_str("]")
            }
            Expectation::Record(schema) => {
                f.write_str("{")?;
                for (i, (key, e)) in schema.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {e}")?;
                }
                f.write_str("}")
            }
            Expectation::Reference(reference) => {
                write!(f, "{}<{}>", reference.structure, reference.target)
            }
            Expectation::Predicate(predicate) => write!(f, "({})", predicate.label()),
        }
    }
}

impl Serialize for Expectation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<TypeTag> for Expectation {
    fn from(tag: TypeTag) -> Self {
        Expectation::Type(tag)
    }
}

impl From<ModelId> for Expectation {
    fn from(id: ModelId) -> Self {
        Expectation::Model(id)
    }
}

/// Cache identity of an expectation.
///
/// Atomic expectations compare by value. Compound ones compare by node
/// address, which is only stable while the node is alive: every cache
/// keyed by `ExpectationKey` also holds the expectation it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExpectationKey {
    Model(ModelId),
    Type(TypeTag),
    Null,
    Undefined,
    Node(usize),
}

impl ExpectationKey {
    fn node<T: ?Sized>(node: &Arc<T>) -> Self {
        ExpectationKey::Node(Arc::as_ptr(node) as *const () as usize)
    }
}

//! # Model Registry
//!
//! Maps model ids to their expectations. Registration happens in two
//! phases so models may reference each other, and themselves, by id:
//!
//! 1. Every id is registered with its builder. Nothing is built yet.
//! 2. On first use, an entry runs its builder once and memoizes the
//!    expectation and its validator bundle.
//!
//! Builders return expectations that name other models by id; those ids
//! are resolved against the registry when validation reaches them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::SchemaError;
use crate::expectation::{Expectation, ModelId, ReferenceTarget};
use crate::validator::ValidatorBundle;

/// Builds a model's expectation.
pub type ModelBuilder = Arc<dyn Fn() -> Expectation + Send + Sync>;

/// One registered model.
pub struct ModelEntry {
    id: ModelId,
    builder: ModelBuilder,
    expectation: OnceLock<Expectation>,
    validators: OnceLock<ValidatorBundle>,
}

impl ModelEntry {
    fn new(id: ModelId, builder: ModelBuilder) -> Self {
        Self {
            id,
            builder,
            expectation: OnceLock::new(),
            validators: OnceLock::new(),
        }
    }

    pub fn id(&self) -> &ModelId {
        &self.id
    }

    /// The model's expectation, built on first call.
    pub fn expect(&self) -> &Expectation {
        self.expectation.get_or_init(|| (self.builder)())
    }

    /// The model's validators, built on first call.
    pub fn validators(&self) -> &ValidatorBundle {
        self.validators
            .get_or_init(|| ValidatorBundle::new(self.expect().clone()))
    }
}

impl fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEntry")
            .field("id", &self.id)
            .field("expectation", &self.expectation.get())
            .finish_non_exhaustive()
    }
}

/// All registered models.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    entries: BTreeMap<ModelId, ModelEntry>,
}

impl ModelRegistry {
    pub(crate) fn new(builders: &BTreeMap<ModelId, ModelBuilder>) -> Self {
        let entries = builders
            .iter()
            .map(|(id, builder)| (id.clone(), ModelEntry::new(id.clone(), Arc::clone(builder))))
            .collect();
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&ModelEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &ModelId> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build every model and check that every model id they mention is
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownModel` for the first unresolved id,
    /// in model order.
    pub fn verify(&self) -> Result<(), SchemaError> {
        for entry in self.iter() {
            let mut mentioned = BTreeSet::new();
            collect_model_ids(entry.expect(), &mut mentioned);
            if let Some(missing) = mentioned.into_iter().find(|id| !self.contains(id.as_str())) {
                return Err(SchemaError::UnknownModel {
                    model: missing.to_string(),
                    context: format!("model '{}'", entry.id()),
                });
            }
        }
        Ok(())
    }
}

fn collect_model_ids(expectation: &Expectation, out: &mut BTreeSet<ModelId>) {
    match expectation {
        Expectation::Model(id) => {
            out.insert(id.clone());
        }
        Expectation::Alternation(list) => list.iter().for_each(|e| collect_model_ids(e, out)),
        Expectation::Record(schema) => schema.values().for_each(|e| collect_model_ids(e, out)),
        Expectation::Reference(reference) => match &reference.target {
            ReferenceTarget::Model(id) => {
                out.insert(id.clone());
            }
            ReferenceTarget::Inline(inner) => collect_model_ids(inner, out),
        },
        Expectation::Type(_)
        | Expectation::Null
        | Expectation::Undefined
        | Expectation::Predicate(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectation::Structure;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn builders(pairs: Vec<(&str, ModelBuilder)>) -> BTreeMap<ModelId, ModelBuilder> {
        pairs.into_iter().map(|(id, b)| (ModelId::from(id), b)).collect()
    }

    fn builder(build: impl Fn() -> Expectation + Send + Sync + 'static) -> ModelBuilder {
        Arc::new(build)
    }

    #[test]
    fn test_builder_runs_once_and_lazily() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = ModelRegistry::new(&builders(vec![(
            "Thing",
            builder(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Expectation::record([("id", Expectation::STRING)])
            }),
        )]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let entry = registry.get("Thing").unwrap();
        let first = entry.expect().key();
        assert_eq!(entry.expect().key(), first);
        assert_eq!(entry.validators().item().expectation().key(), first);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_self_reference_is_allowed() {
        let registry = ModelRegistry::new(&builders(vec![(
            "Thing",
            builder(|| {
                Expectation::record([("parts", Expectation::reference(Structure::Collection, "Thing"))])
            }),
        )]));
        assert!(registry.verify().is_ok());
    }

    #[test]
    fn test_verify_reports_unknown_model() {
        let registry = ModelRegistry::new(&builders(vec![(
            "Person",
            builder(|| Expectation::record([("pet", Expectation::model("Pet"))])),
        )]));
        let err = registry.verify().unwrap_err();
        assert!(matches!(err, SchemaError::UnknownModel { ref model, .. } if model == "Pet"));
    }

    #[test]
    fn test_ids_sorted() {
        let registry = ModelRegistry::new(&builders(vec![
            ("Thing", builder(|| Expectation::STRING)),
            ("Person", builder(|| Expectation::STRING)),
        ]));
        let ids: Vec<_> = registry.ids().map(ModelId::as_str).collect();
        assert_eq!(ids, vec!["Person", "Thing"]);
        assert_eq!(registry.len(), 2);
    }
}

//! # Validation API
//!
//! [`Api::setup`] turns an [`ApiConfig`] into a shareable handle owning
//! the model registry, the validator cache and the result cache.
//! [`Api::validator`] hands out [`Validator`]s for a model or an inline
//! expectation.
//!
//! ## Thread Safety
//!
//! `Api` is `Clone + Send + Sync`; clones share all caches. Locks guard
//! single cache reads and writes only and are never held while a nested
//! validator runs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use strel_core::Value;

use crate::cache::{BundleCache, ResultCache, DEFAULT_BUNDLE_CAPACITY, DEFAULT_CAPACITY};
use crate::debug::{DebugChannel, DebugEnabled, LogDebugMessage};
use crate::error::SchemaError;
use crate::expectation::{Expectation, ModelId, ReferenceTarget, Structure};
use crate::failure::Failure;
use crate::registry::{ModelBuilder, ModelEntry, ModelRegistry};
use crate::result::ValidationResult;
use crate::salvage::AttemptSalvage;
use crate::validator::{StructuralValidator, ValidatorBundle};

/// Configuration for [`Api::setup`].
#[derive(Clone)]
pub struct ApiConfig {
    debug_enabled: DebugEnabled,
    log_debug_message: Option<LogDebugMessage>,
    models: BTreeMap<ModelId, ModelBuilder>,
    result_cache_capacity: usize,
    validator_cache_capacity: usize,
}

impl ApiConfig {
    /// No models, debug output off, default cache capacity.
    pub fn new() -> Self {
        Self {
            debug_enabled: Arc::new(|| false),
            log_debug_message: None,
            models: BTreeMap::new(),
            result_cache_capacity: DEFAULT_CAPACITY,
            validator_cache_capacity: DEFAULT_BUNDLE_CAPACITY,
        }
    }

    /// Gate for debug messages, consulted on every message.
    pub fn debug_enabled(mut self, enabled: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.debug_enabled = Arc::new(enabled);
        self
    }

    /// Sink for debug messages. Without one, messages go to `tracing`.
    pub fn log_debug_message(
        mut self,
        sink: impl Fn(&str, &serde_json::Value) + Send + Sync + 'static,
    ) -> Self {
        self.log_debug_message = Some(Arc::new(sink));
        self
    }

    /// Register a model. A later registration of the same id replaces
    /// the earlier one.
    pub fn model(
        mut self,
        id: impl Into<ModelId>,
        builder: impl Fn() -> Expectation + Send + Sync + 'static,
    ) -> Self {
        self.models.insert(id.into(), Arc::new(builder));
        self
    }

    /// Maximum number of cached results. Zero disables result caching.
    pub fn result_cache_capacity(mut self, capacity: usize) -> Self {
        self.result_cache_capacity = capacity;
        self
    }

    /// Maximum number of validator bundles kept for inline expectations.
    /// Zero builds a fresh bundle per request.
    pub fn validator_cache_capacity(mut self, capacity: usize) -> Self {
        self.validator_cache_capacity = capacity;
        self
    }

    /// Ids registered so far.
    pub fn model_ids(&self) -> impl Iterator<Item = &ModelId> {
        self.models.keys()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .field("custom_debug_sink", &self.log_debug_message.is_some())
            .field("result_cache_capacity", &self.result_cache_capacity)
            .field("validator_cache_capacity", &self.validator_cache_capacity)
            .finish_non_exhaustive()
    }
}

struct ApiInner {
    debug: DebugChannel,
    builders: BTreeMap<ModelId, ModelBuilder>,
    registry: OnceLock<ModelRegistry>,
    bundles: BundleCache,
    results: ResultCache,
}

/// Shared validation context.
#[derive(Clone)]
pub struct Api {
    inner: Arc<ApiInner>,
}

impl Api {
    /// Build an API from its configuration. Models are not built until
    /// first used.
    pub fn setup(config: ApiConfig) -> Self {
        tracing::debug!(
            models = config.models.len(),
            result_cache_capacity = config.result_cache_capacity,
            validator_cache_capacity = config.validator_cache_capacity,
            "validation api configured"
        );
        Self {
            inner: Arc::new(ApiInner {
                debug: DebugChannel::new(config.debug_enabled, config.log_debug_message),
                builders: config.models,
                registry: OnceLock::new(),
                bundles: BundleCache::new(config.validator_cache_capacity),
                results: ResultCache::new(config.result_cache_capacity),
            }),
        }
    }

    /// Whether debug output is currently on.
    pub fn debug_enabled(&self) -> bool {
        self.inner.debug.is_enabled()
    }

    /// The model registry, created on first access.
    pub fn registered_models(&self) -> &ModelRegistry {
        self.inner
            .registry
            .get_or_init(|| ModelRegistry::new(&self.inner.builders))
    }

    /// Build every model and check that every referenced id is
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownModel` for the first unresolved id.
    pub fn verify_models(&self) -> Result<(), SchemaError> {
        self.registered_models().verify()
    }

    /// See [`Expectation::reference`].
    pub fn reference(&self, structure: Structure, target: impl Into<ReferenceTarget>) -> Expectation {
        Expectation::reference(structure, target)
    }

    /// See [`Expectation::equality`].
    pub fn equality<V: Into<Value>>(
        &self,
        structure: Structure,
        allowed: impl IntoIterator<Item = V>,
    ) -> Expectation {
        Expectation::equality(structure, allowed)
    }

    /// A validator checking `structure` against `target`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownModel` if `target` names a model that
    /// is not registered.
    pub fn validator(
        &self,
        target: impl Into<ReferenceTarget>,
        structure: Structure,
    ) -> Result<Validator, SchemaError> {
        let target = target.into();
        let core = self.resolve(&target, structure, "validator request")?;
        Ok(Validator {
            api: self.clone(),
            core,
        })
    }

    /// Drop every cached result, releasing the subjects they hold.
    pub fn clear_results(&self) {
        self.inner.results.clear();
    }

    /// Number of cached results.
    pub fn cached_results(&self) -> usize {
        self.inner.results.len()
    }

    /// Drop the validator bundles built for inline expectations, releasing
    /// the expectations they hold. Model validators are unaffected.
    pub fn clear_validators(&self) {
        self.inner.bundles.clear();
    }

    /// Number of cached inline validator bundles.
    pub fn cached_validators(&self) -> usize {
        self.inner.bundles.len()
    }

    pub(crate) fn debug(&self) -> &DebugChannel {
        &self.inner.debug
    }

    pub(crate) fn results(&self) -> &ResultCache {
        &self.inner.results
    }

    /// Look up a model, logging the registry state when it is missing.
    pub(crate) fn model(&self, id: &ModelId, context: &str) -> Result<&ModelEntry, SchemaError> {
        let registry = self.registered_models();
        registry.get(id.as_str()).ok_or_else(|| {
            let known: Vec<&str> = registry.ids().map(ModelId::as_str).collect();
            tracing::error!(model = %id, context, ?known, "unknown model referenced");
            self.debug().log("Unknown model referenced", || {
                serde_json::json!({ "model": id.as_str(), "context": context, "known": known })
            });
            SchemaError::UnknownModel {
                model: id.to_string(),
                context: context.to_string(),
            }
        })
    }

    /// The `structure` validator for a reference target.
    pub(crate) fn resolve(
        &self,
        target: &ReferenceTarget,
        structure: Structure,
        context: &str,
    ) -> Result<StructuralValidator, SchemaError> {
        match target {
            ReferenceTarget::Model(id) => Ok(self.model(id, context)?.validators().get(structure).clone()),
            ReferenceTarget::Inline(expectation) => {
                Ok(self.bundle_for(expectation).get(structure).clone())
            }
        }
    }

    /// The validator bundle of an inline expectation, cached per
    /// expectation node.
    pub(crate) fn bundle_for(&self, expectation: &Expectation) -> Arc<ValidatorBundle> {
        self.inner.bundles.get_or_build(expectation)
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("models", &self.inner.builders.keys().collect::<Vec<_>>())
            .field("debug", &self.inner.debug)
            .field("cached_results", &self.inner.results.len())
            .field("cached_validators", &self.inner.bundles.len())
            .finish_non_exhaustive()
    }
}

/// A structural validator bound to the [`Api`] that resolves its models
/// and caches its results.
#[derive(Debug, Clone)]
pub struct Validator {
    api: Api,
    core: StructuralValidator,
}

impl Validator {
    pub fn structure(&self) -> Structure {
        self.core.structure()
    }

    pub fn expectation(&self) -> &Expectation {
        self.core.expectation()
    }

    /// Validate `subject` and salvage with the structure's default
    /// strategy.
    ///
    /// Validating the same subject node again returns the same cached
    /// result.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownModel` if validation reaches a model id
    /// that is not registered. Invalid data is never an error.
    pub fn validate(&self, subject: &Value, name: &str) -> Result<Arc<ValidationResult>, SchemaError> {
        self.core.run(&self.api, subject, name, None)
    }

    /// Like [`Validator::validate`], salvaging with `strategy`. A result
    /// already cached for this subject is returned unchanged, whatever
    /// strategy produced it.
    pub fn validate_with(
        &self,
        subject: &Value,
        name: &str,
        strategy: &dyn AttemptSalvage,
    ) -> Result<Arc<ValidationResult>, SchemaError> {
        self.core.run(&self.api, subject, name, Some(strategy))
    }

    pub fn is_valid(&self, subject: &Value, name: &str) -> Result<bool, SchemaError> {
        Ok(self.validate(subject, name)?.is_valid())
    }

    pub fn get_failures(&self, subject: &Value, name: &str) -> Result<Vec<Failure>, SchemaError> {
        Ok(self.validate(subject, name)?.failures().to_vec())
    }

    pub fn get_salvage(&self, subject: &Value, name: &str) -> Result<Option<Value>, SchemaError> {
        Ok(self.validate(subject, name)?.salvage().cloned())
    }

    pub fn get_salvage_with(
        &self,
        subject: &Value,
        name: &str,
        strategy: &dyn AttemptSalvage,
    ) -> Result<Option<Value>, SchemaError> {
        Ok(self.validate_with(subject, name, strategy)?.salvage().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api() -> Api {
        Api::setup(ApiConfig::new().model("Tag", || {
            Expectation::record([("label", Expectation::STRING)])
        }))
    }

    #[test]
    fn test_api_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Api>();
        assert_send_sync::<Validator>();
    }

    #[test]
    fn test_unknown_model_is_error() {
        let err = api().validator("Missing", Structure::Item).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownModel { ref model, .. } if model == "Missing"));
    }

    #[test]
    fn test_inline_bundles_are_shared_per_node() {
        let api = api();
        let e = Expectation::any_of([Expectation::STRING, Expectation::NUMBER]);
        let a = api.bundle_for(&e);
        let b = api.bundle_for(&e.clone());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_clear_results() {
        let api = api();
        let validator = api.validator("Tag", Structure::Array).unwrap();
        let subject = Value::from(json!([{"label": "a"}]));
        assert!(validator.is_valid(&subject, "tags").unwrap());
        assert!(api.cached_results() > 0);
        api.clear_results();
        assert_eq!(api.cached_results(), 0);
    }

    #[test]
    fn test_clones_share_caches() {
        let api = api();
        let clone = api.clone();
        let subject = Value::from(json!({"label": "a"}));
        api.validator("Tag", Structure::Item).unwrap().validate(&subject, "tag").unwrap();
        assert_eq!(clone.cached_results(), api.cached_results());
        assert!(clone.cached_results() > 0);
    }

    #[test]
    fn test_config_debug_output() {
        let config = ApiConfig::new().model("B", || Expectation::STRING).model("A", || Expectation::STRING);
        let ids: Vec<_> = config.model_ids().map(ModelId::as_str).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert!(format!("{config:?}").contains("result_cache_capacity"));
    }

    #[test]
    fn test_inline_validators_are_bounded_and_clearable() {
        let api = Api::setup(ApiConfig::new().validator_cache_capacity(16));
        for i in 0..1000 {
            let inline = Expectation::record([(format!("f{i}"), Expectation::STRING)]);
            api.validator(inline, Structure::Item).unwrap();
        }
        assert_eq!(api.cached_validators(), 16);
        api.clear_validators();
        assert_eq!(api.cached_validators(), 0);
    }
}

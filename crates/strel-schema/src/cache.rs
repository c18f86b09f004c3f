//! # Result Cache
//!
//! Memoizes validation results per (expectation, structure, subject node).
//! Only compound subjects (arrays and records) have a node identity, so
//! primitive subjects are never cached.
//!
//! The cache is bounded. When full, the oldest entry is evicted. Each
//! entry holds its subject (through the result) and its expectation, so
//! neither address can be reused by another node while the entry lives.
//! Entries also keep their subjects alive: [`ResultCache::clear`] releases
//! them.
//!
//! [`BundleCache`] memoizes the validator bundles of inline expectations
//! the same way: bounded, oldest evicted first, cleared on demand.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use strel_core::{Identity, Value};

use crate::expectation::{Expectation, ExpectationKey, Structure};
use crate::result::ValidationResult;
use crate::validator::ValidatorBundle;

/// Capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Inline bundle capacity used when none is configured.
pub const DEFAULT_BUNDLE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    expectation: ExpectationKey,
    structure: Structure,
    subject: Identity,
}

#[derive(Debug)]
struct CachedResult {
    _expectation: Expectation,
    result: Arc<ValidationResult>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CachedResult>,
    order: VecDeque<CacheKey>,
}

/// Bounded, thread-safe result cache.
#[derive(Debug)]
pub struct ResultCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl ResultCache {
    /// A cache holding at most `capacity` results. Zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    fn key(expectation: &Expectation, structure: Structure, subject: &Value) -> Option<CacheKey> {
        Some(CacheKey {
            expectation: expectation.key(),
            structure,
            subject: subject.identity()?,
        })
    }

    /// The cached result for this subject node, if any.
    pub fn get(
        &self,
        expectation: &Expectation,
        structure: Structure,
        subject: &Value,
    ) -> Option<Arc<ValidationResult>> {
        let key = Self::key(expectation, structure, subject)?;
        self.state
            .lock()
            .entries
            .get(&key)
            .map(|cached| Arc::clone(&cached.result))
    }

    /// Store `result` under its subject's identity and return the result
    /// that is now canonical for that key.
    ///
    /// If another thread stored a result for the same key first, that
    /// earlier result is kept and returned.
    pub fn insert(
        &self,
        expectation: &Expectation,
        structure: Structure,
        result: ValidationResult,
    ) -> Arc<ValidationResult> {
        let result = Arc::new(result);
        if self.capacity == 0 {
            return result;
        }
        let Some(key) = Self::key(expectation, structure, result.subject()) else {
            return result;
        };

        let mut state = self.state.lock();
        if let Some(existing) = state.entries.get(&key) {
            return Arc::clone(&existing.result);
        }
        while state.entries.len() >= self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
        }
        state.order.push_back(key.clone());
        state.entries.insert(
            key,
            CachedResult {
                _expectation: expectation.clone(),
                result: Arc::clone(&result),
            },
        );
        result
    }

    /// Drop every cached result.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.order.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[derive(Debug, Default)]
struct BundleState {
    entries: HashMap<ExpectationKey, Arc<ValidatorBundle>>,
    order: VecDeque<ExpectationKey>,
}

/// Bounded, thread-safe cache of inline validator bundles, keyed by
/// expectation node. Each bundle holds its expectation, so a key's address
/// stays reserved while the entry lives.
#[derive(Debug)]
pub struct BundleCache {
    capacity: usize,
    state: Mutex<BundleState>,
}

impl BundleCache {
    /// A cache holding at most `capacity` bundles. Zero builds a fresh
    /// bundle on every request.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(BundleState::default()),
        }
    }

    /// The bundle for `expectation`, built on first request.
    pub fn get_or_build(&self, expectation: &Expectation) -> Arc<ValidatorBundle> {
        if self.capacity == 0 {
            return Arc::new(ValidatorBundle::new(expectation.clone()));
        }
        let key = expectation.key();
        let mut state = self.state.lock();
        if let Some(bundle) = state.entries.get(&key) {
            return Arc::clone(bundle);
        }
        while state.entries.len() >= self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
        }
        let bundle = Arc::new(ValidatorBundle::new(expectation.clone()));
        state.order.push_back(key.clone());
        state.entries.insert(key, Arc::clone(&bundle));
        bundle
    }

    /// Drop every cached bundle.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.order.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BundleCache {
    fn default() -> Self {
        Self::new(DEFAULT_BUNDLE_CAPACITY)
    }
}

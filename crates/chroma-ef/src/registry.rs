//! Embedding function registry: name → factory, built once and read
//! constantly.
//!
//! Registrations happen a handful of times at startup; builds happen on
//! every collection open. Grounded on `ProviderManager`'s
//! `Arc<RwLock<..>>` guarding a `BTreeMap<CompactString, _>` for
//! deterministic `list_*` ordering, adapted from a name→instance map to a
//! name→factory map since a registry entry here is reused to build many
//! independent embedding function instances, one per collection config.

use crate::bm25::Bm25EmbeddingFunction;
use crate::contract::{EmbeddingFunction, SparseEmbeddingFunction};
use crate::error::EfError;
use crate::noop::{
    CredentialedEmbeddingFunction, MockEmbeddingFunction, NoopEmbeddingFunction, NoopSparseEmbeddingFunction,
};
use compact_str::CompactString;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// A config map as stored/round-tripped by `EmbeddingFunction::get_config`.
pub type EfConfig = BTreeMap<String, serde_json::Value>;

type DenseFactory = Arc<dyn Fn(&EfConfig) -> Result<Arc<dyn EmbeddingFunction>, EfError> + Send + Sync>;
type SparseFactory = Arc<dyn Fn(&EfConfig) -> Result<Arc<dyn SparseEmbeddingFunction>, EfError> + Send + Sync>;

struct Inner {
    dense: BTreeMap<CompactString, DenseFactory>,
    sparse: BTreeMap<CompactString, SparseFactory>,
}

/// The embedding function registry.
///
/// Clone is cheap: it shares the same underlying locked maps (an `Arc`
/// internally), matching `ProviderManager`'s clone contract.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RwLock<Inner>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("dense", &self.list_dense())
            .field("sparse", &self.list_sparse())
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Registry { inner: Arc::new(RwLock::new(Inner { dense: BTreeMap::new(), sparse: BTreeMap::new() })) }
    }

    /// A registry pre-populated with the built-in `bm25` sparse function
    /// and `noop`/`noop-sparse` test doubles.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_sparse("bm25", |config| {
            let k = config.get("k").and_then(|v| v.as_f64()).unwrap_or(crate::bm25::DEFAULT_K as f64) as f32;
            let b = config.get("b").and_then(|v| v.as_f64()).unwrap_or(crate::bm25::DEFAULT_B as f64) as f32;
            let mut ef = Bm25EmbeddingFunction::with_params(k, b);
            if let Some(avg_doc_len) = config.get("avg_doc_len").and_then(|v| v.as_f64()) {
                ef = ef.with_avg_doc_len(avg_doc_len as f32);
            }
            if let Some(token_max_length) = config.get("token_max_length").and_then(|v| v.as_u64()) {
                ef = ef.with_token_max_length(token_max_length as usize);
            }
            Ok(Arc::new(ef) as Arc<dyn SparseEmbeddingFunction>)
        });
        registry.register_dense("noop", |_config| Ok(Arc::new(NoopEmbeddingFunction) as Arc<dyn EmbeddingFunction>));
        registry.register_sparse("noop-sparse", |_config| {
            Ok(Arc::new(NoopSparseEmbeddingFunction) as Arc<dyn SparseEmbeddingFunction>)
        });
        registry.register_dense("mock", |config| {
            let dimension = config.get("dimension").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
            Ok(Arc::new(MockEmbeddingFunction::new(dimension)) as Arc<dyn EmbeddingFunction>)
        });
        registry.register_dense("credentialed-mock", |config| {
            let dimension = config.get("dimension").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
            let env_var = config.get("api_key_env_var").and_then(|v| v.as_str()).ok_or_else(|| {
                EfError::InvalidConfig("credentialed-mock config is missing \"api_key_env_var\"".to_string())
            })?;
            Ok(Arc::new(CredentialedEmbeddingFunction::new(dimension, env_var)) as Arc<dyn EmbeddingFunction>)
        });
        registry
    }

    /// Register a dense embedding function factory under `name`, replacing
    /// any existing registration.
    pub fn register_dense<F>(&self, name: impl Into<CompactString>, factory: F)
    where
        F: Fn(&EfConfig) -> Result<Arc<dyn EmbeddingFunction>, EfError> + Send + Sync + 'static,
    {
        self.inner.write().unwrap().dense.insert(name.into(), Arc::new(factory));
    }

    /// Register a sparse embedding function factory under `name`, replacing
    /// any existing registration.
    pub fn register_sparse<F>(&self, name: impl Into<CompactString>, factory: F)
    where
        F: Fn(&EfConfig) -> Result<Arc<dyn SparseEmbeddingFunction>, EfError> + Send + Sync + 'static,
    {
        self.inner.write().unwrap().sparse.insert(name.into(), Arc::new(factory));
    }

    /// Whether a dense factory is registered under `name`.
    pub fn has_dense(&self, name: &str) -> bool {
        self.inner.read().unwrap().dense.contains_key(name)
    }

    /// Whether a sparse factory is registered under `name`.
    pub fn has_sparse(&self, name: &str) -> bool {
        self.inner.read().unwrap().sparse.contains_key(name)
    }

    /// Registered dense factory names, in deterministic (sorted) order.
    pub fn list_dense(&self) -> Vec<String> {
        self.inner.read().unwrap().dense.keys().map(|k| k.to_string()).collect()
    }

    /// Registered sparse factory names, in deterministic (sorted) order.
    pub fn list_sparse(&self) -> Vec<String> {
        self.inner.read().unwrap().sparse.keys().map(|k| k.to_string()).collect()
    }

    /// Build a dense embedding function instance from a previously stored
    /// config, round-tripping through the registered factory.
    pub fn build_dense(&self, name: &str, config: &EfConfig) -> Result<Arc<dyn EmbeddingFunction>, EfError> {
        let factory = self
            .inner
            .read()
            .unwrap()
            .dense
            .get(name)
            .cloned()
            .ok_or_else(|| EfError::UnknownDense { name: name.to_string() })?;
        factory(config)
    }

    /// Build a sparse embedding function instance from a previously stored
    /// config.
    pub fn build_sparse(&self, name: &str, config: &EfConfig) -> Result<Arc<dyn SparseEmbeddingFunction>, EfError> {
        let factory = self
            .inner
            .read()
            .unwrap()
            .sparse
            .get(name)
            .cloned()
            .ok_or_else(|| EfError::UnknownSparse { name: name.to_string() })?;
        factory(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_is_an_error() {
        let registry = Registry::new();
        let err = registry.build_dense("nope", &EfConfig::new()).unwrap_err();
        assert!(matches!(err, EfError::UnknownDense { .. }));
    }

    #[test]
    fn list_is_sorted_and_deterministic() {
        let registry = Registry::new();
        registry.register_dense("zeta", |_| Ok(Arc::new(NoopEmbeddingFunction) as Arc<dyn EmbeddingFunction>));
        registry.register_dense("alpha", |_| Ok(Arc::new(NoopEmbeddingFunction) as Arc<dyn EmbeddingFunction>));
        assert_eq!(registry.list_dense(), vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn builtin_bm25_config_round_trips() {
        let registry = Registry::with_builtins();
        let ef = registry.build_sparse("bm25", &EfConfig::new()).unwrap();
        let config = ef.get_config();
        let rebuilt = registry.build_sparse("bm25", &config).unwrap();
        assert_eq!(rebuilt.get_config(), config);
    }

    #[test]
    fn builtin_bm25_config_round_trips_with_avg_doc_len_override() {
        let registry = Registry::with_builtins();
        let ef = registry.build_sparse("bm25", &EfConfig::new()).unwrap();
        let mut config = ef.get_config();
        config.insert("avg_doc_len".to_string(), serde_json::json!(42.0));
        config.insert("token_max_length".to_string(), serde_json::json!(8));
        let rebuilt = registry.build_sparse("bm25", &config).unwrap();
        assert_eq!(rebuilt.get_config(), config);
    }

    #[test]
    fn builtins_register_mock() {
        let registry = Registry::with_builtins();
        assert!(registry.has_dense("mock"));
        let ef = registry.build_dense("mock", &EfConfig::new()).unwrap();
        let config = ef.get_config();
        let rebuilt = registry.build_dense("mock", &config).unwrap();
        assert_eq!(rebuilt.get_config(), config);
    }
}

//! `NoopEmbeddingFunction` / `MockEmbeddingFunction` — deterministic stand-ins
//! for tests, the embedding-function analogue of `NoopProvider` (a provider
//! that panics instead of making network calls).

use crate::config::{read_api_key_from_env, set_api_key_env_var};
use crate::contract::{EmbeddingFunction, SparseEmbeddingFunction};
use crate::error::EfError;
use chroma_types::{DistanceMetric, Embedding, SparseVector};
use std::collections::BTreeMap;

/// A dense embedding function that always panics — use it to prove a code
/// path never actually needs to embed anything.
#[derive(Debug, Clone, Default)]
pub struct NoopEmbeddingFunction;

impl EmbeddingFunction for NoopEmbeddingFunction {
    fn name(&self) -> &str {
        "noop"
    }

    fn embed_documents(&self, _documents: &[String]) -> Result<Vec<Embedding>, EfError> {
        panic!("NoopEmbeddingFunction::embed_documents was called; wire up a real embedding function")
    }

    fn get_config(&self) -> BTreeMap<String, serde_json::Value> {
        BTreeMap::new()
    }
}

/// A dense embedding function returning a fixed, deterministic vector per
/// document — useful in tests that need a stable embedding without a real
/// inference call.
#[derive(Debug, Clone)]
pub struct MockEmbeddingFunction {
    dimension: usize,
}

impl MockEmbeddingFunction {
    /// Build a mock producing `dimension`-length vectors.
    pub fn new(dimension: usize) -> Self {
        MockEmbeddingFunction { dimension }
    }

    fn embed_one(&self, text: &str) -> Embedding {
        let seed = text.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        let values: Vec<f32> = (0..self.dimension)
            .map(|i| ((seed.wrapping_add(i as u32) % 1000) as f32) / 1000.0)
            .collect();
        Embedding::f32(values)
    }
}

impl EmbeddingFunction for MockEmbeddingFunction {
    fn name(&self) -> &str {
        "mock"
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    fn embed_documents(&self, documents: &[String]) -> Result<Vec<Embedding>, EfError> {
        Ok(documents.iter().map(|d| self.embed_one(d)).collect())
    }

    fn get_config(&self) -> BTreeMap<String, serde_json::Value> {
        let mut config = BTreeMap::new();
        config.insert("dimension".to_string(), serde_json::json!(self.dimension));
        config
    }
}

/// A dense embedding function standing in for a credential-backed hosted
/// provider, used to prove the "auto-wire persistence" property:
/// `get_config` never carries the raw key, only the name of the
/// environment variable supplying it, and the key is re-read from the
/// environment at call time rather than captured at construction.
#[derive(Debug, Clone)]
pub struct CredentialedEmbeddingFunction {
    dimension: usize,
    env_var_name: String,
}

impl CredentialedEmbeddingFunction {
    /// Build a credentialed embedding function reading its key from
    /// `env_var_name` at every call.
    pub fn new(dimension: usize, env_var_name: impl Into<String>) -> Self {
        CredentialedEmbeddingFunction { dimension, env_var_name: env_var_name.into() }
    }

    fn embed_one(&self, text: &str, key: &str) -> Embedding {
        let seed = key
            .bytes()
            .chain(text.bytes())
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        let values: Vec<f32> =
            (0..self.dimension).map(|i| ((seed.wrapping_add(i as u32) % 1000) as f32) / 1000.0).collect();
        Embedding::f32(values)
    }
}

impl EmbeddingFunction for CredentialedEmbeddingFunction {
    fn name(&self) -> &str {
        "credentialed-mock"
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    fn embed_documents(&self, documents: &[String]) -> Result<Vec<Embedding>, EfError> {
        let config = self.get_config();
        let key = read_api_key_from_env(&config).ok_or_else(|| {
            EfError::ComputationFailed {
                name: self.name().to_string(),
                message: format!("environment variable \"{}\" is not set", self.env_var_name),
            }
        })?;
        Ok(documents.iter().map(|d| self.embed_one(d, &key)).collect())
    }

    fn get_config(&self) -> BTreeMap<String, serde_json::Value> {
        let mut config = BTreeMap::new();
        config.insert("dimension".to_string(), serde_json::json!(self.dimension));
        set_api_key_env_var(&mut config, &self.env_var_name);
        config
    }

    fn default_space(&self) -> DistanceMetric {
        DistanceMetric::Cosine
    }

    fn supported_spaces(&self) -> Vec<DistanceMetric> {
        vec![DistanceMetric::Cosine]
    }
}

/// A sparse embedding function that always panics, mirroring
/// [`NoopEmbeddingFunction`] for the sparse contract.
#[derive(Debug, Clone, Default)]
pub struct NoopSparseEmbeddingFunction;

impl SparseEmbeddingFunction for NoopSparseEmbeddingFunction {
    fn name(&self) -> &str {
        "noop-sparse"
    }

    fn embed_documents(&self, _documents: &[String]) -> Result<Vec<SparseVector>, EfError> {
        panic!("NoopSparseEmbeddingFunction::embed_documents was called; wire up a real embedding function")
    }

    fn get_config(&self) -> BTreeMap<String, serde_json::Value> {
        BTreeMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_is_deterministic_across_calls() {
        let ef = MockEmbeddingFunction::new(4);
        let a = ef.embed_documents(&["hello".to_string()]).unwrap();
        let b = ef.embed_documents(&["hello".to_string()]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic]
    fn noop_panics_on_use() {
        let ef = NoopEmbeddingFunction;
        let _ = ef.embed_documents(&["x".to_string()]);
    }

    #[test]
    fn credentialed_config_never_carries_the_raw_key() {
        let ef = CredentialedEmbeddingFunction::new(4, "MY_KEY");
        let config = ef.get_config();
        let serialized = serde_json::to_string(&config).unwrap();
        assert!(serialized.contains("MY_KEY"));
        assert_eq!(config.get("api_key_env_var").unwrap(), "MY_KEY");
    }

    #[test]
    fn credentialed_auto_wire_round_trips_custom_env_var_name() {
        // SAFETY: test-only env var, not read by any other test concurrently.
        unsafe {
            std::env::set_var("CHROMA_TEST_CREDENTIALED_KEY", "secret-value");
        }
        let ef = CredentialedEmbeddingFunction::new(3, "CHROMA_TEST_CREDENTIALED_KEY");
        let config = ef.get_config();

        let registry = crate::registry::Registry::with_builtins();
        let rebuilt = registry.build_dense("credentialed-mock", &config).unwrap();
        assert_eq!(rebuilt.name(), ef.name());
        assert_eq!(rebuilt.get_config().get("api_key_env_var"), config.get("api_key_env_var"));

        let embedded = rebuilt.embed_documents(&["hello".to_string()]).unwrap();
        assert_eq!(embedded[0].len(), 3);

        // SAFETY: cleaning up the test-only env var.
        unsafe {
            std::env::remove_var("CHROMA_TEST_CREDENTIALED_KEY");
        }
    }
}

//! The embedding function contract.
//!
//! An [`EmbeddingFunction`] turns documents/queries into dense
//! [`Embedding`]s; a [`SparseEmbeddingFunction`] turns them into
//! [`SparseVector`]s. Both expose `get_config`, returning the arguments
//! needed to rebuild an equivalent instance later — the "auto-wire
//! persistence" property: a collection stores this config and
//! reconstructs the embedding function from the registry on open, without
//! the caller re-supplying it. `get_config` must never embed a raw
//! credential, only the *name* of an environment variable that supplies
//! one (see `config::api_key_env_var`).

use crate::error::EfError;
use chroma_types::{DistanceMetric, Embedding, SparseVector};
use std::collections::BTreeMap;

/// A dense embedding function.
pub trait EmbeddingFunction: Send + Sync {
    /// The name this function is registered under.
    fn name(&self) -> &str;

    /// The fixed output dimension, if known ahead of computing an embedding.
    fn dimension(&self) -> Option<usize> {
        None
    }

    /// Embed a batch of documents.
    fn embed_documents(&self, documents: &[String]) -> Result<Vec<Embedding>, EfError>;

    /// Embed a single query. Defaults to `embed_documents` over a
    /// single-element batch.
    fn embed_query(&self, query: &str) -> Result<Embedding, EfError> {
        let mut out = self.embed_documents(std::slice::from_ref(&query.to_string()))?;
        Ok(out
            .pop()
            .expect("embed_documents must return exactly one embedding per input document"))
    }

    /// The configuration needed to rebuild an equivalent instance via the
    /// registry (auto-wire persistence). Never contains a raw secret.
    fn get_config(&self) -> BTreeMap<String, serde_json::Value>;

    /// The distance metric a collection should use when none is specified
    /// at creation time.
    fn default_space(&self) -> DistanceMetric {
        DistanceMetric::L2
    }

    /// The distance metrics this function's embeddings are meaningful
    /// under. A collection created against a space outside this list is a
    /// `FailedPrecondition`.
    fn supported_spaces(&self) -> Vec<DistanceMetric> {
        vec![DistanceMetric::L2, DistanceMetric::Ip, DistanceMetric::Cosine]
    }
}

/// A sparse embedding function (e.g. BM25).
pub trait SparseEmbeddingFunction: Send + Sync {
    /// The name this function is registered under.
    fn name(&self) -> &str;

    /// Embed a batch of documents.
    fn embed_documents(&self, documents: &[String]) -> Result<Vec<SparseVector>, EfError>;

    /// Embed a single query.
    fn embed_query(&self, query: &str) -> Result<SparseVector, EfError> {
        let mut out = self.embed_documents(std::slice::from_ref(&query.to_string()))?;
        Ok(out
            .pop()
            .expect("embed_documents must return exactly one vector per input document"))
    }

    /// The configuration needed to rebuild an equivalent instance via the
    /// registry. Never contains a raw secret.
    fn get_config(&self) -> BTreeMap<String, serde_json::Value>;
}

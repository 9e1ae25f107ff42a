//! A Rust client for ChromaDB.
//!
//! This crate is a thin facade over three workspace crates:
//!
//! - [`chroma_types`] — the metadata value model, the filter DSL, the rank
//!   algebra, and dense/sparse embedding types. Pure, no I/O.
//! - [`chroma_ef`] — the embedding function contract, the registry, and
//!   the built-in BM25 sparse implementation.
//! - [`chroma_client`] — the HTTP client: collections, search, reranking,
//!   auth, and retry.
//!
//! Re-exports follow the root-crate pattern of the workspace's `strata`
//! crate: flat `pub use` of the common surface, plus a curated
//! [`prelude`] for the common `use chromadb::prelude::*;` import.

#![warn(missing_docs)]

pub mod prelude;

pub use chroma_client::{
    compose_reranked, redacted_url, rerank_search_result, search, AuthProvider, BasicAuth, BearerAuth, ChainedAuth,
    ChromaClient, ChromaClientBuilder, CloudApiKeyAuth, Collection, CollectionEntries, CustomHeaderAuth, Error,
    GetOptions, GetResult, Idempotency, IncludeFields, Match, NoAuth, QueryOptions, Record, RerankedIndex, Reranker,
    Result, RetryPolicy, SearchResult, TokenHeader, DEFAULT_DATABASE, DEFAULT_TENANT,
};
pub use chroma_ef::{
    Bm25EmbeddingFunction, CredentialedEmbeddingFunction, EfConfig, EmbeddingFunction, MockEmbeddingFunction,
    NoopEmbeddingFunction, NoopSparseEmbeddingFunction, Registry, SparseEmbeddingFunction,
};
pub use chroma_types::{
    DistanceMetric, Embedding, EmbeddingError, KnnRank, Metadata, MetadataError, MetadataValue, Op, Operand,
    RankExpression, Scalar, SparseVector, ValidationError, WhereClause, MAX_DEPTH,
};

//! The embedding function contract, registry, and built-in implementations:
//! BM25 sparse scoring and `noop`/`mock` test doubles.

#![warn(missing_docs)]

pub mod bm25;
pub mod config;
pub mod contract;
pub mod error;
pub mod noop;
pub mod registry;

pub use bm25::Bm25EmbeddingFunction;
pub use contract::{EmbeddingFunction, SparseEmbeddingFunction};
pub use error::EfError;
pub use noop::{
    CredentialedEmbeddingFunction, MockEmbeddingFunction, NoopEmbeddingFunction, NoopSparseEmbeddingFunction,
};
pub use registry::{EfConfig, Registry};

//! Pure value types and DSLs shared by the Chroma client: the metadata
//! attribute model, the filter tree, the rank algebra, and dense/sparse
//! embedding values.
//!
//! This crate does no I/O and depends on no async runtime — it is safe to
//! use from both sync and async callers, and from `chroma-ef`'s embedding
//! function implementations without pulling in `reqwest` or `tokio`.

#![warn(missing_docs)]

pub mod embedding;
pub mod error;
pub mod filter;
pub mod metadata;
pub mod rank;

pub use embedding::{DistanceMetric, Embedding, SparseVector};
pub use error::{EmbeddingError, MetadataError, ValidationError};
pub use filter::{Op, Operand, Scalar, WhereClause};
pub use metadata::{Metadata, MetadataValue};
pub use rank::{KnnRank, RankExpression, MAX_DEPTH};

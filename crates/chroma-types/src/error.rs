//! Construction-time and validation errors for the pure value/DSL types.
//!
//! These are intentionally transport-free: this crate never talks to a
//! server, so its errors never carry an HTTP status code or a URL. The
//! HTTP-facing `chroma-client` crate wraps these into its richer `Error`
//! enum (see `chroma_client::error`).

use thiserror::Error;

/// Violations raised by [`crate::metadata::Metadata`] construction and
/// deserialization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetadataError {
    /// A JSON array mixed more than one scalar kind.
    #[error("metadata array for key \"{key}\" is not homogeneous")]
    MixedArray {
        /// The offending key.
        key: String,
    },
    /// A JSON value of a kind metadata cannot represent (null, object, …).
    #[error("metadata value for key \"{key}\" has an unsupported JSON type")]
    UnsupportedValue {
        /// The offending key.
        key: String,
    },
}

/// Violations raised by [`crate::embedding::SparseVector`] construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmbeddingError {
    /// `indices` and `values` have different lengths.
    #[error(
        "sparse vector indices and values must have equal length, got {indices} indices and {values} values"
    )]
    LengthMismatch {
        /// Number of indices supplied.
        indices: usize,
        /// Number of values supplied.
        values: usize,
    },
    /// An index was negative.
    #[error("sparse vector index {0} is negative")]
    NegativeIndex(i64),
    /// Two entries shared the same index.
    #[error("sparse vector contains duplicate index {0}")]
    DuplicateIndex(i32),
    /// A value was NaN or infinite.
    #[error("sparse vector value at index {index} is not finite: {value}")]
    NonFiniteValue {
        /// The index whose value is non-finite.
        index: i32,
        /// The offending value.
        value: f32,
    },
}

/// Violations raised by lazy validation of [`crate::filter::WhereClause`]
/// and [`crate::rank::RankExpression`] trees.
///
/// Construction of these trees always succeeds; a `ValidationError` only
/// surfaces from an explicit `validate()` call or from marshaling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Empty operand list for `$in`.
    #[error("invalid operand for $in on key \"{key}\", expected at least one value")]
    EmptyIn {
        /// The key the comparator was built on.
        key: String,
    },
    /// Empty operand list for `$nin`.
    #[error("invalid operand for $nin on key \"{key}\", expected at least one value")]
    EmptyNin {
        /// The key the comparator was built on.
        key: String,
    },
    /// Empty string operand for `$contains`.
    #[error("invalid operand for $contains on key \"{key}\", expected non-empty string")]
    EmptyContains {
        /// The key the comparator was built on.
        key: String,
    },
    /// Empty string operand for `$not_contains`.
    #[error("invalid operand for $not_contains on key \"{key}\", expected non-empty string")]
    EmptyNotContains {
        /// The key the comparator was built on.
        key: String,
    },
    /// A reserved key (`#id`, `#document`) was used with a disallowed op.
    #[error("reserved key \"{key}\" may only be used with {allowed}")]
    ReservedKeyMisuse {
        /// The reserved key.
        key: String,
        /// Description of the operators this key may be used with.
        allowed: &'static str,
    },
    /// An `And`/`Or` node had zero children.
    #[error("logical node requires at least one child")]
    EmptyLogical,
    /// An `Rrf` node had zero children.
    #[error("rrf requires at least one child ranking")]
    EmptyRrf,
    /// The rank tree exceeded the maximum permitted depth.
    #[error("rank expression exceeds maximum depth of {max}")]
    MaxDepthExceeded {
        /// The configured maximum depth.
        max: usize,
    },
    /// `KnnRank::k` was zero.
    #[error("knn rank requires k >= 1, got {k}")]
    InvalidK {
        /// The offending `k`.
        k: u32,
    },
    /// A `Knn` leaf specified neither query texts nor query embeddings and
    /// is not eligible to inherit queries from a sibling.
    #[error("knn rank must specify exactly one of query_texts or query_embeddings")]
    AmbiguousKnnInput,
    /// A `Knn` leaf specified both query texts and query embeddings.
    #[error("knn rank must specify exactly one of query_texts or query_embeddings, not both")]
    ConflictingKnnInput,
    /// A `Val` constant was NaN or infinite.
    #[error("constant value must be finite, got {value}")]
    NonFiniteConstant {
        /// The offending value.
        value: f64,
    },
}

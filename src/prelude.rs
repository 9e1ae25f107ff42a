//! The common import: `use chromadb::prelude::*;`.

pub use crate::{
    Bm25EmbeddingFunction, ChromaClient, ChromaClientBuilder, Collection, CollectionEntries, DistanceMetric,
    Embedding, EmbeddingFunction, Error, GetOptions, Metadata, MetadataValue, MockEmbeddingFunction, QueryOptions,
    RankExpression, Registry, Result, SparseEmbeddingFunction, SparseVector, WhereClause,
};

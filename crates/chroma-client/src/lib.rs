//! The HTTP-facing half of the Chroma client: connection/tenant/database/
//! collection management, the search dispatcher, reranker composition,
//! and auth/retry middleware.

#![warn(missing_docs)]

pub mod auth;
pub mod client;
pub mod collection;
pub mod dispatch;
pub mod error;
pub mod rerank;
pub mod retry;
pub mod transport;
pub mod wire;

pub use auth::{
    AuthProvider, BasicAuth, BearerAuth, ChainedAuth, CloudApiKeyAuth, CustomHeaderAuth, NoAuth, TokenHeader,
};
pub use client::{ChromaClient, ChromaClientBuilder, DEFAULT_DATABASE, DEFAULT_TENANT};
pub use collection::{Collection, CollectionEntries, GetOptions, GetResult, IncludeFields, QueryOptions, Record};
pub use dispatch::{search, Match, SearchResult};
pub use error::{redacted_url, Error, Result};
pub use rerank::{compose_reranked, rerank_search_result, RerankedIndex, Reranker};
pub use retry::{Idempotency, RetryPolicy};

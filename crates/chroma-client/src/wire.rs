//! Wire DTOs matching the server's JSON request/response shapes.
//!
//! These are request/response bodies only — the typed domain objects
//! (`WhereClause`, `RankExpression`, `Metadata`, `Embedding`) live in
//! `chroma_types` and are marshaled into these shapes at the last moment,
//! in `collection.rs`/`dispatch.rs`.

use chroma_types::Metadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `GET /api/v2/heartbeat` response.
#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatResponse {
    /// Server-side nanosecond timestamp.
    #[serde(rename = "nanosecond heartbeat")]
    pub nanosecond_heartbeat: u64,
}

/// `GET /api/v2/pre-flight-checks` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreFlightChecks {
    /// Maximum number of records a single add/upsert/update batch may
    /// contain, if the server enforces one.
    pub max_batch_size: Option<usize>,
}

/// `POST .../collections` request body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCollectionRequest {
    /// Collection name.
    pub name: String,
    /// Collection-level metadata (embedding function config lives here
    /// under reserved keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// If true, return the existing collection instead of erroring when
    /// `name` is already taken.
    pub get_or_create: bool,
}

/// A collection as the server represents it.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionResponse {
    /// Server-assigned collection id.
    pub id: String,
    /// Collection name.
    pub name: String,
    /// Collection-level metadata.
    #[serde(default)]
    pub metadata: Option<Metadata>,
    /// Dense vector dimensionality, once known (absent before the first
    /// insert on some server versions).
    #[serde(default)]
    pub dimension: Option<u32>,
    /// Owning tenant.
    #[serde(default)]
    pub tenant: Option<String>,
    /// Owning database.
    #[serde(default)]
    pub database: Option<String>,
}

/// `POST .../collections/{id}/add` and `/upsert` request body.
#[derive(Debug, Clone, Serialize, Default)]
pub struct WriteBatchRequest {
    /// Record ids.
    pub ids: Vec<String>,
    /// Dense embeddings, parallel to `ids`, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<serde_json::Value>>,
    /// Per-record metadata, parallel to `ids`, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadatas: Option<Vec<Option<Metadata>>>,
    /// Per-record documents, parallel to `ids`, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Option<String>>>,
}

/// `POST .../collections/{id}/update` request body — like a write batch,
/// but every field is independently optional per-record (`None` entries
/// mean "leave unchanged").
#[derive(Debug, Clone, Serialize, Default)]
pub struct UpdateBatchRequest {
    /// Record ids to update.
    pub ids: Vec<String>,
    /// Replacement embeddings; a `None` slot leaves that record's
    /// embedding unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<Option<serde_json::Value>>>,
    /// Replacement metadata; a `None` slot leaves that record's metadata
    /// unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadatas: Option<Vec<Option<Metadata>>>,
    /// Replacement documents; a `None` slot leaves that record's document
    /// unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Option<String>>>,
}

/// `POST .../collections/{id}/delete` request body.
#[derive(Debug, Clone, Serialize, Default)]
pub struct DeleteRequest {
    /// Ids to delete. Empty when deleting by filter alone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    /// Metadata/document filter tree, pre-marshaled.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "where")]
    pub filter: Option<serde_json::Value>,
}

/// `POST .../collections/{id}/get` request body.
#[derive(Debug, Clone, Serialize, Default)]
pub struct GetRequest {
    /// Restrict to these ids, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    /// Metadata/document filter tree, pre-marshaled.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "where")]
    pub filter: Option<serde_json::Value>,
    /// Maximum number of records to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Number of records to skip before `limit` is applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    /// Which fields to populate in the response.
    pub include: Vec<String>,
}

/// `GET .../collections/{id}/get` response — parallel arrays, one entry
/// per matched record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetResponse {
    /// Matched record ids.
    pub ids: Vec<String>,
    /// Matched documents, when requested.
    #[serde(default)]
    pub documents: Option<Vec<Option<String>>>,
    /// Matched metadata, when requested.
    #[serde(default)]
    pub metadatas: Option<Vec<Option<Metadata>>>,
    /// Matched embeddings, when requested.
    #[serde(default)]
    pub embeddings: Option<Vec<Option<serde_json::Value>>>,
}

/// `POST .../collections/{id}/search` request body — the unified k-NN and
/// rank-algebra search surface.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    /// The rank expression tree, pre-marshaled.
    pub rank: serde_json::Value,
    /// Metadata/document filter tree, pre-marshaled.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "where")]
    pub filter: Option<serde_json::Value>,
    /// Number of results per logical query.
    pub limit: usize,
    /// Offset into each query's results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    /// Which fields to populate in the response.
    pub include: Vec<String>,
}

/// `POST .../collections/{id}/search` response.
///
/// Results come back as **flat** arrays plus `group_sizes`, the number of
/// results belonging to each logical query in request order — the client
/// (`dispatch.rs`) regroups these into per-query slices rather than the
/// server doing it, keeping the wire format simple regardless of how many
/// queries were batched into one request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    /// How many of the flat entries below belong to each query, in order.
    pub group_sizes: Vec<usize>,
    /// Flat record ids across all queries.
    pub ids: Vec<String>,
    /// Flat rank scores across all queries, parallel to `ids`.
    pub scores: Vec<f32>,
    /// Flat documents across all queries, when requested.
    #[serde(default)]
    pub documents: Option<Vec<Option<String>>>,
    /// Flat metadata across all queries, when requested.
    #[serde(default)]
    pub metadatas: Option<Vec<Option<Metadata>>>,
    /// Flat embeddings across all queries, when requested.
    #[serde(default)]
    pub embeddings: Option<Vec<Option<serde_json::Value>>>,
}

/// `POST /api/v2/tenants` request body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTenantRequest {
    /// Tenant name.
    pub name: String,
}

/// `POST .../databases` request body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDatabaseRequest {
    /// Database name.
    pub name: String,
}

/// `GET /api/v2/tenants/{name}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantResponse {
    /// Tenant name.
    pub name: String,
}

/// A database as the server represents it.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseResponse {
    /// Database id.
    pub id: String,
    /// Database name.
    pub name: String,
    /// Owning tenant.
    pub tenant: String,
}

/// Generic `{"error": "...", "message": "..."}` error body chroma servers
/// return alongside a non-2xx status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// The server's short error code/kind, when present.
    #[serde(default)]
    pub error: Option<String>,
    /// The server's human-readable message, when present.
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Collapse this body into a single display string for `Error`.
    pub fn into_message(self, fallback: &str) -> String {
        self.message.or(self.error).unwrap_or_else(|| fallback.to_string())
    }
}

/// The reserved metadata keys a collection's metadata uses to persist an
/// embedding function's name and config, enabling "auto-wire persistence":
/// `GetOrCreateCollection` reconstructs the embedding function from the
/// registry using these two keys without the caller re-supplying it.
pub const EF_NAME_KEY: &str = "chroma:embedding_function_name";
/// See [`EF_NAME_KEY`].
pub const EF_CONFIG_KEY: &str = "chroma:embedding_function_config";
/// See [`EF_NAME_KEY`]; sparse embedding function name.
pub const SPARSE_EF_NAME_KEY: &str = "chroma:sparse_embedding_function_name";
/// See [`EF_NAME_KEY`]; sparse embedding function config.
pub const SPARSE_EF_CONFIG_KEY: &str = "chroma:sparse_embedding_function_config";
/// The reserved metadata key a collection's preferred [`chroma_types::DistanceMetric`]
/// is persisted under (`hnsw:space` in the real server's vocabulary).
pub const HNSW_SPACE_KEY: &str = "hnsw:space";

/// Flatten an embedding-function config map to the JSON value stored
/// under [`EF_CONFIG_KEY`].
pub fn ef_config_to_json(config: &BTreeMap<String, serde_json::Value>) -> serde_json::Value {
    serde_json::to_value(config).expect("a BTreeMap<String, Value> always serializes")
}

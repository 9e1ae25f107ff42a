//! Per-collection record operations: add/upsert/update/get/delete,
//! `count`, `peek`, plus typed `GetOptions`/`QueryOptions`.
//!
//! Batch validation (`validate_write_batch`) is grounded on
//! `other_examples/117718dc_Anush008-chromadb-rs__src-async-collection.rs.rs`'s
//! free `validate()` function: embeddings-or-documents required, an
//! embedding function required when documents are present and embeddings
//! are absent, no empty ids, no length mismatches across the parallel
//! arrays, no duplicate ids within one batch. Unlike that reference client,
//! an embedding function here is a property of the collection, not a
//! per-call argument, so supplying embeddings directly alongside a
//! configured embedding function is not an error — the embeddings just win.

use crate::client::ChromaClient;
use crate::error::{Error, Result};
use crate::wire::{
    CollectionResponse, DeleteRequest, GetRequest, GetResponse, UpdateBatchRequest, WriteBatchRequest, EF_CONFIG_KEY,
    EF_NAME_KEY, SPARSE_EF_CONFIG_KEY, SPARSE_EF_NAME_KEY,
};
use chroma_ef::{EfConfig, EmbeddingFunction, SparseEmbeddingFunction};
use chroma_types::{Embedding, Metadata, WhereClause};
use reqwest::Method;
use std::collections::HashSet;
use std::sync::Arc;

/// One collection's worth of entries to add/upsert/update, each array
/// parallel to `ids` (documents/embeddings/metadatas may be omitted, not
/// partially `None`-padded — use `UpdateOptions` for per-record sparse
/// updates).
#[derive(Debug, Clone, Default)]
pub struct CollectionEntries {
    /// Record ids. Never empty strings, never duplicated within a batch.
    pub ids: Vec<String>,
    /// Dense embeddings, parallel to `ids`.
    pub embeddings: Option<Vec<Embedding>>,
    /// Per-record metadata, parallel to `ids`.
    pub metadatas: Option<Vec<Metadata>>,
    /// Per-record documents, parallel to `ids`.
    pub documents: Option<Vec<String>>,
}

fn validate_write_batch(entries: &CollectionEntries, has_embedding_function: bool) -> Result<()> {
    if entries.ids.is_empty() {
        return Err(Error::InvalidArgument("a write batch must contain at least one id".to_string()));
    }
    if entries.ids.iter().any(|id| id.is_empty()) {
        return Err(Error::InvalidArgument("record ids must not be empty strings".to_string()));
    }
    let mut seen = HashSet::with_capacity(entries.ids.len());
    for id in &entries.ids {
        if !seen.insert(id.as_str()) {
            return Err(Error::InvalidArgument(format!("duplicate id \"{id}\" in batch")));
        }
    }

    let n = entries.ids.len();
    if let Some(embeddings) = &entries.embeddings {
        if embeddings.len() != n {
            return Err(Error::InvalidArgument(format!(
                "expected {n} embeddings to match {n} ids, got {}",
                embeddings.len()
            )));
        }
    }
    if let Some(metadatas) = &entries.metadatas {
        if metadatas.len() != n {
            return Err(Error::InvalidArgument(format!(
                "expected {n} metadatas to match {n} ids, got {}",
                metadatas.len()
            )));
        }
    }
    if let Some(documents) = &entries.documents {
        if documents.len() != n {
            return Err(Error::InvalidArgument(format!(
                "expected {n} documents to match {n} ids, got {}",
                documents.len()
            )));
        }
    }

    match (&entries.embeddings, &entries.documents) {
        (None, None) => {
            return Err(Error::InvalidArgument(
                "a write batch needs at least one of embeddings or documents".to_string(),
            ))
        }
        (None, Some(_)) if !has_embedding_function => {
            return Err(Error::InvalidArgument(
                "documents were supplied without embeddings, but this collection has no embedding function"
                    .to_string(),
            ))
        }
        _ => {}
    }
    Ok(())
}

/// A handle to a single collection, bound to the client it was fetched
/// from.
#[derive(Clone)]
pub struct Collection {
    client: ChromaClient,
    id: String,
    name: String,
    metadata: Metadata,
    dense_ef: Option<Arc<dyn EmbeddingFunction>>,
    sparse_ef: Option<Arc<dyn SparseEmbeddingFunction>>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("id", &self.id).field("name", &self.name).finish()
    }
}

impl Collection {
    pub(crate) fn from_response(client: ChromaClient, response: CollectionResponse) -> Self {
        let metadata = response.metadata.unwrap_or_default();
        let dense_ef = rebuild_dense_ef(&client, &metadata);
        let sparse_ef = rebuild_sparse_ef(&client, &metadata);
        Collection { client, id: response.id, name: response.name, metadata, dense_ef, sparse_ef }
    }

    /// The server-assigned collection id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The collection's metadata, including the reserved embedding
    /// function keys.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Whether this collection has a dense embedding function wired up,
    /// i.e. whether `add`/`upsert` calls that supply documents without
    /// embeddings can succeed.
    pub fn is_embedding_capable(&self) -> bool {
        self.dense_ef.is_some()
    }

    /// The dense embedding function reconstructed from this collection's
    /// metadata, if one was persisted at creation time.
    pub fn dense_embedding_function(&self) -> Option<&Arc<dyn EmbeddingFunction>> {
        self.dense_ef.as_ref()
    }

    /// The sparse embedding function reconstructed from this collection's
    /// metadata, if one was persisted at creation time.
    pub fn sparse_embedding_function(&self) -> Option<&Arc<dyn SparseEmbeddingFunction>> {
        self.sparse_ef.as_ref()
    }

    async fn resolve_embeddings(&self, entries: &CollectionEntries) -> Result<Option<Vec<Embedding>>> {
        if let Some(embeddings) = &entries.embeddings {
            return Ok(Some(embeddings.clone()));
        }
        let Some(documents) = &entries.documents else {
            return Ok(None);
        };
        let Some(ef) = &self.dense_ef else {
            return Ok(None);
        };
        let ef = ef.clone();
        let documents = documents.clone();
        let embeddings = tokio::task::spawn_blocking(move || ef.embed_documents(&documents))
            .await
            .map_err(|e| Error::InvalidArgument(format!("embedding computation panicked: {e}")))??;
        Ok(Some(embeddings))
    }

    /// Insert new records. Fails deterministically if any id already
    /// exists.
    pub async fn add(&self, entries: CollectionEntries) -> Result<()> {
        validate_write_batch(&entries, self.is_embedding_capable())?;
        let embeddings = self.resolve_embeddings(&entries).await?;
        let body = WriteBatchRequest {
            ids: entries.ids,
            embeddings: embeddings.map(|es| es.iter().map(embedding_to_value).collect()),
            metadatas: entries.metadatas.map(|ms| ms.into_iter().map(Some).collect()),
            documents: entries.documents.map(|ds| ds.into_iter().map(Some).collect()),
        };
        let url = self.client.collection_url(&self.id, "/add")?;
        self.client.transport().send_json(Method::POST, url, Some(&body), crate::retry::Idempotency::Unsafe).await
    }

    /// Insert new records or overwrite existing ones with the same id.
    pub async fn upsert(&self, entries: CollectionEntries) -> Result<()> {
        validate_write_batch(&entries, self.is_embedding_capable())?;
        let embeddings = self.resolve_embeddings(&entries).await?;
        let body = WriteBatchRequest {
            ids: entries.ids,
            embeddings: embeddings.map(|es| es.iter().map(embedding_to_value).collect()),
            metadatas: entries.metadatas.map(|ms| ms.into_iter().map(Some).collect()),
            documents: entries.documents.map(|ds| ds.into_iter().map(Some).collect()),
        };
        let url = self.client.collection_url(&self.id, "/upsert")?;
        self.client
            .transport()
            .send_json(Method::POST, url, Some(&body), crate::retry::Idempotency::IdempotentByConstruction)
            .await
    }

    /// Update existing records in place. Fields omitted on a given update
    /// entry are left unchanged server-side.
    pub async fn update(&self, entries: CollectionEntries) -> Result<()> {
        if entries.ids.iter().any(|id| id.is_empty()) {
            return Err(Error::InvalidArgument("record ids must not be empty strings".to_string()));
        }
        let embeddings = self.resolve_embeddings(&entries).await?;
        let body = UpdateBatchRequest {
            ids: entries.ids,
            embeddings: embeddings.map(|es| es.iter().map(|e| Some(embedding_to_value(e))).collect()),
            metadatas: entries.metadatas.map(|ms| ms.into_iter().map(Some).collect()),
            documents: entries.documents.map(|ds| ds.into_iter().map(Some).collect()),
        };
        let url = self.client.collection_url(&self.id, "/update")?;
        self.client
            .transport()
            .send_json(Method::POST, url, Some(&body), crate::retry::Idempotency::IdempotentByConstruction)
            .await
    }

    /// Delete records by id and/or by filter. At least one of `ids`/
    /// `filter` must narrow the deletion — an empty `GetOptions`-style
    /// "delete everything" call is not exposed.
    pub async fn delete(&self, ids: Option<Vec<String>>, filter: Option<WhereClause>) -> Result<()> {
        let filter = filter.map(|f| f.to_wire_json()).transpose()?;
        let body = DeleteRequest { ids, filter };
        let url = self.client.collection_url(&self.id, "/delete")?;
        self.client
            .transport()
            .send_json(Method::POST, url, Some(&body), crate::retry::Idempotency::IdempotentByConstruction)
            .await
    }

    /// Fetch records by id/filter/pagination, with typed options instead
    /// of positional arguments.
    pub async fn get(&self, options: GetOptions) -> Result<GetResult> {
        let filter = options.filter.map(|f| f.to_wire_json()).transpose()?;
        let body = GetRequest {
            ids: options.ids,
            filter,
            limit: options.limit,
            offset: options.offset,
            include: options.include.wire_fields(),
        };
        let url = self.client.collection_url(&self.id, "/get")?;
        let response: GetResponse =
            self.client.transport().send_json(Method::POST, url, Some(&body), crate::retry::Idempotency::Safe).await?;
        Ok(GetResult::from_wire(response))
    }

    /// The first `limit` records in the collection, in server-defined
    /// order — `get` with no ids and no filter.
    pub async fn peek(&self, limit: usize) -> Result<GetResult> {
        self.get(GetOptions::new().limit(limit)).await
    }

    /// Number of records in the collection.
    pub async fn count(&self) -> Result<usize> {
        let url = self.client.collection_url(&self.id, "/count")?;
        self.client.transport().send_json::<(), _>(Method::GET, url, None, crate::retry::Idempotency::Safe).await
    }

    pub(crate) fn client_url(&self, suffix: &str) -> Result<url::Url> {
        self.client.collection_url(&self.id, suffix)
    }

    pub(crate) fn client_transport(&self) -> &crate::transport::Transport {
        self.client.transport()
    }

    /// Replace this collection's stored metadata (server-side PUT).
    pub async fn modify(&mut self, new_name: Option<String>, new_metadata: Option<Metadata>) -> Result<()> {
        #[derive(serde::Serialize)]
        struct ModifyRequest {
            #[serde(skip_serializing_if = "Option::is_none")]
            new_name: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            new_metadata: Option<Metadata>,
        }
        let body = ModifyRequest { new_name: new_name.clone(), new_metadata: new_metadata.clone() };
        let url = self.client.collection_url(&self.id, "")?;
        self.client
            .transport()
            .send_json::<_, ()>(Method::PUT, url, Some(&body), crate::retry::Idempotency::IdempotentByConstruction)
            .await?;
        if let Some(name) = new_name {
            self.name = name;
        }
        if let Some(metadata) = new_metadata {
            self.metadata = metadata;
        }
        Ok(())
    }
}

fn embedding_to_value(embedding: &Embedding) -> serde_json::Value {
    serde_json::to_value(embedding).expect("Embedding always serializes to a JSON array")
}

fn rebuild_dense_ef(client: &ChromaClient, metadata: &Metadata) -> Option<Arc<dyn EmbeddingFunction>> {
    let name = match metadata.get(EF_NAME_KEY)? {
        chroma_types::MetadataValue::Str(s) => s.to_string(),
        _ => return None,
    };
    let config: EfConfig = match metadata.get(EF_CONFIG_KEY) {
        Some(chroma_types::MetadataValue::Str(s)) => serde_json::from_str(s).unwrap_or_default(),
        _ => EfConfig::default(),
    };
    client.registry().build_dense(&name, &config).ok()
}

fn rebuild_sparse_ef(client: &ChromaClient, metadata: &Metadata) -> Option<Arc<dyn SparseEmbeddingFunction>> {
    let name = match metadata.get(SPARSE_EF_NAME_KEY)? {
        chroma_types::MetadataValue::Str(s) => s.to_string(),
        _ => return None,
    };
    let config: EfConfig = match metadata.get(SPARSE_EF_CONFIG_KEY) {
        Some(chroma_types::MetadataValue::Str(s)) => serde_json::from_str(s).unwrap_or_default(),
        _ => EfConfig::default(),
    };
    client.registry().build_sparse(&name, &config).ok()
}

/// Typed options for [`Collection::get`]/[`Collection::peek`].
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    ids: Option<Vec<String>>,
    filter: Option<WhereClause>,
    limit: Option<usize>,
    offset: Option<usize>,
    include: IncludeFields,
}

impl GetOptions {
    /// Start from the default: no ids, no filter, no pagination, all
    /// fields included.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to these ids.
    pub fn ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict to records matching `filter`.
    pub fn filter(mut self, filter: WhereClause) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Cap the number of returned records.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip this many matching records before applying `limit`.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Choose which fields to populate in the response.
    pub fn include(mut self, include: IncludeFields) -> Self {
        self.include = include;
        self
    }
}

/// Typed options for a collection search (`dispatch.rs`).
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Number of results per logical query.
    pub limit: usize,
    /// Offset into each query's results.
    pub offset: Option<usize>,
    /// Metadata/document filter applied before ranking.
    pub filter: Option<WhereClause>,
    /// Which fields to populate in the response.
    pub include: IncludeFields,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions { limit: 10, offset: None, filter: None, include: IncludeFields::default() }
    }
}

/// Which optional fields a read response should populate.
#[derive(Debug, Clone)]
pub struct IncludeFields {
    /// Include `documents`.
    pub documents: bool,
    /// Include `metadatas`.
    pub metadatas: bool,
    /// Include `embeddings`.
    pub embeddings: bool,
    /// Include `distances`/`scores` (search only).
    pub distances: bool,
}

impl Default for IncludeFields {
    fn default() -> Self {
        IncludeFields { documents: true, metadatas: true, embeddings: false, distances: true }
    }
}

impl IncludeFields {
    fn wire_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if self.documents {
            fields.push("documents".to_string());
        }
        if self.metadatas {
            fields.push("metadatas".to_string());
        }
        if self.embeddings {
            fields.push("embeddings".to_string());
        }
        if self.distances {
            fields.push("distances".to_string());
        }
        fields
    }
}

/// One retrieved record.
#[derive(Debug, Clone, Default)]
pub struct Record {
    /// Record id.
    pub id: String,
    /// Document text, when included.
    pub document: Option<String>,
    /// Metadata, when included.
    pub metadata: Option<Metadata>,
    /// Embedding, when included.
    pub embedding: Option<serde_json::Value>,
}

/// The result of [`Collection::get`]/[`Collection::peek`].
#[derive(Debug, Clone, Default)]
pub struct GetResult {
    /// Matched records, in server-returned order.
    pub records: Vec<Record>,
}

impl GetResult {
    fn from_wire(response: GetResponse) -> Self {
        let n = response.ids.len();
        let mut documents = response.documents.unwrap_or_else(|| vec![None; n]);
        let mut metadatas = response.metadatas.unwrap_or_else(|| vec![None; n]);
        let mut embeddings = response.embeddings.unwrap_or_else(|| vec![None; n]);
        documents.resize(n, None);
        metadatas.resize(n, None);
        embeddings.resize(n, None);

        let records = response
            .ids
            .into_iter()
            .zip(documents)
            .zip(metadatas)
            .zip(embeddings)
            .map(|(((id, document), metadata), embedding)| Record { id, document, metadata, embedding })
            .collect();
        GetResult { records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_is_rejected() {
        let entries = CollectionEntries::default();
        let err = validate_write_batch(&entries, true).unwrap_err();
        assert!(err.to_string().contains("at least one id"));
    }

    #[test]
    fn empty_id_is_rejected() {
        let entries = CollectionEntries {
            ids: vec!["".to_string()],
            documents: Some(vec!["doc".to_string()]),
            ..Default::default()
        };
        let err = validate_write_batch(&entries, true).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let entries = CollectionEntries {
            ids: vec!["a".to_string(), "a".to_string()],
            documents: Some(vec!["x".to_string(), "y".to_string()]),
            ..Default::default()
        };
        let err = validate_write_batch(&entries, true).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn documents_without_embedding_function_is_rejected() {
        let entries = CollectionEntries {
            ids: vec!["a".to_string()],
            documents: Some(vec!["x".to_string()]),
            ..Default::default()
        };
        let err = validate_write_batch(&entries, false).unwrap_err();
        assert!(err.to_string().contains("embedding function"));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let entries = CollectionEntries {
            ids: vec!["a".to_string(), "b".to_string()],
            documents: Some(vec!["only-one".to_string()]),
            ..Default::default()
        };
        assert!(validate_write_batch(&entries, true).is_err());
    }

    #[test]
    fn embeddings_alone_are_sufficient() {
        let entries = CollectionEntries {
            ids: vec!["a".to_string()],
            embeddings: Some(vec![Embedding::f32(vec![1.0, 2.0])]),
            ..Default::default()
        };
        assert!(validate_write_batch(&entries, false).is_ok());
    }
}

//! The top-level Chroma HTTP client: heartbeat, version, pre-flight
//! checks, tenant/database CRUD, and collection CRUD. Per-collection
//! record operations live in `collection.rs`.
//!
//! The builder shape is grounded on `ClientConfig` + the builder-method
//! idiom in `app/client/src/lib.rs`, generalized from a Unix-socket
//! connection to an HTTP base URL, tenant/database, auth provider, and
//! retry policy.

use crate::auth::{AuthProvider, NoAuth};
use crate::collection::Collection;
use crate::error::{Error, Result};
use crate::retry::{Idempotency, RetryPolicy};
use crate::transport::Transport;
use crate::wire::{
    ef_config_to_json, CollectionResponse, CreateCollectionRequest, CreateDatabaseRequest, CreateTenantRequest,
    DatabaseResponse, HeartbeatResponse, PreFlightChecks, TenantResponse, EF_CONFIG_KEY, EF_NAME_KEY, HNSW_SPACE_KEY,
    SPARSE_EF_CONFIG_KEY, SPARSE_EF_NAME_KEY,
};
use chroma_ef::{EmbeddingFunction, Registry, SparseEmbeddingFunction};
use chroma_types::{DistanceMetric, Metadata, MetadataValue};
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;

/// The default tenant a fresh Chroma server provisions.
pub const DEFAULT_TENANT: &str = "default_tenant";
/// The default database a fresh Chroma server provisions.
pub const DEFAULT_DATABASE: &str = "default_database";

/// Builder for [`ChromaClient`].
pub struct ChromaClientBuilder {
    host: String,
    tenant: String,
    database: String,
    auth: Arc<dyn AuthProvider>,
    retry: RetryPolicy,
    timeout: Duration,
    registry: Registry,
    preflight: bool,
}

impl ChromaClientBuilder {
    /// Start building a client against `host` (e.g.
    /// `"http://localhost:8000"`), defaulting tenant/database to
    /// `"default_tenant"`/`"default_database"`.
    pub fn new(host: impl Into<String>) -> Self {
        ChromaClientBuilder {
            host: host.into(),
            tenant: DEFAULT_TENANT.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            auth: Arc::new(NoAuth),
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(60),
            registry: Registry::with_builtins(),
            preflight: true,
        }
    }

    /// Override the tenant.
    pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = tenant.into();
        self
    }

    /// Override the database.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the authentication provider.
    pub fn auth(mut self, auth: impl AuthProvider + 'static) -> Self {
        self.auth = Arc::new(auth);
        self
    }

    /// Set the retry policy.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a caller-supplied embedding function registry instead of the
    /// default `with_builtins()` one.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Skip the heartbeat/version pre-flight check `connect()` would
    /// otherwise perform.
    pub fn without_preflight(mut self) -> Self {
        self.preflight = false;
        self
    }

    /// Build the client. Unless [`Self::without_preflight`] was called,
    /// this confirms the server is reachable (`heartbeat`), compatible
    /// (`version`), and that this client's tenant and database actually
    /// exist before handing back a usable client.
    pub async fn connect(self) -> Result<ChromaClient> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(Error::Transport)?;
        let transport = Transport::new(http, self.auth, self.retry);
        let base_url = url::Url::parse(&self.host).map_err(|e| Error::InvalidArgument(e.to_string()))?;
        let client = ChromaClient {
            transport,
            base_url,
            tenant: self.tenant,
            database: self.database,
            registry: self.registry,
        };
        if self.preflight {
            client.heartbeat().await?;
            client.version().await?;
            client.pre_flight_checks().await?;
            client.get_tenant(&client.tenant).await?;
            let databases = client.list_databases().await?;
            if !databases.iter().any(|db| db.name == client.database) {
                return Err(Error::NotFound(format!(
                    "database \"{}\" does not exist under tenant \"{}\"",
                    client.database, client.tenant
                )));
            }
        }
        Ok(client)
    }
}

/// A client bound to a single tenant/database pair on a Chroma server.
#[derive(Clone)]
pub struct ChromaClient {
    transport: Transport,
    base_url: url::Url,
    tenant: String,
    database: String,
    registry: Registry,
}

impl ChromaClient {
    /// Start building a client for `host`.
    pub fn builder(host: impl Into<String>) -> ChromaClientBuilder {
        ChromaClientBuilder::new(host)
    }

    /// The embedding function registry this client's collections resolve
    /// auto-wired embedding functions against.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The tenant this client is bound to.
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// The database this client is bound to.
    pub fn database(&self) -> &str {
        &self.database
    }

    fn url(&self, path: &str) -> Result<url::Url> {
        self.base_url.join(path).map_err(|e| Error::InvalidArgument(e.to_string()))
    }

    fn collections_url(&self, suffix: &str) -> Result<url::Url> {
        self.url(&format!(
            "api/v2/tenants/{}/databases/{}/collections{}",
            self.tenant, self.database, suffix
        ))
    }

    /// `GET /api/v2/heartbeat` — confirms the server is up.
    pub async fn heartbeat(&self) -> Result<u64> {
        let url = self.url("api/v2/heartbeat")?;
        let response: HeartbeatResponse =
            self.transport.send_json::<(), _>(Method::GET, url, None, Idempotency::Safe).await?;
        Ok(response.nanosecond_heartbeat)
    }

    /// `GET /api/v2/version` — the server's version string.
    pub async fn version(&self) -> Result<String> {
        let url = self.url("api/v2/version")?;
        self.transport.send_json::<(), _>(Method::GET, url, None, Idempotency::Safe).await
    }

    /// `GET /api/v2/pre-flight-checks` — server-advertised limits such as
    /// the maximum insert batch size.
    pub async fn pre_flight_checks(&self) -> Result<PreFlightChecks> {
        let url = self.url("api/v2/pre-flight-checks")?;
        self.transport.send_json::<(), _>(Method::GET, url, None, Idempotency::Safe).await
    }

    /// Create a tenant.
    pub async fn create_tenant(&self, name: impl Into<String>) -> Result<()> {
        let url = self.url("api/v2/tenants")?;
        let body = CreateTenantRequest { name: name.into() };
        self.transport.send_json(Method::POST, url, Some(&body), Idempotency::Unsafe).await
    }

    /// `GET /api/v2/tenants/{name}` — fails with [`Error::NotFound`] if the
    /// tenant does not exist.
    pub async fn get_tenant(&self, name: &str) -> Result<TenantResponse> {
        let url = self.url(&format!("api/v2/tenants/{name}"))?;
        self.transport.send_json::<(), _>(Method::GET, url, None, Idempotency::Safe).await
    }

    /// Create a database under this client's tenant.
    pub async fn create_database(&self, name: impl Into<String>) -> Result<DatabaseResponse> {
        let url = self.url(&format!("api/v2/tenants/{}/databases", self.tenant))?;
        let body = CreateDatabaseRequest { name: name.into() };
        self.transport.send_json(Method::POST, url, Some(&body), Idempotency::Unsafe).await
    }

    /// List databases under this client's tenant.
    pub async fn list_databases(&self) -> Result<Vec<DatabaseResponse>> {
        let url = self.url(&format!("api/v2/tenants/{}/databases", self.tenant))?;
        self.transport.send_json::<(), _>(Method::GET, url, None, Idempotency::Safe).await
    }

    /// Create a collection, failing if `name` already exists.
    pub async fn create_collection(&self, name: impl Into<String>, metadata: Option<Metadata>) -> Result<Collection> {
        self.create_collection_inner(name.into(), metadata, false).await
    }

    /// Create a collection, returning the existing one if `name` is
    /// already taken instead of erroring (auto-wire persistence relies on
    /// this path to reuse a previously configured embedding function).
    pub async fn get_or_create_collection(
        &self,
        name: impl Into<String>,
        metadata: Option<Metadata>,
    ) -> Result<Collection> {
        self.create_collection_inner(name.into(), metadata, true).await
    }

    /// Create a collection wired to a dense embedding function: its name,
    /// config, and preferred distance metric are persisted into the
    /// collection's metadata under the reserved `chroma:*`/`hnsw:space`
    /// keys, so a later [`Self::get_or_create_collection`] (or
    /// [`collection::Collection::rebuild_dense_ef`]) can reconstruct an
    /// equivalent embedding function from the registry alone ("auto-wire
    /// persistence").
    ///
    /// Fails with [`Error::FailedPrecondition`] if `space` is given and
    /// `ef` does not support it.
    pub async fn create_collection_with_ef(
        &self,
        name: impl Into<String>,
        ef: &dyn EmbeddingFunction,
        space: Option<DistanceMetric>,
        metadata: Option<Metadata>,
    ) -> Result<Collection> {
        let merged = Self::metadata_with_dense_ef(ef, space, metadata)?;
        self.create_collection_inner(name.into(), Some(merged), false).await
    }

    /// Like [`Self::create_collection_with_ef`], but returns the existing
    /// collection instead of erroring when `name` is already taken.
    pub async fn get_or_create_collection_with_ef(
        &self,
        name: impl Into<String>,
        ef: &dyn EmbeddingFunction,
        space: Option<DistanceMetric>,
        metadata: Option<Metadata>,
    ) -> Result<Collection> {
        let merged = Self::metadata_with_dense_ef(ef, space, metadata)?;
        self.create_collection_inner(name.into(), Some(merged), true).await
    }

    /// Create a collection wired to a sparse embedding function, the
    /// sparse-contract analogue of [`Self::create_collection_with_ef`].
    pub async fn create_collection_with_sparse_ef(
        &self,
        name: impl Into<String>,
        ef: &dyn SparseEmbeddingFunction,
        metadata: Option<Metadata>,
    ) -> Result<Collection> {
        let merged = Self::metadata_with_sparse_ef(ef, metadata);
        self.create_collection_inner(name.into(), Some(merged), false).await
    }

    /// Like [`Self::create_collection_with_sparse_ef`], but returns the
    /// existing collection instead of erroring when `name` is already
    /// taken.
    pub async fn get_or_create_collection_with_sparse_ef(
        &self,
        name: impl Into<String>,
        ef: &dyn SparseEmbeddingFunction,
        metadata: Option<Metadata>,
    ) -> Result<Collection> {
        let merged = Self::metadata_with_sparse_ef(ef, metadata);
        self.create_collection_inner(name.into(), Some(merged), true).await
    }

    fn metadata_with_dense_ef(
        ef: &dyn EmbeddingFunction,
        space: Option<DistanceMetric>,
        metadata: Option<Metadata>,
    ) -> Result<Metadata> {
        let space = space.unwrap_or_else(|| ef.default_space());
        if !ef.supported_spaces().contains(&space) {
            return Err(Error::FailedPrecondition(format!(
                "embedding function \"{}\" does not support distance metric \"{}\"",
                ef.name(),
                space.as_str()
            )));
        }
        let mut merged = metadata.unwrap_or_default();
        merged.insert(EF_NAME_KEY, MetadataValue::Str(ef.name().into()));
        merged.insert(EF_CONFIG_KEY, MetadataValue::Str(ef_config_to_json(&ef.get_config()).to_string().into()));
        merged.insert(HNSW_SPACE_KEY, MetadataValue::Str(space.as_str().into()));
        Ok(merged)
    }

    fn metadata_with_sparse_ef(ef: &dyn SparseEmbeddingFunction, metadata: Option<Metadata>) -> Metadata {
        let mut merged = metadata.unwrap_or_default();
        merged.insert(SPARSE_EF_NAME_KEY, MetadataValue::Str(ef.name().into()));
        merged
            .insert(SPARSE_EF_CONFIG_KEY, MetadataValue::Str(ef_config_to_json(&ef.get_config()).to_string().into()));
        merged
    }

    async fn create_collection_inner(
        &self,
        name: String,
        metadata: Option<Metadata>,
        get_or_create: bool,
    ) -> Result<Collection> {
        let url = self.collections_url("")?;
        let body = CreateCollectionRequest { name, metadata, get_or_create };
        let response: CollectionResponse =
            self.transport.send_json(Method::POST, url, Some(&body), Idempotency::Unsafe).await?;
        Ok(Collection::from_response(self.clone(), response))
    }

    /// Fetch a collection by name.
    pub async fn get_collection(&self, name: &str) -> Result<Collection> {
        let url = self.collections_url(&format!("/{name}"))?;
        let response: CollectionResponse =
            self.transport.send_json::<(), _>(Method::GET, url, None, Idempotency::Safe).await?;
        Ok(Collection::from_response(self.clone(), response))
    }

    /// List all collections visible to this tenant/database.
    pub async fn list_collections(&self) -> Result<Vec<Collection>> {
        let url = self.collections_url("")?;
        let responses: Vec<CollectionResponse> =
            self.transport.send_json::<(), _>(Method::GET, url, None, Idempotency::Safe).await?;
        Ok(responses.into_iter().map(|r| Collection::from_response(self.clone(), r)).collect())
    }

    /// Number of collections visible to this tenant/database.
    pub async fn count_collections(&self) -> Result<usize> {
        Ok(self.list_collections().await?.len())
    }

    /// Delete a collection by name.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        let url = self.collections_url(&format!("/{name}"))?;
        self.transport.send_json::<(), _>(Method::DELETE, url, None, Idempotency::IdempotentByConstruction).await
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.transport
    }

    pub(crate) fn collection_url(&self, id: &str, suffix: &str) -> Result<url::Url> {
        self.collections_url(&format!("/{id}{suffix}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_ef::MockEmbeddingFunction;

    #[test]
    fn metadata_with_dense_ef_stamps_reserved_keys() {
        let ef = MockEmbeddingFunction::new(4);
        let metadata = ChromaClient::metadata_with_dense_ef(&ef, Some(DistanceMetric::Cosine), None).unwrap();
        assert_eq!(metadata.get(EF_NAME_KEY), Some(&MetadataValue::Str("mock".into())));
        assert_eq!(metadata.get(HNSW_SPACE_KEY), Some(&MetadataValue::Str("cosine".into())));
        assert!(metadata.get(EF_CONFIG_KEY).is_some());
    }

    #[test]
    fn metadata_with_dense_ef_rejects_an_unsupported_space() {
        struct CosineOnly;
        impl EmbeddingFunction for CosineOnly {
            fn name(&self) -> &str {
                "cosine-only"
            }
            fn embed_documents(
                &self,
                _documents: &[String],
            ) -> Result<Vec<chroma_types::Embedding>, chroma_ef::EfError> {
                unimplemented!()
            }
            fn get_config(&self) -> std::collections::BTreeMap<String, serde_json::Value> {
                Default::default()
            }
            fn supported_spaces(&self) -> Vec<DistanceMetric> {
                vec![DistanceMetric::Cosine]
            }
        }
        let err = ChromaClient::metadata_with_dense_ef(&CosineOnly, Some(DistanceMetric::L2), None).unwrap_err();
        assert!(matches!(err, Error::FailedPrecondition(_)));
    }

    #[test]
    fn metadata_with_dense_ef_merges_caller_supplied_metadata() {
        let ef = MockEmbeddingFunction::new(4);
        let caller_metadata = Metadata::new().with("owner", MetadataValue::Str("team-search".into()));
        let metadata = ChromaClient::metadata_with_dense_ef(&ef, None, Some(caller_metadata)).unwrap();
        assert_eq!(metadata.get("owner"), Some(&MetadataValue::Str("team-search".into())));
        assert!(metadata.get(EF_NAME_KEY).is_some());
    }
}

//! Azure Cosmos DB token store
//!
//! Low-latency fallback used when Key Vault round trips exceed the
//! acceptable bound (~10-20 ms target). Mappings are stored as documents in
//! a container partitioned by `/pii_type`, with the database's native
//! per-document TTL (`ttl` field, seconds) expiring them server-side.
//!
//! The SDK offers no cross-partition query, and a token alone does not name
//! its partition; since [`PiiType`] is a closed set, lookups fan concurrent
//! point reads across the type partitions and take the first hit. Expiry is
//! additionally checked lazily on read, so a document the provider has not
//! yet reaped still reads as not-found.

use crate::config::CosmosDbConfig;
use crate::domain::errors::{CloakError, CosmosDbError};
use crate::domain::mapping::TokenMapping;
use crate::domain::pii::PiiType;
use crate::domain::result::Result;
use crate::store::traits::TokenStore;
use async_trait::async_trait;
use azure_core::credentials::Secret;
use azure_data_cosmos::clients::{ContainerClient, DatabaseClient};
use azure_data_cosmos::models::{ContainerProperties, IndexingPolicy, PartitionKeyDefinition};
use azure_data_cosmos::{CosmosClient, CosmosClientOptions, PartitionKey};
use chrono::{DateTime, Duration, Utc};
use futures::future;
use futures::stream::StreamExt;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, warn};

/// Token mapping document as stored in Cosmos DB
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenDocument {
    /// Document ID (the token itself)
    id: String,

    /// PII category label (partition key)
    pii_type: String,

    /// The original PII value
    original_value: String,

    /// When the mapping was created
    created_at: DateTime<Utc>,

    /// When the mapping expires
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,

    /// Optional grouping key
    #[serde(skip_serializing_if = "Option::is_none")]
    context_id: Option<String>,

    /// Cosmos native TTL in seconds from last write
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<i64>,
}

impl TokenDocument {
    fn from_mapping(mapping: &TokenMapping) -> Self {
        let ttl = mapping
            .expires_at
            .map(|expires_at| (expires_at - Utc::now()).num_seconds().max(1));

        Self {
            id: mapping.token.clone(),
            pii_type: mapping.pii_type.label().to_string(),
            original_value: mapping.original_value.clone(),
            created_at: mapping.created_at,
            expires_at: mapping.expires_at,
            context_id: mapping.context_id.clone(),
            ttl,
        }
    }

    fn into_mapping(self) -> Result<TokenMapping> {
        let pii_type = PiiType::parse(&self.pii_type).ok_or_else(|| {
            CloakError::CosmosDb(CosmosDbError::DeserializationFailed(format!(
                "Unknown pii_type in document {}: {}",
                self.id, self.pii_type
            )))
        })?;

        Ok(TokenMapping {
            token: self.id,
            original_value: self.original_value,
            pii_type,
            created_at: self.created_at,
            expires_at: self.expires_at,
            context_id: self.context_id,
        })
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }
}

/// Cosmos DB-backed token store
pub struct CosmosTokenStore {
    client: CosmosClient,
    database: DatabaseClient,
    container: ContainerClient,
    config: CosmosDbConfig,
    default_ttl: Duration,
}

impl CosmosTokenStore {
    /// Create a new Cosmos DB store
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created. An unreachable
    /// account surfaces on the first store operation, not here.
    pub async fn new(config: CosmosDbConfig, default_ttl: Duration) -> Result<Self> {
        let key_str = config.key.expose_secret().as_ref().to_string();
        let key = Secret::new(key_str);
        let options = Some(CosmosClientOptions::default());

        let client = CosmosClient::with_key(&config.endpoint, key, options).map_err(|e| {
            CloakError::CosmosDb(CosmosDbError::ConnectionFailed(format!(
                "Failed to create Cosmos client: {e}"
            )))
        })?;

        let database = client.database_client(&config.database_name);
        let container = database.container_client(&config.container_name);

        Ok(Self {
            client,
            database,
            container,
            config,
            default_ttl,
        })
    }

    /// Ensure the database and mapping container exist, creating them if
    /// necessary
    ///
    /// The container is partitioned by `/pii_type`. Per-document TTL takes
    /// effect once time-to-live is enabled on the container; expiry is also
    /// enforced lazily on read, so reads stay correct either way.
    pub async fn ensure_ready(&self) -> Result<()> {
        self.ensure_database_exists().await?;
        self.ensure_container_exists().await
    }

    async fn ensure_database_exists(&self) -> Result<()> {
        match self.database.read(None).await {
            Ok(_) => {
                debug!(database = %self.config.database_name, "Database already exists");
                Ok(())
            }
            Err(_) => {
                debug!(database = %self.config.database_name, "Creating database");

                self.client
                    .create_database(&self.config.database_name, None)
                    .await
                    .map_err(|e| {
                        CloakError::CosmosDb(CosmosDbError::ConnectionFailed(format!(
                            "Failed to create database: {e}"
                        )))
                    })?;
                Ok(())
            }
        }
    }

    async fn ensure_container_exists(&self) -> Result<()> {
        match self.container.read(None).await {
            Ok(_) => {
                debug!(container = %self.config.container_name, "Container already exists");
                Ok(())
            }
            Err(_) => {
                debug!(container = %self.config.container_name, "Creating container");

                let partition_key_def = PartitionKeyDefinition {
                    paths: vec!["/pii_type".to_string()],
                    kind: azure_data_cosmos::models::PartitionKeyKind::Hash,
                    version: None,
                };

                let properties = ContainerProperties {
                    id: Cow::Owned(self.config.container_name.clone()),
                    partition_key: partition_key_def,
                    indexing_policy: Some(IndexingPolicy::default()),
                    ..Default::default()
                };

                self.database
                    .create_container(properties, None)
                    .await
                    .map_err(|e| {
                        CloakError::CosmosDb(CosmosDbError::ConnectionFailed(format!(
                            "Failed to create container: {e}"
                        )))
                    })?;
                Ok(())
            }
        }
    }

    fn call_deadline(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.config.request_timeout_seconds)
    }

    /// Point-read one type partition for the token
    async fn read_partition(&self, pii_type: PiiType, token: &str) -> Result<Option<TokenDocument>> {
        let partition_key = PartitionKey::from(pii_type.label().to_string());

        match self
            .container
            .read_item::<TokenDocument>(partition_key, token, None)
            .await
        {
            Ok(response) => {
                let document = response.into_body().map_err(|e| {
                    CloakError::CosmosDb(CosmosDbError::DeserializationFailed(format!(
                        "Failed to deserialize token document: {e}"
                    )))
                })?;
                Ok(Some(document))
            }
            Err(e) => {
                if e.to_string().contains("404") || e.to_string().contains("NotFound") {
                    Ok(None)
                } else {
                    Err(CloakError::CosmosDb(CosmosDbError::QueryFailed(format!(
                        "Failed to read token document: {e}"
                    ))))
                }
            }
        }
    }

    /// Locate a token's document by fanning point reads across the closed
    /// set of type partitions
    async fn find_document(&self, token: &str) -> Result<Option<TokenDocument>> {
        let lookups = PiiType::ALL.iter().map(|t| self.read_partition(*t, token));
        let results = future::join_all(lookups).await;

        let mut first_err = None;
        for result in results {
            match result {
                Ok(Some(document)) => return Ok(Some(document)),
                Ok(None) => {}
                Err(e) => first_err = first_err.or(Some(e)),
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    async fn delete_document(&self, document: &TokenDocument) -> Result<bool> {
        let partition_key = PartitionKey::from(document.pii_type.clone());

        match self
            .container
            .delete_item(partition_key, &document.id, None)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.to_string().contains("404") || e.to_string().contains("NotFound") {
                    Ok(false)
                } else {
                    Err(CloakError::CosmosDb(CosmosDbError::DeleteFailed(format!(
                        "Failed to delete token document: {e}"
                    ))))
                }
            }
        }
    }

    /// Query one type partition for documents whose expiry has passed
    async fn expired_in_partition(&self, pii_type: PiiType, now: &str) -> Result<Vec<TokenDocument>> {
        let partition_key = PartitionKey::from(pii_type.label().to_string());
        let query = format!("SELECT * FROM c WHERE c.expires_at <= '{now}'");

        let mut query_response = self
            .container
            .query_items::<TokenDocument>(query, partition_key, None)
            .map_err(|e| {
                CloakError::CosmosDb(CosmosDbError::QueryFailed(format!(
                    "Failed to create expiry query: {e}"
                )))
            })?;

        let mut documents = Vec::new();
        while let Some(item) = query_response.next().await {
            match item {
                Ok(document) => documents.push(document),
                Err(e) => {
                    return Err(CloakError::CosmosDb(CosmosDbError::QueryFailed(format!(
                        "Failed to fetch expired documents: {e}"
                    ))));
                }
            }
        }
        Ok(documents)
    }
}

#[async_trait]
impl TokenStore for CosmosTokenStore {
    async fn store(&self, mapping: &TokenMapping) -> Result<bool> {
        let stamped = self.stamp_expiry(mapping);
        let document = TokenDocument::from_mapping(&stamped);
        let partition_key = PartitionKey::from(document.pii_type.clone());

        let write = self.container.create_item(partition_key, document, None);
        let result = tokio::time::timeout(self.call_deadline(), write)
            .await
            .map_err(|_| {
                CloakError::CosmosDb(CosmosDbError::Timeout(format!(
                    "create item exceeded {}s",
                    self.config.request_timeout_seconds
                )))
            })?;

        match result {
            Ok(_) => {
                debug!(token = %stamped.token, pii_type = %stamped.pii_type, "Stored token mapping");
                Ok(true)
            }
            Err(e) => {
                let message = e.to_string();
                // Tokens are write-once; a conflict means the token already exists
                if message.contains("409") || message.contains("Conflict") {
                    warn!(token = %stamped.token, "Refusing to overwrite existing token document");
                    Ok(false)
                } else {
                    Err(CloakError::CosmosDb(CosmosDbError::InsertFailed(message)))
                }
            }
        }
    }

    async fn retrieve(&self, token_str: &str) -> Result<Option<TokenMapping>> {
        let lookup = self.find_document(token_str);
        let document = match tokio::time::timeout(self.call_deadline(), lookup).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("Cosmos lookup timed out, treating as not-found");
                return Ok(None);
            }
        };

        match document {
            Some(document) => {
                if document.is_expired(Utc::now()) {
                    // The provider has not reaped it yet; purge and report not-found
                    debug!(token = %token_str, "Expired document treated as not-found");
                    let _ = self.delete_document(&document).await;
                    return Ok(None);
                }
                Ok(Some(document.into_mapping()?))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, token_str: &str) -> Result<bool> {
        match self.find_document(token_str).await? {
            Some(document) => self.delete_document(&document).await,
            None => Ok(false),
        }
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        let now = Utc::now().to_rfc3339();
        let mut removed = 0usize;

        for pii_type in PiiType::ALL {
            let expired = self.expired_in_partition(pii_type, &now).await?;
            for document in expired {
                if self.delete_document(&document).await? {
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            debug!(removed, "Swept expired token documents");
        }
        Ok(removed)
    }

    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn backend_name(&self) -> &'static str {
        "cosmosdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenization::token;

    fn mapping() -> TokenMapping {
        TokenMapping::new(token::generate(), "john@example.com", PiiType::Email)
            .with_ttl(Duration::hours(2))
            .with_context_id("conv-7")
    }

    #[test]
    fn test_document_from_mapping() {
        let m = mapping();
        let document = TokenDocument::from_mapping(&m);

        assert_eq!(document.id, m.token);
        assert_eq!(document.pii_type, "EMAIL");
        assert_eq!(document.original_value, "john@example.com");
        assert_eq!(document.context_id.as_deref(), Some("conv-7"));

        // TTL approximates the remaining lifetime in seconds
        let ttl = document.ttl.unwrap();
        assert!(ttl > 7000 && ttl <= 7200, "unexpected ttl {ttl}");
    }

    #[test]
    fn test_document_round_trip() {
        let m = mapping();
        let document = TokenDocument::from_mapping(&m);
        let back = document.into_mapping().unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_document_unknown_type_rejected() {
        let m = mapping();
        let mut document = TokenDocument::from_mapping(&m);
        document.pii_type = "MYSTERY".to_string();
        assert!(document.into_mapping().is_err());
    }

    #[test]
    fn test_document_expiry() {
        let m = TokenMapping::new(token::generate(), "a@b.co", PiiType::Email)
            .with_ttl(Duration::seconds(-5));
        let document = TokenDocument::from_mapping(&m);
        assert!(document.is_expired(Utc::now()));

        // Even for an already-expired mapping the ttl field stays positive so
        // the provider reaps the document promptly rather than rejecting it
        assert_eq!(document.ttl, Some(1));
    }

    #[test]
    fn test_document_serde_field_names() {
        let m = mapping();
        let document = TokenDocument::from_mapping(&m);
        let value = serde_json::to_value(&document).unwrap();

        // Field names are load-bearing: `id` and `pii_type` are the document
        // key and partition key, `ttl` drives native expiry
        assert!(value.get("id").is_some());
        assert!(value.get("pii_type").is_some());
        assert!(value.get("ttl").is_some());
    }
}

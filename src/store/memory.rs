//! Ephemeral in-process token store
//!
//! Process-local storage guarded by a read-write lock: retrievals of live
//! mappings proceed concurrently, mutations are exclusive. Data is lost on
//! restart. Expired entries are purged lazily on read and by the explicit
//! [`cleanup_expired`](crate::store::TokenStore::cleanup_expired) sweep.

use crate::domain::errors::CloakError;
use crate::domain::mapping::TokenMapping;
use crate::domain::result::Result;
use crate::store::traits::TokenStore;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory token store
pub struct MemoryTokenStore {
    mappings: RwLock<HashMap<String, TokenMapping>>,
    default_ttl: Duration,
}

impl MemoryTokenStore {
    /// Create a store with the standard 24-hour default TTL
    pub fn new() -> Self {
        Self::with_default_ttl(Duration::hours(24))
    }

    /// Create a store with a custom default TTL
    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            mappings: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Number of mappings currently held, expired or not
    pub async fn len(&self) -> usize {
        self.mappings.read().await.len()
    }

    /// Whether the store holds no mappings
    pub async fn is_empty(&self) -> bool {
        self.mappings.read().await.is_empty()
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn store(&self, mapping: &TokenMapping) -> Result<bool> {
        if mapping.token.is_empty() {
            return Err(CloakError::Validation("token must not be empty".to_string()));
        }

        let stamped = self.stamp_expiry(mapping);
        let mut mappings = self.mappings.write().await;

        // Tokens are write-once; a live entry is never overwritten
        if let Some(existing) = mappings.get(&stamped.token) {
            if !existing.is_expired(Utc::now()) {
                tracing::warn!(token = %stamped.token, "Refusing to overwrite live token mapping");
                return Ok(false);
            }
        }

        mappings.insert(stamped.token.clone(), stamped);
        Ok(true)
    }

    async fn retrieve(&self, token: &str) -> Result<Option<TokenMapping>> {
        let now = Utc::now();

        {
            let mappings = self.mappings.read().await;
            match mappings.get(token) {
                Some(mapping) if !mapping.is_expired(now) => return Ok(Some(mapping.clone())),
                Some(_) => {} // expired, purge below
                None => return Ok(None),
            }
        }

        // Lazy purge of the expired entry; re-check under the write lock
        // since another task may have swept it already
        let mut mappings = self.mappings.write().await;
        if let Some(mapping) = mappings.get(token) {
            if mapping.is_expired(now) {
                mappings.remove(token);
                tracing::debug!(token = %token, "Purged expired mapping on read");
            }
        }
        Ok(None)
    }

    async fn delete(&self, token: &str) -> Result<bool> {
        let mut mappings = self.mappings.write().await;
        Ok(mappings.remove(token).is_some())
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let mut mappings = self.mappings.write().await;

        let before = mappings.len();
        mappings.retain(|_, mapping| !mapping.is_expired(now));
        let removed = before - mappings.len();

        if removed > 0 {
            tracing::debug!(removed, "Swept expired mappings");
        }
        Ok(removed)
    }

    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

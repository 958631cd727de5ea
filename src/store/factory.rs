//! Token store factory
//!
//! Builds the configured store backend and manages the process-wide shared
//! instance. The shared instance is lazily initialized and explicitly
//! resettable so tests can inject an alternate store — there is no
//! unconditional singleton.

use crate::config::{CloakConfig, StoreBackend};
use crate::domain::errors::CloakError;
use crate::domain::result::Result;
use crate::store::cosmosdb::CosmosTokenStore;
use crate::store::keyvault::KeyVaultTokenStore;
use crate::store::memory::MemoryTokenStore;
use crate::store::traits::TokenStore;
use chrono::Duration;
use std::sync::{Arc, RwLock};

static SHARED_STORE: RwLock<Option<Arc<dyn TokenStore>>> = RwLock::new(None);

/// Create a token store from configuration
///
/// The durable backends are constructed only when explicitly selected;
/// their initialization failures (missing credentials, unreachable endpoint)
/// are raised here rather than silently falling back to the ephemeral store.
///
/// # Errors
///
/// Returns an error if the selected backend's configuration section is
/// missing or the backend cannot be initialized.
pub async fn create_token_store(config: &CloakConfig) -> Result<Arc<dyn TokenStore>> {
    let default_ttl = Duration::hours(config.store.default_ttl_hours);

    match config.store.backend {
        StoreBackend::Memory => {
            tracing::info!("Creating in-memory token store");
            Ok(Arc::new(MemoryTokenStore::with_default_ttl(default_ttl)))
        }
        StoreBackend::KeyVault => {
            let kv_config = config.store.keyvault.as_ref().ok_or_else(|| {
                CloakError::Configuration(
                    "keyvault configuration is required when store.backend = 'keyvault'"
                        .to_string(),
                )
            })?;

            tracing::info!(vault = %kv_config.vault_url, "Creating Key Vault token store");
            let store = KeyVaultTokenStore::new(kv_config, default_ttl)?;
            Ok(Arc::new(store))
        }
        StoreBackend::CosmosDb => {
            let cosmos_config = config.store.cosmosdb.as_ref().ok_or_else(|| {
                CloakError::Configuration(
                    "cosmosdb configuration is required when store.backend = 'cosmosdb'"
                        .to_string(),
                )
            })?;

            tracing::info!(
                endpoint = %cosmos_config.endpoint,
                database = %cosmos_config.database_name,
                "Creating Cosmos DB token store"
            );
            let store = CosmosTokenStore::new(cosmos_config.clone(), default_ttl).await?;
            store.ensure_ready().await?;
            Ok(Arc::new(store))
        }
    }
}

/// Get the process-wide shared store, creating it from `config` on first use
///
/// All callers after the first receive the same instance regardless of the
/// configuration they pass. Use [`set_shared_store`] / [`reset_shared_store`]
/// to substitute or clear it (e.g. between tests).
pub async fn shared_store(config: &CloakConfig) -> Result<Arc<dyn TokenStore>> {
    if let Some(store) = shared_store_if_set() {
        return Ok(store);
    }

    let store = create_token_store(config).await?;

    let mut guard = SHARED_STORE
        .write()
        .expect("shared store lock poisoned");
    // Another task may have initialized it while we were constructing
    if let Some(existing) = guard.as_ref() {
        return Ok(Arc::clone(existing));
    }
    *guard = Some(Arc::clone(&store));
    Ok(store)
}

/// The shared store, if one has been initialized or injected
pub fn shared_store_if_set() -> Option<Arc<dyn TokenStore>> {
    SHARED_STORE
        .read()
        .expect("shared store lock poisoned")
        .as_ref()
        .map(Arc::clone)
}

/// Replace the process-wide shared store (test injection hook)
pub fn set_shared_store(store: Arc<dyn TokenStore>) {
    *SHARED_STORE.write().expect("shared store lock poisoned") = Some(store);
}

/// Clear the process-wide shared store so the next [`shared_store`] call
/// reconstructs it
pub fn reset_shared_store() {
    *SHARED_STORE.write().expect("shared store lock poisoned") = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_store() {
        let config = CloakConfig::default();
        let store = create_token_store(&config).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
        assert_eq!(store.default_ttl(), Duration::hours(24));
    }

    #[tokio::test]
    async fn test_keyvault_without_section_raises() {
        let mut config = CloakConfig::default();
        config.store.backend = StoreBackend::KeyVault;

        let err = create_token_store(&config).await.err().unwrap();
        assert!(matches!(err, CloakError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_shared_store_injection_and_reset() {
        // Serialize against other tests touching the process-wide slot
        reset_shared_store();
        assert!(shared_store_if_set().is_none());

        let injected: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
        set_shared_store(Arc::clone(&injected));

        let config = CloakConfig::default();
        let resolved = shared_store(&config).await.unwrap();
        assert!(Arc::ptr_eq(&resolved, &injected));

        reset_shared_store();
        assert!(shared_store_if_set().is_none());
    }
}

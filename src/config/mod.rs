//! Configuration management for Cloak.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation, with full environment-variable override support so a
//! deployment can be configured without any file at all.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cloak::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("cloak.toml")?;
//! println!("Store backend: {}", config.store.backend);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [detection]
//! confidence_threshold = 0.7
//!
//! [store]
//! backend = "keyvault"
//! default_ttl_hours = 24
//!
//! [store.keyvault]
//! vault_url = "https://my-vault.vault.azure.net"
//! tenant_id = "${AZURE_TENANT_ID}"
//! client_id = "${AZURE_CLIENT_ID}"
//! client_secret = "${AZURE_CLIENT_SECRET}"
//!
//! [store.cosmosdb]
//! endpoint = "https://my-account.documents.azure.com:443/"
//! key = "${CLOAK_COSMOS_KEY}"
//! database_name = "cloak"
//! container_name = "token_mappings"
//! ```
//!
//! # Environment Variables
//!
//! `${VAR}` placeholders in the TOML are substituted at load time, and
//! `CLOAK_*` variables override individual settings afterwards
//! (`CLOAK_STORE_BACKEND`, `CLOAK_DEFAULT_TTL_HOURS`,
//! `CLOAK_CONFIDENCE_THRESHOLD`, `CLOAK_KEYVAULT_URL`, ...).

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{from_env, load_config};
pub use schema::{
    ApplicationConfig, AuditConfig, CloakConfig, CosmosDbConfig, DetectionConfig, KeyVaultConfig,
    LoggingConfig, StoreBackend, StoreConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};

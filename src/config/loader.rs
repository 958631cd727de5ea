//! Configuration loader with TOML parsing and environment variable overrides
//!
//! Deployments either ship a TOML file (loaded with [`load_config`]) or rely
//! purely on `CLOAK_*` environment variables ([`from_env`]). In both paths the
//! same override and validation steps run, so a container can flip the store
//! backend or TTL without touching the file.

use super::schema::{CloakConfig, CosmosDbConfig, KeyVaultConfig, StoreBackend};
use crate::config::secret_string;
use crate::domain::errors::CloakError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`CloakConfig`]
/// 4. Applies environment variable overrides (`CLOAK_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, TOML parsing fails,
/// a referenced environment variable is missing, or validation fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<CloakConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CloakError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        CloakError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: CloakConfig = toml::from_str(&contents)
        .map_err(|e| CloakError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config
        .validate()
        .map_err(|e| CloakError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Builds a configuration purely from `CLOAK_*` environment variables
///
/// Starts from [`CloakConfig::default()`] (memory backend, threshold 0.7,
/// 24h TTL) and applies every override. A `.env` file in the working
/// directory is honored when present.
///
/// # Errors
///
/// Returns an error if an override has an invalid value or the resulting
/// configuration fails validation.
pub fn from_env() -> Result<CloakConfig> {
    dotenvy::dotenv().ok();

    let mut config = CloakConfig::default();
    apply_env_overrides(&mut config)?;

    config
        .validate()
        .map_err(|e| CloakError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
fn substitute_env_vars(contents: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| CloakError::Configuration(format!("Invalid substitution regex: {e}")))?;

    let mut result = contents.to_string();
    for captures in re.captures_iter(contents) {
        let var_name = &captures[1];
        let placeholder = &captures[0];

        let value = std::env::var(var_name).map_err(|_| {
            CloakError::Configuration(format!(
                "Environment variable not found: {var_name} (referenced in configuration)"
            ))
        })?;

        result = result.replace(placeholder, &value);
    }

    Ok(result)
}

/// Applies `CLOAK_*` environment variable overrides
fn apply_env_overrides(config: &mut CloakConfig) -> Result<()> {
    if let Ok(val) = std::env::var("CLOAK_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Ok(val) = std::env::var("CLOAK_CONFIDENCE_THRESHOLD") {
        config.detection.confidence_threshold = val.parse().map_err(|_| {
            CloakError::Configuration(format!("Invalid CLOAK_CONFIDENCE_THRESHOLD: {val}"))
        })?;
    }

    if let Ok(val) = std::env::var("CLOAK_STORE_BACKEND") {
        config.store.backend = match val.to_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            "keyvault" => StoreBackend::KeyVault,
            "cosmosdb" => StoreBackend::CosmosDb,
            _ => {
                return Err(CloakError::Configuration(format!(
                    "Invalid CLOAK_STORE_BACKEND: {val}. Must be one of: memory, keyvault, cosmosdb"
                )))
            }
        };
    }

    if let Ok(val) = std::env::var("CLOAK_DEFAULT_TTL_HOURS") {
        config.store.default_ttl_hours = val.parse().map_err(|_| {
            CloakError::Configuration(format!("Invalid CLOAK_DEFAULT_TTL_HOURS: {val}"))
        })?;
    }

    apply_keyvault_overrides(config);
    apply_cosmosdb_overrides(config);

    if let Ok(val) = std::env::var("CLOAK_AUDIT_ENABLED") {
        config.audit.enabled = val
            .parse()
            .map_err(|_| CloakError::Configuration(format!("Invalid CLOAK_AUDIT_ENABLED: {val}")))?;
    }

    Ok(())
}

/// Overlay Key Vault settings from the environment, creating the section when
/// enough variables are present to do so
fn apply_keyvault_overrides(config: &mut CloakConfig) {
    let vault_url = std::env::var("CLOAK_KEYVAULT_URL").ok();
    let tenant_id = std::env::var("CLOAK_KEYVAULT_TENANT_ID").ok();
    let client_id = std::env::var("CLOAK_KEYVAULT_CLIENT_ID").ok();
    let client_secret = std::env::var("CLOAK_KEYVAULT_CLIENT_SECRET").ok();

    match config.store.keyvault {
        Some(ref mut kv) => {
            if let Some(v) = vault_url {
                kv.vault_url = v;
            }
            if let Some(v) = tenant_id {
                kv.tenant_id = v;
            }
            if let Some(v) = client_id {
                kv.client_id = v;
            }
            if let Some(v) = client_secret {
                kv.client_secret = secret_string(v);
            }
        }
        None => {
            if let (Some(vault_url), Some(tenant_id), Some(client_id), Some(client_secret)) =
                (vault_url, tenant_id, client_id, client_secret)
            {
                config.store.keyvault = Some(KeyVaultConfig {
                    vault_url,
                    tenant_id,
                    client_id,
                    client_secret: secret_string(client_secret),
                    secret_name_prefix: "cloak".to_string(),
                    request_timeout_seconds: 10,
                });
            }
        }
    }
}

/// Overlay Cosmos DB settings from the environment, creating the section when
/// enough variables are present to do so
fn apply_cosmosdb_overrides(config: &mut CloakConfig) {
    let endpoint = std::env::var("CLOAK_COSMOS_ENDPOINT").ok();
    let key = std::env::var("CLOAK_COSMOS_KEY").ok();

    match config.store.cosmosdb {
        Some(ref mut cosmos) => {
            if let Some(v) = endpoint {
                cosmos.endpoint = v;
            }
            if let Some(v) = key {
                cosmos.key = secret_string(v);
            }
            if let Ok(v) = std::env::var("CLOAK_COSMOS_DATABASE") {
                cosmos.database_name = v;
            }
            if let Ok(v) = std::env::var("CLOAK_COSMOS_CONTAINER") {
                cosmos.container_name = v;
            }
        }
        None => {
            if let (Some(endpoint), Some(key)) = (endpoint, key) {
                config.store.cosmosdb = Some(CosmosDbConfig {
                    endpoint,
                    key: secret_string(key),
                    database_name: std::env::var("CLOAK_COSMOS_DATABASE")
                        .unwrap_or_else(|_| "cloak".to_string()),
                    container_name: std::env::var("CLOAK_COSMOS_CONTAINER")
                        .unwrap_or_else(|_| "token_mappings".to_string()),
                    request_timeout_seconds: 5,
                });
            }
        }
    }
}

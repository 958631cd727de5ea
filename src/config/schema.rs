//! Configuration schema types
//!
//! This module defines the configuration structure for Cloak. The library is
//! configured from a TOML file, from the environment, or programmatically;
//! [`CloakConfig::default()`] yields a memory-backed configuration suitable
//! for embedding without any file at all.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Token store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Ephemeral in-process store (data lost on restart)
    #[default]
    Memory,
    /// Azure Key Vault (durable, audited, provider-expiring secrets)
    KeyVault,
    /// Azure Cosmos DB (low-latency fallback with native per-document TTL)
    CosmosDb,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::KeyVault => write!(f, "keyvault"),
            Self::CosmosDb => write!(f, "cosmosdb"),
        }
    }
}

/// Main Cloak configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CloakConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// PII detection settings
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Token store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Audit trail settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CloakConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.detection.validate()?;
        self.store.validate()?;
        self.audit.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(format!(
                "Invalid log_level '{other}'. Must be one of: trace, debug, info, warn, error"
            )),
        }
    }
}

/// PII detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum confidence a candidate needs to survive filtering.
    /// A candidate exactly at the threshold is kept.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Optional path to a pattern library TOML file overriding the built-in one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_library: Option<PathBuf>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            pattern_library: None,
        }
    }
}

impl DetectionConfig {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "confidence_threshold must be within [0.0, 1.0], got {}",
                self.confidence_threshold
            ));
        }
        if let Some(ref path) = self.pattern_library {
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                return Err(format!(
                    "pattern_library must be a TOML file: {}",
                    path.display()
                ));
            }
        }
        Ok(())
    }
}

/// Token store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which backend to construct (memory unless a durable backend is
    /// explicitly enabled)
    #[serde(default)]
    pub backend: StoreBackend,

    /// Default TTL applied to mappings stored without an explicit expiry
    #[serde(default = "default_ttl_hours")]
    pub default_ttl_hours: i64,

    /// Azure Key Vault configuration (required if backend = keyvault)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyvault: Option<KeyVaultConfig>,

    /// Azure Cosmos DB configuration (required if backend = cosmosdb)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cosmosdb: Option<CosmosDbConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            default_ttl_hours: default_ttl_hours(),
            keyvault: None,
            cosmosdb: None,
        }
    }
}

impl StoreConfig {
    fn validate(&self) -> Result<(), String> {
        if self.default_ttl_hours <= 0 {
            return Err(format!(
                "default_ttl_hours must be positive, got {}",
                self.default_ttl_hours
            ));
        }

        // Both backend sections may be present in the file; only the
        // selected one is validated.
        match self.backend {
            StoreBackend::Memory => Ok(()),
            StoreBackend::KeyVault => match self.keyvault {
                Some(ref config) => config.validate(),
                None => Err(
                    "keyvault configuration is required when store.backend = 'keyvault'"
                        .to_string(),
                ),
            },
            StoreBackend::CosmosDb => match self.cosmosdb {
                Some(ref config) => config.validate(),
                None => Err(
                    "cosmosdb configuration is required when store.backend = 'cosmosdb'"
                        .to_string(),
                ),
            },
        }
    }
}

/// Azure Key Vault store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyVaultConfig {
    /// Vault URL, e.g. `https://my-vault.vault.azure.net`
    pub vault_url: String,

    /// Azure AD tenant ID
    pub tenant_id: String,

    /// Azure AD application (client) ID
    pub client_id: String,

    /// Azure AD client secret
    pub client_secret: SecretString,

    /// Prefix for generated secret names
    #[serde(default = "default_secret_name_prefix")]
    pub secret_name_prefix: String,

    /// Per-call request timeout
    #[serde(default = "default_keyvault_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl KeyVaultConfig {
    fn validate(&self) -> Result<(), String> {
        let url = url::Url::parse(&self.vault_url)
            .map_err(|e| format!("Invalid keyvault.vault_url '{}': {e}", self.vault_url))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(format!(
                "keyvault.vault_url must be an http(s) URL, got '{}'",
                self.vault_url
            ));
        }
        if self.tenant_id.is_empty() || self.client_id.is_empty() {
            return Err("keyvault.tenant_id and keyvault.client_id are required".to_string());
        }
        use secrecy::ExposeSecret;
        if self.client_secret.expose_secret().is_empty() {
            return Err("keyvault.client_secret is required".to_string());
        }
        if self.secret_name_prefix.is_empty()
            || !self
                .secret_name_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(format!(
                "keyvault.secret_name_prefix must be non-empty [0-9a-zA-Z-], got '{}'",
                self.secret_name_prefix
            ));
        }
        if self.request_timeout_seconds == 0 {
            return Err("keyvault.request_timeout_seconds must be positive".to_string());
        }
        Ok(())
    }
}

/// Azure Cosmos DB store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosmosDbConfig {
    /// Account endpoint, e.g. `https://my-account.documents.azure.com:443/`
    pub endpoint: String,

    /// Account key
    pub key: SecretString,

    /// Database name
    #[serde(default = "default_cosmos_database")]
    pub database_name: String,

    /// Container holding token mappings (partition key `/pii_type`)
    #[serde(default = "default_cosmos_container")]
    pub container_name: String,

    /// Per-call request timeout
    #[serde(default = "default_cosmos_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl CosmosDbConfig {
    fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.endpoint)
            .map_err(|e| format!("Invalid cosmosdb.endpoint '{}': {e}", self.endpoint))?;
        use secrecy::ExposeSecret;
        if self.key.expose_secret().is_empty() {
            return Err("cosmosdb.key is required".to_string());
        }
        if self.database_name.is_empty() || self.container_name.is_empty() {
            return Err("cosmosdb.database_name and cosmosdb.container_name are required".to_string());
        }
        if self.request_timeout_seconds == 0 {
            return Err("cosmosdb.request_timeout_seconds must be positive".to_string());
        }
        Ok(())
    }
}

/// Audit trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable the append-only tokenization audit log
    #[serde(default)]
    pub enabled: bool,

    /// Path of the audit log file
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,

    /// Write JSON lines instead of plain text
    #[serde(default = "default_true")]
    pub json_format: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
            json_format: true,
        }
    }
}

impl AuditConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            return Err("audit.log_path is required when audit is enabled".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for local log files
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Log file rotation: daily or hourly
    #[serde(default = "default_rotation")]
    pub local_rotation: String,

    /// Emit JSON to the console layer (plain text otherwise)
    #[serde(default)]
    pub console_json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_rotation(),
            console_json: false,
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        match self.local_rotation.as_str() {
            "daily" | "hourly" => Ok(()),
            other => Err(format!(
                "Invalid logging.local_rotation '{other}'. Must be 'daily' or 'hourly'"
            )),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_confidence_threshold() -> f64 {
    0.7
}

fn default_ttl_hours() -> i64 {
    24
}

fn default_secret_name_prefix() -> String {
    "cloak".to_string()
}

fn default_keyvault_timeout_seconds() -> u64 {
    10
}

fn default_cosmos_database() -> String {
    "cloak".to_string()
}

fn default_cosmos_container() -> String {
    "token_mappings".to_string()
}

fn default_cosmos_timeout_seconds() -> u64 {
    5
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("logs/cloak_audit.log")
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

fn default_true() -> bool {
    true
}

//! Domain error types
//!
//! This module defines the error hierarchy for Cloak. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Cloak error type
///
/// This is the primary error type used throughout the library.
/// It wraps backend-specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum CloakError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// PII detection errors (invalid pattern library, bad regex)
    #[error("Detection error: {0}")]
    Detection(String),

    /// Token store errors (generic)
    #[error("Token store error: {0}")]
    Store(String),

    /// Azure Key Vault-related errors
    #[error("Key Vault error: {0}")]
    KeyVault(#[from] KeyVaultError),

    /// Azure Cosmos DB-related errors
    #[error("Cosmos DB error: {0}")]
    CosmosDb(#[from] CosmosDbError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Audit logging errors
    #[error("Audit error: {0}")]
    Audit(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Azure Key Vault-specific errors
///
/// Errors that occur when interacting with the Key Vault secret store.
/// These errors don't expose third-party HTTP client or SDK types.
#[derive(Debug, Error)]
pub enum KeyVaultError {
    /// Failed to connect to the vault
    #[error("Failed to connect to Key Vault: {0}")]
    ConnectionFailed(String),

    /// Azure AD authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Secret not found
    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    /// Failed to write a secret
    #[error("Failed to write secret: {0}")]
    WriteFailed(String),

    /// Failed to delete a secret
    #[error("Failed to delete secret: {0}")]
    DeleteFailed(String),

    /// Failed to list secrets
    #[error("Failed to list secrets: {0}")]
    ListFailed(String),

    /// Invalid secret name after sanitization
    #[error("Invalid secret name: {0}")]
    InvalidSecretName(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Throttling error (429)
    #[error("Request rate too large (429), retry after: {0}")]
    Throttled(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Failed to deserialize a stored mapping
    #[error("Failed to deserialize secret payload: {0}")]
    DeserializationFailed(String),
}

/// Azure Cosmos DB-specific errors
///
/// Errors that occur when interacting with the Cosmos DB token store.
/// These errors don't expose third-party SDK types.
#[derive(Debug, Error)]
pub enum CosmosDbError {
    /// Failed to connect to Cosmos DB
    #[error("Failed to connect to Cosmos DB: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Database not found
    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    /// Container not found
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Failed to insert document
    #[error("Failed to insert document: {0}")]
    InsertFailed(String),

    /// Failed to delete document
    #[error("Failed to delete document: {0}")]
    DeleteFailed(String),

    /// Failed to query documents
    #[error("Failed to query documents: {0}")]
    QueryFailed(String),

    /// Throttling error (429)
    #[error("Request rate too large (429), retry after: {0}")]
    Throttled(String),

    /// Conflict error (409) - token already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Failed to deserialize response
    #[error("Failed to deserialize response: {0}")]
    DeserializationFailed(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for CloakError {
    fn from(err: std::io::Error) -> Self {
        CloakError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for CloakError {
    fn from(err: serde_json::Error) -> Self {
        CloakError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for CloakError {
    fn from(err: toml::de::Error) -> Self {
        CloakError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloak_error_display() {
        let err = CloakError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_keyvault_error_conversion() {
        let kv_err = KeyVaultError::SecretNotFound("cloak-abc123".to_string());
        let err: CloakError = kv_err.into();
        assert!(matches!(err, CloakError::KeyVault(_)));
    }

    #[test]
    fn test_cosmosdb_error_conversion() {
        let cosmos_err = CosmosDbError::Throttled("5 seconds".to_string());
        let err: CloakError = cosmos_err.into();
        assert!(matches!(err, CloakError::CosmosDb(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: CloakError = io_err.into();
        assert!(matches!(err, CloakError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: CloakError = json_err.into();
        assert!(matches!(err, CloakError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: CloakError = toml_err.into();
        assert!(matches!(err, CloakError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_cloak_error_implements_std_error() {
        let err = CloakError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}

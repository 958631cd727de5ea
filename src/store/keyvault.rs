//! Azure Key Vault token store
//!
//! Durable backend: each mapping is stored as an individually named,
//! provider-expiring secret, giving encryption at rest and a full audit
//! trail on the vault side. Uses Azure AD authentication (client credentials
//! flow) and the Key Vault REST API directly.
//!
//! Secret names are sanitized to the vault's allowed character set
//! (`[0-9a-zA-Z-]`, max 127 chars): `{prefix}-{token hex id}`. Deletion is a
//! soft-delete followed by an asynchronous provider purge — callers must not
//! assume immediate removal.

use crate::config::KeyVaultConfig;
use crate::domain::errors::{CloakError, KeyVaultError};
use crate::domain::mapping::TokenMapping;
use crate::domain::result::Result;
use crate::store::traits::TokenStore;
use crate::tokenization::token;
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_identity::ClientSecretCredential;
use chrono::{Duration, Utc};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

const VAULT_SCOPE: &str = "https://vault.azure.net/.default";
const API_VERSION: &str = "7.4";

/// Maximum length of a Key Vault secret name
const MAX_SECRET_NAME_LEN: usize = 127;

/// How the store authenticates against the vault
enum VaultCredential {
    /// Azure AD client credentials flow
    ClientSecret(Arc<ClientSecretCredential>),
    /// Fixed bearer token, for local emulators and tests
    Static(String),
}

/// Azure Key Vault-backed token store
pub struct KeyVaultTokenStore {
    http_client: reqwest::Client,
    vault_url: String,
    credential: VaultCredential,
    name_prefix: String,
    default_ttl: Duration,
}

impl KeyVaultTokenStore {
    /// Create a new Key Vault store from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the Azure AD credential or HTTP client cannot be
    /// created. An unreachable vault surfaces on the first store operation,
    /// not here.
    pub fn new(config: &KeyVaultConfig, default_ttl: Duration) -> Result<Self> {
        let secret =
            azure_core::credentials::Secret::new(config.client_secret.expose_secret().as_ref().to_string());

        let credential = ClientSecretCredential::new(
            &config.tenant_id,
            config.client_id.clone(),
            secret,
            None,
        )
        .map_err(|e| {
            CloakError::KeyVault(KeyVaultError::AuthenticationFailed(format!(
                "Failed to create Azure AD credential: {e}"
            )))
        })?;

        let http_client = Self::build_http_client(config.request_timeout_seconds)?;

        Ok(Self {
            http_client,
            vault_url: config.vault_url.trim_end_matches('/').to_string(),
            credential: VaultCredential::ClientSecret(credential),
            name_prefix: config.secret_name_prefix.clone(),
            default_ttl,
        })
    }

    /// Create a store that authenticates with a fixed bearer token
    ///
    /// Intended for local vault emulators and integration tests; production
    /// deployments use [`KeyVaultTokenStore::new`].
    pub fn with_bearer_token(
        vault_url: impl Into<String>,
        bearer_token: impl Into<String>,
        name_prefix: impl Into<String>,
        request_timeout_seconds: u64,
        default_ttl: Duration,
    ) -> Result<Self> {
        let vault_url: String = vault_url.into();
        Ok(Self {
            http_client: Self::build_http_client(request_timeout_seconds)?,
            vault_url: vault_url.trim_end_matches('/').to_string(),
            credential: VaultCredential::Static(bearer_token.into()),
            name_prefix: name_prefix.into(),
            default_ttl,
        })
    }

    fn build_http_client(timeout_seconds: u64) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| {
                CloakError::Configuration(format!("Failed to create HTTP client: {e}"))
            })
    }

    /// Get an Azure AD access token for the Key Vault API
    async fn access_token(&self) -> Result<String> {
        match &self.credential {
            VaultCredential::ClientSecret(credential) => {
                let token = TokenCredential::get_token(&**credential, &[VAULT_SCOPE], None)
                    .await
                    .map_err(|e| {
                        CloakError::KeyVault(KeyVaultError::AuthenticationFailed(format!(
                            "Failed to acquire Azure AD token: {e}"
                        )))
                    })?;
                Ok(token.token.secret().to_string())
            }
            VaultCredential::Static(token) => Ok(token.clone()),
        }
    }

    /// Vault secret name for a token: `{prefix}-{hex id}`
    fn secret_name(&self, token_str: &str) -> std::result::Result<String, KeyVaultError> {
        let id = token::inner_id(token_str).ok_or_else(|| {
            KeyVaultError::InvalidSecretName(format!("not a well-formed token: {token_str}"))
        })?;

        let name = format!("{}-{}", self.name_prefix, id);
        if name.len() > MAX_SECRET_NAME_LEN {
            return Err(KeyVaultError::InvalidSecretName(format!(
                "secret name exceeds {MAX_SECRET_NAME_LEN} chars: {name}"
            )));
        }
        Ok(name)
    }

    fn secret_url(&self, name: &str) -> String {
        format!("{}/secrets/{}?api-version={}", self.vault_url, name, API_VERSION)
    }

    /// Best-effort soft-delete, used when a read finds an expired secret
    async fn delete_secret_quietly(&self, name: &str) {
        if let Ok(access) = self.access_token().await {
            let _ = self
                .http_client
                .delete(self.secret_url(name))
                .bearer_auth(access)
                .send()
                .await;
        }
    }
}

/// Secret payload returned by the vault
#[derive(Debug, Deserialize)]
struct SecretBundle {
    value: String,
    #[serde(default)]
    attributes: Option<SecretAttributes>,
}

#[derive(Debug, Default, Deserialize)]
struct SecretAttributes {
    /// Expiry as seconds since the epoch
    exp: Option<i64>,
}

/// One page of the secret list endpoint
#[derive(Debug, Deserialize)]
struct SecretListPage {
    #[serde(default)]
    value: Vec<SecretListItem>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SecretListItem {
    /// Full secret identifier URL; the name is the last path segment
    id: String,
    #[serde(default)]
    attributes: Option<SecretAttributes>,
}

#[async_trait]
impl TokenStore for KeyVaultTokenStore {
    async fn store(&self, mapping: &TokenMapping) -> Result<bool> {
        let stamped = self.stamp_expiry(mapping);
        let name = self.secret_name(&stamped.token).map_err(CloakError::KeyVault)?;
        let access = self.access_token().await?;

        let payload = json!({
            "value": serde_json::to_string(&stamped)?,
            "attributes": {
                "enabled": true,
                "exp": stamped.expires_at.map(|t| t.timestamp()),
            },
            "tags": {
                "pii_type": stamped.pii_type.label(),
            },
        });

        let response = self
            .http_client
            .put(self.secret_url(&name))
            .bearer_auth(access)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CloakError::KeyVault(KeyVaultError::Timeout(format!("set secret {name}: {e}")))
                } else {
                    CloakError::KeyVault(KeyVaultError::ConnectionFailed(e.to_string()))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(secret = %name, pii_type = %stamped.pii_type, "Stored token mapping");
            return Ok(true);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &name, &body))
    }

    async fn retrieve(&self, token_str: &str) -> Result<Option<TokenMapping>> {
        let name = match self.secret_name(token_str) {
            Ok(name) => name,
            Err(_) => {
                debug!("Lookup for malformed token treated as not-found");
                return Ok(None);
            }
        };
        let access = self.access_token().await?;

        let response = match self
            .http_client
            .get(self.secret_url(&name))
            .bearer_auth(access)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!(secret = %name, "Key Vault lookup timed out, treating as not-found");
                return Ok(None);
            }
            Err(e) => {
                return Err(CloakError::KeyVault(KeyVaultError::ConnectionFailed(
                    e.to_string(),
                )))
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &name, &body));
        }

        let bundle: SecretBundle = response.json().await.map_err(|e| {
            CloakError::KeyVault(KeyVaultError::DeserializationFailed(e.to_string()))
        })?;

        let mapping: TokenMapping = serde_json::from_str(&bundle.value).map_err(|e| {
            CloakError::KeyVault(KeyVaultError::DeserializationFailed(e.to_string()))
        })?;

        // The vault keeps expired secrets readable; enforce expiry lazily
        let now = Utc::now();
        let attr_expired = bundle
            .attributes
            .and_then(|a| a.exp)
            .map(|exp| exp <= now.timestamp())
            .unwrap_or(false);

        if attr_expired || mapping.is_expired(now) {
            debug!(secret = %name, "Expired mapping treated as not-found");
            self.delete_secret_quietly(&name).await;
            return Ok(None);
        }

        Ok(Some(mapping))
    }

    async fn delete(&self, token_str: &str) -> Result<bool> {
        let name = match self.secret_name(token_str) {
            Ok(name) => name,
            Err(_) => return Ok(false),
        };
        let access = self.access_token().await?;

        let response = self
            .http_client
            .delete(self.secret_url(&name))
            .bearer_auth(access)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CloakError::KeyVault(KeyVaultError::Timeout(format!(
                        "delete secret {name}: {e}"
                    )))
                } else {
                    CloakError::KeyVault(KeyVaultError::ConnectionFailed(e.to_string()))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &name, &body));
        }

        debug!(secret = %name, "Soft-deleted token mapping");
        Ok(true)
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        let access = self.access_token().await?;
        let prefix = format!("{}-", self.name_prefix);
        let now = Utc::now().timestamp();
        let mut removed = 0usize;

        let mut page_url = format!(
            "{}/secrets?api-version={}&maxresults=25",
            self.vault_url, API_VERSION
        );

        loop {
            let response = self
                .http_client
                .get(&page_url)
                .bearer_auth(&access)
                .send()
                .await
                .map_err(|e| {
                    CloakError::KeyVault(KeyVaultError::ListFailed(e.to_string()))
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(classify_status(status, "list", &body));
            }

            let page: SecretListPage = response.json().await.map_err(|e| {
                CloakError::KeyVault(KeyVaultError::DeserializationFailed(e.to_string()))
            })?;

            for item in page.value {
                let name = match item.id.rsplit('/').next() {
                    Some(name) => name.to_string(),
                    None => continue,
                };
                if !name.starts_with(&prefix) {
                    continue;
                }

                let expired = item
                    .attributes
                    .and_then(|a| a.exp)
                    .map(|exp| exp <= now)
                    .unwrap_or(false);

                if expired {
                    self.delete_secret_quietly(&name).await;
                    removed += 1;
                }
            }

            match page.next_link {
                Some(next) => page_url = next,
                None => break,
            }
        }

        if removed > 0 {
            debug!(removed, "Swept expired vault secrets");
        }
        Ok(removed)
    }

    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn backend_name(&self) -> &'static str {
        "keyvault"
    }
}

/// Map a non-success vault status to a domain error
fn classify_status(status: reqwest::StatusCode, name: &str, body: &str) -> CloakError {
    let error = match status.as_u16() {
        401 | 403 => KeyVaultError::AuthenticationFailed(format!("{status} for {name}: {body}")),
        429 => KeyVaultError::Throttled(body.to_string()),
        500..=599 => KeyVaultError::ServerError {
            status: status.as_u16(),
            message: body.to_string(),
        },
        _ => KeyVaultError::ClientError {
            status: status.as_u16(),
            message: format!("{name}: {body}"),
        },
    };
    CloakError::KeyVault(error)
}

//! Token store abstraction
//!
//! This module defines the trait that storage backends must implement to
//! persist token-to-value mappings. All backends share the same expiration
//! contract: a mapping stored without an explicit expiry gets the backend's
//! default TTL stamped in, and `retrieve()` treats an expired mapping as
//! not-found (backends without native TTL purge lazily on read).

use crate::domain::mapping::TokenMapping;
use crate::domain::result::Result;
use crate::tokenization::token;
use async_trait::async_trait;
use chrono::{Duration, Utc};

/// Storage backend for token mappings
///
/// Mappings are write-once: a token is never updated after it is stored,
/// only deleted or expired, and tokens are never recycled.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist a mapping
    ///
    /// Returns `Ok(true)` when the mapping was stored, `Ok(false)` when the
    /// backend rejected it without failing (e.g. the token already exists,
    /// which would violate write-once semantics).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or the write fails.
    async fn store(&self, mapping: &TokenMapping) -> Result<bool>;

    /// Look up a mapping by token
    ///
    /// Returns `Ok(None)` for unknown, expired, or timed-out lookups —
    /// a network timeout surfaces as not-found, never as a hang.
    ///
    /// # Errors
    ///
    /// Returns an error for backend failures other than "not found".
    async fn retrieve(&self, token: &str) -> Result<Option<TokenMapping>>;

    /// Remove a mapping
    ///
    /// Returns `Ok(true)` if a mapping was deleted, `Ok(false)` if the token
    /// was unknown. Deletion may be asynchronous on the backend side
    /// (soft-delete then purge) — callers must not assume immediate removal.
    async fn delete(&self, token: &str) -> Result<bool>;

    /// Proactively remove expired mappings
    ///
    /// Returns the number of mappings removed. Backends with native TTL may
    /// remove little or nothing here since the provider expires documents
    /// itself.
    async fn cleanup_expired(&self) -> Result<usize>;

    /// Generate a fresh globally-unique token in the fixed lexical format
    fn generate_token(&self) -> String {
        token::generate()
    }

    /// TTL applied to mappings stored without an explicit expiry
    fn default_ttl(&self) -> Duration;

    /// Short backend identifier for logging
    fn backend_name(&self) -> &'static str;

    /// Copy of `mapping` with `expires_at` stamped from the default TTL if unset
    fn stamp_expiry(&self, mapping: &TokenMapping) -> TokenMapping {
        let mut stamped = mapping.clone();
        if stamped.expires_at.is_none() {
            stamped.expires_at = Some(Utc::now() + self.default_ttl());
        }
        stamped
    }
}

//! Token mapping model
//!
//! A [`TokenMapping`] is the stored association between an opaque token and
//! the PII value it replaced. Mappings are write-once: a token is never
//! updated after it is stored, only deleted or expired.

use crate::domain::pii::PiiType;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Stored token-to-value association
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMapping {
    /// Globally unique opaque token (immutable once stored)
    pub token: String,

    /// The original PII value the token stands in for
    pub original_value: String,

    /// Category of the replaced value
    pub pii_type: PiiType,

    /// When the mapping was created
    pub created_at: DateTime<Utc>,

    /// When the mapping expires; `None` means the store applies its default TTL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Optional grouping key (conversation/session), used for correlation only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

impl TokenMapping {
    /// Create a new mapping with no explicit expiry
    pub fn new(token: impl Into<String>, original_value: impl Into<String>, pii_type: PiiType) -> Self {
        Self {
            token: token.into(),
            original_value: original_value.into(),
            pii_type,
            created_at: Utc::now(),
            expires_at: None,
            context_id: None,
        }
    }

    /// Set an explicit expiry instant
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the expiry relative to creation time
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.expires_at = Some(self.created_at + ttl);
        self
    }

    /// Attach a grouping key
    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    /// Whether the mapping has expired as of `now`
    ///
    /// A mapping without an expiry instant never expires by itself; the store
    /// stamps one from its default TTL before persisting.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_builder() {
        let mapping = TokenMapping::new("[PII_0123]", "john@example.com", PiiType::Email)
            .with_ttl(Duration::hours(24))
            .with_context_id("conv-42");

        assert_eq!(mapping.pii_type, PiiType::Email);
        assert_eq!(mapping.context_id.as_deref(), Some("conv-42"));
        assert_eq!(
            mapping.expires_at,
            Some(mapping.created_at + Duration::hours(24))
        );
    }

    #[test]
    fn test_is_expired() {
        let mapping = TokenMapping::new("[PII_0123]", "555-123-4567", PiiType::Phone)
            .with_ttl(Duration::hours(1));

        let now = mapping.created_at;
        assert!(!mapping.is_expired(now));
        assert!(mapping.is_expired(now + Duration::hours(2)));
        // Boundary: an expiry instant that has arrived counts as expired
        assert!(mapping.is_expired(now + Duration::hours(1)));
    }

    #[test]
    fn test_no_expiry_never_expires() {
        let mapping = TokenMapping::new("[PII_0123]", "94110", PiiType::ZipCode);
        assert!(!mapping.is_expired(Utc::now() + Duration::days(3650)));
    }

    #[test]
    fn test_mapping_serde_round_trip() {
        let mapping = TokenMapping::new("[PII_0123]", "ORD-ABC123456", PiiType::OrderId)
            .with_ttl(Duration::hours(24));

        let json = serde_json::to_string(&mapping).unwrap();
        let back: TokenMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mapping);
    }
}

//! PII tokenizer
//!
//! Replaces detected PII spans with opaque tokens before text leaves the
//! trust boundary, persisting one mapping per span through the configured
//! [`TokenStore`]. A failed store write skips that one span (the text is
//! left unmodified there) rather than aborting the call.

use crate::detection::PiiDetector;
use crate::domain::errors::CloakError;
use crate::domain::mapping::TokenMapping;
use crate::domain::outcome::TokenizationResult;
use crate::domain::pii::{PiiCandidate, PiiType};
use crate::domain::result::Result;
use crate::store::TokenStore;
use crate::tokenization::audit::AuditLogger;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Conversational message fields scanned by
/// [`tokenize_message`](PiiTokenizer::tokenize_message)
pub const MESSAGE_FIELDS: &[&str] = &[
    "content",
    "message",
    "subject",
    "customer_name",
    "customer_email",
    "customer_phone",
    "order_id",
    "tracking_number",
    "notes",
];

/// Replaces PII spans with stored tokens
///
/// Thread-safe: detection is pure and all store access goes through the
/// injected [`TokenStore`], so one tokenizer can serve concurrent calls.
pub struct PiiTokenizer {
    detector: Arc<PiiDetector>,
    store: Arc<dyn TokenStore>,
    audit_logger: Option<AuditLogger>,
}

impl PiiTokenizer {
    /// Create a tokenizer over an injected detector and store
    pub fn new(detector: Arc<PiiDetector>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            detector,
            store,
            audit_logger: None,
        }
    }

    /// Attach an audit logger recording hashed detections per call
    pub fn with_audit_logger(mut self, audit_logger: AuditLogger) -> Self {
        self.audit_logger = Some(audit_logger);
        self
    }

    /// Tokenize PII in free text
    ///
    /// Detects PII spans (optionally restricted to `pii_types`), stores one
    /// mapping per span, and substitutes tokens right-to-left so offsets of
    /// not-yet-processed spans stay valid. Text without detections is
    /// returned unchanged with zero store calls.
    ///
    /// # Errors
    ///
    /// Returns an error if audit logging fails. A store failure for a
    /// single span is recovered locally: the span is skipped with a warning.
    pub async fn tokenize(
        &self,
        text: &str,
        context_id: Option<&str>,
        pii_types: Option<&[PiiType]>,
    ) -> Result<TokenizationResult> {
        let start = Instant::now();

        let mut candidates = self.detector.detect(text);
        if let Some(filter) = pii_types {
            candidates.retain(|candidate| filter.contains(&candidate.pii_type));
        }

        if candidates.is_empty() {
            return Ok(TokenizationResult::unchanged(
                text.to_string(),
                context_id.map(str::to_string),
                start.elapsed().as_millis() as u64,
            ));
        }

        // One store call per retained candidate, in detection order
        let mut stored: Vec<(PiiCandidate, String)> = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let token = self.store.generate_token();
            let mut mapping =
                TokenMapping::new(&token, &candidate.value, candidate.pii_type);
            if let Some(context_id) = context_id {
                mapping = mapping.with_context_id(context_id);
            }

            match self.store.store(&mapping).await {
                Ok(true) => stored.push((candidate.clone(), token)),
                Ok(false) => {
                    warn!(
                        pii_type = %candidate.pii_type,
                        "Store rejected mapping, leaving span unmodified"
                    );
                }
                Err(e) => {
                    warn!(
                        pii_type = %candidate.pii_type,
                        error = %e,
                        "Failed to store mapping, leaving span unmodified"
                    );
                }
            }
        }

        // Substitute from highest start offset to lowest so earlier edits
        // never shift offsets of spans still to be processed
        let mut tokenized = text.to_string();
        for (candidate, token) in stored.iter().rev() {
            tokenized.replace_range(candidate.start..candidate.end, token);
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;

        if let Some(ref audit_logger) = self.audit_logger {
            audit_logger
                .log_tokenization(context_id, &candidates, stored.len(), processing_time_ms)
                .map_err(|e| CloakError::Audit(e.to_string()))?;
        }

        let tokens_created: Vec<String> =
            stored.iter().map(|(_, token)| token.clone()).collect();
        let token_mappings: HashMap<String, PiiType> = stored
            .iter()
            .map(|(candidate, token)| (token.clone(), candidate.pii_type))
            .collect();

        debug!(
            detections = candidates.len(),
            tokens = tokens_created.len(),
            backend = self.store.backend_name(),
            "Tokenized text"
        );

        Ok(TokenizationResult {
            original_text: text.to_string(),
            tokenized_text: tokenized,
            tokens_created,
            pii_fields_found: candidates.len(),
            token_mappings,
            processing_time_ms,
            context_id: context_id.map(str::to_string),
        })
    }

    /// Tokenize named string fields of a JSON object
    ///
    /// Only top-level string-valued fields are scanned; `fields` defaults to
    /// all of them. Returns a shallow copy of the object with tokenized
    /// fields substituted plus one aggregated result whose text fields hold
    /// the serialized object before and after.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not a JSON object.
    pub async fn tokenize_dict(
        &self,
        data: &Value,
        context_id: Option<&str>,
        fields: Option<&[&str]>,
    ) -> Result<(Value, TokenizationResult)> {
        let start = Instant::now();

        let object = data.as_object().ok_or_else(|| {
            CloakError::Validation("tokenize_dict expects a JSON object".to_string())
        })?;

        let mut output = object.clone();
        let mut tokens_created = Vec::new();
        let mut token_mappings = HashMap::new();
        let mut pii_fields_found = 0usize;

        let target_fields: Vec<String> = match fields {
            Some(fields) => fields.iter().map(|f| f.to_string()).collect(),
            None => object.keys().cloned().collect(),
        };

        for field in &target_fields {
            let Some(Value::String(field_value)) = object.get(field) else {
                continue;
            };

            let result = self.tokenize(field_value, context_id, None).await?;
            if result.has_tokens() {
                output.insert(field.clone(), Value::String(result.tokenized_text));
                tokens_created.extend(result.tokens_created);
                token_mappings.extend(result.token_mappings);
            }
            pii_fields_found += result.pii_fields_found;
        }

        let original_text = serde_json::to_string(data)?;
        let output = Value::Object(output);
        let tokenized_text = serde_json::to_string(&output)?;

        let result = TokenizationResult {
            original_text,
            tokenized_text,
            tokens_created,
            pii_fields_found,
            token_mappings,
            processing_time_ms: start.elapsed().as_millis() as u64,
            context_id: context_id.map(str::to_string),
        };

        Ok((output, result))
    }

    /// Tokenize the conversational fields of a message-shaped object
    ///
    /// Convenience wrapper over [`tokenize_dict`](Self::tokenize_dict) with
    /// the fixed [`MESSAGE_FIELDS`] allowlist.
    pub async fn tokenize_message(
        &self,
        message: &Value,
        context_id: Option<&str>,
    ) -> Result<(Value, TokenizationResult)> {
        self.tokenize_dict(message, context_id, Some(MESSAGE_FIELDS))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTokenStore;
    use serde_json::json;

    fn tokenizer() -> (PiiTokenizer, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::new());
        let detector = Arc::new(PiiDetector::new().unwrap());
        (
            PiiTokenizer::new(detector, Arc::clone(&store) as Arc<dyn TokenStore>),
            store,
        )
    }

    #[tokio::test]
    async fn test_tokenize_replaces_spans() {
        let (tokenizer, store) = tokenizer();

        let result = tokenizer
            .tokenize("Contact john.doe@example.com for help", None, None)
            .await
            .unwrap();

        assert_eq!(result.pii_fields_found, 1);
        assert_eq!(result.tokens_created.len(), 1);
        assert!(!result.tokenized_text.contains("john.doe@example.com"));
        assert!(result.tokenized_text.starts_with("Contact [PII_"));
        assert!(result.tokenized_text.ends_with(" for help"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_tokenize_clean_text_is_unchanged() {
        let (tokenizer, store) = tokenizer();

        let result = tokenizer
            .tokenize("nothing sensitive here", None, None)
            .await
            .unwrap();

        assert_eq!(result.original_text, result.tokenized_text);
        assert_eq!(result.pii_fields_found, 0);
        assert!(result.tokens_created.is_empty());
        assert_eq!(store.len().await, 0, "no store calls for clean text");
    }

    #[tokio::test]
    async fn test_tokenize_same_value_twice_yields_distinct_tokens() {
        let (tokenizer, _) = tokenizer();

        let first = tokenizer
            .tokenize("mail me: a@example.com", None, None)
            .await
            .unwrap();
        let second = tokenizer
            .tokenize("mail me: a@example.com", None, None)
            .await
            .unwrap();

        assert_ne!(first.tokens_created[0], second.tokens_created[0]);
    }

    #[tokio::test]
    async fn test_tokenize_type_filter() {
        let (tokenizer, _) = tokenizer();
        let text = "Email a@example.com about order ORD-ABC123456";

        let result = tokenizer
            .tokenize(text, None, Some(&[PiiType::OrderId]))
            .await
            .unwrap();

        assert_eq!(result.pii_fields_found, 1);
        assert!(result.tokenized_text.contains("a@example.com"));
        assert!(!result.tokenized_text.contains("ORD-ABC123456"));
    }

    #[tokio::test]
    async fn test_tokenize_attaches_context_id() {
        let (tokenizer, store) = tokenizer();

        let result = tokenizer
            .tokenize("email a@example.com", Some("conv-42"), None)
            .await
            .unwrap();

        assert_eq!(result.context_id.as_deref(), Some("conv-42"));
        let mapping = store
            .retrieve(&result.tokens_created[0])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mapping.context_id.as_deref(), Some("conv-42"));
    }

    #[tokio::test]
    async fn test_tokenize_multiple_spans_preserves_surroundings() {
        let (tokenizer, _) = tokenizer();
        let text = "Contact john.doe@example.com for help with order ORD-ABC123456";

        let result = tokenizer.tokenize(text, None, None).await.unwrap();

        assert_eq!(result.pii_fields_found, 2);
        assert_eq!(result.tokens_created.len(), 2);
        assert!(result.tokenized_text.starts_with("Contact [PII_"));
        assert!(result
            .tokenized_text
            .contains("] for help with order [PII_"));
        // Tokens map back to the right categories
        let types: Vec<PiiType> = result
            .tokens_created
            .iter()
            .map(|t| result.token_mappings[t])
            .collect();
        assert_eq!(types, vec![PiiType::Email, PiiType::OrderId]);
    }

    #[tokio::test]
    async fn test_tokenize_dict_named_fields() {
        let (tokenizer, _) = tokenizer();
        let data = json!({
            "customer_email": "a@example.com",
            "note": "email b@example.com",
            "count": 3,
        });

        let (output, result) = tokenizer
            .tokenize_dict(&data, None, Some(&["customer_email"]))
            .await
            .unwrap();

        assert!(output["customer_email"].as_str().unwrap().starts_with("[PII_"));
        // Untargeted fields pass through untouched
        assert_eq!(output["note"], data["note"]);
        assert_eq!(output["count"], data["count"]);
        assert_eq!(result.tokens_created.len(), 1);
    }

    #[tokio::test]
    async fn test_tokenize_dict_defaults_to_all_string_fields() {
        let (tokenizer, _) = tokenizer();
        let data = json!({
            "a": "email x@example.com",
            "b": "email y@example.com",
        });

        let (output, result) = tokenizer.tokenize_dict(&data, None, None).await.unwrap();

        assert!(!output["a"].as_str().unwrap().contains("x@example.com"));
        assert!(!output["b"].as_str().unwrap().contains("y@example.com"));
        assert_eq!(result.tokens_created.len(), 2);
    }

    #[tokio::test]
    async fn test_tokenize_dict_rejects_non_object() {
        let (tokenizer, _) = tokenizer();
        let err = tokenizer
            .tokenize_dict(&json!("just a string"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CloakError::Validation(_)));
    }

    #[tokio::test]
    async fn test_tokenize_message_allowlist() {
        let (tokenizer, _) = tokenizer();
        let message = json!({
            "content": "my email is support@example.com",
            "customer_email": "jane@example.com",
            "internal_debug": "email hidden@example.com",
        });

        let (output, _) = tokenizer.tokenize_message(&message, None).await.unwrap();

        assert!(!output["content"].as_str().unwrap().contains("support@example.com"));
        assert!(!output["customer_email"].as_str().unwrap().contains("jane@example.com"));
        // Fields outside the allowlist are not scanned
        assert_eq!(output["internal_debug"], message["internal_debug"]);
    }

    #[tokio::test]
    async fn test_store_failure_skips_span() {
        use crate::domain::errors::CosmosDbError;
        use async_trait::async_trait;
        use chrono::Duration;

        /// Store that fails every write
        struct FailingStore;

        #[async_trait]
        impl TokenStore for FailingStore {
            async fn store(&self, _mapping: &TokenMapping) -> Result<bool> {
                Err(CloakError::CosmosDb(CosmosDbError::InsertFailed(
                    "injected".to_string(),
                )))
            }
            async fn retrieve(&self, _token: &str) -> Result<Option<TokenMapping>> {
                Ok(None)
            }
            async fn delete(&self, _token: &str) -> Result<bool> {
                Ok(false)
            }
            async fn cleanup_expired(&self) -> Result<usize> {
                Ok(0)
            }
            fn default_ttl(&self) -> Duration {
                Duration::hours(1)
            }
            fn backend_name(&self) -> &'static str {
                "failing"
            }
        }

        let detector = Arc::new(PiiDetector::new().unwrap());
        let tokenizer = PiiTokenizer::new(detector, Arc::new(FailingStore));

        let text = "Contact john.doe@example.com now";
        let result = tokenizer.tokenize(text, None, None).await.unwrap();

        // The failed span is left unmodified and the call still succeeds
        assert_eq!(result.pii_fields_found, 1);
        assert!(result.tokens_created.is_empty());
        assert_eq!(result.tokenized_text, text);
    }
}

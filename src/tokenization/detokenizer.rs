//! PII detokenizer
//!
//! Restores original values in text returned from the external service.
//! Tokens are unique, non-overlapping, fixed-format strings, so substitution
//! is plain string replacement; tokens with no resolvable mapping (expired
//! or never issued) stay in the output and are reported, never thrown.

use crate::domain::mapping::TokenMapping;
use crate::domain::outcome::DetokenizationResult;
use crate::domain::result::Result;
use crate::store::TokenStore;
use crate::tokenization::token;
use futures::future;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Outbound response fields scanned by
/// [`detokenize_response`](PiiDetokenizer::detokenize_response)
pub const RESPONSE_FIELDS: &[&str] = &[
    "response",
    "message",
    "content",
    "reply",
    "suggested_response",
];

/// Restores PII values for tokens found in text
pub struct PiiDetokenizer {
    store: Arc<dyn TokenStore>,
}

impl PiiDetokenizer {
    /// Create a detokenizer over an injected store
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Whether the text contains at least one well-formed token
    ///
    /// Pure pattern matching, no store access.
    pub fn contains_tokens(text: &str) -> bool {
        token::token_pattern().is_match(text)
    }

    /// All well-formed tokens in the text, deduplicated in first-seen order
    ///
    /// Pure pattern matching, no store access.
    pub fn extract_tokens(text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut tokens = Vec::new();
        for matched in token::token_pattern().find_iter(text) {
            let candidate = matched.as_str();
            if seen.insert(candidate.to_string()) {
                tokens.push(candidate.to_string());
            }
        }
        tokens
    }

    /// Restore original values for every resolvable token in the text
    ///
    /// Lookups are batched and bounded to the number of distinct tokens.
    /// A token that does not resolve — expired, never issued, or a store
    /// lookup failure — is left untouched in the output and reported in
    /// `tokens_not_found`, preserving visibility into data loss rather than
    /// risking an incorrect substitution.
    pub async fn detokenize(&self, text: &str) -> Result<DetokenizationResult> {
        let start = Instant::now();

        let tokens = Self::extract_tokens(text);
        if tokens.is_empty() {
            return Ok(DetokenizationResult {
                tokenized_text: text.to_string(),
                detokenized_text: text.to_string(),
                tokens_resolved: 0,
                tokens_not_found: Vec::new(),
                processing_time_ms: start.elapsed().as_millis() as u64,
            });
        }

        let (resolved, tokens_not_found) = self.resolve_tokens(&tokens).await;

        let mut detokenized = text.to_string();
        for (token_str, original_value) in &resolved {
            detokenized = detokenized.replace(token_str.as_str(), original_value);
        }

        debug!(
            tokens = tokens.len(),
            resolved = resolved.len(),
            not_found = tokens_not_found.len(),
            "Detokenized text"
        );

        Ok(DetokenizationResult {
            tokenized_text: text.to_string(),
            detokenized_text: detokenized,
            tokens_resolved: resolved.len(),
            tokens_not_found,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Restore values in named string fields of a JSON object
    ///
    /// The union of tokens across all target fields is resolved in one
    /// batched set of lookups before substituting per field, bounding I/O to
    /// the number of distinct tokens rather than field occurrences.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not a JSON object.
    pub async fn detokenize_dict(
        &self,
        data: &Value,
        fields: Option<&[&str]>,
    ) -> Result<(Value, DetokenizationResult)> {
        let start = Instant::now();

        let object = data.as_object().ok_or_else(|| {
            crate::domain::errors::CloakError::Validation(
                "detokenize_dict expects a JSON object".to_string(),
            )
        })?;

        let target_fields: Vec<String> = match fields {
            Some(fields) => fields.iter().map(|f| f.to_string()).collect(),
            None => object.keys().cloned().collect(),
        };

        // Union of tokens across all target fields, first-seen order
        let mut seen = HashSet::new();
        let mut tokens = Vec::new();
        for field in &target_fields {
            if let Some(Value::String(field_value)) = object.get(field) {
                for token_str in Self::extract_tokens(field_value) {
                    if seen.insert(token_str.clone()) {
                        tokens.push(token_str);
                    }
                }
            }
        }

        let tokenized_text = serde_json::to_string(data)?;

        if tokens.is_empty() {
            return Ok((
                data.clone(),
                DetokenizationResult {
                    detokenized_text: tokenized_text.clone(),
                    tokenized_text,
                    tokens_resolved: 0,
                    tokens_not_found: Vec::new(),
                    processing_time_ms: start.elapsed().as_millis() as u64,
                },
            ));
        }

        let (resolved, tokens_not_found) = self.resolve_tokens(&tokens).await;

        let mut output = object.clone();
        for field in &target_fields {
            let Some(Value::String(field_value)) = object.get(field) else {
                continue;
            };
            let mut restored = field_value.clone();
            for (token_str, original_value) in &resolved {
                restored = restored.replace(token_str.as_str(), original_value);
            }
            output.insert(field.clone(), Value::String(restored));
        }

        let output = Value::Object(output);
        let detokenized_text = serde_json::to_string(&output)?;

        let result = DetokenizationResult {
            tokenized_text,
            detokenized_text,
            tokens_resolved: resolved.len(),
            tokens_not_found,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        Ok((output, result))
    }

    /// Restore values in the outbound fields of a response-shaped object
    ///
    /// Convenience wrapper over [`detokenize_dict`](Self::detokenize_dict)
    /// with the fixed [`RESPONSE_FIELDS`] allowlist.
    pub async fn detokenize_response(
        &self,
        response: &Value,
    ) -> Result<(Value, DetokenizationResult)> {
        self.detokenize_dict(response, Some(RESPONSE_FIELDS)).await
    }

    /// Resolve distinct tokens concurrently against the store
    ///
    /// Returns the token-to-value map for resolvable tokens and the list of
    /// tokens that did not resolve (lookup failures count as unresolved).
    async fn resolve_tokens(&self, tokens: &[String]) -> (HashMap<String, String>, Vec<String>) {
        let lookups = tokens.iter().map(|token_str| self.store.retrieve(token_str));
        let results: Vec<Result<Option<TokenMapping>>> = future::join_all(lookups).await;

        let mut resolved = HashMap::new();
        let mut not_found = Vec::new();

        for (token_str, result) in tokens.iter().zip(results) {
            match result {
                Ok(Some(mapping)) => {
                    resolved.insert(token_str.clone(), mapping.original_value);
                }
                Ok(None) => not_found.push(token_str.clone()),
                Err(e) => {
                    warn!(error = %e, "Token lookup failed, leaving token in place");
                    not_found.push(token_str.clone());
                }
            }
        }

        (resolved, not_found)
    }
}

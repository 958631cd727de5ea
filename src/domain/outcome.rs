//! Tokenization and detokenization call results

use crate::domain::pii::PiiType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of a single `tokenize()` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizationResult {
    /// The input text, untouched
    pub original_text: String,

    /// The input with every stored PII span replaced by its token
    pub tokenized_text: String,

    /// Tokens issued by this call, in detection order
    pub tokens_created: Vec<String>,

    /// Number of PII spans the detector found (after any type filter);
    /// can exceed `tokens_created.len()` when a store write was skipped
    pub pii_fields_found: usize,

    /// Token to category map for the tokens issued by this call
    pub token_mappings: HashMap<String, PiiType>,

    /// Wall-clock processing time
    pub processing_time_ms: u64,

    /// Grouping key attached to the stored mappings, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

impl TokenizationResult {
    /// A result for text in which nothing was detected
    pub fn unchanged(text: String, context_id: Option<String>, processing_time_ms: u64) -> Self {
        Self {
            tokenized_text: text.clone(),
            original_text: text,
            tokens_created: Vec::new(),
            pii_fields_found: 0,
            token_mappings: HashMap::new(),
            processing_time_ms,
            context_id,
        }
    }

    /// Whether any PII was replaced
    pub fn has_tokens(&self) -> bool {
        !self.tokens_created.is_empty()
    }
}

/// Outcome of a single `detokenize()` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetokenizationResult {
    /// The input text, untouched
    pub tokenized_text: String,

    /// The input with every resolvable token restored to its original value
    pub detokenized_text: String,

    /// Number of distinct tokens that resolved to a stored mapping
    pub tokens_resolved: usize,

    /// Distinct tokens with no resolvable mapping (expired or never issued),
    /// left in place in the output
    pub tokens_not_found: Vec<String>,

    /// Wall-clock processing time
    pub processing_time_ms: u64,
}

impl DetokenizationResult {
    /// Whether every token found in the input was resolved
    pub fn fully_resolved(&self) -> bool {
        self.tokens_not_found.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_result() {
        let result = TokenizationResult::unchanged("no pii here".to_string(), None, 1);
        assert_eq!(result.original_text, result.tokenized_text);
        assert_eq!(result.pii_fields_found, 0);
        assert!(!result.has_tokens());
    }

    #[test]
    fn test_fully_resolved() {
        let result = DetokenizationResult {
            tokenized_text: "t".to_string(),
            detokenized_text: "t".to_string(),
            tokens_resolved: 2,
            tokens_not_found: Vec::new(),
            processing_time_ms: 0,
        };
        assert!(result.fully_resolved());
    }
}

//! Pattern library for PII detection

use crate::domain::pii::PiiType;
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// Pattern definition from TOML
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PatternDefinition {
    /// Regex patterns for this group
    pub patterns: Vec<String>,
    /// Base confidence score (0.0 - 1.0)
    pub confidence: f64,
    /// PII category label
    pub category: String,
    /// Keywords that boost confidence when found near a match
    #[serde(default)]
    pub context_keywords: Vec<String>,
}

/// Compiled pattern with metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Compiled regex
    pub regex: Regex,
    /// PII category
    pub pii_type: PiiType,
    /// Base confidence score
    pub confidence: f64,
}

/// Pattern library container
#[derive(Debug, serde::Deserialize)]
struct PatternLibrary {
    patterns: HashMap<String, PatternDefinition>,
}

/// Pattern registry for PII detection
///
/// Holds every compiled pattern plus a per-category index and the context
/// keyword lists used for confidence boosting.
pub struct PatternRegistry {
    patterns: Vec<CompiledPattern>,
    patterns_by_type: HashMap<PiiType, Vec<CompiledPattern>>,
    keywords_by_type: HashMap<PiiType, Vec<String>>,
}

impl PatternRegistry {
    /// Create a new pattern registry from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read pattern library: {}",
                path.as_ref().display()
            )
        })?;

        Self::from_toml(&content)
    }

    /// Create a pattern registry from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let library: PatternLibrary =
            toml::from_str(content).context("Failed to parse pattern library TOML")?;

        let mut patterns = Vec::new();
        let mut patterns_by_type: HashMap<PiiType, Vec<CompiledPattern>> = HashMap::new();
        let mut keywords_by_type: HashMap<PiiType, Vec<String>> = HashMap::new();

        for (name, def) in library.patterns {
            let pii_type = PiiType::parse(&def.category).with_context(|| {
                format!("Invalid category in pattern '{}': {}", name, def.category)
            })?;

            if !(0.0..=1.0).contains(&def.confidence) {
                anyhow::bail!(
                    "Confidence out of range in pattern '{}': {}",
                    name,
                    def.confidence
                );
            }

            for pattern_str in &def.patterns {
                let regex = Regex::new(pattern_str)
                    .with_context(|| format!("Invalid regex in pattern '{name}': {pattern_str}"))?;

                let compiled = CompiledPattern {
                    regex,
                    pii_type,
                    confidence: def.confidence,
                };

                patterns.push(compiled.clone());
                patterns_by_type
                    .entry(pii_type)
                    .or_default()
                    .push(compiled);
            }

            // Keyword lists from groups sharing a category are merged
            let keywords = keywords_by_type.entry(pii_type).or_default();
            for keyword in &def.context_keywords {
                let lowered = keyword.to_lowercase();
                if !keywords.contains(&lowered) {
                    keywords.push(lowered);
                }
            }
        }

        Ok(Self {
            patterns,
            patterns_by_type,
            keywords_by_type,
        })
    }

    /// Create a default pattern registry with built-in patterns
    pub fn default_patterns() -> Result<Self> {
        // Use embedded default patterns
        let default_toml = include_str!("../../patterns/pii_patterns.toml");
        Self::from_toml(default_toml)
    }

    /// Get all patterns
    pub fn all_patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Get patterns for a specific category
    pub fn patterns_for_type(&self, pii_type: PiiType) -> &[CompiledPattern] {
        self.patterns_by_type
            .get(&pii_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get lowercased context keywords for a category
    pub fn keywords_for_type(&self, pii_type: PiiType) -> &[String] {
        self.keywords_by_type
            .get(&pii_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_patterns() {
        let registry = PatternRegistry::default_patterns().unwrap();
        assert!(!registry.all_patterns().is_empty());
    }

    #[test]
    fn test_every_type_with_patterns_has_keywords() {
        let registry = PatternRegistry::default_patterns().unwrap();
        for pattern in registry.all_patterns() {
            assert!(
                !registry.keywords_for_type(pattern.pii_type).is_empty(),
                "no context keywords for {:?}",
                pattern.pii_type
            );
        }
    }

    #[test]
    fn test_email_pattern() {
        let registry = PatternRegistry::default_patterns().unwrap();
        let email_patterns = registry.patterns_for_type(PiiType::Email);
        assert!(!email_patterns.is_empty());

        let pattern = &email_patterns[0];
        assert!(pattern.regex.is_match("test@example.com"));
        assert!(!pattern.regex.is_match("not-an-email"));
    }

    #[test]
    fn test_phone_pattern() {
        let registry = PatternRegistry::default_patterns().unwrap();
        let phone_patterns = registry.patterns_for_type(PiiType::Phone);
        assert!(!phone_patterns.is_empty());

        let text = "Call me at (555) 123-4567";
        let has_match = phone_patterns.iter().any(|p| p.regex.is_match(text));
        assert!(has_match);
    }

    #[test]
    fn test_order_pattern() {
        let registry = PatternRegistry::default_patterns().unwrap();
        let order_patterns = registry.patterns_for_type(PiiType::OrderId);
        assert!(order_patterns
            .iter()
            .any(|p| p.regex.is_match("ORD-ABC123456")));
    }

    #[test]
    fn test_invalid_category_rejected() {
        let toml = r#"
            [patterns.bogus]
            patterns = ['\d+']
            confidence = 0.5
            category = "NOT_A_CATEGORY"
        "#;
        assert!(PatternRegistry::from_toml(toml).is_err());
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let toml = r#"
            [patterns.broken]
            patterns = ['(unclosed']
            confidence = 0.5
            category = "EMAIL"
        "#;
        assert!(PatternRegistry::from_toml(toml).is_err());
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let toml = r#"
            [patterns.loud]
            patterns = ['\d+']
            confidence = 1.5
            category = "EMAIL"
        "#;
        assert!(PatternRegistry::from_toml(toml).is_err());
    }
}

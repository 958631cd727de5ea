//! Regex-based PII detector
//!
//! Detection is a pure, synchronous pipeline over one text buffer: every
//! pattern matcher runs independently, matches pick up context-keyword
//! confidence boosts, sub-threshold candidates drop, and a single explicit
//! post-processing pass resolves overlapping spans. No shared state, safe to
//! call from any thread.

use super::patterns::{CompiledPattern, PatternRegistry};
use crate::config::DetectionConfig;
use crate::domain::pii::{PiiCandidate, PiiType};
use anyhow::Result;
use std::sync::Arc;

/// Number of characters inspected on each side of a match for context keywords
const CONTEXT_WINDOW: usize = 50;

/// Confidence added per context keyword found in the window
const KEYWORD_BOOST: f64 = 0.10;

/// Regex-based PII detector
pub struct PiiDetector {
    registry: Arc<PatternRegistry>,
    confidence_threshold: f64,
}

impl PiiDetector {
    /// Create a new detector with the built-in pattern library
    pub fn new() -> Result<Self> {
        let registry = PatternRegistry::default_patterns()?;
        Ok(Self {
            registry: Arc::new(registry),
            confidence_threshold: 0.7,
        })
    }

    /// Create a new detector with a custom pattern registry
    pub fn with_registry(registry: PatternRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            confidence_threshold: 0.7,
        }
    }

    /// Set the minimum confidence a candidate needs to survive filtering.
    /// A candidate exactly at the threshold is kept.
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Build a detector from configuration (pattern library override + threshold)
    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        let registry = match config.pattern_library {
            Some(ref path) => PatternRegistry::from_file(path)?,
            None => PatternRegistry::default_patterns()?,
        };
        Ok(Self::with_registry(registry).with_confidence_threshold(config.confidence_threshold))
    }

    /// Get the configured confidence threshold
    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    /// Detect PII spans in text
    ///
    /// Returns candidates sorted by start offset with overlapping spans
    /// resolved (higher confidence wins; ties prefer the longer span, then
    /// the earlier one). Empty or match-free text yields an empty list.
    pub fn detect(&self, text: &str) -> Vec<PiiCandidate> {
        self.run_pipeline(text, self.registry.all_patterns())
    }

    /// Detect only spans of a single category
    pub fn detect_by_type(&self, text: &str, pii_type: PiiType) -> Vec<PiiCandidate> {
        self.run_pipeline(text, self.registry.patterns_for_type(pii_type))
    }

    /// Fast check for whether text contains any PII at all
    ///
    /// Short-circuits on the first qualifying match without materializing the
    /// full candidate list.
    pub fn contains_pii(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }

        for pattern in self.registry.all_patterns() {
            for candidate in self.scan_pattern(text, pattern) {
                if candidate.confidence >= self.confidence_threshold {
                    return true;
                }
            }
        }
        false
    }

    /// Replace each detected span with `mask_char` repeated to the span's
    /// character length
    ///
    /// Replacements are applied back-to-front so earlier edits never
    /// invalidate not-yet-processed offsets.
    pub fn mask_pii(&self, text: &str, mask_char: char) -> String {
        let candidates = self.detect(text);

        let mut masked = text.to_string();
        for candidate in candidates.iter().rev() {
            let width = text[candidate.start..candidate.end].chars().count();
            let replacement: String = std::iter::repeat(mask_char).take(width).collect();
            masked.replace_range(candidate.start..candidate.end, &replacement);
        }
        masked
    }

    /// Scan, boost, filter, and conflict-resolve with the given pattern set
    fn run_pipeline(&self, text: &str, patterns: &[CompiledPattern]) -> Vec<PiiCandidate> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut candidates: Vec<PiiCandidate> = patterns
            .iter()
            .flat_map(|pattern| self.scan_pattern(text, pattern))
            .filter(|candidate| candidate.confidence >= self.confidence_threshold)
            .collect();

        candidates = resolve_overlaps(candidates);
        candidates
    }

    /// Run one pattern over the text, applying the context boost per match
    fn scan_pattern(&self, text: &str, pattern: &CompiledPattern) -> Vec<PiiCandidate> {
        let keywords = self.registry.keywords_for_type(pattern.pii_type);
        let mut found = Vec::new();

        for captures in pattern.regex.captures_iter(text) {
            // Patterns with an explicit capture group mark the PII span inside
            // a longer contextual match (e.g. "my name is <NAME>")
            let matched = if pattern.regex.captures_len() > 1 {
                captures.get(1).or_else(|| captures.get(0))
            } else {
                captures.get(0)
            };

            if let Some(matched) = matched {
                if matched.start() == matched.end() {
                    continue;
                }

                let confidence = boost_confidence(
                    pattern.confidence,
                    text,
                    matched.start(),
                    matched.end(),
                    keywords,
                );

                found.push(PiiCandidate::new(
                    pattern.pii_type,
                    matched.as_str().to_string(),
                    matched.start(),
                    matched.end(),
                    confidence,
                ));
            }
        }

        found
    }
}

/// Add the keyword boost for a match at `[start, end)`
///
/// The window is `CONTEXT_WINDOW` characters on each side, clamped to char
/// boundaries; each distinct keyword found adds `KEYWORD_BOOST`, capped at 1.0.
fn boost_confidence(
    base: f64,
    text: &str,
    start: usize,
    end: usize,
    keywords: &[String],
) -> f64 {
    if keywords.is_empty() {
        return base;
    }

    let window = context_window(text, start, end);
    let window_lower = window.to_lowercase();

    let hits = keywords
        .iter()
        .filter(|keyword| window_lower.contains(keyword.as_str()))
        .count();

    (base + KEYWORD_BOOST * hits as f64).min(1.0)
}

/// Slice the text around a span, clamped to valid char boundaries
fn context_window(text: &str, start: usize, end: usize) -> &str {
    let mut window_start = start.saturating_sub(CONTEXT_WINDOW);
    while window_start > 0 && !text.is_char_boundary(window_start) {
        window_start -= 1;
    }

    let mut window_end = (end + CONTEXT_WINDOW).min(text.len());
    while window_end < text.len() && !text.is_char_boundary(window_end) {
        window_end += 1;
    }

    &text[window_start..window_end]
}

/// Resolve overlapping candidate spans in one deterministic pass
///
/// Candidates are sorted by start offset; whenever two `[start, end)` ranges
/// intersect, the higher-confidence one survives. On exactly equal confidence
/// the longer span wins, and on equal length the earlier candidate stays.
/// The rule is independent of pattern-table iteration order.
pub(crate) fn resolve_overlaps(mut candidates: Vec<PiiCandidate>) -> Vec<PiiCandidate> {
    candidates.sort_by(|a, b| a.start.cmp(&b.start).then(b.len().cmp(&a.len())));

    let mut kept: Vec<PiiCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let mut dominated = false;
        while let Some(last) = kept.last() {
            if !last.overlaps(&candidate) {
                break;
            }
            if beats(&candidate, last) {
                kept.pop();
            } else {
                dominated = true;
                break;
            }
        }
        if !dominated {
            kept.push(candidate);
        }
    }
    kept
}

/// Whether `challenger` displaces an overlapping `incumbent`
fn beats(challenger: &PiiCandidate, incumbent: &PiiCandidate) -> bool {
    if challenger.confidence != incumbent.confidence {
        return challenger.confidence > incumbent.confidence;
    }
    challenger.len() > incumbent.len()
}

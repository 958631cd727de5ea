//! PII detection
//!
//! Pattern-based detection of structured PII spans in conversational text.
//! Detection is stateless, synchronous, and side-effect-free: a
//! [`PiiDetector`] can be shared across threads and called concurrently.
//!
//! # Pipeline
//!
//! 1. Every pattern in the [`patterns::PatternRegistry`] runs independently
//!    over the full text at its calibrated base confidence.
//! 2. Context keywords within ±50 characters of a match boost its confidence.
//! 3. Candidates below the configured threshold drop.
//! 4. One explicit post-processing pass resolves overlapping spans
//!    deterministically.

pub mod detector;
pub mod patterns;

// Re-export main types
pub use detector::PiiDetector;
pub use patterns::PatternRegistry;

//! Audit logger for tokenization operations
//!
//! Records what crossed the boundary without recording the PII itself:
//! every entry carries categories, confidences, and SHA-256 hashes of the
//! original values, never plaintext.

use crate::domain::pii::PiiCandidate;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Audit log entry
#[derive(Debug, Serialize)]
struct AuditLogEntry {
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context_id: Option<String>,
    detections_count: usize,
    tokens_issued: usize,
    processing_time_ms: u64,
    detections: Vec<AuditDetection>,
}

/// Audit detection entry (with hashed PII)
#[derive(Debug, Serialize)]
struct AuditDetection {
    category: String,
    confidence: f64,
    /// SHA-256 hash of the original value (never log plaintext PII)
    value_hash: String,
}

/// Append-only audit logger for tokenization operations
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
}

impl AuditLogger {
    /// Build a logger from the `[audit]` configuration section
    pub fn from_config(config: &crate::config::AuditConfig) -> Result<Self> {
        Self::new(config.log_path.clone(), config.json_format, config.enabled)
    }

    /// Create a new audit logger
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create audit log directory: {}", parent.display())
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
        })
    }

    /// Log one tokenization operation
    pub fn log_tokenization(
        &self,
        context_id: Option<&str>,
        candidates: &[PiiCandidate],
        tokens_issued: usize,
        processing_time_ms: u64,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = AuditLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            context_id: context_id.map(str::to_string),
            detections_count: candidates.len(),
            tokens_issued,
            processing_time_ms,
            detections: candidates
                .iter()
                .map(|candidate| AuditDetection {
                    category: candidate.pii_type.label().to_string(),
                    confidence: candidate.confidence,
                    value_hash: hash_pii_value(&candidate.value),
                })
                .collect(),
        };

        self.write_entry(&entry)
    }

    /// Write an audit entry to the log file
    fn write_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open audit log: {}", self.log_path.display()))?;

        if self.json_format {
            let json_line =
                serde_json::to_string(entry).context("Failed to serialize audit entry")?;
            writeln!(file, "{json_line}").context("Failed to write audit entry")?;
        } else {
            writeln!(
                file,
                "[{}] Context: {} | Detections: {} | Tokens: {} | Time: {}ms",
                entry.timestamp,
                entry.context_id.as_deref().unwrap_or("-"),
                entry.detections_count,
                entry.tokens_issued,
                entry.processing_time_ms
            )
            .context("Failed to write audit entry")?;
        }

        Ok(())
    }
}

/// Hash a PII value using SHA-256
fn hash_pii_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    format!("{result:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pii::PiiType;
    use tempfile::tempdir;

    fn candidate(value: &str) -> PiiCandidate {
        PiiCandidate::new(PiiType::Email, value.to_string(), 0, value.len(), 0.95)
    }

    #[test]
    fn test_hash_pii_value() {
        let hash1 = hash_pii_value("test@example.com");
        let hash2 = hash_pii_value("test@example.com");
        let hash3 = hash_pii_value("different@example.com");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_log_tokenization_never_writes_plaintext() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.log");
        let logger = AuditLogger::new(log_path.clone(), true, true).unwrap();

        logger
            .log_tokenization(Some("conv-1"), &[candidate("secret@example.com")], 1, 3)
            .unwrap();

        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(!contents.contains("secret@example.com"));
        assert!(contents.contains("EMAIL"));
        assert!(contents.contains(&hash_pii_value("secret@example.com")));
    }

    #[test]
    fn test_disabled_logger_writes_nothing() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.log");
        let logger = AuditLogger::new(log_path.clone(), true, false).unwrap();

        logger
            .log_tokenization(None, &[candidate("a@b.co")], 1, 1)
            .unwrap();

        assert!(!log_path.exists());
    }

    #[test]
    fn test_plain_text_format() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.log");
        let logger = AuditLogger::new(log_path.clone(), false, true).unwrap();

        logger
            .log_tokenization(Some("conv-9"), &[candidate("a@b.co")], 1, 2)
            .unwrap();

        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("Context: conv-9"));
        assert!(contents.contains("Tokens: 1"));
    }
}

//! Logging and observability
//!
//! Structured logging via `tracing` with:
//! - Console output (plain or JSON)
//! - Optional local file logging with rotation
//! - `RUST_LOG`-style env-filter support
//!
//! Cloak call sites never log PII values; events carry counts, categories,
//! token identifiers, and hashed values only.
//!
//! # Example
//!
//! ```no_run
//! use cloak::config::LoggingConfig;
//! use cloak::logging::init_logging;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(tokens = 3, "Tokenized outbound message");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

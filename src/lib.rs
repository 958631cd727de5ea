// Cloak - PII Tokenization Boundary for Conversational AI
// Copyright (c) 2025 Cloak Contributors
// Licensed under the MIT License

//! # Cloak - PII Tokenization Boundary
//!
//! Cloak protects customer PII when conversational text crosses a trust
//! boundary into a third-party AI/LLM service. It detects structured PII
//! spans in text, replaces them with opaque tokens before the text leaves
//! the trusted boundary, persists a reversible token-to-value mapping, and
//! restores the original values in text returned from the external service.
//!
//! ## Overview
//!
//! The library provides the two boundary-crossing entry points:
//! - **Tokenize** outbound text ([`tokenization::PiiTokenizer`]) right
//!   before the external call
//! - **Detokenize** inbound text ([`tokenization::PiiDetokenizer`]) right
//!   after the result arrives, before it reaches the customer or a log
//!
//! ## Architecture
//!
//! Cloak follows a layered architecture:
//!
//! - [`domain`] - Core domain types, results, and errors
//! - [`detection`] - Pure, synchronous pattern-based PII detection
//! - [`tokenization`] - Tokenizer, detokenizer, token format, audit trail
//! - [`store`] - Token mapping storage (memory, Key Vault, Cosmos DB)
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cloak::config::CloakConfig;
//! use cloak::detection::PiiDetector;
//! use cloak::store::create_token_store;
//! use cloak::tokenization::{PiiDetokenizer, PiiTokenizer};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CloakConfig::default();
//!     let store = create_token_store(&config).await?;
//!     let detector = Arc::new(PiiDetector::from_config(&config.detection)?);
//!
//!     // Outbound: tokenize before calling the external model
//!     let tokenizer = PiiTokenizer::new(Arc::clone(&detector), Arc::clone(&store));
//!     let outbound = tokenizer
//!         .tokenize("Contact john.doe@example.com about ORD-ABC123456", Some("conv-1"), None)
//!         .await?;
//!
//!     // ... send outbound.tokenized_text to the external service ...
//!     let model_reply = outbound.tokenized_text.clone();
//!
//!     // Inbound: restore values before showing the reply to the customer
//!     let detokenizer = PiiDetokenizer::new(store);
//!     let inbound = detokenizer.detokenize(&model_reply).await?;
//!     assert_eq!(inbound.detokenized_text, outbound.original_text);
//!     Ok(())
//! }
//! ```
//!
//! ## Storage Backends
//!
//! Token mappings persist behind the [`store::TokenStore`] trait with three
//! interchangeable backends: an ephemeral in-process store, a durable Azure
//! Key Vault store (one provider-expiring secret per mapping, vault-side
//! audit trail), and an Azure Cosmos DB fallback for latency-sensitive
//! deployments. One process-wide instance is normally constructed from
//! configuration via [`store::shared_store`]; tests inject their own with
//! [`store::set_shared_store`].
//!
//! ## Error Handling
//!
//! Cloak uses the [`domain::CloakError`] type for all errors. Detection
//! never errors on malformed input, a single failed store write during
//! tokenization is skipped rather than fatal, and unresolved tokens during
//! detokenization are reported in the result instead of thrown.
//!
//! ## Logging
//!
//! Structured logging via the `tracing` crate; events carry token counts,
//! categories, and hashed values — never PII:
//!
//! ```rust,no_run
//! tracing::info!(tokens = 2, backend = "keyvault", "Tokenized outbound message");
//! ```

pub mod config;
pub mod detection;
pub mod domain;
pub mod logging;
pub mod store;
pub mod tokenization;

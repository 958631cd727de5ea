//! Domain models and types for Cloak.
//!
//! This module contains the core domain models, types, and business rules.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **PII model** ([`PiiType`], [`PiiCandidate`])
//! - **Stored mappings** ([`TokenMapping`])
//! - **Call results** ([`TokenizationResult`], [`DetokenizationResult`])
//! - **Error types** ([`CloakError`], [`KeyVaultError`], [`CosmosDbError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, CloakError>`]:
//!
//! ```rust
//! use cloak::domain::{CloakError, Result};
//!
//! fn example() -> Result<()> {
//!     Err(CloakError::Validation("Invalid input".to_string()))
//! }
//! ```

pub mod errors;
pub mod mapping;
pub mod outcome;
pub mod pii;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{CloakError, CosmosDbError, KeyVaultError};
pub use mapping::TokenMapping;
pub use outcome::{DetokenizationResult, TokenizationResult};
pub use pii::{PiiCandidate, PiiType};
pub use result::Result;

//! Token mapping storage
//!
//! Persists and expires token-to-value mappings behind the [`TokenStore`]
//! trait. Three interchangeable backends cover different
//! durability/latency/security tradeoffs:
//!
//! - [`memory::MemoryTokenStore`] — ephemeral in-process storage
//! - [`keyvault::KeyVaultTokenStore`] — durable, audited secret management
//! - [`cosmosdb::CosmosTokenStore`] — low-latency document database fallback
//!
//! One store instance is normally constructed per process from deployment
//! configuration via [`factory::shared_store`]; tests inject their own
//! instance with [`factory::set_shared_store`].

pub mod cosmosdb;
pub mod factory;
pub mod keyvault;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use cosmosdb::CosmosTokenStore;
pub use factory::{create_token_store, reset_shared_store, set_shared_store, shared_store};
pub use keyvault::KeyVaultTokenStore;
pub use memory::MemoryTokenStore;
pub use traits::TokenStore;

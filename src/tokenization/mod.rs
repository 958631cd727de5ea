//! Tokenization and detokenization
//!
//! The two boundary-crossing operations of the library:
//!
//! - [`PiiTokenizer`] replaces detected PII spans with opaque tokens and
//!   persists the mappings before text leaves the trust boundary.
//! - [`PiiDetokenizer`] finds tokens in text coming back from the external
//!   service and restores the original values.
//!
//! The token lexical format lives in [`token`]; the detokenizer's pattern
//! matches exactly what the tokenizer emits, byte-for-byte in structure.
//! [`audit::AuditLogger`] optionally records each tokenization with hashed
//! values.

pub mod audit;
pub mod detokenizer;
pub mod token;
pub mod tokenizer;

// Re-export main types
pub use audit::AuditLogger;
pub use detokenizer::{PiiDetokenizer, RESPONSE_FIELDS};
pub use tokenizer::{PiiTokenizer, MESSAGE_FIELDS};

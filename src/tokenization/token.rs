//! Token lexical format
//!
//! Tokens are `[PII_` + 32 lowercase hex characters + `]`. The format is
//! fixed so the detokenizer matches exactly what the tokenizer emits, and it
//! is lexically inert for detection: the hex run is flanked by word
//! characters and brackets, so no detection pattern (digit runs, separators,
//! prefixes) can fire inside a token.

use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

/// Fixed prefix every token starts with
pub const TOKEN_PREFIX: &str = "[PII_";

/// Closing delimiter
pub const TOKEN_SUFFIX: char = ']';

/// Lexical pattern recognizing exactly the tokens `generate()` emits
pub const TOKEN_REGEX: &str = r"\[PII_[0-9a-f]{32}\]";

/// Generate a fresh globally-unique token
///
/// The random part is a v4 UUID in simple (hyphen-free) form; tokens carry no
/// information about the value they replace and are never reused.
pub fn generate() -> String {
    format!("{}{}{}", TOKEN_PREFIX, Uuid::new_v4().simple(), TOKEN_SUFFIX)
}

/// Compiled token pattern, built once per process
pub fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(TOKEN_REGEX).expect("token pattern is a valid regex"))
}

/// Whether the whole string is a single well-formed token
pub fn is_token(s: &str) -> bool {
    match token_pattern().find(s) {
        Some(m) => m.start() == 0 && m.end() == s.len(),
        None => false,
    }
}

/// The 32-char hex identifier inside a well-formed token
pub fn inner_id(token: &str) -> Option<&str> {
    if is_token(token) {
        Some(&token[TOKEN_PREFIX.len()..token.len() - 1])
    } else {
        None
    }
}

//! Pairing code generation and format checks.
//!
//! Generated codes use a 32-symbol alphabet that drops the visually
//! ambiguous `0`, `O`, `1` and `I`, giving 32^8 (about 1.1e12) codes.
//! The wire validator is deliberately looser (`^[A-Z0-9]{8}$`) so a
//! mistyped ambiguous character gets a clean "not found" instead of a
//! format error.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

/// Number of characters in a pairing code.
pub const CODE_LENGTH: usize = 8;

/// Symbols a generated code is drawn from.
pub const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

static CODE_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{8}$").expect("valid pairing code regex"));

/// Generate a random pairing code, sampling each symbol uniformly.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Whether `code` has the shape accepted by `GET /pairing/{code}`.
pub fn is_valid_code_format(code: &str) -> bool {
    CODE_FORMAT.is_match(code)
}

/// Shorten a code for log output so full codes never reach the logs.
pub fn redact(code: &str) -> String {
    let prefix: String = code.chars().take(2).collect();
    format!("{}******", prefix)
}

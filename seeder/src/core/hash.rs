//! Whitespace-insensitive content hashing for step definitions.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Fingerprints the raw content of a definition blob.
///
/// Implementations must be deterministic across calls and runs: the stored
/// hash of an executed step is compared against a fresh hash on every load.
pub trait ContentHasher {
    fn hash(&self, content: &str) -> String;
}

impl<F> ContentHasher for F
where
    F: Fn(&str) -> String,
{
    fn hash(&self, content: &str) -> String {
        self(content)
    }
}

/// SHA-256 over the content with every whitespace run removed, upper-case hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn hash(&self, content: &str) -> String {
        let stripped = strip_whitespace(content);
        let mut hasher = Sha256::new();
        hasher.update(stripped.as_bytes());
        hex::encode_upper(hasher.finalize())
    }
}

/// Remove all whitespace, including runs inside the content.
pub fn strip_whitespace(content: &str) -> String {
    WHITESPACE.replace_all(content, "").into_owned()
}

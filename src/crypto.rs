//! Token hashing for session storage.

use sha2::{Digest, Sha256};

/// Hash a secret for database lookups (session tokens).
/// Uses SHA-256 with an application salt, returns lowercase hex.
pub fn hash_secret(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"cobranca-v1:");
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

use sha2::{Digest, Sha256};

/// Unsalted SHA-256 hex digest, the format existing account documents use.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Security answers compare trimmed and case-insensitively.
pub fn hash_answer(answer: &str) -> String {
    hash_secret(&answer.trim().to_lowercase())
}

pub fn verify_secret(secret: &str, digest: &str) -> bool {
    hash_secret(secret) == digest
}

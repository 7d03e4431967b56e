use rand::{distributions::Alphanumeric, thread_rng, Rng};
use sha2::{Digest, Sha256};

pub fn generate_access_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// 8-character uppercase enrollment code. Uniqueness is enforced by the
/// database constraint; callers retry on collision.
pub fn generate_classroom_code() -> String {
    generate_access_token(8).to_uppercase()
}

/// Bearer tokens are stored as SHA-256 hex digests, never in plaintext.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

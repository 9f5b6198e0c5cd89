use base64::Engine;
use sha2::{Digest, Sha256};

/// SHA-256 of the raw bytes, base64-encoded.
/// Used to spot the same photo being attached twice.
pub fn content_hash(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    base64::engine::general_purpose::STANDARD.encode(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_deterministic() {
        assert_eq!(content_hash(b"fachada"), content_hash(b"fachada"));
    }

    #[test]
    fn different_content_different_hash() {
        assert_ne!(content_hash(b"Content A"), content_hash(b"Content B"));
    }

    #[test]
    fn hash_is_base64_sha256() {
        // 32 bytes -> 44 base64 chars with padding
        assert_eq!(content_hash(b"").len(), 44);
    }
}

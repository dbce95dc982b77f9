//! SHA-256 digest helpers for container members.
//!
//! Container manifests store member digests as lowercase hex SHA-256, which
//! is the encoding the archive format uses on disk.

use sha2::{Digest, Sha256};

/// Computes the lowercase hex SHA-256 digest of the given bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        // sha256("") is a fixed constant.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn digest_changes_with_content() {
        assert_ne!(sha256_hex(b"a"), sha256_hex(b"b"));
    }
}

use sha2::{Digest, Sha256};

/// Namespace for reproduced background renders.
pub const BACKGROUND_NAMESPACE: &str = "bg_";

/// Content address for `data`: `namespace` followed by the hex SHA-256 digest.
pub fn fingerprint(namespace: &str, data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    format!("{}{}", namespace, hex::encode(digest))
}

pub fn background_fingerprint(data: &[u8]) -> String {
    fingerprint(BACKGROUND_NAMESPACE, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_bytes_share_a_key() {
        let a = background_fingerprint(b"linen texture");
        let b = background_fingerprint(b"linen texture");
        assert_eq!(a, b);
        assert!(a.starts_with("bg_"));
        assert_eq!(a.len(), 3 + 64);
    }

    #[test]
    fn test_different_bytes_or_namespace_differ() {
        assert_ne!(background_fingerprint(b"a"), background_fingerprint(b"b"));
        assert_ne!(fingerprint("x_", b"a"), fingerprint("y_", b"a"));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            fingerprint("", b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}

// src/fingerprint.rs
use sha2::{Digest, Sha256};

/// SHA-256 over the UTF-8 bytes of `content`, as lowercase hex.
///
/// Equal digests are treated as equal content everywhere downstream;
/// fingerprint comparison is the sole change gate.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        assert_eq!(
            fingerprint("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn stable_and_fixed_length() {
        let a = fingerprint("v1\nline2");
        let b = fingerprint("v1\nline2");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn differs_on_any_edit() {
        assert_ne!(fingerprint("v1\nline2"), fingerprint("v1\nline2\nline3"));
        assert_ne!(fingerprint("a"), fingerprint("a "));
    }
}

//! Callback signatures: `hex(sha512(body || secret))`.

use sha2::{Digest, Sha512};

/// Computes the signature of a raw callback body.
#[must_use]
pub fn sign(body: &[u8], secret: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(body);
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks a presented signature against the body and secret.
///
/// Hex case is ignored; the comparison runs in constant time over the
/// expected length.
#[must_use]
pub fn verify(body: &[u8], secret: &str, signature: &str) -> bool {
    let expected = sign(body, secret);
    let presented = signature.trim().to_ascii_lowercase();

    if presented.len() != expected.len() {
        return false;
    }

    expected
        .bytes()
        .zip(presented.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_is_sha512_hex() {
        let signature = sign(b"{}", "secret");
        assert_eq!(signature.len(), 128);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(signature, sign(b"{}", "secret"));
        assert_ne!(signature, sign(b"{}", "other"));
    }

    #[test]
    fn test_verify() {
        let body = br#"{"refund_data":{"status":"completed"}}"#;
        let signature = sign(body, "secret");

        assert!(verify(body, "secret", &signature));
        assert!(verify(body, "secret", &signature.to_uppercase()));
        assert!(!verify(body, "wrong", &signature));
        assert!(!verify(b"{}", "secret", &signature));
        assert!(!verify(body, "secret", ""));
        assert!(!verify(body, "secret", &signature[..64]));
    }
}

//! Request signing primitives, shared by the service and by consumers.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Hex SHA-256 digest of a plaintext secret. This is what the store keeps
/// and what the signing key is derived from.
pub fn secret_digest(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Derive the 32-byte signing key from a plaintext secret. Consumers call
/// this once and keep the key; the server recovers the same key from the
/// stored digest.
pub fn derive_signing_key(secret: &str) -> [u8; 32] {
    Sha256::digest(secret.as_bytes()).into()
}

/// Hex HMAC-SHA256 signature over `"{timestamp}." + body`.
pub fn sign_request(key: &[u8], timestamp: u64, body: &[u8]) -> String {
    hex::encode(signature_mac(key, timestamp, body).finalize().into_bytes())
}

/// Constant-time check of a caller-supplied hex signature.
pub fn verify_signature(key: &[u8], timestamp: u64, body: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    signature_mac(key, timestamp, body)
        .verify_slice(&signature)
        .is_ok()
}

fn signature_mac(key: &[u8], timestamp: u64, body: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    mac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_round_trip() {
        let key = derive_signing_key("sec_deadbeef");
        let sig = sign_request(&key, 1_700_000_000, b"{\"entity\":\"x\"}");
        assert!(verify_signature(&key, 1_700_000_000, b"{\"entity\":\"x\"}", &sig));
    }

    #[test]
    fn any_field_change_breaks_verification() {
        let key = derive_signing_key("sec_deadbeef");
        let sig = sign_request(&key, 1_700_000_000, b"body");

        assert!(!verify_signature(&key, 1_700_000_001, b"body", &sig));
        assert!(!verify_signature(&key, 1_700_000_000, b"Body", &sig));
        assert!(!verify_signature(
            &derive_signing_key("sec_other"),
            1_700_000_000,
            b"body",
            &sig
        ));
    }

    #[test]
    fn non_hex_signature_is_rejected() {
        let key = derive_signing_key("sec_deadbeef");
        assert!(!verify_signature(&key, 1, b"body", "zz-not-hex"));
    }

    #[test]
    fn digest_matches_derived_key() {
        let digest = secret_digest("sec_deadbeef");
        assert_eq!(hex::decode(&digest).unwrap(), derive_signing_key("sec_deadbeef"));
    }
}

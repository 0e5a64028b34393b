//! Webhook signature verification.
//!
//! The gateway signs the raw notification body with HMAC-SHA256 and sends
//! the hex digest in the `X-Gateway-Signature` header. The body must be
//! verified before any of its contents are trusted.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-gateway-signature";

/// Verify the hex HMAC-SHA256 signature of a raw webhook body.
/// Comparison is constant-time via `Mac::verify_slice`.
pub fn verify_signature(payload: &[u8], signature_hex: &str, secret: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex.trim()) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &[u8], secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_a_valid_signature() {
        let payload = br#"{"event":"payment.succeeded"}"#;
        let signature = sign(payload, "whsec_test");
        assert!(verify_signature(payload, &signature, "whsec_test"));
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let payload = br#"{"event":"payment.succeeded"}"#;
        let signature = sign(payload, "whsec_test");
        assert!(!verify_signature(
            br#"{"event":"payment.canceled"}"#,
            &signature,
            "whsec_test"
        ));
    }

    #[test]
    fn rejects_the_wrong_secret() {
        let payload = br#"{"event":"payment.succeeded"}"#;
        let signature = sign(payload, "whsec_test");
        assert!(!verify_signature(payload, &signature, "whsec_other"));
    }

    #[test]
    fn rejects_garbage_headers() {
        let payload = br#"{}"#;
        assert!(!verify_signature(payload, "not-hex!", "whsec_test"));
        assert!(!verify_signature(payload, "", "whsec_test"));
    }
}

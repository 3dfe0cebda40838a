//! HMAC-SHA256 webhook signatures.
//!
//! Lemon Squeezy sends the digest hex encoded in `X-Signature`; FastSpring
//! sends it base64 encoded in `X-FS-Signature`. Both sign the raw body.

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

use super::WebhookError;

type HmacSha256 = Hmac<Sha256>;

fn digest(secret: &str, body: &[u8]) -> Result<Vec<u8>, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| WebhookError::NotConfigured)?;
    mac.update(body);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn compare(expected: &[u8], provided: &[u8]) -> Result<(), WebhookError> {
    if expected.ct_eq(provided).unwrap_u8() != 1 {
        warn!("invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }
    Ok(())
}

pub fn sign_hex(secret: &str, body: &[u8]) -> Result<String, WebhookError> {
    Ok(hex::encode(digest(secret, body)?))
}

pub fn sign_base64(secret: &str, body: &[u8]) -> Result<String, WebhookError> {
    Ok(BASE64_STANDARD.encode(digest(secret, body)?))
}

/// Check a hex digest header (case-insensitive).
pub fn verify_hex(secret: &str, body: &[u8], header: Option<&str>) -> Result<(), WebhookError> {
    let header = header.map(str::trim).filter(|h| !h.is_empty()).ok_or(WebhookError::MissingSignature)?;
    let provided = hex::decode(header).map_err(|_| WebhookError::InvalidSignature)?;
    compare(&digest(secret, body)?, &provided)
}

/// Check a base64 digest header.
pub fn verify_base64(secret: &str, body: &[u8], header: Option<&str>) -> Result<(), WebhookError> {
    let header = header.map(str::trim).filter(|h| !h.is_empty()).ok_or(WebhookError::MissingSignature)?;
    let provided = BASE64_STANDARD.decode(header).map_err(|_| WebhookError::InvalidSignature)?;
    compare(&digest(secret, body)?, &provided)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"meta":{"event_name":"order_created"}}"#;

    #[test]
    fn hex_signature_round_trip() {
        let sig = sign_hex(SECRET, BODY).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(verify_hex(SECRET, BODY, Some(&sig)).is_ok());
        assert!(verify_hex(SECRET, BODY, Some(&sig.to_uppercase())).is_ok());
    }

    #[test]
    fn hex_signature_rejects_tampering() {
        let sig = sign_hex(SECRET, BODY).unwrap();
        let tampered = br#"{"meta":{"event_name":"order_refunded"}}"#;
        assert!(matches!(verify_hex(SECRET, tampered, Some(&sig)), Err(WebhookError::InvalidSignature)));
        assert!(matches!(verify_hex("other", BODY, Some(&sig)), Err(WebhookError::InvalidSignature)));
        assert!(matches!(verify_hex(SECRET, BODY, Some("zz-not-hex")), Err(WebhookError::InvalidSignature)));
        assert!(matches!(verify_hex(SECRET, BODY, Some(&sig[..32])), Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn missing_or_blank_header() {
        assert!(matches!(verify_hex(SECRET, BODY, None), Err(WebhookError::MissingSignature)));
        assert!(matches!(verify_base64(SECRET, BODY, Some("  ")), Err(WebhookError::MissingSignature)));
    }

    #[test]
    fn base64_signature_round_trip() {
        let sig = sign_base64(SECRET, BODY).unwrap();
        assert!(verify_base64(SECRET, BODY, Some(&sig)).is_ok());
        assert!(matches!(verify_base64(SECRET, b"{}", Some(&sig)), Err(WebhookError::InvalidSignature)));
        assert!(matches!(verify_base64(SECRET, BODY, Some("***")), Err(WebhookError::InvalidSignature)));
    }
}

//! # Callback Signing
//!
//! HMAC-SHA256 signing for approval URLs and verification of gateway
//! callbacks. The callback signature header has the form
//! `t=<unix_ts>,v1=<hex hmac>`; the signed message is `"{t}.{body}"`.

use shop_core::{ShopError, ShopResult};

pub(crate) struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<String>,
}

pub(crate) fn parse_signature_header(header: &str) -> ShopResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let kv: Vec<&str> = part.split('=').collect();
        if kv.len() != 2 {
            continue;
        }
        match kv[0] {
            "t" => {
                timestamp = kv[1].parse().ok();
            }
            "v1" => {
                signatures.push(kv[1].to_string());
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        ShopError::SignatureVerification("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(ShopError::SignatureVerification(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

pub(crate) fn compute_hmac_sha256(secret: &str, message: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    let result = mac.finalize();
    hex::encode(result.into_bytes())
}

pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signature_header() {
        let parsed = parse_signature_header("t=1700000000,v1=abc123").unwrap();
        assert_eq!(parsed.timestamp, 1700000000);
        assert_eq!(parsed.signatures, vec!["abc123".to_string()]);
    }

    #[test]
    fn test_parse_rejects_missing_timestamp() {
        assert!(parse_signature_header("v1=abc123").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_signature() {
        assert!(parse_signature_header("t=1700000000").is_err());
    }

    #[test]
    fn test_hmac_is_deterministic() {
        let a = compute_hmac_sha256("secret", "message");
        let b = compute_hmac_sha256("secret", "message");
        assert_eq!(a, b);
        assert_ne!(a, compute_hmac_sha256("other-secret", "message"));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}

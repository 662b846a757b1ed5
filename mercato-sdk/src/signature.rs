//! Webhook signature verification for provider events.
//!
//! The provider signs every webhook delivery with HMAC-SHA256. The wire format
//! for the header is:
//!
//! ```text
//! Stripe-Signature: t={unix_timestamp},v1={hex_signature}[,v1={hex_signature}...]
//! ```
//!
//! The signed data is `"{timestamp}.{raw_body}"`. Several `v1` entries may be
//! present while the endpoint secret is being rolled; any one of them
//! matching is enough. Other schemes (`v0`, ...) are ignored.

/// Header name carrying the provider signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Default maximum age of a signature (in seconds).
pub const DEFAULT_TOLERANCE: i64 = 5 * 60;

const SCHEME: &str = "v1";

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid header format")]
    InvalidFormat,
    #[error("no timestamp in signature header")]
    MissingTimestamp,
    #[error("no v1 signatures in signature header")]
    NoSignatures,
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("signature expired")]
    Expired,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

/// A parsed `Stripe-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Box<[u8]>>,
}

// ---------------------------------------------------------------------------
// Header parsing / formatting
// ---------------------------------------------------------------------------

/// Parse a `Stripe-Signature` header value.
///
/// `v1` entries that are not valid hex are skipped rather than rejected.
pub fn parse_signature_header(value: &str) -> Result<SignatureHeader, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in value.split(',') {
        let (key, val) = part
            .trim()
            .split_once('=')
            .ok_or(SignatureError::InvalidFormat)?;
        match key {
            "t" => {
                timestamp = Some(val.parse().map_err(|_| SignatureError::InvalidFormat)?);
            }
            SCHEME => {
                if let Ok(bytes) = hex::decode(val) {
                    signatures.push(bytes.into_boxed_slice());
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if signatures.is_empty() {
        return Err(SignatureError::NoSignatures);
    }
    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

/// Format a `t={timestamp},v1={hex}` header value from its parts.
pub fn format_signature_header(timestamp: i64, signature: &[u8]) -> String {
    format!("t={},{}={}", timestamp, SCHEME, hex::encode(signature))
}

// ---------------------------------------------------------------------------
// Signing / verification
// ---------------------------------------------------------------------------

/// Sign a payload the way the provider does, returning the header value.
///
/// Used by tests and local tooling that replays events against the server.
pub fn sign_payload(payload: &[u8], secret: &[u8], timestamp: i64) -> String {
    let signature = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret),
        &signed_data(timestamp, payload),
    );
    format_signature_header(timestamp, signature.as_ref())
}

/// Verify a webhook payload against its `Stripe-Signature` header using the
/// current time.
pub fn verify_payload(
    payload: &[u8],
    header_value: &str,
    secret: &[u8],
    tolerance: i64,
) -> Result<SignatureHeader, SignatureError> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    verify_payload_at(payload, header_value, secret, tolerance, now)
}

/// Verify a webhook payload as of `now`.
///
/// Checks the HMAC first, then timestamp freshness, so a forged header never
/// learns whether its timestamp would have been accepted.
pub fn verify_payload_at(
    payload: &[u8],
    header_value: &str,
    secret: &[u8],
    tolerance: i64,
    now: i64,
) -> Result<SignatureHeader, SignatureError> {
    let header = parse_signature_header(header_value)?;
    let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret);
    let data = signed_data(header.timestamp, payload);

    let matched = header
        .signatures
        .iter()
        .any(|candidate| ring::hmac::verify(&key, &data, candidate).is_ok());
    if !matched {
        return Err(SignatureError::SignatureMismatch);
    }

    if tolerance > 0 && now - header.timestamp > tolerance {
        return Err(SignatureError::Expired);
    }
    Ok(header)
}

fn signed_data(timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let prefix = format!("{timestamp}.");
    let mut data = Vec::with_capacity(prefix.len() + payload.len());
    data.extend_from_slice(prefix.as_bytes());
    data.extend_from_slice(payload);
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"whsec_test123secret456";
    const PAYLOAD: &[u8] = br#"{"type":"checkout.session.completed"}"#;
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_valid_signature() {
        let header = sign_payload(PAYLOAD, SECRET, NOW);
        let parsed = verify_payload_at(PAYLOAD, &header, SECRET, DEFAULT_TOLERANCE, NOW + 10)
            .unwrap();
        assert_eq!(parsed.timestamp, NOW);
    }

    #[test]
    fn test_wrong_secret() {
        let header = sign_payload(PAYLOAD, b"wrong_secret", NOW);
        assert_eq!(
            verify_payload_at(PAYLOAD, &header, SECRET, DEFAULT_TOLERANCE, NOW),
            Err(SignatureError::SignatureMismatch)
        );
    }

    #[test]
    fn test_modified_payload() {
        let header = sign_payload(PAYLOAD, SECRET, NOW);
        let modified = br#"{"type":"checkout.session.completed","hacked":true}"#;
        assert_eq!(
            verify_payload_at(modified, &header, SECRET, DEFAULT_TOLERANCE, NOW),
            Err(SignatureError::SignatureMismatch)
        );
    }

    #[test]
    fn test_old_timestamp() {
        let header = sign_payload(PAYLOAD, SECRET, NOW);
        assert_eq!(
            verify_payload_at(PAYLOAD, &header, SECRET, DEFAULT_TOLERANCE, NOW + 600),
            Err(SignatureError::Expired)
        );
        // Zero tolerance disables the freshness check.
        assert!(verify_payload_at(PAYLOAD, &header, SECRET, 0, NOW + 600).is_ok());
    }

    #[test]
    fn test_rolled_secret_with_multiple_candidates() {
        let good = sign_payload(PAYLOAD, SECRET, NOW);
        let good_sig = good.split_once("v1=").unwrap().1;
        let header = format!("t={NOW},v1={},v1={good_sig},v0=deadbeef", "00".repeat(32));
        assert!(verify_payload_at(PAYLOAD, &header, SECRET, DEFAULT_TOLERANCE, NOW).is_ok());
    }

    #[test]
    fn test_malformed_headers() {
        assert_eq!(
            parse_signature_header("garbage"),
            Err(SignatureError::InvalidFormat)
        );
        assert_eq!(parse_signature_header(""), Err(SignatureError::InvalidFormat));
        assert_eq!(
            parse_signature_header("v1=abcd"),
            Err(SignatureError::MissingTimestamp)
        );
        assert_eq!(
            parse_signature_header("t=1234567890"),
            Err(SignatureError::NoSignatures)
        );
        assert_eq!(
            parse_signature_header("t=1234567890,v1=not-hex"),
            Err(SignatureError::NoSignatures)
        );
        assert_eq!(
            parse_signature_header("t=soon,v1=abcd"),
            Err(SignatureError::InvalidFormat)
        );
    }
}

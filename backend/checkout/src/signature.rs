//! Verification of the provider's signed webhook header.
//!
//! Header format: `t=<unix seconds>,v1=<hex hmac>[,v1=<hex hmac>...]`. The MAC
//! is HMAC-SHA256 over `"{t}." + raw body`, computed on the bytes exactly as
//! received.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing signing secret")]
    MissingSecret,
    #[error("malformed signature header")]
    BadHeader,
    #[error("timestamp outside tolerance")]
    TimestampOutOfTolerance,
    #[error("no signature matched")]
    NoMatch,
}

impl SignatureError {
    /// Machine-readable reason returned to the caller.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingSecret => "missing_secret",
            Self::BadHeader => "bad_header",
            Self::TimestampOutOfTolerance => "timestamp_out_of_tolerance",
            Self::NoMatch => "no_match",
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: Option<i64>,
    pub signatures: Vec<String>,
}

pub fn parse_header(header: &str) -> SignatureHeader {
    let mut parsed = SignatureHeader::default();
    for part in header.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                if let Ok(ts) = value.parse::<i64>() {
                    parsed.timestamp = Some(ts);
                }
            }
            "v1" => parsed.signatures.push(value.to_string()),
            _ => {}
        }
    }
    parsed
}

/// Checks `header` against `payload` at time `now` (unix seconds).
pub fn verify(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::MissingSecret);
    }

    let parsed = parse_header(header);
    let timestamp = match parsed.timestamp {
        Some(ts) if ts != 0 && !parsed.signatures.is_empty() => ts,
        _ => return Err(SignatureError::BadHeader),
    };

    if now.abs_diff(timestamp) > tolerance_secs.unsigned_abs() {
        return Err(SignatureError::TimestampOutOfTolerance);
    }

    let mac = signed_mac(secret, timestamp, payload)?;
    let matched = parsed.signatures.iter().any(|sig| match hex::decode(sig) {
        Ok(bytes) => mac.clone().verify_slice(&bytes).is_ok(),
        Err(_) => false,
    });

    if matched {
        Ok(())
    } else {
        Err(SignatureError::NoMatch)
    }
}

fn signed_mac(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::MissingSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Builds a valid header for `payload`, as the provider would.
#[cfg(test)]
pub fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mac = signed_mac(secret, timestamp, payload).unwrap();
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

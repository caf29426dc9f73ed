//! crates/kyc_session_core/src/token.rs
//!
//! Local (offline) inspection of JWT bearer tokens. Signatures are never
//! checked here; only the backend can say whether a token is genuine.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

// Some issuers emit the standard alphabet in the payload segment.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Why a token could not be inspected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("expected 3 dot-separated segments, found {0}")]
    Segments(usize),
    #[error("payload segment is not valid base64")]
    Encoding,
    #[error("payload is not a JSON object")]
    Payload,
    #[error("exp claim is not numeric")]
    ExpiryClaim,
}

/// Decodes the middle segment of a JWT into its JSON claims.
pub fn decode_claims(token: &str) -> Result<Map<String, Value>, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Segments(segments.len()));
    }

    let payload = segments[1];
    let bytes = URL_SAFE_LENIENT
        .decode(payload)
        .or_else(|_| STANDARD_LENIENT.decode(payload))
        .map_err(|_| TokenError::Encoding)?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(claims)) => Ok(claims),
        _ => Err(TokenError::Payload),
    }
}

/// Reads the `exp` claim in Unix seconds. An empty claim (missing, `null`,
/// `0`, `false` or `""`) means the token carries no expiry. Numeric strings
/// are read as numbers; any other value is rejected.
pub fn expiry_claim(token: &str) -> Result<Option<f64>, TokenError> {
    let claims = decode_claims(token)?;
    let exp = match claims.get("exp") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return Ok(None),
        Some(Value::String(s)) if s.is_empty() => return Ok(None),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(exp) if exp == 0.0 => return Ok(None),
            other => other,
        },
        // Only an empty string is "no claim"; "0" is a real, long-past expiry.
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|exp| exp.is_finite()),
        Some(_) => None,
    };
    exp.map(Some).ok_or(TokenError::ExpiryClaim)
}

/// Returns `true` when the token is malformed or its `exp` is at or before `now`.
pub fn is_token_expired(token: &str, now: DateTime<Utc>) -> bool {
    match expiry_claim(token) {
        Ok(Some(exp)) => now.timestamp() as f64 >= exp,
        Ok(None) => false,
        Err(e) => {
            tracing::warn!("Error decoding token: {}", e);
            true
        }
    }
}

/// Seconds remaining before `exp`, negative once expired, `None` without a claim.
pub fn seconds_until_expiry(token: &str, now: DateTime<Utc>) -> Result<Option<i64>, TokenError> {
    Ok(expiry_claim(token)?.map(|exp| exp.floor() as i64 - now.timestamp()))
}

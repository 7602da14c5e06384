/// Slack request signature verification
///
/// Slack signs every request with `HMAC-SHA256(signing_secret, "v0:{timestamp}:{body}")`
/// and sends the hex digest as `X-Slack-Signature: v0=<hex>` next to
/// `X-Slack-Request-Timestamp`. Requests older or newer than five minutes are
/// rejected to bound replay.
///
/// See <https://api.slack.com/authentication/verifying-requests-from-slack>

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::error::SlackError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request timestamp
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Header carrying the signature
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Maximum allowed clock distance, in seconds
pub const MAX_CLOCK_SKEW_SECS: i64 = 300;

const VERSION_PREFIX: &str = "v0=";

/// Verifies a Slack request against the current time
pub fn verify_request(
    signing_secret: &str,
    timestamp: &str,
    signature: &str,
    body: &[u8],
) -> Result<(), SlackError> {
    verify_request_at(Utc::now().timestamp(), signing_secret, timestamp, signature, body)
}

/// Verifies a Slack request as of `now` (unix seconds)
pub fn verify_request_at(
    now: i64,
    signing_secret: &str,
    timestamp: &str,
    signature: &str,
    body: &[u8],
) -> Result<(), SlackError> {
    let ts: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| SlackError::InvalidSignature("Invalid timestamp".to_string()))?;

    if now.abs_diff(ts) > MAX_CLOCK_SKEW_SECS.unsigned_abs() {
        return Err(SlackError::InvalidSignature(
            "Request timestamp outside the allowed window".to_string(),
        ));
    }

    let provided = signature
        .strip_prefix(VERSION_PREFIX)
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
        .ok_or_else(|| SlackError::InvalidSignature("Malformed signature".to_string()))?;

    let mac = signing_mac(signing_secret, timestamp, body)?;

    // verify_slice compares in constant time
    mac.verify_slice(&provided)
        .map_err(|_| SlackError::InvalidSignature("Signature mismatch".to_string()))
}

/// Computes the `v0=<hex>` signature Slack would send for `body`
pub fn compute_signature(
    signing_secret: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<String, SlackError> {
    let mac = signing_mac(signing_secret, timestamp, body)?;
    Ok(format!(
        "{}{}",
        VERSION_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn signing_mac(signing_secret: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, SlackError> {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|e| SlackError::InvalidSignature(e.to_string()))?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(mac)
}

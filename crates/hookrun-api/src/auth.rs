//! Request authentication: the admin API key and GitHub-style webhook
//! signatures.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verify a `sha256=<hex>` HMAC-SHA256 signature of `body` keyed by `key`.
///
/// The digest comparison is constant-time.
pub fn verify_signature(key: &[u8], body: &[u8], signature: &str) -> bool {
    let Some(hex_sig) = signature.trim().strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    keyed_digest(key, body).is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}

/// The `X-Hub-Signature-256` value a sender computes for `body`, or `None`
/// when `key` cannot key the HMAC.
pub fn sign(key: &[u8], body: &[u8]) -> Option<String> {
    let mac = keyed_digest(key, body)?;
    Some(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn keyed_digest(key: &[u8], body: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(body);
    Some(mac)
}

/// Compare two byte strings without short-circuiting on the first
/// difference.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

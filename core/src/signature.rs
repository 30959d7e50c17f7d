//! HMAC-SHA256 webhook signatures.
//!
//! The sender signs the exact request body with the webhook secret and
//! sends `X-Webhook-Signature: sha256=<lowercase hex>`. Verification must
//! run on the bytes as received; re-serializing the JSON first would change
//! them.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Required prefix of the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Header carrying the signature on inbound webhook requests.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

fn digest_hex(body: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Compute the header value for `body` signed with `secret`.
pub fn sign(body: &[u8], secret: &str) -> String {
    format!("{SIGNATURE_PREFIX}{}", digest_hex(body, secret))
}

/// Check `signature` (the full header value) against `body` and `secret`.
///
/// Returns `false` without computing anything when the `sha256=` prefix is
/// missing. The digest comparison is constant-time.
pub fn verify_signature(body: &[u8], signature: &str, secret: &str) -> bool {
    let Some(provided) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let expected = digest_hex(body, secret);
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

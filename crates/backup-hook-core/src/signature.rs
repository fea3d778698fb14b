//! Webhook signature computation and verification.
//!
//! Signatures are `HMAC-SHA256(secret, raw_body)`, hex-encoded and prefixed with
//! `sha256=` on the wire. Verification always runs over the exact bytes
//! received; callers must not decode and re-encode the body first.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::secret::Secret;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Algorithm prefix on the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

fn keyed_mac(secret: &Secret) -> HmacSha256 {
    // INVARIANT: HMAC-SHA256 accepts keys of any size per RFC 2104, so
    // `new_from_slice` only fails if the Hmac implementation is broken.
    HmacSha256::new_from_slice(secret.expose()).expect("HMAC-SHA256 accepts any key size")
}

/// Compute the `X-Signature` header value for `body`.
///
/// Returns `sha256=` followed by 64 lowercase hex characters.
#[must_use]
pub fn sign(body: &[u8], secret: &Secret) -> String {
    let mut mac = keyed_mac(secret);
    mac.update(body);
    format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    )
}

/// Verify a signature header value against the raw request body.
///
/// The `sha256=` prefix is stripped when present and tolerated when absent.
/// Malformed hex yields `false`. The MAC comparison is constant-time.
#[must_use]
pub fn verify(body: &[u8], header_value: &str, secret: &Secret) -> bool {
    let encoded = header_value
        .strip_prefix(SIGNATURE_PREFIX)
        .unwrap_or(header_value);

    let Ok(received) = hex::decode(encoded) else {
        return false;
    };

    let mut mac = keyed_mac(secret);
    mac.update(body);
    mac.verify_slice(&received).is_ok()
}

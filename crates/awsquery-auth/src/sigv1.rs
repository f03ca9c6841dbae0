//! Query signature version 1.
//!
//! The legacy scheme used by DevPay and early queue-style APIs:
//!
//! ```text
//! StringToSign = name1 + value1 + name2 + value2 + ...
//! Signature    = Base64(HMAC-SHA1(SecretKey, StringToSign))
//! ```
//!
//! Parameters are sorted by name ignoring case, values are used raw (not
//! URL-encoded), and nothing separates the pieces.

use std::cmp::Ordering;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, KeyInit, Mac};
use sha1::Sha1;
use tracing::debug;

use crate::canonical::SIGNATURE;
use crate::{Parameters, Signed};

type HmacSha1 = Hmac<Sha1>;

/// Build the version 1 string to sign.
///
/// `Signature` is excluded even if present in `params`.
#[must_use]
pub fn string_to_sign(params: &Parameters) -> String {
    let mut entries: Vec<(&String, &String)> = params
        .iter()
        .filter(|(key, _)| key.as_str() != SIGNATURE)
        .collect();
    entries.sort_by(|(a, _), (b, _)| compare_ignore_case(a, b));

    let mut data = String::new();
    for (key, value) in entries {
        data.push_str(key);
        data.push_str(value);
    }
    data
}

/// Sign `params` with version 1.
#[must_use]
pub fn sign(secret_key: &str, params: &Parameters) -> Signed {
    let string_to_sign = string_to_sign(params);
    debug!(string_to_sign = %string_to_sign, "built V1 string to sign");
    let signature = compute_signature(secret_key, &string_to_sign);
    Signed {
        string_to_sign,
        signature,
    }
}

/// Compute Base64(HMAC-SHA1(secret, data)).
#[must_use]
pub fn compute_signature(secret_key: &str, data: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(secret_key.as_bytes()).expect("HMAC can accept any key length");
    mac.update(data.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// ASCII case-insensitive ordering with a byte-order tie break, so that keys
/// differing only in case still sort deterministically.
fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
        .then_with(|| a.cmp(b))
}

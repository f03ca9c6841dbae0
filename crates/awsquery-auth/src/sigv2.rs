//! Query signature version 2.
//!
//! Used by EC2, SQS, SimpleDB and Product Advertising:
//!
//! ```text
//! StringToSign = HTTP-Verb + "\n" +
//!                lowercase(Host) + "\n" +
//!                HTTPRequestURI + "\n" +
//!                CanonicalizedQueryString
//! Signature    = Base64(HMAC-SHA256(SecretKey, StringToSign))
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::canonical::{canonical_query_string, endpoint_host, endpoint_path};
use crate::error::AuthError;
use crate::{Parameters, Signed};

type HmacSha256 = Hmac<Sha256>;

/// Build the version 2 string to sign.
///
/// `path` overrides the endpoint's own path; when `None`, the endpoint path
/// is used (or `/` if it has none).
///
/// # Errors
///
/// Returns [`AuthError::InvalidEndpoint`] if the endpoint has no host.
pub fn string_to_sign(
    method: &http::Method,
    endpoint: &str,
    path: Option<&str>,
    params: &Parameters,
) -> Result<String, AuthError> {
    let host = endpoint_host(endpoint)?;
    let path = match path {
        Some(p) if !p.is_empty() => p.to_owned(),
        _ => endpoint_path(endpoint)?,
    };
    let query = canonical_query_string(params);
    Ok(format!("{method}\n{host}\n{path}\n{query}"))
}

/// Sign `params` with version 2.
///
/// # Errors
///
/// Returns [`AuthError::InvalidEndpoint`] if the endpoint has no host.
pub fn sign(
    method: &http::Method,
    endpoint: &str,
    path: Option<&str>,
    secret_key: &str,
    params: &Parameters,
) -> Result<Signed, AuthError> {
    let string_to_sign = string_to_sign(method, endpoint, path, params)?;
    debug!(string_to_sign = ?string_to_sign, "built V2 string to sign");
    let signature = compute_signature(secret_key, &string_to_sign);
    Ok(Signed {
        string_to_sign,
        signature,
    })
}

/// Compute Base64(HMAC-SHA256(secret, data)).
#[must_use]
pub fn compute_signature(secret_key: &str, data: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret_key.as_bytes()).expect("HMAC can accept any key length");
    mac.update(data.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

//! S3 REST request signing (header-based, HMAC-SHA1).
//!
//! The `Authorization` header has the format:
//!
//! ```text
//! AWS <AWSAccessKeyId>:<Signature>
//! ```
//!
//! Where `Signature = Base64(HMAC-SHA1(SecretKey, StringToSign))` and:
//!
//! ```text
//! StringToSign = HTTP-Verb + "\n" +
//!                Content-MD5 + "\n" +
//!                Content-Type + "\n" +
//!                Date + "\n" +
//!                CanonicalizedAmzHeaders +
//!                CanonicalizedResource
//! ```

use std::collections::BTreeMap;

use http::HeaderMap;
use tracing::debug;

use crate::sigv1::compute_signature;

/// S3 sub-resources that must be included in the canonical resource.
const SUB_RESOURCES: &[&str] = &[
    "acl",
    "cors",
    "delete",
    "lifecycle",
    "location",
    "logging",
    "notification",
    "partNumber",
    "policy",
    "requestPayment",
    "response-cache-control",
    "response-content-disposition",
    "response-content-encoding",
    "response-content-language",
    "response-content-type",
    "response-expires",
    "restore",
    "tagging",
    "torrent",
    "uploadId",
    "uploads",
    "versionId",
    "versioning",
    "versions",
    "website",
];

/// Build the S3 REST string to sign.
///
/// `resource` is the path-style resource (`/bucket/key`); `query` holds the
/// decoded query parameters of the request, of which only sub-resources are
/// signed.
#[must_use]
pub fn string_to_sign(
    method: &http::Method,
    headers: &HeaderMap,
    resource: &str,
    query: &[(String, String)],
) -> String {
    // x-amz-date, when sent, is signed among the amz headers instead.
    let date = if headers.contains_key("x-amz-date") {
        String::new()
    } else {
        header(headers, "date")
    };
    format!(
        "{method}\n{}\n{}\n{date}\n{}{}",
        header(headers, "content-md5"),
        header(headers, "content-type"),
        canonicalized_amz_headers(headers),
        canonicalized_resource(resource, query),
    )
}

/// Build the `Authorization` header value for a signed S3 request.
#[must_use]
pub fn authorization(access_key_id: &str, secret_key: &str, string_to_sign: &str) -> String {
    debug!(string_to_sign = ?string_to_sign, "signing S3 request");
    let signature = compute_signature(secret_key, string_to_sign);
    format!("AWS {access_key_id}:{signature}")
}

/// `x-amz-*` headers as sorted `name:value\n` lines, repeated names joined by commas.
fn canonicalized_amz_headers(headers: &HeaderMap) -> String {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, value) in headers {
        if name.as_str().starts_with("x-amz-") {
            grouped
                .entry(name.as_str())
                .or_default()
                .push(value.to_str().map(str::trim).unwrap_or_default());
        }
    }
    grouped
        .into_iter()
        .map(|(name, values)| format!("{name}:{}\n", values.join(",")))
        .collect()
}

/// `resource`, followed by the signed sub-resources of `query` in name order.
fn canonicalized_resource(resource: &str, query: &[(String, String)]) -> String {
    let signed: BTreeMap<&str, &str> = query
        .iter()
        .filter(|(name, _)| SUB_RESOURCES.contains(&name.as_str()))
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    if signed.is_empty() {
        return resource.to_owned();
    }

    let rendered = signed
        .into_iter()
        .map(|(name, value)| match value {
            "" => name.to_owned(),
            value => format!("{name}={value}"),
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{resource}?{rendered}")
}

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_default()
}

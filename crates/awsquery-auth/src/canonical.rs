//! Canonicalization of query parameters and endpoints.
//!
//! The query-string signing schemes need three pieces of a request in a
//! normalized form:
//!
//! ```text
//! host       lowercase, no scheme, port kept when present
//! path       URI path, `/` when empty
//! query      key=value pairs sorted by byte value, RFC 3986 encoded, joined with `&`
//! ```

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::Parameters;
use crate::error::AuthError;

/// Name of the parameter that carries the computed signature.
pub const SIGNATURE: &str = "Signature";

/// Characters escaped in query keys and values.
///
/// Everything except the RFC 3986 unreserved set (A-Z, a-z, 0-9, `-`, `_`,
/// `.`, `~`) is encoded. Space becomes `%20`, never `+`.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a query key or value with the AWS encoding rules.
///
/// # Examples
///
/// ```
/// use awsquery_auth::canonical::percent_encode;
///
/// assert_eq!(percent_encode("Johnny Depp"), "Johnny%20Depp");
/// assert_eq!(percent_encode("a,b~c"), "a%2Cb~c");
/// ```
#[must_use]
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, QUERY_ENCODE_SET).to_string()
}

/// Build the canonical query string used by signature version 2.
///
/// Keys are sorted case-sensitively by byte value and the `Signature`
/// parameter is skipped.
///
/// # Examples
///
/// ```
/// use awsquery_auth::Parameters;
/// use awsquery_auth::canonical::canonical_query_string;
///
/// let mut params = Parameters::new();
/// params.insert("b".to_owned(), "2".to_owned());
/// params.insert("B".to_owned(), "x y".to_owned());
/// params.insert("Signature".to_owned(), "ignored".to_owned());
/// assert_eq!(canonical_query_string(&params), "B=x%20y&b=2");
/// ```
#[must_use]
pub fn canonical_query_string(params: &Parameters) -> String {
    params
        .iter()
        .filter(|(key, _)| key.as_str() != SIGNATURE)
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Extract the lowercase host (with port, if any) from an endpoint URI.
///
/// # Errors
///
/// Returns [`AuthError::InvalidEndpoint`] if the endpoint has no host.
pub fn endpoint_host(endpoint: &str) -> Result<String, AuthError> {
    let uri = parse_endpoint(endpoint)?;
    let host = uri
        .host()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AuthError::InvalidEndpoint(endpoint.to_owned()))?
        .to_ascii_lowercase();
    Ok(match uri.port_u16() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}

/// Extract the URI path from an endpoint, normalizing an empty path to `/`.
///
/// # Errors
///
/// Returns [`AuthError::InvalidEndpoint`] if the endpoint cannot be parsed.
pub fn endpoint_path(endpoint: &str) -> Result<String, AuthError> {
    let uri = parse_endpoint(endpoint)?;
    let path = uri.path();
    Ok(if path.is_empty() {
        "/".to_owned()
    } else {
        path.to_owned()
    })
}

fn parse_endpoint(endpoint: &str) -> Result<http::Uri, AuthError> {
    let uri: http::Uri = endpoint
        .parse()
        .map_err(|_| AuthError::InvalidEndpoint(endpoint.to_owned()))?;
    if uri.scheme().is_none() {
        return Err(AuthError::InvalidEndpoint(endpoint.to_owned()));
    }
    Ok(uri)
}

//! Request signing for the Amazon query and REST APIs.
//!
//! Two incompatible query-string schemes are supported, selected by the
//! calling service through [`SignatureVersion`]:
//!
//! - **Version 1**: parameter names sorted ignoring case, `name + value`
//!   concatenated without separators, signed with HMAC-SHA1.
//! - **Version 2**: `METHOD\nhost\npath\nquery` where the query is sorted by
//!   byte value and RFC 3986 encoded, signed with HMAC-SHA256.
//!
//! S3 uses its own header-based scheme, see [`s3`].
//!
//! The engine never injects timestamps or auth fields: callers add those to
//! the parameter map before signing. A `Signature` entry already in the map
//! is always ignored.
//!
//! # Usage
//!
//! ```rust
//! use awsquery_auth::{Parameters, SignatureVersion, sign};
//!
//! let mut params = Parameters::new();
//! params.insert("Action".to_owned(), "DescribeRegions".to_owned());
//! params.insert("Timestamp".to_owned(), "2009-11-11T13:52:38Z".to_owned());
//!
//! let signed = sign(
//!     SignatureVersion::V2,
//!     "https://ec2.amazonaws.com/",
//!     &http::Method::POST,
//!     None,
//!     "secret",
//!     &params,
//! )
//! .unwrap();
//! assert!(signed.string_to_sign.starts_with("POST\nec2.amazonaws.com\n/\n"));
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Percent-encoding and query/endpoint canonicalization
//! - [`error`] - Signing error types
//! - [`s3`] - S3 REST `Authorization` header signing
//! - [`sigv1`] - Signature version 1 (HMAC-SHA1)
//! - [`sigv2`] - Signature version 2 (HMAC-SHA256)

use std::collections::BTreeMap;
use std::fmt;

pub mod canonical;
pub mod error;
pub mod s3;
pub mod sigv1;
pub mod sigv2;

pub use canonical::SIGNATURE;
pub use error::AuthError;

/// Request parameters, name to value.
///
/// Iteration order carries no meaning for signing; each scheme sorts the
/// keys with its own rule.
pub type Parameters = BTreeMap<String, String>;

/// Output of the signature engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signed {
    /// The exact bytes that were fed to the HMAC.
    pub string_to_sign: String,
    /// Base64-encoded HMAC digest.
    pub signature: String,
}

/// Query signature scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureVersion {
    /// Case-insensitive concatenation, HMAC-SHA1.
    V1,
    /// Canonical query string, HMAC-SHA256.
    V2,
}

impl SignatureVersion {
    /// Value of the `SignatureVersion` request parameter.
    #[must_use]
    pub fn parameter_value(self) -> &'static str {
        match self {
            Self::V1 => "1",
            Self::V2 => "2",
        }
    }

    /// Value of the `SignatureMethod` request parameter.
    #[must_use]
    pub fn signature_method(self) -> &'static str {
        match self {
            Self::V1 => "HmacSHA1",
            Self::V2 => "HmacSHA256",
        }
    }
}

impl fmt::Display for SignatureVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.parameter_value())
    }
}

/// Sign `params` with the given scheme.
///
/// `endpoint`, `method` and `path` only feed into version 2; version 1 signs
/// the parameters alone.
///
/// # Errors
///
/// Returns [`AuthError::InvalidEndpoint`] if a version 2 endpoint has no host.
pub fn sign(
    version: SignatureVersion,
    endpoint: &str,
    method: &http::Method,
    path: Option<&str>,
    secret_key: &str,
    params: &Parameters,
) -> Result<Signed, AuthError> {
    match version {
        SignatureVersion::V1 => Ok(sigv1::sign(secret_key, params)),
        SignatureVersion::V2 => sigv2::sign(method, endpoint, path, secret_key, params),
    }
}

/// Sign `params` and store the result under `Signature`.
///
/// # Errors
///
/// Returns [`AuthError::InvalidEndpoint`] if a version 2 endpoint has no host.
pub fn sign_in_place(
    version: SignatureVersion,
    endpoint: &str,
    method: &http::Method,
    path: Option<&str>,
    secret_key: &str,
    params: &mut Parameters,
) -> Result<Signed, AuthError> {
    let signed = sign(version, endpoint, method, path, secret_key, params)?;
    params.insert(SIGNATURE.to_owned(), signed.signature.clone());
    Ok(signed)
}

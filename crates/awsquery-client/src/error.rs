//! Client error types.
//!
//! [`ClientError`] is the single error returned by every service client. It
//! wraps the errors of the lower crates so callers match on one type.

use awsquery_auth::AuthError;
use awsquery_core::CoreError;
use awsquery_xml::ServiceError;

use crate::transport::TransportError;

/// Error codes the services use for throttling.
const THROTTLING_CODES: &[&str] = &["RequestThrottled", "ServiceUnavailable", "Throttling"];

/// Errors returned by service clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The client configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] CoreError),

    /// The request could not be signed.
    #[error("signing error: {0}")]
    Auth(#[from] AuthError),

    /// The transport failed before a response arrived.
    #[error("request failed: {source}")]
    Transport {
        /// The underlying transport failure.
        #[from]
        source: TransportError,
    },

    /// The service answered with an HTTP error and no parseable error body.
    #[error("An error occurred sending request. Status code: {status}")]
    Http {
        /// HTTP status code of the response.
        status: http::StatusCode,
    },

    /// The service reported an error in the response body.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The response body is not well-formed XML.
    #[error("invalid response document (status {status})")]
    InvalidDocument {
        /// HTTP status code of the response.
        status: http::StatusCode,
    },

    /// A bucket name violates the S3 naming rules.
    #[error("invalid bucket name '{name}': {reason}")]
    InvalidBucketName {
        /// The rejected name.
        name: String,
        /// The violated rule.
        reason: String,
    },

    /// A `SimpleDB` domain name violates the naming rules.
    #[error("invalid domain name '{name}': {reason}")]
    InvalidDomainName {
        /// The rejected name.
        name: String,
        /// The violated rule.
        reason: String,
    },

    /// A `SimpleDB` select identifier cannot be quoted.
    #[error("Invalid name: can contain only alphanumeric characters, $ and _ (got '{0}')")]
    InvalidName(String),

    /// An object reference is not of the form `bucket/key`.
    #[error("invalid object reference '{0}', expected 'bucket/key'")]
    InvalidObjectRef(String),

    /// A query builder was used out of order.
    #[error("invalid query: {0}")]
    Query(String),

    /// A stream read failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether the error says the service is throttling the caller.
    #[must_use]
    pub fn is_throttling(&self) -> bool {
        match self {
            Self::Service(error) => {
                let message = error.message.to_ascii_lowercase();
                THROTTLING_CODES.contains(&error.code.as_str())
                    || message.contains("throttl")
                    || message.contains("unavailable")
            }
            Self::Http { status } => {
                *status == http::StatusCode::SERVICE_UNAVAILABLE
                    || *status == http::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

/// Convenience result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

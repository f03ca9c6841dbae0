//! Error types for client configuration.

/// Configuration error raised eagerly while building a client.
///
/// These are never retried: they describe a caller mistake, not a
/// transient condition.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The Product Advertising country code is not in the endpoint table.
    #[error("Unknown country code: {0}")]
    UnknownLocale(String),

    /// The API version is not a `YYYY-MM-DD` date.
    #[error("{0} is an invalid API Version")]
    InvalidApiVersion(String),

    /// A service endpoint could not be parsed as an absolute URI.
    #[error("Invalid endpoint supplied: {0}")]
    InvalidEndpoint(String),

    /// No access key id was configured.
    #[error("missing access key id")]
    MissingAccessKey,
}

/// Convenience result type for configuration operations.
pub type CoreResult<T> = Result<T, CoreError>;

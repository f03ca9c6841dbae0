//! Error types for request signing.

/// Errors that can occur while building a string to sign.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The endpoint is not an absolute URI with a host.
    #[error("Invalid endpoint supplied: {0}")]
    InvalidEndpoint(String),

    /// Signing was requested but no secret key is configured.
    #[error("a secret key is required to sign this request")]
    MissingSecretKey,
}

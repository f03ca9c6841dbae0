//! Client configuration.
//!
//! A [`ClientConfig`] is built once, validated, and then shared read-only by
//! every request a client makes. The API version lives here as a per-instance
//! field so two clients can talk to different API versions side by side.

use typed_builder::TypedBuilder;

use crate::credentials::Credentials;
use crate::error::CoreError;
use crate::types::{ApiVersion, Locale};

/// Default SimpleDB endpoint.
const SIMPLEDB_ENDPOINT: &str = "https://sdb.amazonaws.com/";

/// Default EC2 query endpoint.
const EC2_ENDPOINT: &str = "https://ec2.amazonaws.com/";

/// Default S3 REST endpoint.
const S3_ENDPOINT: &str = "http://s3.amazonaws.com";

/// Immutable configuration shared by all service clients.
///
/// # Examples
///
/// ```
/// use awsquery_core::{ClientConfig, Credentials, Locale};
///
/// let config = ClientConfig::builder()
///     .credentials(Credentials::new("AKID", "secret").unwrap())
///     .locale(Locale::Uk)
///     .build();
/// assert_eq!(config.product_endpoint(), "http://webservices.amazon.co.uk");
/// assert_eq!(config.api_version.as_str(), "2011-08-01");
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct ClientConfig {
    /// Access key id and optional secret key.
    pub credentials: Credentials,

    /// Product Advertising marketplace.
    #[builder(default)]
    pub locale: Locale,

    /// Use HTTPS for the Product Advertising endpoint.
    #[builder(default = false)]
    pub use_https: bool,

    /// Product Advertising API version.
    #[builder(default)]
    pub api_version: ApiVersion,

    /// SimpleDB endpoint URL.
    #[builder(default = String::from(SIMPLEDB_ENDPOINT), setter(into))]
    pub simpledb_endpoint: String,

    /// EC2 query endpoint URL.
    #[builder(default = String::from(EC2_ENDPOINT), setter(into))]
    pub ec2_endpoint: String,

    /// S3 REST endpoint URL.
    #[builder(default = String::from(S3_ENDPOINT), setter(into))]
    pub s3_endpoint: String,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `AWS_ACCESS_KEY_ID` | required |
    /// | `AWS_SECRET_ACCESS_KEY` | unsigned requests |
    /// | `AWS_PA_LOCALE` | `US` |
    /// | `AWS_USE_HTTPS` | `false` |
    /// | `AWS_PA_API_VERSION` | `2011-08-01` |
    /// | `AWS_SIMPLEDB_ENDPOINT` | `https://sdb.amazonaws.com/` |
    /// | `AWS_EC2_ENDPOINT` | `https://ec2.amazonaws.com/` |
    /// | `AWS_S3_ENDPOINT` | `http://s3.amazonaws.com` |
    ///
    /// # Errors
    /// Returns a [`CoreError`] if a variable holds an invalid value or the
    /// access key id is missing.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let access_key = lookup("AWS_ACCESS_KEY_ID").ok_or(CoreError::MissingAccessKey)?;
        let credentials = match lookup("AWS_SECRET_ACCESS_KEY") {
            Some(secret) => Credentials::new(access_key, secret)?,
            None => Credentials::anonymous(access_key)?,
        };

        let mut config = Self::builder().credentials(credentials).build();

        if let Some(v) = lookup("AWS_PA_LOCALE") {
            config.locale = v.parse()?;
        }
        if let Some(v) = lookup("AWS_USE_HTTPS") {
            config.use_https = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Some(v) = lookup("AWS_PA_API_VERSION") {
            config.api_version = ApiVersion::new(v)?;
        }
        if let Some(v) = lookup("AWS_SIMPLEDB_ENDPOINT") {
            config.simpledb_endpoint = v;
        }
        if let Some(v) = lookup("AWS_EC2_ENDPOINT") {
            config.ec2_endpoint = v;
        }
        if let Some(v) = lookup("AWS_S3_ENDPOINT") {
            config.s3_endpoint = v;
        }

        config.validate()?;
        tracing::debug!(
            access_key_id = %config.credentials.access_key_id(),
            locale = %config.locale,
            signed = config.credentials.can_sign(),
            "loaded client configuration from environment"
        );
        Ok(config)
    }

    /// Check that every configured endpoint is an absolute `http(s)` URI.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidEndpoint`] naming the first bad endpoint.
    pub fn validate(&self) -> Result<(), CoreError> {
        for endpoint in [&self.simpledb_endpoint, &self.ec2_endpoint, &self.s3_endpoint] {
            validate_endpoint(endpoint)?;
        }
        Ok(())
    }

    /// Base URI of the Product Advertising endpoint for the configured locale.
    #[must_use]
    pub fn product_endpoint(&self) -> String {
        self.locale.base_uri(self.use_https)
    }
}

/// Validate that `endpoint` is an absolute `http` or `https` URI with a host.
///
/// # Errors
/// Returns [`CoreError::InvalidEndpoint`] otherwise.
pub(crate) fn validate_endpoint(endpoint: &str) -> Result<(), CoreError> {
    let uri: http::Uri = endpoint
        .parse()
        .map_err(|_| CoreError::InvalidEndpoint(endpoint.to_owned()))?;
    let scheme_ok = matches!(uri.scheme_str(), Some("http" | "https"));
    if !scheme_ok || uri.host().is_none_or(str::is_empty) {
        return Err(CoreError::InvalidEndpoint(endpoint.to_owned()));
    }
    Ok(())
}

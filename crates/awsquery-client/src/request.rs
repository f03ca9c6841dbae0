//! Building the final, signed parameter map of a request.
//!
//! Two flavors exist. Product Advertising requests go through
//! [`prepare_request`]: they identify the service and operation in the query
//! string, carry a `ResponseGroup` list and are only signed when a secret key
//! is configured. EC2, `SimpleDB` and SQS requests go through
//! [`QueryRequestBuilder`], which always signs and names the signature scheme
//! in the parameters.
//!
//! Both work on a copy of the caller's parameters.

use awsquery_auth::{AuthError, Parameters, SIGNATURE, SignatureVersion, sign_in_place};
use awsquery_core::{ClientConfig, Clock, Credentials, format_timestamp};
use http::Method;
use tracing::debug;

/// Service identifier sent with every Product Advertising request.
pub const PRODUCT_SERVICE: &str = "AWSECommerceService";

/// Request path of the Product Advertising REST endpoint.
pub const PRODUCT_PATH: &str = "/onca/xml";

/// Response group that makes the service echo request validation details.
pub const REQUEST_GROUP: &str = "Request";

/// Append `Request` to a comma-separated response group list if missing.
///
/// ```
/// use awsquery_client::request::ensure_response_group;
///
/// assert_eq!(ensure_response_group("Small"), "Small,Request");
/// assert_eq!(ensure_response_group("Request,Small"), "Request,Small");
/// ```
#[must_use]
pub fn ensure_response_group(value: &str) -> String {
    if value.split(',').any(|group| group == REQUEST_GROUP) {
        return value.to_owned();
    }
    if value.is_empty() {
        return REQUEST_GROUP.to_owned();
    }
    format!("{value},{REQUEST_GROUP}")
}

/// Build the parameters of a Product Advertising request.
///
/// `defaults` fill in anything the caller left out. The access key, service,
/// operation and API version always come from the client. When the
/// credentials carry a secret key, a `Timestamp` is stamped from `clock` and
/// the map is signed with signature version 2 as a `GET` of
/// [`PRODUCT_PATH`]; otherwise the request is left unsigned.
///
/// # Errors
///
/// Returns [`AuthError`] if the configured endpoint cannot be signed.
pub fn prepare_request(
    operation: &str,
    params: &Parameters,
    defaults: &Parameters,
    config: &ClientConfig,
    clock: &dyn Clock,
) -> Result<Parameters, AuthError> {
    let mut prepared = defaults.clone();
    prepared.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
    prepared.remove(SIGNATURE);

    prepared.insert(
        "AWSAccessKeyId".to_owned(),
        config.credentials.access_key_id().to_owned(),
    );
    prepared.insert("Service".to_owned(), PRODUCT_SERVICE.to_owned());
    prepared.insert("Operation".to_owned(), operation.to_owned());
    prepared.insert("Version".to_owned(), config.api_version.as_str().to_owned());

    if let Some(group) = prepared.get_mut("ResponseGroup") {
        *group = ensure_response_group(group);
    }

    let Some(secret_key) = config.credentials.secret_key() else {
        debug!(operation, "no secret key configured, sending unsigned request");
        return Ok(prepared);
    };

    prepared.insert("Timestamp".to_owned(), format_timestamp(clock.now()));
    let endpoint = config.product_endpoint();
    sign_in_place(
        SignatureVersion::V2,
        &endpoint,
        &Method::GET,
        Some(PRODUCT_PATH),
        secret_key,
        &mut prepared,
    )?;
    debug!(operation, endpoint = %endpoint, "prepared signed request");
    Ok(prepared)
}

/// Builds signed parameter maps for the EC2, `SimpleDB` and SQS query APIs.
///
/// # Examples
///
/// ```
/// use awsquery_auth::{Parameters, SignatureVersion};
/// use awsquery_client::request::QueryRequestBuilder;
/// use awsquery_core::{Credentials, SystemClock};
///
/// let credentials = Credentials::new("AKID", "secret").unwrap();
/// let builder = QueryRequestBuilder::new(&credentials, "https://sdb.amazonaws.com/", "2009-04-15");
///
/// let mut params = Parameters::new();
/// params.insert("Action".to_owned(), "ListDomains".to_owned());
/// let signed = builder.build(&params, &SystemClock).unwrap();
///
/// assert_eq!(signed["SignatureMethod"], "HmacSHA256");
/// assert!(signed.contains_key("Signature"));
/// ```
#[derive(Debug, Clone)]
pub struct QueryRequestBuilder<'a> {
    credentials: &'a Credentials,
    endpoint: &'a str,
    version: &'a str,
    method: Method,
    signature_version: SignatureVersion,
}

impl<'a> QueryRequestBuilder<'a> {
    /// Create a builder for `POST` requests signed with version 2.
    #[must_use]
    pub fn new(credentials: &'a Credentials, endpoint: &'a str, version: &'a str) -> Self {
        Self {
            credentials,
            endpoint,
            version,
            method: Method::POST,
            signature_version: SignatureVersion::V2,
        }
    }

    /// The HTTP method the request will be sent with.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// The signature scheme.
    #[must_use]
    pub fn signature_version(mut self, version: SignatureVersion) -> Self {
        self.signature_version = version;
        self
    }

    /// Add the auth, version and timestamp parameters and sign.
    ///
    /// A `Timestamp` already present in `params` is kept.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingSecretKey`] for anonymous credentials and
    /// [`AuthError::InvalidEndpoint`] if the endpoint cannot be signed.
    pub fn build(&self, params: &Parameters, clock: &dyn Clock) -> Result<Parameters, AuthError> {
        let secret_key = self
            .credentials
            .secret_key()
            .ok_or(AuthError::MissingSecretKey)?;

        let mut prepared = params.clone();
        prepared.remove(SIGNATURE);
        prepared.insert(
            "AWSAccessKeyId".to_owned(),
            self.credentials.access_key_id().to_owned(),
        );
        prepared.insert(
            "SignatureVersion".to_owned(),
            self.signature_version.parameter_value().to_owned(),
        );
        if self.signature_version == SignatureVersion::V2 {
            prepared.insert(
                "SignatureMethod".to_owned(),
                self.signature_version.signature_method().to_owned(),
            );
        }
        prepared.insert("Version".to_owned(), self.version.to_owned());
        prepared
            .entry("Timestamp".to_owned())
            .or_insert_with(|| format_timestamp(clock.now()));

        sign_in_place(
            self.signature_version,
            self.endpoint,
            &self.method,
            None,
            secret_key,
            &mut prepared,
        )?;
        Ok(prepared)
    }
}

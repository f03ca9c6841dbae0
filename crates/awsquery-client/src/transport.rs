//! The HTTP seam between service clients and the network.
//!
//! Clients never open connections themselves. They hand a fully built
//! [`HttpRequest`] to an [`HttpTransport`] and get an [`HttpResponse`] back,
//! which keeps every client testable with an in-memory transport.
//!
//! A blocking [`reqwest`](https://docs.rs/reqwest) transport is available
//! behind the `reqwest` feature.

use std::fmt;

use awsquery_auth::Parameters;
use awsquery_xml::ServiceResponse;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

/// Content type of a form-encoded POST body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Failure to obtain any response at all.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request URL could not be used.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// The backend failed (connection refused, timeout, TLS).
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Wrap a backend error.
    pub fn backend(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(error))
    }
}

/// Sends requests and returns responses.
pub trait HttpTransport: Send + Sync + fmt::Debug {
    /// Send `request` and wait for the complete response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if no response was received. HTTP error
    /// statuses are responses, not transport errors.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// An outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// URL without the query string.
    pub url: String,
    /// Query string parameters, in send order.
    pub query: Vec<(String, String)>,
    /// Form body parameters for POST requests.
    pub form: Option<Vec<(String, String)>>,
    /// Request headers.
    pub headers: HeaderMap,
}

impl HttpRequest {
    /// Create a request with no parameters or headers.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            form: None,
            headers: HeaderMap::new(),
        }
    }

    /// Send `params` in the query string.
    #[must_use]
    pub fn with_query(mut self, params: &Parameters) -> Self {
        self.query = params.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        self
    }

    /// Send `params` as a form-encoded body.
    #[must_use]
    pub fn with_form(mut self, params: &Parameters) -> Self {
        self.form = Some(params.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
        self.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static(FORM_CONTENT_TYPE),
        );
        self
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// The URL with the encoded query string appended.
    #[must_use]
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{}", self.url, encode_pairs(&self.query))
    }

    /// The encoded form body, if this is a form request.
    #[must_use]
    pub fn form_body(&self) -> Option<String> {
        self.form.as_deref().map(encode_pairs)
    }
}

/// A received response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Complete response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Hand the response to the lazy XML parser.
    #[must_use]
    pub fn into_service_response(self) -> ServiceResponse {
        ServiceResponse::new(self.status, self.headers, self.body)
    }
}

fn encode_pairs(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

#[cfg(feature = "reqwest")]
pub use self::blocking::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod blocking {
    use std::time::Duration;

    use super::{HttpRequest, HttpResponse, HttpTransport, TransportError};

    /// Default request timeout.
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Blocking transport backed by `reqwest`.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: reqwest::blocking::Client,
    }

    impl ReqwestTransport {
        /// Create a transport with the default 10 second timeout.
        ///
        /// # Errors
        ///
        /// Returns [`TransportError`] if the TLS backend cannot be initialized.
        pub fn new() -> Result<Self, TransportError> {
            Self::with_timeout(DEFAULT_TIMEOUT)
        }

        /// Create a transport with a custom request timeout.
        ///
        /// # Errors
        ///
        /// Returns [`TransportError`] if the TLS backend cannot be initialized.
        pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
            let client = reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(TransportError::backend)?;
            Ok(Self { client })
        }

        /// Convert a request; its headers, `Content-Type` included, are copied once.
        fn build(&self, request: &HttpRequest) -> Result<reqwest::blocking::Request, TransportError> {
            let url = reqwest::Url::parse(&request.full_url())
                .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
            let mut builder = self
                .client
                .request(request.method.clone(), url)
                .headers(request.headers.clone());
            if let Some(body) = request.form_body() {
                builder = builder.body(body);
            }
            builder.build().map_err(TransportError::backend)
        }
    }

    impl HttpTransport for ReqwestTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let response = self
                .client
                .execute(self.build(request)?)
                .map_err(TransportError::backend)?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().map_err(TransportError::backend)?;
            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }

}

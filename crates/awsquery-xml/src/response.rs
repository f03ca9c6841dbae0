//! Service responses with a lazily parsed body.
//!
//! The body is parsed at most once, on first use. A body that fails to parse
//! leaves the response in the [`DocumentState::Invalid`] state for good: no
//! error is raised and every later query sees "no document".

use std::fmt;
use std::sync::OnceLock;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use tracing::{debug, warn};

use crate::document::Document;
use crate::xpath::XPath;

/// Parse state of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// Nobody has asked for the document yet.
    Unparsed,
    /// The body parsed into a document.
    Valid,
    /// The body is not well-formed XML.
    Invalid,
}

/// An HTTP response from a query-style service.
#[derive(Debug)]
pub struct ServiceResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    namespace: Option<(String, String)>,
    document: OnceLock<Option<Document>>,
}

impl ServiceResponse {
    /// Wrap a received response. Nothing is parsed yet.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            namespace: None,
            document: OnceLock::new(),
        }
    }

    /// Register the namespace alias used by [`Self::xpath`].
    #[must_use]
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespace = Some((prefix.into(), uri.into()));
        self
    }

    /// HTTP status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `true` for 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// `true` for 4xx.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// `true` for 5xx.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Current parse state, without triggering a parse.
    #[must_use]
    pub fn state(&self) -> DocumentState {
        match self.document.get() {
            None => DocumentState::Unparsed,
            Some(Some(_)) => DocumentState::Valid,
            Some(None) => DocumentState::Invalid,
        }
    }

    /// The parsed document, or `None` if the body is not well-formed.
    pub fn document(&self) -> Option<&Document> {
        self.document
            .get_or_init(|| match Document::parse(&self.body) {
                Ok(document) => {
                    debug!(status = %self.status, "parsed response document");
                    Some(document)
                }
                Err(e) => {
                    warn!(status = %self.status, error = %e, "response body is not valid XML");
                    None
                }
            })
            .as_ref()
    }

    /// A query view using the registered namespace, or `None` for an invalid body.
    pub fn xpath(&self) -> Option<XPath<'_>> {
        let document = self.document()?;
        Some(match &self.namespace {
            Some((prefix, uri)) => document.xpath(prefix, uri),
            None => document.xpath("", ""),
        })
    }

    /// The error reported in the body, if `pattern` finds one.
    ///
    /// Returns `None` when the document is invalid or carries no error
    /// element.
    pub fn service_error(&self, pattern: &ErrorPattern) -> Option<ServiceError> {
        let xpath = self.xpath()?;
        let error = xpath.first(pattern.error)?;
        Some(ServiceError {
            code: xpath.evaluate_string(error, pattern.code),
            message: xpath.evaluate_string(error, pattern.message),
        })
    }
}

/// Paths locating the error element and its code and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPattern {
    /// Path to the error element, from the document.
    pub error: &'static str,
    /// Path to the code, relative to the error element.
    pub code: &'static str,
    /// Path to the message, relative to the error element.
    pub message: &'static str,
}

impl ErrorPattern {
    /// EC2, `SimpleDB` and SQS: `<Response><Errors><Error>` without a namespace.
    pub const QUERY: Self = Self {
        error: "//Error",
        code: "Code",
        message: "Message",
    };

    /// Product Advertising: errors live in the service namespace, aliased `az`.
    pub const PRODUCT_ADVERTISING: Self = Self {
        error: "//az:Error",
        code: "az:Code",
        message: "az:Message",
    };
}

/// An error reported by the service inside a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ServiceError {
    /// Create a service error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for ServiceError {}

/// Error codes a service treats as an empty result rather than a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPolicy {
    pattern: ErrorPattern,
    benign: &'static [&'static str],
}

impl ErrorPolicy {
    /// Every reported error is fatal.
    #[must_use]
    pub const fn strict(pattern: ErrorPattern) -> Self {
        Self {
            pattern,
            benign: &[],
        }
    }

    /// Treat the listed codes as benign.
    #[must_use]
    pub const fn with_benign(pattern: ErrorPattern, benign: &'static [&'static str]) -> Self {
        Self { pattern, benign }
    }

    /// The error paths this policy reads.
    #[must_use]
    pub fn pattern(&self) -> &ErrorPattern {
        &self.pattern
    }

    /// Whether `code` is in the benign list.
    #[must_use]
    pub fn is_benign(&self, code: &str) -> bool {
        self.benign.contains(&code)
    }

    /// Classify the error in `response`, if any.
    ///
    /// `Ok(None)` means no error element. `Ok(Some(_))` is a benign error the
    /// caller should treat as an empty result.
    ///
    /// # Errors
    ///
    /// Returns the [`ServiceError`] if its code is not benign.
    pub fn check(&self, response: &ServiceResponse) -> Result<Option<ServiceError>, ServiceError> {
        match response.service_error(&self.pattern) {
            None => Ok(None),
            Some(error) if self.is_benign(&error.code) => {
                debug!(code = %error.code, "ignoring benign service error");
                Ok(Some(error))
            }
            Some(error) => Err(error),
        }
    }
}

/// Classify the error in `response` with `policy`.
///
/// # Errors
///
/// Returns the [`ServiceError`] if its code is not benign.
pub fn check(
    response: &ServiceResponse,
    policy: &ErrorPolicy,
) -> Result<Option<ServiceError>, ServiceError> {
    policy.check(response)
}

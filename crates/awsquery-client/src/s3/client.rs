//! Minimal S3 REST client: object metadata and ranged reads.

use std::sync::Arc;

use awsquery_auth::s3::{authorization, string_to_sign};
use awsquery_core::{ClientConfig, Clock, SystemClock};
use awsquery_xml::{ErrorPattern, ErrorPolicy};
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, DATE, ETAG, RANGE};
use http::{HeaderValue, Method, StatusCode};
use tracing::debug;

use super::object::ObjectRef;
use super::stream::{ObjectStream, RangeSource};
use crate::error::{ClientError, ClientResult};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Metadata returned by a `HEAD` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Object size in bytes.
    pub size: u64,
    /// Stored content type.
    pub content_type: Option<String>,
    /// Entity tag, quotes included.
    pub etag: Option<String>,
}

/// Client for reading S3 objects over the REST API.
///
/// Requests are path-style against the configured endpoint and signed with
/// the `AWS AKID:signature` header scheme when a secret key is configured.
#[derive(Debug, Clone)]
pub struct S3Client {
    config: Arc<ClientConfig>,
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
}

impl S3Client {
    /// Create a client using the system clock.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if `config` holds an invalid endpoint.
    pub fn new(config: Arc<ClientConfig>, transport: Arc<dyn HttpTransport>) -> ClientResult<Self> {
        Self::with_clock(config, transport, Arc::new(SystemClock))
    }

    /// Create a client with an explicit clock for the `Date` header.
    pub fn with_clock(
        config: Arc<ClientConfig>,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> ClientResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            clock,
        })
    }

    /// Fetch object metadata.
    pub fn head_object(&self, object: &ObjectRef) -> ClientResult<ObjectInfo> {
        let response = self.send(&Method::HEAD, object, None)?;
        let header = |name: http::HeaderName| {
            response
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let size: u64 = header(CONTENT_LENGTH)
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| {
                ClientError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("missing or invalid Content-Length for {object}"),
                ))
            })?;
        Ok(ObjectInfo {
            size,
            content_type: header(CONTENT_TYPE),
            etag: header(ETAG),
        })
    }

    /// Fetch bytes `start..=end_inclusive` of an object.
    pub fn get_range(&self, object: &ObjectRef, start: u64, end_inclusive: u64) -> ClientResult<Bytes> {
        let range = format!("bytes={start}-{end_inclusive}");
        let response = self.send(&Method::GET, object, Some(&range))?;
        if response.status == StatusCode::PARTIAL_CONTENT {
            return Ok(response.body);
        }

        // The whole object came back; cut out the requested window.
        let from = usize::try_from(start).unwrap_or(usize::MAX);
        let to = usize::try_from(end_inclusive)
            .unwrap_or(usize::MAX)
            .saturating_add(1)
            .min(response.body.len());
        Ok(if from < to {
            response.body.slice(from..to)
        } else {
            Bytes::new()
        })
    }

    /// Open a lazy stream over an object.
    #[must_use]
    pub fn open_stream(&self, object: ObjectRef) -> ObjectStream<&Self> {
        ObjectStream::open(self, object)
    }

    fn send(&self, method: &Method, object: &ObjectRef, range: Option<&str>) -> ClientResult<HttpResponse> {
        let date = self
            .clock
            .now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();
        let path = object.encoded_path();
        let url = format!("{}{path}", self.config.s3_endpoint.trim_end_matches('/'));
        let mut request = HttpRequest::new(method.clone(), url).with_header(DATE, header_value(&date)?);
        if let Some(range) = range {
            request = request.with_header(RANGE, header_value(range)?);
        }

        if let Some(secret_key) = self.config.credentials.secret_key() {
            let sts = string_to_sign(method, &request.headers, &path, &[]);
            let auth = authorization(self.config.credentials.access_key_id(), secret_key, &sts);
            request = request.with_header(AUTHORIZATION, header_value(&auth)?);
        }

        debug!(method = %method, object = %object, range = ?range, "sending S3 request");
        let response = self.transport.send(&request)?;
        if response.status.is_success() {
            return Ok(response);
        }

        let status = response.status;
        let service = response.into_service_response();
        ErrorPolicy::strict(ErrorPattern::QUERY).check(&service)?;
        Err(ClientError::Http { status })
    }
}

impl RangeSource for S3Client {
    fn object_size(&self, object: &ObjectRef) -> ClientResult<u64> {
        self.head_object(object).map(|info| info.size)
    }

    fn fetch_range(
        &self,
        object: &ObjectRef,
        start: u64,
        end_inclusive: u64,
    ) -> ClientResult<Bytes> {
        self.get_range(object, start, end_inclusive)
    }
}

fn header_value(value: &str) -> ClientResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        ClientError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    })
}

//! Shared request pipeline of the signed query APIs (EC2, `SimpleDB`).

use std::sync::Arc;

use awsquery_auth::Parameters;
use awsquery_core::{ClientConfig, Clock};
use awsquery_xml::{ErrorPattern, ErrorPolicy, ServiceResponse};
use http::Method;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::request::QueryRequestBuilder;
use crate::transport::{HttpRequest, HttpTransport};

/// One query-API endpoint: where to send, which version, how to read errors.
#[derive(Debug, Clone)]
pub(crate) struct QueryService {
    config: Arc<ClientConfig>,
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    endpoint: String,
    version: &'static str,
    prefix: &'static str,
    namespace: String,
}

impl QueryService {
    pub(crate) fn new(
        config: Arc<ClientConfig>,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        endpoint: String,
        version: &'static str,
        prefix: &'static str,
        namespace: String,
    ) -> Self {
        Self {
            config,
            transport,
            clock,
            endpoint,
            version,
            prefix,
            namespace,
        }
    }

    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sign and POST `action`, then check the body for a service error.
    ///
    /// The returned response always holds a valid document.
    pub(crate) fn send(&self, action: &str, mut params: Parameters) -> ClientResult<ServiceResponse> {
        params.insert("Action".to_owned(), action.to_owned());
        let signed = QueryRequestBuilder::new(&self.config.credentials, &self.endpoint, self.version)
            .build(&params, self.clock.as_ref())?;

        debug!(action, endpoint = %self.endpoint, "sending query request");
        let request = HttpRequest::new(Method::POST, self.endpoint.as_str()).with_form(&signed);
        let response = self
            .transport
            .send(&request)?
            .into_service_response()
            .with_namespace(self.prefix, self.namespace.as_str());

        ErrorPolicy::strict(ErrorPattern::QUERY).check(&response)?;
        if !response.is_success() {
            return Err(ClientError::Http {
                status: response.status(),
            });
        }
        if response.document().is_none() {
            return Err(ClientError::InvalidDocument {
                status: response.status(),
            });
        }
        Ok(response)
    }
}

//! Integration tests for the awsquery clients.
//!
//! The clients run against in-memory transports:
//!
//! - [`ScriptedTransport`] replays canned responses and records requests
//! - [`FakeSimpleDb`] keeps domains and items in memory and checks signatures
//! - [`FakeS3`] serves `HEAD` and ranged `GET` requests for stored objects and
//!   checks the `Authorization` header of each

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use awsquery_auth::{Parameters, SIGNATURE};
use awsquery_client::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use awsquery_core::{ClientConfig, Credentials, FixedClock};
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use parking_lot::Mutex;
use percent_encoding::percent_decode_str;

/// Access key id the fakes expect.
pub const ACCESS_KEY: &str = "0PN5J17HBGZHT7JJ3X82";
/// Secret key the fakes verify signatures with.
pub const SECRET_KEY: &str = "uV3F3YluFJax1cknvbcGwgjvx4QpvB+leU8dUj2o";

static INIT: Once = Once::new();

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A signing configuration with every endpoint at its default.
#[must_use]
pub fn config() -> Arc<ClientConfig> {
    init_tracing();
    Arc::new(
        ClientConfig::builder()
            .credentials(Credentials::new(ACCESS_KEY, SECRET_KEY).unwrap())
            .build(),
    )
}

/// A clock frozen at 2009-11-11T13:52:38Z.
#[must_use]
pub fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2009, 11, 11, 13, 52, 38).unwrap(),
    ))
}

/// An XML response with the given status.
#[must_use]
pub fn xml(status: u16, body: &str) -> HttpResponse {
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static("text/xml"));
    HttpResponse::new(
        StatusCode::from_u16(status).unwrap(),
        headers,
        Bytes::from(body.to_owned()),
    )
}

/// Escape text for an XML element body.
#[must_use]
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// The query-API error envelope.
#[must_use]
pub fn query_error(status: u16, code: &str, message: &str) -> HttpResponse {
    xml(
        status,
        &format!(
            "<?xml version=\"1.0\"?>\n<Response><Errors><Error><Code>{code}</Code>\
             <Message>{}</Message><BoxUsage>0.0000219907</BoxUsage></Error></Errors>\
             <RequestID>5f8e4fa0-0000-0000-0000-000000000000</RequestID></Response>",
            escape(message)
        ),
    )
}

/// Replays responses in order and records every request.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    /// Create a transport that replays `responses` in order.
    pub fn new(responses: impl IntoIterator<Item = HttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Requests received, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

impl HttpTransport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| TransportError::InvalidUrl(format!("unscripted request to {}", request.url)))
    }
}

type Items = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// An in-memory `SimpleDB` that speaks the form-encoded query protocol.
#[derive(Debug, Default)]
pub struct FakeSimpleDb {
    domains: Mutex<BTreeMap<String, Items>>,
    calls: Mutex<Vec<String>>,
}

impl FakeSimpleDb {
    /// An empty store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A store holding the given empty domains.
    pub fn with_domains(names: &[&str]) -> Arc<Self> {
        let fake = Self::default();
        for name in names {
            fake.domains.lock().insert((*name).to_owned(), Items::new());
        }
        Arc::new(fake)
    }

    /// Actions received, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn handle(&self, params: &Parameters) -> HttpResponse {
        let action = params.get("Action").map_or("", String::as_str);
        self.calls.lock().push(action.to_owned());
        let domain = params.get("DomainName").cloned().unwrap_or_default();
        let mut domains = self.domains.lock();

        match action {
            "CreateDomain" => {
                domains.entry(domain).or_default();
                ok("CreateDomain", "")
            }
            "DeleteDomain" => {
                domains.remove(&domain);
                ok("DeleteDomain", "")
            }
            "ListDomains" => {
                let names: Vec<&String> = domains.keys().collect();
                let max = params
                    .get("MaxNumberOfDomains")
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(100);
                let start = match params.get("NextToken") {
                    None => 0,
                    Some(token) => match decode_token(token) {
                        Some(start) if start < names.len() => start,
                        _ => return invalid_token(token),
                    },
                };
                let end = (start + max).min(names.len());
                let mut result: String = names[start..end]
                    .iter()
                    .map(|name| format!("<DomainName>{}</DomainName>", escape(name)))
                    .collect();
                if end < names.len() {
                    result.push_str(&format!("<NextToken>{}</NextToken>", encode_token(end)));
                }
                ok("ListDomains", &result)
            }
            "DomainMetadata" => {
                let Some(items) = domains.get(&domain) else {
                    return no_such_domain();
                };
                let names: usize = items.values().map(BTreeMap::len).sum();
                ok(
                    "DomainMetadata",
                    &format!(
                        "<ItemCount>{}</ItemCount><AttributeNameCount>{names}</AttributeNameCount>\
                         <Timestamp>1257947558</Timestamp>",
                        items.len()
                    ),
                )
            }
            "PutAttributes" => {
                let Some(items) = domains.get_mut(&domain) else {
                    return no_such_domain();
                };
                let item = items.entry(params["ItemName"].clone()).or_default();
                apply_put(item, params, "Attribute");
                ok("PutAttributes", "")
            }
            "BatchPutAttributes" => {
                let Some(items) = domains.get_mut(&domain) else {
                    return no_such_domain();
                };
                for index in indices(params, "Item", "ItemName") {
                    let prefix = format!("Item.{index}");
                    let name = params[&format!("{prefix}.ItemName")].clone();
                    apply_put(
                        items.entry(name).or_default(),
                        params,
                        &format!("{prefix}.Attribute"),
                    );
                }
                ok("BatchPutAttributes", "")
            }
            "DeleteAttributes" => {
                let Some(items) = domains.get_mut(&domain) else {
                    return no_such_domain();
                };
                let item_name = &params["ItemName"];
                let targets = indices(params, "Attribute", "Name");
                if targets.is_empty() {
                    items.remove(item_name);
                } else if let Some(item) = items.get_mut(item_name) {
                    for index in targets {
                        let name = &params[&format!("Attribute.{index}.Name")];
                        match params.get(&format!("Attribute.{index}.Value")) {
                            Some(value) => {
                                if let Some(values) = item.get_mut(name) {
                                    values.retain(|v| v != value);
                                }
                            }
                            None => {
                                item.remove(name);
                            }
                        }
                    }
                    item.retain(|_, values| !values.is_empty());
                }
                ok("DeleteAttributes", "")
            }
            "GetAttributes" => {
                let Some(items) = domains.get(&domain) else {
                    return no_such_domain();
                };
                let wanted = params.get("AttributeName");
                let body = items
                    .get(&params["ItemName"])
                    .map(|item| {
                        item.iter()
                            .filter(|(name, _)| wanted.is_none_or(|w| w == *name))
                            .flat_map(|(name, values)| {
                                values.iter().map(move |value| {
                                    format!(
                                        "<Attribute><Name>{}</Name><Value>{}</Value></Attribute>",
                                        escape(name),
                                        escape(value)
                                    )
                                })
                            })
                            .collect::<String>()
                    })
                    .unwrap_or_default();
                ok("GetAttributes", &body)
            }
            "Select" => {
                let expression = &params["SelectExpression"];
                let Some(domain) = expression.split('`').nth(1) else {
                    return error(400, "InvalidQueryExpression", "The specified query expression syntax is not valid.");
                };
                let Some(items) = domains.get(domain) else {
                    return no_such_domain();
                };
                let names: Vec<&String> = items.keys().collect();
                let start = match params.get("NextToken") {
                    None => 0,
                    Some(token) => match decode_token(token) {
                        Some(start) if start < names.len() => start,
                        _ => return invalid_token(token),
                    },
                };
                let end = (start + 2).min(names.len());
                let mut body = String::new();
                for name in &names[start..end] {
                    body.push_str(&format!("<Item><Name>{}</Name>", escape(name)));
                    for (attribute, values) in &items[*name] {
                        body.push_str(&format!("<Attribute><Name>{}</Name>", escape(attribute)));
                        for value in values {
                            body.push_str(&format!("<Value>{}</Value>", escape(value)));
                        }
                        body.push_str("</Attribute>");
                    }
                    body.push_str("</Item>");
                }
                if end < names.len() {
                    body.push_str(&format!("<NextToken>{}</NextToken>", encode_token(end)));
                }
                ok("Select", &body)
            }
            other => error(400, "InvalidAction", &format!("The action {other} is not valid for this web service.")),
        }
    }
}

impl HttpTransport for FakeSimpleDb {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        assert_eq!(request.method, Method::POST);
        let mut params: Parameters = request
            .form
            .clone()
            .unwrap_or_default()
            .into_iter()
            .collect();

        let provided = params.remove(SIGNATURE);
        let expected = awsquery_auth::sigv2::sign(&Method::POST, &request.url, None, SECRET_KEY, &params)
            .map(|signed| signed.signature)
            .ok();
        if expected.is_none() || expected != provided {
            return Ok(error(
                403,
                "SignatureDoesNotMatch",
                "The request signature we calculated does not match the signature you provided.",
            ));
        }
        Ok(self.handle(&params))
    }
}

fn ok(action: &str, result: &str) -> HttpResponse {
    xml(
        200,
        &format!(
            "<?xml version=\"1.0\"?>\n<{action}Response xmlns=\"http://sdb.amazonaws.com/doc/2009-04-15/\">\
             <{action}Result>{result}</{action}Result>\
             <ResponseMetadata><RequestId>b1e8f1f7-42e9-494c-ad09-2674e557526d</RequestId>\
             <BoxUsage>0.0000219907</BoxUsage></ResponseMetadata></{action}Response>"
        ),
    )
}

fn error(status: u16, code: &str, message: &str) -> HttpResponse {
    query_error(status, code, message)
}

fn no_such_domain() -> HttpResponse {
    error(400, "NoSuchDomain", "The specified domain does not exist.")
}

fn invalid_token(token: &str) -> HttpResponse {
    error(400, "InvalidNextToken", &format!("The specified next token is not valid: {token}"))
}

fn encode_token(position: usize) -> String {
    format!("rO0ABXNyACdjb20uYW1hem9uLnNkcy5RdWVyeVByb2Nlc3Nvci5Nb3JlVG9rZW4{position}")
}

fn decode_token(token: &str) -> Option<usize> {
    token
        .strip_prefix("rO0ABXNyACdjb20uYW1hem9uLnNkcy5RdWVyeVByb2Nlc3Nvci5Nb3JlVG9rZW4")?
        .parse()
        .ok()
}

/// Numeric indices `N` for which `{prefix}.N.{field}` is present, ascending.
fn indices(params: &Parameters, prefix: &str, field: &str) -> Vec<usize> {
    let mut found: Vec<usize> = params
        .keys()
        .filter_map(|key| {
            let rest = key.strip_prefix(prefix)?.strip_prefix('.')?;
            let (index, tail) = rest.split_once('.')?;
            (tail == field).then(|| index.parse().ok()).flatten()
        })
        .collect();
    found.sort_unstable();
    found
}

/// Apply `{prefix}.N.Name/Value/Replace` triples to one item.
fn apply_put(item: &mut BTreeMap<String, Vec<String>>, params: &Parameters, prefix: &str) {
    let triples: Vec<(String, String, bool)> = indices(params, prefix, "Name")
        .into_iter()
        .map(|index| {
            let field = |name: &str| params.get(&format!("{prefix}.{index}.{name}")).cloned();
            (
                field("Name").unwrap_or_default(),
                field("Value").unwrap_or_default(),
                field("Replace").is_some_and(|r| r == "true"),
            )
        })
        .collect();

    for (name, _, replace) in &triples {
        if *replace {
            item.remove(name);
        }
    }
    for (name, value, _) in triples {
        item.entry(name).or_default().push(value);
    }
}

/// An in-memory S3 that serves `HEAD` and ranged `GET`.
#[derive(Debug, Default)]
pub struct FakeS3 {
    objects: Mutex<BTreeMap<String, Bytes>>,
    requests: Mutex<Vec<(Method, Option<String>)>>,
    rejected: AtomicUsize,
}

impl FakeS3 {
    /// An empty object store.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store `data` at `bucket/key`.
    pub fn put(&self, path: &str, data: impl Into<Bytes>) {
        self.objects.lock().insert(format!("/{path}"), data.into());
    }

    /// Method and `Range` header of every request, in order.
    pub fn requests(&self) -> Vec<(Method, Option<String>)> {
        self.requests.lock().clone()
    }

    /// Number of requests refused for a bad signature.
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    /// Number of `GET` requests received.
    pub fn range_requests(&self) -> usize {
        self.requests()
            .iter()
            .filter(|(method, _)| *method == Method::GET)
            .count()
    }
}

impl HttpTransport for FakeS3 {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let range = request
            .headers
            .get(http::header::RANGE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        self.requests.lock().push((request.method.clone(), range.clone()));

        let path = request
            .url
            .strip_prefix("http://s3.amazonaws.com")
            .ok_or_else(|| TransportError::InvalidUrl(request.url.clone()))?;

        let sts = awsquery_auth::s3::string_to_sign(&request.method, &request.headers, path, &[]);
        let expected = awsquery_auth::s3::authorization(ACCESS_KEY, SECRET_KEY, &sts);
        let authorization = request
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if authorization != expected {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Ok(xml(
                403,
                "<Error><Code>SignatureDoesNotMatch</Code><Message>The request signature we calculated does not match the signature you provided.</Message></Error>",
            ));
        }

        let key = percent_decode_str(path).decode_utf8_lossy();
        let Some(data) = self.objects.lock().get(key.as_ref()).cloned() else {
            let body = if request.method == Method::HEAD {
                String::new()
            } else {
                "<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>"
                    .to_owned()
            };
            return Ok(xml(404, &body));
        };

        let mut headers = HeaderMap::new();
        if request.method == Method::HEAD {
            headers.insert(
                http::header::CONTENT_LENGTH,
                HeaderValue::from_str(&data.len().to_string()).unwrap(),
            );
            headers.insert("etag", HeaderValue::from_static("\"d41d8cd98f00b204e9800998ecf8427e\""));
            return Ok(HttpResponse::new(StatusCode::OK, headers, Bytes::new()));
        }

        let Some((start, end)) = range
            .as_deref()
            .and_then(|r| r.strip_prefix("bytes="))
            .and_then(|r| r.split_once('-'))
        else {
            return Ok(HttpResponse::new(StatusCode::OK, headers, data));
        };
        let start: usize = start.parse().unwrap();
        let end: usize = end.parse::<usize>().unwrap().min(data.len().saturating_sub(1));
        if start >= data.len() {
            return Ok(xml(
                416,
                "<Error><Code>InvalidRange</Code><Message>The requested range is not satisfiable</Message></Error>",
            ));
        }
        Ok(HttpResponse::new(
            StatusCode::PARTIAL_CONTENT,
            headers,
            data.slice(start..=end),
        ))
    }
}

#[cfg(test)]
mod test_retry;
#[cfg(test)]
mod test_simpledb;

//! XML response handling for the Amazon query APIs.
//!
//! A response body is kept as raw bytes until something asks for it. It is
//! then parsed once into a namespace-resolved element tree and queried with a
//! small XPath subset:
//!
//! ```rust
//! use awsquery_xml::ServiceResponse;
//! use bytes::Bytes;
//! use http::{HeaderMap, StatusCode};
//!
//! let body = r#"<DescribeRegionsResponse xmlns="http://ec2.amazonaws.com/doc/2009-04-04/">
//!   <regionInfo><item><regionName>us-east-1</regionName></item></regionInfo>
//! </DescribeRegionsResponse>"#;
//! let response = ServiceResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::from(body))
//!     .with_namespace("ec2", "http://ec2.amazonaws.com/doc/2009-04-04/");
//!
//! let xpath = response.xpath().unwrap();
//! let items = xpath.query("//ec2:regionInfo/ec2:item");
//! assert_eq!(xpath.evaluate_string(items[0], "ec2:regionName"), "us-east-1");
//! ```
//!
//! # Modules
//!
//! - [`document`] - Element tree built with `quick-xml`
//! - [`error`] - Parse error types
//! - [`response`] - Lazily parsed responses and service error detection
//! - [`xpath`] - Path queries with a registered namespace prefix

pub mod document;
pub mod error;
pub mod response;
pub mod xpath;

pub use document::{Document, Element, Node};
pub use error::XmlError;
pub use response::{
    DocumentState, ErrorPattern, ErrorPolicy, ServiceError, ServiceResponse, check,
};
pub use xpath::XPath;

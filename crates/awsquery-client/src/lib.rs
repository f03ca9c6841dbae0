//! Clients for the classic Amazon query and REST APIs.
//!
//! This crate ties the workspace together:
//!
//! - [`request`] turns caller parameters into signed parameter maps
//! - [`transport`] is the seam to the network
//! - [`Page`] carries continuation tokens of paginated listings
//! - [`services`] holds the Product Advertising, `SimpleDB` and EC2 clients
//! - [`s3`] reads S3 objects, including the lazy [`s3::ObjectStream`]
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::io::Read;
//! use std::sync::Arc;
//!
//! use awsquery_client::s3::{ObjectRef, S3Client};
//! use awsquery_client::services::SimpleDb;
//! use awsquery_client::transport::HttpTransport;
//! use awsquery_core::ClientConfig;
//!
//! # fn run(transport: Arc<dyn HttpTransport>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(ClientConfig::from_env()?);
//!
//! let sdb = SimpleDb::new(config.clone(), transport.clone())?;
//! let mut token = None;
//! loop {
//!     let page = sdb.list_domains(100, token.as_deref())?;
//!     for domain in page.data() {
//!         println!("{domain}");
//!     }
//!     if page.is_last() {
//!         break;
//!     }
//!     token = page.token().map(str::to_owned);
//! }
//!
//! let s3 = S3Client::new(config, transport)?;
//! let mut stream = s3.open_stream(ObjectRef::parse("my-bucket/report.csv")?);
//! let mut head = [0u8; 512];
//! let n = stream.read(&mut head)?;
//! println!("read {n} bytes");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod page;
pub mod request;
pub mod retry;
pub mod s3;
pub mod services;
pub mod transport;

pub use error::{ClientError, ClientResult};
pub use page::Page;
pub use retry::with_retry;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

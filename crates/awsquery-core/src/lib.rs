//! Core types and configuration for awsquery.
//!
//! This crate holds the pieces every service client shares: the immutable
//! [`ClientConfig`], [`Credentials`] with a redacted secret key, the
//! Product Advertising [`Locale`] endpoint table, the validated
//! [`ApiVersion`], and the injectable [`Clock`] used to stamp request
//! timestamps.

mod clock;
mod config;
mod credentials;
mod error;
mod types;

pub use clock::{Clock, FixedClock, SystemClock, format_timestamp};
pub use config::ClientConfig;
pub use credentials::Credentials;
pub use error::{CoreError, CoreResult};
pub use types::{ApiVersion, Locale};

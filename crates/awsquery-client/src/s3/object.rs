//! `bucket/key` references to S3 objects.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use awsquery_auth::canonical::percent_encode;

use crate::error::{ClientError, ClientResult};

/// Minimum bucket name length.
const MIN_BUCKET_NAME_LEN: usize = 3;

/// Maximum bucket name length.
const MAX_BUCKET_NAME_LEN: usize = 63;

/// Maximum object key length in bytes.
const MAX_KEY_BYTES: usize = 1024;

/// A validated `bucket/key` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    bucket: String,
    key: String,
}

impl ObjectRef {
    /// Create a reference from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBucketName`] for a malformed bucket and
    /// [`ClientError::InvalidObjectRef`] for an empty or oversized key.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> ClientResult<Self> {
        let bucket = bucket.into();
        let key = key.into();
        validate_bucket_name(&bucket)?;
        if key.is_empty() || key.len() > MAX_KEY_BYTES {
            return Err(ClientError::InvalidObjectRef(format!("{bucket}/{key}")));
        }
        Ok(Self { bucket, key })
    }

    /// Parse `bucket/key`. The key may contain further slashes.
    ///
    /// ```
    /// use awsquery_client::s3::ObjectRef;
    ///
    /// let object = ObjectRef::parse("my-bucket/photos/cat.jpg").unwrap();
    /// assert_eq!(object.bucket(), "my-bucket");
    /// assert_eq!(object.key(), "photos/cat.jpg");
    /// assert!(ObjectRef::parse("no-key").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidObjectRef`] if there is no `/`, and the
    /// errors of [`ObjectRef::new`].
    pub fn parse(path: &str) -> ClientResult<Self> {
        let (bucket, key) = path
            .trim_start_matches('/')
            .split_once('/')
            .ok_or_else(|| ClientError::InvalidObjectRef(path.to_owned()))?;
        Self::new(bucket, key)
    }

    /// Bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Path-style resource with every key segment percent-encoded, as sent
    /// on the wire and signed.
    #[must_use]
    pub fn encoded_path(&self) -> String {
        let key = self
            .key
            .split('/')
            .map(percent_encode)
            .collect::<Vec<_>>()
            .join("/");
        format!("/{}/{key}", self.bucket)
    }
}

impl FromStr for ObjectRef {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Check that `name` is usable as a path-style bucket name.
///
/// A bucket name is 3 to 63 lowercase letters, digits, `-` or `.`, begins
/// and ends with a letter or digit, has no empty label (`..`) and is not a
/// dotted IPv4 address.
///
/// ```
/// use awsquery_client::s3::validate_bucket_name;
///
/// assert!(validate_bucket_name("my-valid-bucket").is_ok());
/// assert!(validate_bucket_name("AB").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> ClientResult<()> {
    let invalid = |reason: String| ClientError::InvalidBucketName {
        name: name.to_owned(),
        reason,
    };
    let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&name.len()) {
        return Err(invalid(format!(
            "length {} is outside {MIN_BUCKET_NAME_LEN}..={MAX_BUCKET_NAME_LEN}",
            name.len()
        )));
    }
    if let Some(bad) = name.bytes().find(|b| !(alnum(b) || matches!(*b, b'-' | b'.'))) {
        return Err(invalid(format!("character {:?} is not allowed", char::from(bad))));
    }
    let bytes = name.as_bytes();
    if !bytes.first().is_some_and(alnum) || !bytes.last().is_some_and(alnum) {
        return Err(invalid("first and last characters must be a letter or digit".to_owned()));
    }
    if name.split('.').any(str::is_empty) {
        return Err(invalid("labels between dots must not be empty".to_owned()));
    }
    if name.parse::<Ipv4Addr>().is_ok() {
        return Err(invalid("an IPv4 address is not a bucket name".to_owned()));
    }
    Ok(())
}

//! Access credentials bound to a client.
//!
//! The secret key is held in a [`SecretString`] so it is zeroized on drop
//! and never shows up in `Debug` output or logs.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::error::CoreError;

/// Access key id plus an optional secret key.
///
/// Without a secret key requests are sent unsigned, which only public
/// read-only operations accept.
#[derive(Clone)]
pub struct Credentials {
    access_key_id: String,
    secret_key: Option<SecretString>,
}

impl Credentials {
    /// Create credentials with a secret key.
    ///
    /// # Errors
    /// Returns [`CoreError::MissingAccessKey`] if the access key id is empty.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let mut credentials = Self::anonymous(access_key_id)?;
        credentials.secret_key = Some(SecretString::from(secret_key.into()));
        Ok(credentials)
    }

    /// Create credentials that only identify the caller and never sign.
    ///
    /// # Errors
    /// Returns [`CoreError::MissingAccessKey`] if the access key id is empty.
    pub fn anonymous(access_key_id: impl Into<String>) -> Result<Self, CoreError> {
        let access_key_id = access_key_id.into();
        if access_key_id.is_empty() {
            return Err(CoreError::MissingAccessKey);
        }
        Ok(Self {
            access_key_id,
            secret_key: None,
        })
    }

    /// The access key id.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// The secret key, if one was configured.
    #[must_use]
    pub fn secret_key(&self) -> Option<&str> {
        self.secret_key.as_ref().map(|secret| secret.expose_secret())
    }

    /// Whether requests made with these credentials are signed.
    #[must_use]
    pub fn can_sign(&self) -> bool {
        self.secret_key.is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

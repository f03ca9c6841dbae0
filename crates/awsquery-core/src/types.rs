//! Common type definitions shared across service clients.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::CoreError;

/// Service API version (a `YYYY-MM-DD` date string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiVersion(String);

impl ApiVersion {
    /// Default Product Advertising API version.
    pub const DEFAULT: &str = "2011-08-01";

    /// Create a validated API version.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidApiVersion`] unless the value is a calendar
    /// date in `YYYY-MM-DD` form.
    pub fn new(version: impl Into<String>) -> Result<Self, CoreError> {
        let version = version.into();
        if version.len() != 10 || NaiveDate::parse_from_str(&version, "%Y-%m-%d").is_err() {
            return Err(CoreError::InvalidApiVersion(version));
        }
        Ok(Self(version))
    }

    /// Get the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ApiVersion {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ApiVersion> for String {
    fn from(value: ApiVersion) -> Self {
        value.0
    }
}

/// Product Advertising marketplace, identified by its country code.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum Locale {
    /// Brazil.
    Br,
    /// Canada.
    Ca,
    /// China.
    Cn,
    /// Germany.
    De,
    /// Spain.
    Es,
    /// France.
    Fr,
    /// India.
    In,
    /// Italy.
    It,
    /// Japan.
    Jp,
    /// Mexico.
    Mx,
    /// United Kingdom.
    Uk,
    /// United States.
    #[default]
    Us,
}

impl Locale {
    /// Every supported locale.
    pub const ALL: [Self; 12] = [
        Self::Br,
        Self::Ca,
        Self::Cn,
        Self::De,
        Self::Es,
        Self::Fr,
        Self::In,
        Self::It,
        Self::Jp,
        Self::Mx,
        Self::Uk,
        Self::Us,
    ];

    /// Two-letter country code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Br => "BR",
            Self::Ca => "CA",
            Self::Cn => "CN",
            Self::De => "DE",
            Self::Es => "ES",
            Self::Fr => "FR",
            Self::In => "IN",
            Self::It => "IT",
            Self::Jp => "JP",
            Self::Mx => "MX",
            Self::Uk => "UK",
            Self::Us => "US",
        }
    }

    fn host(self) -> &'static str {
        match self {
            Self::Br => "webservices.amazon.com.br",
            Self::Ca => "webservices.amazon.ca",
            Self::Cn => "webservices.amazon.cn",
            Self::De => "webservices.amazon.de",
            Self::Es => "webservices.amazon.es",
            Self::Fr => "webservices.amazon.fr",
            Self::In => "webservices.amazon.in",
            Self::It => "webservices.amazon.it",
            Self::Jp => "webservices.amazon.co.jp",
            Self::Mx => "webservices.amazon.com.mx",
            Self::Uk => "webservices.amazon.co.uk",
            Self::Us => "webservices.amazon.com",
        }
    }

    /// Base URI of the Product Advertising endpoint for this locale.
    #[must_use]
    pub fn base_uri(self, use_https: bool) -> String {
        let scheme = if use_https { "https" } else { "http" };
        format!("{scheme}://{}", self.host())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|locale| locale.code() == s)
            .ok_or_else(|| CoreError::UnknownLocale(s.to_owned()))
    }
}

impl TryFrom<String> for Locale {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locale> for String {
    fn from(value: Locale) -> Self {
        value.code().to_owned()
    }
}

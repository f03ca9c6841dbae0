//! One page of a paginated listing.

use std::fmt;

/// A page of results plus the opaque token for the next page.
///
/// A page without a token is the last one. The token is passed back to the
/// service unmodified.
///
/// # Examples
///
/// ```
/// use awsquery_client::Page;
///
/// let page = Page::new(vec!["a", "b"], Some("tok".to_owned()));
/// assert!(!page.is_last());
/// assert_eq!(page.to_string(), "Page with token: tok");
///
/// let last = Page::new(Vec::<&str>::new(), None);
/// assert!(last.is_last());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    data: T,
    token: Option<String>,
}

impl<T> Page<T> {
    /// Create a page.
    pub fn new(data: T, token: Option<String>) -> Self {
        Self { data, token }
    }

    /// The page contents.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Take the page contents.
    pub fn into_data(self) -> T {
        self.data
    }

    /// Token for the next page, if there is one.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Whether this is the final page.
    pub fn is_last(&self) -> bool {
        self.token.is_none()
    }
}

impl<T> fmt::Display for Page<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page with token: {}", self.token.as_deref().unwrap_or(""))
    }
}

/// Turn a token read from a response into a page token.
///
/// Services send an empty or missing `NextToken` element on the last page.
pub(crate) fn normalize_token(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw.to_owned())
    }
}

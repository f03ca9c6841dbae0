//! Error types for XML parsing.

/// Errors that can occur while parsing a response body.
///
/// These never escape [`ServiceResponse`](crate::ServiceResponse): a failed
/// parse is recorded as an invalid document instead.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// An error from quick-xml attribute handling.
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Text or names that are not valid UTF-8, or unknown entities.
    #[error("failed to decode XML content: {0}")]
    Decode(String),

    /// A prefix was used without a matching `xmlns:` declaration.
    #[error("unbound namespace prefix: {0}")]
    UnboundPrefix(String),

    /// The body contains no root element.
    #[error("missing root element")]
    MissingRoot,

    /// The body ended before every element was closed, or content follows the root.
    #[error("malformed document: {0}")]
    Malformed(String),
}

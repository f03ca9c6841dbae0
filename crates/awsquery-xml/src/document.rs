//! An in-memory element tree with resolved namespaces.
//!
//! Built from quick-xml events. Namespace declarations are tracked in a
//! scope stack that mirrors the element stack, so every element records the
//! URI its prefix (or the default namespace) resolved to at parse time.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::XmlError;

/// Namespace permanently bound to the `xml` prefix.
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A child element.
    Element(Element),
    /// Character data, with entities already resolved.
    Text(String),
}

/// An element with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    namespace: Option<String>,
    local_name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Document {
    /// Parse a complete document.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError`] if the body is not well-formed XML, uses an
    /// undeclared prefix, or has no root element.
    ///
    /// # Examples
    ///
    /// ```
    /// use awsquery_xml::Document;
    ///
    /// let doc = Document::parse(b"<a xmlns=\"urn:x\"><b>hi</b></a>").unwrap();
    /// assert_eq!(doc.root().namespace(), Some("urn:x"));
    /// assert_eq!(doc.root().child("b").map(|b| b.text()), Some("hi".to_owned()));
    /// ```
    pub fn parse(xml: &[u8]) -> Result<Self, XmlError> {
        let mut reader = Reader::from_reader(xml);
        let mut scopes: Vec<Vec<(String, String)>> = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    ensure_single_root(root.as_ref())?;
                    let element = open_element(&e, &mut scopes)?;
                    stack.push(element);
                }
                Event::Empty(e) => {
                    ensure_single_root(root.as_ref())?;
                    let element = open_element(&e, &mut scopes)?;
                    scopes.pop();
                    close_element(element, &mut stack, &mut root);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| XmlError::Malformed("unmatched end tag".to_owned()))?;
                    scopes.pop();
                    close_element(element, &mut stack, &mut root);
                }
                Event::Text(e) => {
                    let decoded = e.decode().map_err(|err| XmlError::Decode(err.to_string()))?;
                    let unescaped = quick_xml::escape::unescape(&decoded)
                        .map_err(|err| XmlError::Decode(err.to_string()))?;
                    push_text(&mut stack, &unescaped)?;
                }
                Event::CData(e) => {
                    let raw = e.into_inner();
                    let text =
                        std::str::from_utf8(&raw).map_err(|err| XmlError::Decode(err.to_string()))?;
                    push_text(&mut stack, text)?;
                }
                Event::GeneralRef(e) => {
                    let name = e.decode().map_err(|err| XmlError::Decode(err.to_string()))?;
                    let resolved = resolve_reference(&name)?;
                    push_text(&mut stack, &resolved)?;
                }
                Event::Eof => break,
                // Skip declaration, comments, processing instructions, doctype.
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(XmlError::Malformed(
                "unexpected EOF before all elements were closed".to_owned(),
            ));
        }

        root.map(|root| Self { root }).ok_or(XmlError::MissingRoot)
    }

    /// The document element.
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }
}

impl Element {
    /// Local (unprefixed) name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Namespace URI, or `None` for elements in no namespace.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Value of an unprefixed attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All child nodes in document order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.children
    }

    /// Child elements in document order.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First child element with the given local name, in any namespace.
    #[must_use]
    pub fn child(&self, local_name: &str) -> Option<&Element> {
        self.children().find(|c| c.local_name == local_name)
    }

    /// Concatenated text of the direct text children.
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Concatenated text of every descendant, in document order.
    #[must_use]
    pub fn string_value(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Every descendant element (not including `self`), depth-first.
    pub(crate) fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, out: &mut Vec<&'a Element>) {
        for child in self.children() {
            out.push(child);
            child.collect_descendants(out);
        }
    }
}

fn ensure_single_root(root: Option<&Element>) -> Result<(), XmlError> {
    if root.is_some() {
        return Err(XmlError::Malformed(
            "content after the root element".to_owned(),
        ));
    }
    Ok(())
}

/// Push a new namespace scope for `start` and build the (childless) element.
fn open_element(
    start: &BytesStart<'_>,
    scopes: &mut Vec<Vec<(String, String)>>,
) -> Result<Element, XmlError> {
    let mut declarations = Vec::new();
    let mut attributes = Vec::new();

    for attr in start.attributes() {
        let attr = attr?;
        let key = utf8(attr.key.as_ref())?;
        let raw = utf8(&attr.value)?;
        let value = quick_xml::escape::unescape(raw)
            .map_err(|err| XmlError::Decode(err.to_string()))?
            .into_owned();

        if key == "xmlns" {
            declarations.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declarations.push((prefix.to_owned(), value));
        } else {
            attributes.push((key.to_owned(), value));
        }
    }
    scopes.push(declarations);

    let qname = utf8(start.name().as_ref())?.to_owned();
    let (prefix, local_name) = match qname.split_once(':') {
        Some((prefix, local)) => (prefix, local.to_owned()),
        None => ("", qname.clone()),
    };
    let namespace = resolve_prefix(scopes, prefix)?;

    Ok(Element {
        namespace,
        local_name,
        attributes,
        children: Vec::new(),
    })
}

/// Look up `prefix` from the innermost scope outwards.
///
/// The empty prefix is the default namespace; `xmlns=""` undeclares it.
fn resolve_prefix(scopes: &[Vec<(String, String)>], prefix: &str) -> Result<Option<String>, XmlError> {
    if prefix == "xml" {
        return Ok(Some(XML_NAMESPACE.to_owned()));
    }
    let bound = scopes
        .iter()
        .rev()
        .flat_map(|scope| scope.iter().rev())
        .find(|(p, _)| p == prefix)
        .map(|(_, uri)| uri.clone());

    match bound {
        Some(uri) if uri.is_empty() => Ok(None),
        Some(uri) => Ok(Some(uri)),
        None if prefix.is_empty() => Ok(None),
        None => Err(XmlError::UnboundPrefix(prefix.to_owned())),
    }
}

fn close_element(mut element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    // Indentation between child elements is not content.
    if element.children().next().is_some() {
        element.children.retain(|node| match node {
            Node::Text(text) => !text.trim().is_empty(),
            Node::Element(_) => true,
        });
    }

    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => *root = Some(element),
    }
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), XmlError> {
    let Some(current) = stack.last_mut() else {
        // Whitespace around the root element is allowed, anything else is not.
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(XmlError::Malformed("text outside the root element".to_owned()));
    };

    if let Some(Node::Text(last)) = current.children.last_mut() {
        last.push_str(text);
    } else {
        current.children.push(Node::Text(text.to_owned()));
    }
    Ok(())
}

/// Resolve a predefined entity (`amp`) or character reference (`#38`, `#x26`).
fn resolve_reference(name: &str) -> Result<String, XmlError> {
    if let Some(reference) = name.strip_prefix('#') {
        let code = match reference.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => reference.parse::<u32>(),
        }
        .map_err(|err| XmlError::Decode(format!("invalid character reference &{name};: {err}")))?;
        return char::from_u32(code)
            .map(String::from)
            .ok_or_else(|| XmlError::Decode(format!("invalid character reference &{name};")));
    }

    quick_xml::escape::resolve_predefined_entity(name)
        .map(str::to_owned)
        .ok_or_else(|| XmlError::Decode(format!("unknown entity &{name};")))
}

fn utf8(bytes: &[u8]) -> Result<&str, XmlError> {
    std::str::from_utf8(bytes).map_err(|err| XmlError::Decode(err.to_string()))
}

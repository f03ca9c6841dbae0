//! Amazon `SimpleDB` client.
//!
//! Every call is a signed (version 2) `POST` to the configured endpoint.
//! Results are read from the `sdb` namespace; errors from the unqualified
//! `<Response><Errors><Error>` envelope.

use std::collections::BTreeMap;
use std::sync::Arc;

use awsquery_auth::Parameters;
use awsquery_core::{ClientConfig, Clock, SystemClock};
use awsquery_xml::Element;
use tracing::debug;

use super::attribute::Attribute;
use super::query::QueryService;
use crate::error::{ClientError, ClientResult};
use crate::page::{Page, normalize_token};
use crate::transport::HttpTransport;

/// `SimpleDB` API version.
pub const SIMPLEDB_API_VERSION: &str = "2009-04-15";

/// Namespace of `SimpleDB` response documents.
pub const SIMPLEDB_NAMESPACE: &str = "http://sdb.amazonaws.com/doc/2009-04-15/";

/// Default page size of [`SimpleDb::list_domains`].
pub const DEFAULT_MAX_DOMAINS: u32 = 100;

const MIN_DOMAIN_NAME_LEN: usize = 3;
const MAX_DOMAIN_NAME_LEN: usize = 255;

/// Items of a select page: item name to attribute name to attribute.
pub type SelectItems = BTreeMap<String, BTreeMap<String, Attribute>>;

/// Client for Amazon `SimpleDB`.
#[derive(Debug, Clone)]
pub struct SimpleDb {
    service: QueryService,
}

impl SimpleDb {
    /// Create a client using the system clock.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if `config` holds an invalid endpoint.
    pub fn new(config: Arc<ClientConfig>, transport: Arc<dyn HttpTransport>) -> ClientResult<Self> {
        Self::with_clock(config, transport, Arc::new(SystemClock))
    }

    /// Create a client with an explicit clock for request timestamps.
    pub fn with_clock(
        config: Arc<ClientConfig>,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> ClientResult<Self> {
        config.validate()?;
        let endpoint = config.simpledb_endpoint.clone();
        Ok(Self {
            service: QueryService::new(
                config,
                transport,
                clock,
                endpoint,
                SIMPLEDB_API_VERSION,
                "sdb",
                SIMPLEDB_NAMESPACE.to_owned(),
            ),
        })
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.service.endpoint()
    }

    /// Create a domain.
    pub fn create_domain(&self, domain: &str) -> ClientResult<()> {
        validate_domain_name(domain)?;
        self.service
            .send("CreateDomain", domain_params(domain))
            .map(drop)
    }

    /// Delete a domain and everything in it.
    pub fn delete_domain(&self, domain: &str) -> ClientResult<()> {
        validate_domain_name(domain)?;
        self.service
            .send("DeleteDomain", domain_params(domain))
            .map(drop)
    }

    /// List up to `max` domain names, continuing from `token`.
    pub fn list_domains(&self, max: u32, token: Option<&str>) -> ClientResult<Page<Vec<String>>> {
        let mut params = Parameters::new();
        params.insert("MaxNumberOfDomains".to_owned(), max.to_string());
        if let Some(token) = token {
            params.insert("NextToken".to_owned(), token.to_owned());
        }

        let response = self.service.send("ListDomains", params)?;
        let Some(xpath) = response.xpath() else {
            return Err(invalid_document(&response));
        };
        let domains = xpath
            .query("//sdb:ListDomainsResult/sdb:DomainName")
            .into_iter()
            .map(Element::text)
            .collect::<Vec<_>>();
        let next = xpath
            .first("//sdb:ListDomainsResult/sdb:NextToken")
            .map(Element::text)
            .unwrap_or_default();
        debug!(count = domains.len(), "listed domains");
        Ok(Page::new(domains, normalize_token(&next)))
    }

    /// Domain statistics, keyed by element name (`ItemCount`, `Timestamp`, ...).
    pub fn domain_metadata(&self, domain: &str) -> ClientResult<BTreeMap<String, String>> {
        validate_domain_name(domain)?;
        let response = self.service.send("DomainMetadata", domain_params(domain))?;
        let Some(xpath) = response.xpath() else {
            return Err(invalid_document(&response));
        };
        Ok(xpath
            .query("//sdb:DomainMetadataResult/*")
            .into_iter()
            .map(|element| (element.local_name().to_owned(), element.text()))
            .collect())
    }

    /// Attributes of an item, optionally restricted to one attribute name.
    pub fn get_attributes(
        &self,
        domain: &str,
        item: &str,
        attribute_name: Option<&str>,
    ) -> ClientResult<BTreeMap<String, Attribute>> {
        validate_domain_name(domain)?;
        let mut params = domain_params(domain);
        params.insert("ItemName".to_owned(), item.to_owned());
        if let Some(name) = attribute_name {
            params.insert("AttributeName".to_owned(), name.to_owned());
        }

        let response = self.service.send("GetAttributes", params)?;
        let Some(xpath) = response.xpath() else {
            return Err(invalid_document(&response));
        };
        let mut attributes: BTreeMap<String, Attribute> = BTreeMap::new();
        for node in xpath.query("//sdb:GetAttributesResult/sdb:Attribute") {
            collect_attribute(&mut attributes, item, node);
        }
        Ok(attributes)
    }

    /// Add attribute values to an item.
    ///
    /// Values are appended to what is stored unless the attribute name is in
    /// `replace`, in which case the stored values are overwritten.
    pub fn put_attributes(
        &self,
        domain: &str,
        item: &str,
        attributes: &[Attribute],
        replace: &[&str],
    ) -> ClientResult<()> {
        validate_domain_name(domain)?;
        let mut params = domain_params(domain);
        params.insert("ItemName".to_owned(), item.to_owned());
        encode_attributes(&mut params, "Attribute", attributes, |name| {
            replace.contains(&name)
        });
        self.service.send("PutAttributes", params).map(drop)
    }

    /// Put attributes on several items in one call.
    ///
    /// `replace` lists `(item, attribute)` pairs whose stored values are
    /// overwritten.
    pub fn batch_put_attributes(
        &self,
        domain: &str,
        items: &[(&str, &[Attribute])],
        replace: &[(&str, &str)],
    ) -> ClientResult<()> {
        validate_domain_name(domain)?;
        let mut params = domain_params(domain);
        for (item_index, (item, attributes)) in items.iter().enumerate() {
            let prefix = format!("Item.{item_index}");
            params.insert(format!("{prefix}.ItemName"), (*item).to_owned());
            encode_attributes(&mut params, &format!("{prefix}.Attribute"), attributes, |name| {
                replace.contains(&(*item, name))
            });
        }
        self.service.send("BatchPutAttributes", params).map(drop)
    }

    /// Delete attribute values from an item.
    ///
    /// An attribute with no values deletes every value of that name; an
    /// empty `attributes` slice deletes the whole item.
    pub fn delete_attributes(
        &self,
        domain: &str,
        item: &str,
        attributes: &[Attribute],
    ) -> ClientResult<()> {
        validate_domain_name(domain)?;
        let mut params = domain_params(domain);
        params.insert("ItemName".to_owned(), item.to_owned());
        let mut index = 0;
        for attribute in attributes {
            if attribute.values().is_empty() {
                params.insert(format!("Attribute.{index}.Name"), attribute.name().to_owned());
                index += 1;
            }
            for value in attribute.values() {
                params.insert(format!("Attribute.{index}.Name"), attribute.name().to_owned());
                params.insert(format!("Attribute.{index}.Value"), value.clone());
                index += 1;
            }
        }
        self.service.send("DeleteAttributes", params).map(drop)
    }

    /// Run a select expression, continuing from `token`.
    pub fn select(&self, expression: &str, token: Option<&str>) -> ClientResult<Page<SelectItems>> {
        let mut params = Parameters::new();
        params.insert("SelectExpression".to_owned(), expression.to_owned());
        if let Some(token) = token {
            params.insert("NextToken".to_owned(), token.to_owned());
        }

        let response = self.service.send("Select", params)?;
        let Some(xpath) = response.xpath() else {
            return Err(invalid_document(&response));
        };
        let mut items = SelectItems::new();
        for item in xpath.query("//sdb:SelectResult/sdb:Item") {
            let item_name = xpath.evaluate_string(item, "sdb:Name");
            let attributes = items.entry(item_name.clone()).or_default();
            for node in xpath.query_from(item, "sdb:Attribute") {
                collect_attribute(attributes, &item_name, node);
            }
        }
        let next = xpath
            .first("//sdb:SelectResult/sdb:NextToken")
            .map(Element::text)
            .unwrap_or_default();
        Ok(Page::new(items, normalize_token(&next)))
    }

    /// Quote a value for a select expression.
    ///
    /// ```
    /// use awsquery_client::services::SimpleDb;
    ///
    /// assert_eq!(SimpleDb::quote("it's"), "'it''s'");
    /// ```
    #[must_use]
    pub fn quote(value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Quote a domain or attribute name for a select expression.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidName`] unless the name starts with a
    /// letter, `_` or `$` and continues with letters, digits, `_`, `$` or `-`.
    pub fn quote_name(name: &str) -> ClientResult<String> {
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-'));
        if !(valid_start && valid_rest) {
            return Err(ClientError::InvalidName(name.to_owned()));
        }
        Ok(format!("`{name}`"))
    }
}

/// Validate a `SimpleDB` domain name.
///
/// Rules:
/// - 3-255 characters long
/// - Only letters, digits, `_`, `-` and `.`
///
/// # Errors
///
/// Returns [`ClientError::InvalidDomainName`] if any rule is violated.
pub fn validate_domain_name(name: &str) -> ClientResult<()> {
    let len = name.len();
    if !(MIN_DOMAIN_NAME_LEN..=MAX_DOMAIN_NAME_LEN).contains(&len) {
        return Err(ClientError::InvalidDomainName {
            name: name.to_owned(),
            reason: format!(
                "Domain name must be between {MIN_DOMAIN_NAME_LEN} and {MAX_DOMAIN_NAME_LEN} characters long"
            ),
        });
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
    {
        return Err(ClientError::InvalidDomainName {
            name: name.to_owned(),
            reason: "Domain name must only contain letters, numbers, '_', '-' and '.'".to_owned(),
        });
    }
    Ok(())
}

fn domain_params(domain: &str) -> Parameters {
    let mut params = Parameters::new();
    params.insert("DomainName".to_owned(), domain.to_owned());
    params
}

/// Write one `{prefix}.{n}.Name/Value[/Replace]` triple per attribute value.
fn encode_attributes(
    params: &mut Parameters,
    prefix: &str,
    attributes: &[Attribute],
    replace: impl Fn(&str) -> bool,
) {
    let mut index = 0;
    for attribute in attributes {
        let replaced = replace(attribute.name());
        for value in attribute.values() {
            params.insert(format!("{prefix}.{index}.Name"), attribute.name().to_owned());
            params.insert(format!("{prefix}.{index}.Value"), value.clone());
            if replaced {
                params.insert(format!("{prefix}.{index}.Replace"), "true".to_owned());
            }
            index += 1;
        }
    }
}

/// Merge an `<Attribute><Name/><Value/>...</Attribute>` element into `out`.
fn collect_attribute(out: &mut BTreeMap<String, Attribute>, item: &str, node: &Element) {
    let Some(name) = node.child("Name").map(Element::text) else {
        return;
    };
    let values = node
        .children()
        .filter(|child| child.local_name() == "Value")
        .map(Element::text);
    out.entry(name.clone())
        .or_insert_with(|| Attribute::new(item, name, Vec::<String>::new()))
        .add_values(values);
}

fn invalid_document(response: &awsquery_xml::ServiceResponse) -> ClientError {
    ClientError::InvalidDocument {
        status: response.status(),
    }
}

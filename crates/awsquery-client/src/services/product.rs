//! Amazon Product Advertising API: item search and lookup.
//!
//! Requests are `GET`s of `/onca/xml` on the locale's endpoint, signed with
//! signature version 2 when a secret key is configured. Responses are read
//! in the `AWSECommerceService` namespace of the configured API version,
//! registered under the `az` prefix.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use awsquery_auth::Parameters;
use awsquery_core::{ClientConfig, Clock, SystemClock};
use awsquery_xml::{ErrorPattern, ErrorPolicy, XPath};
use http::Method;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::request::{PRODUCT_PATH, prepare_request};
use crate::transport::{HttpRequest, HttpTransport};

/// Namespace of response documents, without the trailing API version.
pub const PRODUCT_NAMESPACE_BASE: &str = "http://webservices.amazon.com/AWSECommerceService/";

/// Error code the service returns for a search without results.
pub const NO_EXACT_MATCHES: &str = "AWS.ECommerceService.NoExactMatches";

/// Response group requested when the caller names none.
pub const DEFAULT_RESPONSE_GROUP: &str = "Small";

const PRODUCT_ERRORS: ErrorPolicy =
    ErrorPolicy::with_benign(ErrorPattern::PRODUCT_ADVERTISING, &[NO_EXACT_MATCHES]);

/// An item from a search or lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    /// Amazon Standard Identification Number.
    pub asin: String,
    /// Product page URL.
    pub detail_page_url: Option<String>,
    /// Sales rank, when the `SalesRank` response group was requested.
    pub sales_rank: Option<u64>,
    /// Values under `ItemAttributes`, keyed by element name.
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl Item {
    /// The first `Title` attribute.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.attribute("Title")
    }

    /// The first value of an item attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// Items returned by a search or lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// Items on this result page.
    pub items: Vec<Item>,
    /// Total number of matching items.
    pub total_results: u64,
    /// Total number of result pages.
    pub total_pages: u64,
}

impl SearchResult {
    /// Whether the result holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Client for the Product Advertising API.
#[derive(Debug, Clone)]
pub struct ProductAdvertising {
    config: Arc<ClientConfig>,
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
}

impl ProductAdvertising {
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
        Ok(Self {
            config,
            transport,
            clock,
        })
    }

    /// Namespace URI of response documents for the configured API version.
    #[must_use]
    pub fn namespace(&self) -> String {
        format!("{PRODUCT_NAMESPACE_BASE}{}", self.config.api_version)
    }

    /// Run an `ItemSearch` with the given request parameters.
    ///
    /// A search that matches nothing returns an empty result.
    pub fn item_search(&self, options: &Parameters) -> ClientResult<SearchResult> {
        self.execute("ItemSearch", options)
    }

    /// Run an `ItemLookup` for `asin` (or a comma-separated list of ASINs).
    pub fn item_lookup(&self, asin: &str, options: &Parameters) -> ClientResult<SearchResult> {
        let mut options = options.clone();
        options.insert("ItemId".to_owned(), asin.to_owned());
        self.execute("ItemLookup", &options)
    }

    /// Start a fluent query.
    #[must_use]
    pub fn query(&self) -> ItemQuery<'_> {
        ItemQuery {
            client: self,
            target: None,
            params: Parameters::new(),
        }
    }

    fn execute(&self, operation: &str, options: &Parameters) -> ClientResult<SearchResult> {
        let mut defaults = Parameters::new();
        defaults.insert("ResponseGroup".to_owned(), DEFAULT_RESPONSE_GROUP.to_owned());
        let prepared = prepare_request(
            operation,
            options,
            &defaults,
            &self.config,
            self.clock.as_ref(),
        )?;

        let endpoint = format!("{}{PRODUCT_PATH}", self.config.product_endpoint());
        debug!(operation, endpoint = %endpoint, "sending product advertising request");
        let request = HttpRequest::new(Method::GET, endpoint).with_query(&prepared);
        let response = self
            .transport
            .send(&request)?
            .into_service_response()
            .with_namespace("az", self.namespace());

        if response.is_client_error() {
            return Err(ClientError::Http {
                status: response.status(),
            });
        }
        let Some(xpath) = response.xpath() else {
            return Err(ClientError::InvalidDocument {
                status: response.status(),
            });
        };
        if PRODUCT_ERRORS.check(&response)?.is_some() {
            return Ok(SearchResult::default());
        }
        if !response.is_success() {
            return Err(ClientError::Http {
                status: response.status(),
            });
        }
        Ok(parse_result(&xpath))
    }
}

fn parse_result(xpath: &XPath<'_>) -> SearchResult {
    let count = |path: &str| -> u64 {
        xpath
            .first(path)
            .and_then(|element| element.text().trim().parse().ok())
            .unwrap_or_default()
    };
    let items = xpath
        .query("//az:Items/az:Item")
        .into_iter()
        .map(|node| {
            let mut attributes: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for attribute in xpath.query_from(node, "az:ItemAttributes/*") {
                if attribute.children().next().is_none() {
                    attributes
                        .entry(attribute.local_name().to_owned())
                        .or_default()
                        .push(attribute.text());
                }
            }
            let optional = |path: &str| {
                xpath
                    .query_from(node, path)
                    .first()
                    .map(|element| element.text())
            };
            Item {
                asin: xpath.evaluate_string(node, "az:ASIN"),
                detail_page_url: optional("az:DetailPageURL"),
                sales_rank: optional("az:SalesRank").and_then(|rank| rank.trim().parse().ok()),
                attributes,
            }
        })
        .collect();

    SearchResult {
        items,
        total_results: count("//az:Items/az:TotalResults"),
        total_pages: count("//az:Items/az:TotalPages"),
    }
}

/// Parameters [`ItemQuery::set`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    /// Free-text keywords.
    Keywords,
    /// Title words.
    Title,
    /// Book author.
    Author,
    /// Music artist.
    Artist,
    /// Film actor.
    Actor,
    /// Brand name.
    Brand,
    /// Manufacturer name.
    Manufacturer,
    /// Comma-separated response groups.
    ResponseGroup,
    /// Sort order.
    Sort,
    /// Result page number, starting at 1.
    ItemPage,
    /// Lowest price in the smallest currency unit.
    MinimumPrice,
    /// Highest price in the smallest currency unit.
    MaximumPrice,
    /// Associate tag credited with the request.
    AssociateTag,
    /// Item condition, e.g. `New`.
    Condition,
}

impl SearchField {
    /// The request parameter name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keywords => "Keywords",
            Self::Title => "Title",
            Self::Author => "Author",
            Self::Artist => "Artist",
            Self::Actor => "Actor",
            Self::Brand => "Brand",
            Self::Manufacturer => "Manufacturer",
            Self::ResponseGroup => "ResponseGroup",
            Self::Sort => "Sort",
            Self::ItemPage => "ItemPage",
            Self::MinimumPrice => "MinimumPrice",
            Self::MaximumPrice => "MaximumPrice",
            Self::AssociateTag => "AssociateTag",
            Self::Condition => "Condition",
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum QueryTarget {
    Category,
    Asin(String),
}

/// A search built step by step.
///
/// Choose a search index with [`category`](Self::category) or an item with
/// [`asin`](Self::asin) first, then add fields with [`set`](Self::set).
#[derive(Debug, Clone)]
pub struct ItemQuery<'c> {
    client: &'c ProductAdvertising,
    target: Option<QueryTarget>,
    params: Parameters,
}

impl ItemQuery<'_> {
    /// Search within a search index such as `Books`.
    #[must_use]
    pub fn category(mut self, search_index: impl Into<String>) -> Self {
        self.target = Some(QueryTarget::Category);
        self.params
            .insert("SearchIndex".to_owned(), search_index.into());
        self
    }

    /// Look up an item by ASIN instead of searching.
    #[must_use]
    pub fn asin(mut self, asin: impl Into<String>) -> Self {
        let asin = asin.into();
        self.params.remove("SearchIndex");
        self.params.insert("ItemId".to_owned(), asin.clone());
        self.target = Some(QueryTarget::Asin(asin));
        self
    }

    /// Set a search field.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Query`] if neither a category nor an ASIN was
    /// chosen yet.
    pub fn set(mut self, field: SearchField, value: impl Into<String>) -> ClientResult<Self> {
        if self.target.is_none() {
            return Err(ClientError::Query(format!(
                "You must set a category before setting the search parameters (got {field})"
            )));
        }
        self.params.insert(field.as_str().to_owned(), value.into());
        Ok(self)
    }

    /// The parameters collected so far.
    #[must_use]
    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Send the query as a lookup or a search.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Query`] if neither a category nor an ASIN was
    /// chosen, or any error of the underlying call.
    pub fn search(self) -> ClientResult<SearchResult> {
        match self.target {
            Some(QueryTarget::Asin(asin)) => self.client.item_lookup(&asin, &self.params),
            Some(QueryTarget::Category) => self.client.item_search(&self.params),
            None => Err(ClientError::Query(
                "You must set a category or an ASIN before searching".to_owned(),
            )),
        }
    }
}

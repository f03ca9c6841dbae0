//! Service clients built on the shared request and response pipeline.

mod attribute;
mod ec2;
mod product;
mod query;
mod simpledb;

pub use attribute::Attribute;
pub use ec2::{AvailabilityZone, EC2_API_VERSION, EC2_NAMESPACE, Ec2, Region};
pub use product::{
    DEFAULT_RESPONSE_GROUP, Item, ItemQuery, NO_EXACT_MATCHES, PRODUCT_NAMESPACE_BASE,
    ProductAdvertising, SearchField, SearchResult,
};
pub use simpledb::{
    DEFAULT_MAX_DOMAINS, SIMPLEDB_API_VERSION, SIMPLEDB_NAMESPACE, SelectItems, SimpleDb,
    validate_domain_name,
};

//! Amazon EC2 query API: region and availability zone discovery.

use std::sync::Arc;

use awsquery_auth::Parameters;
use awsquery_core::{ClientConfig, Clock, SystemClock};
use awsquery_xml::ServiceResponse;

use super::query::QueryService;
use crate::error::{ClientError, ClientResult};
use crate::transport::HttpTransport;

/// EC2 API version.
pub const EC2_API_VERSION: &str = "2009-04-04";

/// Namespace of EC2 response documents, registered under the `ec2` prefix.
pub const EC2_NAMESPACE: &str = "http://ec2.amazonaws.com/doc/2009-04-04/";

/// A region returned by `DescribeRegions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Region name, e.g. `us-east-1`.
    pub name: String,
    /// Region endpoint host.
    pub url: String,
}

/// An availability zone returned by `DescribeAvailabilityZones`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityZone {
    /// Zone name, e.g. `us-east-1a`.
    pub name: String,
    /// Zone state, e.g. `available`.
    pub state: String,
}

/// Client for the EC2 query API.
#[derive(Debug, Clone)]
pub struct Ec2 {
    service: QueryService,
}

impl Ec2 {
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
        let endpoint = config.ec2_endpoint.clone();
        Ok(Self {
            service: QueryService::new(
                config,
                transport,
                clock,
                endpoint,
                EC2_API_VERSION,
                "ec2",
                EC2_NAMESPACE.to_owned(),
            ),
        })
    }

    /// Describe the named regions, or every region when `names` is empty.
    pub fn describe_regions(&self, names: &[&str]) -> ClientResult<Vec<Region>> {
        let response = self
            .service
            .send("DescribeRegions", numbered("Region", names))?;
        Ok(items(&response, "ec2:regionName", "ec2:regionEndpoint")?
            .into_iter()
            .map(|(name, url)| Region { name, url })
            .collect())
    }

    /// Describe the named zones, or every zone when `names` is empty.
    pub fn describe_availability_zones(&self, names: &[&str]) -> ClientResult<Vec<AvailabilityZone>> {
        let response = self
            .service
            .send("DescribeAvailabilityZones", numbered("ZoneName", names))?;
        Ok(items(&response, "ec2:zoneName", "ec2:zoneState")?
            .into_iter()
            .map(|(name, state)| AvailabilityZone { name, state })
            .collect())
    }
}

/// `Name.1`, `Name.2`, ... for each value.
fn numbered(name: &str, values: &[&str]) -> Parameters {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| (format!("{name}.{}", i + 1), (*value).to_owned()))
        .collect()
}

/// Two string fields of every `ec2:item` in the response.
fn items(response: &ServiceResponse, first: &str, second: &str) -> ClientResult<Vec<(String, String)>> {
    let xpath = response.xpath().ok_or(ClientError::InvalidDocument {
        status: response.status(),
    })?;
    Ok(xpath
        .query("//ec2:item")
        .into_iter()
        .map(|item| {
            (
                xpath.evaluate_string(item, first),
                xpath.evaluate_string(item, second),
            )
        })
        .collect())
}

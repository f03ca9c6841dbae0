//! Retry integration tests.

#[cfg(test)]
mod tests {
    use awsquery_client::services::Ec2;
    use awsquery_client::{ClientError, with_retry};

    use crate::{ScriptedTransport, clock, config, query_error, xml};

    const EMPTY_REGIONS: &str = r#"<DescribeRegionsResponse xmlns="http://ec2.amazonaws.com/doc/2009-04-04/"><regionInfo/></DescribeRegionsResponse>"#;

    #[test]
    fn test_should_retry_throttled_calls_until_success() {
        let transport = ScriptedTransport::new([
            query_error(503, "RequestThrottled", "Request rate exceeded"),
            xml(503, ""),
            xml(200, EMPTY_REGIONS),
        ]);
        let ec2 = Ec2::with_clock(config(), transport.clone(), clock()).unwrap();

        let regions = with_retry(3, || ec2.describe_regions(&[])).unwrap();
        assert!(regions.is_empty());
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn test_should_give_up_after_attempts() {
        let transport = ScriptedTransport::new([
            query_error(503, "ServiceUnavailable", "Service is unavailable"),
            query_error(503, "ServiceUnavailable", "Service is unavailable"),
            xml(200, EMPTY_REGIONS),
        ]);
        let ec2 = Ec2::with_clock(config(), transport.clone(), clock()).unwrap();

        let err = with_retry(2, || ec2.describe_regions(&[])).unwrap_err();
        assert!(err.is_throttling());
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn test_should_not_retry_other_errors() {
        let transport = ScriptedTransport::new([
            query_error(400, "InvalidParameterValue", "bad region"),
            xml(200, EMPTY_REGIONS),
        ]);
        let ec2 = Ec2::with_clock(config(), transport.clone(), clock()).unwrap();

        let err = with_retry(5, || ec2.describe_regions(&["nowhere"])).unwrap_err();
        assert!(matches!(err, ClientError::Service(ref e) if e.code == "InvalidParameterValue"));
        assert_eq!(transport.requests().len(), 1);
    }
}

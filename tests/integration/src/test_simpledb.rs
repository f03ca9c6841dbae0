//! SimpleDB integration tests.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use awsquery_client::services::{Attribute, SimpleDb};
    use awsquery_client::{ClientError, Page};

    use crate::{FakeSimpleDb, clock, config};

    fn client(fake: &std::sync::Arc<FakeSimpleDb>) -> SimpleDb {
        SimpleDb::with_clock(config(), fake.clone(), clock()).unwrap()
    }

    fn values(attributes: &BTreeMap<String, Attribute>, name: &str) -> Vec<String> {
        let mut values = attributes
            .get(name)
            .map(|a| a.values().to_vec())
            .unwrap_or_default();
        values.sort();
        values
    }

    #[test]
    fn test_should_walk_domain_pages_until_last() {
        let fake = FakeSimpleDb::with_domains(&["alpha", "bravo", "charlie", "delta", "echo"]);
        let sdb = client(&fake);

        let mut pages: Vec<Page<Vec<String>>> = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = sdb.list_domains(2, token.as_deref()).unwrap();
            token = page.token().map(str::to_owned);
            let last = page.is_last();
            pages.push(page);
            if last {
                break;
            }
        }

        let sizes: Vec<usize> = pages.iter().map(|p| p.data().len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(pages[..2].iter().all(|p| !p.is_last() && p.token().is_some()));
        assert!(pages[2].token().is_none());

        let all: Vec<String> = pages.into_iter().flat_map(Page::into_data).collect();
        assert_eq!(all, vec!["alpha", "bravo", "charlie", "delta", "echo"]);
    }

    #[test]
    fn test_should_return_single_last_page_when_everything_fits() {
        let fake = FakeSimpleDb::with_domains(&["alpha", "bravo"]);
        let page = client(&fake).list_domains(100, None).unwrap();
        assert!(page.is_last());
        assert_eq!(page.data(), &vec!["alpha".to_owned(), "bravo".to_owned()]);
    }

    #[test]
    fn test_should_surface_service_error_for_stale_token() {
        let fake = FakeSimpleDb::with_domains(&["alpha", "bravo", "charlie"]);
        let sdb = client(&fake);

        let first = sdb.list_domains(2, None).unwrap();
        let token = first.token().unwrap().to_owned();
        sdb.delete_domain("charlie").unwrap();

        let err = sdb.list_domains(2, Some(&token)).unwrap_err();
        match err {
            ClientError::Service(e) => assert_eq!(e.code, "InvalidNextToken"),
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test]
    fn test_should_sign_every_request() {
        let fake = FakeSimpleDb::new();
        let sdb = client(&fake);
        sdb.create_domain("signed").unwrap();
        sdb.list_domains(10, None).unwrap();
        assert_eq!(fake.calls(), vec!["CreateDomain", "ListDomains"]);
    }

    #[test]
    fn test_should_reject_tampered_signature() {
        use awsquery_core::{ClientConfig, Credentials};

        let fake = FakeSimpleDb::new();
        let wrong = std::sync::Arc::new(
            ClientConfig::builder()
                .credentials(Credentials::new(crate::ACCESS_KEY, "not-the-secret").unwrap())
                .build(),
        );
        let err = SimpleDb::with_clock(wrong, fake.clone(), clock()).unwrap()
            .create_domain("nope")
            .unwrap_err();
        match err {
            ClientError::Service(e) => assert_eq!(e.code, "SignatureDoesNotMatch"),
            other => panic!("expected service error, got {other:?}"),
        }
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_should_accumulate_values_without_replace() {
        let fake = FakeSimpleDb::with_domains(&["store"]);
        let sdb = client(&fake);

        for color in ["red", "green", "blue"] {
            sdb.put_attributes("store", "shirt", &[Attribute::new("shirt", "color", [color])], &[])
                .unwrap();
        }

        let attributes = sdb.get_attributes("store", "shirt", None).unwrap();
        assert_eq!(values(&attributes, "color"), vec!["blue", "green", "red"]);
        assert_eq!(attributes["color"].item_name(), "shirt");
    }

    #[test]
    fn test_should_overwrite_values_with_replace() {
        let fake = FakeSimpleDb::with_domains(&["store"]);
        let sdb = client(&fake);

        for size in ["s", "m", "l"] {
            sdb.put_attributes(
                "store",
                "shirt",
                &[
                    Attribute::new("shirt", "size", [size]),
                    Attribute::new("shirt", "tag", [size]),
                ],
                &["size"],
            )
            .unwrap();
        }

        let attributes = sdb.get_attributes("store", "shirt", None).unwrap();
        assert_eq!(values(&attributes, "size"), vec!["l"]);
        assert_eq!(values(&attributes, "tag"), vec!["l", "m", "s"]);
    }

    #[test]
    fn test_should_restrict_get_to_one_attribute() {
        let fake = FakeSimpleDb::with_domains(&["store"]);
        let sdb = client(&fake);
        sdb.put_attributes(
            "store",
            "shirt",
            &[
                Attribute::new("shirt", "color", ["red"]),
                Attribute::new("shirt", "size", ["m"]),
            ],
            &[],
        )
        .unwrap();

        let attributes = sdb.get_attributes("store", "shirt", Some("size")).unwrap();
        assert_eq!(attributes.keys().collect::<Vec<_>>(), vec!["size"]);
    }

    #[test]
    fn test_should_return_empty_map_for_missing_item() {
        let fake = FakeSimpleDb::with_domains(&["store"]);
        let attributes = client(&fake).get_attributes("store", "ghost", None).unwrap();
        assert!(attributes.is_empty());
    }

    #[test]
    fn test_should_batch_put_with_per_item_replace() {
        let fake = FakeSimpleDb::with_domains(&["store"]);
        let sdb = client(&fake);
        let shirt = [Attribute::new("shirt", "color", ["red"])];
        let hat = [Attribute::new("hat", "color", ["black"])];

        sdb.batch_put_attributes("store", &[("shirt", &shirt), ("hat", &hat)], &[])
            .unwrap();
        let shirt = [Attribute::new("shirt", "color", ["white"])];
        let hat = [Attribute::new("hat", "color", ["grey"])];
        sdb.batch_put_attributes(
            "store",
            &[("shirt", &shirt), ("hat", &hat)],
            &[("hat", "color")],
        )
        .unwrap();

        let shirt = sdb.get_attributes("store", "shirt", None).unwrap();
        let hat = sdb.get_attributes("store", "hat", None).unwrap();
        assert_eq!(values(&shirt, "color"), vec!["red", "white"]);
        assert_eq!(values(&hat, "color"), vec!["grey"]);
    }

    #[test]
    fn test_should_delete_values_names_and_items() {
        let fake = FakeSimpleDb::with_domains(&["store"]);
        let sdb = client(&fake);
        sdb.put_attributes(
            "store",
            "shirt",
            &[
                Attribute::new("shirt", "color", ["red", "blue"]),
                Attribute::new("shirt", "size", ["m"]),
            ],
            &[],
        )
        .unwrap();

        sdb.delete_attributes("store", "shirt", &[Attribute::new("shirt", "color", ["red"])])
            .unwrap();
        let attributes = sdb.get_attributes("store", "shirt", None).unwrap();
        assert_eq!(values(&attributes, "color"), vec!["blue"]);

        sdb.delete_attributes(
            "store",
            "shirt",
            &[Attribute::new("shirt", "size", Vec::<String>::new())],
        )
        .unwrap();
        let attributes = sdb.get_attributes("store", "shirt", None).unwrap();
        assert!(!attributes.contains_key("size"));

        sdb.delete_attributes("store", "shirt", &[]).unwrap();
        assert!(sdb.get_attributes("store", "shirt", None).unwrap().is_empty());
    }

    #[test]
    fn test_should_read_domain_metadata() {
        let fake = FakeSimpleDb::with_domains(&["store"]);
        let sdb = client(&fake);
        sdb.put_attributes("store", "a", &[Attribute::new("a", "x", ["1"])], &[])
            .unwrap();
        sdb.put_attributes("store", "b", &[Attribute::new("b", "y", ["2"])], &[])
            .unwrap();

        let metadata = sdb.domain_metadata("store").unwrap();
        assert_eq!(metadata["ItemCount"], "2");
        assert_eq!(metadata["AttributeNameCount"], "2");
        assert_eq!(metadata["Timestamp"], "1257947558");
    }

    #[test]
    fn test_should_map_missing_domain_to_service_error() {
        let fake = FakeSimpleDb::new();
        let err = client(&fake).domain_metadata("missing").unwrap_err();
        assert!(matches!(err, ClientError::Service(ref e) if e.code == "NoSuchDomain"));
        assert!(!err.is_throttling());
    }

    #[test]
    fn test_should_page_through_select_results() {
        let fake = FakeSimpleDb::with_domains(&["store"]);
        let sdb = client(&fake);
        for item in ["a", "b", "c"] {
            sdb.put_attributes(
                "store",
                item,
                &[Attribute::new(item, "letter", [item.to_uppercase(), item.to_owned()])],
                &[],
            )
            .unwrap();
        }

        let expression = format!("select * from {}", SimpleDb::quote_name("store").unwrap());
        let first = sdb.select(&expression, None).unwrap();
        assert!(!first.is_last());
        assert_eq!(first.data().keys().collect::<Vec<_>>(), vec!["a", "b"]);

        let second = sdb.select(&expression, first.token()).unwrap();
        assert!(second.is_last());
        let c = &second.data()["c"]["letter"];
        assert_eq!(c.item_name(), "c");
        assert_eq!(c.values(), ["C", "c"]);
    }

    #[test]
    fn test_should_reject_malformed_endpoint_before_sending() {
        use awsquery_core::{ClientConfig, CoreError, Credentials};

        let fake = FakeSimpleDb::new();
        let config = std::sync::Arc::new(
            ClientConfig::builder()
                .credentials(Credentials::new(crate::ACCESS_KEY, crate::SECRET_KEY).unwrap())
                .simpledb_endpoint("sdb.amazonaws.com")
                .build(),
        );
        let err = SimpleDb::with_clock(config, fake.clone(), clock()).unwrap_err();
        assert!(matches!(err, ClientError::Config(CoreError::InvalidEndpoint(ref e)) if e == "sdb.amazonaws.com"));
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_should_validate_domain_before_sending() {
        let fake = FakeSimpleDb::new();
        let err = client(&fake).create_domain("no").unwrap_err();
        assert!(matches!(err, ClientError::InvalidDomainName { .. }));
        assert!(fake.calls().is_empty());
    }
}

//! Smoke Screen Unit tests for the sales desk components
//!
//! These test the public API of each module in isolation from the session
//! scenarios. They are intended as a smoke screen and mostly cover the
//! happy path.

use sales_desk::{
    cache::{CacheStore, QueryKey},
    catalog::{Customer, CustomerRef, Product, Record, TimeStamp},
    config::SessionConfig,
    draft::{DraftStore, SubmissionPhase},
    error::TransportError,
    utils::{new_uuid_to_bech32, strip_error_prefix},
    validation::{Reason, Verdict, evaluate},
};

fn product(id: &str, price: u64) -> Product {
    Product {
        id: id.into(),
        name: format!("product {id}"),
        stock: 5,
        price,
    }
}

// UTILS MODULE TESTS
#[cfg(test)]
mod utils_tests {
    use super::*;

    /// Test that generated ids carry the requested human-readable prefix
    #[test]
    fn generates_valid_bech32_with_hrp() {
        let encoded = new_uuid_to_bech32("customer_").unwrap();
        assert!(encoded.starts_with("customer_1"));
        assert!(encoded.len() > 10);
    }

    /// Test that an empty prefix is refused
    #[test]
    fn handles_empty_hrp() {
        assert!(new_uuid_to_bech32("").is_err());
    }

    /// Test that messages without the server prefix are left alone
    #[test]
    fn unprefixed_messages_pass_through() {
        assert_eq!(strip_error_prefix("timeout", "Error: "), "timeout");
    }
}

// CATALOG MODULE TESTS
#[cfg(test)]
mod catalog_tests {
    use super::*;

    /// Test that a customer's reference uses its full name
    #[test]
    fn customer_reference_uses_full_name() {
        let customer = Customer {
            id: "customer_1".into(),
            name: "Ana".into(),
            surname: "Diaz".into(),
            company: "Acme".into(),
            email: "ana@acme.test".into(),
            phone: None,
            created_at: TimeStamp::new(),
        };

        assert_eq!(customer.to_ref(), CustomerRef::new("customer_1", "Ana Diaz"));
    }

    /// Test that out-of-range dates are refused rather than panicking
    #[test]
    fn timestamp_new_with_rejects_bad_dates() {
        assert!(TimeStamp::new_with(2024, 2, 30, 0, 0, 0).is_none());
        assert!(TimeStamp::new_with(2024, 2, 29, 0, 0, 0).is_some());
    }
}

// DRAFT + VALIDATION TESTS
#[cfg(test)]
mod draft_tests {
    use super::*;

    /// Test that a new store is empty, idle and not submittable
    #[test]
    fn new_store_is_empty_and_idle() {
        let store = DraftStore::new();

        assert!(store.draft().is_empty());
        assert_eq!(store.total(), 0);
        assert_eq!(store.phase(), SubmissionPhase::Idle);
        assert_eq!(store.verdict(), Verdict::blocked(Reason::NoCustomer));
    }

    /// Test that reset clears customer, items and total
    #[test]
    fn reset_returns_to_empty() {
        let mut store = DraftStore::new();
        store.set_customer(CustomerRef::new("c1", "Ana Diaz")).unwrap();
        store.set_line_items(&[product("p1", 10)]).unwrap();

        store.reset().unwrap();

        assert!(store.draft().is_empty());
        assert_eq!(store.total(), 0);
    }

    /// Test that clearing the customer with an empty reference blocks submission
    #[test]
    fn clearing_customer_blocks_submission() {
        let mut store = DraftStore::new();
        store.set_customer(CustomerRef::new("c1", "Ana Diaz")).unwrap();
        store.set_line_items(&[product("p1", 10)]).unwrap();
        assert!(store.verdict().submittable);

        store.set_customer(CustomerRef::default()).unwrap();
        assert_eq!(evaluate(store.draft()), Verdict::blocked(Reason::NoCustomer));
    }

    /// Test that the configured default quantity is used for new items
    #[test]
    fn configured_default_quantity_applies() {
        let mut store = DraftStore::with_default_quantity(3);
        store.set_line_items(&[product("p1", 10)]).unwrap();
        assert_eq!(store.total(), 30);
    }
}

// CACHE TESTS
#[cfg(test)]
mod cache_tests {
    use super::*;

    /// Test that write then read returns the items in order
    #[test]
    fn write_then_read() {
        let mut cache = CacheStore::new();
        let key = QueryKey::new("productCatalog");
        cache.write(
            &key,
            vec![
                Record::from(product("p2", 1)),
                Record::from(product("p1", 1)),
            ],
        );

        let entry = cache.read(&key).unwrap();
        assert_eq!(entry.ids(), vec!["p2", "p1"]);
        assert!(entry.contains("p1"));
    }

    /// Test that eviction turns the key back into a miss
    #[test]
    fn evict_makes_key_a_miss() {
        let mut cache = CacheStore::new();
        let key = QueryKey::new("productCatalog");
        cache.write(&key, vec![]);
        assert!(cache.contains(&key));

        cache.evict(&key);
        assert!(!cache.mutate(&key, |items| items));
        assert!(cache.read(&key).is_none());
    }
}

// CONFIG + ERROR TESTS
#[cfg(test)]
mod config_tests {
    use super::*;

    /// Test that a custom prefix is what gets stripped
    #[test]
    fn custom_error_prefix() {
        let config = SessionConfig::new().set_error_prefix("GraphQL error: ");
        let err = TransportError::Rejected("GraphQL error: duplicate email".into());

        assert_eq!(err.display_message(&config.error_prefix), "duplicate email");
    }

    /// Test that list keys must differ per entity kind
    #[test]
    fn shared_list_keys_are_rejected() {
        let mut config = SessionConfig::new();
        config.orders_key = config.catalog_key.clone();
        assert!(config.validate().is_err());
    }
}

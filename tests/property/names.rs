//! Name pattern properties: generated well-formed names always validate,
//! malformed ones never do.

use std::collections::BTreeMap;

use eventide_schema::{Event, EventProcessor, SendType};
use eventide_core::Value;
use proptest::prelude::*;

fn processor() -> EventProcessor {
    EventProcessor::new("app-1", false)
}

fn bundle_meta() -> BTreeMap<String, Value> {
    let mut meta = BTreeMap::new();
    meta.insert("#bundle_id".to_string(), Value::from("com.e"));
    meta
}

proptest! {
    #[test]
    fn well_formed_names_are_accepted(name in "[a-zA-Z][a-zA-Z0-9_]{0,63}") {
        let event = Event::builder(name)
            .dt_id("u1")
            .metas(bundle_meta())
            .build()
            .unwrap();
        prop_assert!(processor().process(SendType::Track, &event).is_ok());
    }

    #[test]
    fn names_with_illegal_characters_are_rejected(
        prefix in "[a-zA-Z]{1,8}",
        bad in "[-+./: ]",
        suffix in "[a-zA-Z]{0,8}",
    ) {
        let event = Event::builder(format!("{prefix}{bad}{suffix}"))
            .dt_id("u1")
            .metas(bundle_meta())
            .build()
            .unwrap();
        prop_assert!(processor().process(SendType::Track, &event).is_err());
    }

    #[test]
    fn overlong_names_are_rejected(name in "[a-zA-Z][a-zA-Z0-9_]{64,80}") {
        let event = Event::builder(name)
            .dt_id("u1")
            .metas(bundle_meta())
            .build()
            .unwrap();
        prop_assert!(processor().process(SendType::Track, &event).is_err());
    }

    #[test]
    fn well_formed_property_keys_are_accepted(key in "[a-zA-Z][a-zA-Z0-9_]{0,63}") {
        let event = Event::builder("purchase")
            .dt_id("u1")
            .property(key, 1)
            .metas(bundle_meta())
            .build()
            .unwrap();
        prop_assert!(processor().process(SendType::Track, &event).is_ok());
    }
}

//! Serializer properties: every finite value round-trips through JSON with
//! its numeric interpretation intact, and non-finite floats always fail.

use std::collections::BTreeMap;

use eventide_core::Value;
use proptest::prelude::*;

/// Strategy for arbitrary finite values, nested up to 3 levels deep.
fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        // Finite floats only; the non-finite case is its own property.
        prop::num::f64::NORMAL.prop_map(Value::Float),
        "[a-zA-Z0-9_ ]{0,24}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 32, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::List),
            prop::collection::btree_map("[a-z_]{1,12}", inner, 0..8)
                .prop_map(|entries| Value::Map(entries.into_iter().collect())),
        ]
    })
}

fn json_matches(value: &Value, encoded: &serde_json::Value) -> bool {
    match (value, encoded) {
        (Value::Null, serde_json::Value::Null) => true,
        (Value::Bool(b), serde_json::Value::Bool(e)) => b == e,
        (Value::Int(i), serde_json::Value::Number(n)) => n.as_i64() == Some(*i),
        (Value::Float(f), serde_json::Value::Number(n)) => {
            n.as_f64().map(|e| (e - f).abs() <= f.abs() * 1e-12) == Some(true)
        }
        (Value::String(s), serde_json::Value::String(e)) => s == e,
        (Value::List(items), serde_json::Value::Array(encoded_items)) => {
            items.len() == encoded_items.len()
                && items
                    .iter()
                    .zip(encoded_items)
                    .all(|(v, e)| json_matches(v, e))
        }
        (Value::Map(entries), serde_json::Value::Object(encoded_entries)) => {
            entries.len() == encoded_entries.len()
                && entries
                    .iter()
                    .all(|(k, v)| encoded_entries.get(k).is_some_and(|e| json_matches(v, e)))
        }
        _ => false,
    }
}

proptest! {
    #[test]
    fn finite_values_round_trip(value in arb_value()) {
        let encoded = serde_json::to_string(&value).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        prop_assert!(json_matches(&value, &parsed), "{value:?} became {parsed}");
    }

    #[test]
    fn non_finite_floats_never_serialize(f in prop_oneof![
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
    ]) {
        prop_assert!(serde_json::to_string(&Value::Float(f)).is_err());

        // Burying the value in a container must not smuggle it through.
        let nested = Value::List(vec![Value::Int(1), Value::Float(f)]);
        prop_assert!(serde_json::to_string(&nested).is_err());

        let mut entries = BTreeMap::new();
        entries.insert("x".to_string(), Value::Float(f));
        prop_assert!(serde_json::to_string(&Value::Map(entries)).is_err());
    }

    #[test]
    fn encoding_is_compact(value in arb_value()) {
        let encoded = serde_json::to_string(&value).unwrap();
        prop_assert!(!encoded.contains(": "));
        prop_assert!(!encoded.contains(", "));
    }
}

//! Property-based tests for the build/parse round trip and the document-wide
//! laws: whatever the builder emits parses back to the same values, tables
//! keep insertion order, and accepted arrays stay homogeneous.

use proptest::prelude::*;
use zconf::{parse_str_as_map, Builder, Value};

/// Keys the builder emits unquoted.
fn bare_key() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_-]{0,11}"
}

/// Strings the basic-string encoder accepts: no backslashes (they must form
/// escapes), no leading `@` (that selects the literal form).
fn encodable_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 \t\n\"',.:;!?*(){}=-]{0,40}"
        .prop_filter("no literal-string prefix", |s| !s.starts_with('@'))
}

fn build_single(key: &str, value: impl Into<Value>) -> String {
    Builder::new()
        .add_value(key, value)
        .expect("builder accepts the value")
        .get_string()
}

proptest! {
    #[test]
    fn integers_round_trip(n in any::<i64>()) {
        let map = parse_str_as_map(&build_single("n", n)).unwrap();
        prop_assert_eq!(map.get("n").and_then(Value::as_integer), Some(n));
    }

    #[test]
    fn finite_floats_round_trip(x in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
        let map = parse_str_as_map(&build_single("x", x)).unwrap();
        let back = map.get("x").and_then(Value::as_float).unwrap();
        prop_assert_eq!(back.to_bits(), x.to_bits());
    }

    #[test]
    fn booleans_round_trip(b in any::<bool>()) {
        let map = parse_str_as_map(&build_single("b", b)).unwrap();
        prop_assert_eq!(map.get("b").and_then(Value::as_bool), Some(b));
    }

    #[test]
    fn strings_round_trip(s in encodable_text()) {
        let map = parse_str_as_map(&build_single("s", s.as_str())).unwrap();
        prop_assert_eq!(map.get("s").and_then(Value::as_str), Some(s.as_str()));
    }

    #[test]
    fn quoted_keys_round_trip(key in "[A-Za-z][A-Za-z0-9 ]{0,10}[A-Za-z]") {
        let map = parse_str_as_map(&build_single(&key, 1)).unwrap();
        prop_assert_eq!(map.get(&key).and_then(Value::as_integer), Some(1));
    }

    #[test]
    fn integer_arrays_round_trip(values in prop::collection::vec(any::<i64>(), 0..12)) {
        let array = Value::Array(values.iter().copied().map(Value::from).collect());
        let map = parse_str_as_map(&build_single("a", array)).unwrap();
        let back: Vec<i64> = map
            .get("a")
            .and_then(Value::as_array)
            .unwrap()
            .iter()
            .filter_map(Value::as_integer)
            .collect();
        prop_assert_eq!(back, values);
    }

    #[test]
    fn insertion_order_survives_the_round_trip(
        keys in prop::collection::hash_set(bare_key(), 1..10)
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let mut builder = Builder::new();
        for (index, key) in keys.iter().enumerate() {
            builder = builder.add_value(key.as_str(), index as i64).unwrap();
        }
        let map = parse_str_as_map(&builder.get_string()).unwrap();
        let parsed_keys: Vec<String> = map.keys().cloned().collect();
        prop_assert_eq!(parsed_keys, keys);
    }

    #[test]
    fn parsed_arrays_are_homogeneous(values in prop::collection::vec(any::<i32>(), 1..10)) {
        let numbers: Vec<String> = values.iter().map(|n| n.to_string()).collect();
        let document = format!("a = [{}]", numbers.join(", "));
        let map = parse_str_as_map(&document).unwrap();
        let array = map.get("a").and_then(Value::as_array).unwrap();
        let first = array[0].kind();
        prop_assert!(array.iter().all(|element| element.kind() == first));
    }

    #[test]
    fn emitting_a_parse_is_idempotent(
        n in any::<i64>(),
        s in encodable_text(),
        b in any::<bool>(),
    ) {
        let text = Builder::new()
            .add_value("n", n).unwrap()
            .add_value("s", s.as_str()).unwrap()
            .add_table("t").unwrap()
            .add_value("b", b).unwrap()
            .get_string();
        let first = parse_str_as_map(&text).unwrap();

        // Re-emit the parsed scalars in the same order and parse again.
        let reemitted = Builder::new()
            .add_value("n", first.get("n").unwrap().clone()).unwrap()
            .add_value("s", first.get("s").unwrap().clone()).unwrap()
            .add_table("t").unwrap()
            .add_value(
                "b",
                first
                    .get("t")
                    .and_then(Value::as_table)
                    .and_then(|t| t.get("b"))
                    .unwrap()
                    .clone(),
            )
            .unwrap()
            .get_string();
        prop_assert_eq!(first, parse_str_as_map(&reemitted).unwrap());
    }
}

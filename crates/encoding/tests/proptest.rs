//! Property-based tests for strata-encoding using proptest.

use proptest::prelude::*;
use strata_core::{Document, Value};
use strata_encoding::{key, uint, BinaryCodec, Codec};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1000i64..1000).prop_map(Value::Integer),
        any::<f64>().prop_map(Value::Double),
        (-1000i64..1000).prop_map(|i| Value::Double(i as f64 / 4.0)),
        precision_edge_integer().prop_map(Value::Integer),
        precision_edge_integer().prop_map(|i| Value::Double(i as f64)),
        "[a-c\u{0}]{0,4}".prop_map(Value::Text),
        prop::collection::vec(prop_oneof![Just(0u8), Just(1u8), Just(255u8), any::<u8>()], 0..4)
            .prop_map(Value::Blob),
    ]
}

/// Integers around the points where `f64` stops holding every integer, and
/// around the ends of the `i64` range.
fn precision_edge_integer() -> impl Strategy<Value = i64> {
    let centers = prop::sample::select(vec![1i64 << 53, -(1i64 << 53), i64::MAX, i64::MIN]);
    (centers, -8i64..=8).prop_map(|(c, d)| c.saturating_add(d))
}

fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(("[ab]{1,2}", inner), 0..4)
                .prop_map(|fields| Value::Document(fields.into_iter().collect())),
        ]
    })
}

fn document() -> impl Strategy<Value = Document> {
    prop::collection::vec(("[a-z]{1,3}", value()), 0..6).prop_map(|f| f.into_iter().collect())
}

proptest! {
    /// Byte order of encoded keys matches value order.
    #[test]
    fn key_order_matches_value_order(a in value(), b in value()) {
        let ea = key::encode_value(&a);
        let eb = key::encode_value(&b);
        prop_assert_eq!(a.cmp(&b), ea.cmp(&eb), "{:?} vs {:?}", a, b);
    }

    /// Encoded keys decode back to an equal value.
    #[test]
    fn key_decode_roundtrip(v in value()) {
        let decoded = key::decode_value(&key::encode_value(&v)).unwrap();
        prop_assert_eq!(decoded, v);
    }

    /// No encoded key is a proper prefix of another.
    #[test]
    fn key_encoding_is_prefix_free(a in value(), b in value()) {
        let ea = key::encode_value(&a);
        let eb = key::encode_value(&b);
        if ea != eb {
            prop_assert!(!eb.starts_with(&ea));
            prop_assert!(!ea.starts_with(&eb));
        }
    }

    /// Appending a suffix keeps composite keys ordered by value first.
    #[test]
    fn key_composite_orders_by_value(a in value(), b in value(), sa in any::<Vec<u8>>(), sb in any::<Vec<u8>>()) {
        let mut ca = key::encode_value(&a);
        ca.extend_from_slice(&sa);
        let mut cb = key::encode_value(&b);
        cb.extend_from_slice(&sb);
        if a != b {
            prop_assert_eq!(a.cmp(&b), ca.cmp(&cb));
        }
    }

    /// Varint byte order matches numeric order.
    #[test]
    fn uint_order_matches_numeric_order(a in any::<u64>(), b in any::<u64>()) {
        prop_assert_eq!(a.cmp(&b), uint::encode_uint(a).cmp(&uint::encode_uint(b)));
    }

    /// Varints decode back to the same number.
    #[test]
    fn uint_decode_roundtrip(v in any::<u64>()) {
        prop_assert_eq!(uint::decode_uint(&uint::encode_uint(v)).unwrap(), v);
    }

    /// The binary codec restores documents, field order included.
    #[test]
    fn binary_codec_roundtrip(doc in document()) {
        let codec = BinaryCodec::new();
        let decoded = codec.decode(&codec.encode(&doc)).unwrap();
        let names: Vec<&str> = decoded.field_names().collect();
        let expected: Vec<&str> = doc.field_names().collect();
        prop_assert_eq!(names, expected);
        prop_assert_eq!(decoded, doc);
    }
}

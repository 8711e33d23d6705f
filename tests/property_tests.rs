//! Property-based tests using proptest.
//!
//! These verify invariants that should hold for arbitrary inputs: codec
//! round trips, canonical wire form, frame sequencing, and keyspace /
//! snapshot behavior.

use bytes::Bytes;
use proptest::prelude::*;

use flintkv::resp::{self, reply, RespValue};
use flintkv::Keyspace;

/// Arbitrary binary keys and values
fn arb_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

/// Arbitrary one-line text (no CR/LF) for simple strings and errors
fn arb_line() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 :_-]{0,40}").unwrap()
}

/// Arbitrary RESP values, including nested arrays
fn arb_resp_value() -> impl Strategy<Value = RespValue> {
    let leaf = prop_oneof![
        arb_line().prop_map(RespValue::SimpleString),
        arb_line().prop_map(RespValue::Error),
        any::<i64>().prop_map(RespValue::Integer),
        arb_bytes().prop_map(|b| RespValue::BulkString(Bytes::from(b))),
        Just(RespValue::Null),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(RespValue::Array)
    })
}

proptest! {
    /// encode_bulk(v) parses back to a BulkString equal to v
    #[test]
    fn prop_bulk_reply_roundtrip(value in arb_bytes()) {
        let wire = reply::bulk(&value);
        let mut pos = 0;

        let parsed = resp::parse(&wire, &mut pos).unwrap();
        prop_assert_eq!(parsed, RespValue::BulkString(Bytes::from(value)));
        prop_assert_eq!(pos, wire.len());
    }

    /// Parse of any emitted value re-encodes to the identical byte string
    #[test]
    fn prop_canonical_wire_form(value in arb_resp_value()) {
        let wire = value.serialize();
        let mut pos = 0;

        let parsed = resp::parse(&wire, &mut pos).unwrap();
        prop_assert_eq!(pos, wire.len());
        prop_assert_eq!(parsed.serialize(), wire);
    }

    /// Concatenated frames parse out in order under repeated calls
    #[test]
    fn prop_concatenated_frames_parse_in_order(
        values in prop::collection::vec(arb_resp_value(), 1..6)
    ) {
        let mut wire = Vec::new();
        for value in &values {
            value.serialize_into(&mut wire);
        }

        let mut pos = 0;
        for expected in &values {
            let parsed = resp::parse(&wire, &mut pos).unwrap();
            prop_assert_eq!(&parsed, expected);
        }
        prop_assert_eq!(pos, wire.len());
    }

    /// set/get/del behave like a map for arbitrary binary pairs
    #[test]
    fn prop_keyspace_set_get_del(key in arb_bytes(), value in arb_bytes()) {
        let ks = Keyspace::new();

        ks.set(Bytes::from(key.clone()), Bytes::from(value.clone()));
        prop_assert_eq!(ks.get(&key), Some(Bytes::from(value)));

        prop_assert!(ks.del(&key));
        prop_assert_eq!(ks.get(&key), None);
        prop_assert!(!ks.del(&key));
    }

    /// Snapshot then restore yields the same set of pairs
    #[test]
    fn prop_snapshot_restore_preserves_pairs(
        entries in prop::collection::hash_map(arb_bytes(), arb_bytes(), 0..20)
    ) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("kvstore.dat");

        let ks = Keyspace::new();
        for (key, value) in &entries {
            ks.set(Bytes::from(key.clone()), Bytes::from(value.clone()));
        }
        ks.snapshot(&path).unwrap();

        let restored = Keyspace::open(&path).unwrap();
        prop_assert_eq!(restored.len(), entries.len());
        for (key, value) in &entries {
            prop_assert_eq!(restored.get(key), Some(Bytes::from(value.clone())));
        }
    }
}

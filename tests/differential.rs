//! Differential tests holding the two implementations to their contract:
//! byte-identical packing, representation-identical unpacking, and matching
//! error kinds on arbitrary (mostly malformed) input.

use proptest::prelude::*;

use twinpack::{fallback, fast, UnpackOptions, Value};

/// Arbitrary value trees over the full kind set, NaN floats included.
fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<f64>().prop_map(Value::Float),
        // All bit patterns, covering every NaN payload.
        any::<u64>().prop_map(|bits| Value::Float(f64::from_bits(bits))),
        ".{0,50}".prop_map(Value::from),
        prop::collection::vec(any::<u8>(), 0..50).prop_map(Value::from),
    ];
    leaf.prop_recursive(8, 128, 10, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..10).prop_map(Value::Array),
            prop::collection::vec((inner.clone(), inner), 0..10).prop_map(Value::Map),
        ]
    })
}

proptest! {
    #[test]
    fn both_implementations_pack_identically(v in arb_value()) {
        let a = fast::Packer::new().pack(&v).unwrap();
        let b = fallback::Packer::new().pack(&v).unwrap();
        prop_assert_eq!(&a[..], &b[..]);
    }

    #[test]
    fn fast_round_trips(v in arb_value()) {
        let buf = fast::Packer::new().pack(&v).unwrap();
        let got = fast::Unpacker::new().unpack(&buf).unwrap();
        // Value equality is representation equality, so NaN keys and
        // elements survive this comparison.
        prop_assert_eq!(got, v);
    }

    #[test]
    fn fallback_round_trips(v in arb_value()) {
        let buf = fallback::Packer::new().pack(&v).unwrap();
        let got = fallback::Unpacker::new().unpack(&buf).unwrap();
        prop_assert_eq!(got, v);
    }

    #[test]
    fn cross_implementation_round_trips(v in arb_value()) {
        let buf = fast::Packer::new().pack(&v).unwrap();
        let got = fallback::Unpacker::new().unpack(&buf).unwrap();
        prop_assert_eq!(got, v);
    }

    #[test]
    fn both_implementations_unpack_identically(buf in prop::collection::vec(any::<u8>(), 0..64)) {
        let a = fast::Unpacker::new().unpack(&buf);
        let b = fallback::Unpacker::new().unpack(&buf);
        match (a, b) {
            (Ok(x), Ok(y)) => prop_assert_eq!(x, y),
            (Err(x), Err(y)) => prop_assert_eq!(x.kind(), y.kind()),
            (x, y) => prop_assert!(false, "implementations disagree: {:?} vs {:?}", x, y),
        }
    }

    #[test]
    fn strict_unpackers_agree_too(buf in prop::collection::vec(any::<u8>(), 0..64)) {
        let opts = UnpackOptions::default()
            .strict_map_key(true)
            .max_str_len(16)
            .max_bin_len(16)
            .max_array_len(16)
            .max_map_len(16)
            .max_depth(4);
        let a = fast::Unpacker::with_options(opts).unpack(&buf);
        let b = fallback::Unpacker::with_options(opts).unpack(&buf);
        match (a, b) {
            (Ok(x), Ok(y)) => prop_assert_eq!(x, y),
            (Err(x), Err(y)) => prop_assert_eq!(x.kind(), y.kind()),
            (x, y) => prop_assert!(false, "implementations disagree: {:?} vs {:?}", x, y),
        }
    }
}

#[test]
fn error_kinds_match_on_crafted_inputs() {
    // One representative per error family.
    let cases: &[&[u8]] = &[
        &[],                      // incomplete: empty input
        &[0x81, 0x01],            // incomplete: map value missing
        &[0xA2, b'a'],            // incomplete: truncated fixstr
        &[0xC0, 0x00],            // extra data
        &[0xC1],                  // format: reserved marker
        &[0xD4, 0x00, 0x00],      // format: fixext
        &[0xA1, 0xFF],            // format: invalid UTF-8
        &[0xDD, 0xFF, 0xFF, 0xFF, 0xFF], // huge array32 declaration
    ];
    for case in cases {
        let a = fast::Unpacker::new().unpack(case);
        let b = fallback::Unpacker::new().unpack(case);
        match (a, b) {
            (Ok(x), Ok(y)) => assert_eq!(x, y),
            (Err(x), Err(y)) => assert_eq!(x.kind(), y.kind(), "input {case:02X?}"),
            (x, y) => panic!("implementations disagree on {case:02X?}: {x:?} vs {y:?}"),
        }
    }
}

#[test]
fn packed_output_is_byte_identical_on_boundary_values() {
    let boundaries = [
        Value::from(127i64),
        Value::from(128i64),
        Value::from(-32i64),
        Value::from(-33i64),
        Value::from(i64::MIN),
        Value::from(u64::MAX),
        Value::Float(f64::NAN),
        Value::from(""),
        Value::from("a".repeat(31).as_str()),
        Value::from("a".repeat(32).as_str()),
        Value::Bin(vec![]),
        Value::Array(vec![]),
        Value::Map(vec![]),
        Value::Array(vec![Value::Nil; 15]),
        Value::Array(vec![Value::Nil; 16]),
        Value::Map(vec![(Value::Nil, Value::Nil); 16]),
    ];
    for v in boundaries {
        let a = fast::Packer::new().pack(&v).unwrap();
        let b = fallback::Packer::new().pack(&v).unwrap();
        assert_eq!(&a[..], &b[..], "outputs differ for {v:?}");
    }
}

//! Property: any tuple of supported values survives the round trip.

use proptest::prelude::*;
use tangle::{deserialize, serialize, Codec, Table, Value};

/// Arbitrary acyclic values; identity-heavy cases live in `sharing.rs`.
fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<f64>().prop_map(Value::Float),
        proptest::collection::vec(any::<u8>(), 0..24)
            .prop_map(|b| Value::from(b.as_slice())),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(Value::seq),
            proptest::collection::vec(("[a-m]{1,6}", inner), 0..6).prop_map(|pairs| {
                let mut t = Table::new();
                for (k, v) in pairs {
                    t.set(Value::from(k.as_str()), v);
                }
                Value::from(t)
            }),
        ]
    })
}

/// Structural equality with NaN-tolerant, bit-exact float comparison.
fn values_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => {
            (x.is_nan() && y.is_nan()) || x.to_bits() == y.to_bits()
        }
        (Value::Table(x), Value::Table(y)) => {
            let x = x.borrow();
            let y = y.borrow();
            x.len() == y.len()
                && x.seq_len() == y.seq_len()
                && x.iter()
                    .all(|(k, v)| y.get(&k).map_or(false, |o| values_eq(v, o)))
        }
        _ => a == b,
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 512, ..ProptestConfig::default() })]

    #[test]
    fn encode_decode(values in proptest::collection::vec(arb_value(), 0..4)) {
        let enc = serialize(&values).unwrap();
        let dec = deserialize(&enc).unwrap();
        prop_assert_eq!(dec.len(), values.len());
        for (a, b) in values.iter().zip(dec.iter()) {
            prop_assert!(values_eq(a, b), "mismatch: {:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn encode_decode_legacy_floats(values in proptest::collection::vec(arb_value(), 0..4)) {
        let mut codec = Codec::new();
        codec.set_legacy_floats(true);

        let enc = codec.serialize(&values).unwrap();
        let dec = codec.deserialize(&enc).unwrap();
        prop_assert_eq!(dec.len(), values.len());
        for (a, b) in values.iter().zip(dec.iter()) {
            prop_assert!(values_eq(a, b), "mismatch: {:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn small_ints_cost_one_byte(i in -100i64..=100) {
        prop_assert_eq!(serialize(&[Value::Int(i)]).unwrap().len(), 1);
    }

    #[test]
    fn doubles_are_bit_exact(bits in any::<u64>()) {
        let f = f64::from_bits(bits);
        let enc = serialize(&[Value::Float(f)]).unwrap();
        let dec = deserialize(&enc).unwrap();
        let back = dec[0].to_float().unwrap();
        if f.is_nan() {
            prop_assert_eq!(back.to_bits(), 0x7FF8_0000_0000_0000u64);
        } else {
            prop_assert_eq!(back.to_bits(), bits);
        }
    }

    #[test]
    fn concatenation_of_streams(a in proptest::collection::vec(arb_scalar(), 0..4),
                                b in proptest::collection::vec(arb_scalar(), 0..4)) {
        // with nothing shareable in play, the identity tables are empty and
        // concatenating streams is literally concatenating bytes
        let mut joined = serialize(&a).unwrap();
        joined.extend(serialize(&b).unwrap());

        let together: Vec<Value> = a.iter().chain(b.iter()).cloned().collect();
        prop_assert_eq!(&joined, &serialize(&together).unwrap());

        let dec = deserialize(&joined).unwrap();
        prop_assert_eq!(dec.len(), together.len());
        for (x, y) in together.iter().zip(dec.iter()) {
            prop_assert!(values_eq(x, y));
        }
    }
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<f64>().prop_map(Value::Float),
    ]
}

//! Randomized invariants: round-trip fidelity and size agreement.

use std::collections::BTreeMap;

use proptest::prelude::*;
use wirebin::Wire;

#[derive(Wire, Debug, Default, PartialEq, Clone)]
struct Record {
    id: u64,
    delta: i32,
    count: usize,
    shift: isize,
    name: String,
    payload: Vec<u8>,
    flags: Vec<bool>,
    notes: BTreeMap<u16, String>,
    maybe: Option<i64>,
}

fn record_strategy() -> impl Strategy<Value = Record> {
    (
        any::<u64>(),
        any::<i32>(),
        any::<usize>(),
        any::<isize>(),
        ".{0,24}",
        proptest::collection::vec(any::<u8>(), 0..64),
        proptest::collection::vec(any::<bool>(), 0..40),
        proptest::collection::btree_map(any::<u16>(), ".{0,8}", 0..8),
        proptest::option::of(any::<i64>()),
    )
        .prop_map(
            |(id, delta, count, shift, name, payload, flags, notes, maybe)| Record {
                id,
                delta,
                count,
                shift,
                name,
                payload,
                flags,
                notes,
                maybe,
            },
        )
}

proptest! {
    #[test]
    fn roundtrip_preserves_records(record in record_strategy()) {
        let bytes = wirebin::to_vec(&record).unwrap();
        prop_assert_eq!(wirebin::size_of(&record), Some(bytes.len()));
        let back: Record = wirebin::from_bytes(&bytes).unwrap();
        prop_assert_eq!(back, record);
    }

    #[test]
    fn varint_roundtrip_and_length(u in any::<u64>()) {
        let boxed = vec![u];
        let bytes = wirebin::to_vec(&boxed).unwrap();
        let back: Vec<u64> = wirebin::from_bytes(&bytes).unwrap();
        prop_assert_eq!(back, boxed);

        let n = u as usize;
        let bytes = wirebin::to_vec(&n).unwrap();
        prop_assert!(bytes.len() <= 10);
        prop_assert_eq!(wirebin::size_of(&n), Some(bytes.len()));
        let back: usize = wirebin::from_bytes(&bytes).unwrap();
        prop_assert_eq!(back, n);
    }

    #[test]
    fn float_bit_patterns_survive(bits in any::<u64>()) {
        let x = f64::from_bits(bits);
        let bytes = wirebin::to_vec(&x).unwrap();
        let back: f64 = wirebin::from_bytes(&bytes).unwrap();
        prop_assert_eq!(back.to_bits(), bits);
    }

    #[test]
    fn bool_sequences_pack_to_ceil_len(flags in proptest::collection::vec(any::<bool>(), 0..200)) {
        let bytes = wirebin::to_vec(&flags).unwrap();
        let prefix = wirebin::size_of(&flags.len()).unwrap();
        prop_assert_eq!(bytes.len(), prefix + flags.len().div_ceil(8));
        let back: Vec<bool> = wirebin::from_bytes(&bytes).unwrap();
        prop_assert_eq!(back, flags);
    }
}

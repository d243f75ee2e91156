//! Round trips through every composable shape, plus decode failure modes.

use std::collections::{BTreeMap, HashMap};

use num_complex::Complex;
use wirebin::{Codec, Endian, Error, Wire};

#[derive(Wire, Debug, Default, PartialEq, Clone)]
struct Inner {
    id: u64,
    label: String,
}

#[derive(Wire, Debug, Default, PartialEq)]
struct Outer {
    version: u8,
    inner: Inner,
    history: Vec<Inner>,
    lookup: BTreeMap<String, Inner>,
    maybe: Option<Inner>,
    window: [i16; 3],
    offsets: Vec<isize>,
    gain: Complex<f64>,
}

fn sample() -> Outer {
    let inner = Inner {
        id: 42,
        label: "answer".to_string(),
    };
    let mut lookup = BTreeMap::new();
    lookup.insert("a".to_string(), inner.clone());
    lookup.insert("b".to_string(), Inner::default());
    Outer {
        version: 3,
        inner: inner.clone(),
        history: vec![inner, Inner::default()],
        lookup,
        maybe: Some(Inner {
            id: u64::MAX,
            label: String::new(),
        }),
        window: [-1, 0, i16::MAX],
        offsets: vec![0, -1, isize::MAX, isize::MIN],
        gain: Complex::new(-0.5, 3.25),
    }
}

#[test]
fn nested_struct_roundtrip() {
    let value = sample();
    let bytes = wirebin::to_vec(&value).unwrap();
    assert_eq!(wirebin::size_of(&value), Some(bytes.len()));
    let back: Outer = wirebin::from_bytes(&bytes).unwrap();
    assert_eq!(back, value);
}

#[test]
fn nested_struct_roundtrip_big_endian() {
    let codec = Codec::new(Endian::Big);
    let value = sample();
    let bytes = codec.to_vec(&value).unwrap();
    let back: Outer = codec.from_bytes(&bytes).unwrap();
    assert_eq!(back, value);
}

#[test]
fn to_slice_writes_the_same_bytes() {
    let value = sample();
    let bytes = wirebin::to_vec(&value).unwrap();
    let mut buf = vec![0u8; bytes.len()];
    let written = wirebin::to_slice(&value, &mut buf).unwrap();
    assert_eq!(written, bytes.len());
    assert_eq!(buf, bytes);
}

#[test]
fn to_slice_rejects_short_buffers() {
    let value = sample();
    let needed = wirebin::size_of(&value).unwrap();
    let mut buf = vec![0u8; needed - 1];
    assert_eq!(
        wirebin::to_slice(&value, &mut buf),
        Err(Error::NotEnoughSpace)
    );
}

#[test]
fn scalar_extremes_roundtrip() {
    macro_rules! check {
        ($($v:expr => $t:ty),+ $(,)?) => {
            $(
                let value: $t = $v;
                let bytes = wirebin::to_vec(&value).unwrap();
                assert_eq!(wirebin::size_of(&value), Some(bytes.len()));
                let back: $t = wirebin::from_bytes(&bytes).unwrap();
                assert_eq!(back, value);
            )+
        };
    }
    check! {
        i8::MIN => i8, i8::MAX => i8,
        i16::MIN => i16, i64::MIN => i64,
        u64::MAX => u64, u32::MAX => u32,
        usize::MAX => usize, isize::MIN => isize,
        f32::MIN_POSITIVE => f32, f64::MAX => f64,
        true => bool,
    }
}

#[test]
fn maps_roundtrip_with_any_iteration_order() {
    let mut map = HashMap::new();
    for key in 0u16..50 {
        map.insert(key, vec![key as u8, 1, 2]);
    }
    let bytes = wirebin::to_vec(&map).unwrap();
    assert_eq!(wirebin::size_of(&map), Some(bytes.len()));
    let back: HashMap<u16, Vec<u8>> = wirebin::from_bytes(&bytes).unwrap();
    assert_eq!(back, map);
}

#[test]
fn from_bytes_into_replaces_existing_contents() {
    let mut target = vec!["stale".to_string(), "data".to_string()];
    let fresh = vec!["new".to_string()];
    let bytes = wirebin::to_vec(&fresh).unwrap();
    wirebin::from_bytes_into(&bytes, &mut target).unwrap();
    assert_eq!(target, fresh);
}

#[test]
fn trailing_bytes_are_not_an_error() {
    let mut bytes = wirebin::to_vec(&7u8).unwrap();
    bytes.extend_from_slice(&[0xAA, 0xBB]);
    let back: u8 = wirebin::from_bytes(&bytes).unwrap();
    assert_eq!(back, 7);

    let (value, rest) = wirebin::take_from_bytes::<u8>(&bytes).unwrap();
    assert_eq!(value, 7);
    assert_eq!(rest, [0xAA, 0xBB]);
}

#[test]
fn exhausted_input_is_a_short_read() {
    let value = Inner {
        id: 300,
        label: "trimmed".to_string(),
    };
    let bytes = wirebin::to_vec(&value).unwrap();
    for cut in 0..bytes.len() {
        let result = wirebin::from_bytes::<Inner>(&bytes[..cut]);
        assert_eq!(result, Err(Error::ShortRead), "cut at {cut}");
    }
}

#[test]
fn invalid_utf8_is_rejected() {
    // length 2, then an orphan continuation byte
    let bytes = [0x02, 0xC3, 0x28];
    assert_eq!(
        wirebin::from_bytes::<String>(&bytes),
        Err(Error::InvalidUtf8)
    );
}

#[test]
fn overlong_varint_is_rejected() {
    let bytes = [0x80u8; 11];
    assert_eq!(
        wirebin::from_bytes::<usize>(&bytes),
        Err(Error::MalformedVarint)
    );
}

#[test]
fn array_count_mismatch_is_rejected() {
    let bytes = wirebin::to_vec(&[1u16, 2, 3]).unwrap();
    assert_eq!(
        wirebin::from_bytes::<[u16; 4]>(&bytes),
        Err(Error::LengthMismatch {
            expected: 4,
            found: 3
        })
    );
}

#[test]
fn double_pointers_are_rejected() {
    let nested: Option<Option<u8>> = Some(Some(1));
    assert!(matches!(
        wirebin::to_vec(&nested),
        Err(Error::UnsupportedKind(_))
    ));
    assert_eq!(wirebin::size_of(&nested), None);

    let mut target: Option<Option<u8>> = None;
    assert!(matches!(
        wirebin::from_bytes_into(&[0x01, 0x01, 0x01], &mut target),
        Err(Error::UnsupportedKind(_))
    ));
}

#[derive(Wire, Debug, Default, PartialEq)]
struct Empty {}

#[test]
fn empty_struct_encodes_to_nothing() {
    let bytes = wirebin::to_vec(&Empty {}).unwrap();
    assert!(bytes.is_empty());
    let _: Empty = wirebin::from_bytes(&bytes).unwrap();
}

#[derive(Wire, Debug, Default, PartialEq)]
struct Wrapped<T> {
    value: T,
    note: String,
}

#[test]
fn generic_struct_roundtrip() {
    let wrapped = Wrapped {
        value: vec![1u32, 2, 3],
        note: "generic".to_string(),
    };
    let bytes = wirebin::to_vec(&wrapped).unwrap();
    let back: Wrapped<Vec<u32>> = wirebin::from_bytes(&bytes).unwrap();
    assert_eq!(back, wrapped);
}

#[test]
fn skip_value_consumes_exactly_one_payload() {
    let first = sample();
    let second = Inner {
        id: 9,
        label: "tail".to_string(),
    };
    let mut bytes = wirebin::to_vec(&first).unwrap();
    bytes.extend_from_slice(&wirebin::to_vec(&second).unwrap());

    let consumed = wirebin::skip_value::<Outer>(&bytes).unwrap();
    assert_eq!(consumed, wirebin::size_of(&first).unwrap());
    let back: Inner = wirebin::from_bytes(&bytes[consumed..]).unwrap();
    assert_eq!(back, second);
}

#[test]
fn skip_value_reports_short_input() {
    let bytes = wirebin::to_vec(&sample()).unwrap();
    assert_eq!(
        wirebin::skip_value::<Outer>(&bytes[..bytes.len() - 1]),
        Err(Error::ShortRead)
    );
}

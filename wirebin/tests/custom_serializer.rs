//! Custom-serializer delegation: precedence over the structural walk, the
//! per-codec toggle, and registration-time triad validation.

use core::any::TypeId;

use wirebin::{
    Codec, Cursor, Error, Kind, Reader, Reflected, Serializer, SerializerOps, Shape, StructView,
    Value, ValueMut, Wire, register,
};

#[derive(Wire, Debug, Default, PartialEq, Clone)]
#[wire(serializer)]
struct Blob {
    data: Vec<u8>,
}

impl Serializer for Blob {
    fn size_in_bytes(&self) -> usize {
        2 + self.data.len()
    }

    fn encode_to(&self, out: &mut Cursor<'_>) -> Result<(), Error> {
        out.put_u8(0xB0)?;
        out.put_u8(self.data.len() as u8)?;
        out.write(&self.data)
    }

    fn decode_from(&mut self, input: &mut Reader<'_>) -> Result<(), Error> {
        if input.u8()? != 0xB0 {
            return Err(Error::ShortRead);
        }
        let len = input.u8()? as usize;
        self.data.clear();
        self.data.extend_from_slice(input.take(len)?);
        Ok(())
    }
}

fn blob() -> Blob {
    Blob {
        data: vec![1, 2, 3],
    }
}

#[test]
fn serializer_takes_precedence_over_the_structural_walk() {
    let bytes = wirebin::to_vec(&blob()).unwrap();
    assert_eq!(bytes, [0xB0, 0x03, 1, 2, 3]);

    // Identical to what encode_to writes directly.
    let mut direct = vec![0u8; bytes.len()];
    let mut out = Cursor::new(&mut direct);
    blob().encode_to(&mut out).unwrap();
    assert_eq!(direct, bytes);

    assert_eq!(wirebin::size_of(&blob()), Some(bytes.len()));
    let back: Blob = wirebin::from_bytes(&bytes).unwrap();
    assert_eq!(back, blob());
}

#[test]
fn disabling_serializers_falls_back_to_the_structural_walk() {
    let codec = Codec::default().with_serializers(false);
    let bytes = codec.to_vec(&blob()).unwrap();
    // Plain struct layout: one Vec<u8> field.
    assert_eq!(bytes, [0x03, 1, 2, 3]);
    assert_eq!(codec.size_of(&blob()), Some(bytes.len()));
    let back: Blob = codec.from_bytes(&bytes).unwrap();
    assert_eq!(back, blob());
}

#[derive(Wire, Debug, Default, PartialEq)]
struct Carrier {
    header: u8,
    payload: Blob,
    tail: Option<Blob>,
}

#[test]
fn serializer_fields_delegate_inside_structs() {
    let carrier = Carrier {
        header: 9,
        payload: blob(),
        tail: Some(Blob { data: vec![7] }),
    };
    let bytes = wirebin::to_vec(&carrier).unwrap();
    assert_eq!(bytes, [9, 0xB0, 0x03, 1, 2, 3, 0x01, 0xB0, 0x01, 7]);
    let back: Carrier = wirebin::from_bytes(&bytes).unwrap();
    assert_eq!(back, carrier);

    // The cached path agrees with the uncached one.
    register::<Carrier>().unwrap();
    assert_eq!(wirebin::to_vec(&carrier).unwrap(), bytes);
    let back: Carrier = wirebin::from_bytes(&bytes).unwrap();
    assert_eq!(back, carrier);
}

#[test]
fn serializer_elements_delegate_inside_sequences() {
    let blobs = vec![blob(), Blob { data: vec![] }];
    let bytes = wirebin::to_vec(&blobs).unwrap();
    assert_eq!(bytes, [0x02, 0xB0, 0x03, 1, 2, 3, 0xB0, 0x00]);
    let back: Vec<Blob> = wirebin::from_bytes(&bytes).unwrap();
    assert_eq!(back, blobs);
}

#[test]
fn serializer_types_are_registrable() {
    #[derive(Wire, Debug, Default, PartialEq)]
    #[wire(serializer)]
    struct Registered {
        n: u32,
    }
    impl Serializer for Registered {
        fn size_in_bytes(&self) -> usize {
            1
        }
        fn encode_to(&self, out: &mut Cursor<'_>) -> Result<(), Error> {
            out.put_u8(self.n as u8)
        }
        fn decode_from(&mut self, input: &mut Reader<'_>) -> Result<(), Error> {
            self.n = input.u8()? as u32;
            Ok(())
        }
    }

    register::<Registered>().unwrap();
    assert_eq!(
        register::<Registered>(),
        Err(Error::DuplicateRegistration("Registered"))
    );
}

// Hand-built shapes can carry partial capability tables; registration is
// where those get caught.

macro_rules! hollow_struct_view {
    ($t:ty) => {
        impl StructView for $t {
            fn field(&self, index: usize) -> &dyn Reflected {
                panic!("no encodable field at index {index}")
            }
            fn field_mut(&mut self, index: usize) -> &mut dyn Reflected {
                panic!("no encodable field at index {index}")
            }
        }
    };
}

#[derive(Default)]
struct NoDecode;
hollow_struct_view!(NoDecode);

impl Wire for NoDecode {
    const SHAPE: &'static Shape = &const {
        Shape {
            type_identifier: "NoDecode",
            type_id: TypeId::of::<NoDecode>,
            kind: Kind::Struct(&[]),
            serializer: Some(&SerializerOps {
                size_in_bytes: Some(|_| 1),
                encode_to: Some(|_, out| out.put_u8(0xEE)),
                decode_from: None,
            }),
        }
    };

    fn mirror(&self) -> Value<'_> {
        Value::Struct(self)
    }

    fn mirror_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Struct(self)
    }
}

#[derive(Default)]
struct SizeOnly;
hollow_struct_view!(SizeOnly);

impl Wire for SizeOnly {
    const SHAPE: &'static Shape = &const {
        Shape {
            type_identifier: "SizeOnly",
            type_id: TypeId::of::<SizeOnly>,
            kind: Kind::Struct(&[]),
            serializer: Some(&SerializerOps {
                size_in_bytes: Some(|_| 0),
                encode_to: None,
                decode_from: None,
            }),
        }
    };

    fn mirror(&self) -> Value<'_> {
        Value::Struct(self)
    }

    fn mirror_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Struct(self)
    }
}

#[test]
fn partial_triads_fail_registration() {
    assert_eq!(register::<NoDecode>(), Err(Error::DecodeMustMutate("NoDecode")));
    assert_eq!(
        register::<SizeOnly>(),
        Err(Error::IncompleteSerializer("SizeOnly"))
    );
}

#[test]
fn partial_triads_are_not_consulted_by_the_traversal() {
    // An incomplete table never delegates; the structural walk applies.
    let bytes = wirebin::to_vec(&NoDecode).unwrap();
    assert!(bytes.is_empty());
}

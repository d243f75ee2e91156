//! Codec instances: endianness selection, serializer toggle, entrypoints.

use crate::cursor::{Cursor, Reader};
use crate::deserialize::{decode_node, skip_node};
use crate::error::Error;
use crate::registry::{self, Registry};
use crate::serialize::{encode_node, size_node};
use crate::serializer::SerializerCheck;
use crate::value::Wire;

/// Byte order for fixed-width primitives. Varints are byte-oriented and
/// unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

macro_rules! endian_rw {
    ($put:ident, $get:ident, $t:ty, $n:expr) => {
        #[doc = concat!("Writes a `", stringify!($t), "` in this byte order.")]
        pub(crate) fn $put(self, out: &mut Cursor<'_>, value: $t) -> Result<(), Error> {
            let bytes = match self {
                Endian::Little => value.to_le_bytes(),
                Endian::Big => value.to_be_bytes(),
            };
            out.write(&bytes)
        }

        #[doc = concat!("Reads a `", stringify!($t), "` in this byte order.")]
        pub(crate) fn $get(self, input: &mut Reader<'_>) -> Result<$t, Error> {
            let bytes: [u8; $n] = input.take($n)?.try_into().unwrap();
            Ok(match self {
                Endian::Little => <$t>::from_le_bytes(bytes),
                Endian::Big => <$t>::from_be_bytes(bytes),
            })
        }
    };
}

impl Endian {
    endian_rw!(put_u16, u16, u16, 2);
    endian_rw!(put_u32, u32, u32, 4);
    endian_rw!(put_u64, u64, u64, 8);
}

/// Per-call traversal state: the registry snapshot and the byte order.
pub(crate) struct Context<'reg> {
    pub(crate) registry: &'reg Registry,
    pub(crate) endian: Endian,
}

/// A configured codec: fixed byte order plus a custom-serializer toggle.
///
/// The free functions at the crate root use a little-endian codec with
/// serializers enabled; construct an instance for anything else.
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    endian: Endian,
    serializers: bool,
}

impl Codec {
    /// Creates a codec with the given byte order, serializers enabled.
    pub const fn new(endian: Endian) -> Self {
        Codec {
            endian,
            serializers: true,
        }
    }

    /// Enables or disables custom-serializer delegation for this codec.
    pub const fn with_serializers(mut self, enabled: bool) -> Self {
        self.serializers = enabled;
        self
    }

    fn check(&self) -> SerializerCheck {
        SerializerCheck::top(self.serializers)
    }

    /// Encodes `value` into a fresh, exactly-sized buffer.
    pub fn to_vec<T: Wire>(&self, value: &T) -> Result<Vec<u8>, Error> {
        let registry = registry::read();
        let cx = Context {
            registry: &registry,
            endian: self.endian,
        };
        let size = size_node(value, &cx, self.check())?;
        let mut buf = vec![0u8; size];
        let mut out = Cursor::new(&mut buf);
        encode_node(value, &mut out, &cx, self.check())?;
        debug_assert_eq!(out.len(), size);
        Ok(buf)
    }

    /// Encodes `value` into `buf`, returning the number of bytes written.
    ///
    /// Fails with [`Error::NotEnoughSpace`] when `buf` cannot hold the
    /// payload; the buffer contents are then unspecified.
    pub fn to_slice<T: Wire>(&self, value: &T, buf: &mut [u8]) -> Result<usize, Error> {
        let registry = registry::read();
        let cx = Context {
            registry: &registry,
            endian: self.endian,
        };
        let mut out = Cursor::new(buf);
        encode_node(value, &mut out, &cx, self.check())?;
        Ok(out.len())
    }

    /// Decodes one `T` from the front of `bytes`. Trailing bytes are ignored.
    pub fn from_bytes<T: Wire + Default>(&self, bytes: &[u8]) -> Result<T, Error> {
        let mut value = T::default();
        self.from_bytes_into(bytes, &mut value)?;
        Ok(value)
    }

    /// Decodes one `T` from the front of `bytes` into an existing value.
    pub fn from_bytes_into<T: Wire>(&self, bytes: &[u8], target: &mut T) -> Result<(), Error> {
        let registry = registry::read();
        let cx = Context {
            registry: &registry,
            endian: self.endian,
        };
        let mut input = Reader::new(bytes);
        decode_node(target, &mut input, &cx, self.check())
    }

    /// Decodes one `T` and returns it together with the unconsumed tail.
    pub fn take_from_bytes<'de, T: Wire + Default>(
        &self,
        bytes: &'de [u8],
    ) -> Result<(T, &'de [u8]), Error> {
        let registry = registry::read();
        let cx = Context {
            registry: &registry,
            endian: self.endian,
        };
        let mut input = Reader::new(bytes);
        let mut value = T::default();
        decode_node(&mut value, &mut input, &cx, self.check())?;
        Ok((value, input.remaining()))
    }

    /// Exact encoded size of `value`, or `None` if its shape contains an
    /// unsupported kind.
    pub fn size_of<T: Wire>(&self, value: &T) -> Option<usize> {
        let registry = registry::read();
        let cx = Context {
            registry: &registry,
            endian: self.endian,
        };
        size_node(value, &cx, self.check()).ok()
    }

    /// Consumes one structurally-laid-out `T` payload from the front of
    /// `bytes` without materializing it, returning the byte count.
    pub fn skip_value<T: Wire>(&self, bytes: &[u8]) -> Result<usize, Error> {
        let registry = registry::read();
        let cx = Context {
            registry: &registry,
            endian: self.endian,
        };
        let mut input = Reader::new(bytes);
        skip_node(T::SHAPE, &mut input, &cx)?;
        Ok(input.pos())
    }
}

impl Default for Codec {
    fn default() -> Self {
        Codec::new(Endian::Little)
    }
}

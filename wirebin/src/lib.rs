//! Compact, schema-required binary serialization.
//!
//! `wirebin` converts in-memory values to and from dense byte sequences.
//! The encoded form carries no type tags: the reader must decode with the
//! same schema the writer encoded with. Integers outside fixed-width fields
//! use base-128 varints, boolean sequences pack eight to a byte, optional
//! values cost one presence byte, and struct fields are concatenated in
//! declaration order with nothing in between.
//!
//! # Example
//!
//! ```
//! use wirebin::Wire;
//!
//! #[derive(Wire, Debug, Default, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//!     label: String,
//! }
//!
//! let point = Point { x: 10, y: -3, label: "origin-ish".to_string() };
//! let bytes = wirebin::to_vec(&point).unwrap();
//! let back: Point = wirebin::from_bytes(&bytes).unwrap();
//! assert_eq!(point, back);
//! ```
//!
//! # Field tags
//!
//! `#[wire(ignore)]` excludes a field from both directions; it contributes
//! zero bytes and decodes to its default. `#[wire(packed)]` encodes a
//! fixed-width integer field as a varint instead, once the struct has been
//! [`register`]ed.
//!
//! # Registration
//!
//! [`register`] pre-parses a struct's field metadata into a process-wide
//! cache. Encoded bytes are identical with or without registration, except
//! that `packed` only takes effect through the cache. Register everything at
//! startup; the registry is read-shared by every call afterwards.
//!
//! # Custom serializers
//!
//! A type can take over its own wire format by implementing [`Serializer`]
//! (a size/encode/decode triad) and advertising it in its shape — with the
//! derive, `#[wire(serializer)]`. See [`serializer_ops!`].

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod bits;
mod codec;
mod cursor;
mod deserialize;
mod error;
mod impls;
mod registry;
mod serialize;
mod serializer;
mod shape;
mod value;
pub mod varint;

pub use codec::{Codec, Endian};
pub use cursor::{Cursor, Reader};
pub use error::Error;
pub use registry::{FieldInfo, StructInfo, register};
pub use serializer::Serializer;
pub use shape::{FieldShape, Kind, SerializerOps, Shape};
pub use value::{
    MapBuild, MapView, PtrBuild, Reflected, SeqBuild, SeqView, StructView, Value, ValueMut, Wire,
};

/// Derives [`Wire`] for a struct.
///
/// Supports `#[wire(ignore)]` and `#[wire(packed)]` on fields and
/// `#[wire(serializer)]` on the struct itself.
#[cfg(feature = "derive")]
pub use wirebin_macros::Wire;

/// Encodes `value` into a fresh, exactly-sized buffer.
///
/// Little-endian, serializers enabled; use a [`Codec`] for other
/// configurations.
pub fn to_vec<T: Wire>(value: &T) -> Result<Vec<u8>, Error> {
    Codec::default().to_vec(value)
}

/// Encodes `value` into `buf`, returning the number of bytes written.
pub fn to_slice<T: Wire>(value: &T, buf: &mut [u8]) -> Result<usize, Error> {
    Codec::default().to_slice(value, buf)
}

/// Decodes one `T` from the front of `bytes`. Trailing bytes are ignored.
pub fn from_bytes<T: Wire + Default>(bytes: &[u8]) -> Result<T, Error> {
    Codec::default().from_bytes(bytes)
}

/// Decodes one `T` from the front of `bytes` into an existing value.
pub fn from_bytes_into<T: Wire>(bytes: &[u8], target: &mut T) -> Result<(), Error> {
    Codec::default().from_bytes_into(bytes, target)
}

/// Decodes one `T` and returns it together with the unconsumed tail.
pub fn take_from_bytes<'de, T: Wire + Default>(bytes: &'de [u8]) -> Result<(T, &'de [u8]), Error> {
    Codec::default().take_from_bytes(bytes)
}

/// Exact encoded size of `value`, or `None` if its shape contains an
/// unsupported kind.
pub fn size_of<T: Wire>(value: &T) -> Option<usize> {
    Codec::default().size_of(value)
}

/// Consumes one structurally-laid-out `T` payload from the front of `bytes`
/// without materializing it, returning the byte count.
pub fn skip_value<T: Wire>(bytes: &[u8]) -> Result<usize, Error> {
    Codec::default().skip_value::<T>(bytes)
}

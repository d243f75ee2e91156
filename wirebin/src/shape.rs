//! Static type descriptions driving the traversal.
//!
//! Every participating type exposes a `&'static Shape` through the
//! [`Wire`](crate::Wire) trait. The traversal drivers walk values and shapes
//! in lockstep; the shape decides the wire layout, the value mirrors supply
//! the data.

use core::any::{Any, TypeId};

use crate::cursor::{Cursor, Reader};
use crate::error::Error;

/// Static description of one type.
pub struct Shape {
    /// Source-level identifier, used in error messages.
    pub type_identifier: &'static str,
    /// Produces the [`TypeId`] of the described type.
    pub type_id: fn() -> TypeId,
    /// Which wire layout the type uses.
    pub kind: Kind,
    /// Custom-serializer capability, if the type advertises one.
    pub serializer: Option<&'static SerializerOps>,
}

impl Shape {
    /// The [`TypeId`] of the described type.
    #[inline]
    pub fn id(&self) -> TypeId {
        (self.type_id)()
    }

    /// True when the shape carries the full size/encode/decode triad.
    pub fn has_full_serializer(&self) -> bool {
        self.serializer.is_some_and(|ops| {
            ops.size_in_bytes.is_some() && ops.encode_to.is_some() && ops.decode_from.is_some()
        })
    }
}

/// The closed set of wire layouts.
pub enum Kind {
    /// One byte, `0x00` or `0x01`.
    Bool,
    /// Fixed-width signed integer.
    I8,
    /// Fixed-width signed integer.
    I16,
    /// Fixed-width signed integer.
    I32,
    /// Fixed-width signed integer.
    I64,
    /// Fixed-width unsigned integer.
    U8,
    /// Fixed-width unsigned integer.
    U16,
    /// Fixed-width unsigned integer.
    U32,
    /// Fixed-width unsigned integer.
    U64,
    /// Architecture-width signed integer, always zig-zag varint.
    Int,
    /// Architecture-width unsigned integer, always varint.
    Uint,
    /// IEEE-754 bit pattern as a fixed-width u32.
    F32,
    /// IEEE-754 bit pattern as a fixed-width u64.
    F64,
    /// Real then imaginary part, each an f32.
    Complex64,
    /// Real then imaginary part, each an f64.
    Complex128,
    /// Varint byte length followed by UTF-8 bytes.
    Str,
    /// Varint element count followed by the elements.
    Seq(&'static Shape),
    /// Statically sized sequence; count still emitted (see bool exception
    /// for struct fields).
    Array(usize, &'static Shape),
    /// Varint entry count followed by key/value pairs.
    Map(&'static Shape, &'static Shape),
    /// Declared fields in order; invalid fields contribute nothing.
    Struct(&'static [FieldShape]),
    /// Presence byte followed by the payload when present.
    Ptr(&'static Shape),
}

impl Kind {
    /// True for the fixed-width integer kinds eligible for `packed`.
    pub fn is_fixed_int(&self) -> bool {
        matches!(
            self,
            Kind::I8
                | Kind::I16
                | Kind::I32
                | Kind::I64
                | Kind::U8
                | Kind::U16
                | Kind::U32
                | Kind::U64
        )
    }
}

/// Per-field metadata inside a struct shape.
pub struct FieldShape {
    /// Declared field name.
    pub name: &'static str,
    /// Shape of the field's type; `None` for ignored fields, whose types
    /// need not participate at all.
    pub shape: Option<&'static Shape>,
    /// Excluded from encoding and decoding.
    pub ignore: bool,
    /// Requests varint encoding for fixed-width integer fields; honored
    /// only through the registered-type cache.
    pub packed: bool,
}

/// Type-erased entry points of the custom-serializer triad.
///
/// Built by [`serializer_ops!`](crate::serializer_ops) or a derive with the
/// `serializer` attribute; hand-built tables may be partial, which
/// registration rejects.
pub struct SerializerOps {
    /// Measurement operation, value receiver.
    pub size_in_bytes: Option<fn(&dyn Any) -> usize>,
    /// Encode operation, value receiver.
    pub encode_to: Option<fn(&dyn Any, &mut Cursor<'_>) -> Result<(), Error>>,
    /// Decode operation, mutable receiver.
    pub decode_from: Option<fn(&mut dyn Any, &mut Reader<'_>) -> Result<(), Error>>,
}

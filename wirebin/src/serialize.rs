//! Encode and size traversals.
//!
//! Both walk a value depth-first, left to right, and must stay mechanical
//! mirrors of each other and of the decode side: every length prefix, bit
//! pack, varint frame, and presence byte written here is consumed in the
//! same order by `deserialize`.

use core::any::Any;

use log::trace;

use crate::bits;
use crate::codec::{Context, Endian};
use crate::cursor::Cursor;
use crate::error::Error;
use crate::serializer::SerializerCheck;
use crate::shape::{Kind, Shape};
use crate::value::{Reflected, SeqView, StructView, Value};
use crate::varint::{uvarint_len, varint_len, write_uvarint, write_varint};

/// Resolves a pointer shape's target, rejecting double indirection.
pub(crate) fn ptr_target(shape: &'static Shape) -> Result<&'static Shape, Error> {
    match shape.kind {
        Kind::Ptr(target) => match target.kind {
            Kind::Ptr(_) => Err(Error::UnsupportedKind(shape.type_identifier)),
            _ => Ok(target),
        },
        _ => Err(Error::UnsupportedKind(shape.type_identifier)),
    }
}

/// Element shape of a sequence or fixed-length array.
pub(crate) fn seq_elem(shape: &'static Shape) -> Result<&'static Shape, Error> {
    match shape.kind {
        Kind::Seq(elem) | Kind::Array(_, elem) => Ok(elem),
        _ => Err(Error::UnsupportedKind(shape.type_identifier)),
    }
}

/// Encodes one value.
pub(crate) fn encode_node(
    value: &dyn Reflected,
    out: &mut Cursor<'_>,
    cx: &Context<'_>,
    check: SerializerCheck,
) -> Result<(), Error> {
    let shape = value.shape();
    trace!("encoding {}", shape.type_identifier);

    if check.delegates(shape) {
        if let Some(ops) = shape.serializer {
            if let Some(encode_to) = ops.encode_to {
                trace!("delegating {} to its serializer", shape.type_identifier);
                return encode_to(value.as_any(), out);
            }
        }
    }

    if fast_encode(value.as_any(), out, cx.endian)? {
        return Ok(());
    }

    match value.reflect() {
        Value::Bool(b) => out.put_u8(b as u8),
        Value::I8(x) => out.put_u8(x as u8),
        Value::U8(x) => out.put_u8(x),
        Value::I16(x) => cx.endian.put_u16(out, x as u16),
        Value::U16(x) => cx.endian.put_u16(out, x),
        Value::I32(x) => cx.endian.put_u32(out, x as u32),
        Value::U32(x) => cx.endian.put_u32(out, x),
        Value::I64(x) => cx.endian.put_u64(out, x as u64),
        Value::U64(x) => cx.endian.put_u64(out, x),
        Value::Int(x) => write_varint(out, x),
        Value::Uint(x) => write_uvarint(out, x),
        Value::F32(x) => cx.endian.put_u32(out, x.to_bits()),
        Value::F64(x) => cx.endian.put_u64(out, x.to_bits()),
        Value::Complex64(z) => {
            cx.endian.put_u32(out, z.re.to_bits())?;
            cx.endian.put_u32(out, z.im.to_bits())
        }
        Value::Complex128(z) => {
            cx.endian.put_u64(out, z.re.to_bits())?;
            cx.endian.put_u64(out, z.im.to_bits())
        }
        Value::Str(s) => {
            write_uvarint(out, s.len() as u64)?;
            out.write(s.as_bytes())
        }
        Value::Seq(view) => encode_seq(shape, view, out, cx, check, true),
        Value::Map(view) => {
            let (key_shape, value_shape) = match shape.kind {
                Kind::Map(key, value) => (key, value),
                _ => return Err(Error::UnsupportedKind(shape.type_identifier)),
            };
            write_uvarint(out, view.len() as u64)?;
            let key_check = check.child(key_shape);
            let value_check = check.child(value_shape);
            view.visit(&mut |key, value| {
                encode_node(key, out, cx, key_check)?;
                encode_node(value, out, cx, value_check)
            })
        }
        Value::Struct(view) => encode_struct(shape, view, out, cx, check),
        Value::Ptr(pointee) => {
            let target = ptr_target(shape)?;
            match pointee {
                None => out.put_u8(0),
                Some(inner) => {
                    out.put_u8(1)?;
                    encode_node(inner, out, cx, check.child(target))
                }
            }
        }
    }
}

/// Encodes a sequence; the count prefix is elided for bool arrays sitting
/// directly in a struct.
fn encode_seq(
    shape: &'static Shape,
    view: &dyn SeqView,
    out: &mut Cursor<'_>,
    cx: &Context<'_>,
    check: SerializerCheck,
    with_prefix: bool,
) -> Result<(), Error> {
    let elem = seq_elem(shape)?;
    let len = view.len();
    if with_prefix {
        write_uvarint(out, len as u64)?;
    }
    if matches!(elem.kind, Kind::Bool) {
        let region = out.reserve(bits::packed_len(len))?;
        region.fill(0);
        for index in 0..len {
            if let Value::Bool(true) = view.at(index).reflect() {
                bits::set_bit(region, index);
            }
        }
        return Ok(());
    }
    let sub = check.child(elem);
    for index in 0..len {
        encode_node(view.at(index), out, cx, sub)?;
    }
    Ok(())
}

/// Encodes the valid fields of a struct, in declaration order.
fn encode_struct(
    shape: &'static Shape,
    view: &dyn StructView,
    out: &mut Cursor<'_>,
    cx: &Context<'_>,
    check: SerializerCheck,
) -> Result<(), Error> {
    let fields = match shape.kind {
        Kind::Struct(fields) => fields,
        _ => return Err(Error::UnsupportedKind(shape.type_identifier)),
    };
    let info = cx.registry.struct_info(shape);

    for (index, field) in fields.iter().enumerate() {
        if field.ignore {
            continue;
        }
        let Some(field_shape) = field.shape else {
            continue;
        };
        let cached = info.map(|info| &info.fields[index]);
        let is_serializer = match cached {
            Some(cached) => cached.is_serializer,
            None => field_shape.has_full_serializer(),
        };
        let sub = check.field(is_serializer);
        let child = view.field(index);

        if cached.is_some_and(|cached| cached.packed) && field_shape.kind.is_fixed_int() {
            encode_packed_int(child, out)?;
            continue;
        }
        if is_packed_bool_array(field_shape) {
            if let Value::Seq(seq) = child.reflect() {
                encode_seq(field_shape, seq, out, cx, sub, false)?;
            }
            continue;
        }
        encode_node(child, out, cx, sub)?;
    }
    Ok(())
}

/// A fixed bool array, whose count a struct field does not re-emit.
pub(crate) fn is_packed_bool_array(shape: &'static Shape) -> bool {
    matches!(shape.kind, Kind::Array(_, elem) if matches!(elem.kind, Kind::Bool))
}

/// Varint form of a fixed-width integer field under the `packed` tag.
fn encode_packed_int(value: &dyn Reflected, out: &mut Cursor<'_>) -> Result<(), Error> {
    match value.reflect() {
        Value::I8(x) => write_varint(out, x as i64),
        Value::I16(x) => write_varint(out, x as i64),
        Value::I32(x) => write_varint(out, x as i64),
        Value::I64(x) => write_varint(out, x),
        Value::U8(x) => write_uvarint(out, x as u64),
        Value::U16(x) => write_uvarint(out, x as u64),
        Value::U32(x) => write_uvarint(out, x as u64),
        Value::U64(x) => write_uvarint(out, x),
        _ => Err(Error::UnsupportedKind(value.shape().type_identifier)),
    }
}

macro_rules! fast_fixed {
    ($any:ident, $out:ident, $endian:ident; $($t:ty => $put:ident),+ $(,)?) => {
        $(
            if let Some(&x) = $any.downcast_ref::<$t>() {
                $endian.$put($out, x as _)?;
                return Ok(true);
            }
            if let Some(v) = $any.downcast_ref::<Vec<$t>>() {
                write_uvarint($out, v.len() as u64)?;
                for &x in v {
                    $endian.$put($out, x as _)?;
                }
                return Ok(true);
            }
        )+
    };
}

/// Direct dispatch for built-in primitives and primitive sequences,
/// bypassing the mirrors. Byte-for-byte identical to the reflective walk.
fn fast_encode(any: &dyn Any, out: &mut Cursor<'_>, endian: Endian) -> Result<bool, Error> {
    if let Some(&x) = any.downcast_ref::<u8>() {
        out.put_u8(x)?;
        return Ok(true);
    }
    if let Some(&x) = any.downcast_ref::<i8>() {
        out.put_u8(x as u8)?;
        return Ok(true);
    }
    if let Some(&x) = any.downcast_ref::<bool>() {
        out.put_u8(x as u8)?;
        return Ok(true);
    }
    if let Some(&x) = any.downcast_ref::<f32>() {
        endian.put_u32(out, x.to_bits())?;
        return Ok(true);
    }
    if let Some(&x) = any.downcast_ref::<f64>() {
        endian.put_u64(out, x.to_bits())?;
        return Ok(true);
    }
    if let Some(&x) = any.downcast_ref::<usize>() {
        write_uvarint(out, x as u64)?;
        return Ok(true);
    }
    if let Some(&x) = any.downcast_ref::<isize>() {
        write_varint(out, x as i64)?;
        return Ok(true);
    }
    if let Some(s) = any.downcast_ref::<String>() {
        write_uvarint(out, s.len() as u64)?;
        out.write(s.as_bytes())?;
        return Ok(true);
    }
    if let Some(v) = any.downcast_ref::<Vec<u8>>() {
        write_uvarint(out, v.len() as u64)?;
        out.write(v)?;
        return Ok(true);
    }
    if let Some(v) = any.downcast_ref::<Vec<bool>>() {
        write_uvarint(out, v.len() as u64)?;
        let region = out.reserve(bits::packed_len(v.len()))?;
        region.fill(0);
        for (index, &b) in v.iter().enumerate() {
            if b {
                bits::set_bit(region, index);
            }
        }
        return Ok(true);
    }
    fast_fixed!(any, out, endian;
        u16 => put_u16,
        u32 => put_u32,
        u64 => put_u64,
        i16 => put_u16,
        i32 => put_u32,
        i64 => put_u64,
    );
    Ok(false)
}

/// Measures one value: an exact mirror of [`encode_node`] that counts
/// instead of writing.
pub(crate) fn size_node(
    value: &dyn Reflected,
    cx: &Context<'_>,
    check: SerializerCheck,
) -> Result<usize, Error> {
    let shape = value.shape();

    if check.delegates(shape) {
        if let Some(ops) = shape.serializer {
            if let Some(size_in_bytes) = ops.size_in_bytes {
                return Ok(size_in_bytes(value.as_any()));
            }
        }
    }

    match value.reflect() {
        Value::Bool(_) | Value::I8(_) | Value::U8(_) => Ok(1),
        Value::I16(_) | Value::U16(_) => Ok(2),
        Value::I32(_) | Value::U32(_) | Value::F32(_) => Ok(4),
        Value::I64(_) | Value::U64(_) | Value::F64(_) | Value::Complex64(_) => Ok(8),
        Value::Complex128(_) => Ok(16),
        Value::Int(x) => Ok(varint_len(x)),
        Value::Uint(x) => Ok(uvarint_len(x)),
        Value::Str(s) => Ok(uvarint_len(s.len() as u64) + s.len()),
        Value::Seq(view) => size_seq(shape, view, cx, check, true),
        Value::Map(view) => {
            let (key_shape, value_shape) = match shape.kind {
                Kind::Map(key, value) => (key, value),
                _ => return Err(Error::UnsupportedKind(shape.type_identifier)),
            };
            let key_check = check.child(key_shape);
            let value_check = check.child(value_shape);
            let mut total = uvarint_len(view.len() as u64);
            view.visit(&mut |key, value| {
                total += size_node(key, cx, key_check)?;
                total += size_node(value, cx, value_check)?;
                Ok(())
            })?;
            Ok(total)
        }
        Value::Struct(view) => size_struct(shape, view, cx, check),
        Value::Ptr(pointee) => {
            let target = ptr_target(shape)?;
            match pointee {
                None => Ok(1),
                Some(inner) => Ok(1 + size_node(inner, cx, check.child(target))?),
            }
        }
    }
}

fn size_seq(
    shape: &'static Shape,
    view: &dyn SeqView,
    cx: &Context<'_>,
    check: SerializerCheck,
    with_prefix: bool,
) -> Result<usize, Error> {
    let elem = seq_elem(shape)?;
    let len = view.len();
    let mut total = if with_prefix {
        uvarint_len(len as u64)
    } else {
        0
    };
    if matches!(elem.kind, Kind::Bool) {
        return Ok(total + bits::packed_len(len));
    }
    let sub = check.child(elem);
    for index in 0..len {
        total += size_node(view.at(index), cx, sub)?;
    }
    Ok(total)
}

fn size_struct(
    shape: &'static Shape,
    view: &dyn StructView,
    cx: &Context<'_>,
    check: SerializerCheck,
) -> Result<usize, Error> {
    let fields = match shape.kind {
        Kind::Struct(fields) => fields,
        _ => return Err(Error::UnsupportedKind(shape.type_identifier)),
    };
    let info = cx.registry.struct_info(shape);
    let mut total = 0;

    for (index, field) in fields.iter().enumerate() {
        if field.ignore {
            continue;
        }
        let Some(field_shape) = field.shape else {
            continue;
        };
        let cached = info.map(|info| &info.fields[index]);
        let is_serializer = match cached {
            Some(cached) => cached.is_serializer,
            None => field_shape.has_full_serializer(),
        };
        let sub = check.field(is_serializer);
        let child = view.field(index);

        if cached.is_some_and(|cached| cached.packed) && field_shape.kind.is_fixed_int() {
            total += packed_int_len(child)?;
            continue;
        }
        if is_packed_bool_array(field_shape) {
            if let Value::Seq(seq) = child.reflect() {
                total += size_seq(field_shape, seq, cx, sub, false)?;
            }
            continue;
        }
        total += size_node(child, cx, sub)?;
    }
    Ok(total)
}

fn packed_int_len(value: &dyn Reflected) -> Result<usize, Error> {
    match value.reflect() {
        Value::I8(x) => Ok(varint_len(x as i64)),
        Value::I16(x) => Ok(varint_len(x as i64)),
        Value::I32(x) => Ok(varint_len(x as i64)),
        Value::I64(x) => Ok(varint_len(x)),
        Value::U8(x) => Ok(uvarint_len(x as u64)),
        Value::U16(x) => Ok(uvarint_len(x as u64)),
        Value::U32(x) => Ok(uvarint_len(x as u64)),
        Value::U64(x) => Ok(uvarint_len(x)),
        _ => Err(Error::UnsupportedKind(value.shape().type_identifier)),
    }
}

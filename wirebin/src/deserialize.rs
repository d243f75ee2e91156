//! Decode and skip traversals: mechanical mirrors of the encode side.

use core::any::Any;

use log::trace;

use crate::bits;
use crate::codec::{Context, Endian};
use crate::cursor::Reader;
use crate::error::Error;
use crate::serialize::{is_packed_bool_array, ptr_target, seq_elem};
use crate::serializer::SerializerCheck;
use crate::shape::{Kind, Shape};
use crate::value::{Reflected, SeqBuild, StructView, ValueMut};
use crate::varint::{read_uvarint, read_varint};

/// Decodes one value in place.
pub(crate) fn decode_node(
    target: &mut dyn Reflected,
    input: &mut Reader<'_>,
    cx: &Context<'_>,
    check: SerializerCheck,
) -> Result<(), Error> {
    let shape = target.shape();
    trace!("decoding {}", shape.type_identifier);

    if check.delegates(shape) {
        if let Some(ops) = shape.serializer {
            if let Some(decode_from) = ops.decode_from {
                trace!("delegating {} to its serializer", shape.type_identifier);
                return decode_from(target.as_any_mut(), input);
            }
        }
    }

    if fast_decode(target.as_any_mut(), input, cx.endian)? {
        return Ok(());
    }

    match target.reflect_mut() {
        ValueMut::Bool(b) => {
            *b = input.u8()? != 0;
            Ok(())
        }
        ValueMut::I8(x) => {
            *x = input.u8()? as i8;
            Ok(())
        }
        ValueMut::U8(x) => {
            *x = input.u8()?;
            Ok(())
        }
        ValueMut::I16(x) => {
            *x = cx.endian.u16(input)? as i16;
            Ok(())
        }
        ValueMut::U16(x) => {
            *x = cx.endian.u16(input)?;
            Ok(())
        }
        ValueMut::I32(x) => {
            *x = cx.endian.u32(input)? as i32;
            Ok(())
        }
        ValueMut::U32(x) => {
            *x = cx.endian.u32(input)?;
            Ok(())
        }
        ValueMut::I64(x) => {
            *x = cx.endian.u64(input)? as i64;
            Ok(())
        }
        ValueMut::U64(x) => {
            *x = cx.endian.u64(input)?;
            Ok(())
        }
        ValueMut::Int(x) => {
            *x = read_varint(input)? as isize;
            Ok(())
        }
        ValueMut::Uint(x) => {
            *x = read_uvarint(input)? as usize;
            Ok(())
        }
        ValueMut::F32(x) => {
            *x = f32::from_bits(cx.endian.u32(input)?);
            Ok(())
        }
        ValueMut::F64(x) => {
            *x = f64::from_bits(cx.endian.u64(input)?);
            Ok(())
        }
        ValueMut::Complex64(z) => {
            z.re = f32::from_bits(cx.endian.u32(input)?);
            z.im = f32::from_bits(cx.endian.u32(input)?);
            Ok(())
        }
        ValueMut::Complex128(z) => {
            z.re = f64::from_bits(cx.endian.u64(input)?);
            z.im = f64::from_bits(cx.endian.u64(input)?);
            Ok(())
        }
        ValueMut::Str(s) => {
            let len = read_uvarint(input)? as usize;
            let bytes = input.take(len)?;
            match core::str::from_utf8(bytes) {
                Ok(text) => {
                    s.clear();
                    s.push_str(text);
                    Ok(())
                }
                Err(_) => Err(Error::InvalidUtf8),
            }
        }
        ValueMut::Seq(build) => decode_seq(shape, build, input, cx, check, true),
        ValueMut::Map(build) => {
            let (key_shape, value_shape) = match shape.kind {
                Kind::Map(key, value) => (key, value),
                _ => return Err(Error::UnsupportedKind(shape.type_identifier)),
            };
            let count = read_uvarint(input)? as usize;
            let key_check = check.child(key_shape);
            let value_check = check.child(value_shape);
            build.clear();
            for _ in 0..count {
                build.insert_with(&mut |key, value| {
                    decode_node(key, input, cx, key_check)?;
                    decode_node(value, input, cx, value_check)
                })?;
            }
            Ok(())
        }
        ValueMut::Struct(view) => decode_struct(shape, view, input, cx, check),
        ValueMut::Ptr(build) => {
            let target_shape = ptr_target(shape)?;
            if input.u8()? == 0 {
                build.clear();
                Ok(())
            } else {
                let inner = build.set_default();
                decode_node(inner, input, cx, check.child(target_shape))
            }
        }
    }
}

/// Decodes a sequence; the count comes from the wire except for bool arrays
/// sitting directly in a struct, whose static length is authoritative.
fn decode_seq(
    shape: &'static Shape,
    build: &mut dyn SeqBuild,
    input: &mut Reader<'_>,
    cx: &Context<'_>,
    check: SerializerCheck,
    with_prefix: bool,
) -> Result<(), Error> {
    let elem = seq_elem(shape)?;
    let len = if with_prefix {
        read_uvarint(input)? as usize
    } else {
        match shape.kind {
            Kind::Array(n, _) => n,
            _ => return Err(Error::UnsupportedKind(shape.type_identifier)),
        }
    };
    if matches!(elem.kind, Kind::Bool) {
        let bytes = input.take(bits::packed_len(len))?;
        build.fill_default(len)?;
        for index in 0..len {
            if let ValueMut::Bool(b) = build.at_mut(index).reflect_mut() {
                *b = bits::get_bit(bytes, index);
            }
        }
        return Ok(());
    }
    // Every element of these kinds consumes at least one byte, so a count
    // beyond the remaining input is hostile; reject it before allocating.
    if len > input.remaining().len() && !matches!(elem.kind, Kind::Struct(_) | Kind::Array(..)) {
        return Err(Error::ShortRead);
    }
    build.fill_default(len)?;
    let sub = check.child(elem);
    for index in 0..len {
        decode_node(build.at_mut(index), input, cx, sub)?;
    }
    Ok(())
}

/// Decodes the valid fields of a struct, leaving ignored fields untouched.
fn decode_struct(
    shape: &'static Shape,
    view: &mut dyn StructView,
    input: &mut Reader<'_>,
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
        let child = view.field_mut(index);

        if cached.is_some_and(|cached| cached.packed) && field_shape.kind.is_fixed_int() {
            decode_packed_int(child, input)?;
            continue;
        }
        if is_packed_bool_array(field_shape) {
            if let ValueMut::Seq(build) = child.reflect_mut() {
                decode_seq(field_shape, build, input, cx, sub, false)?;
            }
            continue;
        }
        decode_node(child, input, cx, sub)?;
    }
    Ok(())
}

/// Varint form of a fixed-width integer field under the `packed` tag.
fn decode_packed_int(target: &mut dyn Reflected, input: &mut Reader<'_>) -> Result<(), Error> {
    match target.reflect_mut() {
        ValueMut::I8(x) => {
            *x = read_varint(input)? as i8;
            Ok(())
        }
        ValueMut::I16(x) => {
            *x = read_varint(input)? as i16;
            Ok(())
        }
        ValueMut::I32(x) => {
            *x = read_varint(input)? as i32;
            Ok(())
        }
        ValueMut::I64(x) => {
            *x = read_varint(input)?;
            Ok(())
        }
        ValueMut::U8(x) => {
            *x = read_uvarint(input)? as u8;
            Ok(())
        }
        ValueMut::U16(x) => {
            *x = read_uvarint(input)? as u16;
            Ok(())
        }
        ValueMut::U32(x) => {
            *x = read_uvarint(input)? as u32;
            Ok(())
        }
        ValueMut::U64(x) => {
            *x = read_uvarint(input)?;
            Ok(())
        }
        _ => Err(Error::UnsupportedKind(target.shape().type_identifier)),
    }
}

macro_rules! fast_fixed_decode {
    ($any:ident, $input:ident; $($t:ty => |$r:ident| $read:expr),+ $(,)?) => {
        $(
            if let Some(x) = $any.downcast_mut::<$t>() {
                let $r = &mut *$input;
                *x = $read?;
                return Ok(true);
            }
            if let Some(v) = $any.downcast_mut::<Vec<$t>>() {
                decode_fixed_vec(v, $input, |$r| $read)?;
                return Ok(true);
            }
        )+
    };
}

/// Direct dispatch for built-in primitives and primitive sequences.
fn fast_decode(any: &mut dyn Any, input: &mut Reader<'_>, endian: Endian) -> Result<bool, Error> {
    if let Some(x) = any.downcast_mut::<u8>() {
        *x = input.u8()?;
        return Ok(true);
    }
    if let Some(x) = any.downcast_mut::<i8>() {
        *x = input.u8()? as i8;
        return Ok(true);
    }
    if let Some(b) = any.downcast_mut::<bool>() {
        *b = input.u8()? != 0;
        return Ok(true);
    }
    if let Some(x) = any.downcast_mut::<f32>() {
        *x = f32::from_bits(endian.u32(input)?);
        return Ok(true);
    }
    if let Some(x) = any.downcast_mut::<f64>() {
        *x = f64::from_bits(endian.u64(input)?);
        return Ok(true);
    }
    if let Some(x) = any.downcast_mut::<usize>() {
        *x = read_uvarint(input)? as usize;
        return Ok(true);
    }
    if let Some(x) = any.downcast_mut::<isize>() {
        *x = read_varint(input)? as isize;
        return Ok(true);
    }
    if let Some(s) = any.downcast_mut::<String>() {
        let len = read_uvarint(input)? as usize;
        let bytes = input.take(len)?;
        match core::str::from_utf8(bytes) {
            Ok(text) => {
                s.clear();
                s.push_str(text);
                return Ok(true);
            }
            Err(_) => return Err(Error::InvalidUtf8),
        }
    }
    if let Some(v) = any.downcast_mut::<Vec<u8>>() {
        let len = read_uvarint(input)? as usize;
        let bytes = input.take(len)?;
        v.clear();
        v.extend_from_slice(bytes);
        return Ok(true);
    }
    if let Some(v) = any.downcast_mut::<Vec<bool>>() {
        let len = read_uvarint(input)? as usize;
        let bytes = input.take(bits::packed_len(len))?;
        v.clear();
        v.reserve(len.min(8 * bytes.len()));
        for index in 0..len {
            v.push(bits::get_bit(bytes, index));
        }
        return Ok(true);
    }
    fast_fixed_decode!(any, input;
        u16 => |r| endian.u16(r),
        u32 => |r| endian.u32(r),
        u64 => |r| endian.u64(r),
        i16 => |r| endian.u16(r).map(|x| x as i16),
        i32 => |r| endian.u32(r).map(|x| x as i32),
        i64 => |r| endian.u64(r).map(|x| x as i64),
    );
    Ok(false)
}

fn decode_fixed_vec<T>(
    v: &mut Vec<T>,
    input: &mut Reader<'_>,
    mut read: impl FnMut(&mut Reader<'_>) -> Result<T, Error>,
) -> Result<(), Error> {
    let len = read_uvarint(input)? as usize;
    v.clear();
    v.reserve(len.min(input.remaining().len()));
    for _ in 0..len {
        v.push(read(input)?);
    }
    Ok(())
}

/// Consumes one structurally-laid-out value of `shape` without storing it.
pub(crate) fn skip_node(
    shape: &'static Shape,
    input: &mut Reader<'_>,
    cx: &Context<'_>,
) -> Result<(), Error> {
    match shape.kind {
        Kind::Bool | Kind::I8 | Kind::U8 => input.take(1).map(|_| ()),
        Kind::I16 | Kind::U16 => input.take(2).map(|_| ()),
        Kind::I32 | Kind::U32 | Kind::F32 => input.take(4).map(|_| ()),
        Kind::I64 | Kind::U64 | Kind::F64 | Kind::Complex64 => input.take(8).map(|_| ()),
        Kind::Complex128 => input.take(16).map(|_| ()),
        Kind::Int | Kind::Uint => read_uvarint(input).map(|_| ()),
        Kind::Str => {
            let len = read_uvarint(input)? as usize;
            input.take(len).map(|_| ())
        }
        Kind::Seq(_) | Kind::Array(..) => {
            let elem = seq_elem(shape)?;
            let len = read_uvarint(input)? as usize;
            skip_elems(elem, len, input, cx)
        }
        Kind::Map(key, value) => {
            let count = read_uvarint(input)? as usize;
            for _ in 0..count {
                skip_node(key, input, cx)?;
                skip_node(value, input, cx)?;
            }
            Ok(())
        }
        Kind::Struct(fields) => {
            let info = cx.registry.struct_info(shape);
            for (index, field) in fields.iter().enumerate() {
                if field.ignore {
                    continue;
                }
                let Some(field_shape) = field.shape else {
                    continue;
                };
                let cached = info.map(|info| &info.fields[index]);
                if cached.is_some_and(|cached| cached.packed) && field_shape.kind.is_fixed_int() {
                    // Signed and unsigned varints share the same framing.
                    read_uvarint(input)?;
                    continue;
                }
                if let Kind::Array(n, elem) = field_shape.kind {
                    if matches!(elem.kind, Kind::Bool) {
                        input.take(bits::packed_len(n))?;
                        continue;
                    }
                }
                skip_node(field_shape, input, cx)?;
            }
            Ok(())
        }
        Kind::Ptr(_) => {
            let target = ptr_target(shape)?;
            if input.u8()? != 0 {
                skip_node(target, input, cx)?;
            }
            Ok(())
        }
    }
}

fn skip_elems(
    elem: &'static Shape,
    len: usize,
    input: &mut Reader<'_>,
    cx: &Context<'_>,
) -> Result<(), Error> {
    if matches!(elem.kind, Kind::Bool) {
        input.take(bits::packed_len(len)).map(|_| ())
    } else {
        for _ in 0..len {
            skip_node(elem, input, cx)?;
        }
        Ok(())
    }
}

//! Custom-serializer capability and its traversal-time dispatch state.

use crate::error::Error;
use crate::shape::{SerializerOps, Shape};

/// The size/encode/decode triad a type may supply to bypass the structural
/// walk.
///
/// `size_in_bytes` and `encode_to` take value receivers; `decode_from` takes
/// a mutable receiver because decoding must mutate the target. The wire
/// contract is the implementor's: whatever `encode_to` writes, `decode_from`
/// must consume.
pub trait Serializer {
    /// Exact byte length `encode_to` will produce for `self`.
    fn size_in_bytes(&self) -> usize;
    /// Writes `self` to the output region.
    fn encode_to(&self, out: &mut crate::cursor::Cursor<'_>) -> Result<(), Error>;
    /// Reconstructs `self` from the input region.
    fn decode_from(&mut self, input: &mut crate::cursor::Reader<'_>) -> Result<(), Error>;
}

/// Builds a complete [`SerializerOps`] table for a type implementing
/// [`Serializer`].
///
/// Usable in const position, which is where shapes live:
///
/// ```ignore
/// serializer: Some(&const { wirebin::serializer_ops!(MyType) }),
/// ```
#[macro_export]
macro_rules! serializer_ops {
    ($t:ty) => {
        $crate::SerializerOps {
            size_in_bytes: ::core::option::Option::Some(|value: &dyn ::core::any::Any| {
                <$t as $crate::Serializer>::size_in_bytes(value.downcast_ref::<$t>().unwrap())
            }),
            encode_to: ::core::option::Option::Some(
                |value: &dyn ::core::any::Any, out: &mut $crate::Cursor<'_>| {
                    <$t as $crate::Serializer>::encode_to(value.downcast_ref::<$t>().unwrap(), out)
                },
            ),
            decode_from: ::core::option::Option::Some(
                |value: &mut dyn ::core::any::Any, input: &mut $crate::Reader<'_>| {
                    <$t as $crate::Serializer>::decode_from(
                        value.downcast_mut::<$t>().unwrap(),
                        input,
                    )
                },
            ),
        }
    };
}

/// Validates a capability table at registration time.
pub(crate) fn validate_ops(type_name: &'static str, ops: &SerializerOps) -> Result<(), Error> {
    match (&ops.size_in_bytes, &ops.encode_to, &ops.decode_from) {
        (Some(_), Some(_), Some(_)) => Ok(()),
        // Encode side intact but nothing that can mutate a decode target.
        (Some(_), Some(_), None) => Err(Error::DecodeMustMutate(type_name)),
        _ => Err(Error::IncompleteSerializer(type_name)),
    }
}

/// Per-node dispatch state for custom-serializer delegation.
///
/// Propagated down the recursion so that each node pays at most one
/// capability lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SerializerCheck {
    /// Custom serializers disabled for this call.
    Off,
    /// Consult the capability table at this node.
    Lookup,
    /// Known not to be a serializer.
    Miss,
    /// Known to be a serializer at exactly this node.
    Hit,
}

impl SerializerCheck {
    /// Entry state for a whole encode/decode call.
    pub(crate) fn top(enabled: bool) -> Self {
        if enabled {
            SerializerCheck::Lookup
        } else {
            SerializerCheck::Off
        }
    }

    /// State for a child node whose shape is statically known.
    pub(crate) fn child(self, child_shape: &'static Shape) -> Self {
        match self {
            SerializerCheck::Off => SerializerCheck::Off,
            _ if child_shape.has_full_serializer() => SerializerCheck::Hit,
            _ => SerializerCheck::Miss,
        }
    }

    /// State for a struct field with a cached capability flag.
    pub(crate) fn field(self, is_serializer: bool) -> Self {
        match self {
            SerializerCheck::Off => SerializerCheck::Off,
            _ if is_serializer => SerializerCheck::Hit,
            _ => SerializerCheck::Miss,
        }
    }

    /// Whether this node should delegate to the capability table.
    pub(crate) fn delegates(self, shape: &'static Shape) -> bool {
        match self {
            SerializerCheck::Hit => true,
            SerializerCheck::Lookup => shape.has_full_serializer(),
            SerializerCheck::Off | SerializerCheck::Miss => false,
        }
    }
}

//! Error types shared by encoding, decoding, and registration.

use core::fmt;

/// Errors produced by encoding, decoding, and type registration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The caller-provided output buffer cannot hold the encoded payload.
    NotEnoughSpace,
    /// The traversal reached a type outside the supported kind set
    /// (for example a doubly-nested pointer).
    UnsupportedKind(&'static str),
    /// A varint continuation chain did not terminate within 10 bytes.
    MalformedVarint,
    /// A type advertises custom serialization but provides only part of the
    /// size/encode/decode triad.
    IncompleteSerializer(&'static str),
    /// A type advertises custom serialization without a mutating decode
    /// operation.
    DecodeMustMutate(&'static str),
    /// The type was already registered and strict registration was requested.
    DuplicateRegistration(&'static str),
    /// Only structs and custom serializers can be registered at top level.
    ExpectedStructOrSerializer(&'static str),
    /// The input ended in the middle of a value.
    ShortRead,
    /// A decoded string payload was not valid UTF-8.
    InvalidUtf8,
    /// A fixed-length array's wire count disagrees with its static length.
    LengthMismatch {
        /// Static length of the decode target.
        expected: usize,
        /// Element count found on the wire.
        found: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotEnoughSpace => write!(f, "output buffer too small for encoded data"),
            Error::UnsupportedKind(ty) => write!(f, "unsupported kind: {ty}"),
            Error::MalformedVarint => write!(f, "varint longer than 10 bytes"),
            Error::IncompleteSerializer(ty) => {
                write!(f, "{ty} provides only part of the serializer triad")
            }
            Error::DecodeMustMutate(ty) => {
                write!(f, "{ty} has no mutating decode operation")
            }
            Error::DuplicateRegistration(ty) => write!(f, "{ty} is already registered"),
            Error::ExpectedStructOrSerializer(ty) => {
                write!(f, "{ty} is neither a struct nor a custom serializer")
            }
            Error::ShortRead => write!(f, "input exhausted in the middle of a value"),
            Error::InvalidUtf8 => write!(f, "string payload is not valid UTF-8"),
            Error::LengthMismatch { expected, found } => {
                write!(f, "array length mismatch: expected {expected}, found {found}")
            }
        }
    }
}

impl std::error::Error for Error {}

//! Error types for the codec.
//!
//! Both implementations raise these exact types. Two implementations fed the
//! same malformed input must agree on [`DecodeError::kind`], even where their
//! messages differ; the differential tests compare kinds, not text.

use std::fmt;

use bytes::Bytes;

use crate::types::Value;

/// Errors that can occur while encoding a value.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// A string, binary, array, or map is longer than the widest tag family
    /// can declare.
    #[error("{kind} length {len} exceeds the maximum encodable length {max}")]
    LengthOverflow {
        kind: &'static str,
        len: usize,
        max: u64,
    },

    /// Container nesting exceeds the configured depth limit.
    #[error("value nesting exceeds the depth limit of {max}")]
    DepthLimit { max: usize },
}

/// Errors that can occur while decoding a buffer.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The buffer ended before a complete value was decoded.
    #[error("unpack failed: incomplete input")]
    Incomplete,

    /// Bytes remained after the first complete value. Carries the value
    /// decoded so far and the unconsumed remainder.
    #[error("{} trailing bytes after the first complete value", .trailing.len())]
    ExtraData { value: Box<Value>, trailing: Bytes },

    /// A declared length exceeds a configured maximum.
    #[error("declared {limit} length {declared} exceeds the configured maximum {max}")]
    SizeLimit {
        limit: Limit,
        declared: u64,
        max: u64,
    },

    /// Container nesting exceeds the configured depth limit.
    #[error("value nesting exceeds the depth limit of {max}")]
    DepthLimit { max: usize },

    /// The reserved marker `0xC1` was encountered.
    #[error("reserved marker 0x{0:02X}")]
    ReservedMarker(u8),

    /// An extension-family marker was encountered; extension types are not
    /// supported.
    #[error("unsupported extension marker 0x{0:02X}")]
    UnsupportedExt(u8),

    /// A str-family payload was not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8(#[source] std::str::Utf8Error),

    /// A map key of a disallowed kind was decoded in strict map key mode.
    #[error("map key of kind {0} is not allowed in strict map key mode")]
    StrictMapKey(&'static str),
}

/// The coarse error families used for cross-implementation comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    Incomplete,
    ExtraData,
    SizeLimit,
    Format,
}

impl DecodeError {
    /// Maps this error to its family.
    ///
    /// Depth-limit failures classify as `SizeLimit`: they are configured
    /// resource bounds, not wire-format violations.
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            Self::Incomplete => DecodeErrorKind::Incomplete,
            Self::ExtraData { .. } => DecodeErrorKind::ExtraData,
            Self::SizeLimit { .. } | Self::DepthLimit { .. } => DecodeErrorKind::SizeLimit,
            Self::ReservedMarker(_)
            | Self::UnsupportedExt(_)
            | Self::InvalidUtf8(_)
            | Self::StrictMapKey(_) => DecodeErrorKind::Format,
        }
    }
}

/// Which configured limit a [`DecodeError::SizeLimit`] tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Limit {
    Str,
    Bin,
    Array,
    Map,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Str => "str",
            Self::Bin => "bin",
            Self::Array => "array",
            Self::Map => "map",
        };
        write!(f, "{name}")
    }
}

//! twinpack — a MessagePack codec with two independent implementations.
//!
//! The crate carries the same codec twice: a performance-oriented
//! implementation and a plain reference implementation. Both encode the
//! canonical smallest-family byte sequence for any [`Value`] and both
//! classify malformed input into the same error families, so either can
//! stand in for the other and the pair can be differentially tested.
//!
//! # Architecture
//!
//! - **`marker`** — The shared rule table: MessagePack marker constants
//! - **`types`** — The closed [`Value`]/[`Int`] value model
//! - **`fast`** — Iterative implementation over `bytes` buffers
//! - **`fallback`** — Recursive reference implementation
//! - **`options`** — Construction-time configuration for both
//! - **`error`** — Encode/decode error taxonomy
//!
//! The implementations never call each other; their agreement is enforced by
//! the differential test suite, not by runtime coupling.
//!
//! # Usage
//!
//! ```
//! use twinpack::{pack, unpack, Value};
//!
//! let buf = pack(&Value::from(127i64)).unwrap();
//! assert_eq!(&buf[..], [0x7F]);
//!
//! let value = unpack(&buf).unwrap();
//! assert_eq!(value, Value::from(127i64));
//! ```

pub mod error;
pub mod fallback;
pub mod fast;
pub mod marker;
pub mod options;
pub mod types;

pub use error::{DecodeError, DecodeErrorKind, EncodeError, Limit};
pub use options::{PackOptions, UnpackOptions};
pub use types::{Int, Value};

use bytes::Bytes;

/// Encodes one value with default options, using the fast implementation.
pub fn pack(value: &Value) -> Result<Bytes, EncodeError> {
    fast::Packer::new().pack(value)
}

/// Decodes one complete value with default options, using the fast
/// implementation.
pub fn unpack(buf: &[u8]) -> Result<Value, DecodeError> {
    fast::Unpacker::new().unpack(buf)
}

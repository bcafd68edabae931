//! Reference implementation of the codec.
//!
//! Plain recursive descent over slices and `Vec<u8>`, kept deliberately
//! simple. Its output is byte-identical to the `fast` implementation and its
//! failures carry the same error kinds; the differential tests hold the two
//! to that contract.

pub mod decode;
pub mod encode;

pub use decode::Unpacker;
pub use encode::Packer;

//! Performance-oriented implementation of the codec.
//!
//! Works on `bytes` buffers and replaces recursion with explicit work-stacks,
//! so adversarial nesting depth can never grow the call stack. Output bytes
//! and error kinds match the `fallback` implementation exactly.

pub mod decode;
pub mod encode;

pub use decode::Unpacker;
pub use encode::Packer;

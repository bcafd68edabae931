//! MessagePack marker byte constants.
//!
//! This table is the shared contract between the `fast` and `fallback`
//! implementations: both dispatch on exactly these bytes and nothing else.
//! Multi-byte lengths and integer payloads are big-endian throughout.

// Nil
pub const NIL: u8 = 0xC0;

// 0xC1 is reserved by the format and never emitted.
pub const RESERVED: u8 = 0xC1;

// Boolean
pub const FALSE: u8 = 0xC2;
pub const TRUE: u8 = 0xC3;

// Binary (length-prefixed raw bytes)
pub const BIN_8: u8 = 0xC4;
pub const BIN_16: u8 = 0xC5;
pub const BIN_32: u8 = 0xC6;

// Extension families. Recognized so the dispatch table is total, but
// extension payloads are out of scope and decode to a format error.
pub const EXT_8: u8 = 0xC7;
pub const EXT_16: u8 = 0xC8;
pub const EXT_32: u8 = 0xC9;
pub const FIXEXT_1: u8 = 0xD4;
pub const FIXEXT_2: u8 = 0xD5;
pub const FIXEXT_4: u8 = 0xD6;
pub const FIXEXT_8: u8 = 0xD7;
pub const FIXEXT_16: u8 = 0xD8;

// Float (IEEE 754, big-endian payload)
pub const FLOAT_32: u8 = 0xCA;
pub const FLOAT_64: u8 = 0xCB;

// Unsigned integer (beyond positive fixint range)
pub const UINT_8: u8 = 0xCC;
pub const UINT_16: u8 = 0xCD;
pub const UINT_32: u8 = 0xCE;
pub const UINT_64: u8 = 0xCF;

// Signed integer (beyond negative fixint range)
pub const INT_8: u8 = 0xD0;
pub const INT_16: u8 = 0xD1;
pub const INT_32: u8 = 0xD2;
pub const INT_64: u8 = 0xD3;

// String
// FIXSTR: 0xA0..=0xBF (high 3 bits 101, low 5 bits = byte length 0..31)
pub const STR_8: u8 = 0xD9;
pub const STR_16: u8 = 0xDA;
pub const STR_32: u8 = 0xDB;

// Array
// FIXARRAY: 0x90..=0x9F (high nibble 0x9, low = element count 0..15)
pub const ARRAY_16: u8 = 0xDC;
pub const ARRAY_32: u8 = 0xDD;

// Map
// FIXMAP: 0x80..=0x8F (high nibble 0x8, low = pair count 0..15)
pub const MAP_16: u8 = 0xDE;
pub const MAP_32: u8 = 0xDF;

// Fixint ranges, embedded in the marker byte itself.
// POS_FIXINT: 0x00..=0x7F (0..=127)
// NEG_FIXINT: 0xE0..=0xFF (-32..=-1)
pub const NEG_FIXINT_MIN: i64 = -32;

// Fix-family bases and masks.
pub const FIXMAP: u8 = 0x80;
pub const FIXARRAY: u8 = 0x90;
pub const FIXSTR: u8 = 0xA0;
pub const FIXMAP_MASK: u8 = 0xF0;
pub const FIXARRAY_MASK: u8 = 0xF0;
pub const FIXSTR_MASK: u8 = 0xE0;

// Inclusive upper bounds for the fix families.
pub const FIXSTR_MAX_LEN: usize = 31;
pub const FIXARRAY_MAX_LEN: usize = 15;
pub const FIXMAP_MAX_LEN: usize = 15;

/// Widest length a single tag family can declare (str32/bin32/array32/map32).
pub const MAX_WIRE_LEN: u64 = u32::MAX as u64;

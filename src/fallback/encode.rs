//! Reference encoding: `Value` → bytes, by recursive descent.

use bytes::Bytes;

use crate::error::EncodeError;
use crate::marker::{self, MAX_WIRE_LEN};
use crate::options::PackOptions;
use crate::types::{Int, IntView, Value};

/// The reference Packer.
///
/// Stateless across calls; a `Packer` may be reused freely.
#[derive(Debug, Clone, Default)]
pub struct Packer {
    opts: PackOptions,
}

impl Packer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(opts: PackOptions) -> Self {
        Self { opts }
    }

    /// Encodes one value into its canonical byte sequence.
    pub fn pack(&self, value: &Value) -> Result<Bytes, EncodeError> {
        let mut out = Vec::new();
        encode_value(&mut out, value, 0, self.opts.max_depth)?;
        Ok(Bytes::from(out))
    }
}

fn encode_value(
    out: &mut Vec<u8>,
    value: &Value,
    depth: usize,
    max_depth: usize,
) -> Result<(), EncodeError> {
    match value {
        Value::Nil => out.push(marker::NIL),
        Value::Bool(b) => out.push(if *b { marker::TRUE } else { marker::FALSE }),
        Value::Int(i) => encode_int(out, *i),
        Value::Float(f) => {
            out.push(marker::FLOAT_64);
            out.extend_from_slice(&f.to_be_bytes());
        }
        Value::Str(s) => encode_str(out, s)?,
        Value::Bin(b) => encode_bin(out, b)?,
        Value::Array(items) => {
            if depth >= max_depth {
                return Err(EncodeError::DepthLimit { max: max_depth });
            }
            encode_array_header(out, items.len())?;
            for item in items {
                encode_value(out, item, depth + 1, max_depth)?;
            }
        }
        Value::Map(pairs) => {
            if depth >= max_depth {
                return Err(EncodeError::DepthLimit { max: max_depth });
            }
            encode_map_header(out, pairs.len())?;
            for (key, val) in pairs {
                encode_value(out, key, depth + 1, max_depth)?;
                encode_value(out, val, depth + 1, max_depth)?;
            }
        }
    }
    Ok(())
}

/// Encodes an integer using the smallest tag family that fits. Non-negative
/// values use the unsigned families, negatives the signed ones.
fn encode_int(out: &mut Vec<u8>, i: Int) {
    match i.view() {
        IntView::Signed(n) if n >= 0 => {
            let u = n as u64;
            if u <= 0x7F {
                out.push(u as u8);
            } else if u <= 0xFF {
                out.push(marker::UINT_8);
                out.push(u as u8);
            } else if u <= 0xFFFF {
                out.push(marker::UINT_16);
                out.extend_from_slice(&(u as u16).to_be_bytes());
            } else if u <= 0xFFFF_FFFF {
                out.push(marker::UINT_32);
                out.extend_from_slice(&(u as u32).to_be_bytes());
            } else {
                out.push(marker::UINT_64);
                out.extend_from_slice(&u.to_be_bytes());
            }
        }
        IntView::Signed(n) => {
            if n >= marker::NEG_FIXINT_MIN {
                out.push(n as i8 as u8);
            } else if n >= i64::from(i8::MIN) {
                out.push(marker::INT_8);
                out.push(n as i8 as u8);
            } else if n >= i64::from(i16::MIN) {
                out.push(marker::INT_16);
                out.extend_from_slice(&(n as i16).to_be_bytes());
            } else if n >= i64::from(i32::MIN) {
                out.push(marker::INT_32);
                out.extend_from_slice(&(n as i32).to_be_bytes());
            } else {
                out.push(marker::INT_64);
                out.extend_from_slice(&n.to_be_bytes());
            }
        }
        // Normalization guarantees this arm is only values above i64::MAX.
        IntView::Unsigned(u) => {
            out.push(marker::UINT_64);
            out.extend_from_slice(&u.to_be_bytes());
        }
    }
}

/// Encodes a string header and payload (length in bytes, not chars).
fn encode_str(out: &mut Vec<u8>, s: &str) -> Result<(), EncodeError> {
    let len = s.len();
    if len as u64 > MAX_WIRE_LEN {
        return Err(EncodeError::LengthOverflow {
            kind: "str",
            len,
            max: MAX_WIRE_LEN,
        });
    }
    if len <= marker::FIXSTR_MAX_LEN {
        out.push(marker::FIXSTR | len as u8);
    } else if len <= 0xFF {
        out.push(marker::STR_8);
        out.push(len as u8);
    } else if len <= 0xFFFF {
        out.push(marker::STR_16);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(marker::STR_32);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

fn encode_bin(out: &mut Vec<u8>, b: &[u8]) -> Result<(), EncodeError> {
    let len = b.len();
    if len as u64 > MAX_WIRE_LEN {
        return Err(EncodeError::LengthOverflow {
            kind: "bin",
            len,
            max: MAX_WIRE_LEN,
        });
    }
    if len <= 0xFF {
        out.push(marker::BIN_8);
        out.push(len as u8);
    } else if len <= 0xFFFF {
        out.push(marker::BIN_16);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(marker::BIN_32);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
    out.extend_from_slice(b);
    Ok(())
}

fn encode_array_header(out: &mut Vec<u8>, len: usize) -> Result<(), EncodeError> {
    if len as u64 > MAX_WIRE_LEN {
        return Err(EncodeError::LengthOverflow {
            kind: "array",
            len,
            max: MAX_WIRE_LEN,
        });
    }
    if len <= marker::FIXARRAY_MAX_LEN {
        out.push(marker::FIXARRAY | len as u8);
    } else if len <= 0xFFFF {
        out.push(marker::ARRAY_16);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(marker::ARRAY_32);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
    Ok(())
}

fn encode_map_header(out: &mut Vec<u8>, len: usize) -> Result<(), EncodeError> {
    if len as u64 > MAX_WIRE_LEN {
        return Err(EncodeError::LengthOverflow {
            kind: "map",
            len,
            max: MAX_WIRE_LEN,
        });
    }
    if len <= marker::FIXMAP_MAX_LEN {
        out.push(marker::FIXMAP | len as u8);
    } else if len <= 0xFFFF {
        out.push(marker::MAP_16);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(marker::MAP_32);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(value: &Value) -> Vec<u8> {
        Packer::new().pack(value).expect("pack failed").to_vec()
    }

    #[test]
    fn scalar_markers() {
        assert_eq!(pack(&Value::Nil), [0xC0]);
        assert_eq!(pack(&Value::Bool(false)), [0xC2]);
        assert_eq!(pack(&Value::Bool(true)), [0xC3]);
    }

    #[test]
    fn smallest_int_family() {
        assert_eq!(pack(&Value::from(0i64)), [0x00]);
        assert_eq!(pack(&Value::from(127i64)), [0x7F]);
        assert_eq!(pack(&Value::from(128i64)), [0xCC, 0x80]);
        assert_eq!(pack(&Value::from(255i64)), [0xCC, 0xFF]);
        assert_eq!(pack(&Value::from(256i64)), [0xCD, 0x01, 0x00]);
        assert_eq!(pack(&Value::from(65536i64)), [0xCE, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(
            pack(&Value::from(u64::MAX)),
            [0xCF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn negative_int_families() {
        assert_eq!(pack(&Value::from(-1i64)), [0xFF]);
        assert_eq!(pack(&Value::from(-32i64)), [0xE0]);
        assert_eq!(pack(&Value::from(-33i64)), [0xD0, 0xDF]);
        assert_eq!(pack(&Value::from(-128i64)), [0xD0, 0x80]);
        assert_eq!(pack(&Value::from(-129i64)), [0xD1, 0xFF, 0x7F]);
        assert_eq!(
            pack(&Value::from(i64::MIN)),
            [0xD3, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn float_is_always_double() {
        let buf = pack(&Value::Float(1.5));
        assert_eq!(buf[0], marker::FLOAT_64);
        assert_eq!(&buf[1..], 1.5f64.to_be_bytes());
    }

    #[test]
    fn nan_payload_bits_survive_encoding() {
        let bits = 0x7FF8_0000_DEAD_BEEFu64;
        let buf = pack(&Value::Float(f64::from_bits(bits)));
        assert_eq!(&buf[1..], bits.to_be_bytes());
    }

    #[test]
    fn str_families() {
        assert_eq!(pack(&Value::from("")), [0xA0]);
        assert_eq!(pack(&Value::from("a")), [0xA1, b'a']);
        let s31 = "a".repeat(31);
        assert_eq!(pack(&Value::from(s31.as_str()))[0], 0xBF);
        let s32 = "a".repeat(32);
        let buf = pack(&Value::from(s32.as_str()));
        assert_eq!(&buf[..2], [marker::STR_8, 32]);
        let s256 = "a".repeat(256);
        let buf = pack(&Value::from(s256.as_str()));
        assert_eq!(&buf[..3], [marker::STR_16, 0x01, 0x00]);
    }

    #[test]
    fn bin_has_no_fix_family() {
        assert_eq!(pack(&Value::Bin(vec![])), [marker::BIN_8, 0x00]);
        assert_eq!(
            pack(&Value::Bin(vec![0xDE, 0xAD])),
            [marker::BIN_8, 0x02, 0xDE, 0xAD]
        );
    }

    #[test]
    fn container_headers() {
        assert_eq!(pack(&Value::Array(vec![])), [0x90]);
        assert_eq!(pack(&Value::Map(vec![])), [0x80]);

        let arr16 = Value::Array(vec![Value::Nil; 16]);
        let buf = pack(&arr16);
        assert_eq!(&buf[..3], [marker::ARRAY_16, 0x00, 0x10]);

        let map16 = Value::Map(vec![(Value::Nil, Value::Nil); 16]);
        let buf = pack(&map16);
        assert_eq!(&buf[..3], [marker::MAP_16, 0x00, 0x10]);
    }

    #[test]
    fn map_pairs_keep_insertion_order() {
        let v = Value::Map(vec![
            (Value::from("b"), Value::from(2i64)),
            (Value::from("a"), Value::from(1i64)),
        ]);
        assert_eq!(pack(&v), [0x82, 0xA1, b'b', 0x02, 0xA1, b'a', 0x01]);
    }

    #[test]
    fn depth_limit_applies_to_packing() {
        let mut v = Value::Array(vec![]);
        for _ in 0..4 {
            v = Value::Array(vec![v]);
        }
        // 5 nested arrays, limit 4.
        let packer = Packer::with_options(PackOptions::default().max_depth(4));
        assert!(matches!(
            packer.pack(&v),
            Err(EncodeError::DepthLimit { max: 4 })
        ));
        let packer = Packer::with_options(PackOptions::default().max_depth(5));
        assert!(packer.pack(&v).is_ok());
    }
}

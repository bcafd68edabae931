//! Reference decoding: bytes → `Value`, by recursive descent.

use bytes::Bytes;

use crate::error::{DecodeError, Limit};
use crate::marker;
use crate::options::UnpackOptions;
use crate::types::{Int, Value};

/// The reference Unpacker.
///
/// Recursive descent with a depth budget; all other bounds come from the
/// configured [`UnpackOptions`]. No per-call state survives between calls.
#[derive(Debug, Clone, Default)]
pub struct Unpacker {
    opts: UnpackOptions,
}

impl Unpacker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(opts: UnpackOptions) -> Self {
        Self { opts }
    }

    /// Decodes one complete value from the buffer.
    pub fn unpack(&self, input: &[u8]) -> Result<Value, DecodeError> {
        let mut r = Reader::new(input);
        let value = decode_value(&mut r, &self.opts, 0)?;
        if r.remaining() > 0 && !self.opts.allow_trailing {
            return Err(DecodeError::ExtraData {
                value: Box::new(value),
                trailing: Bytes::copy_from_slice(r.rest()),
            });
        }
        Ok(value)
    }
}

/// A cursor over the input slice. Every read checks the remaining length
/// first, so truncation always surfaces as an incomplete-input error.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::Incomplete);
        }
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn be16(&mut self) -> Result<u16, DecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn be32(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn be64(&mut self) -> Result<u64, DecodeError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }
}

fn decode_value(r: &mut Reader<'_>, opts: &UnpackOptions, depth: usize) -> Result<Value, DecodeError> {
    let m = r.u8()?;
    match m {
        marker::NIL => Ok(Value::Nil),
        marker::RESERVED => Err(DecodeError::ReservedMarker(m)),
        marker::FALSE => Ok(Value::Bool(false)),
        marker::TRUE => Ok(Value::Bool(true)),

        marker::FLOAT_32 => Ok(Value::Float(f64::from(f32::from_bits(r.be32()?)))),
        marker::FLOAT_64 => Ok(Value::Float(f64::from_bits(r.be64()?))),

        marker::UINT_8 => Ok(Value::Int(Int::from_i64(i64::from(r.u8()?)))),
        marker::UINT_16 => Ok(Value::Int(Int::from_i64(i64::from(r.be16()?)))),
        marker::UINT_32 => Ok(Value::Int(Int::from_i64(i64::from(r.be32()?)))),
        marker::UINT_64 => Ok(Value::Int(Int::from_u64(r.be64()?))),

        marker::INT_8 => Ok(Value::Int(Int::from_i64(i64::from(r.u8()? as i8)))),
        marker::INT_16 => Ok(Value::Int(Int::from_i64(i64::from(r.be16()? as i16)))),
        marker::INT_32 => Ok(Value::Int(Int::from_i64(i64::from(r.be32()? as i32)))),
        marker::INT_64 => Ok(Value::Int(Int::from_i64(r.be64()? as i64))),

        marker::BIN_8 => {
            let len = u64::from(r.u8()?);
            decode_bin(r, opts, len)
        }
        marker::BIN_16 => {
            let len = u64::from(r.be16()?);
            decode_bin(r, opts, len)
        }
        marker::BIN_32 => {
            let len = u64::from(r.be32()?);
            decode_bin(r, opts, len)
        }

        marker::STR_8 => {
            let len = u64::from(r.u8()?);
            decode_str(r, opts, len)
        }
        marker::STR_16 => {
            let len = u64::from(r.be16()?);
            decode_str(r, opts, len)
        }
        marker::STR_32 => {
            let len = u64::from(r.be32()?);
            decode_str(r, opts, len)
        }

        marker::ARRAY_16 => {
            let len = u64::from(r.be16()?);
            decode_array(r, opts, depth, len)
        }
        marker::ARRAY_32 => {
            let len = u64::from(r.be32()?);
            decode_array(r, opts, depth, len)
        }

        marker::MAP_16 => {
            let len = u64::from(r.be16()?);
            decode_map(r, opts, depth, len)
        }
        marker::MAP_32 => {
            let len = u64::from(r.be32()?);
            decode_map(r, opts, depth, len)
        }

        marker::EXT_8
        | marker::EXT_16
        | marker::EXT_32
        | marker::FIXEXT_1
        | marker::FIXEXT_2
        | marker::FIXEXT_4
        | marker::FIXEXT_8
        | marker::FIXEXT_16 => Err(DecodeError::UnsupportedExt(m)),

        _ => {
            if m <= 0x7F {
                // Positive fixint.
                Ok(Value::Int(Int::from_i64(i64::from(m))))
            } else if m >= 0xE0 {
                // Negative fixint.
                Ok(Value::Int(Int::from_i64(i64::from(m as i8))))
            } else if m & marker::FIXMAP_MASK == marker::FIXMAP {
                decode_map(r, opts, depth, u64::from(m & 0x0F))
            } else if m & marker::FIXARRAY_MASK == marker::FIXARRAY {
                decode_array(r, opts, depth, u64::from(m & 0x0F))
            } else {
                // Fixstr, 0xA0..=0xBF, the only family left.
                decode_str(r, opts, u64::from(m & 0x1F))
            }
        }
    }
}

fn decode_bin(r: &mut Reader<'_>, opts: &UnpackOptions, len: u64) -> Result<Value, DecodeError> {
    if len > opts.max_bin_len {
        return Err(DecodeError::SizeLimit {
            limit: Limit::Bin,
            declared: len,
            max: opts.max_bin_len,
        });
    }
    Ok(Value::Bin(r.take(len as usize)?.to_vec()))
}

fn decode_str(r: &mut Reader<'_>, opts: &UnpackOptions, len: u64) -> Result<Value, DecodeError> {
    if len > opts.max_str_len {
        return Err(DecodeError::SizeLimit {
            limit: Limit::Str,
            declared: len,
            max: opts.max_str_len,
        });
    }
    let bytes = r.take(len as usize)?;
    let s = std::str::from_utf8(bytes).map_err(DecodeError::InvalidUtf8)?;
    Ok(Value::Str(s.to_owned()))
}

fn decode_array(
    r: &mut Reader<'_>,
    opts: &UnpackOptions,
    depth: usize,
    len: u64,
) -> Result<Value, DecodeError> {
    if len > opts.max_array_len {
        return Err(DecodeError::SizeLimit {
            limit: Limit::Array,
            declared: len,
            max: opts.max_array_len,
        });
    }
    if depth >= opts.max_depth {
        return Err(DecodeError::DepthLimit {
            max: opts.max_depth,
        });
    }
    let len = len as usize;
    // Every element is at least one byte, so the declared count can never
    // justify a larger allocation than the remaining input.
    let mut items = Vec::with_capacity(len.min(r.remaining()));
    for _ in 0..len {
        items.push(decode_value(r, opts, depth + 1)?);
    }
    Ok(Value::Array(items))
}

fn decode_map(
    r: &mut Reader<'_>,
    opts: &UnpackOptions,
    depth: usize,
    len: u64,
) -> Result<Value, DecodeError> {
    if len > opts.max_map_len {
        return Err(DecodeError::SizeLimit {
            limit: Limit::Map,
            declared: len,
            max: opts.max_map_len,
        });
    }
    if depth >= opts.max_depth {
        return Err(DecodeError::DepthLimit {
            max: opts.max_depth,
        });
    }
    let len = len as usize;
    let mut pairs = Vec::with_capacity(len.min(r.remaining() / 2));
    for _ in 0..len {
        let key = decode_value(r, opts, depth + 1)?;
        if opts.strict_map_key && matches!(key, Value::Array(_) | Value::Map(_)) {
            return Err(DecodeError::StrictMapKey(key.kind_name()));
        }
        let value = decode_value(r, opts, depth + 1)?;
        pairs.push((key, value));
    }
    Ok(Value::Map(pairs))
}

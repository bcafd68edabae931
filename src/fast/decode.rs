//! Fast decoding: bytes → `Value`, driven by an explicit frame stack.

use bytes::{Buf, Bytes};

use crate::error::{DecodeError, Limit};
use crate::marker;
use crate::options::UnpackOptions;
use crate::types::{Int, Value};

/// The fast Unpacker.
///
/// Containers are decoded with a heap-allocated frame stack instead of
/// recursion, so declared nesting depth in untrusted input can never touch
/// the call stack. No per-call state survives between calls.
#[derive(Debug, Clone, Default)]
pub struct Unpacker {
    opts: UnpackOptions,
}

/// A partially decoded container awaiting more elements.
enum Frame {
    Array {
        items: Vec<Value>,
        remaining: usize,
    },
    Map {
        pairs: Vec<(Value, Value)>,
        key: Option<Value>,
        remaining: usize,
    },
}

/// The result of reading one marker: a finished scalar, or an opened
/// container with a declared element/pair count.
enum Item {
    Done(Value),
    Array(usize),
    Map(usize),
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
        let mut buf = input;
        let value = self.decode(&mut buf)?;
        if buf.has_remaining() && !self.opts.allow_trailing {
            return Err(DecodeError::ExtraData {
                value: Box::new(value),
                trailing: Bytes::copy_from_slice(buf),
            });
        }
        Ok(value)
    }

    fn decode(&self, buf: &mut &[u8]) -> Result<Value, DecodeError> {
        let opts = &self.opts;
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            let mut completed = match read_item(buf, opts)? {
                Item::Done(v) => v,
                Item::Array(len) => {
                    if stack.len() >= opts.max_depth {
                        return Err(DecodeError::DepthLimit {
                            max: opts.max_depth,
                        });
                    }
                    if len == 0 {
                        Value::Array(Vec::new())
                    } else {
                        // Every element is at least one byte; never allocate
                        // past what the remaining input could hold.
                        let cap = len.min(buf.remaining());
                        stack.push(Frame::Array {
                            items: Vec::with_capacity(cap),
                            remaining: len,
                        });
                        continue;
                    }
                }
                Item::Map(len) => {
                    if stack.len() >= opts.max_depth {
                        return Err(DecodeError::DepthLimit {
                            max: opts.max_depth,
                        });
                    }
                    if len == 0 {
                        Value::Map(Vec::new())
                    } else {
                        let cap = len.min(buf.remaining() / 2);
                        stack.push(Frame::Map {
                            pairs: Vec::with_capacity(cap),
                            key: None,
                            remaining: len,
                        });
                        continue;
                    }
                }
            };

            // Feed the completed value upward, closing every frame it fills.
            loop {
                let frame = match stack.pop() {
                    None => return Ok(completed),
                    Some(f) => f,
                };
                match frame {
                    Frame::Array {
                        mut items,
                        remaining,
                    } => {
                        items.push(completed);
                        if remaining == 1 {
                            completed = Value::Array(items);
                        } else {
                            stack.push(Frame::Array {
                                items,
                                remaining: remaining - 1,
                            });
                            break;
                        }
                    }
                    Frame::Map {
                        mut pairs,
                        key,
                        remaining,
                    } => match key {
                        None => {
                            if opts.strict_map_key
                                && matches!(completed, Value::Array(_) | Value::Map(_))
                            {
                                return Err(DecodeError::StrictMapKey(completed.kind_name()));
                            }
                            stack.push(Frame::Map {
                                pairs,
                                key: Some(completed),
                                remaining,
                            });
                            break;
                        }
                        Some(k) => {
                            pairs.push((k, completed));
                            if remaining == 1 {
                                completed = Value::Map(pairs);
                            } else {
                                stack.push(Frame::Map {
                                    pairs,
                                    key: None,
                                    remaining: remaining - 1,
                                });
                                break;
                            }
                        }
                    },
                }
            }
        }
    }
}

fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), DecodeError> {
    if buf.remaining() < needed {
        Err(DecodeError::Incomplete)
    } else {
        Ok(())
    }
}

fn read_item(buf: &mut &[u8], opts: &UnpackOptions) -> Result<Item, DecodeError> {
    if !buf.has_remaining() {
        return Err(DecodeError::Incomplete);
    }

    let m = buf.get_u8();
    match m {
        marker::NIL => Ok(Item::Done(Value::Nil)),
        marker::FALSE => Ok(Item::Done(Value::Bool(false))),
        marker::TRUE => Ok(Item::Done(Value::Bool(true))),

        marker::RESERVED => {
            tracing::trace!("reserved marker 0xC1 in input");
            Err(DecodeError::ReservedMarker(m))
        }

        marker::FLOAT_32 => {
            ensure_remaining(buf, 4)?;
            Ok(Item::Done(Value::Float(f64::from(buf.get_f32()))))
        }
        marker::FLOAT_64 => {
            ensure_remaining(buf, 8)?;
            Ok(Item::Done(Value::Float(buf.get_f64())))
        }

        marker::UINT_8 => {
            ensure_remaining(buf, 1)?;
            Ok(Item::Done(Value::Int(Int::from_i64(i64::from(
                buf.get_u8(),
            )))))
        }
        marker::UINT_16 => {
            ensure_remaining(buf, 2)?;
            Ok(Item::Done(Value::Int(Int::from_i64(i64::from(
                buf.get_u16(),
            )))))
        }
        marker::UINT_32 => {
            ensure_remaining(buf, 4)?;
            Ok(Item::Done(Value::Int(Int::from_i64(i64::from(
                buf.get_u32(),
            )))))
        }
        marker::UINT_64 => {
            ensure_remaining(buf, 8)?;
            Ok(Item::Done(Value::Int(Int::from_u64(buf.get_u64()))))
        }

        marker::INT_8 => {
            ensure_remaining(buf, 1)?;
            Ok(Item::Done(Value::Int(Int::from_i64(i64::from(
                buf.get_i8(),
            )))))
        }
        marker::INT_16 => {
            ensure_remaining(buf, 2)?;
            Ok(Item::Done(Value::Int(Int::from_i64(i64::from(
                buf.get_i16(),
            )))))
        }
        marker::INT_32 => {
            ensure_remaining(buf, 4)?;
            Ok(Item::Done(Value::Int(Int::from_i64(i64::from(
                buf.get_i32(),
            )))))
        }
        marker::INT_64 => {
            ensure_remaining(buf, 8)?;
            Ok(Item::Done(Value::Int(Int::from_i64(buf.get_i64()))))
        }

        marker::BIN_8 => {
            ensure_remaining(buf, 1)?;
            let len = u64::from(buf.get_u8());
            read_bin(buf, opts, len)
        }
        marker::BIN_16 => {
            ensure_remaining(buf, 2)?;
            let len = u64::from(buf.get_u16());
            read_bin(buf, opts, len)
        }
        marker::BIN_32 => {
            ensure_remaining(buf, 4)?;
            let len = u64::from(buf.get_u32());
            read_bin(buf, opts, len)
        }

        marker::STR_8 => {
            ensure_remaining(buf, 1)?;
            let len = u64::from(buf.get_u8());
            read_str(buf, opts, len)
        }
        marker::STR_16 => {
            ensure_remaining(buf, 2)?;
            let len = u64::from(buf.get_u16());
            read_str(buf, opts, len)
        }
        marker::STR_32 => {
            ensure_remaining(buf, 4)?;
            let len = u64::from(buf.get_u32());
            read_str(buf, opts, len)
        }

        marker::ARRAY_16 => {
            ensure_remaining(buf, 2)?;
            let len = u64::from(buf.get_u16());
            open_array(opts, len)
        }
        marker::ARRAY_32 => {
            ensure_remaining(buf, 4)?;
            let len = u64::from(buf.get_u32());
            open_array(opts, len)
        }

        marker::MAP_16 => {
            ensure_remaining(buf, 2)?;
            let len = u64::from(buf.get_u16());
            open_map(opts, len)
        }
        marker::MAP_32 => {
            ensure_remaining(buf, 4)?;
            let len = u64::from(buf.get_u32());
            open_map(opts, len)
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
                Ok(Item::Done(Value::Int(Int::from_i64(i64::from(m)))))
            } else if m >= 0xE0 {
                // Negative fixint.
                Ok(Item::Done(Value::Int(Int::from_i64(i64::from(m as i8)))))
            } else if m & marker::FIXMAP_MASK == marker::FIXMAP {
                open_map(opts, u64::from(m & 0x0F))
            } else if m & marker::FIXARRAY_MASK == marker::FIXARRAY {
                open_array(opts, u64::from(m & 0x0F))
            } else {
                // Fixstr, 0xA0..=0xBF, the only family left.
                read_str(buf, opts, u64::from(m & 0x1F))
            }
        }
    }
}

fn read_bin(buf: &mut &[u8], opts: &UnpackOptions, len: u64) -> Result<Item, DecodeError> {
    if len > opts.max_bin_len {
        tracing::trace!(declared = len, max = opts.max_bin_len, "bin length over limit");
        return Err(DecodeError::SizeLimit {
            limit: Limit::Bin,
            declared: len,
            max: opts.max_bin_len,
        });
    }
    let len = len as usize;
    ensure_remaining(buf, len)?;
    let mut data = vec![0u8; len];
    buf.copy_to_slice(&mut data);
    Ok(Item::Done(Value::Bin(data)))
}

fn read_str(buf: &mut &[u8], opts: &UnpackOptions, len: u64) -> Result<Item, DecodeError> {
    if len > opts.max_str_len {
        tracing::trace!(declared = len, max = opts.max_str_len, "str length over limit");
        return Err(DecodeError::SizeLimit {
            limit: Limit::Str,
            declared: len,
            max: opts.max_str_len,
        });
    }
    let len = len as usize;
    ensure_remaining(buf, len)?;
    let mut data = vec![0u8; len];
    buf.copy_to_slice(&mut data);
    let s = String::from_utf8(data).map_err(|e| DecodeError::InvalidUtf8(e.utf8_error()))?;
    Ok(Item::Done(Value::Str(s)))
}

fn open_array(opts: &UnpackOptions, len: u64) -> Result<Item, DecodeError> {
    if len > opts.max_array_len {
        tracing::trace!(declared = len, max = opts.max_array_len, "array length over limit");
        return Err(DecodeError::SizeLimit {
            limit: Limit::Array,
            declared: len,
            max: opts.max_array_len,
        });
    }
    Ok(Item::Array(len as usize))
}

fn open_map(opts: &UnpackOptions, len: u64) -> Result<Item, DecodeError> {
    if len > opts.max_map_len {
        tracing::trace!(declared = len, max = opts.max_map_len, "map length over limit");
        return Err(DecodeError::SizeLimit {
            limit: Limit::Map,
            declared: len,
            max: opts.max_map_len,
        });
    }
    Ok(Item::Map(len as usize))
}

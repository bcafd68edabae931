//! Fast encoding: `Value` → bytes, driven by an explicit work-stack.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::EncodeError;
use crate::marker::{self, MAX_WIRE_LEN};
use crate::options::PackOptions;
use crate::types::{Int, IntView, Value};

/// The fast Packer.
///
/// Stateless across calls; a `Packer` may be reused freely.
#[derive(Debug, Clone, Default)]
pub struct Packer {
    opts: PackOptions,
}

/// One unit of pending work. `Leave` marks the end of a container's children
/// and unwinds the depth counter.
enum Task<'a> {
    Value(&'a Value),
    Leave,
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
        let mut buf = BytesMut::new();
        let max_depth = self.opts.max_depth;
        let mut depth = 0usize;
        let mut tasks = vec![Task::Value(value)];

        while let Some(task) = tasks.pop() {
            let value = match task {
                Task::Leave => {
                    depth -= 1;
                    continue;
                }
                Task::Value(v) => v,
            };
            match value {
                Value::Nil => buf.put_u8(marker::NIL),
                Value::Bool(b) => buf.put_u8(if *b { marker::TRUE } else { marker::FALSE }),
                Value::Int(i) => write_int(&mut buf, *i),
                Value::Float(f) => {
                    buf.put_u8(marker::FLOAT_64);
                    buf.put_f64(*f);
                }
                Value::Str(s) => write_str(&mut buf, s)?,
                Value::Bin(b) => write_bin(&mut buf, b)?,
                Value::Array(items) => {
                    if depth >= max_depth {
                        return Err(EncodeError::DepthLimit { max: max_depth });
                    }
                    write_array_header(&mut buf, items.len())?;
                    depth += 1;
                    tasks.push(Task::Leave);
                    for item in items.iter().rev() {
                        tasks.push(Task::Value(item));
                    }
                }
                Value::Map(pairs) => {
                    if depth >= max_depth {
                        return Err(EncodeError::DepthLimit { max: max_depth });
                    }
                    write_map_header(&mut buf, pairs.len())?;
                    depth += 1;
                    tasks.push(Task::Leave);
                    for (key, val) in pairs.iter().rev() {
                        tasks.push(Task::Value(val));
                        tasks.push(Task::Value(key));
                    }
                }
            }
        }
        Ok(buf.freeze())
    }
}

/// Writes an integer using the smallest tag family that fits. Non-negative
/// values use the unsigned families, negatives the signed ones.
fn write_int(buf: &mut BytesMut, i: Int) {
    match i.view() {
        IntView::Signed(n) if n >= 0 => {
            let u = n as u64;
            if u <= 0x7F {
                buf.put_u8(u as u8);
            } else if u <= 0xFF {
                buf.put_u8(marker::UINT_8);
                buf.put_u8(u as u8);
            } else if u <= 0xFFFF {
                buf.put_u8(marker::UINT_16);
                buf.put_u16(u as u16);
            } else if u <= 0xFFFF_FFFF {
                buf.put_u8(marker::UINT_32);
                buf.put_u32(u as u32);
            } else {
                buf.put_u8(marker::UINT_64);
                buf.put_u64(u);
            }
        }
        IntView::Signed(n) => {
            if n >= marker::NEG_FIXINT_MIN {
                buf.put_u8(n as i8 as u8);
            } else if n >= i64::from(i8::MIN) {
                buf.put_u8(marker::INT_8);
                buf.put_i8(n as i8);
            } else if n >= i64::from(i16::MIN) {
                buf.put_u8(marker::INT_16);
                buf.put_i16(n as i16);
            } else if n >= i64::from(i32::MIN) {
                buf.put_u8(marker::INT_32);
                buf.put_i32(n as i32);
            } else {
                buf.put_u8(marker::INT_64);
                buf.put_i64(n);
            }
        }
        // Normalization guarantees this arm is only values above i64::MAX.
        IntView::Unsigned(u) => {
            buf.put_u8(marker::UINT_64);
            buf.put_u64(u);
        }
    }
}

/// Writes a string header and payload (length in bytes, not chars).
fn write_str(buf: &mut BytesMut, s: &str) -> Result<(), EncodeError> {
    let len = s.len();
    if len as u64 > MAX_WIRE_LEN {
        return Err(EncodeError::LengthOverflow {
            kind: "str",
            len,
            max: MAX_WIRE_LEN,
        });
    }
    if len <= marker::FIXSTR_MAX_LEN {
        buf.put_u8(marker::FIXSTR | len as u8);
    } else if len <= 0xFF {
        buf.put_u8(marker::STR_8);
        buf.put_u8(len as u8);
    } else if len <= 0xFFFF {
        buf.put_u8(marker::STR_16);
        buf.put_u16(len as u16);
    } else {
        buf.put_u8(marker::STR_32);
        buf.put_u32(len as u32);
    }
    buf.put_slice(s.as_bytes());
    Ok(())
}

fn write_bin(buf: &mut BytesMut, b: &[u8]) -> Result<(), EncodeError> {
    let len = b.len();
    if len as u64 > MAX_WIRE_LEN {
        return Err(EncodeError::LengthOverflow {
            kind: "bin",
            len,
            max: MAX_WIRE_LEN,
        });
    }
    if len <= 0xFF {
        buf.put_u8(marker::BIN_8);
        buf.put_u8(len as u8);
    } else if len <= 0xFFFF {
        buf.put_u8(marker::BIN_16);
        buf.put_u16(len as u16);
    } else {
        buf.put_u8(marker::BIN_32);
        buf.put_u32(len as u32);
    }
    buf.put_slice(b);
    Ok(())
}

fn write_array_header(buf: &mut BytesMut, len: usize) -> Result<(), EncodeError> {
    if len as u64 > MAX_WIRE_LEN {
        return Err(EncodeError::LengthOverflow {
            kind: "array",
            len,
            max: MAX_WIRE_LEN,
        });
    }
    if len <= marker::FIXARRAY_MAX_LEN {
        buf.put_u8(marker::FIXARRAY | len as u8);
    } else if len <= 0xFFFF {
        buf.put_u8(marker::ARRAY_16);
        buf.put_u16(len as u16);
    } else {
        buf.put_u8(marker::ARRAY_32);
        buf.put_u32(len as u32);
    }
    Ok(())
}

fn write_map_header(buf: &mut BytesMut, len: usize) -> Result<(), EncodeError> {
    if len as u64 > MAX_WIRE_LEN {
        return Err(EncodeError::LengthOverflow {
            kind: "map",
            len,
            max: MAX_WIRE_LEN,
        });
    }
    if len <= marker::FIXMAP_MAX_LEN {
        buf.put_u8(marker::FIXMAP | len as u8);
    } else if len <= 0xFFFF {
        buf.put_u8(marker::MAP_16);
        buf.put_u16(len as u16);
    } else {
        buf.put_u8(marker::MAP_32);
        buf.put_u32(len as u32);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(value: &Value) -> Bytes {
        Packer::new().pack(value).expect("pack failed")
    }

    #[test]
    fn scalar_markers() {
        assert_eq!(&pack(&Value::Nil)[..], [0xC0]);
        assert_eq!(&pack(&Value::Bool(false))[..], [0xC2]);
        assert_eq!(&pack(&Value::Bool(true))[..], [0xC3]);
    }

    #[test]
    fn canonical_int_boundaries() {
        assert_eq!(&pack(&Value::from(127i64))[..], [0x7F]);
        assert_eq!(&pack(&Value::from(128i64))[..], [0xCC, 0x80]);
        assert_eq!(&pack(&Value::from(-32i64))[..], [0xE0]);
        assert_eq!(&pack(&Value::from(-33i64))[..], [0xD0, 0xDF]);
        assert_eq!(
            &pack(&Value::from(u64::MAX))[..],
            [0xCF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn children_encode_in_order() {
        // The work-stack reverses children on push; wire order must still be
        // iteration order.
        let v = Value::Array(vec![
            Value::from(1i64),
            Value::from(2i64),
            Value::from(3i64),
        ]);
        assert_eq!(&pack(&v)[..], [0x93, 0x01, 0x02, 0x03]);

        let m = Value::Map(vec![
            (Value::from("b"), Value::from(2i64)),
            (Value::from("a"), Value::from(1i64)),
        ]);
        assert_eq!(&pack(&m)[..], [0x82, 0xA1, b'b', 0x02, 0xA1, b'a', 0x01]);
    }

    #[test]
    fn sibling_containers_do_not_accumulate_depth() {
        // Two empty arrays side by side are depth 2, not 3.
        let v = Value::Array(vec![Value::Array(vec![]), Value::Array(vec![])]);
        let packer = Packer::with_options(PackOptions::default().max_depth(2));
        assert!(packer.pack(&v).is_ok());
    }

    #[test]
    fn depth_limit_matches_nesting_count() {
        let mut v = Value::Array(vec![]);
        for _ in 0..4 {
            v = Value::Map(vec![(Value::Nil, v)]);
        }
        let packer = Packer::with_options(PackOptions::default().max_depth(4));
        assert!(matches!(
            packer.pack(&v),
            Err(EncodeError::DepthLimit { max: 4 })
        ));
        let packer = Packer::with_options(PackOptions::default().max_depth(5));
        assert!(packer.pack(&v).is_ok());
    }

    #[test]
    fn very_deep_value_does_not_recurse() {
        let mut v = Value::Array(vec![]);
        for _ in 0..4_000 {
            v = Value::Array(vec![v]);
        }
        // A 64 KiB stack cannot hold 4_001 recursive frames; the work-stack
        // lives on the heap. The value is dropped outside the small thread
        // because dropping nested vectors recurses.
        std::thread::scope(|s| {
            std::thread::Builder::new()
                .stack_size(64 * 1024)
                .spawn_scoped(s, || {
                    let packer = Packer::with_options(PackOptions::default().max_depth(8_000));
                    let buf = packer.pack(&v).unwrap();
                    assert_eq!(buf.len(), 4_001);
                })
                .unwrap();
        });
    }
}

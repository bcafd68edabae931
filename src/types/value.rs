//! The codec value model.

use std::fmt;

/// A single MessagePack value.
///
/// This is the closed set of kinds the format can carry. Everything the
/// Packer can be handed is one of these variants, which makes
/// "unrepresentable value" an exhaustiveness condition checked at compile
/// time rather than a runtime encode error.
///
/// Equality is *representation* equality: floats compare by bit pattern, so
/// two NaNs with the same payload are equal and `0.0 != -0.0`. The round-trip
/// tests rely on this, since structural float equality can never hold for
/// NaN.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(Int),
    Float(f64),
    Str(String),
    Bin(Vec<u8>),
    Array(Vec<Value>),
    /// Key-value pairs in insertion order. The wire order of pairs is exactly
    /// this order, and duplicate keys are preserved as-is.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Returns the value as a string reference, if it is a `Str` variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an `Int`, if it is an `Int` variant.
    pub fn as_int(&self) -> Option<Int> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a bool, if it is a `Bool` variant.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an f64, if it is a `Float` variant.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the elements, if the value is an `Array` variant.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the pairs, if the value is a `Map` variant.
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Self::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Whether the value is `Nil`.
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// The kind of the value, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bin(_) => "bin",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bin(a), Self::Bin(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

/// An integer in the format's range: `[i64::MIN, u64::MAX]`.
///
/// Values representable as `i64` are always stored signed; the unsigned
/// representation is used only for values above `i64::MAX`. The constructors
/// maintain this, so two `Int`s are equal exactly when they denote the same
/// number.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Int(Repr);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Repr {
    I64(i64),
    U64(u64),
}

/// Internal view used by the encoders; normalization guarantees the
/// `Unsigned` arm only carries values above `i64::MAX`.
pub(crate) enum IntView {
    Signed(i64),
    Unsigned(u64),
}

impl Int {
    pub fn from_i64(n: i64) -> Self {
        Int(Repr::I64(n))
    }

    pub fn from_u64(n: u64) -> Self {
        if n <= i64::MAX as u64 {
            Int(Repr::I64(n as i64))
        } else {
            Int(Repr::U64(n))
        }
    }

    /// The value as `i64`, if it fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self.0 {
            Repr::I64(n) => Some(n),
            Repr::U64(_) => None,
        }
    }

    /// The value as `u64`, if it is non-negative.
    pub fn as_u64(&self) -> Option<u64> {
        match self.0 {
            Repr::I64(n) if n >= 0 => Some(n as u64),
            Repr::U64(n) => Some(n),
            Repr::I64(_) => None,
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(self.0, Repr::I64(n) if n < 0)
    }

    pub(crate) fn view(&self) -> IntView {
        match self.0 {
            Repr::I64(n) => IntView::Signed(n),
            Repr::U64(n) => IntView::Unsigned(n),
        }
    }
}

impl fmt::Debug for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Repr::I64(n) => write!(f, "{n}"),
            Repr::U64(n) => write!(f, "{n}"),
        }
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

macro_rules! int_from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Int {
            fn from(n: $t) -> Self {
                Int::from_i64(i64::from(n))
            }
        }
        impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Self::Int(Int::from(n))
            }
        }
    )*};
}

macro_rules! int_from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Int {
            fn from(n: $t) -> Self {
                Int::from_u64(u64::from(n))
            }
        }
        impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Self::Int(Int::from(n))
            }
        }
    )*};
}

int_from_signed!(i8, i16, i32, i64);
int_from_unsigned!(u8, u16, u32, u64);

// -- Convenience conversions --

impl From<Int> for Value {
    fn from(i: Int) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bin(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl From<Vec<(Value, Value)>> for Value {
    fn from(pairs: Vec<(Value, Value)>) -> Self {
        Self::Map(pairs)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Bin(b) => write!(f, "<{} bytes>", b.len()),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_normalization() {
        assert_eq!(Int::from_u64(42), Int::from_i64(42));
        assert_eq!(Int::from_u64(42).as_i64(), Some(42));
        assert_eq!(Int::from_u64(u64::MAX).as_i64(), None);
        assert_eq!(Int::from_u64(u64::MAX).as_u64(), Some(u64::MAX));
        assert_eq!(Int::from_i64(-1).as_u64(), None);
        assert!(Int::from_i64(-1).is_negative());
        assert!(!Int::from_u64(u64::MAX).is_negative());
    }

    #[test]
    fn nan_is_representation_equal() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan, nan.clone());

        // Distinct NaN payloads are distinct values.
        let other = Value::Float(f64::from_bits(f64::NAN.to_bits() ^ 1));
        assert_ne!(nan, other);
    }

    #[test]
    fn signed_zero_is_not_positive_zero() {
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
    }

    #[test]
    fn display_nested() {
        let v = Value::Array(vec![
            Value::from(1i64),
            Value::Map(vec![(Value::from("k"), Value::Nil)]),
        ]);
        assert_eq!(v.to_string(), "[1, {\"k\": nil}]");
    }
}

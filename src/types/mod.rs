//! MessagePack value types.

mod value;

pub use value::{Int, Value};

pub(crate) use value::IntView;

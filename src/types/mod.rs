//! Attribute data types and the tagged record value union.

mod value;

pub use value::{DataType, Value};

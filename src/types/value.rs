//! The attribute type tag and the value union produced by `get_attr`/`eval_expr`.

use crate::error::{Result, StorageError};

/// An attribute's declared type. `String` attributes additionally carry a
/// `type_length` on the owning [`crate::schema::Attribute`]; this tag alone is
/// what's persisted as the `dataType` field of the on-disk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Machine-size signed integer (stored as `i32`).
    Int,
    /// Machine-size floating point (stored as `f32`).
    Float,
    /// Single byte, 0 or 1.
    Bool,
    /// Fixed-width byte string; width comes from the attribute's `type_length`.
    String,
}

impl DataType {
    /// The `dataType` integer persisted in the page-0 header.
    #[must_use]
    pub fn wire_tag(self) -> i32 {
        match self {
            DataType::Int => 1,
            DataType::Float => 2,
            DataType::Bool => 3,
            DataType::String => 4,
        }
    }

    /// Parses a `dataType` header field back into a tag.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownDatatype`] for any value other than the
    /// four tags written by [`Self::wire_tag`].
    pub fn from_wire_tag(tag: i32) -> Result<Self> {
        match tag {
            1 => Ok(DataType::Int),
            2 => Ok(DataType::Float),
            3 => Ok(DataType::Bool),
            4 => Ok(DataType::String),
            other => Err(StorageError::UnknownDatatype(format!(
                "unrecognized dataType tag {other} in schema header"
            ))),
        }
    }
}

/// A typed attribute value, as read back by `get_attr` or produced by the
/// predicate evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Bool(bool),
    Str(String),
}

impl Value {
    /// The data type this value carries.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Bool(_) => DataType::Bool,
            Value::Str(_) => DataType::String,
        }
    }
}

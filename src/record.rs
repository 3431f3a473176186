//! Record identity and typed attribute access: the `RID`, the `Record` byte
//! buffer, and `get_attr`/`set_attr`/`create_record`.

use crate::error::{Result, StorageError};
use crate::schema::Schema;
use crate::slotted_page::{FREE_MARKER, OCCUPIED_MARKER};
use crate::storage::page::{PageId, NO_PAGE};
use crate::types::{DataType, Value};

/// A record identifier: `(page, slot)`. `page >= 1` and `slot >= 0` for any
/// RID that has actually been assigned by `insert_record`; [`Rid::INVALID`]
/// is what `create_record` stamps on a not-yet-inserted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rid {
    pub page: PageId,
    pub slot: i32,
}

impl Rid {
    /// The sentinel RID of a record that has never been inserted.
    pub const INVALID: Rid = Rid {
        page: NO_PAGE,
        slot: -1,
    };

    /// Constructs an RID for an assigned slot.
    #[must_use]
    pub fn new(page: PageId, slot: i32) -> Self {
        Self { page, slot }
    }
}

impl std::fmt::Display for Rid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.page, self.slot)
    }
}

/// An RID plus a byte buffer of length `schema.record_size()`: a leading
/// status-marker byte followed by the attribute payload in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Rid,
    data: Vec<u8>,
}

impl Record {
    /// Wraps a raw `record_size`-length buffer (marker + payload) under an RID.
    /// Used internally by the record manager and scan engine when copying
    /// slot bytes out of a pinned page.
    #[must_use]
    pub(crate) fn from_raw(id: Rid, data: Vec<u8>) -> Self {
        Self { id, data }
    }

    /// `createRecord`: allocates a zeroed payload of `schema.record_size()`
    /// bytes, marks it free, and stamps [`Rid::INVALID`].
    #[must_use]
    pub fn create(schema: &Schema) -> Self {
        let mut data = vec![0u8; schema.record_size()];
        data[0] = FREE_MARKER;
        Self {
            id: Rid::INVALID,
            data,
        }
    }

    /// Whether the slot marker byte reads occupied.
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.data[0] == OCCUPIED_MARKER
    }

    /// The payload bytes following the marker, i.e. `data[1..]`.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.data[1..]
    }

    /// Mutable access to the payload bytes following the marker.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.data[1..]
    }

    /// The full marker-plus-payload buffer, length `schema.record_size()`.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.data
    }
}

/// `getAttr`: reads the typed value at `attr_num`'s offset.
///
/// For `String` attributes, copies exactly `type_length` bytes and trims at
/// the first NUL byte, so the returned value is null-terminated.
///
/// # Errors
///
/// Returns [`StorageError::BadAttrNum`] if `attr_num` is out of range, or
/// [`StorageError::UnknownDatatype`] if offset computation fails.
pub fn get_attr(record: &Record, schema: &Schema, attr_num: i32) -> Result<Value> {
    if attr_num < 0 || attr_num as usize >= schema.num_attrs() {
        return Err(StorageError::BadAttrNum(attr_num));
    }
    let attr = schema.attribute(attr_num as usize).expect("bounds checked above");
    let offset = schema.attr_offset(attr_num)?;
    let raw = record.raw();
    let bytes = &raw[offset..offset + attr.byte_size()];

    Ok(match attr.data_type {
        DataType::Int => Value::Int(i32::from_le_bytes(bytes.try_into().unwrap())),
        DataType::Float => Value::Float(f32::from_le_bytes(bytes.try_into().unwrap())),
        DataType::Bool => Value::Bool(bytes[0] != 0),
        DataType::String => {
            let nul_at = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            Value::Str(String::from_utf8_lossy(&bytes[..nul_at]).into_owned())
        }
    })
}

/// `setAttr`: writes `value` at `attr_num`'s offset. `String` writes copy
/// exactly `type_length` bytes — shorter input is zero-padded, longer input
/// truncated.
///
/// # Errors
///
/// Returns [`StorageError::BadAttrNum`] if `attr_num` is negative or out of
/// range, or [`StorageError::UnknownDatatype`] if offset computation fails.
pub fn set_attr(record: &mut Record, schema: &Schema, attr_num: i32, value: &Value) -> Result<()> {
    if attr_num < 0 || attr_num as usize >= schema.num_attrs() {
        return Err(StorageError::BadAttrNum(attr_num));
    }
    let attr = schema.attribute(attr_num as usize).expect("bounds checked above");
    let size = attr.byte_size();
    let offset = schema.attr_offset(attr_num)?;

    let data = &mut record.data[offset..offset + size];
    match (attr.data_type, value) {
        (DataType::Int, Value::Int(v)) => data.copy_from_slice(&v.to_le_bytes()),
        (DataType::Float, Value::Float(v)) => data.copy_from_slice(&v.to_le_bytes()),
        (DataType::Bool, Value::Bool(v)) => data[0] = u8::from(*v),
        (DataType::String, Value::Str(v)) => {
            let bytes = v.as_bytes();
            let take = bytes.len().min(size);
            data[..take].copy_from_slice(&bytes[..take]);
            for b in &mut data[take..] {
                *b = 0;
            }
        }
        _ => {
            return Err(StorageError::UnknownDatatype(format!(
                "value {value:?} does not match attribute type {:?}",
                attr.data_type
            )))
        }
    }
    Ok(())
}

//! Table schema: an ordered list of typed attributes plus key designation,
//! and the page-0 header (de)serialization that persists it.

use crate::error::{Result, StorageError};
use crate::types::DataType;

/// Width, in bytes, of an attribute's name field in the on-disk header.
/// Longer names are truncated on write; this is a storage bound, not a
/// validation error.
pub const SIZE_OF_ATTRIBUTE: usize = 20;

/// Bytes per attribute record in the header: name + dataType (i32) + typeLength (i32).
const ATTRIBUTE_RECORD_SIZE: usize = SIZE_OF_ATTRIBUTE + 4 + 4;

/// One typed column of a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub data_type: DataType,
    /// Byte width for `String` attributes; `0` for fixed-size types.
    pub type_length: u32,
}

impl Attribute {
    /// Creates a new attribute descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType, type_length: u32) -> Self {
        Self {
            name: name.into(),
            data_type,
            type_length,
        }
    }

    /// Byte size of this attribute's payload: `sizeof` for fixed types,
    /// `type_length` for `String`.
    #[must_use]
    pub fn byte_size(&self) -> usize {
        match self.data_type {
            DataType::Int => std::mem::size_of::<i32>(),
            DataType::Float => std::mem::size_of::<f32>(),
            DataType::Bool => 1,
            DataType::String => self.type_length as usize,
        }
    }
}

/// An ordered list of attributes with a key-attribute index list.
///
/// `createSchema`/`freeSchema` map to ordinary construction and `Drop` here;
/// there is no explicit teardown operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    attributes: Vec<Attribute>,
    key_indices: Vec<usize>,
}

impl Schema {
    /// `createSchema`: packages attributes and a key-attribute index list into
    /// a [`Schema`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NullArgument`] if `key_indices` is empty (a
    /// `keySize <= 0` rejection), or [`StorageError::BadAttrNum`] if any key
    /// index is out of range for `attributes`.
    pub fn new(attributes: Vec<Attribute>, key_indices: Vec<usize>) -> Result<Self> {
        if key_indices.is_empty() {
            return Err(StorageError::NullArgument("key_indices"));
        }
        for &key in &key_indices {
            if key >= attributes.len() {
                return Err(StorageError::BadAttrNum(key as i32));
            }
        }
        Ok(Self {
            attributes,
            key_indices,
        })
    }

    /// Number of attributes in this schema.
    #[must_use]
    pub fn num_attrs(&self) -> usize {
        self.attributes.len()
    }

    /// The attribute at the given position, if any.
    #[must_use]
    pub fn attribute(&self, attr_num: usize) -> Option<&Attribute> {
        self.attributes.get(attr_num)
    }

    /// All attributes, in declaration order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Indices of the key attributes.
    #[must_use]
    pub fn key_indices(&self) -> &[usize] {
        &self.key_indices
    }

    /// `getRecordSize`: `1 + Σ attribute sizes` (the leading byte is the slot
    /// status marker).
    #[must_use]
    pub fn record_size(&self) -> usize {
        1 + self.attributes.iter().map(Attribute::byte_size).sum::<usize>()
    }

    /// `attrOffset`: byte offset of attribute `attr_num`'s payload within a
    /// record buffer, counting the leading marker byte.
    ///
    /// `attr_offset(0) == 1` and `attr_offset(num_attrs()) == record_size()`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::BadAttrNum`] if `attr_num` is negative or
    /// exceeds `num_attrs()`.
    pub fn attr_offset(&self, attr_num: i32) -> Result<usize> {
        if attr_num < 0 || attr_num as usize > self.attributes.len() {
            return Err(StorageError::BadAttrNum(attr_num));
        }
        let mut offset = 1usize;
        for attr in &self.attributes[..attr_num as usize] {
            offset += attr.byte_size();
        }
        Ok(offset)
    }

    /// Serializes `(tuple_count, free_list_hint, schema)` into a page-0 header
    /// image, zero-padded to `PAGE_SIZE`.
    ///
    /// Beyond the documented layout, this implementation appends the key
    /// index list (as `key_size` little-endian `i32`s) immediately after the
    /// attribute records — an undocumented detail; see DESIGN.md for why.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::OutOfMemory`] if the serialized header would
    /// not fit in a single page.
    pub fn to_header_bytes(
        &self,
        tuple_count: i32,
        free_list_hint: i32,
    ) -> Result<[u8; crate::storage::page::PAGE_SIZE]> {
        use crate::storage::page::PAGE_SIZE;

        let needed = 16 + self.attributes.len() * ATTRIBUTE_RECORD_SIZE + self.key_indices.len() * 4;
        if needed > PAGE_SIZE {
            return Err(StorageError::OutOfMemory(format!(
                "schema header needs {needed} bytes, page holds {PAGE_SIZE}"
            )));
        }

        let mut buf = [0u8; PAGE_SIZE];
        buf[0..4].copy_from_slice(&tuple_count.to_le_bytes());
        buf[4..8].copy_from_slice(&free_list_hint.to_le_bytes());
        #[allow(clippy::cast_possible_wrap)]
        let num_attr = self.attributes.len() as i32;
        buf[8..12].copy_from_slice(&num_attr.to_le_bytes());
        #[allow(clippy::cast_possible_wrap)]
        let key_size = self.key_indices.len() as i32;
        buf[12..16].copy_from_slice(&key_size.to_le_bytes());

        let mut offset = 16;
        for attr in &self.attributes {
            let name_bytes = attr.name.as_bytes();
            let take = name_bytes.len().min(SIZE_OF_ATTRIBUTE);
            buf[offset..offset + take].copy_from_slice(&name_bytes[..take]);
            offset += SIZE_OF_ATTRIBUTE;

            buf[offset..offset + 4].copy_from_slice(&attr.data_type.wire_tag().to_le_bytes());
            offset += 4;
            #[allow(clippy::cast_possible_wrap)]
            let type_length = attr.type_length as i32;
            buf[offset..offset + 4].copy_from_slice(&type_length.to_le_bytes());
            offset += 4;
        }

        for &key in &self.key_indices {
            #[allow(clippy::cast_possible_wrap)]
            let key = key as i32;
            buf[offset..offset + 4].copy_from_slice(&key.to_le_bytes());
            offset += 4;
        }

        Ok(buf)
    }

    /// Parses a page-0 header image back into `(tuple_count, free_list_hint, schema)`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownDatatype`] if the header is too short
    /// for its own declared `num_attr`/`key_size`, or names an unrecognized
    /// `dataType` tag.
    pub fn from_header_bytes(data: &[u8]) -> Result<(i32, i32, Schema)> {
        let read_i32 = |data: &[u8], at: usize| -> Result<i32> {
            data.get(at..at + 4)
                .map(|b| i32::from_le_bytes(b.try_into().unwrap()))
                .ok_or_else(|| {
                    StorageError::UnknownDatatype("schema header truncated".to_string())
                })
        };

        let tuple_count = read_i32(data, 0)?;
        let free_list_hint = read_i32(data, 4)?;
        let num_attr = read_i32(data, 8)?;
        let key_size = read_i32(data, 12)?;

        if num_attr < 0 || key_size < 0 {
            return Err(StorageError::UnknownDatatype(
                "schema header has negative num_attr/key_size".to_string(),
            ));
        }

        let mut offset = 16usize;
        let mut attributes = Vec::with_capacity(num_attr as usize);
        for _ in 0..num_attr {
            let name_bytes = data.get(offset..offset + SIZE_OF_ATTRIBUTE).ok_or_else(|| {
                StorageError::UnknownDatatype("schema header truncated in attribute name".to_string())
            })?;
            let nul_at = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
            let name = String::from_utf8_lossy(&name_bytes[..nul_at]).into_owned();
            offset += SIZE_OF_ATTRIBUTE;

            let tag = read_i32(data, offset)?;
            offset += 4;
            let type_length = read_i32(data, offset)?;
            offset += 4;

            let data_type = DataType::from_wire_tag(tag)?;
            attributes.push(Attribute::new(name, data_type, type_length.max(0) as u32));
        }

        let mut key_indices = Vec::with_capacity(key_size as usize);
        for _ in 0..key_size {
            let key = read_i32(data, offset)?;
            offset += 4;
            key_indices.push(key.max(0) as usize);
        }

        let schema = Schema::new(attributes, key_indices)?;
        Ok((tuple_count, free_list_hint, schema))
    }
}

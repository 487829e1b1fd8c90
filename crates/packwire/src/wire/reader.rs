// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked reader over an input slice.

use crate::config::{NULL_COLLECTION_LENGTH, NULL_OBJECT_HEADER, NULL_UNION_TAG};
use crate::error::{PackError, PackResult};
use crate::registry::FormatterRegistry;
use crate::types::{PrimitiveKind, TypeDescriptor, Value};
use crate::wire::{blittable, varint};

/// Reader handed to formatters during decode.
///
/// Every read is bounds-checked; running past the end yields
/// [`PackError::TruncatedInput`] with the offending offset.
pub struct PackReader<'a> {
    buffer: &'a [u8],
    offset: usize,
    registry: &'a FormatterRegistry,
    max_length: usize,
}

impl<'a> PackReader<'a> {
    /// Create a reader; decode limits are snapshotted from the registry config.
    pub fn new(buffer: &'a [u8], registry: &'a FormatterRegistry) -> Self {
        Self {
            buffer,
            offset: 0,
            registry,
            max_length: registry.config().max_collection_length,
        }
    }

    /// Registry used for nested dispatch.
    pub fn registry(&self) -> &'a FormatterRegistry {
        self.registry
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    /// Consume `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> PackResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(PackError::TruncatedInput {
                offset: self.offset,
                need: len,
                have: self.remaining(),
            });
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    /// Skip `len` bytes.
    pub fn advance(&mut self, len: usize) -> PackResult<()> {
        self.read_bytes(len).map(|_| ())
    }

    pub fn read_u8(&mut self) -> PackResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_varint(&mut self) -> PackResult<u64> {
        let (value, consumed) = varint::read_varint(&self.buffer[self.offset..], self.offset)?;
        self.offset += consumed;
        Ok(value)
    }

    /// Member count, or `None` for the null object header.
    pub fn try_read_object_header(&mut self) -> PackResult<Option<u8>> {
        let count = self.read_u8()?;
        Ok((count != NULL_OBJECT_HEADER).then_some(count))
    }

    /// Union tag, or `None` for the null union header.
    pub fn try_read_union_header(&mut self) -> PackResult<Option<u8>> {
        let tag = self.read_u8()?;
        Ok((tag != NULL_UNION_TAG).then_some(tag))
    }

    /// Collection length, or `None` for the null length header.
    pub fn try_read_collection_header(&mut self) -> PackResult<Option<usize>> {
        let start = self.offset;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.read_bytes(4)?);
        let length = i32::from_le_bytes(raw);
        if length == NULL_COLLECTION_LENGTH {
            return Ok(None);
        }
        if length < 0 {
            return Err(PackError::InvalidData(format!(
                "negative collection length {} at offset {}",
                length, start
            )));
        }
        let length = length as usize;
        if length > self.max_length {
            return Err(PackError::LengthLimitExceeded {
                length,
                max: self.max_length,
            });
        }
        Ok(Some(length))
    }

    pub fn read_primitive(&mut self, kind: PrimitiveKind) -> PackResult<Value> {
        let bytes = self.read_bytes(kind.size())?;
        blittable::read_primitive(kind, bytes)
    }

    /// Raw-copy decode of a blittable type.
    pub fn read_blittable(&mut self, desc: &TypeDescriptor) -> PackResult<Value> {
        let size = desc.blittable_size().ok_or_else(|| PackError::TypeMismatch {
            expected: "blittable type".to_string(),
            found: desc.name.to_string(),
        })?;
        let bytes = self.read_bytes(size)?;
        blittable::read_blittable(desc, bytes)
    }

    /// Length-prefixed UTF-8 string, or `Null`.
    pub fn read_string(&mut self) -> PackResult<Value> {
        let Some(length) = self.try_read_collection_header()? else {
            return Ok(Value::Null);
        };
        let start = self.offset;
        let bytes = self.read_bytes(length)?;
        let text = std::str::from_utf8(bytes).map_err(|e| {
            PackError::InvalidData(format!("invalid UTF-8 at offset {}: {}", start, e))
        })?;
        Ok(Value::String(text.to_string()))
    }

    /// Decode a fresh value with the formatter registered for `desc`.
    pub fn read_value(&mut self, desc: &TypeDescriptor) -> PackResult<Value> {
        let formatter = self.registry.require(&desc.name)?;
        formatter.deserialize(self)
    }

    /// Decode into an existing value with the formatter registered for `desc`.
    pub fn read_value_into(&mut self, desc: &TypeDescriptor, value: &mut Value) -> PackResult<()> {
        let formatter = self.registry.require(&desc.name)?;
        formatter.deserialize_into(self, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;

    #[test]
    fn test_truncation_reports_offset() {
        let registry = FormatterRegistry::new();
        let mut reader = PackReader::new(&[1, 2, 3], &registry);
        reader.advance(2).expect("advance");
        let err = reader.read_primitive(PrimitiveKind::U32).unwrap_err();
        assert_eq!(
            err,
            PackError::TruncatedInput {
                offset: 2,
                need: 4,
                have: 1
            }
        );
        assert_eq!(reader.offset(), 2);
    }

    #[test]
    fn test_null_headers() {
        let registry = FormatterRegistry::new();
        let bytes = [255, 4, 255, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut reader = PackReader::new(&bytes, &registry);
        assert_eq!(reader.try_read_object_header().expect("header"), None);
        assert_eq!(reader.try_read_union_header().expect("header"), Some(4));
        assert_eq!(reader.try_read_union_header().expect("header"), None);
        assert_eq!(reader.try_read_collection_header().expect("header"), None);
        assert!(reader.is_eof());
    }

    #[test]
    fn test_collection_length_limits() {
        let registry = FormatterRegistry::new();
        registry.set_config(CodecConfig::default().with_max_collection_length(8));

        let too_long = 9i32.to_le_bytes();
        let mut reader = PackReader::new(&too_long, &registry);
        assert_eq!(
            reader.try_read_collection_header().unwrap_err(),
            PackError::LengthLimitExceeded { length: 9, max: 8 }
        );

        let negative = (-2i32).to_le_bytes();
        let mut reader = PackReader::new(&negative, &registry);
        assert!(matches!(
            reader.try_read_collection_header(),
            Err(PackError::InvalidData(_))
        ));
    }

    #[test]
    fn test_strings() {
        let registry = FormatterRegistry::new();
        let mut bytes = 2i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"ok");
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.push(0xFF);
        let mut reader = PackReader::new(&bytes, &registry);
        assert_eq!(reader.read_string().expect("string"), Value::String("ok".into()));
        assert!(matches!(reader.read_string(), Err(PackError::InvalidData(_))));
    }

    #[test]
    fn test_varint_advances_offset() {
        let registry = FormatterRegistry::new();
        let mut reader = PackReader::new(&[0xAC, 0x02, 0x05], &registry);
        assert_eq!(reader.read_varint().expect("varint"), 300);
        assert_eq!(reader.offset(), 2);
        assert_eq!(reader.read_varint().expect("varint"), 5);
    }
}

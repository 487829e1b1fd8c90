// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Append-only writer over a growable byte buffer.

use crate::config::{MAX_MEMBER_COUNT, NULL_COLLECTION_LENGTH, NULL_OBJECT_HEADER, NULL_UNION_TAG};
use crate::error::{PackError, PackResult};
use crate::registry::FormatterRegistry;
use crate::types::{PrimitiveKind, TypeDescriptor, Value};
use crate::wire::{blittable, varint};

/// Writer handed to formatters during encode.
///
/// Carries the registry so nested values can be dispatched to their own
/// formatter.
pub struct PackWriter<'a> {
    buffer: &'a mut Vec<u8>,
    registry: &'a FormatterRegistry,
}

impl<'a> PackWriter<'a> {
    pub fn new(buffer: &'a mut Vec<u8>, registry: &'a FormatterRegistry) -> Self {
        Self { buffer, registry }
    }

    /// Registry used for nested dispatch.
    pub fn registry(&self) -> &'a FormatterRegistry {
        self.registry
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    /// Reserve room for `additional` bytes.
    pub fn reserve(&mut self, additional: usize) {
        self.buffer.reserve(additional);
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub fn write_varint(&mut self, value: u64) -> usize {
        varint::write_varint(self.buffer, value)
    }

    /// Object header carrying the member count.
    pub fn write_object_header(&mut self, count: usize) -> PackResult<()> {
        if count > MAX_MEMBER_COUNT {
            return Err(PackError::LengthLimitExceeded {
                length: count,
                max: MAX_MEMBER_COUNT,
            });
        }
        self.buffer.push(count as u8);
        Ok(())
    }

    pub fn write_null_object_header(&mut self) {
        self.buffer.push(NULL_OBJECT_HEADER);
    }

    pub fn write_union_header(&mut self, tag: u8) {
        debug_assert_ne!(tag, NULL_UNION_TAG);
        self.buffer.push(tag);
    }

    pub fn write_null_union_header(&mut self) {
        self.buffer.push(NULL_UNION_TAG);
    }

    /// Length header of a string, array or collection.
    pub fn write_collection_header(&mut self, length: usize) -> PackResult<()> {
        let length = i32::try_from(length).map_err(|_| PackError::LengthLimitExceeded {
            length,
            max: i32::MAX as usize,
        })?;
        self.buffer.extend_from_slice(&length.to_le_bytes());
        Ok(())
    }

    pub fn write_null_collection_header(&mut self) {
        self.buffer
            .extend_from_slice(&NULL_COLLECTION_LENGTH.to_le_bytes());
    }

    pub fn write_primitive(&mut self, kind: PrimitiveKind, value: &Value) -> PackResult<()> {
        blittable::write_primitive(self.buffer, kind, value)
    }

    pub fn write_blittable(&mut self, desc: &TypeDescriptor, value: &Value) -> PackResult<()> {
        blittable::write_blittable(self.buffer, desc, value)
    }

    /// Length-prefixed UTF-8 string; `Null` writes the null length header.
    pub fn write_string(&mut self, value: &Value) -> PackResult<()> {
        match value {
            Value::String(s) => {
                self.write_collection_header(s.len())?;
                self.buffer.extend_from_slice(s.as_bytes());
                Ok(())
            }
            Value::Null => {
                self.write_null_collection_header();
                Ok(())
            }
            other => Err(blittable::mismatch("string", other)),
        }
    }

    /// Encode `value` with the formatter registered for `desc`.
    pub fn write_value(&mut self, desc: &TypeDescriptor, value: &Value) -> PackResult<()> {
        let formatter = self.registry.require(&desc.name)?;
        formatter.serialize(self, value)
    }
}

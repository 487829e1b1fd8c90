// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Formatter trait and the builtin leaf formatters.

use crate::error::PackResult;
use crate::types::{PrimitiveKind, TypeDescriptor, Value};
use crate::wire::{PackReader, PackWriter};
use std::sync::Arc;

/// Codec capability for one type.
///
/// Decode has two arms: [`Formatter::deserialize`] constructs a fresh value,
/// [`Formatter::deserialize_into`] updates a value the caller already owns
/// (reusing its allocations where the codec can). Passing `Value::Null` to
/// the update arm is the construct arm.
pub trait Formatter: Send + Sync {
    /// Registry key of the formatted type.
    fn type_name(&self) -> &str;

    /// Append the encoding of `value`.
    fn serialize(&self, writer: &mut PackWriter<'_>, value: &Value) -> PackResult<()>;

    /// Decode a fresh value.
    fn deserialize(&self, reader: &mut PackReader<'_>) -> PackResult<Value> {
        let mut value = Value::Null;
        self.deserialize_into(reader, &mut value)?;
        Ok(value)
    }

    /// Decode into `value`, updating it in place when possible.
    fn deserialize_into(&self, reader: &mut PackReader<'_>, value: &mut Value) -> PackResult<()>;
}

/// Little-endian scalar.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveFormatter {
    kind: PrimitiveKind,
}

impl PrimitiveFormatter {
    pub fn new(kind: PrimitiveKind) -> Self {
        Self { kind }
    }
}

impl Formatter for PrimitiveFormatter {
    fn type_name(&self) -> &str {
        self.kind.name()
    }

    fn serialize(&self, writer: &mut PackWriter<'_>, value: &Value) -> PackResult<()> {
        writer.write_primitive(self.kind, value)
    }

    fn deserialize_into(&self, reader: &mut PackReader<'_>, value: &mut Value) -> PackResult<()> {
        *value = reader.read_primitive(self.kind)?;
        Ok(())
    }
}

/// Length-prefixed UTF-8 string.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringFormatter;

impl Formatter for StringFormatter {
    fn type_name(&self) -> &str {
        "string"
    }

    fn serialize(&self, writer: &mut PackWriter<'_>, value: &Value) -> PackResult<()> {
        writer.write_string(value)
    }

    fn deserialize_into(&self, reader: &mut PackReader<'_>, value: &mut Value) -> PackResult<()> {
        *value = reader.read_string()?;
        Ok(())
    }
}

/// Raw-byte copy of a blittable value-type record.
#[derive(Debug, Clone)]
pub struct BlittableFormatter {
    desc: Arc<TypeDescriptor>,
}

impl BlittableFormatter {
    pub fn new(desc: Arc<TypeDescriptor>) -> Self {
        Self { desc }
    }
}

impl Formatter for BlittableFormatter {
    fn type_name(&self) -> &str {
        &self.desc.name
    }

    fn serialize(&self, writer: &mut PackWriter<'_>, value: &Value) -> PackResult<()> {
        writer.write_blittable(&self.desc, value)
    }

    fn deserialize_into(&self, reader: &mut PackReader<'_>, value: &mut Value) -> PackResult<()> {
        *value = reader.read_blittable(&self.desc)?;
        Ok(())
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic value types.

use crate::types::{TypeDescriptor, TypeKind};
use std::sync::Arc;

/// A dynamic value of any describable type.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    // Primitives
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),

    // Composites
    Record(Record),
    Array(Vec<Value>),
    Sequence(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Pair(Box<(Value, Value)>),

    /// Absent reference value.
    #[default]
    Null,
}

impl Value {
    /// Default value for a declared type: zero scalars, `Null` for reference
    /// types, defaulted fields for value-type records.
    pub fn default_for(desc: &TypeDescriptor) -> Self {
        match &desc.kind {
            TypeKind::Primitive(p) => p.zero(),
            TypeKind::Record(r) if r.value_type => Self::Record(Record::defaults(desc)),
            TypeKind::Pair(k, v) => Self::Pair(Box::new((Self::default_for(k), Self::default_for(v)))),
            _ => Self::Null,
        }
    }

    /// Check if value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Runtime type name of a record value.
    pub fn runtime_type(&self) -> Option<&str> {
        match self {
            Self::Record(r) => Some(r.type_name()),
            _ => None,
        }
    }

    /// Short shape name used in mismatch errors.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Char(_) => "char",
            Self::String(_) => "string",
            Self::Record(_) => "record",
            Self::Array(_) => "array",
            Self::Sequence(_) => "sequence",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Pair(_) => "pair",
            Self::Null => "null",
        }
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u32.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i32.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as record.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Try to get as mutable record.
    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Try to get elements of an array, sequence or set.
    pub fn as_elements(&self) -> Option<&[Value]> {
        match self {
            Self::Array(v) | Self::Sequence(v) | Self::Set(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get record field.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.as_record().and_then(|r| r.get(name))
    }
}

/// Record instance: runtime type name plus live fields in member order.
///
/// Padding slots of version-tolerant schemas carry no data and never appear
/// here.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: Arc<str>,
    fields: Vec<(Arc<str>, Value)>,
}

impl Record {
    /// Create an empty record of the given runtime type.
    pub fn new(type_name: impl Into<Arc<str>>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Record with every live member set to its default.
    pub fn defaults(desc: &TypeDescriptor) -> Self {
        let fields = desc
            .as_record()
            .map(|r| {
                r.live_members()
                    .map(|m| (m.name.clone(), m.default_value()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            type_name: desc.name.clone(),
            fields,
        }
    }

    /// Builder-style setter: replaces the field or appends it.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.get_mut(name) {
            Some(slot) => *slot = value,
            None => self.fields.push((Arc::from(name), value)),
        }
        self
    }

    /// Runtime type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| v)
    }

    /// Get mutable field by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| v)
    }

    /// Replace an existing field; returns false if the record has no such field.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Iterate over fields.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (&**n, v))
    }

    /// Field at `hint` if its name matches, else lookup by name.
    pub(crate) fn field_hinted(&self, hint: usize, name: &str) -> Option<&Value> {
        match self.fields.get(hint) {
            Some((n, v)) if &**n == name => Some(v),
            _ => self.get(name),
        }
    }

    pub(crate) fn from_fields(type_name: Arc<str>, fields: Vec<(Arc<str>, Value)>) -> Self {
        Self { type_name, fields }
    }

    /// Assign a field in place, appending it if the record lacks it.
    pub(crate) fn put_hinted(&mut self, hint: usize, name: &Arc<str>, value: Value) {
        match self.field_hinted_mut(hint, name) {
            Some(slot) => *slot = value,
            None => self.fields.push((name.clone(), value)),
        }
    }

    pub(crate) fn field_hinted_mut(&mut self, hint: usize, name: &str) -> Option<&mut Value> {
        let matches = self
            .fields
            .get(hint)
            .is_some_and(|(n, _)| &**n == name);
        if matches {
            self.fields.get_mut(hint).map(|(_, v)| v)
        } else {
            self.get_mut(name)
        }
    }
}

// Conversion traits
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Self::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Self::U16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Self::I8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::I16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Self::Record(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrimitiveKind, RecordBuilder};

    #[test]
    fn test_record_with_and_get() {
        let record = Record::new("Point").with("x", 10i32).with("y", 20i32).with("x", 11i32);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("x").and_then(Value::as_i32), Some(11));
        assert_eq!(record.get("y").and_then(Value::as_i32), Some(20));
        assert!(record.get("z").is_none());
    }

    #[test]
    fn test_field_hint_falls_back_to_name() {
        let record = Record::new("Point").with("y", 2i32).with("x", 1i32);
        assert_eq!(record.field_hinted(0, "x").and_then(Value::as_i32), Some(1));
        assert_eq!(record.field_hinted(9, "y").and_then(Value::as_i32), Some(2));
    }

    #[test]
    fn test_defaults_follow_value_semantics() {
        let inner = RecordBuilder::new("Vec2")
            .value_type()
            .field("x", crate::types::TypeDescriptor::primitive(PrimitiveKind::F32))
            .build()
            .expect("descriptor");
        let outer = RecordBuilder::new("Body")
            .field("position", inner)
            .field("name", crate::types::TypeDescriptor::string())
            .field("mass", crate::types::TypeDescriptor::primitive(PrimitiveKind::F64))
            .build()
            .expect("descriptor");

        assert!(Value::default_for(&outer).is_null());

        let record = Record::defaults(&outer);
        assert_eq!(
            record.get("position"),
            Some(&Value::Record(Record::new("Vec2").with("x", 0.0f32)))
        );
        assert_eq!(record.get("name"), Some(&Value::Null));
        assert_eq!(record.get("mass"), Some(&Value::F64(0.0)));
    }

    #[test]
    fn test_option_conversion() {
        assert!(Value::from(None::<i32>).is_null());
        assert_eq!(Value::from(Some("a")), Value::String("a".into()));
    }
}

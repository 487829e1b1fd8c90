// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Union codec: `[tag][payload]`, or the null tag alone for an absent value.
//!
//! The tag is looked up in the union's tag table from the payload's
//! identity: a record's type name, or the shape of any other value
//! (`"i32"`, `"string"`, `"sequence"`...). Record payloads are encoded by
//! their own object codec, built with the union; other payloads go through
//! the registry.

use crate::codec::{build_formatter, Formatter};
use crate::error::{PackError, PackResult};
use crate::types::{LifecycleHooks, TypeDescriptor, UnionTagTable, Value};
use crate::wire::{PackReader, PackWriter};
use std::collections::HashMap;
use std::sync::Arc;

enum Payload {
    Prebuilt(Arc<dyn Formatter>),
    Registry(Arc<TypeDescriptor>),
}

impl Payload {
    fn serialize(&self, writer: &mut PackWriter<'_>, value: &Value) -> PackResult<()> {
        match self {
            Self::Prebuilt(formatter) => formatter.serialize(writer, value),
            Self::Registry(desc) => writer.write_value(desc, value),
        }
    }

    fn deserialize_into(&self, reader: &mut PackReader<'_>, value: &mut Value) -> PackResult<()> {
        match self {
            Self::Prebuilt(formatter) => formatter.deserialize_into(reader, value),
            Self::Registry(desc) => reader.read_value_into(desc, value),
        }
    }
}

/// Payload identity of a runtime value, as keyed in the tag table.
fn runtime_type(value: &Value) -> &str {
    match value {
        Value::Record(r) => r.type_name(),
        other => other.shape(),
    }
}

/// Formatter for union types.
pub struct UnionFormatter {
    name: Arc<str>,
    tags: UnionTagTable,
    hooks: LifecycleHooks,
    payloads: HashMap<u8, Payload>,
}

impl UnionFormatter {
    pub fn new(desc: Arc<TypeDescriptor>) -> PackResult<Self> {
        let union = desc.as_union().ok_or_else(|| PackError::TypeMismatch {
            expected: "union type".to_string(),
            found: desc.name.to_string(),
        })?;
        let payloads = union
            .tags
            .iter()
            .map(|variant| {
                let payload = match variant.type_desc.as_record() {
                    Some(_) => build_formatter(&variant.type_desc)
                        .map_or_else(|| Payload::Registry(variant.type_desc.clone()), Payload::Prebuilt),
                    None => Payload::Registry(variant.type_desc.clone()),
                };
                (variant.tag, payload)
            })
            .collect();
        Ok(Self {
            name: desc.name.clone(),
            tags: union.tags.clone(),
            hooks: union.hooks.clone(),
            payloads,
        })
    }

    fn unknown_tag(&self, tag: u8) -> PackError {
        PackError::UnknownUnionTag {
            union: self.name.to_string(),
            tag,
        }
    }
}

impl Formatter for UnionFormatter {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn serialize(&self, writer: &mut PackWriter<'_>, value: &Value) -> PackResult<()> {
        self.hooks.serializing(value);
        if value.is_null() {
            writer.write_null_union_header();
        } else {
            let type_name = runtime_type(value);
            let tag = self
                .tags
                .tag_of(type_name)
                .ok_or_else(|| PackError::UnknownUnionVariant {
                    union: self.name.to_string(),
                    type_name: type_name.to_string(),
                })?;
            let payload = self.payloads.get(&tag).ok_or_else(|| self.unknown_tag(tag))?;
            writer.write_union_header(tag);
            payload.serialize(writer, value)?;
        }
        self.hooks.serialized(value);
        Ok(())
    }

    fn deserialize_into(&self, reader: &mut PackReader<'_>, value: &mut Value) -> PackResult<()> {
        self.hooks.deserializing(value);
        match reader.try_read_union_header()? {
            None => *value = Value::Null,
            Some(tag) => {
                let payload = self.payloads.get(&tag).ok_or_else(|| self.unknown_tag(tag))?;
                // In place only when the destination already holds this variant.
                if self.tags.tag_of(runtime_type(value)) != Some(tag) {
                    *value = Value::Null;
                }
                payload.deserialize_into(reader, value)?;
            }
        }
        self.hooks.deserialized(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FormatterRegistry;
    use crate::types::{PrimitiveKind, Record, RecordBuilder, UnionBuilder};

    fn shape() -> Arc<TypeDescriptor> {
        let circle = RecordBuilder::new("Circle")
            .field("radius", TypeDescriptor::primitive(PrimitiveKind::F64))
            .build()
            .expect("descriptor");
        let label = RecordBuilder::new("Label")
            .field("text", TypeDescriptor::string())
            .field("size", TypeDescriptor::primitive(PrimitiveKind::U16))
            .build()
            .expect("descriptor");
        UnionBuilder::new("Shape")
            .variant(0, circle)
            .variant(3, label)
            .variant(4, TypeDescriptor::primitive(PrimitiveKind::I32))
            .build()
            .expect("descriptor")
    }

    fn roundtrip(formatter: &UnionFormatter, registry: &FormatterRegistry, value: &Value) -> (Vec<u8>, Value) {
        let mut out = Vec::new();
        formatter
            .serialize(&mut PackWriter::new(&mut out, registry), value)
            .expect("encode");
        let mut reader = PackReader::new(&out, registry);
        let decoded = formatter.deserialize(&mut reader).expect("decode");
        assert!(reader.is_eof());
        (out, decoded)
    }

    #[test]
    fn test_variants_keep_their_concrete_type() {
        let registry = FormatterRegistry::new();
        let formatter = UnionFormatter::new(shape()).expect("formatter");

        let circle = Value::Record(Record::new("Circle").with("radius", 2.0f64));
        let (bytes, decoded) = roundtrip(&formatter, &registry, &circle);
        assert_eq!(bytes[0], 0);
        assert_eq!(decoded, circle);

        let label = Value::Record(Record::new("Label").with("text", "hi").with("size", 12u16));
        let (bytes, decoded) = roundtrip(&formatter, &registry, &label);
        assert_eq!(bytes[0], 3);
        assert_eq!(decoded.runtime_type(), Some("Label"));
        assert_eq!(decoded, label);

        let (bytes, decoded) = roundtrip(&formatter, &registry, &Value::I32(-1));
        assert_eq!(bytes, vec![4, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(decoded, Value::I32(-1));
    }

    #[test]
    fn test_collection_variants() {
        let registry = FormatterRegistry::new();
        let i32_type = TypeDescriptor::primitive(PrimitiveKind::I32);
        let desc = UnionBuilder::new("Payload")
            .variant(0, TypeDescriptor::sequence(i32_type.clone()))
            .variant(1, TypeDescriptor::string())
            .variant(2, TypeDescriptor::array(i32_type.clone()))
            .variant(3, TypeDescriptor::map(TypeDescriptor::string(), i32_type))
            .build()
            .expect("descriptor");

        let values = [
            (0, Value::Sequence(vec![Value::I32(1), Value::I32(2)])),
            (1, Value::String("text".into())),
            (2, Value::Array(vec![Value::I32(7)])),
            (3, Value::Map(vec![(Value::String("k".into()), Value::I32(9))])),
        ];
        for (tag, value) in values {
            let bytes = registry.serialize(&desc, &value).expect("encode");
            assert_eq!(bytes[0], tag);
            assert_eq!(registry.deserialize(&desc, &bytes).expect("decode"), value);
        }

        let err = registry
            .serialize(&desc, &Value::Set(vec![Value::I32(1)]))
            .unwrap_err();
        assert_eq!(
            err,
            PackError::UnknownUnionVariant {
                union: "Payload".into(),
                type_name: "set".into()
            }
        );
    }

    #[test]
    fn test_null_union() {
        let registry = FormatterRegistry::new();
        let formatter = UnionFormatter::new(shape()).expect("formatter");
        let (bytes, decoded) = roundtrip(&formatter, &registry, &Value::Null);
        assert_eq!(bytes, vec![255]);
        assert!(decoded.is_null());
    }

    #[test]
    fn test_unknown_variant_fails_at_encode() {
        let registry = FormatterRegistry::new();
        let formatter = UnionFormatter::new(shape()).expect("formatter");
        let mut out = Vec::new();
        let err = formatter
            .serialize(
                &mut PackWriter::new(&mut out, &registry),
                &Value::Record(Record::new("Square")),
            )
            .unwrap_err();
        assert_eq!(
            err,
            PackError::UnknownUnionVariant {
                union: "Shape".into(),
                type_name: "Square".into()
            }
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_unknown_tag_fails_at_decode() {
        let registry = FormatterRegistry::new();
        let formatter = UnionFormatter::new(shape()).expect("formatter");
        let mut reader = PackReader::new(&[9, 1, 2, 3], &registry);
        assert_eq!(
            formatter.deserialize(&mut reader).unwrap_err(),
            PackError::UnknownUnionTag {
                union: "Shape".into(),
                tag: 9
            }
        );
    }

    #[test]
    fn test_in_place_only_for_matching_type() {
        let registry = FormatterRegistry::new();
        let formatter = UnionFormatter::new(shape()).expect("formatter");
        let label = Value::Record(Record::new("Label").with("text", "new").with("size", 1u16));
        let mut out = Vec::new();
        formatter
            .serialize(&mut PackWriter::new(&mut out, &registry), &label)
            .expect("encode");

        let mut existing = Value::Record(Record::new("Circle").with("radius", 1.0f64));
        let mut reader = PackReader::new(&out, &registry);
        formatter
            .deserialize_into(&mut reader, &mut existing)
            .expect("decode");
        assert_eq!(existing, label);

        let mut existing = Value::Record(Record::new("Label").with("text", "old").with("size", 9u16));
        let mut reader = PackReader::new(&out, &registry);
        formatter
            .deserialize_into(&mut reader, &mut existing)
            .expect("decode");
        assert_eq!(existing, label);
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Collection binder and generic collection templates.
//!
//! Arrays, sequences, sets, maps and key/value pairs are never given
//! per-type logic: [`bind`] maps their descriptor onto one of a few
//! templates parameterized by the element (or key/value) types.
//!
//! Wire shapes:
//! - array/sequence/set: `[length: i32][element]*`, `-1` when absent;
//!   arrays of blittable elements are one raw block after the header;
//! - map: `[length: i32]([key][value])*`;
//! - pair: `[key][value]`, no header (pairs are value types).

use crate::codec::Formatter;
use crate::error::{PackError, PackResult};
use crate::registry::FormatterRegistry;
use crate::types::{CollectionKind, TypeDescriptor, TypeKind, Value};
use crate::wire::{blittable, PackReader, PackWriter};
use std::sync::Arc;

/// Generic template a collection type binds to.
#[derive(Debug, Clone)]
pub enum Template {
    BlittableArray(Arc<TypeDescriptor>),
    ObjectArray(Arc<TypeDescriptor>),
    Sequence(Arc<TypeDescriptor>),
    Set(Arc<TypeDescriptor>),
    Map {
        key: Arc<TypeDescriptor>,
        value: Arc<TypeDescriptor>,
    },
    Pair {
        key: Arc<TypeDescriptor>,
        value: Arc<TypeDescriptor>,
    },
}

/// Bind a collection descriptor to its template.
pub fn bind(desc: &TypeDescriptor) -> Option<Template> {
    match &desc.kind {
        TypeKind::Array(element) if element.is_blittable() => {
            Some(Template::BlittableArray(element.clone()))
        }
        TypeKind::Array(element) => Some(Template::ObjectArray(element.clone())),
        TypeKind::Collection(CollectionKind::Sequence(element)) => {
            Some(Template::Sequence(element.clone()))
        }
        TypeKind::Collection(CollectionKind::Set(element)) => Some(Template::Set(element.clone())),
        TypeKind::Collection(CollectionKind::Map { key, value }) => Some(Template::Map {
            key: key.clone(),
            value: value.clone(),
        }),
        TypeKind::Pair(key, value) => Some(Template::Pair {
            key: key.clone(),
            value: value.clone(),
        }),
        _ => None,
    }
}

fn expect_elements<'v>(expected: &str, value: &'v Value) -> PackResult<Option<&'v [Value]>> {
    match (expected, value) {
        (_, Value::Null) => Ok(None),
        ("array", Value::Array(items))
        | ("sequence", Value::Sequence(items))
        | ("set", Value::Set(items)) => Ok(Some(items)),
        (_, other) => Err(blittable::mismatch(expected, other)),
    }
}

fn formatter_for(desc: &TypeDescriptor, registry: &FormatterRegistry) -> PackResult<Arc<dyn Formatter>> {
    registry.require(&desc.name)
}

/// Header plus one raw block of blittable elements.
pub(crate) fn write_blittable_array(
    writer: &mut PackWriter<'_>,
    element: &TypeDescriptor,
    value: &Value,
) -> PackResult<()> {
    let Some(items) = expect_elements("array", value)? else {
        writer.write_null_collection_header();
        return Ok(());
    };
    writer.write_collection_header(items.len())?;
    writer.reserve(items.len() * element.blittable_size().unwrap_or(0));
    for item in items {
        writer.write_blittable(element, item)?;
    }
    Ok(())
}

pub(crate) fn read_blittable_array(reader: &mut PackReader<'_>, element: &TypeDescriptor) -> PackResult<Value> {
    let Some(length) = reader.try_read_collection_header()? else {
        return Ok(Value::Null);
    };
    let size = element.blittable_size().unwrap_or(0);
    let total = length
        .checked_mul(size)
        .ok_or(PackError::LengthLimitExceeded {
            length,
            max: usize::MAX / size.max(1),
        })?;
    let bytes = reader.read_bytes(total)?;
    let items = if size == 0 {
        (0..length)
            .map(|_| blittable::read_blittable(element, &[]))
            .collect::<PackResult<Vec<_>>>()?
    } else {
        bytes
            .chunks_exact(size)
            .map(|chunk| blittable::read_blittable(element, chunk))
            .collect::<PackResult<Vec<_>>>()?
    };
    Ok(Value::Array(items))
}

/// Header plus each element through the element formatter, resolved once.
pub(crate) fn write_object_array(
    writer: &mut PackWriter<'_>,
    element: &TypeDescriptor,
    value: &Value,
) -> PackResult<()> {
    write_elements(writer, "array", element, value)
}

/// Decode an array, reusing the destination's elements when the length matches.
pub(crate) fn read_object_array_into(
    reader: &mut PackReader<'_>,
    element: &TypeDescriptor,
    slot: &mut Value,
) -> PackResult<()> {
    let Some(length) = reader.try_read_collection_header()? else {
        *slot = Value::Null;
        return Ok(());
    };
    let formatter = formatter_for(element, reader.registry())?;
    if let Value::Array(items) = slot {
        if items.len() == length {
            for item in items.iter_mut() {
                formatter.deserialize_into(reader, item)?;
            }
            return Ok(());
        }
    }
    let items = read_items(reader, &*formatter, length)?;
    *slot = Value::Array(items);
    Ok(())
}

fn write_elements(
    writer: &mut PackWriter<'_>,
    shape: &str,
    element: &TypeDescriptor,
    value: &Value,
) -> PackResult<()> {
    let Some(items) = expect_elements(shape, value)? else {
        writer.write_null_collection_header();
        return Ok(());
    };
    let formatter = formatter_for(element, writer.registry())?;
    writer.write_collection_header(items.len())?;
    for item in items {
        formatter.serialize(writer, item)?;
    }
    Ok(())
}

fn read_items(
    reader: &mut PackReader<'_>,
    formatter: &dyn Formatter,
    length: usize,
) -> PackResult<Vec<Value>> {
    // Bounded by the remaining input so a forged length cannot over-allocate.
    let mut items = Vec::with_capacity(length.min(reader.remaining()));
    for _ in 0..length {
        items.push(formatter.deserialize(reader)?);
    }
    Ok(items)
}

/// Formatter instantiating a collection [`Template`] for one concrete type.
pub struct CollectionFormatter {
    name: Arc<str>,
    template: Template,
}

impl CollectionFormatter {
    /// Bind `desc`; `None` if it is not a collection type.
    pub fn new(desc: &TypeDescriptor) -> Option<Self> {
        bind(desc).map(|template| Self {
            name: desc.name.clone(),
            template,
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}

impl Formatter for CollectionFormatter {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn serialize(&self, writer: &mut PackWriter<'_>, value: &Value) -> PackResult<()> {
        match &self.template {
            Template::BlittableArray(element) => write_blittable_array(writer, element, value),
            Template::ObjectArray(element) => write_object_array(writer, element, value),
            Template::Sequence(element) => write_elements(writer, "sequence", element, value),
            Template::Set(element) => write_elements(writer, "set", element, value),
            Template::Map { key, value: value_type } => {
                let entries = match value {
                    Value::Null => {
                        writer.write_null_collection_header();
                        return Ok(());
                    }
                    Value::Map(entries) => entries,
                    other => return Err(blittable::mismatch("map", other)),
                };
                let key_formatter = formatter_for(key, writer.registry())?;
                let value_formatter = formatter_for(value_type, writer.registry())?;
                writer.write_collection_header(entries.len())?;
                for (k, v) in entries {
                    key_formatter.serialize(writer, k)?;
                    value_formatter.serialize(writer, v)?;
                }
                Ok(())
            }
            Template::Pair { key, value: value_type } => {
                let Value::Pair(pair) = value else {
                    return Err(blittable::mismatch("pair", value));
                };
                writer.write_value(key, &pair.0)?;
                writer.write_value(value_type, &pair.1)
            }
        }
    }

    fn deserialize_into(&self, reader: &mut PackReader<'_>, value: &mut Value) -> PackResult<()> {
        match &self.template {
            Template::BlittableArray(element) => {
                *value = read_blittable_array(reader, element)?;
            }
            Template::ObjectArray(element) => read_object_array_into(reader, element, value)?,
            Template::Sequence(element) => {
                *value = match reader.try_read_collection_header()? {
                    None => Value::Null,
                    Some(length) => {
                        let formatter = formatter_for(element, reader.registry())?;
                        Value::Sequence(read_items(reader, &*formatter, length)?)
                    }
                };
            }
            Template::Set(element) => {
                *value = match reader.try_read_collection_header()? {
                    None => Value::Null,
                    Some(length) => {
                        let formatter = formatter_for(element, reader.registry())?;
                        let mut items: Vec<Value> = Vec::with_capacity(length.min(reader.remaining()));
                        for _ in 0..length {
                            let item = formatter.deserialize(reader)?;
                            if !items.contains(&item) {
                                items.push(item);
                            }
                        }
                        Value::Set(items)
                    }
                };
            }
            Template::Map { key, value: value_type } => {
                *value = match reader.try_read_collection_header()? {
                    None => Value::Null,
                    Some(length) => {
                        let key_formatter = formatter_for(key, reader.registry())?;
                        let value_formatter = formatter_for(value_type, reader.registry())?;
                        let mut entries = Vec::with_capacity(length.min(reader.remaining()));
                        for _ in 0..length {
                            let k = key_formatter.deserialize(reader)?;
                            let v = value_formatter.deserialize(reader)?;
                            entries.push((k, v));
                        }
                        Value::Map(entries)
                    }
                };
            }
            Template::Pair { key, value: value_type } => {
                let k = reader.read_value(key)?;
                let v = reader.read_value(value_type)?;
                *value = Value::Pair(Box::new((k, v)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrimitiveKind, Record, RecordBuilder};

    fn roundtrip(registry: &FormatterRegistry, desc: &TypeDescriptor, value: &Value) -> (Vec<u8>, Value) {
        let formatter = CollectionFormatter::new(desc).expect("collection type");
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
    fn test_binder_templates() {
        let i32_type = TypeDescriptor::primitive(PrimitiveKind::I32);
        assert!(matches!(
            bind(&TypeDescriptor::array(i32_type.clone())),
            Some(Template::BlittableArray(_))
        ));
        assert!(matches!(
            bind(&TypeDescriptor::array(TypeDescriptor::string())),
            Some(Template::ObjectArray(_))
        ));
        assert!(matches!(
            bind(&TypeDescriptor::map(TypeDescriptor::string(), i32_type.clone())),
            Some(Template::Map { .. })
        ));
        assert!(bind(&i32_type).is_none());
    }

    #[test]
    fn test_blittable_array_is_one_block() {
        let registry = FormatterRegistry::new();
        let desc = TypeDescriptor::array(TypeDescriptor::primitive(PrimitiveKind::U16));
        let value = Value::Array(vec![Value::U16(1), Value::U16(2)]);
        let (bytes, decoded) = roundtrip(&registry, &desc, &value);
        assert_eq!(bytes, vec![2, 0, 0, 0, 1, 0, 2, 0]);
        assert_eq!(decoded, value);

        let (bytes, decoded) = roundtrip(&registry, &desc, &Value::Null);
        assert_eq!(bytes, vec![0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(decoded.is_null());
    }

    #[test]
    fn test_sequence_of_strings() {
        let registry = FormatterRegistry::new();
        let desc = TypeDescriptor::sequence(TypeDescriptor::string());
        let value = Value::Sequence(vec![Value::from("a"), Value::Null, Value::from("bc")]);
        let (_, decoded) = roundtrip(&registry, &desc, &value);
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_set_deduplicates_on_decode() {
        let registry = FormatterRegistry::new();
        let desc = TypeDescriptor::set(TypeDescriptor::primitive(PrimitiveKind::I32));
        let value = Value::Set(vec![Value::I32(1), Value::I32(2), Value::I32(1)]);
        let (_, decoded) = roundtrip(&registry, &desc, &value);
        assert_eq!(decoded, Value::Set(vec![Value::I32(1), Value::I32(2)]));
    }

    #[test]
    fn test_map_and_pair() {
        let registry = FormatterRegistry::new();
        let map = TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::primitive(PrimitiveKind::U8));
        let value = Value::Map(vec![(Value::from("k"), Value::U8(7))]);
        let (bytes, decoded) = roundtrip(&registry, &map, &value);
        assert_eq!(bytes, vec![1, 0, 0, 0, 1, 0, 0, 0, b'k', 7]);
        assert_eq!(decoded, value);

        let pair = TypeDescriptor::pair(TypeDescriptor::string(), TypeDescriptor::primitive(PrimitiveKind::U8));
        let value = Value::Pair(Box::new((Value::from("k"), Value::U8(7))));
        let (bytes, decoded) = roundtrip(&registry, &pair, &value);
        assert_eq!(bytes, vec![1, 0, 0, 0, b'k', 7]);
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_shape_mismatch() {
        let registry = FormatterRegistry::new();
        let formatter =
            CollectionFormatter::new(&TypeDescriptor::sequence(TypeDescriptor::string())).expect("collection");
        let mut out = Vec::new();
        let err = formatter
            .serialize(
                &mut PackWriter::new(&mut out, &registry),
                &Value::Set(vec![]),
            )
            .unwrap_err();
        assert_eq!(
            err,
            PackError::TypeMismatch {
                expected: "sequence".into(),
                found: "set".into()
            }
        );
    }

    #[test]
    fn test_object_array_reuses_elements() {
        let registry = FormatterRegistry::new();
        let item = RecordBuilder::new("Item")
            .field("name", TypeDescriptor::string())
            .build()
            .expect("descriptor");
        registry.register_type(&item);
        let element = item.clone();
        let value = Value::Array(vec![Value::Record(Record::new("Item").with("name", "x"))]);

        let mut out = Vec::new();
        write_object_array(&mut PackWriter::new(&mut out, &registry), &element, &value).expect("encode");

        let mut existing = Value::Array(vec![Value::Record(Record::new("Item").with("name", "old"))]);
        let mut reader = PackReader::new(&out, &registry);
        read_object_array_into(&mut reader, &element, &mut existing).expect("decode");
        assert_eq!(existing, value);
    }

    #[test]
    fn test_unregistered_element_type() {
        let registry = FormatterRegistry::new();
        let element = TypeDescriptor::no_codec("Socket");
        let mut out = Vec::new();
        let err = write_object_array(
            &mut PackWriter::new(&mut out, &registry),
            &element,
            &Value::Array(vec![Value::Null]),
        )
        .unwrap_err();
        assert_eq!(err, PackError::FormatterNotRegistered("Socket".into()));
    }
}

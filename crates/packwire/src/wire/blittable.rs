// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Raw-byte encoding of blittable values.
//!
//! Scalars are little-endian, `bool` is one byte, `char` is its scalar value
//! as a `u32`. A blittable record is the concatenation of its members' raw
//! bytes in member order, with no header and no padding.

use crate::error::{PackError, PackResult};
use crate::types::{PrimitiveKind, Record, TypeDescriptor, TypeKind, Value};

/// Generate little-endian scalar arms for `write_primitive`/`read_primitive`.
macro_rules! le_scalars {
    ($($kind:ident => $variant:ident($ty:ty)),* $(,)?) => {
        fn write_scalar(out: &mut Vec<u8>, kind: PrimitiveKind, value: &Value) -> PackResult<()> {
            match (kind, value) {
                $((PrimitiveKind::$kind, Value::$variant(v)) => out.extend_from_slice(&v.to_le_bytes()),)*
                (PrimitiveKind::Bool, Value::Bool(v)) => out.push(u8::from(*v)),
                (PrimitiveKind::Char, Value::Char(c)) => out.extend_from_slice(&u32::from(*c).to_le_bytes()),
                (kind, other) => return Err(mismatch(kind.name(), other)),
            }
            Ok(())
        }

        fn read_scalar(kind: PrimitiveKind, bytes: &[u8]) -> PackResult<Value> {
            Ok(match kind {
                $(PrimitiveKind::$kind => {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    Value::$variant(<$ty>::from_le_bytes(raw))
                })*
                PrimitiveKind::Bool => Value::Bool(bytes[0] != 0),
                PrimitiveKind::Char => {
                    let mut raw = [0u8; 4];
                    raw.copy_from_slice(bytes);
                    let scalar = u32::from_le_bytes(raw);
                    let c = char::from_u32(scalar).ok_or_else(|| {
                        PackError::InvalidData(format!("invalid char scalar 0x{:X}", scalar))
                    })?;
                    Value::Char(c)
                }
            })
        }
    };
}

le_scalars! {
    U8 => U8(u8),
    U16 => U16(u16),
    U32 => U32(u32),
    U64 => U64(u64),
    I8 => I8(i8),
    I16 => I16(i16),
    I32 => I32(i32),
    I64 => I64(i64),
    F32 => F32(f32),
    F64 => F64(f64),
}

pub(crate) fn mismatch(expected: &str, found: &Value) -> PackError {
    PackError::TypeMismatch {
        expected: expected.to_string(),
        found: found.shape().to_string(),
    }
}

/// Append the raw bytes of a scalar.
pub fn write_primitive(out: &mut Vec<u8>, kind: PrimitiveKind, value: &Value) -> PackResult<()> {
    write_scalar(out, kind, value)
}

/// Decode a scalar from exactly `kind.size()` bytes.
pub fn read_primitive(kind: PrimitiveKind, bytes: &[u8]) -> PackResult<Value> {
    expect_len(bytes, kind.size())?;
    read_scalar(kind, bytes)
}

fn expect_len(bytes: &[u8], size: usize) -> PackResult<()> {
    if bytes.len() < size {
        return Err(PackError::TruncatedInput {
            offset: 0,
            need: size,
            have: bytes.len(),
        });
    }
    if bytes.len() > size {
        return Err(PackError::InvalidData(format!(
            "{} bytes given for a {}-byte blittable value",
            bytes.len(),
            size
        )));
    }
    Ok(())
}

/// Append the raw bytes of a blittable value (scalar or blittable record).
///
/// Record fields missing from the value are written as their defaults.
pub fn write_blittable(out: &mut Vec<u8>, desc: &TypeDescriptor, value: &Value) -> PackResult<()> {
    match &desc.kind {
        TypeKind::Primitive(kind) => write_scalar(out, *kind, value),
        TypeKind::Record(record) if record.is_blittable() => {
            let fields = match value {
                Value::Record(r) => r,
                other => return Err(mismatch(&desc.name, other)),
            };
            for (i, member) in record.members.iter().enumerate() {
                let Some(member_type) = &member.type_desc else {
                    continue;
                };
                match fields.field_hinted(i, &member.name) {
                    Some(field) => write_blittable(out, member_type, field)?,
                    None => write_blittable(out, member_type, &member.default_value())?,
                }
            }
            Ok(())
        }
        _ => Err(PackError::TypeMismatch {
            expected: "blittable type".to_string(),
            found: desc.name.to_string(),
        }),
    }
}

/// Decode a blittable value from exactly its raw size in bytes.
pub fn read_blittable(desc: &TypeDescriptor, bytes: &[u8]) -> PackResult<Value> {
    match &desc.kind {
        TypeKind::Primitive(kind) => read_primitive(*kind, bytes),
        TypeKind::Record(record) if record.is_blittable() => {
            expect_len(bytes, desc.blittable_size().unwrap_or(0))?;
            let mut out = Record::new(desc.name.clone());
            let mut offset = 0;
            for member in &record.members {
                let Some(member_type) = &member.type_desc else {
                    continue;
                };
                let size = member_type.blittable_size().unwrap_or(0);
                let value = read_blittable(member_type, &bytes[offset..offset + size])?;
                out = out.with(&member.name, value);
                offset += size;
            }
            Ok(Value::Record(out))
        }
        _ => Err(PackError::TypeMismatch {
            expected: "blittable type".to_string(),
            found: desc.name.to_string(),
        }),
    }
}

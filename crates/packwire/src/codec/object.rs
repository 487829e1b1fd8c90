// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared machinery of the strict and version-tolerant object codecs.
//!
//! Decoding always goes through a slot vector, one [`Value`] per member
//! slot, and is reconciled into the destination afterwards:
//!
//! - construct arm (destination absent, of another type, or the type has a
//!   parameterized constructor): a fresh record is built; constructor-bound
//!   and settable members take their slot, the rest keep their defaults;
//! - update arm: settable members are assigned in place, read-only members
//!   keep their current value.

use crate::codec::collection;
use crate::codec::{build_formatter, Formatter};
use crate::error::{PackError, PackResult};
use crate::plan::{EncodingPlan, FieldKind, PlanMode};
use crate::types::{MemberDescriptor, Record, RecordDescriptor, TypeDescriptor, TypeKind, Value};
use crate::wire::{blittable, PackReader, PackWriter};
use std::borrow::Cow;
use std::sync::Arc;

static NULL: Value = Value::Null;

/// Per-member encode/decode strategy, resolved once when the codec is built.
pub(crate) enum FieldCodec {
    Blittable(Arc<TypeDescriptor>),
    String,
    BlittableArray(Arc<TypeDescriptor>),
    ObjectArray(Arc<TypeDescriptor>),
    Nested(Arc<dyn Formatter>),
    Opaque(Arc<TypeDescriptor>),
    Padding,
}

impl FieldCodec {
    fn new(member: &MemberDescriptor) -> Self {
        let Some(desc) = member.type_desc.clone() else {
            return Self::Padding;
        };
        match member.kind {
            FieldKind::Blittable => Self::Blittable(desc),
            FieldKind::String => Self::String,
            FieldKind::BlittableArray | FieldKind::ObjectArray => {
                let element = match &desc.kind {
                    TypeKind::Array(element) => element.clone(),
                    _ => return Self::Opaque(desc),
                };
                if member.kind == FieldKind::BlittableArray {
                    Self::BlittableArray(element)
                } else {
                    Self::ObjectArray(element)
                }
            }
            FieldKind::NestedCodec => match build_formatter(&desc) {
                Some(formatter) => Self::Nested(formatter),
                None => Self::Opaque(desc),
            },
            FieldKind::Opaque => Self::Opaque(desc),
            FieldKind::Padding => Self::Padding,
        }
    }

    pub(crate) fn encode(&self, writer: &mut PackWriter<'_>, value: &Value) -> PackResult<()> {
        match self {
            Self::Blittable(desc) => writer.write_blittable(desc, value),
            Self::String => writer.write_string(value),
            Self::BlittableArray(element) => collection::write_blittable_array(writer, element, value),
            Self::ObjectArray(element) => collection::write_object_array(writer, element, value),
            Self::Nested(formatter) => formatter.serialize(writer, value),
            Self::Opaque(desc) => writer.write_value(desc, value),
            Self::Padding => Ok(()),
        }
    }

    pub(crate) fn decode_into(&self, reader: &mut PackReader<'_>, slot: &mut Value) -> PackResult<()> {
        match self {
            Self::Blittable(desc) => {
                *slot = reader.read_blittable(desc)?;
                Ok(())
            }
            Self::String => {
                *slot = reader.read_string()?;
                Ok(())
            }
            Self::BlittableArray(element) => {
                *slot = collection::read_blittable_array(reader, element)?;
                Ok(())
            }
            Self::ObjectArray(element) => collection::read_object_array_into(reader, element, slot),
            Self::Nested(formatter) => formatter.deserialize_into(reader, slot),
            Self::Opaque(desc) => reader.read_value_into(desc, slot),
            Self::Padding => Ok(()),
        }
    }
}

/// Planned record layout shared by both object codecs.
pub(crate) struct ObjectLayout {
    pub(crate) desc: Arc<TypeDescriptor>,
    pub(crate) record: RecordDescriptor,
    pub(crate) plan: EncodingPlan,
    pub(crate) fields: Vec<FieldCodec>,
    /// Position of each member among live members (record field hint).
    live_index: Vec<usize>,
}

impl ObjectLayout {
    pub(crate) fn new(desc: Arc<TypeDescriptor>, mode: PlanMode) -> PackResult<Self> {
        let record = desc
            .as_record()
            .cloned()
            .ok_or_else(|| PackError::TypeMismatch {
                expected: "record type".to_string(),
                found: desc.name.to_string(),
            })?;
        let plan = EncodingPlan::new(&desc.name, &record, mode);
        let fields = record.members.iter().map(FieldCodec::new).collect();
        let mut live = 0;
        let live_index = record
            .members
            .iter()
            .map(|m| {
                let hint = live;
                if !m.is_padding() {
                    live += 1;
                }
                hint
            })
            .collect();
        Ok(Self {
            desc,
            record,
            plan,
            fields,
            live_index,
        })
    }

    pub(crate) fn type_name(&self) -> &str {
        &self.desc.name
    }

    pub(crate) fn member_count(&self) -> usize {
        self.record.members.len()
    }

    /// Record payload of a value being encoded.
    pub(crate) fn expect_record<'v>(&self, value: &'v Value) -> PackResult<&'v Record> {
        match value {
            Value::Record(r) if r.type_name() == self.type_name() => Ok(r),
            Value::Record(r) => Err(PackError::TypeMismatch {
                expected: self.type_name().to_string(),
                found: r.type_name().to_string(),
            }),
            other => Err(blittable::mismatch(self.type_name(), other)),
        }
    }

    /// Value of member `index`, or its default when the record lacks it.
    pub(crate) fn field_or_default<'v>(&self, record: &'v Record, index: usize) -> Cow<'v, Value> {
        let member = &self.record.members[index];
        match record.field_hinted(self.live_index[index], &member.name) {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(member.default_value()),
        }
    }

    /// Write `len` blittable members starting at `start` as one batch,
    /// optionally preceded by the object header in the same reservation.
    pub(crate) fn encode_run(
        &self,
        writer: &mut PackWriter<'_>,
        record: &Record,
        start: usize,
        len: usize,
        size: usize,
        header: Option<usize>,
    ) -> PackResult<()> {
        writer.reserve(size + usize::from(header.is_some()));
        if let Some(count) = header {
            writer.write_object_header(count)?;
        }
        for index in start..start + len {
            self.fields[index].encode(writer, &self.field_or_default(record, index))?;
        }
        Ok(())
    }

    /// Read `len` blittable members starting at `start` with one bounds check.
    pub(crate) fn decode_run(
        &self,
        reader: &mut PackReader<'_>,
        slots: &mut [Value],
        start: usize,
        len: usize,
    ) -> PackResult<()> {
        let size: usize = (start..start + len)
            .map(|i| self.plan.member_size(i).unwrap_or(0))
            .sum();
        let bytes = reader.read_bytes(size)?;
        let mut offset = 0;
        for index in start..start + len {
            let FieldCodec::Blittable(desc) = &self.fields[index] else {
                continue;
            };
            let member_size = self.plan.member_size(index).unwrap_or(0);
            slots[index] = blittable::read_blittable(desc, &bytes[offset..offset + member_size])?;
            offset += member_size;
        }
        Ok(())
    }

    fn takes_update_arm(&self, existing: &Value) -> bool {
        !self.record.has_parameterized_constructor()
            && matches!(existing, Value::Record(r) if r.type_name() == self.type_name())
    }

    /// What the pre-decode hook observes: the destination on the update arm,
    /// `Null` when a fresh record will be constructed.
    pub(crate) fn observed<'v>(&self, existing: &'v Value) -> &'v Value {
        if self.takes_update_arm(existing) {
            existing
        } else {
            &NULL
        }
    }

    /// Initial slot values and the arm to reconcile with.
    ///
    /// On the update arm, settable members move their current value into the
    /// slot so nested codecs can decode into it in place.
    pub(crate) fn begin_decode(&self, existing: &mut Value) -> (Vec<Value>, bool) {
        let update = self.takes_update_arm(existing);
        let mut slots = Vec::with_capacity(self.record.members.len());
        for (index, member) in self.record.members.iter().enumerate() {
            let current = match &mut *existing {
                Value::Record(r) if update && member.settable && !member.is_padding() => r
                    .field_hinted_mut(self.live_index[index], &member.name)
                    .map(std::mem::take),
                _ => None,
            };
            slots.push(current.unwrap_or_else(|| member.default_value()));
        }
        (slots, update)
    }

    /// Reset slots the stream did not carry to their defaults.
    pub(crate) fn backfill(&self, slots: &mut [Value], from: usize) {
        for (slot, member) in slots.iter_mut().zip(&self.record.members).skip(from) {
            *slot = member.default_value();
        }
    }

    /// Reconcile decoded slots into the destination.
    pub(crate) fn finish_decode(&self, existing: &mut Value, slots: Vec<Value>, update: bool) {
        if update {
            if let Value::Record(target) = existing {
                for (index, (member, slot)) in self.record.members.iter().zip(slots).enumerate() {
                    if member.settable && !member.is_padding() {
                        target.put_hinted(self.live_index[index], &member.name, slot);
                    }
                }
                return;
            }
        }

        let fields = self
            .record
            .members
            .iter()
            .zip(slots)
            .filter(|(member, _)| !member.is_padding())
            .map(|(member, slot)| {
                let value = if member.constructor_bound || member.settable {
                    slot
                } else {
                    member.default_value()
                };
                (member.name.clone(), value)
            })
            .collect();
        *existing = Value::Record(Record::from_fields(self.desc.name.clone(), fields));
    }

    /// Destination for the null object header.
    pub(crate) fn null_value(&self) -> Value {
        if self.record.value_type {
            Value::Record(Record::defaults(&self.desc))
        } else {
            Value::Null
        }
    }

    /// Encode-side check for `Null`.
    pub(crate) fn reject_null_value_type(&self) -> PackResult<()> {
        if self.record.value_type {
            return Err(PackError::TypeMismatch {
                expected: self.type_name().to_string(),
                found: "null".to_string(),
            });
        }
        Ok(())
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Strict object codec for fixed-schema records.
//!
//! Wire shape: `[count][field_0]..[field_{count-1}]`, `count` one byte,
//! [`NULL_OBJECT_HEADER`](crate::config::NULL_OBJECT_HEADER) for an absent
//! reference value.
//!
//! Decode reconciliation against the local member count `N`:
//! - `count == N`: every field is decoded;
//! - `count < N`: the first `count` fields are decoded and the rest are
//!   backfilled with defaults. This only backfills; it never drops wire data;
//! - `count > N`: [`PackError::SchemaCountMismatch`], since trailing fields
//!   carry no lengths to skip them by.

use crate::codec::object::ObjectLayout;
use crate::codec::Formatter;
use crate::error::{PackError, PackResult};
use crate::plan::{EncodingPlan, PlanMode, Run};
use crate::types::{TypeDescriptor, Value};
use crate::wire::{PackReader, PackWriter};
use std::sync::Arc;

/// Formatter for [`TypeCategory::Record`](crate::types::TypeCategory::Record) types.
pub struct StrictFormatter {
    layout: ObjectLayout,
}

impl StrictFormatter {
    pub fn new(desc: Arc<TypeDescriptor>) -> PackResult<Self> {
        Ok(Self {
            layout: ObjectLayout::new(desc, PlanMode::Direct)?,
        })
    }

    /// Encoding plan this formatter replays.
    pub fn plan(&self) -> &EncodingPlan {
        &self.layout.plan
    }

    fn encode_fields(&self, writer: &mut PackWriter<'_>, value: &Value) -> PackResult<()> {
        let layout = &self.layout;
        let record = layout.expect_record(value)?;
        let count = layout.member_count();

        if !layout.plan.fused_header() {
            writer.write_object_header(count)?;
        }
        for (position, run) in layout.plan.runs().iter().enumerate() {
            match *run {
                Run::Blittable { start, len, size } => {
                    let header = (position == 0 && layout.plan.fused_header()).then_some(count);
                    layout.encode_run(writer, record, start, len, size, header)?;
                }
                Run::Single { index, .. } => {
                    let field = layout.field_or_default(record, index);
                    layout.fields[index].encode(writer, &field)?;
                }
            }
        }
        Ok(())
    }

    fn decode_fields(
        &self,
        reader: &mut PackReader<'_>,
        count: usize,
        value: &mut Value,
    ) -> PackResult<()> {
        let layout = &self.layout;
        let local = layout.member_count();
        if count > local {
            return Err(PackError::SchemaCountMismatch {
                type_name: layout.type_name().to_string(),
                expected: local,
                actual: count,
            });
        }
        if count < local {
            log::debug!(
                "[strict] {}: stream carries {} of {} fields, backfilling defaults",
                layout.type_name(),
                count,
                local
            );
        }

        let (mut slots, update) = layout.begin_decode(value);
        for run in layout.plan.runs() {
            if run.start() >= count {
                break;
            }
            match *run {
                Run::Blittable { start, len, .. } => {
                    let len = len.min(count - start);
                    layout.decode_run(reader, &mut slots, start, len)?;
                }
                Run::Single { index, .. } => {
                    layout.fields[index].decode_into(reader, &mut slots[index])?;
                }
            }
        }
        layout.backfill(&mut slots, count);
        layout.finish_decode(value, slots, update);
        Ok(())
    }
}

impl Formatter for StrictFormatter {
    fn type_name(&self) -> &str {
        self.layout.type_name()
    }

    fn serialize(&self, writer: &mut PackWriter<'_>, value: &Value) -> PackResult<()> {
        let hooks = &self.layout.record.hooks;
        hooks.serializing(value);
        if value.is_null() {
            self.layout.reject_null_value_type()?;
            writer.write_null_object_header();
        } else {
            self.encode_fields(writer, value)?;
        }
        hooks.serialized(value);
        Ok(())
    }

    fn deserialize_into(&self, reader: &mut PackReader<'_>, value: &mut Value) -> PackResult<()> {
        let hooks = &self.layout.record.hooks;
        hooks.deserializing(self.layout.observed(value));
        match reader.try_read_object_header()? {
            None => *value = self.layout.null_value(),
            Some(count) => self.decode_fields(reader, usize::from(count), value)?,
        }
        hooks.deserialized(value);
        Ok(())
    }
}

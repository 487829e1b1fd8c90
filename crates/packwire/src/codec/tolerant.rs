// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Version-tolerant object codec.
//!
//! Wire shape: `[N][delta_0]..[delta_{N-1}][payload]` where `N` is the
//! writer's member count (one byte) and each `delta_i` is the varint byte
//! length of field `i` in the payload. Padding slots record delta `0`.
//!
//! The deltas let a reader built against another schema revision skip what
//! it does not know:
//! - fields beyond the local member count, and fields landing on a local
//!   padding slot, are skipped by exactly their delta;
//! - local fields the stream does not carry (index `>= N`, or delta `0`)
//!   keep their defaults.
//!
//! Fields are staged one at a time in a pooled scratch buffer, so each
//! length is known before the header is emitted.

use crate::codec::object::ObjectLayout;
use crate::codec::Formatter;
use crate::error::{PackError, PackResult};
use crate::plan::{EncodingPlan, FieldKind, PlanMode, Run};
use crate::types::{TypeDescriptor, Value};
use crate::wire::{varint, PackReader, PackWriter};
use std::sync::Arc;

/// Formatter for version-tolerant records.
pub struct TolerantFormatter {
    layout: ObjectLayout,
}

impl TolerantFormatter {
    pub fn new(desc: Arc<TypeDescriptor>) -> PackResult<Self> {
        Ok(Self {
            layout: ObjectLayout::new(desc, PlanMode::Staged)?,
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
        let registry = writer.registry();

        let mut staging = registry.staging_pool().acquire();
        let mut lengths = Vec::with_capacity(count);
        {
            let mut staged = PackWriter::new(&mut staging, registry);
            for run in layout.plan.runs() {
                match *run {
                    Run::Blittable { start, len, size } => {
                        layout.encode_run(&mut staged, record, start, len, size, None)?;
                        lengths.extend((start..start + len).map(|i| layout.plan.member_size(i).unwrap_or(0)));
                    }
                    Run::Single { index, .. } => {
                        let before = staged.position();
                        let field = layout.field_or_default(record, index);
                        layout.fields[index].encode(&mut staged, &field)?;
                        lengths.push(staged.position() - before);
                    }
                }
            }
        }

        let header: usize = lengths.iter().map(|&len| varint::varint_len(len as u64)).sum();
        writer.reserve(1 + header + staging.len());
        writer.write_object_header(count)?;
        for length in lengths {
            writer.write_varint(length as u64);
        }
        writer.write_bytes(&staging);
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

        let mut deltas = Vec::with_capacity(count);
        for _ in 0..count {
            let delta = reader.read_varint()?;
            let delta = usize::try_from(delta)
                .map_err(|_| PackError::InvalidData(format!("field delta {} too large", delta)))?;
            deltas.push(delta);
        }
        if count != local {
            log::debug!(
                "[tolerant] {}: stream has {} fields, local schema {}",
                layout.type_name(),
                count,
                local
            );
        }

        let (mut slots, update) = layout.begin_decode(value);
        let shared = count.min(local);
        for run in layout.plan.runs() {
            if run.start() >= shared {
                break;
            }
            match *run {
                Run::Blittable { start, len, .. } => {
                    let end = (start + len).min(shared);
                    self.decode_blittable_span(reader, &mut slots, &deltas, start, end)?;
                }
                Run::Single { index, kind } => {
                    let delta = deltas[index];
                    if kind == FieldKind::Padding {
                        reader.advance(delta)?;
                        continue;
                    }
                    if delta == 0 {
                        // Absent in the writer's revision.
                        continue;
                    }
                    let before = reader.offset();
                    layout.fields[index].decode_into(reader, &mut slots[index])?;
                    let consumed = reader.offset() - before;
                    if consumed != delta {
                        return Err(self.length_mismatch(index, delta, consumed));
                    }
                }
            }
        }

        for (index, delta) in deltas.iter().enumerate().skip(local) {
            log::trace!(
                "[tolerant] {}: skipping unknown field {} ({} bytes)",
                layout.type_name(),
                index,
                delta
            );
            reader.advance(*delta)?;
        }

        layout.backfill(&mut slots, shared);
        layout.finish_decode(value, slots, update);
        Ok(())
    }

    /// Decode blittable members `start..end`; one batched read when every
    /// recorded delta matches the member's fixed size.
    fn decode_blittable_span(
        &self,
        reader: &mut PackReader<'_>,
        slots: &mut [Value],
        deltas: &[usize],
        start: usize,
        end: usize,
    ) -> PackResult<()> {
        let layout = &self.layout;
        let exact = (start..end).all(|i| layout.plan.member_size(i) == Some(deltas[i]));
        if exact {
            return layout.decode_run(reader, slots, start, end - start);
        }
        for index in start..end {
            let size = layout.plan.member_size(index).unwrap_or(0);
            match deltas[index] {
                0 => {}
                delta if delta == size => layout.decode_run(reader, slots, index, 1)?,
                delta => return Err(self.length_mismatch(index, delta, size)),
            }
        }
        Ok(())
    }

    fn length_mismatch(&self, index: usize, expected: usize, actual: usize) -> PackError {
        PackError::FieldLengthMismatch {
            type_name: self.layout.type_name().to_string(),
            index,
            expected,
            actual,
        }
    }
}

impl Formatter for TolerantFormatter {
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

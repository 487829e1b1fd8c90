// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Layout planning: groups classified members into encode/decode runs.
//!
//! Consecutive blittable members are merged greedily into runs of at most
//! [`MAX_RUN_LENGTH`] members; every other member becomes a single-field
//! run. In direct mode the object header is fused into the first run when
//! that run is blittable, so header and run go out in one buffer reservation.
//! Staged mode (version-tolerant records) never fuses: each field must be
//! measured on its own.

use crate::config::MAX_RUN_LENGTH;
use crate::plan::FieldKind;
use crate::types::RecordDescriptor;
use std::fmt;

/// How the codec emits fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
    /// Fields are written straight into the output buffer.
    Direct,
    /// Fields are written into a staging buffer and measured.
    Staged,
}

/// One step of an encoding plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    /// `len` consecutive blittable members starting at `start`, `size` bytes total.
    Blittable {
        start: usize,
        len: usize,
        size: usize,
    },
    /// A member encoded on its own.
    Single { index: usize, kind: FieldKind },
}

impl Run {
    /// Index of the first member covered.
    pub fn start(&self) -> usize {
        match self {
            Self::Blittable { start, .. } => *start,
            Self::Single { index, .. } => *index,
        }
    }

    /// Number of members covered; at least one.
    pub fn member_count(&self) -> usize {
        match self {
            Self::Blittable { len, .. } => *len,
            Self::Single { .. } => 1,
        }
    }

    /// Index one past the last member covered.
    pub fn end(&self) -> usize {
        self.start() + self.member_count()
    }
}

/// Ordered runs covering every member slot of a record exactly once.
#[derive(Debug, Clone)]
pub struct EncodingPlan {
    type_name: String,
    mode: PlanMode,
    runs: Vec<Run>,
    /// Raw size of each blittable member (`None` otherwise).
    sizes: Vec<Option<usize>>,
    /// Member names for diagnostics (empty for padding).
    names: Vec<String>,
    fused_header: bool,
}

impl EncodingPlan {
    /// Plan a record's members.
    pub fn new(type_name: &str, record: &RecordDescriptor, mode: PlanMode) -> Self {
        let sizes: Vec<Option<usize>> = record
            .members
            .iter()
            .map(|m| {
                if m.kind.is_blittable() {
                    m.type_desc.as_ref().and_then(|t| t.blittable_size())
                } else {
                    None
                }
            })
            .collect();

        let mut runs = Vec::new();
        let mut index = 0;
        while index < record.members.len() {
            let member = &record.members[index];
            match sizes[index] {
                Some(_) => {
                    let start = index;
                    let mut size = 0;
                    while index < record.members.len() && index - start < MAX_RUN_LENGTH {
                        match sizes[index] {
                            Some(s) => size += s,
                            None => break,
                        }
                        index += 1;
                    }
                    runs.push(Run::Blittable {
                        start,
                        len: index - start,
                        size,
                    });
                }
                None => {
                    runs.push(Run::Single {
                        index,
                        kind: member.kind,
                    });
                    index += 1;
                }
            }
        }

        let fused_header =
            mode == PlanMode::Direct && matches!(runs.first(), Some(Run::Blittable { .. }));

        let names = record.members.iter().map(|m| m.name.to_string()).collect();

        log::trace!(
            "[plan] {} -> {} runs over {} members (fused_header={})",
            type_name,
            runs.len(),
            record.members.len(),
            fused_header
        );

        Self {
            type_name: type_name.to_string(),
            mode,
            runs,
            sizes,
            names,
            fused_header,
        }
    }

    /// Planned type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Plan mode.
    pub fn mode(&self) -> PlanMode {
        self.mode
    }

    /// Runs in member order.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Number of member slots covered (the header count N).
    pub fn member_count(&self) -> usize {
        self.sizes.len()
    }

    /// Raw size of a blittable member.
    pub fn member_size(&self, index: usize) -> Option<usize> {
        self.sizes.get(index).copied().flatten()
    }

    /// True if the object header is written together with the first run.
    pub fn fused_header(&self) -> bool {
        self.fused_header
    }
}

impl fmt::Display for EncodingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({:?}, {} members{})",
            self.type_name,
            self.mode,
            self.member_count(),
            if self.fused_header { ", fused header" } else { "" }
        )?;
        for run in &self.runs {
            match run {
                Run::Blittable { start, len, size } => {
                    let members = self.names[*start..start + len].join(", ");
                    writeln!(f, "  blittable[{}..{}] {} bytes: {}", start, start + len, size, members)?;
                }
                Run::Single { index, kind } => {
                    let name = &self.names[*index];
                    if *kind == FieldKind::Padding {
                        writeln!(f, "  padding[{}]", index)?;
                    } else {
                        writeln!(f, "  {:?}[{}]: {}", kind, index, name)?;
                    }
                }
            }
        }
        Ok(())
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field classification.
//!
//! Assigns each record member the encoding strategy its declared type needs.
//! Classification is pure: it depends only on the descriptor.

use crate::types::{TypeDescriptor, TypeKind};

/// Encoding strategy of one record member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Fixed-size raw bytes; eligible for batched runs.
    Blittable,
    /// Length-prefixed UTF-8 string.
    String,
    /// Array whose elements are blittable (one raw copy per array).
    BlittableArray,
    /// Array whose elements go through a formatter each.
    ObjectArray,
    /// Non-blittable record encoded by its own object codec.
    NestedCodec,
    /// Anything else, resolved through the registry at encode/decode time.
    Opaque,
    /// Placeholder for an order index absent from this schema revision.
    Padding,
}

impl FieldKind {
    /// True if the field may join a batched blittable run.
    pub fn is_blittable(&self) -> bool {
        matches!(self, Self::Blittable)
    }
}

/// Classify a member's declared type.
///
/// [`FieldKind::Padding`] is never returned here; padding slots are created
/// by the descriptor builder for missing order indices.
pub fn classify(desc: &TypeDescriptor) -> FieldKind {
    if desc.is_blittable() {
        return FieldKind::Blittable;
    }
    match &desc.kind {
        TypeKind::String => FieldKind::String,
        TypeKind::Array(element) if element.is_blittable() => FieldKind::BlittableArray,
        TypeKind::Array(_) => FieldKind::ObjectArray,
        TypeKind::Record(_) => FieldKind::NestedCodec,
        TypeKind::Primitive(_)
        | TypeKind::Union(_)
        | TypeKind::Collection(_)
        | TypeKind::Pair(_, _)
        | TypeKind::NoCodec => FieldKind::Opaque,
    }
}

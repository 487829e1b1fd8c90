// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # packwire - Compact binary object codec
//!
//! Encodes typed object graphs into a compact, header-light binary form.
//! Each type gets a formatter planned once from its descriptor: adjacent
//! fixed-size fields are batched into single copies, strings and collections
//! carry a length header, unions carry a one-byte tag, and version-tolerant
//! records persist per-field length deltas so that readers built against an
//! older or newer schema can skip or pad fields.
//!
//! ## Quick Start
//!
//! ```rust
//! use packwire::{FormatterRegistry, PrimitiveKind, Record, RecordBuilder, TypeDescriptor, Value};
//!
//! let point = RecordBuilder::new("Point")
//!     .field("x", TypeDescriptor::primitive(PrimitiveKind::I32))
//!     .field("y", TypeDescriptor::primitive(PrimitiveKind::I32))
//!     .field("label", TypeDescriptor::string())
//!     .build()?;
//!
//! let registry = FormatterRegistry::new();
//! registry.register_type(&point);
//!
//! let value = Value::Record(
//!     Record::new("Point").with("x", 1i32).with("y", 2i32).with("label", "origin"),
//! );
//! let bytes = registry.serialize(&point, &value)?;
//! assert_eq!(registry.deserialize(&point, &bytes)?, value);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                        FormatterRegistry                            |
//! |   type name -> formatter | transitive discovery | CodecConfig       |
//! +---------------------------------------------------------------------+
//! |                            Codecs                                   |
//! |   Strict | VersionTolerant | Union | Collection | Blittable         |
//! +---------------------------------------------------------------------+
//! |                         Layout planning                             |
//! |   Field classifier -> EncodingPlan (blittable runs, cap 15)         |
//! +---------------------------------------------------------------------+
//! |                             Wire                                    |
//! |   PackWriter | PackReader | varint | staging pool                   |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`FormatterRegistry`] | Type name to formatter table, entry point for encode/decode |
//! | [`TypeDescriptor`] | Members, modifiers, hooks and tag tables of one type |
//! | [`Value`] | Dynamic value every formatter reads and writes |
//! | [`EncodingPlan`] | Batched run layout of a record |
//! | [`Formatter`] | Encode/decode capability for one type |
//!
//! ## Modules Overview
//!
//! - [`types`] - Descriptors, builders and values (start here)
//! - [`plan`] - Field classification and layout planning
//! - [`codec`] - Formatters per type category
//! - [`wire`] - Byte-level writer/reader and varints
//! - [`registry`] - Formatter registry
//! - [`config`] - Wire constants and runtime limits

/// Wire constants and runtime codec limits.
pub mod config;
/// Error types.
pub mod error;
/// Type descriptors, builders and dynamic values.
pub mod types;
/// Field classification and layout planning.
pub mod plan;
/// Byte-level encoding primitives.
pub mod wire;
/// Formatters for each type category.
pub mod codec;
/// Process-wide formatter registry.
pub mod registry;

pub use codec::{build_formatter, Formatter};
pub use config::CodecConfig;
pub use error::{DescriptorError, PackError, PackResult};
pub use plan::{EncodingPlan, FieldKind, PlanMode, Run};
pub use registry::FormatterRegistry;
pub use types::{
    CollectionKind, MemberDescriptor, PrimitiveKind, Record, RecordBuilder, TypeCategory,
    TypeDescriptor, TypeKind, UnionBuilder, Value,
};
pub use wire::{PackReader, PackWriter};

use std::sync::Arc;

/// Encode `value` through the process-wide registry.
pub fn serialize(desc: &Arc<TypeDescriptor>, value: &Value) -> PackResult<Vec<u8>> {
    FormatterRegistry::global().serialize(desc, value)
}

/// Decode a value of type `desc` through the process-wide registry.
pub fn deserialize(desc: &Arc<TypeDescriptor>, bytes: &[u8]) -> PackResult<Value> {
    FormatterRegistry::global().deserialize(desc, bytes)
}

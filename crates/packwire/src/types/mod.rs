// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors and dynamic values.
//!
//! A [`TypeDescriptor`] carries everything a codec is planned from: member
//! order, modifiers, constructor parameters, lifecycle hooks and union tag
//! tables. [`Value`] is the runtime representation every formatter reads
//! from and writes into.
//!
//! # Example
//!
//! ```
//! use packwire::types::{PrimitiveKind, Record, RecordBuilder, TypeDescriptor, Value};
//!
//! let point = RecordBuilder::new("Point")
//!     .field("x", TypeDescriptor::primitive(PrimitiveKind::I32))
//!     .field("y", TypeDescriptor::primitive(PrimitiveKind::I32))
//!     .build()
//!     .expect("valid descriptor");
//!
//! let value = Value::Record(Record::new("Point").with("x", 1i32).with("y", 2i32));
//! assert_eq!(point.as_record().map(|r| r.member_count()), Some(2));
//! assert_eq!(value.get_field("y"), Some(&Value::I32(2)));
//! ```

mod builder;
mod type_descriptor;
mod value;

pub use builder::{RecordBuilder, UnionBuilder};
pub use type_descriptor::{
    CollectionKind, LifecycleHooks, MemberDescriptor, MutateHook, ObserveHook, PrimitiveKind,
    RecordDescriptor, TypeCategory, TypeDescriptor, TypeKind, UnionDescriptor, UnionTag,
    UnionTagTable,
};
pub use value::{Record, Value};

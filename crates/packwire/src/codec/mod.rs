// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Formatters: the codec selected for each type category.
//!
//! | Category                 | Formatter                                  |
//! |--------------------------|--------------------------------------------|
//! | `Blittable`              | [`PrimitiveFormatter`], [`BlittableFormatter`] |
//! | `Record`                 | [`StrictFormatter`]                        |
//! | `VersionTolerantRecord`  | [`TolerantFormatter`]                      |
//! | `Union`                  | [`UnionFormatter`]                         |
//! | `Collection`             | [`StringFormatter`], [`CollectionFormatter`] |
//! | `NoCodec`                | none                                       |

pub mod collection;
mod formatter;
mod object;
mod strict;
mod tolerant;
mod union;

pub use collection::{CollectionFormatter, Template};
pub use formatter::{BlittableFormatter, Formatter, PrimitiveFormatter, StringFormatter};
pub use strict::StrictFormatter;
pub use tolerant::TolerantFormatter;
pub use union::UnionFormatter;

use crate::types::{TypeCategory, TypeDescriptor, TypeKind};
use std::sync::Arc;

/// Build the formatter for a type from its category.
///
/// Returns `None` for `NoCodec` types. Record members and union payloads
/// that are records get their formatters built here too; every other
/// dependency is resolved through the registry at encode/decode time.
pub fn build_formatter(desc: &Arc<TypeDescriptor>) -> Option<Arc<dyn Formatter>> {
    let formatter: Arc<dyn Formatter> = match desc.category() {
        TypeCategory::Blittable => match &desc.kind {
            TypeKind::Primitive(kind) => Arc::new(PrimitiveFormatter::new(*kind)),
            _ => Arc::new(BlittableFormatter::new(desc.clone())),
        },
        TypeCategory::Record => Arc::new(StrictFormatter::new(desc.clone()).ok()?),
        TypeCategory::VersionTolerantRecord => Arc::new(TolerantFormatter::new(desc.clone()).ok()?),
        TypeCategory::Union => Arc::new(UnionFormatter::new(desc.clone()).ok()?),
        TypeCategory::Collection => match &desc.kind {
            TypeKind::String => Arc::new(StringFormatter),
            _ => Arc::new(CollectionFormatter::new(desc)?),
        },
        TypeCategory::NoCodec => return None,
    };
    Some(formatter)
}

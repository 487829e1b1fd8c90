// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire primitives: cursors, raw-byte codecs, varints and staging buffers.

pub mod blittable;
mod pool;
mod reader;
pub mod varint;
mod writer;

pub use pool::{StagingBuffer, StagingPool};
pub use reader::PackReader;
pub use writer::PackWriter;

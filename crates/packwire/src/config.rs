// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packwire Configuration - wire constants and runtime limits
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: Wire-format constants (header sentinels, run cap)
//! - **Level 2 (Dynamic)**: [`CodecConfig`] for decode limits and staging pool sizing
//!
//! Every wire constant lives here. **NEVER hardcode a sentinel elsewhere!**
//!
//! # Exemple
//!
//! ```
//! use packwire::config::{CodecConfig, NULL_OBJECT_HEADER};
//! use packwire::FormatterRegistry;
//!
//! assert_eq!(NULL_OBJECT_HEADER, 255);
//!
//! let registry = FormatterRegistry::new();
//! registry.set_config(CodecConfig::default().with_max_collection_length(1024));
//! assert_eq!(registry.config().max_collection_length, 1024);
//! ```

// =======================================================================
// Object header
// =======================================================================

/// Object header value written in place of a member count for an absent
/// reference-type record.
pub const NULL_OBJECT_HEADER: u8 = 255;

/// Largest member count an object header can carry.
///
/// Header values `250..=254` are reserved, `255` is [`NULL_OBJECT_HEADER`].
pub const MAX_MEMBER_COUNT: usize = 249;

// =======================================================================
// Union header
// =======================================================================

/// Union header value for an absent union value (no payload follows).
pub const NULL_UNION_TAG: u8 = 255;

/// Largest tag a union variant may use.
pub const MAX_UNION_TAG: u8 = 254;

// =======================================================================
// Collection header
// =======================================================================

/// Length header value for an absent string, array or collection.
pub const NULL_COLLECTION_LENGTH: i32 = -1;

/// Size in bytes of a collection length header.
pub const COLLECTION_HEADER_SIZE: usize = 4;

// =======================================================================
// Layout planning
// =======================================================================

/// Maximum number of blittable fields merged into one batched run.
///
/// Keeps a batched read/write within a bounded argument count.
pub const MAX_RUN_LENGTH: usize = 15;

/// Maximum encoded size of an unsigned LEB128 varint (u64).
pub const MAX_VARINT_LEN: usize = 10;

// =======================================================================
// Runtime configuration
// =======================================================================

/// Default cap on decoded string/collection lengths (elements or bytes).
pub const DEFAULT_MAX_COLLECTION_LENGTH: usize = 16 * 1024 * 1024;

/// Default number of staging buffers kept by a registry's pool.
pub const DEFAULT_STAGING_POOL_CAPACITY: usize = 32;

/// Default largest staging buffer capacity returned to the pool.
///
/// Larger buffers are freed instead of retained.
pub const DEFAULT_STAGING_RETAIN_BYTES: usize = 64 * 1024;

/// Runtime codec limits.
///
/// Held by each [`FormatterRegistry`](crate::FormatterRegistry) behind an
/// `ArcSwap`, so it can be replaced atomically while codecs are running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Largest length header accepted on decode.
    pub max_collection_length: usize,
    /// Staging buffers kept for version-tolerant encoding.
    pub staging_pool_capacity: usize,
    /// Largest staging buffer capacity returned to the pool.
    pub staging_retain_bytes: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_collection_length: DEFAULT_MAX_COLLECTION_LENGTH,
            staging_pool_capacity: DEFAULT_STAGING_POOL_CAPACITY,
            staging_retain_bytes: DEFAULT_STAGING_RETAIN_BYTES,
        }
    }
}

impl CodecConfig {
    /// Set the largest accepted length header.
    #[must_use]
    pub fn with_max_collection_length(mut self, max: usize) -> Self {
        self.max_collection_length = max;
        self
    }

    /// Set the staging pool capacity (only read when a registry is created).
    #[must_use]
    pub fn with_staging_pool_capacity(mut self, capacity: usize) -> Self {
        self.staging_pool_capacity = capacity;
        self
    }

    /// Set the largest staging buffer returned to the pool.
    #[must_use]
    pub fn with_staging_retain_bytes(mut self, bytes: usize) -> Self {
        self.staging_retain_bytes = bytes;
        self
    }
}

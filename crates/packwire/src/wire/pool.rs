// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lock-free pool of staging buffers for version-tolerant encoding.
//!
//! Every staged encode needs a scratch buffer for the whole object payload.
//! Buffers are taken from a crossbeam `ArrayQueue` freelist and handed back
//! by the [`StagingBuffer`] guard on drop, so they return to the pool on the
//! error path too.

use crossbeam::queue::ArrayQueue;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Pool of reusable staging buffers.
pub struct StagingPool {
    free: ArrayQueue<Vec<u8>>,
    /// Largest capacity kept on release; larger buffers are dropped.
    retain_bytes: AtomicUsize,
    /// Count of acquisitions that had to allocate (diagnostic)
    misses: AtomicU64,
}

impl StagingPool {
    /// Create an empty pool holding at most `capacity` idle buffers.
    pub fn new(capacity: usize, retain_bytes: usize) -> Self {
        Self {
            free: ArrayQueue::new(capacity.max(1)),
            retain_bytes: AtomicUsize::new(retain_bytes),
            misses: AtomicU64::new(0),
        }
    }

    /// Take a cleared buffer, allocating when the pool is empty.
    pub fn acquire(&self) -> StagingBuffer<'_> {
        let buffer = match self.free.pop() {
            Some(buffer) => buffer,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Vec::new()
            }
        };
        StagingBuffer {
            pool: self,
            buffer,
        }
    }

    fn release(&self, mut buffer: Vec<u8>) {
        if buffer.capacity() > self.retain_bytes.load(Ordering::Relaxed) {
            log::trace!(
                "[pool] dropping oversized staging buffer ({} bytes)",
                buffer.capacity()
            );
            return;
        }
        buffer.clear();
        // Pool full: the buffer is simply freed.
        let _ = self.free.push(buffer);
    }

    /// Number of idle buffers.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Number of acquisitions that allocated a fresh buffer.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub(crate) fn set_retain_bytes(&self, bytes: usize) {
        self.retain_bytes.store(bytes, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for StagingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingPool")
            .field("available", &self.available())
            .field("capacity", &self.free.capacity())
            .field("misses", &self.misses())
            .finish()
    }
}

/// Scratch buffer on loan from a [`StagingPool`].
pub struct StagingBuffer<'p> {
    pool: &'p StagingPool,
    buffer: Vec<u8>,
}

impl Deref for StagingBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buffer
    }
}

impl DerefMut for StagingBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buffer
    }
}

impl Drop for StagingBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buffer));
    }
}

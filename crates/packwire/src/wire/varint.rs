// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Unsigned LEB128 varints for version-tolerant field deltas.
//!
//! 7 data bits per byte, least significant group first, bit 7 set on every
//! byte but the last. A delta of 0 is the single byte `0x00`. Decoding
//! rejects padded encodings such as `[0x80, 0x00]`, so every value has
//! exactly one accepted byte form.

use crate::config::MAX_VARINT_LEN;
use crate::error::{PackError, PackResult};

const CONTINUATION_BIT: u8 = 0x80;
const DATA_MASK: u8 = 0x7F;

/// Append `value` to `out`; returns the number of bytes written.
#[inline]
pub fn write_varint(out: &mut Vec<u8>, mut value: u64) -> usize {
    let mut written = 0;
    loop {
        let byte = (value & u64::from(DATA_MASK)) as u8;
        value >>= 7;
        written += 1;
        if value == 0 {
            out.push(byte);
            return written;
        }
        out.push(byte | CONTINUATION_BIT);
    }
}

/// Encoded size of `value`.
#[inline]
#[must_use]
pub const fn varint_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Decode a varint from the front of `buf`; returns `(value, consumed)`.
///
/// `offset` is only used for error reporting.
#[inline]
pub fn read_varint(buf: &[u8], offset: usize) -> PackResult<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(PackError::InvalidData(format!(
                "varint at offset {} exceeds {} bytes",
                offset, MAX_VARINT_LEN
            )));
        }
        let data = u64::from(byte & DATA_MASK);
        // Tenth byte may only contribute bit 63.
        if shift == 63 && data > 1 {
            return Err(PackError::InvalidData(format!(
                "varint at offset {} overflows u64",
                offset
            )));
        }
        result |= data << shift;
        if byte & CONTINUATION_BIT == 0 {
            // A zero final group after the first byte is a padded encoding.
            if i > 0 && data == 0 {
                return Err(PackError::InvalidData(format!(
                    "non-minimal varint at offset {}",
                    offset
                )));
            }
            return Ok((result, i + 1));
        }
        shift += 7;
    }

    Err(PackError::TruncatedInput {
        offset: offset + buf.len(),
        need: 1,
        have: 0,
    })
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for descriptor construction and encode/decode.
//!
//! Runtime errors are fail-fast: a decode that returns an error leaves no
//! usable partial value, and callers must discard whatever the destination
//! holds.

use std::fmt;

/// Build-time errors raised while constructing type descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// Two members share the same order index.
    DuplicateOrder { type_name: String, order: u16 },
    /// A strict record has a gap in its order indices.
    SparseOrder { type_name: String, order: u16 },
    /// Two members share the same name.
    DuplicateMember { type_name: String, member: String },
    /// The record has more members than an object header can count.
    TooManyMembers {
        type_name: String,
        count: usize,
        max: usize,
    },
    /// A constructor parameter matches no member name.
    UnresolvedConstructorParameter { type_name: String, parameter: String },
    /// Two union variants use the same tag.
    DuplicateUnionTag { union: String, tag: u8 },
    /// The same payload type appears twice in a union.
    DuplicateUnionVariant { union: String, type_name: String },
    /// The tag collides with the null-union sentinel.
    ReservedUnionTag { union: String, tag: u8 },
    /// Two non-record variants share a runtime shape (e.g. two sequences),
    /// so a payload could not be told apart on encode.
    AmbiguousUnionVariant {
        union: String,
        shape: String,
        first: String,
        second: String,
    },
    /// A union variant that is itself a union.
    NestedUnionVariant { union: String, type_name: String },
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateOrder { type_name, order } => {
                write!(f, "{}: duplicate member order {}", type_name, order)
            }
            Self::SparseOrder { type_name, order } => write!(
                f,
                "{}: member order {} leaves a gap (only version-tolerant types may be sparse)",
                type_name, order
            ),
            Self::DuplicateMember { type_name, member } => {
                write!(f, "{}: duplicate member name '{}'", type_name, member)
            }
            Self::TooManyMembers {
                type_name,
                count,
                max,
            } => write!(f, "{}: {} members exceeds maximum {}", type_name, count, max),
            Self::UnresolvedConstructorParameter {
                type_name,
                parameter,
            } => write!(
                f,
                "{}: constructor parameter '{}' matches no member",
                type_name, parameter
            ),
            Self::DuplicateUnionTag { union, tag } => {
                write!(f, "{}: duplicate union tag {}", union, tag)
            }
            Self::DuplicateUnionVariant { union, type_name } => {
                write!(f, "{}: variant type {} registered twice", union, type_name)
            }
            Self::ReservedUnionTag { union, tag } => {
                write!(f, "{}: union tag {} is reserved", union, tag)
            }
            Self::AmbiguousUnionVariant {
                union,
                shape,
                first,
                second,
            } => write!(
                f,
                "{}: variants {} and {} are both {} payloads",
                union, first, second, shape
            ),
            Self::NestedUnionVariant { union, type_name } => {
                write!(f, "{}: variant {} is itself a union", union, type_name)
            }
        }
    }
}

impl std::error::Error for DescriptorError {}

/// Encode/decode errors.
#[derive(Debug, Clone, PartialEq)]
pub enum PackError {
    /// Strict decode saw more fields than the local schema has.
    SchemaCountMismatch {
        type_name: String,
        expected: usize,
        actual: usize,
    },
    /// Decode saw a tag absent from the union tag table.
    UnknownUnionTag { union: String, tag: u8 },
    /// Encode saw a payload whose runtime type is not a union variant.
    UnknownUnionVariant { union: String, type_name: String },
    /// The byte source ended mid-field.
    TruncatedInput {
        offset: usize,
        need: usize,
        have: usize,
    },
    /// A version-tolerant field did not occupy its recorded delta.
    FieldLengthMismatch {
        type_name: String,
        index: usize,
        expected: usize,
        actual: usize,
    },
    /// No formatter is registered for the type.
    FormatterNotRegistered(String),
    /// The value does not have the shape the descriptor requires.
    TypeMismatch { expected: String, found: String },
    /// Malformed bytes (bad UTF-8, invalid char, overlong varint...).
    InvalidData(String),
    /// A length header exceeds the configured limit.
    LengthLimitExceeded { length: usize, max: usize },
    /// Descriptor construction failed.
    Descriptor(DescriptorError),
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaCountMismatch {
                type_name,
                expected,
                actual,
            } => write!(
                f,
                "{}: stream has {} fields, schema expects at most {}",
                type_name, actual, expected
            ),
            Self::UnknownUnionTag { union, tag } => {
                write!(f, "{}: unknown union tag {}", union, tag)
            }
            Self::UnknownUnionVariant { union, type_name } => {
                write!(f, "{}: type {} is not a union variant", union, type_name)
            }
            Self::TruncatedInput { offset, need, have } => write!(
                f,
                "truncated input at offset {}: need {} bytes, have {}",
                offset, need, have
            ),
            Self::FieldLengthMismatch {
                type_name,
                index,
                expected,
                actual,
            } => write!(
                f,
                "{}: field {} recorded {} bytes but occupied {}",
                type_name, index, expected, actual
            ),
            Self::FormatterNotRegistered(name) => write!(f, "no formatter registered for {}", name),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            Self::InvalidData(msg) => write!(f, "invalid data: {}", msg),
            Self::LengthLimitExceeded { length, max } => {
                write!(f, "length {} exceeds limit {}", length, max)
            }
            Self::Descriptor(e) => write!(f, "descriptor error: {}", e),
        }
    }
}

impl std::error::Error for PackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Descriptor(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DescriptorError> for PackError {
    fn from(e: DescriptorError) -> Self {
        Self::Descriptor(e)
    }
}

pub type PackResult<T> = core::result::Result<T, PackError>;

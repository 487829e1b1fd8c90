// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors: the per-type metadata every codec is planned from.
//!
//! Descriptors are created once per type (see [`RecordBuilder`] and
//! [`UnionBuilder`]) and are immutable afterwards, so they are shared as
//! `Arc<TypeDescriptor>` across threads without synchronization.
//!
//! [`RecordBuilder`]: crate::types::RecordBuilder
//! [`UnionBuilder`]: crate::types::UnionBuilder

use crate::config::NULL_UNION_TAG;
use crate::error::DescriptorError;
use crate::plan::classifier::{classify, FieldKind};
use crate::types::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Fixed-size scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Char,
}

impl PrimitiveKind {
    /// Every primitive kind, in declaration order.
    pub const ALL: [PrimitiveKind; 12] = [
        Self::Bool,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::F32,
        Self::F64,
        Self::Char,
    ];

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 | Self::Char => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// Canonical type name, also the registry key of the builtin formatter.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Char => "char",
        }
    }

    /// Zero value of this kind.
    pub fn zero(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::U8 => Value::U8(0),
            Self::U16 => Value::U16(0),
            Self::U32 => Value::U32(0),
            Self::U64 => Value::U64(0),
            Self::I8 => Value::I8(0),
            Self::I16 => Value::I16(0),
            Self::I32 => Value::I32(0),
            Self::I64 => Value::I64(0),
            Self::F32 => Value::F32(0.0),
            Self::F64 => Value::F64(0.0),
            Self::Char => Value::Char('\0'),
        }
    }
}

/// Codec category of a type; selects which codec the registry builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// Raw-byte copy: scalars and value-type records of scalars.
    Blittable,
    /// Fixed-schema record (strict codec).
    Record,
    /// Record with per-field length deltas (version-tolerant codec).
    VersionTolerantRecord,
    /// Polymorphic family keyed by a tag table.
    Union,
    /// Strings, arrays and generic containers (bound to templates).
    Collection,
    /// Type without a codec; never registered.
    NoCodec,
}

/// Generic container shapes bound to the collection templates.
#[derive(Debug, Clone)]
pub enum CollectionKind {
    /// Ordered sequence of elements.
    Sequence(Arc<TypeDescriptor>),
    /// Set of distinct elements.
    Set(Arc<TypeDescriptor>),
    /// Associative map.
    Map {
        key: Arc<TypeDescriptor>,
        value: Arc<TypeDescriptor>,
    },
}

/// Type kind enumeration.
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// Fixed-size scalar.
    Primitive(PrimitiveKind),
    /// UTF-8 string.
    String,
    /// Record with ordered members.
    Record(RecordDescriptor),
    /// Polymorphic union.
    Union(UnionDescriptor),
    /// `T[]` array.
    Array(Arc<TypeDescriptor>),
    /// Generic container.
    Collection(CollectionKind),
    /// Key/value pair of an associative container.
    Pair(Arc<TypeDescriptor>, Arc<TypeDescriptor>),
    /// Declared type without a codec.
    NoCodec,
}

/// A complete type descriptor.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Type name; the runtime type identity used by unions and the registry.
    pub name: Arc<str>,
    /// Type kind.
    pub kind: TypeKind,
}

impl TypeDescriptor {
    /// Create a new type descriptor.
    pub fn new(name: impl Into<Arc<str>>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Scalar descriptor, named after the kind (`"i32"`, `"f64"`...).
    pub fn primitive(kind: PrimitiveKind) -> Arc<Self> {
        Arc::new(Self::new(kind.name(), TypeKind::Primitive(kind)))
    }

    /// String descriptor.
    pub fn string() -> Arc<Self> {
        Arc::new(Self::new("string", TypeKind::String))
    }

    /// `T[]` descriptor.
    pub fn array(element: Arc<Self>) -> Arc<Self> {
        let name = format!("{}[]", element.name);
        Arc::new(Self::new(name, TypeKind::Array(element)))
    }

    /// `sequence<T>` descriptor.
    pub fn sequence(element: Arc<Self>) -> Arc<Self> {
        let name = format!("sequence<{}>", element.name);
        Self::collection(name, CollectionKind::Sequence(element))
    }

    /// `set<T>` descriptor.
    pub fn set(element: Arc<Self>) -> Arc<Self> {
        let name = format!("set<{}>", element.name);
        Self::collection(name, CollectionKind::Set(element))
    }

    /// `map<K, V>` descriptor.
    pub fn map(key: Arc<Self>, value: Arc<Self>) -> Arc<Self> {
        let name = format!("map<{}, {}>", key.name, value.name);
        Self::collection(name, CollectionKind::Map { key, value })
    }

    /// Named container type bound to a generic template.
    pub fn collection(name: impl Into<Arc<str>>, kind: CollectionKind) -> Arc<Self> {
        Arc::new(Self::new(name, TypeKind::Collection(kind)))
    }

    /// `pair<K, V>` descriptor.
    pub fn pair(key: Arc<Self>, value: Arc<Self>) -> Arc<Self> {
        let name = format!("pair<{}, {}>", key.name, value.name);
        Arc::new(Self::new(name, TypeKind::Pair(key, value)))
    }

    /// Descriptor for a type that has no codec.
    pub fn no_codec(name: impl Into<Arc<str>>) -> Arc<Self> {
        Arc::new(Self::new(name, TypeKind::NoCodec))
    }

    /// Identity of a value of this type inside a union payload.
    ///
    /// Records (and codec-less types) are told apart by type name; every
    /// other kind by the shape its values take, matching [`Value::shape`].
    /// Unions have no payload identity of their own.
    pub fn payload_identity(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Record(_) | TypeKind::NoCodec => Some(&*self.name),
            TypeKind::Primitive(kind) => Some(kind.name()),
            TypeKind::String => Some("string"),
            TypeKind::Array(_) => Some("array"),
            TypeKind::Collection(CollectionKind::Sequence(_)) => Some("sequence"),
            TypeKind::Collection(CollectionKind::Set(_)) => Some("set"),
            TypeKind::Collection(CollectionKind::Map { .. }) => Some("map"),
            TypeKind::Pair(_, _) => Some("pair"),
            TypeKind::Union(_) => None,
        }
    }

    /// Codec category.
    pub fn category(&self) -> TypeCategory {
        match &self.kind {
            TypeKind::Primitive(_) => TypeCategory::Blittable,
            TypeKind::Record(r) if r.is_blittable() => TypeCategory::Blittable,
            TypeKind::Record(r) if r.version_tolerant => TypeCategory::VersionTolerantRecord,
            TypeKind::Record(_) => TypeCategory::Record,
            TypeKind::Union(_) => TypeCategory::Union,
            TypeKind::String
            | TypeKind::Array(_)
            | TypeKind::Collection(_)
            | TypeKind::Pair(_, _) => TypeCategory::Collection,
            TypeKind::NoCodec => TypeCategory::NoCodec,
        }
    }

    /// Value types can never be absent.
    pub fn is_value_type(&self) -> bool {
        match &self.kind {
            TypeKind::Primitive(_) | TypeKind::Pair(_, _) => true,
            TypeKind::Record(r) => r.value_type,
            _ => false,
        }
    }

    /// Encoded size if this type is blittable.
    pub fn blittable_size(&self) -> Option<usize> {
        match &self.kind {
            TypeKind::Primitive(p) => Some(p.size()),
            TypeKind::Record(r) => r.blittable_size,
            _ => None,
        }
    }

    /// Check if this type is copied as raw bytes.
    pub fn is_blittable(&self) -> bool {
        self.blittable_size().is_some()
    }

    /// Get the record descriptor if this is a record.
    pub fn as_record(&self) -> Option<&RecordDescriptor> {
        match &self.kind {
            TypeKind::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Get the union descriptor if this is a union.
    pub fn as_union(&self) -> Option<&UnionDescriptor> {
        match &self.kind {
            TypeKind::Union(u) => Some(u),
            _ => None,
        }
    }
}

/// Callback observing a value around encode, or the destination before decode.
pub type ObserveHook = Arc<dyn Fn(&Value) + Send + Sync>;

/// Callback allowed to adjust a freshly decoded value.
pub type MutateHook = Arc<dyn Fn(&mut Value) + Send + Sync>;

/// Declared lifecycle hooks of a record or union.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    pub on_serializing: Option<ObserveHook>,
    pub on_serialized: Option<ObserveHook>,
    pub on_deserializing: Option<ObserveHook>,
    pub on_deserialized: Option<MutateHook>,
}

impl LifecycleHooks {
    /// True when no hook is declared.
    pub fn is_empty(&self) -> bool {
        self.on_serializing.is_none()
            && self.on_serialized.is_none()
            && self.on_deserializing.is_none()
            && self.on_deserialized.is_none()
    }

    pub(crate) fn serializing(&self, value: &Value) {
        if let Some(hook) = &self.on_serializing {
            hook(value);
        }
    }

    pub(crate) fn serialized(&self, value: &Value) {
        if let Some(hook) = &self.on_serialized {
            hook(value);
        }
    }

    pub(crate) fn deserializing(&self, existing: &Value) {
        if let Some(hook) = &self.on_deserializing {
            hook(existing);
        }
    }

    pub(crate) fn deserialized(&self, value: &mut Value) {
        if let Some(hook) = &self.on_deserialized {
            hook(value);
        }
    }
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("on_serializing", &self.on_serializing.is_some())
            .field("on_serialized", &self.on_serialized.is_some())
            .field("on_deserializing", &self.on_deserializing.is_some())
            .field("on_deserialized", &self.on_deserialized.is_some())
            .finish()
    }
}

/// Record member.
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    /// Member name (empty for padding slots).
    pub name: Arc<str>,
    /// Declaration order index.
    pub order: u16,
    /// Declared type (`None` for padding slots).
    pub type_desc: Option<Arc<TypeDescriptor>>,
    /// Classified field kind.
    pub kind: FieldKind,
    /// Assignable after construction.
    pub settable: bool,
    /// Bound to a constructor parameter.
    pub constructor_bound: bool,
}

impl MemberDescriptor {
    /// Create a settable member; its kind is classified from the declared type.
    pub fn new(name: impl Into<Arc<str>>, order: u16, type_desc: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            order,
            kind: classify(&type_desc),
            type_desc: Some(type_desc),
            settable: true,
            constructor_bound: false,
        }
    }

    /// Synthetic slot for an order index removed from this schema revision.
    pub fn padding(order: u16) -> Self {
        Self {
            name: Arc::from(""),
            order,
            type_desc: None,
            kind: FieldKind::Padding,
            settable: false,
            constructor_bound: false,
        }
    }

    /// Mark as not assignable after construction.
    pub fn readonly(mut self) -> Self {
        self.settable = false;
        self
    }

    /// Check if this is a padding slot.
    pub fn is_padding(&self) -> bool {
        self.kind == FieldKind::Padding
    }

    /// Default value of the member's declared type.
    pub fn default_value(&self) -> Value {
        match &self.type_desc {
            Some(desc) => Value::default_for(desc),
            None => Value::Null,
        }
    }
}

/// Record type descriptor.
#[derive(Debug, Clone)]
pub struct RecordDescriptor {
    /// Members in order; gaps are materialized as padding slots.
    pub members: Vec<MemberDescriptor>,
    /// Persist per-field length deltas.
    pub version_tolerant: bool,
    /// Value type (never absent).
    pub value_type: bool,
    /// Parameterized constructor, by parameter name.
    pub constructor: Option<Vec<String>>,
    /// Declared lifecycle hooks.
    pub hooks: LifecycleHooks,
    pub(crate) blittable_size: Option<usize>,
}

impl RecordDescriptor {
    pub(crate) fn new(
        members: Vec<MemberDescriptor>,
        version_tolerant: bool,
        value_type: bool,
        constructor: Option<Vec<String>>,
        hooks: LifecycleHooks,
    ) -> Self {
        let blittable_size = if value_type && !version_tolerant && hooks.is_empty() {
            members.iter().try_fold(0usize, |acc, m| {
                if m.kind != FieldKind::Blittable {
                    return None;
                }
                m.type_desc
                    .as_ref()
                    .and_then(|t| t.blittable_size())
                    .map(|size| acc + size)
            })
        } else {
            None
        };
        Self {
            members,
            version_tolerant,
            value_type,
            constructor,
            hooks,
            blittable_size,
        }
    }

    /// Number of schema slots, padding included.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Members that carry data.
    pub fn live_members(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.members.iter().filter(|m| !m.is_padding())
    }

    /// Get member by name.
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.live_members().find(|m| &*m.name == name)
    }

    /// Check if the record is copied as raw bytes.
    pub fn is_blittable(&self) -> bool {
        self.blittable_size.is_some()
    }

    /// True if decoding must go through the parameterized constructor.
    pub fn has_parameterized_constructor(&self) -> bool {
        self.constructor.as_ref().is_some_and(|params| !params.is_empty())
    }
}

/// One tag/payload-type pair.
#[derive(Debug, Clone)]
pub struct UnionTag {
    pub tag: u8,
    pub type_desc: Arc<TypeDescriptor>,
}

/// Bijective map between union tags and payload types.
///
/// Sealed at construction: the variant family of a schema revision is
/// closed, and extending it means building a new descriptor. Payloads are
/// keyed by [`TypeDescriptor::payload_identity`], so at most one variant of
/// each non-record shape is allowed.
#[derive(Debug, Clone)]
pub struct UnionTagTable {
    entries: Vec<UnionTag>,
    by_tag: HashMap<u8, usize>,
    by_type: HashMap<Arc<str>, usize>,
}

impl UnionTagTable {
    /// Build the table, rejecting duplicate tags, duplicate payload types and
    /// the reserved null tag.
    pub fn new(
        union: &str,
        variants: impl IntoIterator<Item = (u8, Arc<TypeDescriptor>)>,
    ) -> Result<Self, DescriptorError> {
        let mut table = Self {
            entries: Vec::new(),
            by_tag: HashMap::new(),
            by_type: HashMap::new(),
        };
        for (tag, type_desc) in variants {
            if tag == NULL_UNION_TAG {
                return Err(DescriptorError::ReservedUnionTag {
                    union: union.to_string(),
                    tag,
                });
            }
            if table.by_tag.contains_key(&tag) {
                return Err(DescriptorError::DuplicateUnionTag {
                    union: union.to_string(),
                    tag,
                });
            }
            let identity: Arc<str> = match type_desc.payload_identity() {
                Some(identity) => Arc::from(identity),
                None => {
                    return Err(DescriptorError::NestedUnionVariant {
                        union: union.to_string(),
                        type_name: type_desc.name.to_string(),
                    })
                }
            };
            if let Some(&existing) = table.by_type.get(&identity) {
                let first = &table.entries[existing].type_desc.name;
                if *first == type_desc.name {
                    return Err(DescriptorError::DuplicateUnionVariant {
                        union: union.to_string(),
                        type_name: type_desc.name.to_string(),
                    });
                }
                return Err(DescriptorError::AmbiguousUnionVariant {
                    union: union.to_string(),
                    shape: identity.to_string(),
                    first: first.to_string(),
                    second: type_desc.name.to_string(),
                });
            }
            let index = table.entries.len();
            table.by_tag.insert(tag, index);
            table.by_type.insert(identity, index);
            table.entries.push(UnionTag { tag, type_desc });
        }
        Ok(table)
    }

    /// Tag for a payload identity (record type name or value shape).
    pub fn tag_of(&self, identity: &str) -> Option<u8> {
        self.by_type.get(identity).map(|&i| self.entries[i].tag)
    }

    /// Payload type for a tag.
    pub fn variant(&self, tag: u8) -> Option<&Arc<TypeDescriptor>> {
        self.by_tag.get(&tag).map(|&i| &self.entries[i].type_desc)
    }

    /// Iterate over variants in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &UnionTag> {
        self.entries.iter()
    }

    /// Number of variants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the union has no variants.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Union type descriptor.
#[derive(Debug, Clone)]
pub struct UnionDescriptor {
    pub tags: UnionTagTable,
    pub hooks: LifecycleHooks,
}

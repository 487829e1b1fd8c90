// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builders for record and union descriptors.
//!
//! Builders stand in for the type descriptor provider: they take the member
//! list, modifiers, constructor parameters and hooks of a type and validate
//! the order/name invariants before any plan is made from it.

use crate::config::MAX_MEMBER_COUNT;
use crate::error::DescriptorError;
use crate::types::{
    LifecycleHooks, MemberDescriptor, RecordDescriptor, TypeDescriptor, TypeKind,
    UnionDescriptor, UnionTagTable, Value,
};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug)]
struct PendingMember {
    name: String,
    order: u16,
    type_desc: Arc<TypeDescriptor>,
    settable: bool,
}

/// Builder for record descriptors.
#[derive(Debug)]
pub struct RecordBuilder {
    name: String,
    members: Vec<PendingMember>,
    next_order: u16,
    version_tolerant: bool,
    value_type: bool,
    constructor: Option<Vec<String>>,
    hooks: LifecycleHooks,
}

impl RecordBuilder {
    /// Create a new builder for a reference-type record.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            next_order: 0,
            version_tolerant: false,
            value_type: false,
            constructor: None,
            hooks: LifecycleHooks::default(),
        }
    }

    /// Add a settable member at the next order index.
    pub fn field(self, name: impl Into<String>, type_desc: Arc<TypeDescriptor>) -> Self {
        let order = self.next_order;
        self.push(name.into(), order, type_desc, true)
    }

    /// Add a settable member at an explicit order index.
    pub fn field_at(
        self,
        order: u16,
        name: impl Into<String>,
        type_desc: Arc<TypeDescriptor>,
    ) -> Self {
        self.push(name.into(), order, type_desc, true)
    }

    /// Add a member that is not assignable after construction.
    pub fn readonly_field(self, name: impl Into<String>, type_desc: Arc<TypeDescriptor>) -> Self {
        let order = self.next_order;
        self.push(name.into(), order, type_desc, false)
    }

    fn push(
        mut self,
        name: String,
        order: u16,
        type_desc: Arc<TypeDescriptor>,
        settable: bool,
    ) -> Self {
        self.members.push(PendingMember {
            name,
            order,
            type_desc,
            settable,
        });
        self.next_order = order.saturating_add(1);
        self
    }

    /// Persist per-field length deltas; order gaps become padding slots.
    pub fn version_tolerant(mut self) -> Self {
        self.version_tolerant = true;
        self
    }

    /// Mark as a value type (never absent).
    pub fn value_type(mut self) -> Self {
        self.value_type = true;
        self
    }

    /// Declare a parameterized constructor.
    pub fn constructor<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constructor = Some(parameters.into_iter().map(Into::into).collect());
        self
    }

    pub fn on_serializing(mut self, hook: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.hooks.on_serializing = Some(Arc::new(hook));
        self
    }

    pub fn on_serialized(mut self, hook: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.hooks.on_serialized = Some(Arc::new(hook));
        self
    }

    pub fn on_deserializing(mut self, hook: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.hooks.on_deserializing = Some(Arc::new(hook));
        self
    }

    pub fn on_deserialized(mut self, hook: impl Fn(&mut Value) + Send + Sync + 'static) -> Self {
        self.hooks.on_deserialized = Some(Arc::new(hook));
        self
    }

    /// Validate and build the descriptor.
    pub fn build(self) -> Result<Arc<TypeDescriptor>, DescriptorError> {
        let Self {
            name,
            mut members,
            version_tolerant,
            value_type,
            constructor,
            hooks,
            ..
        } = self;

        let mut names = HashSet::new();
        let mut orders = HashSet::new();
        for member in &members {
            if !names.insert(member.name.as_str()) {
                return Err(DescriptorError::DuplicateMember {
                    type_name: name,
                    member: member.name.clone(),
                });
            }
            if !orders.insert(member.order) {
                return Err(DescriptorError::DuplicateOrder {
                    type_name: name,
                    order: member.order,
                });
            }
        }
        members.sort_by_key(|m| m.order);

        // Materialize order gaps (version-tolerant only) as padding slots.
        let mut slots = Vec::with_capacity(members.len());
        for member in members {
            while slots.len() < member.order as usize {
                let missing = slots.len() as u16;
                if !version_tolerant {
                    return Err(DescriptorError::SparseOrder {
                        type_name: name,
                        order: missing,
                    });
                }
                slots.push(MemberDescriptor::padding(missing));
            }
            let mut slot = MemberDescriptor::new(member.name, member.order, member.type_desc);
            slot.settable = member.settable;
            slots.push(slot);
        }

        if slots.len() > MAX_MEMBER_COUNT {
            return Err(DescriptorError::TooManyMembers {
                type_name: name,
                count: slots.len(),
                max: MAX_MEMBER_COUNT,
            });
        }

        if let Some(parameters) = &constructor {
            for parameter in parameters {
                let wanted = parameter.to_lowercase();
                let bound = slots
                    .iter_mut()
                    .filter(|m| !m.is_padding())
                    .find(|m| m.name.to_lowercase() == wanted);
                match bound {
                    Some(member) => member.constructor_bound = true,
                    None => {
                        return Err(DescriptorError::UnresolvedConstructorParameter {
                            type_name: name,
                            parameter: parameter.clone(),
                        })
                    }
                }
            }
        }

        let record = RecordDescriptor::new(slots, version_tolerant, value_type, constructor, hooks);
        Ok(Arc::new(TypeDescriptor::new(name, TypeKind::Record(record))))
    }
}

/// Builder for union descriptors.
#[derive(Debug)]
pub struct UnionBuilder {
    name: String,
    variants: Vec<(u8, Arc<TypeDescriptor>)>,
    hooks: LifecycleHooks,
}

impl UnionBuilder {
    /// Create a new union builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
            hooks: LifecycleHooks::default(),
        }
    }

    /// Add a variant payload type under `tag`.
    pub fn variant(mut self, tag: u8, type_desc: Arc<TypeDescriptor>) -> Self {
        self.variants.push((tag, type_desc));
        self
    }

    pub fn on_serializing(mut self, hook: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.hooks.on_serializing = Some(Arc::new(hook));
        self
    }

    pub fn on_serialized(mut self, hook: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.hooks.on_serialized = Some(Arc::new(hook));
        self
    }

    pub fn on_deserializing(mut self, hook: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.hooks.on_deserializing = Some(Arc::new(hook));
        self
    }

    pub fn on_deserialized(mut self, hook: impl Fn(&mut Value) + Send + Sync + 'static) -> Self {
        self.hooks.on_deserialized = Some(Arc::new(hook));
        self
    }

    /// Validate the tag table and build the descriptor.
    pub fn build(self) -> Result<Arc<TypeDescriptor>, DescriptorError> {
        let tags = UnionTagTable::new(&self.name, self.variants)?;
        let union = UnionDescriptor {
            tags,
            hooks: self.hooks,
        };
        Ok(Arc::new(TypeDescriptor::new(self.name, TypeKind::Union(union))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::FieldKind;
    use crate::types::{PrimitiveKind, TypeCategory};

    fn i32_type() -> Arc<TypeDescriptor> {
        TypeDescriptor::primitive(PrimitiveKind::I32)
    }

    #[test]
    fn test_sequential_orders() {
        let desc = RecordBuilder::new("Sample")
            .field("a", i32_type())
            .field("b", TypeDescriptor::string())
            .readonly_field("c", i32_type())
            .build()
            .expect("descriptor");
        let record = desc.as_record().expect("record");
        let orders: Vec<u16> = record.members.iter().map(|m| m.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert!(!record.members[2].settable);
        assert_eq!(record.members[1].kind, FieldKind::String);
        assert_eq!(desc.category(), TypeCategory::Record);
    }

    #[test]
    fn test_sparse_orders_padded_when_version_tolerant() {
        let desc = RecordBuilder::new("Evolving")
            .version_tolerant()
            .field_at(0, "a", i32_type())
            .field_at(3, "d", i32_type())
            .build()
            .expect("descriptor");
        let record = desc.as_record().expect("record");
        assert_eq!(record.member_count(), 4);
        assert!(record.members[1].is_padding());
        assert!(record.members[2].is_padding());
        assert_eq!(&*record.members[3].name, "d");
        assert_eq!(record.live_members().count(), 2);
        assert_eq!(desc.category(), TypeCategory::VersionTolerantRecord);
    }

    #[test]
    fn test_sparse_orders_rejected_when_strict() {
        let err = RecordBuilder::new("Strict")
            .field_at(0, "a", i32_type())
            .field_at(2, "c", i32_type())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DescriptorError::SparseOrder {
                type_name: "Strict".into(),
                order: 1
            }
        );
    }

    #[test]
    fn test_duplicate_order_and_name() {
        let err = RecordBuilder::new("Dup")
            .field_at(0, "a", i32_type())
            .field_at(0, "b", i32_type())
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::DuplicateOrder { order: 0, .. }));

        let err = RecordBuilder::new("Dup")
            .field("a", i32_type())
            .field("a", i32_type())
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::DuplicateMember { .. }));
    }

    #[test]
    fn test_constructor_binds_case_insensitively() {
        let desc = RecordBuilder::new("User")
            .readonly_field("Name", TypeDescriptor::string())
            .field("age", i32_type())
            .constructor(["name"])
            .build()
            .expect("descriptor");
        let record = desc.as_record().expect("record");
        assert!(record.members[0].constructor_bound);
        assert!(!record.members[1].constructor_bound);
        assert!(record.has_parameterized_constructor());
    }

    #[test]
    fn test_unresolved_constructor_parameter() {
        let err = RecordBuilder::new("User")
            .field("name", TypeDescriptor::string())
            .constructor(["nmae"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DescriptorError::UnresolvedConstructorParameter {
                type_name: "User".into(),
                parameter: "nmae".into()
            }
        );
    }

    #[test]
    fn test_too_many_members() {
        let mut builder = RecordBuilder::new("Wide");
        for i in 0..=MAX_MEMBER_COUNT {
            builder = builder.field(format!("f{}", i), i32_type());
        }
        let err = builder.build().unwrap_err();
        assert!(matches!(err, DescriptorError::TooManyMembers { count: 250, .. }));
    }

    #[test]
    fn test_hooks_make_value_type_non_blittable() {
        let plain = RecordBuilder::new("Plain")
            .value_type()
            .field("a", i32_type())
            .build()
            .expect("descriptor");
        assert!(plain.is_blittable());

        let hooked = RecordBuilder::new("Hooked")
            .value_type()
            .field("a", i32_type())
            .on_serializing(|_| {})
            .build()
            .expect("descriptor");
        assert!(!hooked.is_blittable());
        assert_eq!(hooked.category(), TypeCategory::Record);
    }

    #[test]
    fn test_union_builder() {
        let circle = RecordBuilder::new("Circle")
            .field("r", i32_type())
            .build()
            .expect("descriptor");
        let desc = UnionBuilder::new("Shape")
            .variant(0, circle)
            .build()
            .expect("descriptor");
        assert_eq!(desc.category(), TypeCategory::Union);
        assert_eq!(desc.as_union().map(|u| u.tags.len()), Some(1));
    }
}

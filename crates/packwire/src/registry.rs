// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Formatter registry with transitive type discovery.
//!
//! Maps type names to formatters. Registration is idempotent and
//! order-independent: registering a type that is already present is a silent
//! no-op, so independent roots sharing a dependency can register eagerly from
//! any thread.
//!
//! # Performance
//!
//! - **Lookup**: `DashMap` read, no global lock
//! - **Registration**: presence check first, `entry().or_insert` on miss, so
//!   concurrent registrations of one type keep a single winner
//! - **Config**: `ArcSwap`, atomic load on every reader creation

use crate::codec::{build_formatter, Formatter, PrimitiveFormatter, StringFormatter};
use crate::config::CodecConfig;
use crate::error::{PackError, PackResult};
use crate::types::{CollectionKind, PrimitiveKind, TypeDescriptor, TypeKind, Value};
use crate::wire::{PackReader, PackWriter, StagingPool};
use arc_swap::ArcSwap;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

static GLOBAL_REGISTRY: OnceLock<FormatterRegistry> = OnceLock::new();

/// Table from type name to formatter.
pub struct FormatterRegistry {
    formatters: DashMap<Arc<str>, Arc<dyn Formatter>>,
    config: ArcSwap<CodecConfig>,
    staging: StagingPool,
}

impl FormatterRegistry {
    /// Create a registry seeded with the builtin scalar and string formatters.
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    /// Create a registry with explicit limits.
    pub fn with_config(config: CodecConfig) -> Self {
        let registry = Self {
            formatters: DashMap::new(),
            staging: StagingPool::new(config.staging_pool_capacity, config.staging_retain_bytes),
            config: ArcSwap::from_pointee(config),
        };
        for kind in PrimitiveKind::ALL {
            registry.register(Arc::new(PrimitiveFormatter::new(kind)));
        }
        registry.register(Arc::new(StringFormatter));
        registry
    }

    /// Process-wide registry, created on first use.
    pub fn global() -> &'static FormatterRegistry {
        GLOBAL_REGISTRY.get_or_init(FormatterRegistry::new)
    }

    /// Current limits.
    pub fn config(&self) -> Arc<CodecConfig> {
        self.config.load_full()
    }

    /// Replace the limits atomically.
    ///
    /// Readers created afterwards see the new limits; the staging pool
    /// capacity is fixed at construction.
    pub fn set_config(&self, config: CodecConfig) {
        self.staging.set_retain_bytes(config.staging_retain_bytes);
        self.config.store(Arc::new(config));
    }

    /// Staging buffers for version-tolerant encoding.
    pub fn staging_pool(&self) -> &StagingPool {
        &self.staging
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.formatters.contains_key(type_name)
    }

    /// Register a formatter under its type name.
    ///
    /// Returns `false` (and keeps the existing entry) if the name is taken.
    pub fn register(&self, formatter: Arc<dyn Formatter>) -> bool {
        let name: Arc<str> = Arc::from(formatter.type_name());
        if self.formatters.contains_key(&name) {
            return false;
        }
        match self.formatters.entry(name) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                log::debug!("[registry] registered {}", slot.key());
                slot.insert(formatter);
                true
            }
        }
    }

    /// Register `desc` and every type it depends on.
    ///
    /// Walks record members, union payloads and collection type arguments.
    /// Maps also register their key/value pair type; records and unions also
    /// register their `T[]` array type. Returns the number of newly
    /// registered formatters.
    pub fn register_type(&self, desc: &Arc<TypeDescriptor>) -> usize {
        let mut visited: HashSet<Arc<str>> = HashSet::new();
        let mut pending = vec![desc.clone()];
        let mut added = 0;

        while let Some(current) = pending.pop() {
            if !visited.insert(current.name.clone()) {
                continue;
            }
            if matches!(current.kind, TypeKind::NoCodec) {
                log::debug!("[registry] {} has no codec, skipped", current.name);
                continue;
            }
            if !self.is_registered(&current.name) {
                if let Some(formatter) = build_formatter(&current) {
                    if self.register(formatter) {
                        added += 1;
                    }
                }
            }
            collect_dependencies(&current, &mut pending);
        }
        added
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<dyn Formatter>> {
        self.formatters.get(type_name).map(|entry| Arc::clone(entry.value()))
    }

    /// Like [`get`](Self::get), failing with
    /// [`PackError::FormatterNotRegistered`].
    pub fn require(&self, type_name: &str) -> PackResult<Arc<dyn Formatter>> {
        self.get(type_name)
            .ok_or_else(|| PackError::FormatterNotRegistered(type_name.to_string()))
    }

    /// Number of registered formatters.
    pub fn len(&self) -> usize {
        self.formatters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty()
    }

    /// Encode `value` as `desc`, registering `desc` first if needed.
    pub fn serialize(&self, desc: &Arc<TypeDescriptor>, value: &Value) -> PackResult<Vec<u8>> {
        let mut out = Vec::new();
        self.serialize_into(desc, value, &mut out)?;
        Ok(out)
    }

    /// Append the encoding of `value` to `out`.
    pub fn serialize_into(
        &self,
        desc: &Arc<TypeDescriptor>,
        value: &Value,
        out: &mut Vec<u8>,
    ) -> PackResult<()> {
        let formatter = self.resolve(desc)?;
        formatter.serialize(&mut PackWriter::new(out, self), value)
    }

    /// Decode a fresh value of type `desc`.
    pub fn deserialize(&self, desc: &Arc<TypeDescriptor>, bytes: &[u8]) -> PackResult<Value> {
        let formatter = self.resolve(desc)?;
        formatter.deserialize(&mut PackReader::new(bytes, self))
    }

    /// Decode into an existing value, updating it in place where possible.
    pub fn deserialize_into(
        &self,
        desc: &Arc<TypeDescriptor>,
        bytes: &[u8],
        value: &mut Value,
    ) -> PackResult<()> {
        let formatter = self.resolve(desc)?;
        formatter.deserialize_into(&mut PackReader::new(bytes, self), value)
    }

    fn resolve(&self, desc: &Arc<TypeDescriptor>) -> PackResult<Arc<dyn Formatter>> {
        if let Some(formatter) = self.get(&desc.name) {
            return Ok(formatter);
        }
        self.register_type(desc);
        self.require(&desc.name)
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("formatters", &self.formatters.len())
            .field("config", &self.config.load_full())
            .field("staging", &self.staging)
            .finish()
    }
}

/// Push the types `desc` depends on.
fn collect_dependencies(desc: &Arc<TypeDescriptor>, pending: &mut Vec<Arc<TypeDescriptor>>) {
    match &desc.kind {
        TypeKind::Record(record) => {
            pending.extend(record.members.iter().filter_map(|m| m.type_desc.clone()));
            pending.push(TypeDescriptor::array(desc.clone()));
        }
        TypeKind::Union(union) => {
            pending.extend(union.tags.iter().map(|variant| variant.type_desc.clone()));
            pending.push(TypeDescriptor::array(desc.clone()));
        }
        TypeKind::Array(element)
        | TypeKind::Collection(CollectionKind::Sequence(element))
        | TypeKind::Collection(CollectionKind::Set(element)) => pending.push(element.clone()),
        TypeKind::Collection(CollectionKind::Map { key, value }) => {
            pending.push(key.clone());
            pending.push(value.clone());
            pending.push(TypeDescriptor::pair(key.clone(), value.clone()));
        }
        TypeKind::Pair(key, value) => {
            pending.push(key.clone());
            pending.push(value.clone());
        }
        TypeKind::Primitive(_) | TypeKind::String | TypeKind::NoCodec => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Record, RecordBuilder, UnionBuilder};

    #[test]
    fn test_builtins_are_seeded() {
        let registry = FormatterRegistry::new();
        assert_eq!(registry.len(), PrimitiveKind::ALL.len() + 1);
        assert!(registry.is_registered("i32"));
        assert!(registry.is_registered("string"));
        assert!(!registry.is_registered("Point"));
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = FormatterRegistry::new();
        let point = RecordBuilder::new("Point")
            .field("x", TypeDescriptor::primitive(PrimitiveKind::I32))
            .build()
            .expect("descriptor");
        let first = registry.register_type(&point);
        let len = registry.len();
        assert_eq!(first, 2); // Point and Point[]
        assert_eq!(registry.register_type(&point), 0);
        assert_eq!(registry.len(), len);

        let again = build_formatter(&point).expect("formatter");
        assert!(!registry.register(again));
        assert_eq!(registry.len(), len);
    }

    #[test]
    fn test_transitive_discovery() {
        let registry = FormatterRegistry::new();
        let item = RecordBuilder::new("Item")
            .field("name", TypeDescriptor::string())
            .build()
            .expect("descriptor");
        let circle = RecordBuilder::new("Circle")
            .field("r", TypeDescriptor::primitive(PrimitiveKind::F32))
            .build()
            .expect("descriptor");
        let shape = UnionBuilder::new("Shape")
            .variant(0, circle)
            .build()
            .expect("descriptor");
        let inventory = RecordBuilder::new("Inventory")
            .field(
                "stock",
                TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::sequence(item)),
            )
            .field("shape", shape)
            .field("handle", TypeDescriptor::no_codec("Socket"))
            .build()
            .expect("descriptor");

        registry.register_type(&inventory);
        for name in [
            "Inventory",
            "Inventory[]",
            "map<string, sequence<Item>>",
            "pair<string, sequence<Item>>",
            "sequence<Item>",
            "Item",
            "Item[]",
            "Shape",
            "Shape[]",
            "Circle",
            "Circle[]",
        ] {
            assert!(registry.is_registered(name), "{} not registered", name);
        }
        assert!(!registry.is_registered("Socket"));
    }

    #[test]
    fn test_serialize_registers_on_demand() {
        let registry = FormatterRegistry::new();
        let desc = RecordBuilder::new("Point")
            .field("x", TypeDescriptor::primitive(PrimitiveKind::I32))
            .build()
            .expect("descriptor");
        let value = Value::Record(Record::new("Point").with("x", 3i32));
        let bytes = registry.serialize(&desc, &value).expect("encode");
        assert!(registry.is_registered("Point"));
        assert_eq!(registry.deserialize(&desc, &bytes).expect("decode"), value);
    }

    #[test]
    fn test_concurrent_registration_keeps_one_entry() {
        let registry = Arc::new(FormatterRegistry::new());
        let desc = RecordBuilder::new("Shared")
            .field("x", TypeDescriptor::primitive(PrimitiveKind::U64))
            .build()
            .expect("descriptor");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let desc = desc.clone();
                std::thread::spawn(move || registry.register_type(&desc))
            })
            .collect();
        let added: usize = handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .sum();
        assert_eq!(added, 2);
        assert!(registry.is_registered("Shared"));
    }

    #[test]
    fn test_global_is_shared() {
        let a = FormatterRegistry::global() as *const FormatterRegistry;
        let b = FormatterRegistry::global() as *const FormatterRegistry;
        assert_eq!(a, b);
        assert!(FormatterRegistry::global().is_registered("u8"));
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Registry behavior end to end: discovery, idempotence, concurrency,
// runtime limits, hooks and randomized round-trips.

#![allow(clippy::float_cmp)]
#![allow(clippy::cast_possible_truncation)]

use packwire::{
    CodecConfig, FormatterRegistry, PackError, PrimitiveKind, Record, RecordBuilder,
    TypeDescriptor, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

fn order() -> Arc<TypeDescriptor> {
    let line = RecordBuilder::new("OrderLine")
        .field("sku", TypeDescriptor::string())
        .field("quantity", TypeDescriptor::primitive(PrimitiveKind::U32))
        .field("price", TypeDescriptor::primitive(PrimitiveKind::F64))
        .build()
        .expect("descriptor");
    RecordBuilder::new("Order")
        .field("id", TypeDescriptor::primitive(PrimitiveKind::U64))
        .field("paid", TypeDescriptor::primitive(PrimitiveKind::Bool))
        .field("lines", TypeDescriptor::array(line))
        .field(
            "attributes",
            TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::string()),
        )
        .field(
            "coupons",
            TypeDescriptor::set(TypeDescriptor::primitive(PrimitiveKind::U16)),
        )
        .build()
        .expect("descriptor")
}

fn line(sku: &str, quantity: u32, price: f64) -> Value {
    Value::Record(
        Record::new("OrderLine")
            .with("sku", sku)
            .with("quantity", quantity)
            .with("price", price),
    )
}

fn sample_order() -> Value {
    Value::Record(
        Record::new("Order")
            .with("id", 1001u64)
            .with("paid", true)
            .with(
                "lines",
                Value::Array(vec![line("A-1", 2, 9.5), Value::Null, line("B-7", 1, 120.0)]),
            )
            .with(
                "attributes",
                Value::Map(vec![(
                    Value::String("channel".into()),
                    Value::String("web".into()),
                )]),
            )
            .with("coupons", Value::Set(vec![Value::U16(5), Value::U16(10)])),
    )
}

#[test]
fn test_registration_discovers_dependencies() {
    let registry = FormatterRegistry::new();
    let before = registry.len();
    let added = registry.register_type(&order());

    for name in [
        "Order",
        "Order[]",
        "OrderLine",
        "OrderLine[]",
        "map<string, string>",
        "pair<string, string>",
        "set<u16>",
    ] {
        assert!(registry.is_registered(name), "{} missing", name);
    }
    assert_eq!(registry.len(), before + added);
    assert_eq!(registry.register_type(&order()), 0);
}

#[test]
fn test_independent_roots_share_dependencies() {
    let registry = FormatterRegistry::new();
    let shared = RecordBuilder::new("Money")
        .field("cents", TypeDescriptor::primitive(PrimitiveKind::I64))
        .build()
        .expect("descriptor");
    let invoice = RecordBuilder::new("Invoice")
        .field("total", shared.clone())
        .build()
        .expect("descriptor");
    let refund = RecordBuilder::new("Refund")
        .field("amount", shared)
        .build()
        .expect("descriptor");

    // Invoice, Invoice[], Money, Money[]
    assert_eq!(registry.register_type(&invoice), 4);
    // Refund, Refund[]; Money is already present
    assert_eq!(registry.register_type(&refund), 2);
}

#[test]
fn test_order_roundtrip() {
    let registry = FormatterRegistry::new();
    let desc = order();
    let value = sample_order();
    let bytes = registry.serialize(&desc, &value).expect("encode");
    assert_eq!(registry.deserialize(&desc, &bytes).expect("decode"), value);
}

#[test]
fn test_global_convenience_functions() {
    let desc = order();
    let value = sample_order();
    let bytes = packwire::serialize(&desc, &value).expect("encode");
    assert_eq!(packwire::deserialize(&desc, &bytes).expect("decode"), value);
    assert!(FormatterRegistry::global().is_registered("Order"));
}

#[test]
fn test_concurrent_registration_and_use() {
    let registry = Arc::new(FormatterRegistry::new());
    let desc = order();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let desc = desc.clone();
            thread::spawn(move || {
                let added = registry.register_type(&desc);
                let value = sample_order();
                let bytes = registry.serialize(&desc, &value).expect("encode");
                assert_eq!(registry.deserialize(&desc, &bytes).expect("decode"), value);
                added
            })
        })
        .collect();

    let added: usize = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread"))
        .sum();
    let fresh = FormatterRegistry::new();
    assert_eq!(added, fresh.register_type(&desc));
}

#[test]
fn test_length_limit_follows_config_swap() {
    let registry = FormatterRegistry::new();
    let desc = TypeDescriptor::sequence(TypeDescriptor::primitive(PrimitiveKind::U8));
    let value = Value::Sequence((0..10u8).map(Value::U8).collect());
    let bytes = registry.serialize(&desc, &value).expect("encode");

    registry.set_config(CodecConfig::default().with_max_collection_length(4));
    assert_eq!(
        registry.deserialize(&desc, &bytes).unwrap_err(),
        PackError::LengthLimitExceeded { length: 10, max: 4 }
    );

    registry.set_config(CodecConfig::default());
    assert_eq!(registry.deserialize(&desc, &bytes).expect("decode"), value);
}

#[test]
fn test_hooks_run_around_encode_and_decode() {
    let encoded = Arc::new(AtomicUsize::new(0));
    let decoding = Arc::new(AtomicUsize::new(0));
    let desc = {
        let encoded = Arc::clone(&encoded);
        let decoding = Arc::clone(&decoding);
        RecordBuilder::new("Audited")
            .field("value", TypeDescriptor::primitive(PrimitiveKind::I32))
            .field("checked", TypeDescriptor::primitive(PrimitiveKind::Bool))
            .on_serialized(move |_| {
                encoded.fetch_add(1, Ordering::SeqCst);
            })
            .on_deserializing(move |_| {
                decoding.fetch_add(1, Ordering::SeqCst);
            })
            .on_deserialized(|value| {
                if let Some(record) = value.as_record_mut() {
                    record.set("checked", Value::Bool(true));
                }
            })
            .build()
            .expect("descriptor")
    };

    let registry = FormatterRegistry::new();
    let value = Value::Record(Record::new("Audited").with("value", 3i32).with("checked", false));
    let bytes = registry.serialize(&desc, &value).expect("encode");
    let decoded = registry.deserialize(&desc, &bytes).expect("decode");
    assert_eq!(decoded.get_field("checked"), Some(&Value::Bool(true)));

    let null = registry.serialize(&desc, &Value::Null).expect("encode");
    assert!(registry.deserialize(&desc, &null).expect("decode").is_null());

    assert_eq!(encoded.load(Ordering::SeqCst), 2);
    assert_eq!(decoding.load(Ordering::SeqCst), 2);
}

fn random_string(rng: &mut fastrand::Rng) -> String {
    let len = rng.usize(0..24);
    (0..len).map(|_| rng.alphanumeric()).collect()
}

#[test]
fn test_randomized_roundtrips() {
    let desc = RecordBuilder::new("Sample")
        .field("a", TypeDescriptor::primitive(PrimitiveKind::I32))
        .field("b", TypeDescriptor::primitive(PrimitiveKind::I64))
        .field("c", TypeDescriptor::primitive(PrimitiveKind::F64))
        .field("d", TypeDescriptor::primitive(PrimitiveKind::Bool))
        .field("e", TypeDescriptor::primitive(PrimitiveKind::Char))
        .field("name", TypeDescriptor::string())
        .field(
            "readings",
            TypeDescriptor::sequence(TypeDescriptor::primitive(PrimitiveKind::U16)),
        )
        .field("raw", TypeDescriptor::array(TypeDescriptor::primitive(PrimitiveKind::U8)))
        .build()
        .expect("descriptor");
    let tolerant = RecordBuilder::new("TolerantSample")
        .version_tolerant()
        .field("inner", desc.clone())
        .field("note", TypeDescriptor::string())
        .build()
        .expect("descriptor");

    let registry = FormatterRegistry::new();
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _ in 0..200 {
        let name = if rng.bool() {
            Value::String(random_string(&mut rng))
        } else {
            Value::Null
        };
        let readings = Value::Sequence((0..rng.usize(0..16)).map(|_| Value::U16(rng.u16(..))).collect());
        let raw = Value::Array((0..rng.usize(0..32)).map(|_| Value::U8(rng.u8(..))).collect());
        let sample = Value::Record(
            Record::new("Sample")
                .with("a", rng.i32(..))
                .with("b", rng.i64(..))
                .with("c", rng.f64())
                .with("d", rng.bool())
                .with("e", rng.alphanumeric())
                .with("name", name)
                .with("readings", readings)
                .with("raw", raw),
        );

        let bytes = registry.serialize(&desc, &sample).expect("encode");
        assert_eq!(registry.deserialize(&desc, &bytes).expect("decode"), sample);

        let wrapped = Value::Record(
            Record::new("TolerantSample")
                .with("inner", sample)
                .with("note", random_string(&mut rng)),
        );
        let bytes = registry.serialize(&tolerant, &wrapped).expect("encode");
        assert_eq!(registry.deserialize(&tolerant, &bytes).expect("decode"), wrapped);
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::float_cmp)] // Test assertions with constants
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::too_many_lines)] // Example/test code
#![allow(clippy::similar_names)] // Test variable naming

//! End-to-end behaviour of types, datums and property access.

use std::sync::Arc;
use typed_objects::{
    config, CollectingSink, HeapAllocator, PlainPrototype, PropertyAttrs, PropertyKey,
    ScalarKind, Shape, TypeClass, TypeSystem, TypedError, Value,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Value {
    Value::List(items.into_iter().map(Into::into).collect())
}

#[test]
fn uint8_array_wraps_on_store() {
    init_logging();
    let ts = TypeSystem::new();
    let uint8 = ts.scalar_type(ScalarKind::Uint8);
    let bytes = ts.array_type(&uint8, 4).unwrap();

    let datum = bytes.repeat(&Value::from(0)).unwrap();
    assert_eq!(datum.snapshot().unwrap(), list([0, 0, 0, 0]));

    datum.set(2, &Value::from(500)).unwrap();
    assert_eq!(datum.get(2).unwrap(), Value::from(244));
    assert_eq!(datum.snapshot().unwrap(), list([0, 0, 244, 0]));
}

#[test]
fn clamped_and_wrapping_kinds_differ() {
    let ts = TypeSystem::new();
    let clamped = ts.scalar_type(ScalarKind::Uint8Clamped);
    let wrapping = ts.scalar_type(ScalarKind::Uint8);

    let c = clamped.construct(Some(&Value::from(300))).unwrap();
    let w = wrapping.construct(Some(&Value::from(300))).unwrap();
    assert_eq!(c.load().unwrap(), Value::from(255));
    assert_eq!(w.load().unwrap(), Value::from(44));

    c.store(&Value::from(-1)).unwrap();
    w.store(&Value::from(-1)).unwrap();
    assert_eq!(c.load().unwrap(), Value::from(0));
    assert_eq!(w.load().unwrap(), Value::from(255));
}

#[test]
fn int32_field_truncates_toward_zero() {
    let ts = TypeSystem::new();
    let int32 = ts.scalar_type(ScalarKind::Int32);
    let point = ts
        .struct_type([("x", int32.clone()), ("y", int32)])
        .unwrap();
    let datum = point.create_zeroed().unwrap();

    datum.set("y", &Value::from(7.9)).unwrap();
    assert_eq!(datum.get("y").unwrap(), Value::from(7));
    datum.set("x", &Value::from(-7.9)).unwrap();
    assert_eq!(datum.get("x").unwrap(), Value::from(-7));
}

#[test]
fn subarray_clamps_negative_and_oversized_bounds() {
    let ts = TypeSystem::new();
    let f32_type = ts.scalar_type(ScalarKind::Float32);
    let arr = ts.array_type(&f32_type, 10).unwrap();
    let datum = arr
        .construct(Some(&list((0..10).map(f64::from))))
        .unwrap();

    let tail = datum.subarray(-3, Some(100)).unwrap();
    assert_eq!(tail.type_desc().length(), Some(3));
    assert_eq!(tail.offset(), Some(f32_type.byte_length() * 7));
    assert_eq!(tail.snapshot().unwrap(), list([7.0, 8.0, 9.0]));

    // A view, not a copy.
    tail.set(0, &Value::from(-1.5)).unwrap();
    assert_eq!(datum.get(7).unwrap(), Value::from(-1.5));

    let empty = datum.subarray(6, Some(2)).unwrap();
    assert_eq!(empty.type_desc().length(), Some(0));
    assert_eq!(empty.byte_length(), 0);
}

#[test]
fn own_properties_reject_redefinition_and_deletion() {
    let sink = Arc::new(CollectingSink::new());
    let ts = TypeSystem::builder().error_sink(sink.clone()).build();
    let int16 = ts.scalar_type(ScalarKind::Int16);
    let pair = ts.array_type(&int16, 2).unwrap();
    let rec = ts
        .struct_builder()
        .field("id", &int16)
        .field("pair", &pair)
        .build()
        .unwrap();
    let datum = rec.create_zeroed().unwrap();

    assert!(matches!(
        datum.define("id", Value::from(1), PropertyAttrs::ENUMERATE),
        Err(TypedError::CannotRedefine { .. })
    ));
    assert!(matches!(
        datum.delete("pair"),
        Err(TypedError::CannotDelete { .. })
    ));

    let errors = sink.take();
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| e.type_name() == Some("StructType({id: int16, pair: ArrayType(int16, 2)})")));
}

#[test]
fn handle_lifecycle() {
    let heap = Arc::new(HeapAllocator::new());
    let ts = TypeSystem::builder().allocator(heap.clone()).build();
    let f64_type = ts.scalar_type(ScalarKind::Float64);
    let vec3 = ts.array_type(&f64_type, 3).unwrap();
    let mesh = ts.array_type(&vec3, 4).unwrap();

    let vertices = mesh.create_zeroed().unwrap();
    let cursor = vec3.handle();
    assert!(!cursor.is_attached());
    assert!(matches!(cursor.get(0), Err(TypedError::Unattached { .. })));

    cursor
        .move_to(&vertices, &[PropertyKey::Index(2)])
        .unwrap();
    cursor.store(&list([1.0, 2.0, 3.0])).unwrap();
    assert_eq!(cursor.offset(), Some(48));
    assert_eq!(vertices.get(2).unwrap().as_datum().map(|d| d.offset()), Some(Some(48)));

    cursor.detach().unwrap();
    cursor.detach().unwrap();
    assert!(!cursor.is_attached());

    // Detaching never frees; dropping the owner does.
    assert_eq!(heap.stats().frees, 0);
    drop(vertices);
    assert_eq!(heap.stats().frees, 1);
    assert_eq!(heap.stats().live_buffers, 0);
}

#[test]
fn objects_cannot_be_reattached() {
    let ts = TypeSystem::new();
    let uint8 = ts.scalar_type(ScalarKind::Uint8);
    let a = uint8.create_zeroed().unwrap();
    let b = uint8.create_zeroed().unwrap();
    assert!(matches!(a.attach(&b, 0), Err(TypedError::InvalidArgument { .. })));
    assert!(matches!(a.detach(), Err(TypedError::InvalidArgument { .. })));
}

#[test]
fn structurally_equal_types_share_representation() {
    let ts = TypeSystem::new();
    let shape = Shape::structure([
        ("id", Shape::from(ScalarKind::Uint32)),
        ("samples", Shape::array(ScalarKind::Float32.into(), 8)),
    ]);
    let a = ts.describe(&shape).unwrap();
    let b = ts.describe(&shape).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(a.equivalent(&b));
    assert!(Arc::ptr_eq(a.repr(), b.repr()));
    assert_eq!(a.byte_length(), 36);
    assert_eq!(a.byte_alignment(), 4);

    let other = TypeSystem::new().describe(&shape).unwrap();
    assert!(!a.equivalent(&other));
    assert!(matches!(
        ts.array_type(&other, 2),
        Err(TypedError::InvalidArgument { .. })
    ));
}

#[test]
fn types_defined_per_request_keep_the_registry_bounded() {
    let ts = TypeSystem::new();
    let uint8 = ts.scalar_type(ScalarKind::Uint8);

    for round in 0..1000u32 {
        let rgb = ts.array_type(&uint8, 3).unwrap();
        let pixel = ts.struct_type([("rgb", rgb)]).unwrap();
        let datum = pixel.create_zeroed().unwrap();
        datum.get("rgb").unwrap().as_datum().unwrap().set(0, &Value::from(round)).unwrap();
    }

    let registry = ts.registry();
    assert!(registry.is_empty());
    assert!(
        registry.slot_count() <= config::REGISTRY_PURGE_FLOOR,
        "{:?}",
        registry
    );
}

#[test]
fn copying_between_equivalent_types_of_different_descriptors() {
    let ts = TypeSystem::new();
    let shape = Shape::structure([
        ("lo", Shape::from(ScalarKind::Uint16)),
        ("hi", Shape::from(ScalarKind::Uint16)),
    ]);
    let first = ts.describe(&shape).unwrap();
    let second = ts.describe(&shape).unwrap();

    let src = first
        .construct(Some(&Value::record([("lo", Value::from(1)), ("hi", Value::from(2))])))
        .unwrap();
    let dst = second.construct(Some(&Value::Datum(src.clone()))).unwrap();
    assert_eq!(dst.to_bytes().unwrap(), src.to_bytes().unwrap());
    assert!(!dst.same_as(&src));
}

#[test]
fn prototypes_answer_for_everything_not_own() {
    let shared = Arc::new(PlainPrototype::new().with_property(
        "describe",
        Value::from("typed array"),
        PropertyAttrs::NONE,
    ));
    let ts = TypeSystem::builder()
        .prototype(TypeClass::Array, shared)
        .build();
    let int8 = ts.scalar_type(ScalarKind::Int8);
    let arr = ts.array_type(&int8, 2).unwrap().create_zeroed().unwrap();

    assert_eq!(arr.get("describe").unwrap(), Value::from("typed array"));
    // Indices past the end never reach the prototype.
    assert_eq!(arr.get(2).unwrap(), Value::Undefined);
    assert!(!arr.delete(2).unwrap());
    assert_eq!(arr.keys(), vec![PropertyKey::Index(0), PropertyKey::Index(1)]);

    let scalar = int8.create_zeroed().unwrap();
    assert_eq!(scalar.get("describe").unwrap(), Value::Undefined);
}

#[test]
fn fill_overwrites_every_element() {
    let ts = TypeSystem::new();
    let int32 = ts.scalar_type(ScalarKind::Int32);
    let pair = ts.struct_type([("a", int32.clone()), ("b", int32)]).unwrap();
    let pairs = ts.array_type(&pair, 3).unwrap();
    let datum = pairs.create_zeroed().unwrap();

    let value = Value::record([("a", Value::from(4)), ("b", Value::from(-4))]);
    pairs.fill(&datum, &value).unwrap();
    assert_eq!(
        datum.snapshot().unwrap(),
        Value::List(vec![value.clone(), value.clone(), value])
    );
}

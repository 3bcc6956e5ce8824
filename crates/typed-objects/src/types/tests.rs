// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//! Tests for type descriptors.

use super::*;
use crate::config::{DuplicateFieldPolicy, TypeSystemConfig};
use crate::dispatch::PlainPrototype;
use crate::repr::Shape;
use crate::runtime::TypeSystem;
use std::sync::Arc;

#[test]
fn scalar_type_properties() {
    let ts = TypeSystem::new();
    let f64_type = ts.scalar_type(ScalarKind::Float64);
    assert_eq!(f64_type.byte_length(), 8);
    assert_eq!(f64_type.byte_alignment(), 8);
    assert!(!f64_type.is_variable());
    assert_eq!(f64_type.scalar_kind(), Some(ScalarKind::Float64));
    assert_eq!(f64_type.to_source(), "float64");
    assert!(f64_type.element_type().is_none());
    assert!(f64_type.fields().is_empty());
}

#[test]
fn array_type_properties() {
    let ts = TypeSystem::new();
    let uint8 = ts.scalar_type(ScalarKind::Uint8);
    let bytes = ts.array_type(&uint8, 4).unwrap();
    assert_eq!(bytes.byte_length(), 4);
    assert_eq!(bytes.byte_alignment(), 1);
    assert_eq!(bytes.length(), Some(4));
    assert!(Arc::ptr_eq(bytes.element_type().unwrap(), &uint8));
    assert_eq!(bytes.to_string(), "ArrayType(uint8, 4)");
}

#[test]
fn struct_type_tables() {
    let ts = TypeSystem::new();
    let int32 = ts.scalar_type(ScalarKind::Int32);
    let f64_type = ts.scalar_type(ScalarKind::Float64);
    let pair = ts.array_type(&f64_type, 2).unwrap();
    let shape = ts
        .struct_type([("x", int32.clone()), ("y", pair.clone())])
        .unwrap();

    assert_eq!(
        shape.to_source(),
        "StructType({x: int32, y: ArrayType(float64, 2)})"
    );
    assert_eq!(shape.byte_length(), 24);
    assert_eq!(shape.byte_alignment(), 8);
    let names = shape.field_names();
    assert_eq!(names.iter().map(|n| &**n).collect::<Vec<_>>(), vec!["x", "y"]);
    assert_eq!(shape.field_offsets(), vec![0, 8]);

    let types = shape.field_types();
    assert!(Arc::ptr_eq(&types[0], &int32));
    assert!(Arc::ptr_eq(&types[1], &pair));

    let y = shape.field_named("y").unwrap();
    assert_eq!((y.index, y.offset), (1, 8));
    assert!(shape.field_named("z").is_none());
}

#[test]
fn equivalent_types_share_representation() {
    let ts = TypeSystem::new();
    let uint8 = ts.scalar_type(ScalarKind::Uint8);
    let a = ts.array_type(&uint8, 4).unwrap();
    let b = ts
        .array_type(&ts.scalar_type(ScalarKind::Uint8), 4)
        .unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(a.equivalent(&b));

    let c = ts.array_type(&uint8, 5).unwrap();
    assert!(!a.equivalent(&c));
    let clamped = ts.scalar_type(ScalarKind::Uint8Clamped);
    assert!(!uint8.equivalent(&clamped));
}

#[test]
fn negative_length_is_invalid_argument() {
    let ts = TypeSystem::new();
    let uint8 = ts.scalar_type(ScalarKind::Uint8);
    let err = ts.array_type(&uint8, -1).unwrap_err();
    assert!(matches!(err, TypedError::InvalidArgument { .. }));
}

#[test]
fn foreign_element_type_is_invalid_argument() {
    let ours = TypeSystem::new();
    let theirs = TypeSystem::new();
    let foreign = theirs.scalar_type(ScalarKind::Int8);
    assert!(!ours.owns(&foreign));
    assert!(matches!(
        ours.array_type(&foreign, 2),
        Err(TypedError::InvalidArgument { .. })
    ));
    assert!(matches!(
        ours.struct_type([("a", foreign)]),
        Err(TypedError::InvalidArgument { .. })
    ));
}

#[test]
fn index_like_field_names_are_rejected() {
    let ts = TypeSystem::new();
    let int8 = ts.scalar_type(ScalarKind::Int8);
    assert!(ts.struct_type([("0", int8.clone())]).is_err());
    assert!(ts.struct_type([("42", int8.clone())]).is_err());
    // Not canonical indices, so plain names.
    assert!(ts.struct_type([("01", int8.clone())]).is_ok());
    assert!(ts.struct_type([("-1", int8)]).is_ok());
}

#[test]
fn duplicate_fields_rejected_by_default() {
    let ts = TypeSystem::new();
    let int8 = ts.scalar_type(ScalarKind::Int8);
    let err = ts
        .struct_builder()
        .field("a", &int8)
        .field("a", &int8)
        .build()
        .unwrap_err();
    assert!(matches!(err, TypedError::InvalidArgument { .. }));
}

#[test]
fn duplicate_fields_shadow_in_compat_mode() {
    let config = TypeSystemConfig::default().with_duplicate_fields(DuplicateFieldPolicy::Shadow);
    let ts = TypeSystem::with_config(config);
    let int8 = ts.scalar_type(ScalarKind::Int8);
    let int32 = ts.scalar_type(ScalarKind::Int32);
    let shape = ts
        .struct_builder()
        .field("a", &int8)
        .field("a", &int32)
        .build()
        .unwrap();

    // Storage for both, lookup finds the later one.
    assert_eq!(shape.byte_length(), 8);
    assert_eq!(shape.fields().len(), 2);
    let found = shape.field_named("a").unwrap();
    assert_eq!((found.index, found.offset), (1, 4));
}

#[test]
fn field_table_mirrors_interned_layout() {
    let ts = TypeSystem::new();
    let uint8 = ts.scalar_type(ScalarKind::Uint8);
    let float64 = ts.scalar_type(ScalarKind::Float64);
    let rgb = ts.array_type(&uint8, 3).unwrap();
    let pixel = ts
        .struct_builder()
        .field("tag", &uint8)
        .field("weight", &float64)
        .field("rgb", &rgb)
        .build()
        .unwrap();

    let ReprKind::Struct { fields: laid_out } = pixel.repr().kind() else {
        panic!("{} is not a struct layout", pixel);
    };
    assert_eq!(pixel.fields().len(), laid_out.len());
    for (field, slot) in pixel.fields().iter().zip(laid_out) {
        assert_eq!(field.name, slot.name);
        assert_eq!(field.offset, slot.offset);
        assert!(Arc::ptr_eq(field.field_type.repr(), &slot.repr));
    }
    assert_eq!(pixel.field_offsets(), vec![0, 8, 16]);
}

#[test]
fn empty_struct_is_valid() {
    let ts = TypeSystem::new();
    let empty = ts.struct_builder().build().unwrap();
    assert_eq!(empty.byte_length(), 0);
    assert_eq!(empty.to_source(), "StructType({})");
    let datum = empty.create_zeroed().unwrap();
    assert_eq!(datum.byte_length(), 0);
}

#[test]
fn describe_builds_descriptor_tree() {
    let ts = TypeSystem::new();
    let shape = Shape::structure([
        ("id", Shape::Scalar(ScalarKind::Uint32)),
        (
            "samples",
            Shape::array(Shape::Scalar(ScalarKind::Int16), 3),
        ),
    ]);
    let described = ts.describe(&shape).unwrap();
    let repr = ts.registry().intern(&shape).unwrap();
    assert!(Arc::ptr_eq(described.repr(), &repr));
    assert_eq!(described.field_offsets(), vec![0, 4]);
}

#[test]
fn repeat_requires_array_type() {
    let ts = TypeSystem::new();
    let int8 = ts.scalar_type(ScalarKind::Int8);
    assert!(matches!(
        int8.repeat(&Value::from(1)),
        Err(TypedError::InvalidArgument { .. })
    ));
}

#[test]
fn fill_checks_representation() {
    let ts = TypeSystem::new();
    let int8 = ts.scalar_type(ScalarKind::Int8);
    let four = ts.array_type(&int8, 4).unwrap();
    let five = ts.array_type(&int8, 5).unwrap();
    let datum = five.create_zeroed().unwrap();

    assert!(matches!(
        four.fill(&datum, &Value::from(3)),
        Err(TypedError::ConversionFailure { .. })
    ));
    five.fill(&datum, &Value::from(3)).unwrap();
    assert_eq!(
        datum.snapshot().unwrap(),
        Value::List(vec![Value::from(3); 5])
    );
}

#[test]
fn construct_with_initial_value() {
    let ts = TypeSystem::new();
    let int32 = ts.scalar_type(ScalarKind::Int32);
    let point = ts
        .struct_type([("x", int32.clone()), ("y", int32)])
        .unwrap();
    let initial = Value::record([("x", Value::from(1)), ("y", Value::from(-2))]);
    let datum = point.construct(Some(&initial)).unwrap();
    assert_eq!(datum.get("x").unwrap(), Value::from(1));
    assert_eq!(datum.get("y").unwrap(), Value::from(-2));

    let zeroed = point.construct(None).unwrap();
    assert_eq!(zeroed.get("y").unwrap(), Value::from(0));
}

#[test]
fn with_prototype_keeps_equivalence() {
    let ts = TypeSystem::new();
    let int8 = ts.scalar_type(ScalarKind::Int8);
    let arr = ts.array_type(&int8, 2).unwrap();
    assert!(arr.prototype().is_none());
    let proto: Arc<dyn Prototype> = Arc::new(PlainPrototype::new());
    let custom = arr.with_prototype(proto);
    assert!(custom.equivalent(&arr));
    assert!(custom.prototype().is_some());
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//! Tests for structural property dispatch.

use super::*;
use crate::error::CollectingSink;
use crate::repr::{ScalarKind, TypeClass};
use crate::runtime::TypeSystem;
use std::sync::Arc;

fn point(ts: &TypeSystem) -> TypeRef {
    let int32 = ts.scalar_type(ScalarKind::Int32);
    ts.struct_type([("x", int32.clone()), ("y", int32)]).unwrap()
}

#[test]
fn property_key_parsing() {
    assert_eq!(PropertyKey::parse("0"), PropertyKey::Index(0));
    assert_eq!(PropertyKey::parse("4294967294"), PropertyKey::Index(u32::MAX - 1));
    assert!(!PropertyKey::parse("4294967295").is_index());
    assert!(!PropertyKey::parse("007").is_index());
    assert!(!PropertyKey::parse("+1").is_index());
    assert!(!PropertyKey::parse("").is_index());
    assert_eq!(PropertyKey::from(-1).as_name(), Some("-1"));
    assert_eq!(PropertyKey::from(String::from("12")).as_index(), Some(12));
    assert_eq!(PropertyKey::Index(5).to_string(), "5");
}

#[test]
fn attrs_combine() {
    let attrs = PropertyAttrs::ENUMERATE | PropertyAttrs::PERMANENT;
    assert!(attrs.contains(PropertyAttrs::ENUMERATE));
    assert!(!attrs.contains(PropertyAttrs::READONLY));
    assert_eq!(attrs.bits(), 0b101);
    assert!(PropertyAttrs::NONE.is_empty());
}

#[test]
fn array_index_access() {
    let ts = TypeSystem::new();
    let uint8 = ts.scalar_type(ScalarKind::Uint8);
    let arr = ts.array_type(&uint8, 4).unwrap();
    let datum = arr.create_zeroed().unwrap();

    datum.set(1, &Value::from(-1)).unwrap();
    assert_eq!(datum.get(1).unwrap(), Value::from(255));
    assert_eq!(datum.get("length").unwrap(), Value::from(4));
    assert_eq!(datum.get(4).unwrap(), Value::Undefined);

    assert!(matches!(
        datum.set(4, &Value::from(1)),
        Err(TypedError::IndexOutOfRange { index: 4, length: 4, .. })
    ));
    assert!(matches!(
        datum.set("length", &Value::from(1)),
        Err(TypedError::ReadOnlyProperty { .. })
    ));
}

#[test]
fn struct_field_access() {
    let ts = TypeSystem::new();
    let datum = point(&ts).create_zeroed().unwrap();
    datum.set("y", &Value::from(7.9)).unwrap();
    assert_eq!(datum.get("y").unwrap(), Value::from(7));
    assert_eq!(datum.get("x").unwrap(), Value::from(0));
    assert_eq!(datum.get("z").unwrap(), Value::Undefined);
    assert_eq!(datum.get(0).unwrap(), Value::Undefined);
}

#[test]
fn own_properties_cannot_be_redefined_or_deleted() {
    let ts = TypeSystem::new();
    let uint8 = ts.scalar_type(ScalarKind::Uint8);
    let arr = ts.array_type(&uint8, 2).unwrap().create_zeroed().unwrap();
    let rec = point(&ts).create_zeroed().unwrap();

    for key in [PropertyKey::Index(0), PropertyKey::from("length")] {
        assert!(matches!(
            arr.define(&key, Value::from(1), PropertyAttrs::NONE),
            Err(TypedError::CannotRedefine { .. })
        ));
        assert!(matches!(arr.delete(&key), Err(TypedError::CannotDelete { .. })));
        assert!(matches!(
            arr.set_attributes(&key, PropertyAttrs::ENUMERATE),
            Err(TypedError::CannotRedefine { .. })
        ));
    }
    assert!(matches!(
        rec.define("x", Value::from(1), PropertyAttrs::ENUMERATE),
        Err(TypedError::CannotRedefine { .. })
    ));
    assert!(matches!(rec.delete("y"), Err(TypedError::CannotDelete { .. })));
}

#[test]
fn attributes_of_own_properties() {
    let ts = TypeSystem::new();
    let uint8 = ts.scalar_type(ScalarKind::Uint8);
    let arr = ts.array_type(&uint8, 2).unwrap().create_zeroed().unwrap();

    let element = arr.attributes(0);
    assert!(element.contains(PropertyAttrs::ENUMERATE | PropertyAttrs::PERMANENT));
    assert!(!element.contains(PropertyAttrs::READONLY));

    let length = arr.attributes("length");
    assert!(length.contains(PropertyAttrs::READONLY | PropertyAttrs::PERMANENT));
    assert!(!length.contains(PropertyAttrs::ENUMERATE));

    assert!(arr.attributes(2).is_empty());
    assert!(arr.attributes("toString").is_empty());
    assert_eq!(
        arr.lookup(1),
        Some(PropertyOwner::Own(PropertyAttrs::ENUMERATE | PropertyAttrs::PERMANENT))
    );
    assert_eq!(arr.lookup(9), None);
}

#[test]
fn enumeration_is_lazy_and_restartable() {
    let ts = TypeSystem::new();
    let int8 = ts.scalar_type(ScalarKind::Int8);
    let arr = ts.array_type(&int8, 3).unwrap().create_zeroed().unwrap();
    let rec = point(&ts).create_zeroed().unwrap();
    let scalar = int8.create_zeroed().unwrap();

    let mut keys = arr.own_keys();
    assert_eq!(keys.len(), 3);
    assert_eq!(keys.next(), Some(PropertyKey::Index(0)));
    assert_eq!(keys.next(), Some(PropertyKey::Index(1)));
    keys.restart();
    let all: Vec<PropertyKey> = keys.collect();
    assert_eq!(
        all,
        vec![PropertyKey::Index(0), PropertyKey::Index(1), PropertyKey::Index(2)]
    );

    let names: Vec<String> = rec.own_keys().map(|k| k.to_string()).collect();
    assert_eq!(names, vec!["x", "y"]);
    assert_eq!(scalar.own_keys().count(), 0);
}

#[test]
fn non_own_properties_delegate_to_prototype() {
    let proto = Arc::new(
        PlainPrototype::new()
            .with_property("kind", Value::from("point"), PropertyAttrs::ENUMERATE)
            .with_property(
                "version",
                Value::from(1),
                PropertyAttrs::READONLY | PropertyAttrs::PERMANENT,
            ),
    );
    let ts = TypeSystem::builder()
        .prototype(TypeClass::Struct, proto.clone())
        .build();
    let datum = point(&ts).create_zeroed().unwrap();

    assert_eq!(datum.get("kind").unwrap(), Value::from("point"));
    assert_eq!(
        datum.lookup("kind"),
        Some(PropertyOwner::Prototype(PropertyAttrs::ENUMERATE))
    );
    assert!(matches!(
        datum.set("version", &Value::from(2)),
        Err(TypedError::ReadOnlyProperty { .. })
    ));
    assert!(matches!(
        datum.set("missing", &Value::from(2)),
        Err(TypedError::NotExtensible { .. })
    ));

    datum
        .define("label", Value::from("p"), PropertyAttrs::ENUMERATE)
        .unwrap();
    assert_eq!(proto.len(), 3);
    assert_eq!(
        datum.keys(),
        vec![
            PropertyKey::from("x"),
            PropertyKey::from("y"),
            PropertyKey::from("kind"),
            PropertyKey::from("label"),
        ]
    );
    assert!(datum.delete("label").unwrap());
    assert!(!datum.delete("label").unwrap());
    assert!(matches!(
        datum.delete("version"),
        Err(TypedError::CannotDelete { .. })
    ));
    datum.set_attributes("kind", PropertyAttrs::NONE).unwrap();
    assert!(datum.attributes("kind").is_empty());
}

#[test]
fn scalar_datums_own_nothing() {
    let proto = Arc::new(PlainPrototype::new().with_property(
        "bits",
        Value::from(16),
        PropertyAttrs::NONE,
    ));
    let ts = TypeSystem::new();
    let int16 = ts.scalar_type(ScalarKind::Int16).with_prototype(proto);
    let datum = int16.create_zeroed().unwrap();
    assert_eq!(datum.get("bits").unwrap(), Value::from(16));
    assert_eq!(datum.get(0).unwrap(), Value::Undefined);
    assert!(datum.keys().is_empty());
}

#[test]
fn without_prototype_non_own_access_is_inert() {
    let ts = TypeSystem::new();
    let datum = point(&ts).create_zeroed().unwrap();
    assert_eq!(datum.lookup("z"), None);
    assert!(!datum.delete("z").unwrap());
    assert!(matches!(
        datum.define("z", Value::Null, PropertyAttrs::NONE),
        Err(TypedError::NotExtensible { .. })
    ));
}

#[test]
fn dispatch_errors_reach_the_sink() {
    let sink = Arc::new(CollectingSink::new());
    let ts = TypeSystem::builder().error_sink(sink.clone()).build();
    let uint8 = ts.scalar_type(ScalarKind::Uint8);
    let arr = ts.array_type(&uint8, 2).unwrap().create_zeroed().unwrap();

    let _ = arr.set(5, &Value::from(1));
    let _ = arr.delete(0);
    let errors = sink.take();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].kind_name(), "IndexOutOfRange");
    assert_eq!(errors[0].type_name(), Some("ArrayType(uint8, 2)"));
    assert_eq!(errors[1].property(), Some("0"));
}

#[test]
fn unattached_handle_reads_fail() {
    let ts = TypeSystem::new();
    let handle = point(&ts).handle();
    assert!(matches!(handle.get("x"), Err(TypedError::Unattached { .. })));
    assert!(matches!(
        handle.set("x", &Value::from(1)),
        Err(TypedError::Unattached { .. })
    ));
    // Type-level answers need no memory.
    assert_eq!(handle.own_keys().count(), 2);
}

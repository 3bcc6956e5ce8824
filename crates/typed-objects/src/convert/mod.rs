// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reification (memory -> value) and conversion (value -> memory).
//!
//! Both walk the type recursively. Reading a scalar yields a number; reading
//! an array or struct yields a derived [`Datum`] view over the same bytes,
//! so nested data is never copied eagerly.
//!
//! Conversion is not transactional: an error aborts the walk and bytes
//! already written stay written.
//!
//! | Target | Accepted sources |
//! |--------|------------------|
//! | scalar | primitives (via `ToNumber`), scalar datums |
//! | array  | `List` with at least `length` items, array datums |
//! | struct | `Record` or datum providing every declared field |
//!
//! A datum whose type is equivalent to the target is block-copied.

pub mod numeric;
mod value;


pub use value::Value;

use crate::datum::Datum;
use crate::dispatch::PropertyKey;
use crate::error::{Result, TypedError};
use crate::types::{TypeDescriptor, TypeKind, TypeRef};

/// Materialise the value of `type_desc` at `offset` inside `datum`.
pub fn reify(type_desc: &TypeRef, datum: &Datum, offset: usize) -> Result<Value> {
    datum.report(read_value(type_desc, datum, offset))
}

/// Convert `value` into `datum` at `offset`, following `type_desc`'s shape.
pub fn convert_and_copy_to(
    type_desc: &TypeRef,
    datum: &Datum,
    offset: usize,
    value: &Value,
) -> Result<()> {
    datum.report(write_value(type_desc, datum, offset, value))
}

pub(crate) fn read_value(type_desc: &TypeRef, datum: &Datum, offset: usize) -> Result<Value> {
    match type_desc.kind() {
        TypeKind::Scalar(kind) => datum.read_scalar(*kind, offset).map(Value::Number),
        TypeKind::Array { .. } | TypeKind::Struct { .. } => {
            Datum::derive(type_desc, datum, offset).map(Value::Datum)
        }
    }
}

pub(crate) fn write_value(
    type_desc: &TypeRef,
    datum: &Datum,
    offset: usize,
    value: &Value,
) -> Result<()> {
    if let Value::Datum(source) = value {
        if source.type_desc().equivalent(type_desc) {
            log::trace!(
                "[convert] block copy of {} ({} bytes)",
                type_desc,
                type_desc.byte_length()
            );
            return datum.copy_from(offset, source);
        }
    }

    match type_desc.kind() {
        TypeKind::Scalar(kind) => {
            let number = scalar_source(type_desc, value)?;
            datum.write_scalar(*kind, offset, number)
        }
        TypeKind::Array { element, length } => {
            write_array(type_desc, element, *length, datum, offset, value)
        }
        TypeKind::Struct { fields, .. } => {
            for field in fields {
                let source = struct_source(type_desc, value, &field.name)?;
                write_value(&field.field_type, datum, offset + field.offset, &source)?;
            }
            Ok(())
        }
    }
}

fn write_array(
    type_desc: &TypeDescriptor,
    element: &TypeRef,
    length: usize,
    datum: &Datum,
    offset: usize,
    value: &Value,
) -> Result<()> {
    let stride = element.byte_length();
    match value {
        Value::List(items) => {
            check_arity(type_desc, items.len(), length)?;
            for (i, item) in items.iter().take(length).enumerate() {
                write_value(element, datum, offset + i * stride, item)?;
            }
            Ok(())
        }
        Value::Datum(source) => {
            let source_type = source.type_desc();
            let (Some(source_element), Some(available)) =
                (source_type.element_type(), source_type.length())
            else {
                return Err(conversion_failure(type_desc, value));
            };
            check_arity(type_desc, available, length)?;
            let source_stride = source_element.byte_length();
            for i in 0..length {
                let item = read_value(source_element, source, i * source_stride)?;
                write_value(element, datum, offset + i * stride, &item)?;
            }
            Ok(())
        }
        _ => Err(conversion_failure(type_desc, value)),
    }
}

fn check_arity(type_desc: &TypeDescriptor, available: usize, length: usize) -> Result<()> {
    if available < length {
        return Err(TypedError::InvalidArgument {
            type_name: type_desc.to_source(),
            reason: format!("source has {} elements, {} required", available, length),
        });
    }
    if available > length {
        log::trace!(
            "[convert] ignoring {} excess elements for {}",
            available - length,
            type_desc
        );
    }
    Ok(())
}

fn scalar_source(type_desc: &TypeDescriptor, value: &Value) -> Result<f64> {
    match value {
        Value::Datum(source) if source.type_desc().scalar_kind().is_some() => {
            match read_value(source.type_desc(), source, 0)? {
                Value::Number(n) => Ok(n),
                other => Err(conversion_failure(type_desc, &other)),
            }
        }
        other => other
            .to_number()
            .ok_or_else(|| conversion_failure(type_desc, other)),
    }
}

fn struct_source(type_desc: &TypeDescriptor, value: &Value, name: &str) -> Result<Value> {
    let missing = || TypedError::MissingField {
        type_name: type_desc.to_source(),
        field: name.to_string(),
    };
    match value {
        Value::Record(_) => value.field(name).cloned().ok_or_else(missing),
        Value::Datum(source) => {
            let key = PropertyKey::from(name);
            if source.lookup(&key).is_none() {
                return Err(missing());
            }
            source.get_inner(&key)
        }
        _ => Err(conversion_failure(type_desc, value)),
    }
}

fn conversion_failure(type_desc: &TypeDescriptor, value: &Value) -> TypedError {
    let value = match value {
        Value::Datum(d) => d.type_desc().to_source(),
        other => other.type_name().to_string(),
    };
    TypedError::ConversionFailure {
        type_name: type_desc.to_source(),
        value,
    }
}

/// Eager copy of the contents as plain values.
pub(crate) fn snapshot_at(type_desc: &TypeRef, datum: &Datum, offset: usize) -> Result<Value> {
    match type_desc.kind() {
        TypeKind::Scalar(kind) => datum.read_scalar(*kind, offset).map(Value::Number),
        TypeKind::Array { element, length } => {
            let stride = element.byte_length();
            (0..*length)
                .map(|i| snapshot_at(element, datum, offset + i * stride))
                .collect::<Result<Vec<_>>>()
                .map(Value::List)
        }
        TypeKind::Struct { fields, .. } => fields
            .iter()
            .map(|f| Ok((f.name.clone(), snapshot_at(&f.field_type, datum, offset + f.offset)?)))
            .collect::<Result<Vec<_>>>()
            .map(Value::Record),
    }
}

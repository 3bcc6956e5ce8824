// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural property access on datums.
//!
//! Every access first classifies the bound type, then either handles the
//! property itself or falls through to the [`Prototype`]:
//!
//! | Type   | Own properties                          | Everything else |
//! |--------|-----------------------------------------|-----------------|
//! | scalar | none                                    | prototype       |
//! | array  | indices `0..length`, `length` (readonly) | prototype       |
//! | struct | declared field names                    | prototype       |
//!
//! Arrays claim the whole index space: an index at or past `length` reads as
//! `undefined`, and writing it fails, without asking the prototype.
//! Own properties are fixed: define, delete and reconfigure always fail.

mod prototype;

#[cfg(test)]
mod tests;

pub use prototype::{PlainPrototype, Prototype};

use crate::convert::{self, Value};
use crate::datum::Datum;
use crate::error::{Result, TypedError};
use crate::types::{FieldInfo, TypeKind, TypeRef};
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

/// Largest array index (2^32 - 2).
const MAX_INDEX: u32 = u32::MAX - 1;

/// A property name: canonical array index or string name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Index(u32),
    Name(Arc<str>),
}

impl PropertyKey {
    /// Canonical index strings (`"0"`, `"17"`, no sign or leading zero)
    /// become `Index`, everything else `Name`.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match parse_index(name) {
            Some(index) => Self::Index(index),
            None => Self::Name(Arc::from(name)),
        }
    }

    #[must_use]
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }

    #[must_use]
    pub fn as_index(&self) -> Option<u32> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Name(_) => None,
        }
    }

    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Index(_) => None,
            Self::Name(name) => Some(&**name),
        }
    }
}

fn parse_index(name: &str) -> Option<u32> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || (bytes.len() > 1 && bytes[0] == b'0') {
        return None;
    }
    if !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    name.parse::<u32>().ok().filter(|i| *i <= MAX_INDEX)
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{}", i),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<u32> for PropertyKey {
    fn from(index: u32) -> Self {
        if index <= MAX_INDEX {
            Self::Index(index)
        } else {
            Self::Name(Arc::from(index.to_string()))
        }
    }
}

impl From<i32> for PropertyKey {
    fn from(index: i32) -> Self {
        match u32::try_from(index) {
            Ok(index) => Self::from(index),
            Err(_) => Self::Name(Arc::from(index.to_string())),
        }
    }
}

impl From<usize> for PropertyKey {
    fn from(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(index) => Self::from(index),
            Err(_) => Self::Name(Arc::from(index.to_string())),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for PropertyKey {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<Arc<str>> for PropertyKey {
    fn from(name: Arc<str>) -> Self {
        match parse_index(&name) {
            Some(index) => Self::Index(index),
            None => Self::Name(name),
        }
    }
}

impl From<&PropertyKey> for PropertyKey {
    fn from(key: &PropertyKey) -> Self {
        key.clone()
    }
}

/// Property attribute bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PropertyAttrs(u8);

impl PropertyAttrs {
    pub const NONE: Self = Self(0);
    pub const ENUMERATE: Self = Self(1);
    pub const READONLY: Self = Self(1 << 1);
    pub const PERMANENT: Self = Self(1 << 2);

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PropertyAttrs {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Who answers for a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyOwner {
    Own(PropertyAttrs),
    Prototype(PropertyAttrs),
}

/// Own property resolved against the bound type.
enum OwnProperty<'a> {
    Element { element: &'a TypeRef, offset: usize },
    Length(usize),
    Field(&'a FieldInfo),
    /// Index at or past `length`: claimed by the array, no storage.
    PastEnd { index: u32, length: usize },
}

impl OwnProperty<'_> {
    fn attrs(&self) -> Option<PropertyAttrs> {
        match self {
            Self::Element { .. } | Self::Field(_) => {
                Some(PropertyAttrs::ENUMERATE | PropertyAttrs::PERMANENT)
            }
            Self::Length(_) => Some(PropertyAttrs::READONLY | PropertyAttrs::PERMANENT),
            Self::PastEnd { .. } => None,
        }
    }
}

const LENGTH: &str = "length";

impl Datum {
    fn own_property(&self, key: &PropertyKey) -> Option<OwnProperty<'_>> {
        match (self.type_desc().kind(), key) {
            (TypeKind::Array { element, length }, PropertyKey::Index(i)) => {
                let index = *i as usize;
                Some(if index < *length {
                    OwnProperty::Element {
                        element,
                        offset: index * element.byte_length(),
                    }
                } else {
                    OwnProperty::PastEnd {
                        index: *i,
                        length: *length,
                    }
                })
            }
            (TypeKind::Array { length, .. }, PropertyKey::Name(name)) if &**name == LENGTH => {
                Some(OwnProperty::Length(*length))
            }
            (TypeKind::Struct { .. }, PropertyKey::Name(name)) => {
                self.type_desc().field_named(name).map(OwnProperty::Field)
            }
            _ => None,
        }
    }

    fn prototype(&self) -> Option<&Arc<dyn Prototype>> {
        self.type_desc().prototype()
    }

    /// Where `key` resolves, if anywhere.
    #[must_use]
    pub fn lookup(&self, key: impl Into<PropertyKey>) -> Option<PropertyOwner> {
        let key = key.into();
        match self.own_property(&key) {
            Some(own) => own.attrs().map(PropertyOwner::Own),
            None => self
                .prototype()
                .and_then(|p| p.lookup(&key))
                .map(PropertyOwner::Prototype),
        }
    }

    /// Read a property.
    pub fn get(&self, key: impl Into<PropertyKey>) -> Result<Value> {
        let key = key.into();
        self.report(self.get_inner(&key))
    }

    pub(crate) fn get_inner(&self, key: &PropertyKey) -> Result<Value> {
        match self.own_property(key) {
            Some(OwnProperty::Element { element, offset }) => {
                convert::read_value(element, self, offset)
            }
            Some(OwnProperty::Field(field)) => {
                convert::read_value(&field.field_type, self, field.offset)
            }
            Some(OwnProperty::Length(length)) => Ok(Value::Number(length as f64)),
            Some(OwnProperty::PastEnd { .. }) => Ok(Value::Undefined),
            None => match self.prototype() {
                Some(proto) => proto.get(self, key),
                None => Ok(Value::Undefined),
            },
        }
    }

    /// Assign a property, converting `value` into memory for own properties.
    pub fn set(&self, key: impl Into<PropertyKey>, value: &Value) -> Result<()> {
        let key = key.into();
        self.report(self.set_inner(&key, value))
    }

    fn set_inner(&self, key: &PropertyKey, value: &Value) -> Result<()> {
        match self.own_property(key) {
            Some(OwnProperty::Element { element, offset }) => {
                convert::write_value(element, self, offset, value)
            }
            Some(OwnProperty::Field(field)) => {
                convert::write_value(&field.field_type, self, field.offset, value)
            }
            Some(OwnProperty::Length(_)) => Err(TypedError::ReadOnlyProperty {
                type_name: self.type_desc().to_source(),
                property: LENGTH.into(),
            }),
            Some(OwnProperty::PastEnd { index, length }) => Err(TypedError::IndexOutOfRange {
                type_name: self.type_desc().to_source(),
                index,
                length,
            }),
            None => match self.prototype() {
                Some(proto) => proto.set(self, key, value),
                None => Err(prototype::not_extensible(self, key)),
            },
        }
    }

    /// Define a property. Own properties are fixed and cannot be redefined.
    pub fn define(
        &self,
        key: impl Into<PropertyKey>,
        value: Value,
        attrs: PropertyAttrs,
    ) -> Result<()> {
        let key = key.into();
        self.report(self.define_inner(&key, value, attrs))
    }

    fn define_inner(&self, key: &PropertyKey, value: Value, attrs: PropertyAttrs) -> Result<()> {
        match self.own_property(key) {
            Some(OwnProperty::PastEnd { index, length }) => Err(TypedError::IndexOutOfRange {
                type_name: self.type_desc().to_source(),
                index,
                length,
            }),
            Some(_) => Err(self.cannot_redefine(key)),
            None => match self.prototype() {
                Some(proto) => proto.define(self, key, value, attrs),
                None => Err(prototype::not_extensible(self, key)),
            },
        }
    }

    /// Delete a property; returns whether something was removed.
    pub fn delete(&self, key: impl Into<PropertyKey>) -> Result<bool> {
        let key = key.into();
        self.report(self.delete_inner(&key))
    }

    fn delete_inner(&self, key: &PropertyKey) -> Result<bool> {
        match self.own_property(key) {
            Some(OwnProperty::PastEnd { .. }) => Ok(false),
            Some(_) => Err(TypedError::CannotDelete {
                type_name: self.type_desc().to_source(),
                property: key.to_string(),
            }),
            None => match self.prototype() {
                Some(proto) => proto.delete(self, key),
                None => Ok(false),
            },
        }
    }

    /// Attributes of `key`; empty when nothing has it.
    #[must_use]
    pub fn attributes(&self, key: impl Into<PropertyKey>) -> PropertyAttrs {
        match self.lookup(key) {
            Some(PropertyOwner::Own(attrs) | PropertyOwner::Prototype(attrs)) => attrs,
            None => PropertyAttrs::NONE,
        }
    }

    /// Reconfigure a property. Fails for every own property.
    pub fn set_attributes(&self, key: impl Into<PropertyKey>, attrs: PropertyAttrs) -> Result<()> {
        let key = key.into();
        self.report(self.set_attributes_inner(&key, attrs))
    }

    fn set_attributes_inner(&self, key: &PropertyKey, attrs: PropertyAttrs) -> Result<()> {
        match self.own_property(key) {
            Some(_) => Err(self.cannot_redefine(key)),
            None => match self.prototype() {
                Some(proto) => proto.set_attributes(self, key, attrs),
                None => Err(prototype::not_extensible(self, key)),
            },
        }
    }

    /// Own enumerable keys: nothing for scalars, indices for arrays, field
    /// names in declaration order for structs.
    #[must_use]
    pub fn own_keys(&self) -> OwnKeys {
        OwnKeys {
            type_desc: Arc::clone(self.type_desc()),
            next: 0,
        }
    }

    /// Own keys followed by the prototype's enumerable keys.
    #[must_use]
    pub fn keys(&self) -> Vec<PropertyKey> {
        let mut keys: Vec<PropertyKey> = self.own_keys().collect();
        if let Some(proto) = self.prototype() {
            keys.extend(
                proto
                    .keys()
                    .into_iter()
                    .filter(|key| self.own_property(key).is_none()),
            );
        }
        keys
    }

    fn cannot_redefine(&self, key: &PropertyKey) -> TypedError {
        TypedError::CannotRedefine {
            type_name: self.type_desc().to_source(),
            property: key.to_string(),
        }
    }
}

/// Lazy, restartable enumeration of a datum's own keys.
#[derive(Debug, Clone)]
pub struct OwnKeys {
    type_desc: TypeRef,
    next: usize,
}

impl OwnKeys {
    /// Rewind to the first key.
    pub fn restart(&mut self) {
        self.next = 0;
    }

    fn total(&self) -> usize {
        match self.type_desc.kind() {
            TypeKind::Scalar(_) => 0,
            TypeKind::Array { length, .. } => (*length).min(MAX_INDEX as usize + 1),
            TypeKind::Struct { fields, .. } => fields.len(),
        }
    }
}

impl Iterator for OwnKeys {
    type Item = PropertyKey;

    fn next(&mut self) -> Option<PropertyKey> {
        if self.next >= self.total() {
            return None;
        }
        let key = match self.type_desc.kind() {
            TypeKind::Scalar(_) => None,
            TypeKind::Array { .. } => u32::try_from(self.next).ok().map(PropertyKey::Index),
            TypeKind::Struct { fields, .. } => fields
                .get(self.next)
                .map(|f| PropertyKey::Name(Arc::clone(&f.name))),
        };
        self.next += 1;
        key
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for OwnKeys {}

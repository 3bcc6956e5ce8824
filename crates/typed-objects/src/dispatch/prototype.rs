// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fallback for properties a datum's type does not own.

use super::{PropertyAttrs, PropertyKey};
use crate::convert::Value;
use crate::datum::Datum;
use crate::error::{Result, TypedError};
use parking_lot::RwLock;
use std::sync::Arc;

/// Host collaborator consulted for non-own properties.
///
/// `receiver` is the datum the access started from; implementations use it
/// for error context or receiver-dependent behaviour.
pub trait Prototype: Send + Sync {
    /// Attributes of `key` if this prototype (or its chain) has it.
    fn lookup(&self, key: &PropertyKey) -> Option<PropertyAttrs>;

    fn get(&self, receiver: &Datum, key: &PropertyKey) -> Result<Value>;

    /// Assignment; rejected unless the implementation accepts it.
    fn set(&self, receiver: &Datum, key: &PropertyKey, _value: &Value) -> Result<()> {
        Err(not_extensible(receiver, key))
    }

    fn define(
        &self,
        receiver: &Datum,
        key: &PropertyKey,
        value: Value,
        attrs: PropertyAttrs,
    ) -> Result<()>;

    /// Returns whether a property was removed.
    fn delete(&self, receiver: &Datum, key: &PropertyKey) -> Result<bool>;

    fn set_attributes(
        &self,
        receiver: &Datum,
        key: &PropertyKey,
        attrs: PropertyAttrs,
    ) -> Result<()>;

    /// Enumerable keys, nearest first.
    fn keys(&self) -> Vec<PropertyKey>;
}

pub(crate) fn not_extensible(receiver: &Datum, key: &PropertyKey) -> TypedError {
    TypedError::NotExtensible {
        type_name: receiver.type_desc().to_source(),
        property: key.to_string(),
    }
}

struct Slot {
    key: PropertyKey,
    value: Value,
    attrs: PropertyAttrs,
}

/// Ordered property map with an optional parent, enough for hosts that do
/// not bring their own object model.
#[derive(Default)]
pub struct PlainPrototype {
    slots: RwLock<Vec<Slot>>,
    parent: Option<Arc<dyn Prototype>>,
}

impl PlainPrototype {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_parent(parent: Arc<dyn Prototype>) -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
            parent: Some(parent),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_property(
        self,
        key: impl Into<PropertyKey>,
        value: Value,
        attrs: PropertyAttrs,
    ) -> Self {
        self.insert(key, value, attrs);
        self
    }

    /// Add or replace a property without any attribute checks.
    pub fn insert(&self, key: impl Into<PropertyKey>, value: Value, attrs: PropertyAttrs) {
        let key = key.into();
        let mut slots = self.slots.write();
        match slots.iter_mut().find(|slot| slot.key == key) {
            Some(slot) => {
                slot.value = value;
                slot.attrs = attrs;
            }
            None => slots.push(Slot { key, value, attrs }),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    fn own_attrs(&self, key: &PropertyKey) -> Option<PropertyAttrs> {
        self.slots
            .read()
            .iter()
            .find(|slot| &slot.key == key)
            .map(|slot| slot.attrs)
    }
}

impl Prototype for PlainPrototype {
    fn lookup(&self, key: &PropertyKey) -> Option<PropertyAttrs> {
        self.own_attrs(key)
            .or_else(|| self.parent.as_ref().and_then(|p| p.lookup(key)))
    }

    fn get(&self, receiver: &Datum, key: &PropertyKey) -> Result<Value> {
        let own = self
            .slots
            .read()
            .iter()
            .find(|slot| &slot.key == key)
            .map(|slot| slot.value.clone());
        match (own, &self.parent) {
            (Some(value), _) => Ok(value),
            (None, Some(parent)) => parent.get(receiver, key),
            (None, None) => Ok(Value::Undefined),
        }
    }

    fn set(&self, receiver: &Datum, key: &PropertyKey, value: &Value) -> Result<()> {
        {
            let mut slots = self.slots.write();
            if let Some(slot) = slots.iter_mut().find(|slot| &slot.key == key) {
                if slot.attrs.contains(PropertyAttrs::READONLY) {
                    return Err(TypedError::ReadOnlyProperty {
                        type_name: receiver.type_desc().to_source(),
                        property: key.to_string(),
                    });
                }
                slot.value = value.clone();
                return Ok(());
            }
        }
        match &self.parent {
            Some(parent) => parent.set(receiver, key, value),
            None => Err(not_extensible(receiver, key)),
        }
    }

    fn define(
        &self,
        receiver: &Datum,
        key: &PropertyKey,
        value: Value,
        attrs: PropertyAttrs,
    ) -> Result<()> {
        if self
            .own_attrs(key)
            .is_some_and(|existing| existing.contains(PropertyAttrs::PERMANENT))
        {
            return Err(TypedError::CannotRedefine {
                type_name: receiver.type_desc().to_source(),
                property: key.to_string(),
            });
        }
        self.insert(key.clone(), value, attrs);
        Ok(())
    }

    fn delete(&self, receiver: &Datum, key: &PropertyKey) -> Result<bool> {
        let mut slots = self.slots.write();
        let Some(pos) = slots.iter().position(|slot| &slot.key == key) else {
            return Ok(false);
        };
        if slots[pos].attrs.contains(PropertyAttrs::PERMANENT) {
            return Err(TypedError::CannotDelete {
                type_name: receiver.type_desc().to_source(),
                property: key.to_string(),
            });
        }
        slots.remove(pos);
        Ok(true)
    }

    fn set_attributes(
        &self,
        receiver: &Datum,
        key: &PropertyKey,
        attrs: PropertyAttrs,
    ) -> Result<()> {
        let mut slots = self.slots.write();
        match slots.iter_mut().find(|slot| &slot.key == key) {
            Some(slot) if slot.attrs.contains(PropertyAttrs::PERMANENT) => {
                Err(TypedError::CannotRedefine {
                    type_name: receiver.type_desc().to_source(),
                    property: key.to_string(),
                })
            }
            Some(slot) => {
                slot.attrs = attrs;
                Ok(())
            }
            None => Err(TypedError::InvalidArgument {
                type_name: receiver.type_desc().to_source(),
                reason: format!("no property '{}' to reconfigure", key),
            }),
        }
    }

    fn keys(&self) -> Vec<PropertyKey> {
        let mut keys: Vec<PropertyKey> = self
            .slots
            .read()
            .iter()
            .filter(|slot| slot.attrs.contains(PropertyAttrs::ENUMERATE))
            .map(|slot| slot.key.clone())
            .collect();
        if let Some(parent) = &self.parent {
            for key in parent.keys() {
                if self.own_attrs(&key).is_none() {
                    keys.push(key);
                }
            }
        }
        keys
    }
}

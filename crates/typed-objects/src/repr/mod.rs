// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Canonical layout representations.
//!
//! A [`TypeRepr`] is the immutable layout of one shape: its size, alignment
//! and, for structs, the offset of every field. Representations are interned
//! by a [`TypeRegistry`], so two structurally identical shapes share one
//! `Arc<TypeRepr>` and type equality is pointer identity.
//!
//! # Layout rules
//!
//! - Scalar: size = alignment = byte width of the kind.
//! - Array: size = element size x length, alignment = element alignment.
//! - Struct: fields laid out left to right, each aligned to its own
//!   alignment; struct alignment is the max field alignment (1 when empty)
//!   and the size is rounded up to it.

mod registry;
mod scalar;


pub use registry::{LookupStats, Shape, TypeRegistry};
pub use scalar::ScalarKind;

use std::fmt;
use std::sync::Arc;

/// Identifier of an interned representation, unique within its registry.
pub type ReprId = u64;

/// Coarse classification used by the property dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    Scalar,
    Array,
    Struct,
}

/// One laid-out struct member.
#[derive(Debug, Clone)]
pub struct StructField {
    pub index: usize,
    pub name: Arc<str>,
    pub repr: Arc<TypeRepr>,
    pub offset: usize,
}

/// Shape-specific part of a representation.
#[derive(Debug)]
pub enum ReprKind {
    Scalar(ScalarKind),
    Array {
        element: Arc<TypeRepr>,
        length: usize,
    },
    Struct {
        fields: Vec<StructField>,
    },
}

/// Interned, immutable layout of a shape.
#[derive(Debug)]
pub struct TypeRepr {
    id: ReprId,
    registry: u64,
    size: usize,
    alignment: usize,
    kind: ReprKind,
}

impl TypeRepr {
    pub(crate) fn new(
        id: ReprId,
        registry: u64,
        size: usize,
        alignment: usize,
        kind: ReprKind,
    ) -> Self {
        Self {
            id,
            registry,
            size,
            alignment,
            kind,
        }
    }

    #[must_use]
    pub fn id(&self) -> ReprId {
        self.id
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    #[must_use]
    pub fn kind(&self) -> &ReprKind {
        &self.kind
    }

    #[must_use]
    pub fn class(&self) -> TypeClass {
        match self.kind {
            ReprKind::Scalar(_) => TypeClass::Scalar,
            ReprKind::Array { .. } => TypeClass::Array,
            ReprKind::Struct { .. } => TypeClass::Struct,
        }
    }

    /// Scalar kind, when this is a scalar representation.
    #[must_use]
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.kind {
            ReprKind::Scalar(kind) => Some(kind),
            _ => None,
        }
    }

    pub(crate) fn registry_id(&self) -> u64 {
        self.registry
    }
}

impl fmt::Display for TypeRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ReprKind::Scalar(kind) => f.write_str(kind.name()),
            ReprKind::Array { element, length } => {
                write!(f, "ArrayType({}, {})", element, length)
            }
            ReprKind::Struct { fields } => {
                f.write_str("StructType({")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.repr)?;
                }
                f.write_str("})")
            }
        }
    }
}

/// Round `offset` up to a multiple of `alignment` (a power of two).
pub(crate) fn align_up(offset: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    let mask = alignment - 1;
    offset.checked_add(mask).map(|v| v & !mask)
}

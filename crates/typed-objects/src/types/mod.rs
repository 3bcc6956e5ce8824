// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! User-facing type descriptors: `ScalarType`, `ArrayType`, `StructType`.
//!
//! A [`TypeDescriptor`] wraps one interned [`TypeRepr`] plus the metadata a
//! host needs (element type, field table) and the type-level operations:
//! instance construction, `repeat`, `fill`, handles. Descriptors are
//! immutable and shared as [`TypeRef`]. Two descriptors are
//! [`equivalent`](TypeDescriptor::equivalent) iff they share a representation.

mod builder;

#[cfg(test)]
mod tests;

pub use builder::StructTypeBuilder;

use crate::config::DuplicateFieldPolicy;
use crate::convert::{self, Value};
use crate::datum::Datum;
use crate::dispatch::{Prototype, PropertyKey};
use crate::error::{Result, TypedError};
use crate::repr::{ReprKind, ScalarKind, TypeClass, TypeRepr};
use crate::runtime::Shared;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shared reference to a descriptor.
pub type TypeRef = Arc<TypeDescriptor>;

/// One declared struct field.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub index: usize,
    pub name: Arc<str>,
    /// The descriptor the field was declared with.
    pub field_type: TypeRef,
    pub offset: usize,
}

/// Kind-specific descriptor metadata.
#[derive(Debug, Clone)]
pub enum TypeKind {
    Scalar(ScalarKind),
    Array {
        element: TypeRef,
        length: usize,
    },
    Struct {
        fields: Vec<FieldInfo>,
        by_name: HashMap<Arc<str>, usize>,
    },
}

/// A type value.
pub struct TypeDescriptor {
    shared: Arc<Shared>,
    repr: Arc<TypeRepr>,
    kind: TypeKind,
    prototype: Option<Arc<dyn Prototype>>,
}

impl TypeDescriptor {
    // ========================================================================
    // Construction
    // ========================================================================

    pub(crate) fn scalar(shared: &Arc<Shared>, kind: ScalarKind) -> TypeRef {
        Arc::new(Self {
            shared: Arc::clone(shared),
            repr: shared.registry.scalar(kind),
            kind: TypeKind::Scalar(kind),
            prototype: None,
        })
    }

    pub(crate) fn array(shared: &Arc<Shared>, element: &TypeRef, length: i64) -> Result<TypeRef> {
        if !Arc::ptr_eq(&element.shared, shared) {
            return Err(TypedError::InvalidArgument {
                type_name: "ArrayType".into(),
                reason: format!("element type {} belongs to another type system", element),
            });
        }
        if length < 0 {
            return Err(TypedError::InvalidArgument {
                type_name: format!("ArrayType({}, {})", element, length),
                reason: "length must not be negative".into(),
            });
        }

        let repr = shared.registry.array(&element.repr, length)?;
        let length = usize::try_from(length).map_err(|_| TypedError::InvalidLayout {
            reason: format!("array length {} does not fit the address space", length),
        })?;
        log::trace!("[types] built {}", repr);
        Ok(Arc::new(Self {
            shared: Arc::clone(shared),
            repr,
            kind: TypeKind::Array {
                element: Arc::clone(element),
                length,
            },
            prototype: None,
        }))
    }

    pub(crate) fn structure(
        shared: &Arc<Shared>,
        declared: Vec<(Arc<str>, TypeRef)>,
    ) -> Result<TypeRef> {
        let policy = shared.config.load().duplicate_fields;
        let mut by_name: HashMap<Arc<str>, usize> = HashMap::with_capacity(declared.len());

        for (index, (name, field_type)) in declared.iter().enumerate() {
            if !Arc::ptr_eq(&field_type.shared, shared) {
                return Err(TypedError::InvalidArgument {
                    type_name: "StructType".into(),
                    reason: format!("field '{}' has a type from another type system", name),
                });
            }
            if PropertyKey::parse(name).is_index() {
                return Err(TypedError::InvalidArgument {
                    type_name: "StructType".into(),
                    reason: format!("field name '{}' is an array index", name),
                });
            }
            if let Some(previous) = by_name.insert(Arc::clone(name), index) {
                match policy {
                    DuplicateFieldPolicy::Reject => {
                        return Err(TypedError::InvalidArgument {
                            type_name: "StructType".into(),
                            reason: format!("duplicate field name '{}'", name),
                        });
                    }
                    DuplicateFieldPolicy::Shadow => log::warn!(
                        "[types] field '{}' #{} shadows #{} in the name table",
                        name,
                        index,
                        previous
                    ),
                }
            }
        }

        let reprs: Vec<(Arc<str>, Arc<TypeRepr>)> = declared
            .iter()
            .map(|(name, ty)| (Arc::clone(name), Arc::clone(&ty.repr)))
            .collect();
        let repr = shared.registry.structure(&reprs)?;

        let ReprKind::Struct { fields: laid_out } = repr.kind() else {
            return Err(TypedError::InvalidLayout {
                reason: format!("{} is not a struct layout", repr),
            });
        };
        let offsets: Vec<usize> = laid_out.iter().map(|f| f.offset).collect();
        debug_assert_eq!(offsets.len(), declared.len());
        let fields = declared
            .into_iter()
            .zip(offsets)
            .enumerate()
            .map(|(index, ((name, field_type), offset))| FieldInfo {
                index,
                name,
                field_type,
                offset,
            })
            .collect();

        log::trace!("[types] built {}", repr);
        Ok(Arc::new(Self {
            shared: Arc::clone(shared),
            repr,
            kind: TypeKind::Struct { fields, by_name },
            prototype: None,
        }))
    }

    /// Same type (same representation) with its own fallback prototype.
    #[must_use]
    pub fn with_prototype(&self, prototype: Arc<dyn Prototype>) -> TypeRef {
        Arc::new(Self {
            shared: Arc::clone(&self.shared),
            repr: Arc::clone(&self.repr),
            kind: self.kind.clone(),
            prototype: Some(prototype),
        })
    }

    // ========================================================================
    // Type-level properties
    // ========================================================================

    #[must_use]
    pub fn repr(&self) -> &Arc<TypeRepr> {
        &self.repr
    }

    #[must_use]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    #[must_use]
    pub fn class(&self) -> TypeClass {
        self.repr.class()
    }

    #[must_use]
    pub fn byte_length(&self) -> usize {
        self.repr.size()
    }

    #[must_use]
    pub fn byte_alignment(&self) -> usize {
        self.repr.alignment()
    }

    /// Always false: every type has a fixed size.
    #[must_use]
    pub fn is_variable(&self) -> bool {
        false
    }

    #[must_use]
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.kind {
            TypeKind::Scalar(kind) => Some(kind),
            _ => None,
        }
    }

    #[must_use]
    pub fn element_type(&self) -> Option<&TypeRef> {
        match &self.kind {
            TypeKind::Array { element, .. } => Some(element),
            _ => None,
        }
    }

    #[must_use]
    pub fn length(&self) -> Option<usize> {
        match self.kind {
            TypeKind::Array { length, .. } => Some(length),
            _ => None,
        }
    }

    /// Declared fields in order; empty unless this is a struct type.
    #[must_use]
    pub fn fields(&self) -> &[FieldInfo] {
        match &self.kind {
            TypeKind::Struct { fields, .. } => fields,
            _ => &[],
        }
    }

    /// Field lookup through the name table built at construction.
    #[must_use]
    pub fn field_named(&self, name: &str) -> Option<&FieldInfo> {
        match &self.kind {
            TypeKind::Struct { fields, by_name } => by_name.get(name).map(|&i| &fields[i]),
            _ => None,
        }
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<Arc<str>> {
        self.fields().iter().map(|f| Arc::clone(&f.name)).collect()
    }

    #[must_use]
    pub fn field_offsets(&self) -> Vec<usize> {
        self.fields().iter().map(|f| f.offset).collect()
    }

    #[must_use]
    pub fn field_types(&self) -> Vec<TypeRef> {
        self.fields()
            .iter()
            .map(|f| Arc::clone(&f.field_type))
            .collect()
    }

    /// True iff both descriptors share one interned representation.
    #[must_use]
    pub fn equivalent(&self, other: &TypeDescriptor) -> bool {
        Arc::ptr_eq(&self.repr, &other.repr)
    }

    /// Source-like rendering, e.g. `ArrayType(uint8, 4)`.
    #[must_use]
    pub fn to_source(&self) -> String {
        self.repr.to_string()
    }

    /// Fallback for non-own properties: the descriptor's own prototype, else
    /// the type system default for this class.
    #[must_use]
    pub fn prototype(&self) -> Option<&Arc<dyn Prototype>> {
        self.prototype
            .as_ref()
            .or_else(|| self.shared.default_prototype(self.class()))
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    // ========================================================================
    // Instances
    // ========================================================================

    /// Allocate a zero-filled owning instance.
    pub fn create_zeroed(self: &Arc<Self>) -> Result<Datum> {
        self.shared.report(Datum::allocate(self))
    }

    /// Allocate, then convert `initial` into the new instance when given.
    pub fn construct(self: &Arc<Self>, initial: Option<&Value>) -> Result<Datum> {
        self.shared.report(self.construct_inner(initial))
    }

    fn construct_inner(self: &Arc<Self>, initial: Option<&Value>) -> Result<Datum> {
        let datum = Datum::allocate(self)?;
        if let Some(value) = initial {
            convert::write_value(self, &datum, 0, value)?;
        }
        Ok(datum)
    }

    /// Unattached handle of this type.
    #[must_use]
    pub fn handle(self: &Arc<Self>) -> Datum {
        Datum::unattached_handle(self)
    }

    /// New array instance with every element set to `value`.
    pub fn repeat(self: &Arc<Self>, value: &Value) -> Result<Datum> {
        self.shared.report(self.repeat_inner(value))
    }

    fn repeat_inner(self: &Arc<Self>, value: &Value) -> Result<Datum> {
        if self.class() != TypeClass::Array {
            return Err(TypedError::InvalidArgument {
                type_name: self.to_source(),
                reason: "repeat requires an array type".into(),
            });
        }
        let datum = Datum::allocate(self)?;
        self.fill_elements(&datum, value)?;
        Ok(datum)
    }

    /// Set every element of `datum` (an instance of this array type) to `value`.
    pub fn fill(&self, datum: &Datum, value: &Value) -> Result<()> {
        self.shared.report(self.fill_inner(datum, value))
    }

    fn fill_inner(&self, datum: &Datum, value: &Value) -> Result<()> {
        if self.class() != TypeClass::Array {
            return Err(TypedError::InvalidArgument {
                type_name: self.to_source(),
                reason: "fill requires an array type".into(),
            });
        }
        if !self.equivalent(datum.type_desc()) {
            return Err(TypedError::ConversionFailure {
                type_name: self.to_source(),
                value: datum.type_desc().to_source(),
            });
        }
        self.fill_elements(datum, value)
    }

    fn fill_elements(&self, datum: &Datum, value: &Value) -> Result<()> {
        if let TypeKind::Array { element, length } = &self.kind {
            let stride = element.byte_length();
            for i in 0..*length {
                convert::write_value(element, datum, i * stride, value)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.repr, f)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("source", &self.to_source())
            .field("size", &self.byte_length())
            .field("alignment", &self.byte_alignment())
            .field("prototype", &self.prototype.is_some())
            .finish()
    }
}

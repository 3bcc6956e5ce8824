// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder for struct types.
//!
//! ```
//! use typed_objects::{ScalarKind, TypeSystem};
//!
//! let ts = TypeSystem::new();
//! let int32 = ts.scalar_type(ScalarKind::Int32);
//! let point = ts
//!     .struct_builder()
//!     .field("x", &int32)
//!     .field("y", &int32)
//!     .build()
//!     .unwrap();
//! assert_eq!(point.byte_length(), 8);
//! ```

use super::{TypeDescriptor, TypeRef};
use crate::error::Result;
use crate::runtime::Shared;
use std::sync::Arc;

/// Collects fields in declaration order, then builds one `StructType`.
pub struct StructTypeBuilder {
    shared: Arc<Shared>,
    fields: Vec<(Arc<str>, TypeRef)>,
}

impl StructTypeBuilder {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<Arc<str>>, field_type: &TypeRef) -> Self {
        self.fields.push((name.into(), Arc::clone(field_type)));
        self
    }

    pub fn build(self) -> Result<TypeRef> {
        let result = TypeDescriptor::structure(&self.shared, self.fields);
        self.shared.report(result)
    }
}

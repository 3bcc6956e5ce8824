// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The `TypeSystem`: explicit owner of the registry, allocator, config and
//! error sink shared by every descriptor and datum it creates.
//!
//! There is no process-wide state. Two type systems never share
//! representations, and mixing their descriptors is an `InvalidArgument`.

use crate::config::TypeSystemConfig;
use crate::datum::{Allocator, Datum, HeapAllocator};
use crate::dispatch::Prototype;
use crate::error::{ErrorSink, Result};
use crate::repr::{ScalarKind, Shape, TypeClass, TypeRegistry};
use crate::types::{StructTypeBuilder, TypeDescriptor, TypeRef};
use arc_swap::ArcSwap;
use std::sync::Arc;

/// State shared by a type system and everything built from it.
pub(crate) struct Shared {
    pub(crate) registry: TypeRegistry,
    pub(crate) allocator: Arc<dyn Allocator>,
    pub(crate) config: ArcSwap<TypeSystemConfig>,
    sink: Option<Arc<dyn ErrorSink>>,
    prototypes: DefaultPrototypes,
}

#[derive(Default, Clone)]
struct DefaultPrototypes {
    scalar: Option<Arc<dyn Prototype>>,
    array: Option<Arc<dyn Prototype>>,
    structure: Option<Arc<dyn Prototype>>,
}

impl Shared {
    /// Forward an error to the sink (if any) and hand the result back.
    pub(crate) fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            log::debug!("[runtime] {}: {}", err.kind_name(), err);
            if let Some(sink) = &self.sink {
                sink.report(err);
            }
        }
        result
    }

    pub(crate) fn default_prototype(&self, class: TypeClass) -> Option<&Arc<dyn Prototype>> {
        match class {
            TypeClass::Scalar => self.prototypes.scalar.as_ref(),
            TypeClass::Array => self.prototypes.array.as_ref(),
            TypeClass::Struct => self.prototypes.structure.as_ref(),
        }
    }
}

/// Entry point: builds types and allocates datums.
///
/// ```
/// use typed_objects::{ScalarKind, TypeSystem, Value};
///
/// let ts = TypeSystem::new();
/// let uint8 = ts.scalar_type(ScalarKind::Uint8);
/// let bytes = ts.array_type(&uint8, 4).unwrap();
/// let datum = bytes.repeat(&Value::from(0)).unwrap();
/// datum.set(2, &Value::from(500)).unwrap();
/// assert_eq!(datum.get(2).unwrap(), Value::from(244));
/// ```
#[derive(Clone)]
pub struct TypeSystem {
    shared: Arc<Shared>,
}

impl TypeSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn with_config(config: TypeSystemConfig) -> Self {
        Self::builder().config(config).build()
    }

    #[must_use]
    pub fn builder() -> TypeSystemBuilder {
        TypeSystemBuilder::default()
    }

    /// `ScalarType(kind)`; never fails.
    #[must_use]
    pub fn scalar_type(&self, kind: ScalarKind) -> TypeRef {
        TypeDescriptor::scalar(&self.shared, kind)
    }

    /// `ArrayType(element, length)`.
    pub fn array_type(&self, element: &TypeRef, length: i64) -> Result<TypeRef> {
        self.shared
            .report(TypeDescriptor::array(&self.shared, element, length))
    }

    /// `StructType(fields)`, fields in declaration order.
    pub fn struct_type<I, S>(&self, fields: I) -> Result<TypeRef>
    where
        I: IntoIterator<Item = (S, TypeRef)>,
        S: Into<Arc<str>>,
    {
        let fields = fields.into_iter().map(|(n, t)| (n.into(), t)).collect();
        self.shared
            .report(TypeDescriptor::structure(&self.shared, fields))
    }

    #[must_use]
    pub fn struct_builder(&self) -> StructTypeBuilder {
        StructTypeBuilder::new(Arc::clone(&self.shared))
    }

    /// Build descriptors for a whole shape tree.
    pub fn describe(&self, shape: &Shape) -> Result<TypeRef> {
        self.shared.report(self.describe_inner(shape))
    }

    fn describe_inner(&self, shape: &Shape) -> Result<TypeRef> {
        match shape {
            Shape::Scalar(kind) => Ok(self.scalar_type(*kind)),
            Shape::Array(element, length) => {
                let element = self.describe_inner(element)?;
                TypeDescriptor::array(&self.shared, &element, *length)
            }
            Shape::Struct(fields) => {
                let fields = fields
                    .iter()
                    .map(|(name, shape)| Ok((Arc::from(name.as_str()), self.describe_inner(shape)?)))
                    .collect::<Result<Vec<_>>>()?;
                TypeDescriptor::structure(&self.shared, fields)
            }
        }
    }

    /// Allocate a zero-filled owning datum.
    pub fn create_zeroed(&self, type_desc: &TypeRef) -> Result<Datum> {
        type_desc.create_zeroed()
    }

    /// Unattached handle of `type_desc`.
    #[must_use]
    pub fn new_handle(&self, type_desc: &TypeRef) -> Datum {
        type_desc.handle()
    }

    /// Whether `type_desc` was built by this type system.
    #[must_use]
    pub fn owns(&self, type_desc: &TypeDescriptor) -> bool {
        Arc::ptr_eq(type_desc.shared(), &self.shared)
    }

    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.shared.registry
    }

    #[must_use]
    pub fn allocator(&self) -> &Arc<dyn Allocator> {
        &self.shared.allocator
    }

    #[must_use]
    pub fn config(&self) -> Arc<TypeSystemConfig> {
        self.shared.config.load_full()
    }

    /// Replace the configuration; affects types and datums created afterwards.
    pub fn set_config(&self, config: TypeSystemConfig) {
        log::debug!("[runtime] config replaced: {:?}", config);
        self.shared.config.store(Arc::new(config));
    }
}

impl Default for TypeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeSystem")
            .field("registry", &self.shared.registry)
            .field("config", &self.config())
            .finish_non_exhaustive()
    }
}

/// Fluent construction of a [`TypeSystem`].
#[derive(Default)]
pub struct TypeSystemBuilder {
    config: TypeSystemConfig,
    allocator: Option<Arc<dyn Allocator>>,
    sink: Option<Arc<dyn ErrorSink>>,
    prototypes: DefaultPrototypes,
}

impl TypeSystemBuilder {
    #[must_use]
    pub fn config(mut self, config: TypeSystemConfig) -> Self {
        self.config = config;
        self
    }

    /// Storage allocator for owning datums (default: [`HeapAllocator`]).
    #[must_use]
    pub fn allocator(mut self, allocator: Arc<dyn Allocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    #[must_use]
    pub fn error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Fallback for non-own properties of every datum of `class`, unless the
    /// descriptor carries its own prototype.
    #[must_use]
    pub fn prototype(mut self, class: TypeClass, prototype: Arc<dyn Prototype>) -> Self {
        let slot = match class {
            TypeClass::Scalar => &mut self.prototypes.scalar,
            TypeClass::Array => &mut self.prototypes.array,
            TypeClass::Struct => &mut self.prototypes.structure,
        };
        *slot = Some(prototype);
        self
    }

    #[must_use]
    pub fn build(self) -> TypeSystem {
        let allocator = self
            .allocator
            .unwrap_or_else(|| Arc::new(HeapAllocator::new()));
        let shared = Shared {
            registry: TypeRegistry::new(),
            allocator,
            config: ArcSwap::from_pointee(self.config),
            sink: self.sink,
            prototypes: self.prototypes,
        };
        log::debug!("[runtime] type system created ({:?})", shared.registry);
        TypeSystem {
            shared: Arc::new(shared),
        }
    }
}

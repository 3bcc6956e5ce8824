// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # typed-objects - structured memory with runtime type descriptors
//!
//! Scalar, array and struct types are built at runtime, laid out with C-like
//! alignment and interned so that structurally equal types share one
//! representation. Datums are typed windows onto byte buffers: owning
//! objects, derived views, or handles that can be re-pointed at other
//! memory.
//!
//! ## Quick Start
//!
//! ```rust
//! use typed_objects::{ScalarKind, TypeSystem, Value};
//!
//! let ts = TypeSystem::new();
//! let f64_type = ts.scalar_type(ScalarKind::Float64);
//! let point = ts
//!     .struct_type([("x", f64_type.clone()), ("y", f64_type)])
//!     .unwrap();
//! assert_eq!(point.byte_length(), 16);
//!
//! let p = point
//!     .construct(Some(&Value::record([("x", Value::from(1.5)), ("y", Value::from(-2.0))])))
//!     .unwrap();
//! assert_eq!(p.get("y").unwrap(), Value::from(-2.0));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |   TypeSystem (registry, allocator, config, error sink, prototypes)  |
//! +---------------------------------------------------------------------+
//! |   TypeDescriptor  ->  TypeRepr (interned layout, shared by shape)   |
//! +---------------------------------------------------------------------+
//! |   Datum (object | handle)  ->  Storage (shared buffer, freed once)  |
//! +---------------------------------------------------------------------+
//! |   dispatch (own properties, prototype fallback) | convert | fast    |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`repr`] - scalar kinds, layout and the interning registry
//! - [`types`] - user-facing type descriptors
//! - [`datum`] - objects, handles and buffer ownership
//! - [`convert`] - reading and writing host values at typed locations
//! - [`dispatch`] - property access over datums
//! - [`fast`] - unchecked-by-dispatch access for worker threads
//! - [`config`] - constants and runtime knobs

/// Constants and runtime configuration.
pub mod config;
/// Host values and conversion to and from typed memory.
pub mod convert;
/// Datums, handles and buffer storage.
pub mod datum;
/// Structural property dispatch.
pub mod dispatch;
/// Error type and error sinks.
pub mod error;
/// Raw scalar access and copies without error reporting.
pub mod fast;
/// Type representations and the interning registry.
pub mod repr;
mod runtime;
/// Type descriptors.
pub mod types;

pub use config::{DuplicateFieldPolicy, TypeSystemConfig};
pub use convert::{convert_and_copy_to, reify, Value};
pub use datum::{AllocStats, Allocator, Datum, DatumId, DatumKind, HeapAllocator};
pub use dispatch::{OwnKeys, PlainPrototype, PropertyAttrs, PropertyKey, PropertyOwner, Prototype};
pub use error::{CollectingSink, ErrorSink, Result, TypedError};
pub use repr::{ScalarKind, Shape, TypeClass, TypeRegistry, TypeRepr};
pub use runtime::{TypeSystem, TypeSystemBuilder};
pub use types::{FieldInfo, StructTypeBuilder, TypeDescriptor, TypeKind, TypeRef};

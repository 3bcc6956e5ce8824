// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types and the host-facing error sink.
//!
//! Every failure in this crate is a recoverable [`TypedError`]. Variants that
//! concern a datum or a type carry the rendered shape of the offending type
//! (`ArrayType(uint8, 4)`, ...) and, where it applies, the property name, so a
//! host can turn them into language-level exceptions without extra lookups.

use parking_lot::Mutex;
use std::fmt;

/// Errors surfaced by type construction, binding, dispatch and conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedError {
    // ========================================================================
    // Type construction
    // ========================================================================
    /// Shape cannot be laid out (negative length, size overflow, foreign repr).
    InvalidLayout { reason: String },
    /// Bad constructor or conversion input.
    InvalidArgument { type_name: String, reason: String },

    // ========================================================================
    // Memory binding
    // ========================================================================
    /// `offset + size` does not fit in the target buffer.
    OutOfBounds {
        type_name: String,
        offset: usize,
        size: usize,
        limit: usize,
    },
    /// Memory access through a handle that is not attached.
    Unattached { type_name: String },
    /// Allocator refused the request or it exceeds the configured maximum.
    OutOfMemory { size: usize },

    // ========================================================================
    // Property dispatch
    // ========================================================================
    /// Array index assignment at or beyond `length`.
    IndexOutOfRange {
        type_name: String,
        index: u32,
        length: usize,
    },
    /// Write to a read-only property (array `length`).
    ReadOnlyProperty { type_name: String, property: String },
    /// Define or reconfigure an own property of a fixed-shape type.
    CannotRedefine { type_name: String, property: String },
    /// Delete an own property of a fixed-shape type.
    CannotDelete { type_name: String, property: String },
    /// Assignment to a non-own property that nothing accepts.
    NotExtensible { type_name: String, property: String },

    // ========================================================================
    // Conversion
    // ========================================================================
    /// Source record lacks a declared struct field.
    MissingField { type_name: String, field: String },
    /// Value is not coercible to the target shape.
    ConversionFailure { type_name: String, value: String },
}

impl TypedError {
    /// Short variant name, stable across releases (useful as a host error code).
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::InvalidLayout { .. } => "InvalidLayout",
            Self::InvalidArgument { .. } => "InvalidArgument",
            Self::OutOfBounds { .. } => "OutOfBounds",
            Self::Unattached { .. } => "Unattached",
            Self::OutOfMemory { .. } => "OutOfMemory",
            Self::IndexOutOfRange { .. } => "IndexOutOfRange",
            Self::ReadOnlyProperty { .. } => "ReadOnlyProperty",
            Self::CannotRedefine { .. } => "CannotRedefine",
            Self::CannotDelete { .. } => "CannotDelete",
            Self::NotExtensible { .. } => "NotExtensible",
            Self::MissingField { .. } => "MissingField",
            Self::ConversionFailure { .. } => "ConversionFailure",
        }
    }

    /// Rendered shape of the type involved, when there is one.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::InvalidLayout { .. } | Self::OutOfMemory { .. } => None,
            Self::InvalidArgument { type_name, .. }
            | Self::OutOfBounds { type_name, .. }
            | Self::Unattached { type_name }
            | Self::IndexOutOfRange { type_name, .. }
            | Self::ReadOnlyProperty { type_name, .. }
            | Self::CannotRedefine { type_name, .. }
            | Self::CannotDelete { type_name, .. }
            | Self::NotExtensible { type_name, .. }
            | Self::MissingField { type_name, .. }
            | Self::ConversionFailure { type_name, .. } => Some(type_name),
        }
    }

    /// Property name involved, when there is one.
    #[must_use]
    pub fn property(&self) -> Option<&str> {
        match self {
            Self::ReadOnlyProperty { property, .. }
            | Self::CannotRedefine { property, .. }
            | Self::CannotDelete { property, .. }
            | Self::NotExtensible { property, .. } => Some(property),
            Self::MissingField { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl fmt::Display for TypedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLayout { reason } => write!(f, "Invalid layout: {}", reason),
            Self::InvalidArgument { type_name, reason } => {
                write!(f, "Invalid argument for {}: {}", type_name, reason)
            }
            Self::OutOfBounds {
                type_name,
                offset,
                size,
                limit,
            } => write!(
                f,
                "{} at offset {} ({} bytes) exceeds buffer of {} bytes",
                type_name, offset, size, limit
            ),
            Self::Unattached { type_name } => {
                write!(f, "Handle of type {} is not attached to memory", type_name)
            }
            Self::OutOfMemory { size } => write!(f, "Cannot allocate {} bytes", size),
            Self::IndexOutOfRange {
                type_name,
                index,
                length,
            } => write!(
                f,
                "Index {} out of range for {} (length {})",
                index, type_name, length
            ),
            Self::ReadOnlyProperty {
                type_name,
                property,
            } => write!(f, "Property '{}' of {} is read-only", property, type_name),
            Self::CannotRedefine {
                type_name,
                property,
            } => write!(f, "Cannot redefine property '{}' of {}", property, type_name),
            Self::CannotDelete {
                type_name,
                property,
            } => write!(f, "Cannot delete property '{}' of {}", property, type_name),
            Self::NotExtensible {
                type_name,
                property,
            } => write!(
                f,
                "Cannot add property '{}': {} is not extensible",
                property, type_name
            ),
            Self::MissingField { type_name, field } => {
                write!(f, "Value has no field '{}' required by {}", field, type_name)
            }
            Self::ConversionFailure { type_name, value } => {
                write!(f, "Cannot convert {} to {}", value, type_name)
            }
        }
    }
}

impl std::error::Error for TypedError {}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TypedError>;

/// Receives every error surfaced by a public operation of a `TypeSystem`.
///
/// The crate never prints; hosts plug a sink in to record diagnostics.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &TypedError);
}

/// Sink that keeps every reported error in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    errors: Mutex<Vec<TypedError>>,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the errors recorded so far, oldest first.
    #[must_use]
    pub fn errors(&self) -> Vec<TypedError> {
        self.errors.lock().clone()
    }

    /// Drain the recorded errors.
    pub fn take(&self) -> Vec<TypedError> {
        std::mem::take(&mut *self.errors.lock())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }
}

impl ErrorSink for CollectingSink {
    fn report(&self, error: &TypedError) {
        self.errors.lock().push(error.clone());
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Live bindings of a type to memory.
//!
//! A [`Datum`] is either an owning **object** or a non-owning **handle**.
//! Both share one layout-bound view: a type descriptor plus an optional
//! binding `(storage, offset)`. The state machine:
//!
//! ```text
//!   handle()  ---------> Unattached --attach/move_to--> Attached-derived
//!                            ^                               |
//!                            +------------ detach -----------+
//!   create_zeroed() -----> Attached-owning   (owner == self)
//!   derive(source) ------> Attached-derived  (owner == source's owner)
//! ```
//!
//! Derived datums share the source's [`Storage`] directly, so derivation
//! chains always flatten to the one owning buffer. Storage is reference
//! counted: a derived datum or attached handle keeps the owner's bytes alive,
//! and they are released exactly once, after the last user drops.

mod storage;


pub use storage::{AllocStats, Allocator, HeapAllocator};

pub(crate) use storage::{copy_bytes, Storage};

use crate::convert::{self, Value};
use crate::dispatch::PropertyKey;
use crate::error::{Result, TypedError};
use crate::repr::ScalarKind;
use crate::types::{TypeDescriptor, TypeKind, TypeRef};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_DATUM_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a datum, unique per process.
pub type DatumId = u64;

/// Ownership mode of a datum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatumKind {
    /// Owning instance, or derived from one.
    Object,
    /// Re-pointable view that never owns memory.
    Handle,
}

/// Where an attached datum's bytes live.
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) storage: Arc<Storage>,
    pub(crate) offset: usize,
}

struct DatumInner {
    id: DatumId,
    kind: DatumKind,
    type_desc: TypeRef,
    binding: RwLock<Option<Binding>>,
}

/// A typed view of memory. Cloning yields another reference to the same datum.
#[derive(Clone)]
pub struct Datum {
    inner: Arc<DatumInner>,
}

impl Datum {
    fn with_binding(type_desc: &TypeRef, kind: DatumKind, id: DatumId, binding: Option<Binding>) -> Self {
        Self {
            inner: Arc::new(DatumInner {
                id,
                kind,
                type_desc: Arc::clone(type_desc),
                binding: RwLock::new(binding),
            }),
        }
    }

    fn next_id() -> DatumId {
        NEXT_DATUM_ID.fetch_add(1, Ordering::Relaxed)
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Allocate a zero-filled buffer sized to `type_desc`; owner = self.
    pub(crate) fn allocate(type_desc: &TypeRef) -> Result<Self> {
        let shared = type_desc.shared();
        let size = type_desc.byte_length();
        if size > shared.config.load().max_buffer_size {
            return Err(TypedError::OutOfMemory { size });
        }
        let bytes = shared
            .allocator
            .alloc(size)
            .ok_or(TypedError::OutOfMemory { size })?;
        if bytes.len() != size {
            shared.allocator.free(bytes);
            return Err(TypedError::OutOfMemory { size });
        }

        let id = Self::next_id();
        let storage = Arc::new(Storage::new(id, bytes, Arc::clone(&shared.allocator)));
        log::trace!(
            "[datum] #{} allocated {} bytes for {}",
            id,
            size,
            type_desc
        );
        Ok(Self::with_binding(
            type_desc,
            DatumKind::Object,
            id,
            Some(Binding { storage, offset: 0 }),
        ))
    }

    /// View `type_desc` at `offset` inside `source`, sharing its owner.
    ///
    /// The new datum has the same kind as `source`.
    pub(crate) fn derive(type_desc: &TypeRef, source: &Datum, offset: usize) -> Result<Self> {
        let binding = source.locate(offset, type_desc.byte_length(), type_desc)?;
        Ok(Self::with_binding(
            type_desc,
            source.kind(),
            Self::next_id(),
            Some(binding),
        ))
    }

    pub(crate) fn unattached_handle(type_desc: &TypeRef) -> Self {
        Self::with_binding(type_desc, DatumKind::Handle, Self::next_id(), None)
    }

    /// Point this handle at `offset` bytes into `source`.
    pub fn attach(&self, source: &Datum, offset: usize) -> Result<()> {
        self.report(self.attach_inner(source, offset))
    }

    fn attach_inner(&self, source: &Datum, offset: usize) -> Result<()> {
        self.require_handle("attach")?;
        let binding = source.locate(offset, self.byte_length(), self.type_desc())?;
        log::trace!(
            "[datum] handle #{} attached to owner #{} at {}",
            self.id(),
            binding.storage.owner(),
            binding.offset
        );
        *self.inner.binding.write() = Some(binding);
        Ok(())
    }

    /// Point this handle at the sub-datum of `source` named by `path`.
    ///
    /// Each key selects an array element or struct field; the type reached
    /// must be equivalent to this handle's type.
    pub fn move_to(&self, source: &Datum, path: &[PropertyKey]) -> Result<()> {
        self.report(self.move_to_inner(source, path))
    }

    fn move_to_inner(&self, source: &Datum, path: &[PropertyKey]) -> Result<()> {
        self.require_handle("move")?;
        let mut current = Arc::clone(source.type_desc());
        let mut offset = 0usize;

        for key in path {
            let (next, delta) = match (current.kind(), key) {
                (TypeKind::Array { element, length }, PropertyKey::Index(i))
                    if (*i as usize) < *length =>
                {
                    (Arc::clone(element), *i as usize * element.byte_length())
                }
                (TypeKind::Struct { .. }, PropertyKey::Name(name)) => {
                    match current.field_named(name) {
                        Some(field) => (Arc::clone(&field.field_type), field.offset),
                        None => return Err(no_such_path(&current, key)),
                    }
                }
                _ => return Err(no_such_path(&current, key)),
            };
            current = next;
            offset += delta;
        }

        if !current.equivalent(self.type_desc()) {
            return Err(TypedError::InvalidArgument {
                type_name: self.type_desc().to_source(),
                reason: format!("path leads to {}", current),
            });
        }
        self.attach_inner(source, offset)
    }

    /// Clear a handle's binding. Never frees; a no-op when already unattached.
    pub fn detach(&self) -> Result<()> {
        self.report(self.detach_inner())
    }

    fn detach_inner(&self) -> Result<()> {
        self.require_handle("detach")?;
        if self.inner.binding.write().take().is_some() {
            log::trace!("[datum] handle #{} detached", self.id());
        }
        Ok(())
    }

    /// Derived view of elements `begin..end` of this array datum.
    ///
    /// Negative bounds count from the end; both are clamped to `[0, length]`
    /// and `end` defaults to `length`. The result's type is a new
    /// `ArrayType(element, end - begin)`; no bytes are copied.
    pub fn subarray(&self, begin: i64, end: Option<i64>) -> Result<Datum> {
        self.report(self.subarray_inner(begin, end))
    }

    fn subarray_inner(&self, begin: i64, end: Option<i64>) -> Result<Datum> {
        let TypeKind::Array { element, length } = self.type_desc().kind() else {
            return Err(TypedError::InvalidArgument {
                type_name: self.type_desc().to_source(),
                reason: "subarray requires an array".into(),
            });
        };
        let length = i64::try_from(*length).map_err(|_| TypedError::InvalidArgument {
            type_name: self.type_desc().to_source(),
            reason: "length exceeds the index range".into(),
        })?;

        let begin = clamp_index(begin, length);
        let end = clamp_index(end.unwrap_or(length), length);
        let sublength = (end - begin).clamp(0, length);

        let sub_type = TypeDescriptor::array(self.type_desc().shared(), element, sublength)?;
        let offset = usize::try_from(begin).unwrap_or(0) * element.byte_length();
        Datum::derive(&sub_type, self, offset)
    }

    // ========================================================================
    // Whole-datum values
    // ========================================================================

    /// Reify the whole datum (a number for scalar types, else a view).
    pub fn load(&self) -> Result<Value> {
        self.report(convert::read_value(self.type_desc(), self, 0))
    }

    /// Convert `value` into the whole datum.
    pub fn store(&self, value: &Value) -> Result<()> {
        self.report(convert::write_value(self.type_desc(), self, 0, value))
    }

    /// Plain value tree (numbers, lists, records) of the current contents.
    pub fn snapshot(&self) -> Result<Value> {
        self.report(convert::snapshot_at(self.type_desc(), self, 0))
    }

    /// Copy of the raw bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.report(self.locate(0, self.byte_length(), self.type_desc()).and_then(|b| {
            b.storage
                .read_bytes(b.offset, self.byte_length())
                .ok_or_else(|| self.out_of_bounds(0, self.byte_length()))
        }))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn id(&self) -> DatumId {
        self.inner.id
    }

    #[must_use]
    pub fn kind(&self) -> DatumKind {
        self.inner.kind
    }

    #[must_use]
    pub fn is_handle(&self) -> bool {
        self.inner.kind == DatumKind::Handle
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.binding.read().is_some()
    }

    #[must_use]
    pub fn type_desc(&self) -> &TypeRef {
        &self.inner.type_desc
    }

    #[must_use]
    pub fn byte_length(&self) -> usize {
        self.inner.type_desc.byte_length()
    }

    /// Id of the datum that allocated the bytes this datum points into.
    #[must_use]
    pub fn owner_id(&self) -> Option<DatumId> {
        self.binding().map(|b| b.storage.owner())
    }

    /// True when this datum allocated its own buffer.
    #[must_use]
    pub fn owns_buffer(&self) -> bool {
        self.owner_id() == Some(self.id())
    }

    /// Byte offset into the owner's buffer.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        self.binding().map(|b| b.offset)
    }

    /// Size of the owner's whole buffer.
    #[must_use]
    pub fn buffer_size(&self) -> Option<usize> {
        self.binding().map(|b| b.storage.len())
    }

    /// Whether both values are the same datum.
    #[must_use]
    pub fn same_as(&self, other: &Datum) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ========================================================================
    // Crate-internal memory access
    // ========================================================================

    pub(crate) fn binding(&self) -> Option<Binding> {
        self.inner.binding.read().clone()
    }

    pub(crate) fn report<T>(&self, result: Result<T>) -> Result<T> {
        self.type_desc().shared().report(result)
    }

    /// Absolute binding of `len` bytes at relative `offset`, bounds checked.
    ///
    /// `requested` names the type being placed there, for error messages.
    pub(crate) fn locate(&self, offset: usize, len: usize, requested: &TypeDescriptor) -> Result<Binding> {
        let binding = self.binding().ok_or_else(|| TypedError::Unattached {
            type_name: self.type_desc().to_source(),
        })?;
        match offset.checked_add(len) {
            Some(end) if end <= self.byte_length() => Ok(Binding {
                storage: binding.storage,
                offset: binding.offset + offset,
            }),
            _ => Err(TypedError::OutOfBounds {
                type_name: requested.to_source(),
                offset,
                size: len,
                limit: self.byte_length(),
            }),
        }
    }

    pub(crate) fn read_scalar(&self, kind: ScalarKind, offset: usize) -> Result<f64> {
        let binding = self.locate(offset, kind.size(), self.type_desc())?;
        binding
            .storage
            .load(kind, binding.offset)
            .ok_or_else(|| self.out_of_bounds(offset, kind.size()))
    }

    pub(crate) fn write_scalar(&self, kind: ScalarKind, offset: usize, value: f64) -> Result<()> {
        let binding = self.locate(offset, kind.size(), self.type_desc())?;
        if binding.storage.store(kind, binding.offset, value) {
            Ok(())
        } else {
            Err(self.out_of_bounds(offset, kind.size()))
        }
    }

    /// Block copy of all of `source` into this datum at `offset`.
    pub(crate) fn copy_from(&self, offset: usize, source: &Datum) -> Result<()> {
        let len = source.byte_length();
        let dst = self.locate(offset, len, source.type_desc())?;
        let src = source.locate(0, len, source.type_desc())?;
        if copy_bytes(&src.storage, src.offset, &dst.storage, dst.offset, len) {
            Ok(())
        } else {
            Err(self.out_of_bounds(offset, len))
        }
    }

    fn out_of_bounds(&self, offset: usize, size: usize) -> TypedError {
        TypedError::OutOfBounds {
            type_name: self.type_desc().to_source(),
            offset,
            size,
            limit: self.byte_length(),
        }
    }

    fn require_handle(&self, operation: &str) -> Result<()> {
        if self.is_handle() {
            Ok(())
        } else {
            Err(TypedError::InvalidArgument {
                type_name: self.type_desc().to_source(),
                reason: format!("cannot {} an object, only a handle", operation),
            })
        }
    }
}

impl fmt::Debug for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Datum")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("type", &self.type_desc().to_source())
            .field("owner", &self.owner_id())
            .field("offset", &self.offset())
            .finish()
    }
}

/// Resolve a possibly negative slice bound against `length`.
fn clamp_index(index: i64, length: i64) -> i64 {
    if index < 0 {
        length.saturating_add(index).max(0)
    } else {
        index.min(length)
    }
}

fn no_such_path(current: &TypeDescriptor, key: &PropertyKey) -> TypedError {
    TypedError::InvalidArgument {
        type_name: current.to_source(),
        reason: format!("no element or field '{}'", key),
    }
}

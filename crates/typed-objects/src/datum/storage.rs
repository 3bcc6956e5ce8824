// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Raw byte buffers behind owning datums.
//!
//! A [`Storage`] is created by exactly one owning datum and shared (by `Arc`)
//! with every datum derived from it or attached to it. Its bytes go back to
//! the [`Allocator`] once, when the last reference drops.

use crate::datum::DatumId;
use crate::repr::ScalarKind;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_STORAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Source of owning-instance buffers.
pub trait Allocator: Send + Sync {
    /// A zero-filled buffer of exactly `size` bytes, or `None` if unavailable.
    fn alloc(&self, size: usize) -> Option<Box<[u8]>>;

    /// Return a buffer obtained from [`alloc`](Self::alloc).
    fn free(&self, buffer: Box<[u8]>);
}

/// Allocation counters of a [`HeapAllocator`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AllocStats {
    pub allocations: u64,
    pub frees: u64,
    pub live_buffers: u64,
    pub live_bytes: u64,
}

/// Global-heap allocator with live/total counters.
#[derive(Debug, Default)]
pub struct HeapAllocator {
    allocations: AtomicU64,
    frees: AtomicU64,
    live_bytes: AtomicU64,
}

impl HeapAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stats(&self) -> AllocStats {
        let allocations = self.allocations.load(Ordering::Acquire);
        let frees = self.frees.load(Ordering::Acquire);
        AllocStats {
            allocations,
            frees,
            live_buffers: allocations.saturating_sub(frees),
            live_bytes: self.live_bytes.load(Ordering::Acquire),
        }
    }
}

impl Allocator for HeapAllocator {
    fn alloc(&self, size: usize) -> Option<Box<[u8]>> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(size).ok()?;
        buffer.resize(size, 0);
        self.allocations.fetch_add(1, Ordering::AcqRel);
        self.live_bytes.fetch_add(size as u64, Ordering::AcqRel);
        Some(buffer.into_boxed_slice())
    }

    fn free(&self, buffer: Box<[u8]>) {
        self.frees.fetch_add(1, Ordering::AcqRel);
        self.live_bytes
            .fetch_sub(buffer.len() as u64, Ordering::AcqRel);
    }
}

/// One allocated buffer and the id of the datum that owns it.
pub(crate) struct Storage {
    id: u64,
    owner: DatumId,
    bytes: RwLock<Box<[u8]>>,
    allocator: Arc<dyn Allocator>,
}

impl Storage {
    pub(crate) fn new(owner: DatumId, bytes: Box<[u8]>, allocator: Arc<dyn Allocator>) -> Self {
        Self {
            id: NEXT_STORAGE_ID.fetch_add(1, Ordering::Relaxed),
            owner,
            bytes: RwLock::new(bytes),
            allocator,
        }
    }

    pub(crate) fn owner(&self) -> DatumId {
        self.owner
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.read().len()
    }

    pub(crate) fn load(&self, kind: ScalarKind, offset: usize) -> Option<f64> {
        kind.load(self.bytes.read().get(offset..)?)
    }

    pub(crate) fn store(&self, kind: ScalarKind, offset: usize, value: f64) -> bool {
        match self.bytes.write().get_mut(offset..) {
            Some(bytes) => kind.store(bytes, value),
            None => false,
        }
    }

    /// Copy of `len` bytes at `offset`.
    pub(crate) fn read_bytes(&self, offset: usize, len: usize) -> Option<Vec<u8>> {
        let bytes = self.bytes.read();
        let end = offset.checked_add(len)?;
        bytes.get(offset..end).map(<[u8]>::to_vec)
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        let bytes = std::mem::take(self.bytes.get_mut());
        log::trace!(
            "[datum] buffer #{} of owner #{} released ({} bytes)",
            self.id,
            self.owner,
            bytes.len()
        );
        self.allocator.free(bytes);
    }
}

/// Copy `len` bytes between two buffers (possibly the same one).
///
/// Distinct buffers are locked in id order so concurrent copies in opposite
/// directions cannot deadlock.
pub(crate) fn copy_bytes(
    src: &Storage,
    src_offset: usize,
    dst: &Storage,
    dst_offset: usize,
    len: usize,
) -> bool {
    let (Some(src_end), Some(dst_end)) = (src_offset.checked_add(len), dst_offset.checked_add(len))
    else {
        return false;
    };

    if std::ptr::eq(src, dst) {
        let mut bytes = dst.bytes.write();
        if src_end > bytes.len() || dst_end > bytes.len() {
            return false;
        }
        bytes.copy_within(src_offset..src_end, dst_offset);
        return true;
    }

    let copy = |from: &[u8], to: &mut [u8]| {
        match (from.get(src_offset..src_end), to.get_mut(dst_offset..dst_end)) {
            (Some(from), Some(to)) => {
                to.copy_from_slice(from);
                true
            }
            _ => false,
        }
    };

    if src.id < dst.id {
        let from = src.bytes.read();
        let mut to = dst.bytes.write();
        copy(&from[..], &mut to[..])
    } else {
        let mut to = dst.bytes.write();
        let from = src.bytes.read();
        copy(&from[..], &mut to[..])
    }
}

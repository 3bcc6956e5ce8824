// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Raw access for worker threads.
//!
//! These entry points bypass the property dispatcher and the error sink.
//! Failure is only `None` / `false`, and offsets are relative to the datum.
//! Concurrent calls are safe; callers that need deterministic results must
//! still hand each worker a disjoint byte range.

use crate::datum::{copy_bytes, Datum};
use crate::repr::ScalarKind;

/// Load one scalar at `offset`, or `None` if unattached or out of range.
#[must_use]
pub fn load_scalar(datum: &Datum, kind: ScalarKind, offset: usize) -> Option<f64> {
    let binding = datum.binding()?;
    if offset.checked_add(kind.size())? > datum.byte_length() {
        return None;
    }
    binding.storage.load(kind, binding.offset + offset)
}

/// Coerce and store one scalar at `offset`. Returns false on failure.
#[must_use]
pub fn store_scalar(datum: &Datum, kind: ScalarKind, offset: usize, value: f64) -> bool {
    let Some(binding) = datum.binding() else {
        return false;
    };
    match offset.checked_add(kind.size()) {
        Some(end) if end <= datum.byte_length() => {
            binding.storage.store(kind, binding.offset + offset, value)
        }
        _ => false,
    }
}

/// Copy `len` bytes from `src` at `src_offset` to `dst` at `dst_offset`.
///
/// Overlapping ranges in one buffer behave like `memmove`.
#[must_use]
pub fn memcpy(dst: &Datum, dst_offset: usize, src: &Datum, src_offset: usize, len: usize) -> bool {
    let (Some(dst_binding), Some(src_binding)) = (dst.binding(), src.binding()) else {
        return false;
    };
    let in_range = |datum: &Datum, offset: usize| {
        offset
            .checked_add(len)
            .is_some_and(|end| end <= datum.byte_length())
    };
    if !in_range(dst, dst_offset) || !in_range(src, src_offset) {
        return false;
    }
    copy_bytes(
        &src_binding.storage,
        src_binding.offset + src_offset,
        &dst_binding.storage,
        dst_binding.offset + dst_offset,
        len,
    )
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural interning of layout representations.
//!
//! Scalars are pre-interned singletons. Arrays and structs are keyed by the
//! ids of their (already interned) children, so structural equality reduces
//! to a hash lookup and the registry never walks a shape twice. The table
//! holds `Weak` references: a representation lives as long as a descriptor
//! (or a parent representation) keeps it. Rebuilding a dropped child yields a
//! fresh id, so every parent key over the old id is dead for good; misses
//! sweep those slots once the table outgrows twice its live count.

use super::{align_up, ReprId, ReprKind, ScalarKind, StructField, TypeRepr};
use crate::config::{MAX_SCALAR_ALIGNMENT, REGISTRY_PURGE_FLOOR};
use crate::error::{Result, TypedError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ReprKey {
    Array { element: ReprId, length: usize },
    Struct(Vec<(Arc<str>, ReprId)>),
}

/// A shape description, the input of [`TypeRegistry::intern`].
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Scalar(ScalarKind),
    Array(Box<Shape>, i64),
    Struct(Vec<(String, Shape)>),
}

impl Shape {
    #[must_use]
    pub fn array(element: Shape, length: i64) -> Self {
        Self::Array(Box::new(element), length)
    }

    pub fn structure<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Shape)>,
        S: Into<String>,
    {
        Self::Struct(fields.into_iter().map(|(n, s)| (n.into(), s)).collect())
    }
}

impl From<ScalarKind> for Shape {
    fn from(kind: ScalarKind) -> Self {
        Self::Scalar(kind)
    }
}

/// Interning hit/miss statistics.
#[derive(Debug, Default, Clone, Copy)]
pub struct LookupStats {
    pub hits: u64,
    pub misses: u64,
    pub last_hit_ns: u64,
    pub last_miss_ns: u64,
}

/// Owner of every interned representation of one type system.
pub struct TypeRegistry {
    id: u64,
    scalars: Vec<Arc<TypeRepr>>,
    interned: DashMap<ReprKey, Weak<TypeRepr>>,
    next_id: AtomicU64,
    /// Table size that triggers the next sweep.
    purge_at: AtomicUsize,
    stats: RwLock<LookupStats>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        let id = NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed);
        let scalars: Vec<Arc<TypeRepr>> = ScalarKind::ALL
            .into_iter()
            .enumerate()
            .map(|(i, kind)| {
                debug_assert!(kind.alignment() <= MAX_SCALAR_ALIGNMENT);
                Arc::new(TypeRepr::new(
                    i as ReprId,
                    id,
                    kind.size(),
                    kind.alignment(),
                    ReprKind::Scalar(kind),
                ))
            })
            .collect();

        Self {
            id,
            scalars,
            interned: DashMap::new(),
            next_id: AtomicU64::new(ScalarKind::COUNT as u64),
            purge_at: AtomicUsize::new(REGISTRY_PURGE_FLOOR),
            stats: RwLock::new(LookupStats::default()),
        }
    }

    /// The singleton representation of a scalar kind.
    #[must_use]
    pub fn scalar(&self, kind: ScalarKind) -> Arc<TypeRepr> {
        Arc::clone(&self.scalars[kind.index()])
    }

    /// Intern `ArrayType(element, length)`.
    pub fn array(&self, element: &Arc<TypeRepr>, length: i64) -> Result<Arc<TypeRepr>> {
        self.check_member(element)?;
        let length = usize::try_from(length).map_err(|_| TypedError::InvalidLayout {
            reason: format!("array length {} is negative", length),
        })?;
        let size = element
            .size()
            .checked_mul(length)
            .ok_or_else(|| TypedError::InvalidLayout {
                reason: format!("ArrayType({}, {}) overflows", element, length),
            })?;

        let key = ReprKey::Array {
            element: element.id(),
            length,
        };
        let alignment = element.alignment();
        Ok(self.intern_key(key, |id| {
            TypeRepr::new(
                id,
                self.id,
                size,
                alignment,
                ReprKind::Array {
                    element: Arc::clone(element),
                    length,
                },
            )
        }))
    }

    /// Intern a struct from `(name, repr)` pairs in declaration order.
    ///
    /// Names are not checked for uniqueness here; descriptors enforce the
    /// configured policy before calling in.
    pub fn structure(&self, fields: &[(Arc<str>, Arc<TypeRepr>)]) -> Result<Arc<TypeRepr>> {
        let mut laid_out = Vec::with_capacity(fields.len());
        let mut offset = 0usize;
        let mut alignment = 1usize;

        for (index, (name, repr)) in fields.iter().enumerate() {
            self.check_member(repr)?;
            let overflow = || TypedError::InvalidLayout {
                reason: format!("struct field '{}' overflows the layout", name),
            };
            offset = align_up(offset, repr.alignment()).ok_or_else(overflow)?;
            laid_out.push(StructField {
                index,
                name: Arc::clone(name),
                repr: Arc::clone(repr),
                offset,
            });
            offset = offset.checked_add(repr.size()).ok_or_else(overflow)?;
            alignment = alignment.max(repr.alignment());
        }

        let size = align_up(offset, alignment).ok_or_else(|| TypedError::InvalidLayout {
            reason: "struct size overflows".into(),
        })?;

        let key = ReprKey::Struct(
            fields
                .iter()
                .map(|(name, repr)| (Arc::clone(name), repr.id()))
                .collect(),
        );
        Ok(self.intern_key(key, |id| {
            TypeRepr::new(
                id,
                self.id,
                size,
                alignment,
                ReprKind::Struct { fields: laid_out },
            )
        }))
    }

    /// Intern a whole shape tree, children first.
    pub fn intern(&self, shape: &Shape) -> Result<Arc<TypeRepr>> {
        match shape {
            Shape::Scalar(kind) => Ok(self.scalar(*kind)),
            Shape::Array(element, length) => {
                let element = self.intern(element)?;
                self.array(&element, *length)
            }
            Shape::Struct(fields) => {
                let fields = fields
                    .iter()
                    .map(|(name, shape)| Ok((Arc::<str>::from(name.as_str()), self.intern(shape)?)))
                    .collect::<Result<Vec<_>>>()?;
                self.structure(&fields)
            }
        }
    }

    /// Whether `repr` was produced by this registry.
    #[must_use]
    pub fn contains(&self, repr: &TypeRepr) -> bool {
        repr.registry_id() == self.id
    }

    /// Number of live composite representations (scalars excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.interned
            .iter()
            .filter(|entry| entry.value().strong_count() > 0)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of table slots, dead ones included.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.interned.len()
    }

    /// Drop table slots whose representation is gone. Returns how many.
    pub fn purge(&self) -> usize {
        let before = self.interned.len();
        self.interned.retain(|_, weak| weak.strong_count() > 0);
        let purged = before.saturating_sub(self.interned.len());
        if purged > 0 {
            log::debug!("[registry] purged {} dead representations", purged);
        }
        purged
    }

    #[must_use]
    pub fn stats(&self) -> LookupStats {
        *self.stats.read()
    }

    fn check_member(&self, repr: &TypeRepr) -> Result<()> {
        if self.contains(repr) {
            Ok(())
        } else {
            Err(TypedError::InvalidLayout {
                reason: format!("{} belongs to another registry", repr),
            })
        }
    }

    fn intern_key<F>(&self, key: ReprKey, build: F) -> Arc<TypeRepr>
    where
        F: FnOnce(ReprId) -> TypeRepr,
    {
        let start = Instant::now();

        // Fast path: the shard guard is released before `entry` below.
        if let Some(hit) = self.interned.get(&key).and_then(|slot| slot.upgrade()) {
            self.record_hit(start);
            return hit;
        }

        let repr = match self.interned.entry(key) {
            Entry::Occupied(mut slot) => {
                if let Some(hit) = slot.get().upgrade() {
                    self.record_hit(start);
                    return hit;
                }
                let repr = Arc::new(build(self.next_id.fetch_add(1, Ordering::Relaxed)));
                slot.insert(Arc::downgrade(&repr));
                repr
            }
            Entry::Vacant(slot) => {
                let repr = Arc::new(build(self.next_id.fetch_add(1, Ordering::Relaxed)));
                slot.insert(Arc::downgrade(&repr));
                repr
            }
        };

        // Entry guard is gone here; `retain` locks every shard.
        self.reclaim_dead_slots();
        self.record_miss(start);
        log::trace!(
            "[registry] interned #{} {} (size={}, align={})",
            repr.id(),
            repr,
            repr.size(),
            repr.alignment()
        );
        repr
    }

    fn reclaim_dead_slots(&self) {
        if self.interned.len() < self.purge_at.load(Ordering::Relaxed) {
            return;
        }
        self.purge();
        let live = self.interned.len();
        self.purge_at.store(
            live.saturating_mul(2).max(REGISTRY_PURGE_FLOOR),
            Ordering::Relaxed,
        );
    }

    fn record_hit(&self, start: Instant) {
        let mut stats = self.stats.write();
        stats.hits += 1;
        stats.last_hit_ns = elapsed_ns(start);
    }

    fn record_miss(&self, start: Instant) {
        let mut stats = self.stats.write();
        stats.misses += 1;
        stats.last_miss_ns = elapsed_ns(start);
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("id", &self.id)
            .field("interned", &self.interned.len())
            .field("stats", &self.stats())
            .finish()
    }
}

fn elapsed_ns(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

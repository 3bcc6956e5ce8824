// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scalar kinds and their little-endian byte codecs.

use crate::convert::numeric::{clamp_to_uint8, to_int32, to_uint32};
use std::fmt;

/// The fixed set of numeric kinds a scalar type can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarKind {
    Int8,
    Int16,
    Int32,
    Uint8,
    Uint16,
    Uint32,
    Float32,
    Float64,
    /// 8-bit unsigned, stores clamp to `[0, 255]` instead of wrapping.
    Uint8Clamped,
}

/// Generate a bounded little-endian load (None when `bytes` is too short).
macro_rules! impl_load_le {
    ($name:ident, $type:ty, $size:expr) => {
        fn $name(bytes: &[u8]) -> Option<$type> {
            let raw: [u8; $size] = bytes.get(..$size)?.try_into().ok()?;
            Some(<$type>::from_le_bytes(raw))
        }
    };
}

/// Generate a bounded little-endian store (false when `bytes` is too short).
macro_rules! impl_store_le {
    ($name:ident, $type:ty, $size:expr) => {
        fn $name(bytes: &mut [u8], value: $type) -> bool {
            match bytes.get_mut(..$size) {
                Some(dst) => {
                    dst.copy_from_slice(&value.to_le_bytes());
                    true
                }
                None => false,
            }
        }
    };
}

impl_load_le!(load_i8, i8, 1);
impl_load_le!(load_i16, i16, 2);
impl_load_le!(load_i32, i32, 4);
impl_load_le!(load_u8, u8, 1);
impl_load_le!(load_u16, u16, 2);
impl_load_le!(load_u32, u32, 4);
impl_load_le!(load_f32, f32, 4);
impl_load_le!(load_f64, f64, 8);

impl_store_le!(store_i8, i8, 1);
impl_store_le!(store_i16, i16, 2);
impl_store_le!(store_i32, i32, 4);
impl_store_le!(store_u8, u8, 1);
impl_store_le!(store_u16, u16, 2);
impl_store_le!(store_u32, u32, 4);
impl_store_le!(store_f32, f32, 4);
impl_store_le!(store_f64, f64, 8);

impl ScalarKind {
    pub const COUNT: usize = 9;

    pub const ALL: [ScalarKind; Self::COUNT] = [
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Uint8,
        Self::Uint16,
        Self::Uint32,
        Self::Float32,
        Self::Float64,
        Self::Uint8Clamped,
    ];

    /// Size in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 | Self::Uint8Clamped => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    /// Natural alignment, equal to the size for every scalar kind.
    #[must_use]
    pub const fn alignment(self) -> usize {
        self.size()
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Uint8Clamped => "uint8Clamped",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Convert `value` as if it were stored into this kind and loaded back.
    #[must_use]
    pub fn coerce(self, value: f64) -> f64 {
        match self {
            Self::Int8 => f64::from(to_int32(value) as i8),
            Self::Int16 => f64::from(to_int32(value) as i16),
            Self::Int32 => f64::from(to_int32(value)),
            Self::Uint8 => f64::from(to_uint32(value) as u8),
            Self::Uint16 => f64::from(to_uint32(value) as u16),
            Self::Uint32 => f64::from(to_uint32(value)),
            Self::Float32 => f64::from(value as f32),
            Self::Float64 => value,
            Self::Uint8Clamped => f64::from(clamp_to_uint8(value)),
        }
    }

    /// Decode one value from the front of `bytes`.
    #[must_use]
    pub fn load(self, bytes: &[u8]) -> Option<f64> {
        match self {
            Self::Int8 => load_i8(bytes).map(f64::from),
            Self::Int16 => load_i16(bytes).map(f64::from),
            Self::Int32 => load_i32(bytes).map(f64::from),
            Self::Uint8 | Self::Uint8Clamped => load_u8(bytes).map(f64::from),
            Self::Uint16 => load_u16(bytes).map(f64::from),
            Self::Uint32 => load_u32(bytes).map(f64::from),
            Self::Float32 => load_f32(bytes).map(f64::from),
            Self::Float64 => load_f64(bytes),
        }
    }

    /// Coerce `value` to this kind and encode it at the front of `bytes`.
    #[must_use]
    pub fn store(self, bytes: &mut [u8], value: f64) -> bool {
        match self {
            Self::Int8 => store_i8(bytes, to_int32(value) as i8),
            Self::Int16 => store_i16(bytes, to_int32(value) as i16),
            Self::Int32 => store_i32(bytes, to_int32(value)),
            Self::Uint8 => store_u8(bytes, to_uint32(value) as u8),
            Self::Uint16 => store_u16(bytes, to_uint32(value) as u16),
            Self::Uint32 => store_u32(bytes, to_uint32(value)),
            Self::Float32 => store_f32(bytes, value as f32),
            Self::Float64 => store_f64(bytes, value),
            Self::Uint8Clamped => store_u8(bytes, clamp_to_uint8(value)),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

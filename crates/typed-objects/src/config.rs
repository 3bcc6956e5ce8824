// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type system configuration.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: layout constants and environment variable names
//! - **Level 2 (Dynamic)**: [`TypeSystemConfig`], held by each `TypeSystem`
//!   in an `ArcSwap` so it can be replaced while descriptors are in use
//!
//! # Example
//!
//! ```
//! use typed_objects::config::{DuplicateFieldPolicy, TypeSystemConfig};
//!
//! let config = TypeSystemConfig::default()
//!     .with_duplicate_fields(DuplicateFieldPolicy::Shadow)
//!     .with_max_buffer_size(1 << 20);
//! assert_eq!(config.max_buffer_size, 1 << 20);
//! ```

use std::fmt;
use std::str::FromStr;

// =======================================================================
// Level 1: constants
// =======================================================================

/// Widest scalar alignment (float64).
pub const MAX_SCALAR_ALIGNMENT: usize = 8;

/// Largest buffer an owning datum may allocate by default.
///
/// Offsets are exposed to hosts as 32-bit signed integers, so buffers never
/// exceed `i32::MAX` bytes.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = i32::MAX as usize;

/// Intern table size below which dead slots are left in place.
///
/// Past it, a miss sweeps dead slots and the next sweep waits until the
/// table doubles its live count again.
pub const REGISTRY_PURGE_FLOOR: usize = 64;

/// Environment variable selecting the duplicate field policy (`reject` | `shadow`).
pub const ENV_DUPLICATE_FIELDS: &str = "TYPED_OBJECTS_DUPLICATE_FIELDS";

/// Environment variable overriding the maximum buffer size, in bytes.
pub const ENV_MAX_BUFFER_SIZE: &str = "TYPED_OBJECTS_MAX_BUFFER_SIZE";

// =======================================================================
// Level 2: runtime configuration
// =======================================================================

/// What a struct type does when two fields share a name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "config-loaders",
    derive(serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum DuplicateFieldPolicy {
    /// Construction fails with `InvalidArgument`.
    #[default]
    Reject,
    /// Compatibility mode: the later field wins in the name table while
    /// storage is still reserved for both.
    Shadow,
}

impl FromStr for DuplicateFieldPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "shadow" => Ok(Self::Shadow),
            other => Err(ConfigError::InvalidValue {
                key: "duplicate_fields".into(),
                value: other.into(),
            }),
        }
    }
}

/// Per-`TypeSystem` tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "config-loaders",
    derive(serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct TypeSystemConfig {
    pub duplicate_fields: DuplicateFieldPolicy,
    pub max_buffer_size: usize,
}

impl Default for TypeSystemConfig {
    fn default() -> Self {
        Self {
            duplicate_fields: DuplicateFieldPolicy::Reject,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }
}

impl TypeSystemConfig {
    #[must_use]
    pub fn with_duplicate_fields(mut self, policy: DuplicateFieldPolicy) -> Self {
        self.duplicate_fields = policy;
        self
    }

    #[must_use]
    pub fn with_max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = size;
        self
    }

    /// Defaults overridden by `TYPED_OBJECTS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_DUPLICATE_FIELDS) {
            config.duplicate_fields = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_MAX_BUFFER_SIZE) {
            config.max_buffer_size =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_MAX_BUFFER_SIZE.into(),
                        value: raw.clone(),
                    })?;
        }
        log::debug!("[config] loaded {:?}", config);
        Ok(config)
    }

    /// Parse a YAML document.
    ///
    /// ```yaml
    /// duplicate_fields: shadow
    /// max_buffer_size: 65536
    /// ```
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_str(yaml_content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml_content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a YAML file.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml_content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_yaml_str(&yaml_content)
    }
}

/// Configuration loading errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: String, value: String },
    Io(String),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { key, value } => {
                write!(f, "Invalid value '{}' for {}", value, key)
            }
            Self::Io(msg) => write!(f, "Failed to read config: {}", msg),
            Self::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host values crossing the conversion boundary.

use super::numeric::number_to_string;
use crate::datum::Datum;
use crate::dispatch::PropertyKey;
use std::sync::Arc;

/// A host-side value.
///
/// `List` and `Record` are plain (eager) host containers; `Datum` carries a
/// live typed view, as produced by reifying an array or struct.
#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    List(Vec<Value>),
    Record(Vec<(Arc<str>, Value)>),
    Datum(Datum),
}

impl Value {
    /// Record from `(name, value)` pairs, order preserved.
    pub fn record<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<Arc<str>>,
    {
        Self::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Host type name, used in conversion errors.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Record(_) => "record",
            Self::Datum(_) => "datum",
        }
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_datum(&self) -> Option<&Datum> {
        match self {
            Self::Datum(d) => Some(d),
            _ => None,
        }
    }

    /// First field named `name` of a record.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Record(fields) => fields
                .iter()
                .find(|(k, _)| &**k == name)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Numeric value of a primitive (`ToNumber`); `None` for containers and datums.
    #[must_use]
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Self::Undefined => Some(f64::NAN),
            Self::Null => Some(0.0),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Number(n) => Some(*n),
            Self::String(s) => Some(string_to_number(s)),
            Self::List(_) | Self::Record(_) | Self::Datum(_) => None,
        }
    }

    /// Property key for this value, if it can name one.
    #[must_use]
    pub fn to_property_key(&self) -> Option<PropertyKey> {
        match self {
            Self::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n < f64::from(u32::MAX) => {
                Some(PropertyKey::Index(*n as u32))
            }
            Self::Number(n) => Some(PropertyKey::parse(&number_to_string(*n))),
            Self::String(s) => Some(PropertyKey::parse(s)),
            Self::Bool(b) => Some(PropertyKey::parse(if *b { "true" } else { "false" })),
            Self::Undefined => Some(PropertyKey::parse("undefined")),
            Self::Null => Some(PropertyKey::parse("null")),
            Self::List(_) | Self::Record(_) | Self::Datum(_) => None,
        }
    }
}

/// Numbers compare by value (NaN unequal), datums by identity, the rest structurally.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            (Self::Datum(a), Self::Datum(b)) => a.same_as(b),
            _ => false,
        }
    }
}

/// String to number: trimmed decimal, `0x`/`0o`/`0b` integers, `Infinity`.
fn string_to_number(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &s[2..];
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return f64::NAN;
        }
        return digits
            .chars()
            .filter_map(|c| c.to_digit(radix))
            .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d));
    }

    // Rust also accepts "inf"/"nan"; those are not numbers here.
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Datum> for Value {
    fn from(datum: Datum) -> Self {
        Self::Datum(datum)
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Numeric narrowing rules shared by every scalar store.
//!
//! Integer kinds go through [`to_int32`] / [`to_uint32`] (truncate toward
//! zero, reduce modulo 2^32, non-finite to 0) and then keep their low bits,
//! so `500` stored as uint8 reads back `244`. The clamped kind saturates and
//! rounds half to even instead.

const TWO_POW_32: f64 = 4_294_967_296.0;

/// ECMAScript `ToUint32`.
#[must_use]
pub fn to_uint32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    let wrapped = value.trunc().rem_euclid(TWO_POW_32);
    wrapped as u32
}

/// ECMAScript `ToInt32`.
#[must_use]
pub fn to_int32(value: f64) -> i32 {
    to_uint32(value) as i32
}

/// Saturate to `[0, 255]`, rounding ties to even.
#[must_use]
pub fn clamp_to_uint8(value: f64) -> u8 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    if value >= 255.0 {
        return 255;
    }
    let floor = value.floor();
    let diff = value - floor;
    let rounded = if diff > 0.5 {
        floor + 1.0
    } else if diff < 0.5 {
        floor
    } else if floor % 2.0 == 0.0 {
        floor
    } else {
        floor + 1.0
    };
    rounded as u8
}

/// ECMAScript `Number::toString` in radix 10.
///
/// Shortest round-trip digits, plain notation for decimal exponents in
/// `-6..21`, otherwise `d.ddde+NN`.
#[must_use]
pub fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".into();
    }
    if value == 0.0 {
        return "0".into();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    if value < 0.0 {
        return format!("-{}", number_to_string(-value));
    }

    // `{:e}` yields the shortest digits that round-trip, e.g. `1.5e-7`.
    let sci = format!("{:e}", value);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let k = digits.len() as i32;
    let n = exponent.parse::<i32>().unwrap_or(0) + 1;

    if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let (lead, rest) = digits.split_at(1);
        let sign = if n > 0 { '+' } else { '-' };
        if rest.is_empty() {
            format!("{}e{}{}", lead, sign, (n - 1).abs())
        } else {
            format!("{}.{}e{}{}", lead, rest, sign, (n - 1).abs())
        }
    }
}

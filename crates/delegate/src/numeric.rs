// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Arithmetic on JSON numbers that keeps integers integral.

use serde_json::Number;

/// `a + b`; integral when both are integers and the sum fits in i64.
/// `None` when the float result is not finite.
pub fn add(a: &Number, b: &Number) -> Option<Number> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Some(Number::from(sum));
        }
    }
    Number::from_f64(a.as_f64()? + b.as_f64()?)
}

pub fn negate(n: &Number) -> Option<Number> {
    if let Some(i) = n.as_i64() {
        if let Some(neg) = i.checked_neg() {
            return Some(Number::from(neg));
        }
    }
    Number::from_f64(-n.as_f64()?)
}

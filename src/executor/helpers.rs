//! Value comparison and rounding helpers for the executor.

use std::cmp::Ordering;

use serde_json::Value;

/// Compare two output values for ordering.
///
/// Numbers compare by their f64 representation, strings lexicographically.
/// Null sorts before everything; mixed types never arise from a bound query.
#[inline]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// Round to 2 decimal digits, half away from zero.
#[inline]
pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

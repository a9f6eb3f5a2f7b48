//! Total order over JSON values, used by sort and by min/max aggregation.
//!
//! Ranking across types: null < bool < number < string < array < object.
//! A missing column compares as null, so rows lacking a sort key come first.

use std::cmp::Ordering;

use serde_json::{Number, Value};

use crate::key::sorted_json;
use crate::row::Row;

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                match compare_values(l, r) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(_), Value::Object(_)) => sorted_json(a).cmp(&sorted_json(b)),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a.cmp(&b);
    }
    let a = x.as_f64().unwrap_or(0.0);
    let b = y.as_f64().unwrap_or(0.0);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Compare the values two rows hold for `column`; missing reads as null.
pub fn compare_column(a: &Row, b: &Row, column: &str) -> Ordering {
    match (a.get(column), b.get(column)) {
        (None, None) => Ordering::Equal,
        (None, Some(v)) => compare_values(&Value::Null, v),
        (Some(v), None) => compare_values(v, &Value::Null),
        (Some(x), Some(y)) => compare_values(x, y),
    }
}

/// Lexicographic comparison over `keys`, first key most significant.
pub fn compare_rows_by(a: &Row, b: &Row, keys: &[String]) -> Ordering {
    for key in keys {
        match compare_column(a, b, key) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

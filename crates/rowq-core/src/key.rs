//! Hashable fingerprints of rows and values.
//!
//! `serde_json::Value` is not `Hash`, so set-style operators (distinct,
//! intersection, difference) and join-key matching go through the types here.
//! Scalars map onto hashable atoms directly; arrays and objects have no atom
//! of their own and fall back to a key-sorted serialization.

use std::fmt::Write as _;

use serde_json::{Number, Value};

use crate::row::Row;

/// Hashable image of a single JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyAtom {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    /// Bit pattern of a non-integral float (`-0.0` folded into `0.0`).
    Float(u64),
    Str(String),
    /// Arrays and objects: deterministic, key-sorted JSON text.
    Nested(String),
}

impl KeyAtom {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => KeyAtom::Null,
            Value::Bool(b) => KeyAtom::Bool(*b),
            Value::Number(n) => number_atom(n),
            Value::String(s) => KeyAtom::Str(s.clone()),
            Value::Array(_) | Value::Object(_) => KeyAtom::Nested(sorted_json(value)),
        }
    }
}

/// Integral floats hash like the equivalent integer, so `1` and `1.0` agree.
fn number_atom(n: &Number) -> KeyAtom {
    if let Some(i) = n.as_i64() {
        return KeyAtom::Int(i);
    }
    if let Some(u) = n.as_u64() {
        return KeyAtom::UInt(u);
    }
    let f = n.as_f64().unwrap_or(0.0);
    if f.fract() == 0.0 {
        if f >= i64::MIN as f64 && f < i64::MAX as f64 {
            return KeyAtom::Int(f as i64);
        }
        // [2^63, 2^64); `u64::MAX as f64` rounds up to 2^64.
        if f >= 0.0 && f < u64::MAX as f64 {
            return KeyAtom::UInt(f as u64);
        }
    }
    let f = if f == 0.0 { 0.0 } else { f };
    KeyAtom::Float(f.to_bits())
}

/// Order-independent fingerprint of a whole row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CanonicalKey {
    /// Key-sorted (column, atom) pairs; used when every value is a scalar.
    Pairs(Vec<(String, KeyAtom)>),
    /// Fallback when any value is an array or object.
    Serialized(String),
}

impl CanonicalKey {
    pub fn of(row: &Row) -> Self {
        let mut pairs = Vec::with_capacity(row.len());
        for (k, v) in row {
            if matches!(v, Value::Array(_) | Value::Object(_)) {
                return CanonicalKey::Serialized(sorted_row_json(row));
            }
            pairs.push((k.clone(), KeyAtom::from_value(v)));
        }
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        CanonicalKey::Pairs(pairs)
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, CanonicalKey::Serialized(_))
    }
}

/// Tuple of atoms for the given columns; a missing column contributes `Null`.
pub fn key_tuple(row: &Row, columns: &[String]) -> Vec<KeyAtom> {
    columns
        .iter()
        .map(|c| row.get(c).map(KeyAtom::from_value).unwrap_or(KeyAtom::Null))
        .collect()
}

/// Serialize `value` with object keys sorted at every depth.
pub fn sorted_json(value: &Value) -> String {
    let mut out = String::new();
    write_sorted(value, &mut out);
    out
}

fn sorted_row_json(row: &Row) -> String {
    let mut out = String::new();
    write_sorted_object(row, &mut out);
    out
}

fn write_sorted(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_sorted(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => write_sorted_object(map, out),
        // Same normalization as the scalar atoms, so `1.0` writes as `1`.
        Value::Number(n) => match number_atom(n) {
            KeyAtom::Int(i) => {
                let _ = write!(out, "{i}");
            }
            KeyAtom::UInt(u) => {
                let _ = write!(out, "{u}");
            }
            _ => {
                let _ = write!(out, "{n}");
            }
        },
        // Scalars serialize infallibly.
        scalar => {
            let _ = write!(out, "{}", scalar);
        }
    }
}

fn write_sorted_object(map: &Row, out: &mut String) {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    out.push('{');
    for (i, (k, v)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}:", Value::String(k.clone()));
        write_sorted(v, out);
    }
    out.push('}');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::row_from_value;
    use serde_json::json;

    fn row(v: Value) -> Row {
        row_from_value(v).unwrap()
    }

    #[test]
    fn canonical_key_ignores_column_order() {
        let a = row(json!({"x": 1, "y": "b"}));
        let b = row(json!({"y": "b", "x": 1}));
        assert_eq!(CanonicalKey::of(&a), CanonicalKey::of(&b));
    }

    #[test]
    fn canonical_key_distinguishes_values() {
        let a = row(json!({"x": 1}));
        let b = row(json!({"x": "1"}));
        assert_ne!(CanonicalKey::of(&a), CanonicalKey::of(&b));
    }

    #[test]
    fn nested_values_fall_back_to_sorted_serialization() {
        let a = row(json!({"tags": {"b": 1, "a": [1, {"d": 2, "c": 3}]}, "id": 1}));
        let b = row(json!({"id": 1, "tags": {"a": [1, {"c": 3, "d": 2}], "b": 1}}));
        let ka = CanonicalKey::of(&a);
        assert!(ka.is_fallback());
        assert_eq!(ka, CanonicalKey::of(&b));
    }

    #[test]
    fn integral_floats_match_integers() {
        assert_eq!(KeyAtom::from_value(&json!(1.0)), KeyAtom::from_value(&json!(1)));
        assert_ne!(KeyAtom::from_value(&json!(1.5)), KeyAtom::from_value(&json!(1)));
    }

    #[test]
    fn large_integral_floats_match_unsigned_integers() {
        let as_float = KeyAtom::from_value(&json!(1e19));
        assert_eq!(as_float, KeyAtom::UInt(10_000_000_000_000_000_000));
        assert_eq!(as_float, KeyAtom::from_value(&json!(10_000_000_000_000_000_000u64)));
        assert!(matches!(KeyAtom::from_value(&json!(1e20)), KeyAtom::Float(_)));
    }

    #[test]
    fn nested_fallback_normalizes_integral_floats() {
        assert_eq!(
            KeyAtom::from_value(&json!([1, {"a": 2}])),
            KeyAtom::from_value(&json!([1.0, {"a": 2.0}]))
        );
        let a = row(json!({"v": [1], "w": 3}));
        let b = row(json!({"v": [1.0], "w": 3.0}));
        assert_eq!(CanonicalKey::of(&a), CanonicalKey::of(&b));
        assert_ne!(sorted_json(&json!([1.5])), sorted_json(&json!([1])));
    }

    #[test]
    fn sorted_json_escapes_keys_and_strings() {
        let v = json!({"b": "x\"y", "a": null});
        assert_eq!(sorted_json(&v), r#"{"a":null,"b":"x\"y"}"#);
    }

    #[test]
    fn key_tuple_reads_missing_as_null() {
        let r = row(json!({"id": 3}));
        let cols = vec!["id".to_string(), "other".to_string()];
        assert_eq!(key_tuple(&r, &cols), vec![KeyAtom::Int(3), KeyAtom::Null]);
    }
}

//! Row and relation types.
//!
//! A `Row` is a JSON object whose key order is preserved (serde_json is built
//! with `preserve_order`), so the order in which columns are inserted is the
//! order in which they are written back out.

use serde_json::Value;

use crate::error::{Error, Result};

/// Ordered, string-keyed mapping to JSON values.
pub type Row = serde_json::Map<String, Value>;

/// Finite, ordered bag of rows. Duplicates are legal.
pub type Relation = Vec<Row>;

/// Lazy, single-consumption sequence of rows. Errors are fatal: once an
/// `Err` has been yielded the producer must not yield further rows.
pub type RowStream<'a> = Box<dyn Iterator<Item = Result<Row>> + 'a>;

/// Decode one line of NDJSON into a row. `line` is 1-based and only used for
/// error reporting.
pub fn parse_row(text: &str, line: usize) -> Result<Row> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::parse(
            line,
            format!("expected a JSON object, found {}", type_name(&other)),
        )),
        Err(e) => Err(Error::parse(line, e.to_string())),
    }
}

/// Convert a `json!({...})` literal into a row. Non-objects yield `None`.
pub fn row_from_value(value: Value) -> Option<Row> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Value of `column`, with a missing key reported as `Null`.
pub fn get_or_null<'a>(row: &'a Row, column: &str) -> &'a Value {
    static NULL: Value = Value::Null;
    row.get(column).unwrap_or(&NULL)
}

pub(crate) fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_keeps_key_order() {
        let row = parse_row(r#"{"z":1,"a":2,"m":3}"#, 1).unwrap();
        let keys: Vec<&str> = row.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn parse_rejects_non_objects() {
        let err = parse_row("[1,2]", 7).unwrap_err();
        match err {
            Error::Parse { line, message } => {
                assert_eq!(line, 7);
                assert!(message.contains("array"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn parse_reports_malformed_json() {
        assert!(matches!(
            parse_row("{\"a\":", 3),
            Err(Error::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn missing_column_reads_as_null() {
        let row = row_from_value(json!({"a": 1})).unwrap();
        assert_eq!(get_or_null(&row, "b"), &Value::Null);
        assert_eq!(get_or_null(&row, "a"), &json!(1));
    }
}

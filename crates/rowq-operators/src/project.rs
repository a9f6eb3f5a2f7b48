//! Project operator: keep the listed columns, in the listed order.

use rowq_core::error::Result;
use rowq_core::row::Row;

#[derive(Debug, Clone, Default)]
pub struct Project {
    pub columns: Vec<String>,
}

impl Project {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Columns absent from `row` are skipped, not an error.
    pub fn apply(&self, mut row: Row) -> Row {
        let mut out = Row::with_capacity(self.columns.len());
        for col in &self.columns {
            if let Some(v) = row.remove(col) {
                out.insert(col.clone(), v);
            }
        }
        out
    }
}

pub fn project<I>(input: I, columns: Vec<String>) -> impl Iterator<Item = Result<Row>>
where
    I: Iterator<Item = Result<Row>>,
{
    let op = Project::new(columns);
    input.map(move |item| item.map(|row| op.apply(row)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowq_core::row::row_from_value;
    use serde_json::json;

    #[test]
    fn keeps_requested_order_and_skips_missing() {
        let input = vec![Ok(row_from_value(json!({"a": 1, "b": 2, "c": 3})).unwrap())];
        let cols = vec!["c".to_string(), "missing".to_string(), "a".to_string()];
        let out: Vec<Row> = project(input.into_iter(), cols)
            .collect::<Result<_>>()
            .unwrap();
        let keys: Vec<&str> = out[0].keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["c", "a"]);
    }

    #[test]
    fn repeated_column_is_emitted_once() {
        let op = Project::new(vec!["a".into(), "a".into()]);
        let out = op.apply(row_from_value(json!({"a": 1})).unwrap());
        assert_eq!(out.len(), 1);
    }
}

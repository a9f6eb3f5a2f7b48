//! Streaming wrappers over an injected path evaluator.
//!
//! The path language itself lives outside this crate; operators only see the
//! `PathEvaluator` trait.

use serde_json::Value;

use rowq_core::error::Result;
use rowq_core::row::Row;

pub trait PathEvaluator {
    /// Every value `path` selects from `row`, in document order.
    fn evaluate(&self, path: &str, row: &Row) -> Result<Vec<Value>>;

    /// Build a new row from `row` according to `template`.
    fn project(&self, row: &Row, template: &Row) -> Result<Row>;
}

impl<T: PathEvaluator + ?Sized> PathEvaluator for &T {
    fn evaluate(&self, path: &str, row: &Row) -> Result<Vec<Value>> {
        (**self).evaluate(path, row)
    }
    fn project(&self, row: &Row, template: &Row) -> Result<Row> {
        (**self).project(row, template)
    }
}

/// Keep rows for which `path` selects at least one non-null value.
pub fn path_filter<'a, I, E>(
    input: I,
    evaluator: E,
    path: &'a str,
) -> impl Iterator<Item = Result<Row>> + 'a
where
    I: Iterator<Item = Result<Row>> + 'a,
    E: PathEvaluator + 'a,
{
    input.filter_map(move |item| match item {
        Ok(row) => match evaluator.evaluate(path, &row) {
            Ok(values) if values.iter().any(|v| !v.is_null()) => Some(Ok(row)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        },
        Err(e) => Some(Err(e)),
    })
}

/// Replace each row by its projection through `template`.
pub fn path_project<'a, I, E>(
    input: I,
    evaluator: E,
    template: Row,
) -> impl Iterator<Item = Result<Row>> + 'a
where
    I: Iterator<Item = Result<Row>> + 'a,
    E: PathEvaluator + 'a,
{
    input.map(move |item| item.and_then(|row| evaluator.project(&row, &template)))
}

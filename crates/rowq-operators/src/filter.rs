//! Select operator and a simple built-in comparison predicate.
//!
//! The engine treats predicates as injected functions; `Comparison` exists so
//! declarative plans can filter without an external expression evaluator.
//! Supports expressions of the form: "col OP literal" where OP ∈ {==, !=, <, <=, >, >=}

use std::cmp::Ordering;
use std::str::FromStr;

use serde_json::Value;

use rowq_core::error::{Error, Result};
use rowq_core::order::compare_values;
use rowq_core::row::{get_or_null, Row};

/// Emit each row for which `predicate` holds, in input order. Errors pass
/// through untouched.
pub fn select<I, P>(input: I, mut predicate: P) -> impl Iterator<Item = Result<Row>>
where
    I: Iterator<Item = Result<Row>>,
    P: FnMut(&Row) -> bool,
{
    input.filter(move |item| match item {
        Ok(row) => predicate(row),
        Err(_) => true,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// `column OP literal`. The literal is read as JSON when it parses as JSON
/// (`3`, `"x"`, `true`, `null`), otherwise as a bare string.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub column: String,
    pub op: CmpOp,
    pub literal: Value,
}

impl Comparison {
    /// Splits on the leftmost operator, so the literal may itself contain
    /// operator characters (`x < "a==b"`).
    pub fn parse(expr: &str) -> Result<Self> {
        // Two-character operators first so "<=" is not read as "<".
        const OPS: [(&str, CmpOp); 6] = [
            ("==", CmpOp::Eq),
            ("!=", CmpOp::Ne),
            ("<=", CmpOp::Le),
            (">=", CmpOp::Ge),
            ("<", CmpOp::Lt),
            (">", CmpOp::Gt),
        ];

        let found = expr.char_indices().find_map(|(pos, _)| {
            let rest = &expr[pos..];
            OPS.iter()
                .find(|(sym, _)| rest.starts_with(sym))
                .map(|&(sym, op)| (pos, sym, op))
        });
        let Some((pos, sym, op)) = found else {
            return Err(Error::Plan(format!("unparseable predicate: {expr}")));
        };

        let column = expr[..pos].trim();
        let lit = expr[pos + sym.len()..].trim();
        if column.is_empty() {
            return Err(Error::Plan(format!("missing column in predicate: {expr}")));
        }
        let literal =
            serde_json::from_str::<Value>(lit).unwrap_or_else(|_| Value::String(lit.to_string()));
        Ok(Self {
            column: column.to_string(),
            op,
            literal,
        })
    }

    /// Values of different JSON types only ever satisfy `!=`. A missing
    /// column reads as null.
    pub fn matches(&self, row: &Row) -> bool {
        let value = get_or_null(row, &self.column);
        let same_type = std::mem::discriminant(value) == std::mem::discriminant(&self.literal);
        if !same_type {
            return self.op == CmpOp::Ne;
        }
        let ord = compare_values(value, &self.literal);
        match self.op {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
        }
    }
}

impl FromStr for Comparison {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.column, self.op.symbol(), self.literal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowq_core::row::row_from_value;
    use serde_json::json;

    fn rows(values: Vec<Value>) -> Vec<Row> {
        values.into_iter().filter_map(row_from_value).collect()
    }

    #[test]
    fn streaming_select_matches_materialized_select() {
        let input = rows(vec![
            json!({"age": 17}),
            json!({"age": 30}),
            json!({"name": "no age"}),
            json!({"age": 42}),
        ]);
        let pred = Comparison::parse("age >= 18").unwrap();

        let streamed: Vec<Row> = select(input.clone().into_iter().map(Ok), |r| pred.matches(r))
            .collect::<Result<_>>()
            .unwrap();
        let materialized: Vec<Row> = input.iter().filter(|r| pred.matches(r)).cloned().collect();

        assert_eq!(streamed, materialized);
        assert_eq!(streamed.len(), 2);
    }

    #[test]
    fn parses_operators_and_literals() {
        let c = Comparison::parse("name == Alice").unwrap();
        assert_eq!(c.op, CmpOp::Eq);
        assert_eq!(c.literal, json!("Alice"));

        let c = Comparison::parse("score<=2.5").unwrap();
        assert_eq!(c.column, "score");
        assert_eq!(c.op, CmpOp::Le);
        assert_eq!(c.literal, json!(2.5));

        assert!(Comparison::parse("no operator here").is_err());
        assert!(Comparison::parse("a = 1").is_err());
        assert!(Comparison::parse("== 3").is_err());
    }

    #[test]
    fn splits_on_leftmost_operator() {
        let c = Comparison::parse(r#"x < "a==b""#).unwrap();
        assert_eq!(c.column, "x");
        assert_eq!(c.op, CmpOp::Lt);
        assert_eq!(c.literal, json!("a==b"));

        let c = Comparison::parse("tag != a>=b").unwrap();
        assert_eq!(c.op, CmpOp::Ne);
        assert_eq!(c.literal, json!("a>=b"));

        let c = Comparison::parse("n>=-1").unwrap();
        assert_eq!(c.op, CmpOp::Ge);
        assert_eq!(c.literal, json!(-1));
    }

    #[test]
    fn type_mismatch_only_satisfies_not_equal() {
        let row = row_from_value(json!({"v": "10"})).unwrap();
        assert!(!Comparison::parse("v > 5").unwrap().matches(&row));
        assert!(Comparison::parse("v != 5").unwrap().matches(&row));
        assert!(Comparison::parse("v == \"10\"").unwrap().matches(&row));
    }

    #[test]
    fn missing_column_equals_null() {
        let row = row_from_value(json!({"a": 1})).unwrap();
        assert!(Comparison::parse("b == null").unwrap().matches(&row));
        assert!(!Comparison::parse("b > 0").unwrap().matches(&row));
    }

    #[test]
    fn errors_are_not_filtered_out() {
        let input = vec![Err(Error::parse(1, "bad"))];
        let out: Vec<_> = select(input.into_iter(), |_| false).collect();
        assert_eq!(out.len(), 1);
        assert!(out[0].is_err());
    }
}

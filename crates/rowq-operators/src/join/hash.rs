//! Hash join: index the right relation once, probe with each left row.
//!
//! Memory is O(|right|); time is O(|left| + matches). Because the index is
//! complete before the first probe, applying the join window by window over
//! the left side gives exactly the same rows as one pass over all of it.

use std::collections::{HashMap, HashSet};

use rowq_core::error::{Error, Result};
use rowq_core::key::{key_tuple, KeyAtom};
use rowq_core::row::{Relation, Row};

use super::JoinType;
use crate::traits::MaterializingOperator;

/// Join-key tuple → right rows carrying that tuple, in right-relation order.
#[derive(Debug, Clone, Default)]
pub struct JoinIndex {
    keys: Vec<String>,
    buckets: HashMap<Vec<KeyAtom>, Vec<Row>>,
    rows: usize,
}

impl JoinIndex {
    pub fn build(right: Relation, keys: Vec<String>) -> Self {
        let mut buckets: HashMap<Vec<KeyAtom>, Vec<Row>> = HashMap::new();
        let rows = right.len();
        for row in right {
            buckets.entry(key_tuple(&row, &keys)).or_default().push(row);
        }
        Self {
            keys,
            buckets,
            rows,
        }
    }

    pub fn probe(&self, key: &[KeyAtom]) -> &[Row] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of indexed right rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn distinct_keys(&self) -> usize {
        self.buckets.len()
    }
}

pub struct HashJoin {
    /// (left column, right column) pairs.
    pub on: Vec<(String, String)>,
    left_keys: Vec<String>,
    right_keys: HashSet<String>,
    index: JoinIndex,
}

impl HashJoin {
    pub fn new(right: Relation, on: Vec<(String, String)>, join_type: JoinType) -> Result<Self> {
        if join_type != JoinType::Inner {
            return Err(Error::Plan(format!(
                "{join_type} join is not supported; only inner joins are implemented"
            )));
        }
        if on.is_empty() {
            return Err(Error::Plan("join requires at least one key pair".into()));
        }
        let left_keys: Vec<String> = on.iter().map(|(l, _)| l.clone()).collect();
        let right_cols: Vec<String> = on.iter().map(|(_, r)| r.clone()).collect();
        let right_keys = right_cols.iter().cloned().collect();
        let index = JoinIndex::build(right, right_cols);
        tracing::debug!(
            right_rows = index.len(),
            distinct_keys = index.distinct_keys(),
            "built join index"
        );
        Ok(Self {
            on,
            left_keys,
            right_keys,
            index,
        })
    }

    pub fn index(&self) -> &JoinIndex {
        &self.index
    }

    /// Append one merged row per right match of `left` to `out`.
    pub fn join_row(&self, left: &Row, out: &mut Vec<Row>) {
        let key = key_tuple(left, &self.left_keys);
        for right in self.index.probe(&key) {
            out.push(self.merge(left, right));
        }
    }

    /// Left fields first, then right fields that neither collide with a left
    /// key nor are right-side join columns.
    fn merge(&self, left: &Row, right: &Row) -> Row {
        let mut merged = left.clone();
        for (k, v) in right {
            if merged.contains_key(k) || self.right_keys.contains(k) {
                continue;
            }
            merged.insert(k.clone(), v.clone());
        }
        merged
    }

    /// Streaming probe over the left side, preserving left order.
    pub fn stream<'a, I>(&'a self, left: I) -> impl Iterator<Item = Result<Row>> + 'a
    where
        I: Iterator<Item = Result<Row>> + 'a,
    {
        left.flat_map(move |item| -> Vec<Result<Row>> {
            match item {
                Ok(row) => {
                    let mut out = Vec::new();
                    self.join_row(&row, &mut out);
                    out.into_iter().map(Ok).collect()
                }
                Err(e) => vec![Err(e)],
            }
        })
    }
}

impl MaterializingOperator for HashJoin {
    fn name(&self) -> &'static str {
        "join"
    }

    fn apply(&self, rows: Relation) -> Result<Relation> {
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            self.join_row(row, &mut out);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowq_core::row::row_from_value;
    use serde_json::{json, Value};

    fn rows(values: Vec<Value>) -> Vec<Row> {
        values.into_iter().filter_map(row_from_value).collect()
    }

    fn on(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(l, r)| (l.to_string(), r.to_string())).collect()
    }

    #[test]
    fn drops_right_join_column_from_merged_row() {
        let join = HashJoin::new(
            rows(vec![json!({"uid": 1, "x": "y"})]),
            on(&[("id", "uid")]),
            JoinType::Inner,
        )
        .unwrap();
        let out = join.apply(rows(vec![json!({"id": 1, "name": "A"})])).unwrap();
        assert_eq!(out, rows(vec![json!({"id": 1, "name": "A", "x": "y"})]));
        let keys: Vec<&str> = out[0].keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["id", "name", "x"]);
    }

    #[test]
    fn left_fields_win_collisions() {
        let join = HashJoin::new(
            rows(vec![json!({"id": 1, "name": "right", "extra": true})]),
            on(&[("id", "id")]),
            JoinType::Inner,
        )
        .unwrap();
        let out = join.apply(rows(vec![json!({"id": 1, "name": "left"})])).unwrap();
        assert_eq!(out, rows(vec![json!({"id": 1, "name": "left", "extra": true})]));
    }

    #[test]
    fn one_output_row_per_match_in_left_order() {
        let join = HashJoin::new(
            rows(vec![
                json!({"k": 1, "r": "a"}),
                json!({"k": 2, "r": "b"}),
                json!({"k": 1, "r": "c"}),
            ]),
            on(&[("k", "k")]),
            JoinType::Inner,
        )
        .unwrap();
        let out = join
            .apply(rows(vec![json!({"k": 2}), json!({"k": 3}), json!({"k": 1})]))
            .unwrap();
        let r: Vec<Value> = out.iter().map(|row| row["r"].clone()).collect();
        assert_eq!(r, vec![json!("b"), json!("a"), json!("c")]);
    }

    #[test]
    fn multi_column_keys_match_as_tuples() {
        let join = HashJoin::new(
            rows(vec![json!({"a": 1, "b": "x", "v": 10}), json!({"a": 1, "b": "y", "v": 20})]),
            on(&[("a", "a"), ("b", "b")]),
            JoinType::Inner,
        )
        .unwrap();
        let out = join.apply(rows(vec![json!({"a": 1, "b": "y"})])).unwrap();
        assert_eq!(out, rows(vec![json!({"a": 1, "b": "y", "v": 20})]));
    }

    #[test]
    fn nested_key_values_match_structurally() {
        let join = HashJoin::new(
            rows(vec![
                json!({"loc": {"y": 2, "x": 1}, "name": "a"}),
                json!({"loc": [1, 2], "name": "b"}),
                json!({"loc": [2, 1], "name": "c"}),
            ]),
            on(&[("pos", "loc")]),
            JoinType::Inner,
        )
        .unwrap();
        let out = join
            .apply(rows(vec![
                json!({"pos": {"x": 1, "y": 2}}),
                json!({"pos": [1, 2]}),
                json!({"pos": {"x": 1}}),
                json!({"pos": "[1,2]"}),
            ]))
            .unwrap();
        assert_eq!(
            out,
            rows(vec![
                json!({"pos": {"x": 1, "y": 2}, "name": "a"}),
                json!({"pos": [1, 2], "name": "b"}),
            ])
        );
    }

    #[test]
    fn outer_join_types_are_refused() {
        for jt in [JoinType::Left, JoinType::Right, JoinType::Full] {
            let err = HashJoin::new(vec![], on(&[("a", "a")]), jt).err().unwrap();
            assert!(matches!(err, Error::Plan(_)));
        }
    }

    #[test]
    fn stream_matches_apply() {
        let right = rows(vec![json!({"k": 1, "r": 1}), json!({"k": 2, "r": 2})]);
        let left = rows(vec![json!({"k": 2}), json!({"k": 1}), json!({"k": 2})]);
        let join = HashJoin::new(right, on(&[("k", "k")]), JoinType::Inner).unwrap();
        let streamed: Vec<Row> = join
            .stream(left.clone().into_iter().map(Ok))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(streamed, join.apply(left).unwrap());
    }
}

//! Sort operator.
//!
//! Stable multi-key sort. Keys are compared in order, the first key most
//! significant; a missing or null value sorts before any present value.
//! `descending` reverses the whole order (nulls then come last) and keeps
//! equal rows in input order.

use rowq_core::error::Result;
use rowq_core::order::compare_rows_by;
use rowq_core::row::{Relation, Row};

use crate::traits::MaterializingOperator;

#[derive(Debug, Clone, Default)]
pub struct Sort {
    pub by: Vec<String>, // sort keys
    pub descending: bool,
}

impl Sort {
    pub fn new(by: Vec<String>, descending: bool) -> Self {
        Self { by, descending }
    }

    pub fn sort_rows(&self, rows: &mut [Row]) {
        if self.by.is_empty() {
            return;
        }
        // slice::sort_by is stable; flipping the comparator keeps ties in order.
        if self.descending {
            rows.sort_by(|a, b| compare_rows_by(b, a, &self.by));
        } else {
            rows.sort_by(|a, b| compare_rows_by(a, b, &self.by));
        }
    }
}

impl MaterializingOperator for Sort {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn apply(&self, mut rows: Relation) -> Result<Relation> {
        self.sort_rows(&mut rows);
        Ok(rows)
    }
}

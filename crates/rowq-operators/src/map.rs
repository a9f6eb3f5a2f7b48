//! Rename operator.
//!
//! Renames are applied simultaneously: every input key is looked up once in
//! the mapping, so `[(a, b), (b, a)]` swaps two columns instead of chaining.
//!
//! Collision rule: the output is built by walking the input row's keys in
//! order. When two keys land on the same output name (a renamed key hitting an
//! existing one, or two sources renamed to one target), the key processed
//! later in that walk wins the value, and the column keeps the position where
//! the name first appeared. If the mapping lists the same source twice, the
//! last pair wins.

use std::collections::HashMap;

use rowq_core::error::Result;
use rowq_core::row::Row;

#[derive(Debug, Clone, Default)]
pub struct Rename {
    /// Column rename map: old_name -> new_name
    renames: HashMap<String, String>,
}

impl Rename {
    pub fn new(mapping: &[(String, String)]) -> Self {
        let mut renames = HashMap::with_capacity(mapping.len());
        for (from, to) in mapping {
            renames.insert(from.clone(), to.clone());
        }
        Self { renames }
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    pub fn apply(&self, row: Row) -> Row {
        if self.renames.is_empty() {
            return row;
        }
        let mut out = Row::with_capacity(row.len());
        for (key, value) in row {
            let name = match self.renames.get(&key) {
                Some(new_name) => new_name.clone(),
                None => key,
            };
            // Inserting an existing key replaces the value in place.
            out.insert(name, value);
        }
        out
    }
}

/// Streaming rename over a row sequence.
pub fn rename<I>(input: I, mapping: &[(String, String)]) -> impl Iterator<Item = Result<Row>>
where
    I: Iterator<Item = Result<Row>>,
{
    let op = Rename::new(mapping);
    input.map(move |item| item.map(|row| op.apply(row)))
}

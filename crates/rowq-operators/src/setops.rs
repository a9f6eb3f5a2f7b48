//! Bag and set operators: union, distinct, intersection, difference.
//!
//! distinct, intersection and difference all compare rows by `CanonicalKey`,
//! so column order never matters and nested values fall back to their
//! key-sorted serialization.

use std::collections::HashSet;

use rowq_core::error::Result;
use rowq_core::key::CanonicalKey;
use rowq_core::row::{Relation, Row};

use crate::traits::MaterializingOperator;

/// Bag concatenation: all of `a` in order, then all of `b`. No deduplication.
pub fn union<A, B>(a: A, b: B) -> impl Iterator<Item = Result<Row>>
where
    A: Iterator<Item = Result<Row>>,
    B: Iterator<Item = Result<Row>>,
{
    a.chain(b)
}

/// First occurrence of each distinct row, in input order. Memory grows with
/// the number of distinct rows seen so far.
pub struct Distinct<I> {
    input: I,
    seen: HashSet<CanonicalKey>,
}

impl<I> Distinct<I> {
    pub fn new(input: I) -> Self {
        Self {
            input,
            seen: HashSet::new(),
        }
    }
}

impl<I> Iterator for Distinct<I>
where
    I: Iterator<Item = Result<Row>>,
{
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.input.next()? {
                Ok(row) => {
                    if self.seen.insert(CanonicalKey::of(&row)) {
                        return Some(Ok(row));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

pub fn distinct<I>(input: I) -> Distinct<I>
where
    I: Iterator<Item = Result<Row>>,
{
    Distinct::new(input)
}

/// Canonical keys of a fully read reference relation. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    keys: HashSet<CanonicalKey>,
}

impl ReferenceSet {
    pub fn build(rows: &[Row]) -> Self {
        Self {
            keys: rows.iter().map(CanonicalKey::of).collect(),
        }
    }

    pub fn contains(&self, row: &Row) -> bool {
        self.keys.contains(&CanonicalKey::of(row))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Rows of the primary relation whose key appears in the reference.
#[derive(Debug, Clone)]
pub struct Intersection {
    reference: ReferenceSet,
}

impl Intersection {
    pub fn new(reference: &[Row]) -> Self {
        Self {
            reference: ReferenceSet::build(reference),
        }
    }

    pub fn keep(&self, row: &Row) -> bool {
        self.reference.contains(row)
    }
}

impl MaterializingOperator for Intersection {
    fn name(&self) -> &'static str {
        "intersection"
    }

    fn apply(&self, mut rows: Relation) -> Result<Relation> {
        rows.retain(|r| self.keep(r));
        Ok(rows)
    }
}

/// Rows of the primary relation whose key is absent from the reference.
#[derive(Debug, Clone)]
pub struct Difference {
    reference: ReferenceSet,
}

impl Difference {
    pub fn new(reference: &[Row]) -> Self {
        Self {
            reference: ReferenceSet::build(reference),
        }
    }

    pub fn keep(&self, row: &Row) -> bool {
        !self.reference.contains(row)
    }
}

impl MaterializingOperator for Difference {
    fn name(&self) -> &'static str {
        "difference"
    }

    fn apply(&self, mut rows: Relation) -> Result<Relation> {
        rows.retain(|r| self.keep(r));
        Ok(rows)
    }
}

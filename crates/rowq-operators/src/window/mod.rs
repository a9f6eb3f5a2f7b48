//! Window accumulator: turns any materializing operator into a bounded-memory
//! variant.
//!
//! Input is cut into consecutive, non-overlapping windows of `window_size`
//! rows (the last one possibly shorter). Each window is handed to the
//! operator on its own and its output emitted before the next window is read.
//!
//! What that costs depends on the operator:
//! - sort and groupby lose their cross-window guarantees (order only holds
//!   within a window; a group spanning windows yields one partial row per
//!   window).
//! - join, intersection and difference keep a fully built reference side
//!   and only window the primary side, so their output is exact.

use rowq_core::error::{Error, Result};
use rowq_core::row::{Relation, Row};

use crate::agg::{AggSpec, GroupBy};
use crate::join::{HashJoin, JoinType};
use crate::setops::{Difference, Intersection};
use crate::sort::Sort;
use crate::traits::MaterializingOperator;

/// Counters for one windowed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowStats {
    pub windows: u64,
    pub rows_in: u64,
    pub rows_out: u64,
    /// Largest number of input rows held at once; never above the window size.
    pub peak_buffered: usize,
}

pub struct Windowed<I, Op> {
    input: I,
    op: Op,
    window_size: usize,
    pending: std::vec::IntoIter<Row>,
    done: bool,
    stats: WindowStats,
}

impl<I, Op> Windowed<I, Op>
where
    I: Iterator<Item = Result<Row>>,
    Op: MaterializingOperator,
{
    pub fn new(input: I, op: Op, window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::Config("window size must be at least 1".into()));
        }
        Ok(Self {
            input,
            op,
            window_size,
            pending: Vec::new().into_iter(),
            done: false,
            stats: WindowStats::default(),
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn stats(&self) -> WindowStats {
        self.stats
    }

    pub fn operator(&self) -> &Op {
        &self.op
    }

    /// Read the next window. `Ok(None)` once input is exhausted.
    fn fill(&mut self) -> Result<Option<Relation>> {
        let mut buf = Vec::with_capacity(self.window_size);
        while buf.len() < self.window_size {
            match self.input.next() {
                Some(row) => buf.push(row?),
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        if buf.is_empty() {
            return Ok(None);
        }
        Ok(Some(buf))
    }

    fn flush(&mut self, window: Relation) -> Result<()> {
        let len = window.len();
        self.stats.windows += 1;
        self.stats.rows_in += len as u64;
        self.stats.peak_buffered = self.stats.peak_buffered.max(len);
        let out = self.op.apply(window)?;
        tracing::debug!(
            op = self.op.name(),
            window = self.stats.windows,
            rows_in = len,
            rows_out = out.len(),
            "window flushed"
        );
        self.pending = out.into_iter();
        Ok(())
    }
}

impl<I, Op> Iterator for Windowed<I, Op>
where
    I: Iterator<Item = Result<Row>>,
    Op: MaterializingOperator,
{
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.next() {
                self.stats.rows_out += 1;
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            let step = match self.fill() {
                Ok(Some(window)) => self.flush(window),
                Ok(None) => return None,
                Err(e) => Err(e),
            };
            if let Err(e) = step {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

/// Sort each window independently; no ordering across windows.
pub fn windowed_sort<I>(
    input: I,
    by: Vec<String>,
    descending: bool,
    window_size: usize,
) -> Result<Windowed<I, Sort>>
where
    I: Iterator<Item = Result<Row>>,
{
    Windowed::new(input, Sort::new(by, descending), window_size)
}

/// One partial aggregate row per (group, window).
pub fn windowed_groupby<I>(
    input: I,
    keys: Vec<String>,
    specs: Vec<AggSpec>,
    window_size: usize,
) -> Result<Windowed<I, GroupBy>>
where
    I: Iterator<Item = Result<Row>>,
{
    Windowed::new(input, GroupBy::new(keys, specs)?, window_size)
}

/// Exact: `right` is indexed once, the left side is windowed.
pub fn windowed_join<I>(
    input: I,
    right: Relation,
    on: Vec<(String, String)>,
    window_size: usize,
) -> Result<Windowed<I, HashJoin>>
where
    I: Iterator<Item = Result<Row>>,
{
    Windowed::new(input, HashJoin::new(right, on, JoinType::Inner)?, window_size)
}

pub fn windowed_intersection<I>(
    input: I,
    reference: &[Row],
    window_size: usize,
) -> Result<Windowed<I, Intersection>>
where
    I: Iterator<Item = Result<Row>>,
{
    Windowed::new(input, Intersection::new(reference), window_size)
}

pub fn windowed_difference<I>(
    input: I,
    reference: &[Row],
    window_size: usize,
) -> Result<Windowed<I, Difference>>
where
    I: Iterator<Item = Result<Row>>,
{
    Windowed::new(input, Difference::new(reference), window_size)
}

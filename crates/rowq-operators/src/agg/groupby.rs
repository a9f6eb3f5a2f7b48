//! Two-phase group-by: collect rows into per-group accumulators, then
//! resolve every accumulator into one output row.
//!
//! Groups are keyed by a tuple of one or more columns, so multi-level
//! grouping is expressed as a longer key rather than as chained passes.
//! Output rows follow the first-seen order of their key values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use rowq_core::error::{Error, Result};
use rowq_core::key::{key_tuple, KeyAtom};
use rowq_core::row::{get_or_null, Relation, Row};

use super::registry::{AggregatorDef, AggregatorRegistry, CollectMode, Collected, BUILTINS};
use crate::traits::MaterializingOperator;

/// One requested aggregation: aggregator name plus source column. The column
/// is empty for bare `count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggSpec {
    pub func: String,
    #[serde(default)]
    pub column: String,
}

impl AggSpec {
    pub fn new(func: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            func: func.into(),
            column: column.into(),
        }
    }

    /// `<func>_<column>`, or just `<func>` when the column is empty.
    pub fn output_name(&self) -> String {
        if self.column.is_empty() {
            self.func.clone()
        } else {
            format!("{}_{}", self.func, self.column)
        }
    }
}

#[derive(Debug, Clone)]
struct BoundSpec {
    spec: AggSpec,
    def: AggregatorDef,
    output: String,
}

#[derive(Debug, Clone)]
enum Slot {
    Values(Vec<Value>),
    Retained(Option<Value>),
}

/// Running state for one group-key value.
#[derive(Debug, Clone)]
pub struct GroupAccumulator {
    /// Raw key values of the first row seen for this group.
    pub key_values: Vec<Value>,
    pub count: u64,
    slots: Vec<Slot>,
}

/// Output of the collection phase.
#[derive(Debug, Clone, Default)]
pub struct Groups {
    index: HashMap<Vec<KeyAtom>, usize>,
    accs: Vec<GroupAccumulator>,
}

impl Groups {
    pub fn len(&self) -> usize {
        self.accs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accs.is_empty()
    }

    pub fn accumulators(&self) -> &[GroupAccumulator] {
        &self.accs
    }
}

#[derive(Debug, Clone)]
pub struct GroupBy {
    keys: Vec<String>,
    specs: Vec<BoundSpec>,
}

impl GroupBy {
    /// Group-by over the built-in aggregators.
    pub fn new(keys: Vec<String>, specs: Vec<AggSpec>) -> Result<Self> {
        Self::with_registry(keys, specs, &BUILTINS)
    }

    /// Resolves every aggregator name up front, so an unknown name fails
    /// before any row is read.
    pub fn with_registry(
        keys: Vec<String>,
        specs: Vec<AggSpec>,
        registry: &AggregatorRegistry,
    ) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::Plan("groupby requires at least one key column".into()));
        }
        let mut bound = Vec::with_capacity(specs.len());
        for spec in specs {
            let def = registry.lookup(&spec.func)?;
            if spec.column.is_empty() && !def.bare {
                return Err(Error::Plan(format!(
                    "aggregator '{}' needs a column",
                    spec.func
                )));
            }
            let output = spec.output_name();
            bound.push(BoundSpec { spec, def, output });
        }
        Ok(Self {
            keys,
            specs: bound,
        })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn specs(&self) -> impl Iterator<Item = &AggSpec> {
        self.specs.iter().map(|b| &b.spec)
    }

    fn new_accumulator(&self, row: &Row) -> GroupAccumulator {
        let key_values = self
            .keys
            .iter()
            .map(|k| get_or_null(row, k).clone())
            .collect();
        let slots = self
            .specs
            .iter()
            .map(|b| match b.def.mode {
                CollectMode::Values => Slot::Values(Vec::new()),
                CollectMode::First | CollectMode::Last => Slot::Retained(None),
            })
            .collect();
        GroupAccumulator {
            key_values,
            count: 0,
            slots,
        }
    }

    fn accumulate(&self, acc: &mut GroupAccumulator, row: &Row) {
        acc.count += 1;
        for (b, slot) in self.specs.iter().zip(acc.slots.iter_mut()) {
            if b.spec.column.is_empty() {
                continue;
            }
            // A row lacking the column contributes null in every mode.
            let value = get_or_null(row, &b.spec.column);
            match (b.def.mode, slot) {
                (CollectMode::Values, Slot::Values(values)) => values.push(value.clone()),
                (CollectMode::First, Slot::Retained(kept)) => {
                    if kept.is_none() {
                        *kept = Some(value.clone());
                    }
                }
                (CollectMode::Last, Slot::Retained(kept)) => *kept = Some(value.clone()),
                _ => {}
            }
        }
    }

    /// Collection phase. The first error from `rows` aborts collection.
    pub fn collect<I>(&self, rows: I) -> Result<Groups>
    where
        I: IntoIterator<Item = Result<Row>>,
    {
        let mut groups = Groups::default();
        for row in rows {
            let row = row?;
            let key = key_tuple(&row, &self.keys);
            let idx = match groups.index.get(&key) {
                Some(&idx) => idx,
                None => {
                    let idx = groups.accs.len();
                    groups.accs.push(self.new_accumulator(&row));
                    groups.index.insert(key, idx);
                    idx
                }
            };
            self.accumulate(&mut groups.accs[idx], &row);
        }
        Ok(groups)
    }

    /// Resolution phase: one row per group, in first-seen order.
    pub fn resolve(&self, groups: Groups) -> Result<Relation> {
        tracing::debug!(groups = groups.len(), "resolving groups");
        let mut out = Vec::with_capacity(groups.accs.len());
        for acc in groups.accs {
            let mut row = Row::with_capacity(self.keys.len() + self.specs.len());
            for (k, v) in self.keys.iter().zip(acc.key_values) {
                row.insert(k.clone(), v);
            }
            for (b, slot) in self.specs.iter().zip(acc.slots.iter()) {
                let (values, retained): (&[Value], Option<&Value>) = match slot {
                    Slot::Values(vs) => (vs, None),
                    Slot::Retained(kept) => (&[], kept.as_ref()),
                };
                let collected = Collected {
                    aggregator: &b.spec.func,
                    column: &b.spec.column,
                    row_count: acc.count,
                    values,
                    retained,
                };
                row.insert(b.output.clone(), (b.def.resolve)(&collected)?);
            }
            out.push(row);
        }
        Ok(out)
    }
}

impl MaterializingOperator for GroupBy {
    fn name(&self) -> &'static str {
        "groupby"
    }

    fn apply(&self, rows: Relation) -> Result<Relation> {
        let groups = self.collect(rows.into_iter().map(Ok))?;
        self.resolve(groups)
    }
}

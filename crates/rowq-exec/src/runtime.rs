//! Runtime: execute a `QueryPlan` and emit a `RunReport`.
//!
//! A run moves through three phases:
//! - planning: hash the plan, layer its config overrides, pick a strategy per
//!   step and report the resulting warnings (nothing has been read yet);
//! - building: chain the steps into one lazy row stream, reading reference
//!   relations into memory where a step needs them;
//! - emitting: drain the stream into the sink. The first error aborts the
//!   run; rows already written stay written.

use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rowq_core::config::EngineConfig;
use rowq_core::error::Error;
use rowq_core::row::{Relation, RowStream};
use rowq_io::{JsonlWriter, RowSource, SourceSpec};
use rowq_operators::agg::GroupBy;
use rowq_operators::filter::{select, Comparison};
use rowq_operators::join::HashJoin;
use rowq_operators::map::rename;
use rowq_operators::project::project;
use rowq_operators::setops::{distinct, union, Difference, Intersection};
use rowq_operators::sort::Sort;
use rowq_operators::{
    choose_strategy, MaterializingOperator, Strategy, StrategyWarning, Windowed,
};

use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::metrics::emit_span;
use crate::plan::{QueryPlan, Step};
use crate::replay::hash_plan;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Core(#[from] Error),
    #[error("plan decode (yaml): {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("plan decode (json): {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid plan: {0}")]
    Invalid(String),
    #[error("strategy warning is fatal under fail_on_warning: {0}")]
    Warning(StrategyWarning),
    #[error("hashing error: {0}")]
    Hash(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub op: String,
    pub strategy: Strategy,
}

/// Provenance and counters for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// blake3 of the serialized plan, hex encoded.
    pub plan_hash: String,
    pub engine_version: String,
    pub steps: Vec<StepReport>,
    pub rows_in: u64,
    pub rows_out: u64,
    pub warnings: Vec<StrategyWarning>,
    pub started_ms: u64,
    pub finished_ms: u64,
}

pub struct Engine {
    cfg: EngineConfig,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self::with_diagnostics(cfg, Arc::new(TracingDiagnostics))
    }

    /// Defaults layered with `ROWQ_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env())
    }

    pub fn with_diagnostics(cfg: EngineConfig, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self { cfg, diagnostics }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Execute `plan`, writing NDJSON rows to `sink`.
    pub fn run<W: Write>(&self, plan: &QueryPlan, sink: W) -> Result<RunReport, ExecError> {
        let started_ms = now_millis();
        plan.validate()?;
        let plan_hash = hash_plan(plan)?;

        let mut cfg = self.cfg.clone();
        cfg.apply(&plan.config);
        cfg.validate()?;

        let mut steps = Vec::with_capacity(plan.steps.len());
        let mut warnings = Vec::new();
        for planned in &plan.steps {
            let op = planned.step.name();
            let decision = choose_strategy(op, &planned.strategy, cfg.default_window_size)?;
            for w in &decision.warnings {
                self.diagnostics.warning(w);
                if cfg.fail_on_warning && w.is_degradation() {
                    return Err(ExecError::Warning(w.clone()));
                }
            }
            warnings.extend(decision.warnings);
            steps.push(StepReport {
                op: op.to_string(),
                strategy: decision.strategy,
            });
        }
        tracing::info!(plan = %plan_hash, steps = steps.len(), "run started");

        let rows_in = Rc::new(Cell::new(0u64));
        let counter = Rc::clone(&rows_in);
        let mut source = RowSource::open(&plan.input, cfg.read_buffer_bytes)?;
        let mut stream: RowStream<'static> = Box::new(source.rows()?.inspect(move |r| {
            if r.is_ok() {
                counter.set(counter.get() + 1);
            }
        }));
        for (planned, report) in plan.steps.iter().zip(&steps) {
            stream = build_step(&planned.step, report.strategy, stream, &cfg)?;
        }

        let mut writer = JsonlWriter::to_writer(sink);
        let rows_out = writer.write_all(stream)?;

        let report = RunReport {
            plan_hash: plan_hash.to_hex(),
            engine_version: rowq_core::VERSION.to_string(),
            steps,
            rows_in: rows_in.get(),
            rows_out,
            warnings,
            started_ms,
            finished_ms: now_millis(),
        };
        emit_span(
            "run_finished",
            &[
                ("rows_in", report.rows_in.to_string()),
                ("rows_out", report.rows_out.to_string()),
                ("elapsed_ms", report.finished_ms.saturating_sub(report.started_ms).to_string()),
            ],
        );
        tracing::info!(rows_in = report.rows_in, rows_out = report.rows_out, "run finished");
        Ok(report)
    }
}

// --- helpers ---

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Reference relations are read once, fully, before the step runs.
fn load_reference(spec: &SourceSpec, cfg: &EngineConfig) -> Result<Relation, ExecError> {
    let mut source = RowSource::open(spec, cfg.read_buffer_bytes)?;
    let rows = source.materialize()?;
    tracing::debug!(source = source.label(), rows = rows.len(), "loaded reference relation");
    Ok(rows)
}

fn materializing_op(
    step: &Step,
    cfg: &EngineConfig,
) -> Result<Box<dyn MaterializingOperator>, ExecError> {
    let op: Box<dyn MaterializingOperator> = match step {
        Step::Sort { by, descending } => Box::new(Sort::new(by.clone(), *descending)),
        Step::Groupby { keys, aggs } => Box::new(GroupBy::new(keys.clone(), aggs.clone())?),
        Step::Join {
            other,
            on,
            join_type,
        } => Box::new(HashJoin::new(
            load_reference(other, cfg)?,
            on.clone(),
            *join_type,
        )?),
        Step::Intersection { other } => {
            Box::new(Intersection::new(&load_reference(other, cfg)?))
        }
        Step::Difference { other } => Box::new(Difference::new(&load_reference(other, cfg)?)),
        other => {
            return Err(ExecError::Invalid(format!(
                "{} is not a materializing operator",
                other.name()
            )))
        }
    };
    Ok(op)
}

fn build_step(
    step: &Step,
    strategy: Strategy,
    input: RowStream<'static>,
    cfg: &EngineConfig,
) -> Result<RowStream<'static>, ExecError> {
    let stream: RowStream<'static> = match (strategy, step) {
        (Strategy::Stream, Step::Select { predicate }) => {
            let cmp = Comparison::parse(predicate)?;
            Box::new(select(input, move |row| cmp.matches(row)))
        }
        (Strategy::Stream, Step::Project { columns }) => Box::new(project(input, columns.clone())),
        (Strategy::Stream, Step::Rename { mapping }) => Box::new(rename(input, mapping)),
        (Strategy::Stream, Step::Union { other }) => {
            let mut source = RowSource::open(other, cfg.read_buffer_bytes)?;
            Box::new(union(input, source.rows()?))
        }
        (Strategy::Stream, Step::Distinct) => Box::new(distinct(input)),
        (Strategy::Windowed { window_size }, step) => {
            Box::new(Windowed::new(input, materializing_op(step, cfg)?, window_size)?)
        }
        (Strategy::Materialize, step) => {
            let op = materializing_op(step, cfg)?;
            // Nothing is read until the sink pulls the first row.
            let mut pending = Some((input, op));
            Box::new(
                std::iter::from_fn(move || {
                    let (input, op) = pending.take()?;
                    let out = input
                        .collect::<rowq_core::error::Result<Relation>>()
                        .and_then(|rows| op.apply(rows));
                    Some(out)
                })
                .flat_map(|out| -> Vec<rowq_core::error::Result<_>> {
                    match out {
                        Ok(rows) => rows.into_iter().map(Ok).collect(),
                        Err(e) => vec![Err(e)],
                    }
                }),
            )
        }
        (Strategy::Stream, step) => {
            return Err(ExecError::Invalid(format!("{} cannot stream", step.name())))
        }
    };
    Ok(stream)
}

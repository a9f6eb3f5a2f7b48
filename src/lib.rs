#![forbid(unsafe_code)]
//! rowq: row-oriented query and aggregation over newline-delimited JSON.
//!
//! Facade over the workspace crates:
//! - `model`: rows, errors, keys, ordering, configuration
//! - `io`: NDJSON row sources and sinks
//! - `operators`: streaming, materializing, windowed and aggregation operators
//! - `exec`: declarative plans, strategy selection, run reports

pub use rowq_core as model;
pub use rowq_exec as exec;
pub use rowq_io as io;
pub use rowq_operators as operators;

pub use rowq_core::prelude::*;
pub use rowq_exec::{Engine, ExecError, QueryPlan, RunReport, Step};
pub use rowq_io::{JsonlWriter, RowSource, SourceSpec};

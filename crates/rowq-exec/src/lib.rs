#![forbid(unsafe_code)]
//! rowq-exec: runs declarative query plans end to end.
//!
//! A run resolves one execution strategy per step (stream, windowed, or full
//! materialization), reports strategy warnings through `Diagnostics`, pipes
//! rows from the input source to an NDJSON sink, and returns a `RunReport`.

pub mod diagnostics;
pub mod metrics;
pub mod plan;
pub mod replay;
pub mod runtime;

pub use diagnostics::{CollectingDiagnostics, Diagnostics, TracingDiagnostics};
pub use plan::{PlannedStep, QueryPlan, Step};
pub use runtime::{Engine, ExecError, RunReport, StepReport};

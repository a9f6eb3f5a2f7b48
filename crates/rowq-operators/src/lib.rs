#![forbid(unsafe_code)]
//! rowq-operators: the relational operators of the engine.
//!
//! Design intent:
//! - Streaming operators (select/project/rename/union/distinct) are iterator
//!   adapters over `Result<Row>` and never buffer more than they must.
//! - Materializing operators (sort/join/groupby/intersection/difference)
//!   implement `MaterializingOperator` and consume a whole `Relation`.
//! - `window::Windowed` turns any materializing operator into a bounded-memory
//!   variant by applying it one window at a time.
//! - `classify` tells callers which of those paths an operator supports.

pub mod traits;

pub mod classify;
pub mod filter;
pub mod map;
pub mod path;
pub mod project;
pub mod setops;

pub mod agg;
pub mod join;
pub mod sort;
pub mod window;

pub use classify::{
    choose_strategy, classify, OpTraits, Strategy, StrategyDecision, StrategyRequest,
    StrategyWarning, WindowAccuracy,
};
pub use window::{WindowStats, Windowed};
pub use traits::MaterializingOperator;

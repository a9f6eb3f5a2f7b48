//! Aggregation engine: the named-aggregator dispatch table and the two-phase
//! group-by built on it.

pub mod groupby;
pub mod registry;

pub use groupby::{AggSpec, GroupAccumulator, GroupBy, Groups};
pub use registry::{AggregatorDef, AggregatorRegistry, CollectMode, Collected, BUILTINS};

#![forbid(unsafe_code)]
//! rowq-core: row model, canonical keys, value ordering, errors, config, hashing.
//!
//! Everything else in the workspace speaks in terms of the `Row` / `Relation`
//! types defined here. Core stays free of IO and logging so that every other
//! crate can depend on it without pulling a runtime along.

pub mod config;
pub mod error;
pub mod hash;
pub mod key;
pub mod order;
pub mod prelude;
pub mod row;

/// Version string stamped into run reports.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#![forbid(unsafe_code)]
//! rowq-io: the engine's NDJSON boundary.
//!
//! Relations enter through `RowSource` (file, stdin sentinel, or an in-memory
//! line sequence) and leave through `JsonlWriter`. Nothing else in the
//! workspace reads or writes row data.

pub mod readers;
pub mod writers;

pub use readers::jsonl::{JsonlRows, RowSource, SourceSpec};
pub use writers::jsonl::JsonlWriter;

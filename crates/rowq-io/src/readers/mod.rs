//! Lazy row readers.

pub mod jsonl;

//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{json, Value};

use rowq::{row_from_value, CanonicalKey, Row};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Fresh directory under the system temp dir, unique per call.
pub fn create_temp_dir() -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("rowq-test-{}-{}", std::process::id(), n));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn rows(values: Vec<Value>) -> Vec<Row> {
    values
        .into_iter()
        .map(|v| row_from_value(v).expect("fixture rows must be objects"))
        .collect()
}

pub fn write_jsonl(dir: &Path, name: &str, rows: &[Row]) -> PathBuf {
    let path = dir.join(name);
    let body: String = rows
        .iter()
        .map(|r| format!("{}\n", serde_json::to_string(r).expect("serialize row")))
        .collect();
    fs::write(&path, body).expect("write fixture");
    path
}

pub fn read_jsonl(bytes: &[u8]) -> Vec<Row> {
    std::str::from_utf8(bytes)
        .expect("utf8 output")
        .lines()
        .map(|l| serde_json::from_str(l).expect("output line is a JSON object"))
        .collect()
}

/// Deterministic orders: `n` rows over `regions` regions, some with a
/// missing or null amount.
pub fn orders(n: usize, regions: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            let region = format!("r{}", (i * 7) % regions.max(1));
            let v = match i % 11 {
                0 => json!({"id": i, "region": region}),
                5 => json!({"id": i, "region": region, "amount": null}),
                _ => json!({"id": i, "region": region, "amount": (i * 13) % 97}),
            };
            row_from_value(v).expect("object")
        })
        .collect()
}

/// Canonical, order-insensitive view of a relation.
pub fn multiset(rows: &[Row]) -> Vec<String> {
    let mut keys: Vec<String> = rows
        .iter()
        .map(|r| format!("{:?}", CanonicalKey::of(r)))
        .collect();
    keys.sort();
    keys
}

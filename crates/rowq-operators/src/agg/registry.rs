//! Named aggregator dispatch table.
//!
//! Each aggregator declares how values are collected per group and how the
//! collected data resolves to one output value. The built-in table is shared
//! through `BUILTINS`; callers wanting extra aggregators clone it and
//! `register` their own.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::{Number, Value};

use rowq_core::error::{Error, Result};
use rowq_core::order::compare_values;

/// How a group accumulator collects a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectMode {
    /// Append every row's value; rows lacking the column append `null`.
    Values,
    /// Keep the first row's value, `null` if that row lacks the column.
    First,
    /// Overwrite on every row; a row lacking the column leaves `null`.
    Last,
}

/// Everything a resolver may look at for one (group, aggregator, column).
#[derive(Debug, Clone, Copy)]
pub struct Collected<'a> {
    pub aggregator: &'a str,
    pub column: &'a str,
    /// Rows in the group.
    pub row_count: u64,
    /// Collected values (`CollectMode::Values`); empty otherwise.
    pub values: &'a [Value],
    /// Retained scalar (`First`/`Last`); `None` for `Values` slots.
    pub retained: Option<&'a Value>,
}

pub type Resolver = fn(&Collected<'_>) -> Result<Value>;

#[derive(Clone, Copy)]
pub struct AggregatorDef {
    pub mode: CollectMode,
    pub resolve: Resolver,
    /// May be used with an empty column name (only `count` among built-ins).
    pub bare: bool,
}

impl std::fmt::Debug for AggregatorDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregatorDef")
            .field("mode", &self.mode)
            .field("bare", &self.bare)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregatorRegistry {
    table: HashMap<String, AggregatorDef>,
}

pub static BUILTINS: Lazy<AggregatorRegistry> = Lazy::new(AggregatorRegistry::with_builtins);

impl AggregatorRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut reg = Self::empty();
        reg.register("sum", CollectMode::Values, resolve_sum);
        reg.register("avg", CollectMode::Values, resolve_avg);
        reg.register("min", CollectMode::Values, resolve_min);
        reg.register("max", CollectMode::Values, resolve_max);
        reg.register("list", CollectMode::Values, resolve_list);
        reg.register("first", CollectMode::First, resolve_retained);
        reg.register("last", CollectMode::Last, resolve_retained);
        reg.register_bare("count", CollectMode::Values, resolve_count);
        reg
    }

    /// Add or replace an aggregator that requires a column.
    pub fn register(&mut self, name: &str, mode: CollectMode, resolve: Resolver) {
        self.table.insert(
            name.to_string(),
            AggregatorDef {
                mode,
                resolve,
                bare: false,
            },
        );
    }

    /// Add or replace an aggregator that may also be used without a column.
    pub fn register_bare(&mut self, name: &str, mode: CollectMode, resolve: Resolver) {
        self.table.insert(
            name.to_string(),
            AggregatorDef {
                mode,
                resolve,
                bare: true,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<AggregatorDef> {
        self.table.get(name).copied()
    }

    pub fn lookup(&self, name: &str) -> Result<AggregatorDef> {
        self.get(name)
            .ok_or_else(|| Error::UnsupportedAggregator(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

// --- numeric coercion ---

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

/// `None` for null; numbers, numeric strings and booleans coerce; anything
/// else is a fatal coercion error.
fn coerce(c: &Collected<'_>, v: &Value) -> Result<Option<Num>> {
    let num = match v {
        Value::Null => return Ok(None),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Num::Int(i)),
            None => n.as_f64().map(Num::Float),
        },
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => Some(Num::Int(i)),
                Err(_) => s.parse::<f64>().ok().filter(|f| f.is_finite()).map(Num::Float),
            }
        }
        Value::Array(_) | Value::Object(_) => None,
    };
    num.map(Some).ok_or_else(|| Error::NumericCoercion {
        aggregator: c.aggregator.to_string(),
        column: c.column.to_string(),
        value: v.to_string(),
    })
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

// --- built-in resolvers ---

fn resolve_sum(c: &Collected<'_>) -> Result<Value> {
    let mut int_sum: Option<i64> = Some(0);
    let mut float_sum = 0.0f64;
    for v in c.values {
        let Some(n) = coerce(c, v)? else { continue };
        float_sum += n.as_f64();
        int_sum = match (int_sum, n) {
            (Some(acc), Num::Int(i)) => acc.checked_add(i),
            _ => None,
        };
    }
    Ok(match int_sum {
        Some(i) => Value::from(i),
        None => float_value(float_sum),
    })
}

fn resolve_avg(c: &Collected<'_>) -> Result<Value> {
    let mut total = 0.0f64;
    let mut n = 0u64;
    for v in c.values {
        if let Some(x) = coerce(c, v)? {
            total += x.as_f64();
            n += 1;
        }
    }
    if n == 0 {
        return Ok(Value::Null);
    }
    Ok(float_value(total / n as f64))
}

/// Smallest non-null value under the sort order; first wins on ties.
fn resolve_min(c: &Collected<'_>) -> Result<Value> {
    let mut best: Option<&Value> = None;
    for v in c.values.iter().filter(|v| !v.is_null()) {
        if best.map_or(true, |b| compare_values(v, b).is_lt()) {
            best = Some(v);
        }
    }
    Ok(best.cloned().unwrap_or(Value::Null))
}

fn resolve_max(c: &Collected<'_>) -> Result<Value> {
    let mut best: Option<&Value> = None;
    for v in c.values.iter().filter(|v| !v.is_null()) {
        if best.map_or(true, |b| compare_values(v, b).is_gt()) {
            best = Some(v);
        }
    }
    Ok(best.cloned().unwrap_or(Value::Null))
}

fn resolve_list(c: &Collected<'_>) -> Result<Value> {
    Ok(Value::Array(c.values.to_vec()))
}

fn resolve_retained(c: &Collected<'_>) -> Result<Value> {
    Ok(c.retained.cloned().unwrap_or(Value::Null))
}

/// Bare `count` is the group's row count; `count` of a column counts its
/// non-null values.
fn resolve_count(c: &Collected<'_>) -> Result<Value> {
    if c.column.is_empty() {
        return Ok(Value::from(c.row_count));
    }
    Ok(Value::from(c.values.iter().filter(|v| !v.is_null()).count() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collected<'a>(agg: &'a str, values: &'a [Value]) -> Collected<'a> {
        Collected {
            aggregator: agg,
            column: "v",
            row_count: values.len() as u64,
            values,
            retained: None,
        }
    }

    fn run(agg: &str, values: &[Value]) -> Result<Value> {
        let def = BUILTINS.lookup(agg)?;
        (def.resolve)(&collected(agg, values))
    }

    #[test]
    fn sum_stays_integral_for_integers() {
        assert_eq!(run("sum", &[json!(10), json!(20)]).unwrap(), json!(30));
        assert_eq!(run("sum", &[json!(1), json!(0.5)]).unwrap(), json!(1.5));
        assert_eq!(run("sum", &[]).unwrap(), json!(0));
        assert_eq!(run("sum", &[json!(null), json!("2"), json!(true)]).unwrap(), json!(3));
    }

    #[test]
    fn sum_overflow_falls_back_to_float() {
        let out = run("sum", &[json!(i64::MAX), json!(1)]).unwrap();
        assert!(out.is_f64());
    }

    #[test]
    fn coercion_failure_is_fatal() {
        let err = run("sum", &[json!(1), json!("abc")]).unwrap_err();
        assert!(matches!(err, Error::NumericCoercion { .. }));
        assert!(run("avg", &[json!([1])]).is_err());
    }

    #[test]
    fn avg_is_null_over_empty_numeric_input() {
        assert_eq!(run("avg", &[json!(null)]).unwrap(), Value::Null);
        assert_eq!(run("avg", &[json!(1), json!(2)]).unwrap(), json!(1.5));
    }

    #[test]
    fn min_max_skip_nulls_and_keep_raw_values() {
        let vals = [json!(null), json!(3), json!(-1.5), json!(7)];
        assert_eq!(run("min", &vals).unwrap(), json!(-1.5));
        assert_eq!(run("max", &vals).unwrap(), json!(7));
        assert_eq!(run("min", &[json!(null)]).unwrap(), Value::Null);
        assert_eq!(run("max", &[]).unwrap(), Value::Null);
    }

    #[test]
    fn list_keeps_null_placeholders() {
        let vals = [json!(1), json!(null), json!("x")];
        assert_eq!(run("list", &vals).unwrap(), json!([1, null, "x"]));
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(matches!(
            BUILTINS.lookup("median"),
            Err(Error::UnsupportedAggregator(name)) if name == "median"
        ));
    }

    #[test]
    fn registry_is_extensible() {
        fn resolve_distinct_count(c: &Collected<'_>) -> Result<Value> {
            let mut seen: Vec<&Value> = Vec::new();
            for v in c.values {
                if !seen.contains(&v) {
                    seen.push(v);
                }
            }
            Ok(Value::from(seen.len() as u64))
        }
        let mut reg = AggregatorRegistry::with_builtins();
        reg.register("distinct_count", CollectMode::Values, resolve_distinct_count);
        let def = reg.lookup("distinct_count").unwrap();
        let vals = [json!(1), json!(1), json!(2)];
        assert_eq!((def.resolve)(&collected("distinct_count", &vals)).unwrap(), json!(2));
        assert!(reg.names().contains(&"distinct_count"));
    }
}

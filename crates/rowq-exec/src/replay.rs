//! Provenance helpers.
//!
//! The plan hash in a `RunReport` is the blake3 digest of the serialized
//! `QueryPlan`. Re-running the same plan over the same inputs produces the
//! same hash and the same rows, so a report can be checked against a plan.

use rowq_core::hash::{hash_serde, Hash256};

use crate::plan::QueryPlan;
use crate::runtime::{ExecError, RunReport};

pub fn hash_plan(plan: &QueryPlan) -> Result<Hash256, ExecError> {
    hash_serde(plan).map_err(|e| ExecError::Hash(e.to_string()))
}

/// True when `report` was produced from `plan`.
pub fn report_matches(plan: &QueryPlan, report: &RunReport) -> Result<bool, ExecError> {
    Ok(hash_plan(plan)?.to_hex() == report.plan_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Step;
    use rowq_io::SourceSpec;

    #[test]
    fn hash_is_stable_and_sensitive() {
        let a = QueryPlan::new(SourceSpec::parse("in.jsonl")).step(Step::Distinct);
        let b = QueryPlan::new(SourceSpec::parse("in.jsonl")).step(Step::Distinct);
        let c = QueryPlan::new(SourceSpec::parse("other.jsonl")).step(Step::Distinct);
        assert_eq!(hash_plan(&a).unwrap(), hash_plan(&b).unwrap());
        assert_ne!(hash_plan(&a).unwrap(), hash_plan(&c).unwrap());
    }
}

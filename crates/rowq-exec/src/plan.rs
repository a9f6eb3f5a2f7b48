//! Declarative query plans.
//!
//! A plan names an input source and an ordered list of steps. Each step is
//! tagged by `op:` and may carry a `strategy:` request. Plans are read from
//! YAML or JSON:
//!
//! ```yaml
//! input: orders.jsonl
//! config:
//!   default_window_size: 500
//! steps:
//!   - op: select
//!     predicate: "amount > 0"
//!   - op: groupby
//!     keys: [region]
//!     aggs:
//!       - { func: sum, column: amount }
//!       - { func: count }
//!     strategy: { windowed: true }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use rowq_core::config::ConfigOverrides;
use rowq_io::SourceSpec;
use rowq_operators::agg::AggSpec;
use rowq_operators::join::JoinType;
use rowq_operators::StrategyRequest;

use crate::runtime::ExecError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub input: SourceSpec,
    #[serde(default)]
    pub steps: Vec<PlannedStep>,
    #[serde(default)]
    pub config: ConfigOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedStep {
    #[serde(flatten)]
    pub step: Step,
    #[serde(default)]
    pub strategy: StrategyRequest,
}

impl From<Step> for PlannedStep {
    fn from(step: Step) -> Self {
        Self {
            step,
            strategy: StrategyRequest::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// `predicate` is a comparison such as `"age >= 18"`.
    Select { predicate: String },
    Project { columns: Vec<String> },
    /// Ordered (from, to) pairs, applied simultaneously.
    Rename { mapping: Vec<(String, String)> },
    Union { other: SourceSpec },
    Distinct,
    Sort {
        by: Vec<String>,
        #[serde(default)]
        descending: bool,
    },
    Join {
        other: SourceSpec,
        /// (left column, right column) pairs.
        on: Vec<(String, String)>,
        #[serde(default)]
        join_type: JoinType,
    },
    Groupby { keys: Vec<String>, aggs: Vec<AggSpec> },
    Intersection { other: SourceSpec },
    Difference { other: SourceSpec },
}

impl Step {
    /// Operator name as known to the classifier.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Select { .. } => "select",
            Step::Project { .. } => "project",
            Step::Rename { .. } => "rename",
            Step::Union { .. } => "union",
            Step::Distinct => "distinct",
            Step::Sort { .. } => "sort",
            Step::Join { .. } => "join",
            Step::Groupby { .. } => "groupby",
            Step::Intersection { .. } => "intersection",
            Step::Difference { .. } => "difference",
        }
    }

    /// Second source the step reads, if any.
    pub fn reference(&self) -> Option<&SourceSpec> {
        match self {
            Step::Union { other }
            | Step::Join { other, .. }
            | Step::Intersection { other }
            | Step::Difference { other } => Some(other),
            _ => None,
        }
    }
}

impl QueryPlan {
    pub fn new(input: SourceSpec) -> Self {
        Self {
            input,
            steps: Vec::new(),
            config: ConfigOverrides::default(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step.into());
        self
    }

    pub fn step_with(mut self, step: Step, strategy: StrategyRequest) -> Self {
        self.steps.push(PlannedStep { step, strategy });
        self
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ExecError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ExecError> {
        Ok(serde_json::from_str(s)?)
    }

    /// `.json` files are read as JSON, anything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExecError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    pub fn to_yaml(&self) -> Result<String, ExecError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject plans no input could make valid. At most one step may read
    /// stdin, counting the input itself.
    pub fn validate(&self) -> Result<(), ExecError> {
        let stdin_uses = std::iter::once(&self.input)
            .chain(self.steps.iter().filter_map(|s| s.step.reference()))
            .filter(|s| **s == SourceSpec::Stdin)
            .count();
        if stdin_uses > 1 {
            return Err(ExecError::Invalid(
                "stdin can only be read once per plan".into(),
            ));
        }
        for (idx, planned) in self.steps.iter().enumerate() {
            match &planned.step {
                Step::Project { columns } if columns.is_empty() => {
                    return Err(ExecError::Invalid(format!("step {idx}: project needs columns")));
                }
                Step::Sort { by, .. } if by.is_empty() => {
                    return Err(ExecError::Invalid(format!("step {idx}: sort needs keys")));
                }
                Step::Join { join_type, .. } if *join_type != JoinType::Inner => {
                    return Err(ExecError::Invalid(format!(
                        "step {idx}: {join_type} join is not supported"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

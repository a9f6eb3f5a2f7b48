//! Operator classification and execution-strategy selection.
//!
//! Every operator is registered with what it can do: run exactly in one pass
//! (`can_stream`), whether an exact answer needs the whole relation
//! (`requires_memory`), and whether a windowed variant exists. Windowed
//! variants are additionally tagged with their accuracy, since only some of
//! them are approximations.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use rowq_core::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowAccuracy {
    /// Results only hold within a window (sort, groupby).
    Approximate,
    /// Reference side fully built, primary side windowed; output is exact.
    Exact,
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpTraits {
    pub can_stream: bool,
    pub requires_memory: bool,
    pub supports_windowed: bool,
    pub window_accuracy: WindowAccuracy,
}

impl OpTraits {
    const STREAMING: Self = Self {
        can_stream: true,
        requires_memory: false,
        supports_windowed: false,
        window_accuracy: WindowAccuracy::NotApplicable,
    };

    const fn windowable(accuracy: WindowAccuracy) -> Self {
        Self {
            can_stream: false,
            requires_memory: true,
            supports_windowed: true,
            window_accuracy: accuracy,
        }
    }
}

static TABLE: Lazy<HashMap<&'static str, OpTraits>> = Lazy::new(|| {
    use WindowAccuracy::*;
    HashMap::from([
        ("select", OpTraits::STREAMING),
        ("project", OpTraits::STREAMING),
        ("rename", OpTraits::STREAMING),
        ("union", OpTraits::STREAMING),
        ("distinct", OpTraits::STREAMING),
        ("path_filter", OpTraits::STREAMING),
        ("path_project", OpTraits::STREAMING),
        ("sort", OpTraits::windowable(Approximate)),
        ("groupby", OpTraits::windowable(Approximate)),
        ("join", OpTraits::windowable(Exact)),
        ("intersection", OpTraits::windowable(Exact)),
        ("difference", OpTraits::windowable(Exact)),
    ])
});

pub fn classify(op: &str) -> Option<OpTraits> {
    TABLE.get(op).copied()
}

/// What the caller asked for. Both flags off means "whatever is natural".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyRequest {
    pub stream: bool,
    pub windowed: bool,
    /// Falls back to the engine's default window size.
    pub window_size: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Strategy {
    Stream,
    Windowed { window_size: usize },
    Materialize,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Stream => write!(f, "stream"),
            Strategy::Windowed { window_size } => write!(f, "windowed({window_size})"),
            Strategy::Materialize => write!(f, "materialize"),
        }
    }
}

/// Non-fatal notices produced while picking a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyWarning {
    /// Streaming requested for an operator that needs the whole relation.
    StreamingUnsupported { op: String },
    /// Windowing requested for an operator without a windowed variant.
    WindowingUnsupported { op: String },
    WindowedApproximate { op: String, window_size: usize },
    WindowedExact { op: String, window_size: usize },
}

impl StrategyWarning {
    pub fn op(&self) -> &str {
        match self {
            StrategyWarning::StreamingUnsupported { op }
            | StrategyWarning::WindowingUnsupported { op }
            | StrategyWarning::WindowedApproximate { op, .. }
            | StrategyWarning::WindowedExact { op, .. } => op,
        }
    }

    /// Fallbacks and approximations; the exact-windowing notice is not one.
    pub fn is_degradation(&self) -> bool {
        !matches!(self, StrategyWarning::WindowedExact { .. })
    }
}

impl fmt::Display for StrategyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyWarning::StreamingUnsupported { op } => write!(
                f,
                "{op} cannot stream; falling back to full materialization"
            ),
            StrategyWarning::WindowingUnsupported { op } => {
                write!(f, "{op} has no windowed variant; window request ignored")
            }
            StrategyWarning::WindowedApproximate { op, window_size } => write!(
                f,
                "windowed {op} (window {window_size}) is approximate: results hold only within each window"
            ),
            StrategyWarning::WindowedExact { op, window_size } => write!(
                f,
                "windowed {op} (window {window_size}) is exact: reference side fully loaded, primary side bounded"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyDecision {
    pub strategy: Strategy,
    pub warnings: Vec<StrategyWarning>,
}

/// Pick a strategy for `op`. Windowing wins over streaming when both are
/// requested and supported; unknown operators are a planning error.
pub fn choose_strategy(
    op: &str,
    req: &StrategyRequest,
    default_window_size: usize,
) -> Result<StrategyDecision> {
    let traits = classify(op).ok_or_else(|| Error::Plan(format!("unknown operator '{op}'")))?;
    let mut warnings = Vec::new();

    if req.windowed {
        if traits.supports_windowed {
            let window_size = req.window_size.unwrap_or(default_window_size);
            if window_size == 0 {
                return Err(Error::Config(format!("{op}: window size must be at least 1")));
            }
            let notice = match traits.window_accuracy {
                WindowAccuracy::Exact => StrategyWarning::WindowedExact {
                    op: op.to_string(),
                    window_size,
                },
                _ => StrategyWarning::WindowedApproximate {
                    op: op.to_string(),
                    window_size,
                },
            };
            warnings.push(notice);
            return Ok(StrategyDecision {
                strategy: Strategy::Windowed { window_size },
                warnings,
            });
        }
        warnings.push(StrategyWarning::WindowingUnsupported { op: op.to_string() });
    }

    let strategy = if traits.can_stream {
        Strategy::Stream
    } else {
        if req.stream {
            warnings.push(StrategyWarning::StreamingUnsupported { op: op.to_string() });
        }
        Strategy::Materialize
    };
    Ok(StrategyDecision { strategy, warnings })
}

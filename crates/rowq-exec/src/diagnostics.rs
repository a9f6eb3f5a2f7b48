//! Diagnostic channel for strategy warnings.
//!
//! Warnings never go to the row sink; the engine hands them to a
//! `Diagnostics` implementation instead.

use std::sync::Mutex;

use rowq_operators::StrategyWarning;

pub trait Diagnostics: Send + Sync {
    fn warning(&self, warning: &StrategyWarning);
}

impl<T: Diagnostics + ?Sized> Diagnostics for std::sync::Arc<T> {
    fn warning(&self, warning: &StrategyWarning) {
        (**self).warning(warning)
    }
}

/// Default channel: fallbacks and approximations at `warn`, exact windowing
/// notices at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn warning(&self, warning: &StrategyWarning) {
        if warning.is_degradation() {
            tracing::warn!(op = warning.op(), "{warning}");
        } else {
            tracing::info!(op = warning.op(), "{warning}");
        }
    }
}

/// Keeps every warning in memory; useful for tests and embedding callers.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    seen: Mutex<Vec<StrategyWarning>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<StrategyWarning> {
        self.seen
            .lock()
            .map(|w| w.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn warning(&self, warning: &StrategyWarning) {
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        seen.push(warning.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn collects_in_order_through_shared_handle() {
        let diag = Arc::new(CollectingDiagnostics::new());
        let handle: Arc<dyn Diagnostics> = diag.clone();
        handle.warning(&StrategyWarning::StreamingUnsupported { op: "sort".into() });
        handle.warning(&StrategyWarning::WindowingUnsupported { op: "select".into() });
        let ops: Vec<String> = diag.warnings().iter().map(|w| w.op().to_string()).collect();
        assert_eq!(ops, vec!["sort", "select"]);
    }
}

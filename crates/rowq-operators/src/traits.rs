//! Operator trait + common interfaces.
//!
//! Streaming operators are plain iterator adapters and need no trait. The
//! trait here is the seam between the window driver (or a full
//! materialization) and the operators that need a whole block of rows.

use rowq_core::error::Result;
use rowq_core::row::Relation;

/// An operator that needs every row of its input before producing output.
///
/// Invariants:
/// - `apply` must be deterministic given the same input rows.
/// - Any reference relation (join's right side, set-op filter side) is owned
///   by the operator and immutable; only the primary side arrives through
///   `apply`, so the same instance can be applied window after window.
pub trait MaterializingOperator {
    /// Stable operator name, matching the classifier table.
    fn name(&self) -> &'static str;

    /// Evaluate one block of rows (a window, or the whole relation).
    fn apply(&self, rows: Relation) -> Result<Relation>;
}

impl<T: MaterializingOperator + ?Sized> MaterializingOperator for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn apply(&self, rows: Relation) -> Result<Relation> {
        (**self).apply(rows)
    }
}

impl<T: MaterializingOperator + ?Sized> MaterializingOperator for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn apply(&self, rows: Relation) -> Result<Relation> {
        (**self).apply(rows)
    }
}

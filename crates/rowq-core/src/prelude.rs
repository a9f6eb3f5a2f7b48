//! Convenient re-exports for downstream crates.

pub use crate::config::{ConfigOverrides, EngineConfig};
pub use crate::error::{Error, Result};
pub use crate::hash::{hash_serde, Hash256};
pub use crate::key::{key_tuple, CanonicalKey, KeyAtom};
pub use crate::order::{compare_rows_by, compare_values};
pub use crate::row::{get_or_null, parse_row, row_from_value, Relation, Row, RowStream};

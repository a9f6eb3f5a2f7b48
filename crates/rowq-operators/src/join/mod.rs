//! Join operators.
//!
//! Only inner-equality joins exist. `JoinType` is part of the public surface so
//! callers can pass what they were given, but anything other than `Inner` is
//! refused when the join is built rather than silently treated as inner.

pub mod hash;

use serde::{Deserialize, Serialize};

pub use hash::{HashJoin, JoinIndex};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl std::fmt::Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Full => "full",
        };
        f.write_str(s)
    }
}

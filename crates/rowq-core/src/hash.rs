//! Content hashes for plans and run reports.
//!
//! A plan is hashed through its JSON encoding, so two plans that deserialize
//! to the same value hash the same regardless of the file format they came
//! from.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 32-byte BLAKE3 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

/// Stream the JSON encoding of `value` straight into the hasher.
pub fn hash_serde<T: Serialize + ?Sized>(value: &T) -> Result<Hash256> {
    let mut hasher = blake3::Hasher::new();
    serde_json::to_writer(&mut hasher, value).map_err(|e| Error::Hash(e.to_string()))?;
    Ok(Hash256(*hasher.finalize().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_values_hash_equal() {
        let a = hash_serde(&json!({"op": "sort", "keys": ["v"]})).unwrap();
        let b = hash_serde(&json!({"op": "sort", "keys": ["v"]})).unwrap();
        let c = hash_serde(&json!({"op": "sort", "keys": ["w"]})).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_hex().len(), 64);
    }

    #[test]
    fn matches_blake3_of_the_json_text() {
        let v = json!({"input": "-", "steps": []});
        let direct = blake3::hash(serde_json::to_string(&v).unwrap().as_bytes());
        assert_eq!(hash_serde(&v).unwrap().to_hex(), direct.to_hex().to_string());
    }
}

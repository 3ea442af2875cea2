use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::SweepError;
use crate::serde::to_canonical_json_bytes;

/// Lowercase hex SHA-256 of the canonical JSON encoding of `value`.
///
/// Map key order does not affect the result, so two sweep definitions that
/// differ only in key order hash alike.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, SweepError> {
    let digest = Sha256::digest(to_canonical_json_bytes(value)?);
    Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_change_the_hash() {
        let a = stable_hash_string(&json!({"task": "A", "lr": 0.1})).expect("hash");
        let b = stable_hash_string(&json!({"lr": 0.1, "task": "A"})).expect("hash");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, stable_hash_string(&json!({"task": "B"})).expect("hash"));
    }
}

//! Deterministic JSON encoding for signature computation.
//!
//! Signing and verification must hash byte-identical input, so manifest
//! bytes are produced by RFC 8785 canonicalization (sorted object members,
//! shortest number forms, no insignificant whitespace).

use canonical_json::to_string;
use serde_json::Value;

/// Error returned when canonicalization fails.
#[derive(thiserror::Error, Debug)]
pub enum CanonicalizationError {
    /// Non-finite number (NaN/Infinity) detected; such values have no
    /// canonical JSON form.
    #[error("non-finite number detected at {0}")]
    NonFiniteNumber(String),
    /// Provided JSON could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Other(String),
}

/// Produces canonical UTF-8 bytes for the given JSON value.
///
/// The value is validated first: non-finite floats are rejected up front so
/// the error names the offending path instead of surfacing as an opaque
/// serializer failure.
pub fn canonical_bytes(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    check_finite(value, "root")?;
    let canonical = to_string(value).map_err(|e| CanonicalizationError::Other(e.to_string()))?;
    Ok(canonical.into_bytes())
}

fn check_finite(value: &Value, path: &str) -> Result<(), CanonicalizationError> {
    match value {
        Value::Number(n) => {
            if n.is_f64() {
                let f = n.as_f64().unwrap_or(f64::NAN);
                if !f.is_finite() {
                    return Err(CanonicalizationError::NonFiniteNumber(path.to_string()));
                }
            }
            Ok(())
        }
        Value::Object(map) => {
            for (key, child) in map {
                check_finite(child, &format!("{path}.{key}"))?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                check_finite(item, &format!("{path}[{idx}]"))?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_bytes_sorts_object_keys() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(canonical_bytes(&a).unwrap(), canonical_bytes(&b).unwrap());
    }

    #[test]
    fn canonical_bytes_is_deterministic() {
        let value = json!({
            "session_id": "s-1",
            "step_count": 3,
            "file_hashes": {"steps.jsonl": "ab", "mimetype": "cd"}
        });
        assert_eq!(
            canonical_bytes(&value).unwrap(),
            canonical_bytes(&value).unwrap()
        );
    }

    #[test]
    fn finite_floats_are_accepted() {
        let value = json!({"duration_ms": 12.5, "nested": [1.0, 2]});
        assert!(canonical_bytes(&value).is_ok());
    }
}

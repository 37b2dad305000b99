//! Natural string form of field values inside a primary hash.
//!
//! This is part of the on-store contract: integers and floats use their
//! `Display` form, booleans are `1`/`0`, text is stored verbatim, record
//! refs are the bare id, and structured values are JSON.

use crate::{
    model::field::{FieldShape, ScalarType},
    value::Value,
};
use thiserror::Error as ThisError;

///
/// WireError
///

#[derive(Debug, ThisError)]
pub(crate) enum WireError {
    #[error("expected {expected}, found '{raw}'")]
    Scalar { expected: &'static str, raw: String },

    #[error("invalid json payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode a value for storage; `None` means the field has no stored entry.
pub(crate) fn encode(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Int(v) => Some(v.to_string()),
        Value::Uint(v) => Some(v.to_string()),
        Value::Float(v) => Some(v.to_string()),
        Value::Text(s) | Value::Ref(s) => Some(s.clone()),
        Value::Json(json) => Some(json.to_string()),
        Value::Refs(ids) => Some(serde_json::Value::from(ids.clone()).to_string()),
    }
}

/// Decode a stored string back into a value of the given shape.
pub(crate) fn decode(shape: FieldShape, raw: &str) -> Result<Value, WireError> {
    let value = match shape {
        FieldShape::Scalar { ty, .. } => decode_scalar(ty, raw)?,
        FieldShape::Embedded | FieldShape::Map => Value::Json(serde_json::from_str(raw)?),
        FieldShape::Record => Value::Ref(raw.to_string()),
        FieldShape::Records => Value::Refs(serde_json::from_str(raw)?),
    };

    Ok(value)
}

fn decode_scalar(ty: ScalarType, raw: &str) -> Result<Value, WireError> {
    let err = || WireError::Scalar {
        expected: ty.label(),
        raw: raw.to_string(),
    };

    match ty {
        ScalarType::Bool => match raw {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            _ => Err(err()),
        },
        ScalarType::Int => raw.parse().map(Value::Int).map_err(|_| err()),
        ScalarType::Uint => raw.parse().map(Value::Uint).map_err(|_| err()),
        ScalarType::Float => raw.parse().map(Value::Float).map_err(|_| err()),
        ScalarType::Text => Ok(Value::Text(raw.to_string())),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_use_numeric_form() {
        assert_eq!(encode(&Value::Bool(true)).as_deref(), Some("1"));
        assert_eq!(encode(&Value::Bool(false)).as_deref(), Some("0"));

        let shape = FieldShape::scalar(ScalarType::Bool);
        assert_eq!(decode(shape, "1").unwrap(), Value::Bool(true));
        assert_eq!(decode(shape, "false").unwrap(), Value::Bool(false));
        assert!(decode(shape, "yes").is_err());
    }

    #[test]
    fn null_has_no_stored_form() {
        assert_eq!(encode(&Value::Null), None);
    }

    #[test]
    fn floats_keep_their_exact_value() {
        let shape = FieldShape::scalar(ScalarType::Float);
        for v in [0.1_f64, -3.5, 42.0, f64::MAX, 1e-300] {
            let raw = encode(&Value::Float(v)).unwrap();
            assert_eq!(decode(shape, &raw).unwrap(), Value::Float(v), "raw={raw}");
        }
    }

    #[test]
    fn integer_overflow_is_reported() {
        let err = decode(FieldShape::scalar(ScalarType::Int), "99999999999999999999")
            .expect_err("out of range integer should not decode");
        assert!(err.to_string().contains("expected int"));
    }

    #[test]
    fn ref_lists_are_json_arrays() {
        let value = Value::Refs(vec!["a".to_string(), "b".to_string()]);
        let raw = encode(&value).unwrap();
        assert_eq!(raw, r#"["a","b"]"#);
        assert_eq!(decode(FieldShape::Records, &raw).unwrap(), value);
    }
}

//! Type system for Eventide
//!
//! Defines the primitive column types and runtime values used by the
//! analyzer and the aggregation engine. Input rows arrive as JSON objects
//! and are coerced cell-by-cell against the table schema; a present cell
//! of the wrong shape is a coercion failure (terminal for the query),
//! while an absent or null cell stays null.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Primitive column types supported by Eventide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Boolean (true/false)
    Boolean,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point
    Float64,
    /// UTF-8 string
    String,
    /// Timestamp with nanosecond precision (ns since epoch)
    TimestampNanosecond,
}

impl DataType {
    /// Whether values of this type support numeric aggregation (max/min/sum)
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Int64 | DataType::Float64 | DataType::TimestampNanosecond
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Int64 => write!(f, "I64"),
            DataType::Float64 => write!(f, "F64"),
            DataType::String => write!(f, "STRING"),
            DataType::TimestampNanosecond => write!(f, "TIMESTAMP_NANOSECOND"),
        }
    }
}

/// Runtime value for a single cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null / missing cell
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Int64(i64),
    /// Floating point value
    Float64(f64),
    /// String value
    String(String),
    /// Timestamp (nanoseconds since epoch)
    Timestamp(i64),
}

impl Value {
    /// Whether this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Coerce a JSON cell into a typed value.
    ///
    /// Absent callers pass `None`; both absent and JSON `null` coerce to
    /// [`Value::Null`]. Anything else must match the declared type:
    /// integers accept JSON integers, floats accept any JSON number, and
    /// timestamps accept either integer nanoseconds or an RFC 3339 string.
    pub fn coerce(cell: Option<&serde_json::Value>, data_type: DataType) -> Result<Self, String> {
        let cell = match cell {
            None | Some(serde_json::Value::Null) => return Ok(Value::Null),
            Some(cell) => cell,
        };

        match data_type {
            DataType::Boolean => cell
                .as_bool()
                .map(Value::Boolean)
                .ok_or_else(|| format!("expected BOOLEAN, got {cell}")),
            DataType::Int64 => cell
                .as_i64()
                .map(Value::Int64)
                .ok_or_else(|| format!("expected I64, got {cell}")),
            DataType::Float64 => cell
                .as_f64()
                .map(Value::Float64)
                .ok_or_else(|| format!("expected F64, got {cell}")),
            DataType::String => cell
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(|| format!("expected STRING, got {cell}")),
            DataType::TimestampNanosecond => {
                if let Some(nanos) = cell.as_i64() {
                    return Ok(Value::Timestamp(nanos));
                }
                if let Some(text) = cell.as_str() {
                    let parsed = chrono::DateTime::parse_from_rfc3339(text)
                        .map_err(|e| format!("invalid timestamp '{text}': {e}"))?;
                    let nanos = parsed
                        .timestamp_nanos_opt()
                        .ok_or_else(|| format!("timestamp '{text}' out of range"))?;
                    return Ok(Value::Timestamp(nanos));
                }
                Err(format!("expected TIMESTAMP_NANOSECOND, got {cell}"))
            }
        }
    }

    /// Compare two values of the same type.
    ///
    /// Nulls sort before everything; floats use IEEE total ordering.
    /// Returns `None` for cross-type comparisons, which cannot occur for
    /// cells coerced against the same column type.
    pub fn partial_cmp_same_type(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Less),
            (_, Value::Null) => Some(Ordering::Greater),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::Float64(a), Value::Float64(b)) => Some(a.total_cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Convert into the JSON representation used for batch artifacts.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Int64(n) => serde_json::Value::from(*n),
            Value::Float64(f) => {
                serde_json::Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            Value::String(s) => serde_json::Value::from(s.clone()),
            Value::Timestamp(nanos) => serde_json::Value::from(*nanos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_primitives() {
        assert_eq!(
            Value::coerce(Some(&json!(42)), DataType::Int64).unwrap(),
            Value::Int64(42)
        );
        assert_eq!(
            Value::coerce(Some(&json!("karen")), DataType::String).unwrap(),
            Value::String("karen".to_string())
        );
        assert_eq!(
            Value::coerce(Some(&json!(true)), DataType::Boolean).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            Value::coerce(Some(&json!(1.5)), DataType::Float64).unwrap(),
            Value::Float64(1.5)
        );
    }

    #[test]
    fn test_coerce_int_accepts_into_float() {
        // JSON integers are valid F64 cells
        assert_eq!(
            Value::coerce(Some(&json!(3)), DataType::Float64).unwrap(),
            Value::Float64(3.0)
        );
    }

    #[test]
    fn test_coerce_null_and_missing() {
        assert_eq!(
            Value::coerce(None, DataType::Int64).unwrap(),
            Value::Null
        );
        assert_eq!(
            Value::coerce(Some(&json!(null)), DataType::String).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_coerce_mismatch_fails() {
        assert!(Value::coerce(Some(&json!("abc")), DataType::Int64).is_err());
        assert!(Value::coerce(Some(&json!(1.5)), DataType::Int64).is_err());
        assert!(Value::coerce(Some(&json!(42)), DataType::String).is_err());
        assert!(Value::coerce(Some(&json!({"a": 1})), DataType::Boolean).is_err());
    }

    #[test]
    fn test_coerce_timestamp_forms() {
        assert_eq!(
            Value::coerce(Some(&json!(1578182400000000000i64)), DataType::TimestampNanosecond)
                .unwrap(),
            Value::Timestamp(1578182400000000000)
        );
        assert_eq!(
            Value::coerce(
                Some(&json!("2020-01-05T00:00:00Z")),
                DataType::TimestampNanosecond
            )
            .unwrap(),
            Value::Timestamp(1578182400000000000)
        );
        assert!(Value::coerce(Some(&json!("not a time")), DataType::TimestampNanosecond).is_err());
    }

    #[test]
    fn test_ordering() {
        assert_eq!(
            Value::Int64(3).partial_cmp_same_type(&Value::Int64(9)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Null.partial_cmp_same_type(&Value::Int64(0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::String("b".into()).partial_cmp_same_type(&Value::String("a".into())),
            Some(Ordering::Greater)
        );
        assert!(Value::Int64(1)
            .partial_cmp_same_type(&Value::String("1".into()))
            .is_none());
    }

    #[test]
    fn test_to_json_round_trip_shapes() {
        assert_eq!(Value::Int64(5000).to_json(), json!(5000));
        assert_eq!(Value::Null.to_json(), json!(null));
        assert_eq!(Value::Timestamp(7).to_json(), json!(7));
    }
}

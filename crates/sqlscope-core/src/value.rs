//! Dynamic SQL values.

use serde::{Deserialize, Serialize};

use crate::error::{Error, TypeMismatchError};

/// A dynamically-typed SQL value.
///
/// This enum covers the storage classes this layer works with and is used
/// for parameter binding and result fetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// NULL value
    Null,

    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// Text string
    Text(String),

    /// Binary data
    Bytes(Vec<u8>),
}

impl Value {
    /// Check if this value is NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name of this value.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "REAL",
            Value::Text(_) => "TEXT",
            Value::Bytes(_) => "BLOB",
        }
    }

    /// Try to convert this value to a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Try to convert this value to an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(v) => Some(if *v { 1 } else { 0 }),
            _ => None,
        }
    }

    /// Try to convert this value to an f64, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a byte slice.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }
}

// Conversion implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

// TryFrom implementations for extracting values

impl TryFrom<Value> for bool {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::Int(v) => Ok(v != 0),
            other => Err(Error::Type(TypeMismatchError {
                expected: "bool",
                actual: other.type_name().to_string(),
                column: None,
            })),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Int(v) => Ok(v),
            Value::Bool(v) => Ok(if v { 1 } else { 0 }),
            other => Err(Error::Type(TypeMismatchError {
                expected: "i64",
                actual: other.type_name().to_string(),
                column: None,
            })),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            other => Err(Error::Type(TypeMismatchError {
                expected: "f64",
                actual: other.type_name().to_string(),
                column: None,
            })),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(Error::Type(TypeMismatchError {
                expected: "String",
                actual: other.type_name().to_string(),
                column: None,
            })),
        }
    }
}

impl TryFrom<Value> for Vec<u8> {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bytes(v) => Ok(v),
            Value::Text(v) => Ok(v.into_bytes()),
            other => Err(Error::Type(TypeMismatchError {
                expected: "Vec<u8>",
                actual: other.type_name().to_string(),
                column: None,
            })),
        }
    }
}

/// TryFrom for `Option<T>` - returns None for Null, tries to convert otherwise
impl<T> TryFrom<Value> for Option<T>
where
    T: TryFrom<Value, Error = Error>,
{
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(None),
            v => T::try_from(v).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rust_types() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42i32), Value::Int(42));
        assert_eq!(Value::from(42i64), Value::Int(42));
        assert_eq!(Value::from("hello"), Value::Text("hello".to_string()));
        assert_eq!(Value::from(vec![1u8, 2]), Value::Bytes(vec![1, 2]));
    }

    #[test]
    fn from_option() {
        let some: Value = Some(42i64).into();
        assert_eq!(some, Value::Int(42));

        let none: Value = Option::<i64>::None.into();
        assert_eq!(none, Value::Null);
    }

    #[test]
    fn try_from_coercions() {
        assert!(bool::try_from(Value::Int(1)).unwrap());
        assert!(!bool::try_from(Value::Int(0)).unwrap());
        assert_eq!(i64::try_from(Value::Bool(true)).unwrap(), 1);
        let widened = f64::try_from(Value::Int(42)).unwrap();
        assert!((widened - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn try_from_mismatch_is_type_error() {
        let err = i64::try_from(Value::Text("42".to_string())).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
        assert!(String::try_from(Value::Int(42)).is_err());
    }

    #[test]
    fn try_from_option_maps_null() {
        let present: Option<i64> = Option::try_from(Value::Int(42)).unwrap();
        assert_eq!(present, Some(42));

        let absent: Option<i64> = Option::try_from(Value::Null).unwrap();
        assert_eq!(absent, None);
    }

    #[test]
    fn null_checks_and_type_names() {
        assert!(Value::Null.is_null());
        assert!(!Value::Int(0).is_null());
        assert_eq!(Value::Null.type_name(), "NULL");
        assert_eq!(Value::Text(String::new()).type_name(), "TEXT");
        assert_eq!(Value::Bytes(vec![]).type_name(), "BLOB");
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::Int(7).as_i64(), Some(7));
        assert_eq!(Value::Text("x".to_string()).as_i64(), None);
        assert_eq!(Value::Text("x".to_string()).as_str(), Some("x"));
        assert_eq!(Value::Text("ab".to_string()).as_bytes(), Some(&b"ab"[..]));
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
    }

    #[test]
    fn serde_untagged_json() {
        let json = serde_json::to_string(&Value::Text("hi".to_string())).unwrap();
        assert_eq!(json, "\"hi\"");
        let json = serde_json::to_string(&Value::Int(5)).unwrap();
        assert_eq!(json, "5");
        let json = serde_json::to_string(&Value::Null).unwrap();
        assert_eq!(json, "null");
    }
}

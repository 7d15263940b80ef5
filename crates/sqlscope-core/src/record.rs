//! Query result records.
//!
//! A [`Record`] is the dict-like unit this layer hands back from `select`:
//! an ordered mapping from column name to [`Value`], with typed accessors.

use crate::Result;
use crate::error::{Error, TypeMismatchError};
use crate::value::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::sync::Arc;

/// Column metadata shared across all records in a result set.
///
/// Wrapped in `Arc` so every record from the same query shares one copy,
/// keeping large result sets cheap.
#[derive(Debug, Clone)]
pub struct Columns {
    /// Column names in result-set order
    names: Vec<String>,
    /// Name -> index mapping for O(1) lookup
    name_to_index: HashMap<String, usize>,
}

impl Columns {
    /// Create column metadata from a list of names.
    pub fn new(names: Vec<String>) -> Self {
        let name_to_index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            names,
            name_to_index,
        }
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get the index of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Get the name of a column by index.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Check if a column exists.
    pub fn contains(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Get all column names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A single record returned from a query.
///
/// Records provide positional, by-name, and typed access to column values;
/// iteration and serialization follow result-set column order.
#[derive(Debug, Clone)]
pub struct Record {
    /// Column values in order
    values: Vec<Value>,
    /// Shared column metadata
    columns: Arc<Columns>,
}

impl Record {
    /// Create a record with its own column metadata.
    ///
    /// For multiple records from the same result set, prefer `with_columns`
    /// to share the metadata.
    pub fn new(column_names: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(column_names.len(), values.len());
        let columns = Arc::new(Columns::new(column_names));
        Self { values, columns }
    }

    /// Create a record sharing existing column metadata.
    pub fn with_columns(columns: Arc<Columns>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { values, columns }
    }

    /// Get the shared column metadata.
    pub fn columns(&self) -> Arc<Columns> {
        Arc::clone(&self.columns)
    }

    /// Get the number of columns in this record.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if this record has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by column index. O(1).
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name. O(1).
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Check if a column exists by name.
    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// Get a typed value by column name.
    #[allow(clippy::result_large_err)]
    pub fn get<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self.value(name).ok_or_else(|| {
            Error::Type(TypeMismatchError {
                expected: std::any::type_name::<T>(),
                actual: format!("column '{}' not found", name),
                column: Some(name.to_string()),
            })
        })?;
        T::from_value(value).map_err(|e| match e {
            Error::Type(mut te) => {
                te.column = Some(name.to_string());
                Error::Type(te)
            }
            e => e,
        })
    }

    /// Get a typed value by column index.
    #[allow(clippy::result_large_err)]
    pub fn get_at<T: FromValue>(&self, index: usize) -> Result<T> {
        let value = self.value_at(index).ok_or_else(|| {
            Error::Type(TypeMismatchError {
                expected: std::any::type_name::<T>(),
                actual: format!(
                    "index {} out of bounds (record has {} columns)",
                    index,
                    self.len()
                ),
                column: None,
            })
        })?;
        T::from_value(value)
    }

    /// Get all column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.names().iter().map(String::as_str)
    }

    /// Iterate over all values in column order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Iterate over (column_name, value) pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// Records serialize as maps in column order, so a result set turns into
/// the same JSON the old dict-based rows produced.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Trait for converting from a `Value` to a typed value.
pub trait FromValue: Sized {
    /// Convert from a Value, returning an error if the conversion fails.
    #[allow(clippy::result_large_err)]
    fn from_value(value: &Value) -> Result<Self>;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| {
            Error::Type(TypeMismatchError {
                expected: "bool",
                actual: value.type_name().to_string(),
                column: None,
            })
        })
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_i64().ok_or_else(|| {
            Error::Type(TypeMismatchError {
                expected: "i64",
                actual: value.type_name().to_string(),
                column: None,
            })
        })
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self> {
        let v = value.as_i64().ok_or_else(|| {
            Error::Type(TypeMismatchError {
                expected: "i32",
                actual: value.type_name().to_string(),
                column: None,
            })
        })?;
        i32::try_from(v).map_err(|_| {
            Error::Type(TypeMismatchError {
                expected: "i32",
                actual: format!("value {} out of range", v),
                column: None,
            })
        })
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| {
            Error::Type(TypeMismatchError {
                expected: "f64",
                actual: value.type_name().to_string(),
                column: None,
            })
        })
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            _ => Err(Error::Type(TypeMismatchError {
                expected: "String",
                actual: value.type_name().to_string(),
                column: None,
            })),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.as_bytes().to_vec()),
            _ => Err(Error::Type(TypeMismatchError {
                expected: "Vec<u8>",
                actual: value.type_name().to_string(),
                column: None,
            })),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

//! Model trait for struct <-> table mapping.
//!
//! Implementations are written by hand against a [`TableMapping`] built in a
//! `LazyLock`; there is no derive macro and no metaclass-style registry.

use crate::Result;
use crate::mapping::TableMapping;
use crate::record::Record;

/// Contract for structs mapped to database tables.
///
/// `mapping()` returns the validated field registry for the type;
/// `to_record`/`from_record` translate between the struct and the ordered
/// column/value form the query layer works with. Optional struct fields
/// become `Null` values, which lets field defaults kick in on insert.
///
/// # Example
///
/// ```
/// use std::sync::LazyLock;
/// use sqlscope_core::{FieldDef, Model, Record, Result, TableMapping, Value};
///
/// struct User {
///     id: Option<i64>,
///     email: String,
/// }
///
/// static USER_MAPPING: LazyLock<TableMapping> = LazyLock::new(|| {
///     TableMapping::builder("User")
///         .field(FieldDef::integer("id").primary_key(true))
///         .field(FieldDef::string("email"))
///         .build()
///         .expect("user mapping")
/// });
///
/// impl Model for User {
///     fn mapping() -> &'static TableMapping {
///         &USER_MAPPING
///     }
///
///     fn to_record(&self) -> Record {
///         Self::mapping().new_record(vec![
///             self.id.into(),
///             self.email.as_str().into(),
///         ])
///     }
///
///     fn from_record(record: &Record) -> Result<Self> {
///         Ok(Self {
///             id: record.get("id")?,
///             email: record.get("email")?,
///         })
///     }
/// }
/// ```
pub trait Model: Sized {
    /// The validated table mapping for this type.
    fn mapping() -> &'static TableMapping;

    /// Capture the current field values as a record in mapping order.
    fn to_record(&self) -> Record;

    /// Rebuild an instance from a record (typically a query result).
    #[allow(clippy::result_large_err)]
    fn from_record(record: &Record) -> Result<Self>;
}

//! Core types and traits for sqlscope.
//!
//! This crate provides the driver-independent vocabulary of the layer:
//!
//! - `Value` and `Record` for dynamically-typed, ordered query results
//! - `FieldDef` / `TableMapping` for the macro-free field registry
//! - `Model` trait for struct <-> table mapping
//! - `Driver` / `DriverConnection` traits implemented by backends
//! - `EngineConfig` connection settings
//! - the `Error` taxonomy shared by every crate in the workspace

pub mod config;
pub mod driver;
pub mod error;
pub mod field;
pub mod identifiers;
pub mod mapping;
pub mod model;
pub mod record;
pub mod value;

pub use config::EngineConfig;
pub use driver::{Driver, DriverConnection, ParamStyle};
pub use error::{
    ConfigError, ConfigErrorKind, ConnectionError, ConnectionErrorKind, Error, QueryError,
    QueryErrorKind, Result, SchemaError, SchemaErrorKind, TransactionError, TransactionErrorKind,
    TypeMismatchError,
};
pub use field::{FieldDef, FieldDefault, FieldKind, ValueGenerator};
pub use identifiers::{is_valid_identifier, quote_ident};
pub use mapping::{MappingBuilder, TableMapping};
pub use model::Model;
pub use record::{Columns, FromValue, Record};
pub use value::Value;

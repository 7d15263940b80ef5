//! sqlscope - scoped database access with nested transactions and a
//! macro-free model layer.
//!
//! The library is built around one idea: connection and transaction lifetime
//! are expressed as values. An [`Engine`] opens connections; a [`DbContext`]
//! holds at most one of them for a logical thread of work; scope guards
//! acquire both re-entrantly, so any piece of code can ask for a connection
//! or a transaction without caring whether its caller already did.
//!
//! Everything is blocking. Statements use `?` placeholders and are rewritten
//! to the backend's native markers at execution time. Models are plain
//! structs wired up by hand through a validated [`TableMapping`]; no derive
//! macros, no hidden registry.
//!
//! # Quick Start
//!
//! ```
//! use sqlscope::prelude::*;
//! use sqlscope_sqlite::SqliteDriver;
//! use std::sync::{Arc, LazyLock};
//!
//! struct User {
//!     id: Option<i64>,
//!     name: String,
//! }
//!
//! static USER_MAPPING: LazyLock<TableMapping> = LazyLock::new(|| {
//!     TableMapping::builder("User")
//!         .field(FieldDef::integer("id").primary_key(true))
//!         .field(FieldDef::string("name"))
//!         .build()
//!         .expect("valid mapping")
//! });
//!
//! impl Model for User {
//!     fn mapping() -> &'static TableMapping {
//!         &USER_MAPPING
//!     }
//!
//!     fn to_record(&self) -> Record {
//!         Self::mapping().new_record(vec![self.id.into(), self.name.as_str().into()])
//!     }
//!
//!     fn from_record(record: &Record) -> Result<Self> {
//!         Ok(Self {
//!             id: record.get("id")?,
//!             name: record.get("name")?,
//!         })
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let engine = Arc::new(Engine::new(
//!         EngineConfig::new("app", "secret", ":memory:"),
//!         SqliteDriver::new(),
//!     ));
//!     let ctx = DbContext::new(engine);
//!     // Pin one physical connection for the whole run; an in-memory
//!     // database lives exactly as long as its connection.
//!     let _session = ctx.connection();
//!
//!     ctx.update(&User::mapping().create_table_sql(), &[])?;
//!
//!     let mut user = User { id: Some(1), name: "Alice".to_string() };
//!     user.insert(&ctx)?;
//!
//!     let found = User::get(&ctx, 1i64)?;
//!     assert!(found.is_some());
//!
//!     // Work that must stand or fall together goes in a transaction scope.
//!     ctx.with_transaction(|ctx| {
//!         let mut bob = User { id: Some(2), name: "Bob".to_string() };
//!         bob.insert(ctx)?;
//!         Ok(())
//!     })?;
//!
//!     assert_eq!(User::count_all(&ctx)?, 2);
//!     Ok(())
//! }
//! ```

// Core vocabulary
pub use sqlscope_core::{
    Columns, ConfigError, ConfigErrorKind, ConnectionError, ConnectionErrorKind, Driver,
    DriverConnection, EngineConfig, Error, FieldDef, FieldDefault, FieldKind, FromValue, Model,
    ParamStyle, QueryError, QueryErrorKind, Record, Result, SchemaError, SchemaErrorKind,
    TableMapping, TransactionError, TransactionErrorKind, TypeMismatchError, Value,
    ValueGenerator, is_valid_identifier, quote_ident,
};

pub mod context;
pub mod crud;
pub mod engine;
mod query;

pub use context::{ConnectionScope, DbContext, LazyConnection, TransactionScope};
pub use crud::ModelOps;
pub use engine::Engine;

/// Prelude module for convenient imports.
///
/// ```
/// use sqlscope::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Scoped access
        ConnectionScope,
        DbContext,
        // Engine
        Engine,
        EngineConfig,
        Error,
        // Registry
        FieldDef,
        FieldKind,
        // Models
        Model,
        ModelOps,
        // Rows and values
        Record,
        Result,
        TableMapping,
        TransactionScope,
        Value,
    };
}

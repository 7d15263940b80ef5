//! Driver traits: the seam between the context layer and a database backend.
//!
//! - [`Driver`] - factory opening physical connections from an [`EngineConfig`]
//! - [`DriverConnection`] - one live, blocking connection
//! - [`ParamStyle`] - the placeholder marker dialect a connection expects
//!
//! Everything here is blocking by contract; a connection is owned by one
//! context at a time, so the statement surface takes `&mut self`.

use crate::Result;
use crate::config::EngineConfig;
use crate::record::Record;
use crate::value::Value;
use std::fmt;

/// Native placeholder style of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// Bare `?` markers (MySQL)
    Question,
    /// `?N` one-based numbered markers (SQLite)
    Numbered,
    /// `$N` one-based dollar markers (PostgreSQL)
    Dollar,
}

impl ParamStyle {
    /// Render the marker for a 1-based parameter index.
    #[must_use]
    pub fn marker(self, index: usize) -> String {
        match self {
            ParamStyle::Question => "?".to_string(),
            ParamStyle::Numbered => format!("?{}", index),
            ParamStyle::Dollar => format!("${}", index),
        }
    }
}

/// Factory for physical connections.
///
/// An engine holds one driver and calls [`connect`] for every physical open;
/// there is no pooling anywhere in this layer.
///
/// [`connect`]: Driver::connect
pub trait Driver: Send + Sync + fmt::Debug {
    /// Short driver name for logging.
    fn name(&self) -> &'static str;

    /// Open one new physical connection.
    #[allow(clippy::result_large_err)]
    fn connect(&self, config: &EngineConfig) -> Result<Box<dyn DriverConnection>>;
}

/// One live physical connection.
///
/// Implementations keep an implicit transaction open across statements, so
/// `commit`/`rollback` always refer to the work since the last boundary.
/// Statement handles never outlive the call: whatever the driver prepares
/// for `query`/`execute` is released on every exit path.
pub trait DriverConnection: Send + fmt::Debug {
    /// The placeholder style this connection expects.
    fn param_style(&self) -> ParamStyle;

    /// Run a statement that yields rows, materializing the full result set.
    #[allow(clippy::result_large_err)]
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Record>>;

    /// Run a statement that yields no rows; returns the affected-row count.
    #[allow(clippy::result_large_err)]
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Commit the open transaction, if any.
    #[allow(clippy::result_large_err)]
    fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction, if any.
    #[allow(clippy::result_large_err)]
    fn rollback(&mut self) -> Result<()>;

    /// Close the connection, discarding uncommitted work. Idempotent.
    #[allow(clippy::result_large_err)]
    fn close(&mut self) -> Result<()>;
}

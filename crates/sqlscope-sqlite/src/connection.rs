//! Blocking SQLite connections.
//!
//! [`SqliteConnection`] wraps one `sqlite3*` handle. Statements run inside an
//! implicit transaction: the first `query`/`execute` after open, commit, or
//! rollback issues `begin deferred`, and the transaction stays open until the
//! connection commits or rolls back. That is the autocommit-off contract the
//! context layer above is written against.

use crate::types;
use sqlscope_core::{
    Columns, ConnectionError, ConnectionErrorKind, Driver, DriverConnection, EngineConfig, Error,
    ParamStyle, QueryError, QueryErrorKind, Record, Result, Value,
};
use std::ffi::{CStr, CString, c_int};
use std::fmt;
use std::ptr;
use std::sync::Arc;

/// `libsqlite3_sys`, plus the `sqlite3_close_v2` declaration absent from its
/// pregenerated bindings; the bundled SQLite static library exports the symbol.
mod ffi {
    pub use libsqlite3_sys::*;

    unsafe extern "C" {
        pub fn sqlite3_close_v2(db: *mut sqlite3) -> core::ffi::c_int;
    }
}

/// Opens SQLite databases named by [`EngineConfig::database`].
///
/// The `database` field is the filesystem path; `:memory:` opens a private
/// in-memory database that lives exactly as long as its connection. User and
/// password are accepted for config compatibility and ignored.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    busy_timeout_ms: u32,
}

impl SqliteDriver {
    /// Driver with the default busy timeout of five seconds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How long a connection waits on a locked database before failing.
    #[must_use]
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = ms;
        self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
        }
    }
}

impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn connect(&self, config: &EngineConfig) -> Result<Box<dyn DriverConnection>> {
        let conn = SqliteConnection::open(&config.database, self.busy_timeout_ms)?;
        Ok(Box::new(conn))
    }
}

/// One open SQLite database handle.
pub struct SqliteConnection {
    db: *mut ffi::sqlite3,
    in_transaction: bool,
}

// SAFETY: the handle is only touched through `&mut self`, and the scoping
// layer hands a connection to one thread at a time.
unsafe impl Send for SqliteConnection {}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("open", &!self.db.is_null())
            .field("in_transaction", &self.in_transaction)
            .finish()
    }
}

impl SqliteConnection {
    /// Open a database file, creating it if missing.
    pub fn open(path: &str, busy_timeout_ms: u32) -> Result<Self> {
        let c_path = CString::new(path).map_err(|_| {
            Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Open,
                message: format!("database path '{path}' contains a null byte"),
                source: None,
            })
        })?;

        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let flags = ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE;
        // SAFETY: c_path is nul-terminated and db is a fresh out-pointer
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };
        if rc != ffi::SQLITE_OK {
            let message = if db.is_null() {
                error_string(rc)
            } else {
                let message = errmsg(db);
                // SAFETY: a failed open still allocates a handle that must be freed
                unsafe { ffi::sqlite3_close(db) };
                message
            };
            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Open,
                message: format!("cannot open database '{path}': {message}"),
                source: None,
            }));
        }

        if busy_timeout_ms > 0 {
            // SAFETY: db is a valid open handle
            unsafe { ffi::sqlite3_busy_timeout(db, busy_timeout_ms as c_int) };
        }

        Ok(Self {
            db,
            in_transaction: false,
        })
    }

    fn handle(&self) -> Result<*mut ffi::sqlite3> {
        if self.db.is_null() {
            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Closed,
                message: "connection is closed".to_string(),
                source: None,
            }));
        }
        Ok(self.db)
    }

    /// Start the implicit transaction if no transaction is open yet.
    fn ensure_transaction(&mut self) -> Result<()> {
        if self.in_transaction {
            return Ok(());
        }
        self.run_simple("begin deferred")?;
        self.in_transaction = true;
        Ok(())
    }

    /// Prepare, step once, finalize. For statements without parameters or rows.
    fn run_simple(&mut self, sql: &str) -> Result<()> {
        let db = self.handle()?;
        let stmt = prepare(db, sql)?;
        // SAFETY: stmt is valid
        let rc = unsafe { ffi::sqlite3_step(stmt) };
        // SAFETY: stmt is valid
        unsafe { ffi::sqlite3_finalize(stmt) };
        match rc {
            ffi::SQLITE_DONE | ffi::SQLITE_ROW => Ok(()),
            _ => Err(step_error(db, sql)),
        }
    }
}

impl DriverConnection for SqliteConnection {
    fn param_style(&self) -> ParamStyle {
        ParamStyle::Numbered
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        self.ensure_transaction()?;
        let db = self.handle()?;
        let stmt = prepare(db, sql)?;
        bind_params(db, stmt, sql, params)?;

        // SAFETY: stmt is valid
        let column_count = unsafe { ffi::sqlite3_column_count(stmt) };
        let mut names = Vec::with_capacity(column_count as usize);
        for index in 0..column_count {
            // SAFETY: index is in range
            let name = unsafe { types::column_name(stmt, index) };
            names.push(name.unwrap_or_else(|| format!("column{index}")));
        }
        let columns = Arc::new(Columns::new(names));

        let mut records = Vec::new();
        loop {
            // SAFETY: stmt is valid
            let rc = unsafe { ffi::sqlite3_step(stmt) };
            match rc {
                ffi::SQLITE_ROW => {
                    let mut values = Vec::with_capacity(column_count as usize);
                    for index in 0..column_count {
                        // SAFETY: step returned a row and index is in range
                        values.push(unsafe { types::read_column(stmt, index) });
                    }
                    records.push(Record::with_columns(Arc::clone(&columns), values));
                }
                ffi::SQLITE_DONE => break,
                _ => {
                    // SAFETY: stmt is valid
                    unsafe { ffi::sqlite3_finalize(stmt) };
                    return Err(step_error(db, sql));
                }
            }
        }

        // SAFETY: stmt is valid
        unsafe { ffi::sqlite3_finalize(stmt) };
        Ok(records)
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        self.ensure_transaction()?;
        let db = self.handle()?;
        let stmt = prepare(db, sql)?;
        bind_params(db, stmt, sql, params)?;

        // SAFETY: stmt is valid
        let rc = unsafe { ffi::sqlite3_step(stmt) };
        // SAFETY: stmt is valid
        unsafe { ffi::sqlite3_finalize(stmt) };
        match rc {
            ffi::SQLITE_DONE | ffi::SQLITE_ROW => {
                // SAFETY: db is a valid open handle
                let changes = unsafe { ffi::sqlite3_changes(db) };
                Ok(changes as u64)
            }
            _ => Err(step_error(db, sql)),
        }
    }

    fn commit(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Ok(());
        }
        // A failed commit leaves the transaction open, so the flag stays set
        // and a later rollback can still clean up.
        self.run_simple("commit")?;
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Ok(());
        }
        // SQLite aborts the transaction on most failures, so the flag clears
        // even when the rollback statement itself errors.
        let outcome = self.run_simple("rollback");
        self.in_transaction = false;
        outcome
    }

    fn close(&mut self) -> Result<()> {
        if self.db.is_null() {
            return Ok(());
        }
        // SAFETY: db is a valid open handle; close_v2 waits for statements
        let rc = unsafe { ffi::sqlite3_close_v2(self.db) };
        self.db = ptr::null_mut();
        self.in_transaction = false;
        if rc == ffi::SQLITE_OK {
            Ok(())
        } else {
            Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Driver,
                message: format!("close failed: {}", error_string(rc)),
                source: None,
            }))
        }
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if !self.db.is_null() {
            // SAFETY: db is a valid open handle; errors here have no receiver
            unsafe { ffi::sqlite3_close_v2(self.db) };
            self.db = ptr::null_mut();
        }
    }
}

fn prepare(db: *mut ffi::sqlite3, sql: &str) -> Result<*mut ffi::sqlite3_stmt> {
    let c_sql = CString::new(sql).map_err(|_| {
        query_error(
            QueryErrorKind::Syntax,
            sql,
            "statement contains a null byte",
        )
    })?;
    let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();
    // SAFETY: db is a valid open handle and c_sql is nul-terminated
    let rc = unsafe {
        ffi::sqlite3_prepare_v2(
            db,
            c_sql.as_ptr(),
            c_sql.as_bytes().len() as c_int,
            &mut stmt,
            ptr::null_mut(),
        )
    };
    if rc != ffi::SQLITE_OK {
        return Err(prepare_error(db, sql));
    }
    if stmt.is_null() {
        // Whitespace or comment-only input prepares to nothing.
        return Err(query_error(QueryErrorKind::Syntax, sql, "statement is empty"));
    }
    Ok(stmt)
}

fn bind_params(
    db: *mut ffi::sqlite3,
    stmt: *mut ffi::sqlite3_stmt,
    sql: &str,
    params: &[Value],
) -> Result<()> {
    for (i, value) in params.iter().enumerate() {
        // SAFETY: stmt is valid and parameter indexes are 1-based
        let rc = unsafe { types::bind_value(stmt, (i + 1) as c_int, value) };
        if rc != ffi::SQLITE_OK {
            // SAFETY: stmt is valid
            unsafe { ffi::sqlite3_finalize(stmt) };
            return Err(bind_error(db, sql, i + 1));
        }
    }
    Ok(())
}

fn query_error(kind: QueryErrorKind, sql: &str, message: impl Into<String>) -> Error {
    Error::Query(QueryError {
        kind,
        sql: Some(sql.to_string()),
        message: message.into(),
        source: None,
    })
}

fn prepare_error(db: *mut ffi::sqlite3, sql: &str) -> Error {
    // SAFETY: db is a valid open handle
    let code = unsafe { ffi::sqlite3_errcode(db) };
    let kind = match code {
        ffi::SQLITE_CONSTRAINT => QueryErrorKind::Constraint,
        // "no such table" and friends surface as the generic logic error
        ffi::SQLITE_ERROR => QueryErrorKind::Syntax,
        _ => QueryErrorKind::Execute,
    };
    query_error(kind, sql, errmsg(db))
}

fn step_error(db: *mut ffi::sqlite3, sql: &str) -> Error {
    // SAFETY: db is a valid open handle
    let code = unsafe { ffi::sqlite3_errcode(db) };
    let kind = if code == ffi::SQLITE_CONSTRAINT {
        QueryErrorKind::Constraint
    } else {
        QueryErrorKind::Execute
    };
    query_error(kind, sql, errmsg(db))
}

fn bind_error(db: *mut ffi::sqlite3, sql: &str, index: usize) -> Error {
    query_error(
        QueryErrorKind::Parameter,
        sql,
        format!("cannot bind parameter {}: {}", index, errmsg(db)),
    )
}

fn errmsg(db: *mut ffi::sqlite3) -> String {
    // SAFETY: db is a valid open handle; errmsg returns a nul-terminated string
    unsafe { CStr::from_ptr(ffi::sqlite3_errmsg(db)) }
        .to_string_lossy()
        .into_owned()
}

fn error_string(code: c_int) -> String {
    // SAFETY: errstr returns a static nul-terminated string for any code
    unsafe { CStr::from_ptr(ffi::sqlite3_errstr(code)) }
        .to_string_lossy()
        .into_owned()
}

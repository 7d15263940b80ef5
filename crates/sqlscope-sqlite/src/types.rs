//! Conversions between [`Value`] and SQLite's five storage classes.

use libsqlite3_sys as ffi;
use sqlscope_core::Value;
use std::ffi::{CStr, c_int};

/// Bind one parameter to a prepared statement.
///
/// Booleans are stored as integers 0/1; text and blob contents are copied
/// (`SQLITE_TRANSIENT`) so the statement never borrows from the caller.
///
/// # Safety
///
/// `stmt` must be a valid prepared statement and `index` a valid 1-based
/// parameter index for it.
pub(crate) unsafe fn bind_value(
    stmt: *mut ffi::sqlite3_stmt,
    index: c_int,
    value: &Value,
) -> c_int {
    unsafe {
        match value {
            Value::Null => ffi::sqlite3_bind_null(stmt, index),
            Value::Bool(flag) => ffi::sqlite3_bind_int64(stmt, index, i64::from(*flag)),
            Value::Int(number) => ffi::sqlite3_bind_int64(stmt, index, *number),
            Value::Float(number) => ffi::sqlite3_bind_double(stmt, index, *number),
            Value::Text(text) => ffi::sqlite3_bind_text(
                stmt,
                index,
                text.as_ptr().cast(),
                text.len() as c_int,
                ffi::SQLITE_TRANSIENT(),
            ),
            Value::Bytes(bytes) => ffi::sqlite3_bind_blob(
                stmt,
                index,
                bytes.as_ptr().cast(),
                bytes.len() as c_int,
                ffi::SQLITE_TRANSIENT(),
            ),
        }
    }
}

/// Read one column of the current row.
///
/// The storage class decides the variant: INTEGER comes back as `Int` even
/// when the column was written from a `Bool`, and TEXT is decoded lossily so
/// invalid UTF-8 cannot fail a whole result set.
///
/// # Safety
///
/// `stmt` must have just returned `SQLITE_ROW` and `index` must be a valid
/// 0-based column index.
pub(crate) unsafe fn read_column(stmt: *mut ffi::sqlite3_stmt, index: c_int) -> Value {
    let storage = unsafe { ffi::sqlite3_column_type(stmt, index) };
    match storage {
        ffi::SQLITE_INTEGER => Value::Int(unsafe { ffi::sqlite3_column_int64(stmt, index) }),
        ffi::SQLITE_FLOAT => Value::Float(unsafe { ffi::sqlite3_column_double(stmt, index) }),
        ffi::SQLITE_TEXT => {
            let ptr = unsafe { ffi::sqlite3_column_text(stmt, index) };
            let len = unsafe { ffi::sqlite3_column_bytes(stmt, index) };
            if ptr.is_null() {
                Value::Null
            } else {
                let bytes = unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), len as usize) };
                Value::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        }
        ffi::SQLITE_BLOB => {
            let ptr = unsafe { ffi::sqlite3_column_blob(stmt, index) };
            let len = unsafe { ffi::sqlite3_column_bytes(stmt, index) };
            if ptr.is_null() {
                // Zero-length blobs hand back a null pointer.
                Value::Bytes(Vec::new())
            } else {
                let bytes = unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), len as usize) };
                Value::Bytes(bytes.to_vec())
            }
        }
        _ => Value::Null,
    }
}

/// Name of a result column, if SQLite knows one.
///
/// # Safety
///
/// `stmt` must be a valid prepared statement and `index` a valid 0-based
/// column index.
pub(crate) unsafe fn column_name(stmt: *mut ffi::sqlite3_stmt, index: c_int) -> Option<String> {
    let ptr = unsafe { ffi::sqlite3_column_name(stmt, index) };
    if ptr.is_null() {
        None
    } else {
        unsafe { CStr::from_ptr(ptr) }
            .to_str()
            .ok()
            .map(String::from)
    }
}

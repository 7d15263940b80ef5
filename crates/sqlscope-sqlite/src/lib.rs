//! SQLite driver for sqlscope.
//!
//! Implements [`Driver`](sqlscope_core::Driver) and
//! [`DriverConnection`](sqlscope_core::DriverConnection) on top of the bundled
//! SQLite library, through `libsqlite3-sys`. Connections are blocking and used
//! by one thread at a time; the context layer above enforces that.
//!
//! The first statement on a connection opens `begin deferred`, and nothing is
//! durable until the connection commits. Rolling back discards everything
//! since the last commit. An in-memory database (`:memory:`) lives exactly as
//! long as its connection, so callers that need state to survive across
//! statements hold a connection scope open around them.
//!
//! # Type mapping
//!
//! | `Value` variant | SQLite storage |
//! |-----------------|----------------|
//! | `Null`          | NULL           |
//! | `Bool`          | INTEGER (0/1)  |
//! | `Int`           | INTEGER        |
//! | `Float`         | REAL           |
//! | `Text`          | TEXT           |
//! | `Bytes`         | BLOB           |
//!
//! Reads go by storage class, so a `Bool` written to a column comes back as
//! `Int`; [`FromValue`](sqlscope_core::FromValue) turns nonzero integers back
//! into `true`.

// The driver talks to libsqlite3 through raw FFI; lengths and indexes take
// the C parameter types.
#![allow(unsafe_code)]
#![allow(clippy::cast_possible_truncation, clippy::result_large_err)]

pub mod connection;
mod types;

pub use connection::{SqliteConnection, SqliteDriver};

use std::ffi::CStr;

/// Version string of the linked SQLite library.
#[must_use]
pub fn sqlite_version() -> &'static str {
    // SAFETY: sqlite3_libversion returns a static nul-terminated string
    unsafe { CStr::from_ptr(libsqlite3_sys::sqlite3_libversion()) }
        .to_str()
        .unwrap_or("unknown")
}

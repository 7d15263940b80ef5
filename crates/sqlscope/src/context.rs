//! Scoped access to one database connection per logical thread of work.
//!
//! A [`DbContext`] owns at most one [`LazyConnection`] at a time. Guards
//! returned by [`DbContext::connection`] and [`DbContext::transaction`] nest
//! freely; the outermost guard installs the connection state and is the one
//! that releases it. The physical connection opens only when the first
//! statement actually needs it.
//!
//! Transactions nest by counting. Entering bumps the depth, leaving decrements
//! it, and only the transition back to depth 0 touches the database with a
//! physical commit or rollback. A scope that exits by drop instead of
//! [`TransactionScope::commit`] marks the whole chain rollback-only: the
//! outermost commit then rolls back and reports the poisoning.

use crate::engine::Engine;
use sqlscope_core::{
    ConnectionError, ConnectionErrorKind, DriverConnection, Error, Result, TransactionError,
    TransactionErrorKind,
};
use std::cell::RefCell;
use std::sync::Arc;

/// A connection that opens on first use.
///
/// Holding one of these costs nothing until a statement runs; `handle()`
/// performs the physical open exactly once.
#[derive(Debug)]
pub struct LazyConnection {
    engine: Arc<Engine>,
    inner: Option<Box<dyn DriverConnection>>,
}

impl LazyConnection {
    /// Create an unopened connection bound to an engine.
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            inner: None,
        }
    }

    /// Whether the physical connection has been opened.
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// The live connection, opening it on first use.
    #[allow(clippy::result_large_err)]
    pub fn handle(&mut self) -> Result<&mut (dyn DriverConnection + 'static)> {
        if self.inner.is_none() {
            self.inner = Some(self.engine.connect()?);
        }
        self.inner.as_deref_mut().ok_or_else(|| not_open("use"))
    }

    /// Commit on the physical connection.
    ///
    /// Fails with a `NotOpen` connection error if no statement ever ran,
    /// since there is nothing to commit.
    #[allow(clippy::result_large_err)]
    pub fn commit(&mut self) -> Result<()> {
        match self.inner.as_deref_mut() {
            Some(conn) => conn.commit(),
            None => Err(not_open("commit")),
        }
    }

    /// Roll back on the physical connection.
    #[allow(clippy::result_large_err)]
    pub fn rollback(&mut self) -> Result<()> {
        match self.inner.as_deref_mut() {
            Some(conn) => conn.rollback(),
            None => Err(not_open("rollback")),
        }
    }

    /// Close the physical connection if one was opened. Idempotent.
    pub fn cleanup(&mut self) {
        if let Some(mut conn) = self.inner.take() {
            if let Err(err) = conn.close() {
                tracing::warn!(error = %err, "closing connection failed");
            }
            tracing::debug!("connection released");
        }
    }
}

fn not_open(op: &str) -> Error {
    Error::Connection(ConnectionError {
        kind: ConnectionErrorKind::NotOpen,
        message: format!("cannot {op}: connection was never opened"),
        source: None,
    })
}

#[derive(Debug)]
struct ContextState {
    conn: Option<LazyConnection>,
    depth: u32,
    rollback_only: bool,
}

/// Per-logical-thread connection and transaction state.
///
/// The context is `Send` but not `Sync`: move it into a worker, but share it
/// only through the scopes it hands out on one thread at a time. Every
/// statement helper on the context opens its own re-entrant scope, so plain
/// calls compose with explicit guards in any nesting order.
#[derive(Debug)]
pub struct DbContext {
    engine: Arc<Engine>,
    state: RefCell<ContextState>,
}

impl DbContext {
    /// Create a context bound to an engine.
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            state: RefCell::new(ContextState {
                conn: None,
                depth: 0,
                rollback_only: false,
            }),
        }
    }

    /// The engine this context opens connections from.
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Whether a connection slot is currently installed.
    pub fn is_init(&self) -> bool {
        self.state.borrow().conn.is_some()
    }

    /// Current transaction nesting depth (0 outside any transaction scope).
    pub fn transaction_depth(&self) -> u32 {
        self.state.borrow().depth
    }

    /// Acquire the connection for the duration of the returned scope.
    ///
    /// Re-entrant: only the scope that found the context uninitialized owns
    /// the connection, and only the owner releases it on drop.
    pub fn connection(&self) -> ConnectionScope<'_> {
        let owns = self.ensure_init();
        ConnectionScope { ctx: self, owns }
    }

    /// Run a closure inside a connection scope.
    #[allow(clippy::result_large_err)]
    pub fn with_connection<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let _scope = self.connection();
        f(self)
    }

    /// Enter a transaction, nesting inside any transaction already open.
    pub fn transaction(&self) -> TransactionScope<'_> {
        let owns_conn = self.ensure_init();
        let depth = {
            let mut state = self.state.borrow_mut();
            state.depth += 1;
            state.depth
        };
        if depth == 1 {
            tracing::debug!("begin transaction");
        } else {
            tracing::debug!(depth, "join open transaction");
        }
        TransactionScope {
            ctx: self,
            owns_conn,
            done: false,
        }
    }

    /// Run a closure in a transaction scope, committing on `Ok` and rolling
    /// back on `Err`.
    #[allow(clippy::result_large_err)]
    pub fn with_transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.transaction();
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    /// Install the connection slot if absent; `true` means this call owns it.
    fn ensure_init(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.conn.is_some() {
            false
        } else {
            state.conn = Some(LazyConnection::new(Arc::clone(&self.engine)));
            tracing::debug!("context initialized");
            true
        }
    }

    /// Remove and clean up the connection slot.
    fn release(&self) {
        let mut state = self.state.borrow_mut();
        if let Some(mut lazy) = state.conn.take() {
            lazy.cleanup();
        }
    }

    /// Run a closure against the live connection inside the current scope.
    #[allow(clippy::result_large_err)]
    pub(crate) fn with_handle<T>(
        &self,
        f: impl FnOnce(&mut dyn DriverConnection) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.state.borrow_mut();
        let Some(lazy) = state.conn.as_mut() else {
            return Err(not_open("run a statement"));
        };
        f(lazy.handle()?)
    }

    /// Commit on the current connection. Used for depth-0 auto-commit.
    #[allow(clippy::result_large_err)]
    pub(crate) fn commit_connection(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let Some(lazy) = state.conn.as_mut() else {
            return Err(not_open("commit"));
        };
        lazy.commit()
    }

    /// Leave one transaction level; physical work happens only at depth 0.
    #[allow(clippy::result_large_err)]
    fn exit_transaction(&self, normal: bool) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.depth = state.depth.saturating_sub(1);
        if !normal {
            state.rollback_only = true;
        }
        if state.depth > 0 {
            return Ok(());
        }
        let poisoned = state.rollback_only;
        state.rollback_only = false;
        let Some(lazy) = state.conn.as_mut() else {
            return Err(not_open("resolve transaction"));
        };
        if normal && !poisoned {
            tracing::debug!("commit transaction");
            match lazy.commit() {
                Ok(()) => Ok(()),
                Err(err) => {
                    tracing::warn!(error = %err, "commit failed, rolling back");
                    if let Err(rb) = lazy.rollback() {
                        tracing::error!(error = %rb, "rollback after failed commit failed");
                    }
                    Err(err)
                }
            }
        } else {
            tracing::debug!(poisoned, "rollback transaction");
            if let Err(err) = lazy.rollback() {
                if !normal {
                    return Err(err);
                }
                tracing::error!(error = %err, "rollback of poisoned transaction failed");
            }
            if normal {
                Err(Error::Transaction(TransactionError {
                    kind: TransactionErrorKind::RollbackOnly,
                    message: "an inner scope failed; the chain was rolled back".to_string(),
                }))
            } else {
                Ok(())
            }
        }
    }
}

/// Guard over one re-entrant acquisition of the context's connection.
#[must_use = "the connection is released when the scope is dropped"]
#[derive(Debug)]
pub struct ConnectionScope<'a> {
    ctx: &'a DbContext,
    owns: bool,
}

impl Drop for ConnectionScope<'_> {
    fn drop(&mut self) {
        if self.owns {
            self.ctx.release();
        }
    }
}

/// Guard over one level of transaction nesting.
///
/// [`commit`](Self::commit) is the normal exit; dropping the guard without it
/// counts as failure and marks the chain rollback-only.
#[must_use = "dropping the scope without calling commit rolls the transaction back"]
#[derive(Debug)]
pub struct TransactionScope<'a> {
    ctx: &'a DbContext,
    owns_conn: bool,
    done: bool,
}

impl TransactionScope<'_> {
    /// Leave this transaction level normally.
    ///
    /// Inner levels only decrement the counter. The outermost level performs
    /// the physical commit, or the physical rollback plus a `RollbackOnly`
    /// error if any level in the chain exited by drop. When the physical
    /// commit itself fails, a rollback is attempted and the commit error is
    /// returned.
    #[allow(clippy::result_large_err)]
    pub fn commit(mut self) -> Result<()> {
        self.done = true;
        self.ctx.exit_transaction(true)
    }
}

impl Drop for TransactionScope<'_> {
    fn drop(&mut self) {
        if !self.done {
            if let Err(err) = self.ctx.exit_transaction(false) {
                tracing::error!(error = %err, "rollback on drop failed");
            }
        }
        if self.owns_conn {
            self.ctx.release();
        }
    }
}

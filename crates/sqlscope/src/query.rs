//! Raw SQL against the context.
//!
//! Statements are written with `?` placeholders regardless of backend; they
//! are rewritten into the connection's native markers just before execution.
//! Every entry point opens its own re-entrant connection scope, so statement
//! resources are released on all exit paths and plain calls work with or
//! without an enclosing transaction.

use crate::context::DbContext;
use sqlscope_core::{Error, ParamStyle, QueryError, QueryErrorKind, Record, Result, Value};

/// Rewrite `?` placeholders into native markers for `style`.
///
/// A `?` inside a quoted literal (single or double quotes) is data, not a
/// placeholder, and is copied through untouched. Doubled quotes inside a
/// literal re-enter the quoted state immediately, so they cannot leak a
/// marker either. Returns the rewritten SQL and the number of markers.
fn expand_placeholders(sql: &str, style: ParamStyle) -> (String, usize) {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut count = 0usize;
    let mut quote: Option<char> = None;
    for ch in sql.chars() {
        match quote {
            Some(q) => {
                out.push(ch);
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    out.push(ch);
                }
                '?' => {
                    count += 1;
                    out.push_str(&style.marker(count));
                }
                _ => out.push(ch),
            },
        }
    }
    (out, count)
}

#[allow(clippy::result_large_err)]
fn check_parameter_count(sql: &str, markers: usize, given: usize) -> Result<()> {
    if markers == given {
        Ok(())
    } else {
        Err(Error::Query(QueryError {
            kind: QueryErrorKind::Parameter,
            sql: Some(sql.to_string()),
            message: format!("statement takes {markers} parameters, {given} were given"),
            source: None,
        }))
    }
}

impl DbContext {
    /// Run a query and materialize every row.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "debug", skip(self, params))]
    pub fn select(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        let _scope = self.connection();
        self.with_handle(|conn| {
            let (native, markers) = expand_placeholders(sql, conn.param_style());
            check_parameter_count(sql, markers, params.len())?;
            tracing::debug!(sql = %native, "select");
            conn.query(&native, params)
        })
    }

    /// Run a query and return the first row, if any.
    #[allow(clippy::result_large_err)]
    pub fn select_first(&self, sql: &str, params: &[Value]) -> Result<Option<Record>> {
        Ok(self.select(sql, params)?.into_iter().next())
    }

    /// Run a non-query statement and return the affected-row count.
    ///
    /// At transaction depth 0 the statement is committed immediately; inside
    /// a transaction the enclosing scope decides.
    #[allow(clippy::result_large_err)]
    #[tracing::instrument(level = "debug", skip(self, params))]
    pub fn update(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let _scope = self.connection();
        let affected = self.with_handle(|conn| {
            let (native, markers) = expand_placeholders(sql, conn.param_style());
            check_parameter_count(sql, markers, params.len())?;
            tracing::debug!(sql = %native, "execute");
            conn.execute(&native, params)
        })?;
        if self.transaction_depth() == 0 {
            tracing::debug!("auto commit");
            self.commit_connection()?;
        }
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use sqlscope_core::{Driver, DriverConnection, EngineConfig};
    use std::sync::{Arc, Mutex};

    #[test]
    fn question_markers_stay_in_place() {
        let (sql, n) = expand_placeholders(
            "select * from user where id = ? and name = ?",
            ParamStyle::Question,
        );
        assert_eq!(sql, "select * from user where id = ? and name = ?");
        assert_eq!(n, 2);
    }

    #[test]
    fn dollar_markers_are_numbered() {
        let (sql, n) = expand_placeholders(
            "update user set name = ?, email = ? where id = ?",
            ParamStyle::Dollar,
        );
        assert_eq!(sql, "update user set name = $1, email = $2 where id = $3");
        assert_eq!(n, 3);
    }

    #[test]
    fn numbered_markers_for_sqlite() {
        let (sql, n) = expand_placeholders("select ? , ?", ParamStyle::Numbered);
        assert_eq!(sql, "select ?1 , ?2");
        assert_eq!(n, 2);
    }

    #[test]
    fn quoted_literals_are_left_alone() {
        let (sql, n) = expand_placeholders(
            "select '?' as q, \"a?b\" from t where x = ?",
            ParamStyle::Dollar,
        );
        assert_eq!(sql, "select '?' as q, \"a?b\" from t where x = $1");
        assert_eq!(n, 1);
    }

    #[test]
    fn doubled_quote_escape_stays_quoted() {
        let (sql, n) =
            expand_placeholders("select 'it''s a ?' from t where x = ?", ParamStyle::Dollar);
        assert_eq!(sql, "select 'it''s a ?' from t where x = $1");
        assert_eq!(n, 1);
    }

    #[derive(Debug, Default)]
    struct Log {
        sqls: Vec<String>,
        commits: usize,
    }

    #[derive(Debug, Default)]
    struct LoggingDriver {
        log: Arc<Mutex<Log>>,
    }

    impl Driver for LoggingDriver {
        fn name(&self) -> &'static str {
            "logging"
        }

        fn connect(&self, _config: &EngineConfig) -> Result<Box<dyn DriverConnection>> {
            Ok(Box::new(LoggingConnection {
                log: Arc::clone(&self.log),
            }))
        }
    }

    #[derive(Debug)]
    struct LoggingConnection {
        log: Arc<Mutex<Log>>,
    }

    impl DriverConnection for LoggingConnection {
        fn param_style(&self) -> ParamStyle {
            ParamStyle::Dollar
        }

        fn query(&mut self, sql: &str, _params: &[Value]) -> Result<Vec<Record>> {
            self.log.lock().unwrap().sqls.push(sql.to_string());
            Ok(Vec::new())
        }

        fn execute(&mut self, sql: &str, _params: &[Value]) -> Result<u64> {
            self.log.lock().unwrap().sqls.push(sql.to_string());
            Ok(1)
        }

        fn commit(&mut self) -> Result<()> {
            self.log.lock().unwrap().commits += 1;
            Ok(())
        }

        fn rollback(&mut self) -> Result<()> {
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn logging_context() -> (DbContext, Arc<Mutex<Log>>) {
        let driver = LoggingDriver::default();
        let log = Arc::clone(&driver.log);
        let engine = Arc::new(Engine::new(EngineConfig::new("u", "p", "db"), driver));
        (DbContext::new(engine), log)
    }

    #[test]
    fn select_rewrites_to_native_markers() {
        let (ctx, log) = logging_context();
        ctx.select("select * from t where a = ? and b = ?", &[
            Value::Int(1),
            Value::Int(2),
        ])
        .unwrap();
        assert_eq!(log.lock().unwrap().sqls, vec![
            "select * from t where a = $1 and b = $2".to_string()
        ]);
    }

    #[test]
    fn parameter_count_mismatch_is_rejected() {
        let (ctx, log) = logging_context();
        let err = ctx
            .select("select * from t where a = ?", &[])
            .unwrap_err();
        match err {
            Error::Query(err) => {
                assert_eq!(err.kind, QueryErrorKind::Parameter);
                assert_eq!(err.sql.as_deref(), Some("select * from t where a = ?"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Nothing reached the driver.
        assert!(log.lock().unwrap().sqls.is_empty());
    }

    #[test]
    fn update_at_depth_zero_auto_commits() {
        let (ctx, log) = logging_context();
        let affected = ctx
            .update("update t set x = ? where id = ?", &[
                Value::Int(1),
                Value::Int(2),
            ])
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(log.lock().unwrap().commits, 1);
    }

    #[test]
    fn update_inside_transaction_does_not_commit() {
        let (ctx, log) = logging_context();
        let tx = ctx.transaction();
        ctx.update("update t set x = ?", &[Value::Int(1)]).unwrap();
        assert_eq!(log.lock().unwrap().commits, 0);
        tx.commit().unwrap();
        assert_eq!(log.lock().unwrap().commits, 1);
    }
}

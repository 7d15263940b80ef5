//! Shared fixtures for sqlscope integration tests.
//!
//! [`JournalDriver`] opens connections that append every event they see to a
//! shared journal, so tests can assert the exact order of opens, statements,
//! transaction boundaries, and closes.

#![allow(dead_code)]

use sqlscope::{
    DbContext, Driver, DriverConnection, Engine, EngineConfig, ParamStyle, Record, Result, Value,
};
use std::sync::{Arc, Mutex};

/// Event log shared by every connection a [`JournalDriver`] opens.
pub type Journal = Arc<Mutex<Vec<String>>>;

/// Snapshot of the journal contents.
pub fn events(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

#[derive(Debug, Clone)]
pub struct JournalDriver {
    journal: Journal,
    style: ParamStyle,
    canned: Arc<Vec<Record>>,
}

impl JournalDriver {
    pub fn new(style: ParamStyle) -> (Self, Journal) {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let driver = Self {
            journal: Arc::clone(&journal),
            style,
            canned: Arc::new(Vec::new()),
        };
        (driver, journal)
    }

    /// Rows every `query` call returns.
    pub fn with_rows(mut self, rows: Vec<Record>) -> Self {
        self.canned = Arc::new(rows);
        self
    }
}

impl Driver for JournalDriver {
    fn name(&self) -> &'static str {
        "journal"
    }

    fn connect(&self, _config: &EngineConfig) -> Result<Box<dyn DriverConnection>> {
        self.journal.lock().unwrap().push("open".to_string());
        Ok(Box::new(JournalConnection {
            journal: Arc::clone(&self.journal),
            style: self.style,
            canned: Arc::clone(&self.canned),
        }))
    }
}

#[derive(Debug)]
pub struct JournalConnection {
    journal: Journal,
    style: ParamStyle,
    canned: Arc<Vec<Record>>,
}

impl DriverConnection for JournalConnection {
    fn param_style(&self) -> ParamStyle {
        self.style
    }

    fn query(&mut self, sql: &str, _params: &[Value]) -> Result<Vec<Record>> {
        self.journal.lock().unwrap().push(format!("query:{sql}"));
        Ok(self.canned.as_ref().clone())
    }

    fn execute(&mut self, sql: &str, _params: &[Value]) -> Result<u64> {
        self.journal.lock().unwrap().push(format!("execute:{sql}"));
        Ok(1)
    }

    fn commit(&mut self) -> Result<()> {
        self.journal.lock().unwrap().push("commit".to_string());
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.journal.lock().unwrap().push("rollback".to_string());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.journal.lock().unwrap().push("close".to_string());
        Ok(())
    }
}

/// Context over a fresh engine that opens journal connections.
pub fn journal_context(driver: JournalDriver) -> DbContext {
    let engine = Engine::new(EngineConfig::new("tester", "secret", "journal"), driver);
    DbContext::new(Arc::new(engine))
}

//! The engine: credentials plus a driver.
//!
//! An [`Engine`] is the process-wide connection factory. It owns the
//! [`EngineConfig`] and a [`Driver`], and every [`connect`] call opens one
//! fresh physical connection; nothing is pooled or reused. Contexts share an
//! engine through `Arc`, and binaries that want create-once semantics can
//! install one engine in the process-global slot with [`Engine::initialize`].
//!
//! [`connect`]: Engine::connect

use sqlscope_core::{
    ConfigError, ConfigErrorKind, Driver, DriverConnection, EngineConfig, Error, Result,
};
use std::sync::{Arc, OnceLock};

static GLOBAL_ENGINE: OnceLock<Arc<Engine>> = OnceLock::new();

/// Connection factory shared by every context in the process.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    driver: Box<dyn Driver>,
}

impl Engine {
    /// Create an engine value from a config and a driver.
    pub fn new(config: EngineConfig, driver: impl Driver + 'static) -> Self {
        Self {
            config,
            driver: Box::new(driver),
        }
    }

    /// Install an engine into the process-wide slot.
    ///
    /// Succeeds exactly once per process; a second call fails with a
    /// [`ConfigError`] and leaves the installed engine untouched.
    #[allow(clippy::result_large_err)]
    pub fn initialize(config: EngineConfig, driver: impl Driver + 'static) -> Result<Arc<Engine>> {
        let engine = Arc::new(Engine::new(config, driver));
        GLOBAL_ENGINE.set(Arc::clone(&engine)).map_err(|_| {
            Error::Config(ConfigError {
                kind: ConfigErrorKind::AlreadyInitialized,
                message: "engine is already initialized".to_string(),
            })
        })?;
        tracing::info!(
            driver = engine.driver.name(),
            database = %engine.config.database,
            "engine initialized"
        );
        Ok(engine)
    }

    /// Get the process-wide engine, if one was installed.
    pub fn global() -> Option<Arc<Engine>> {
        GLOBAL_ENGINE.get().map(Arc::clone)
    }

    /// The stored connection settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Short name of the backing driver.
    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    /// Open one new physical connection using the stored settings.
    #[allow(clippy::result_large_err)]
    pub fn connect(&self) -> Result<Box<dyn DriverConnection>> {
        let conn = self.driver.connect(&self.config)?;
        tracing::debug!(driver = self.driver.name(), "opened database connection");
        Ok(conn)
    }
}

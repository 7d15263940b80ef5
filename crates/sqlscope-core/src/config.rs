//! Engine connection configuration.

use std::collections::HashMap;
use std::fmt;

/// Connection settings handed to the driver for every physical open.
///
/// `user`, `password` and `database` are required; host and port default to
/// `127.0.0.1:3306`. Free-form driver options live in `options`, pre-seeded
/// with `use_unicode=true` and `charset=utf8` unless the caller overrides
/// them.
#[derive(Clone)]
pub struct EngineConfig {
    /// Username for authentication
    pub user: String,
    /// Password for authentication
    pub password: String,
    /// Database name (for the SQLite driver, the database path)
    pub database: String,
    /// Hostname or IP address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Additional driver options
    pub options: HashMap<String, String>,
}

impl EngineConfig {
    /// Create a configuration with the required credentials.
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        let mut options = HashMap::new();
        options.insert("use_unicode".to_string(), "true".to_string());
        options.insert("charset".to_string(), "utf8".to_string());
        Self {
            user: user.into(),
            password: password.into(),
            database: database.into(),
            host: "127.0.0.1".to_string(),
            port: 3306,
            options,
        }
    }

    /// Set the hostname.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set a driver option, overriding the seeded defaults if named.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Look up a driver option.
    pub fn get_option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Get the socket address string for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The password never appears in logs or debug output.
impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_builder() {
        let config = EngineConfig::new("www-data", "secret", "awesome")
            .host("db.internal")
            .port(3307)
            .option("autocommit", "false");

        assert_eq!(config.user, "www-data");
        assert_eq!(config.database, "awesome");
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 3307);
        assert_eq!(config.get_option("autocommit"), Some("false"));
    }

    #[test]
    fn seeded_options_unless_overridden() {
        let config = EngineConfig::new("u", "p", "db");
        assert_eq!(config.get_option("use_unicode"), Some("true"));
        assert_eq!(config.get_option("charset"), Some("utf8"));

        let config = EngineConfig::new("u", "p", "db").option("charset", "latin1");
        assert_eq!(config.get_option("charset"), Some("latin1"));
    }

    #[test]
    fn default_host_and_port() {
        let config = EngineConfig::new("u", "p", "db");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3306);
        assert_eq!(config.socket_addr(), "127.0.0.1:3306");
    }

    #[test]
    fn debug_masks_password() {
        let config = EngineConfig::new("u", "hunter2", "db");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }
}

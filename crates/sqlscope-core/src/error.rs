//! Error types for sqlscope operations.

use std::fmt;

/// The primary error type for all sqlscope operations.
#[derive(Debug)]
pub enum Error {
    /// Engine configuration errors (bad settings, double initialization)
    Config(ConfigError),
    /// Table mapping / registry errors
    Schema(SchemaError),
    /// Connection-related errors (open, close, no handle)
    Connection(ConnectionError),
    /// Query execution errors
    Query(QueryError),
    /// Type conversion errors
    Type(TypeMismatchError),
    /// Transaction scope errors
    Transaction(TransactionError),
}

#[derive(Debug)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// The process-wide engine slot was already filled
    AlreadyInitialized,
}

#[derive(Debug)]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// No field was flagged as the primary key
    MissingPrimaryKey,
    /// More than one field was flagged as the primary key
    DuplicatePrimaryKey,
    /// Two fields map to the same column name
    DuplicateColumn,
    /// Table or column name is not a valid SQL identifier
    InvalidIdentifier,
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to open the physical connection
    Open,
    /// No physical connection exists (nothing to commit or roll back)
    NotOpen,
    /// The connection was already closed
    Closed,
    /// Driver-level failure on an open connection
    Driver,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Syntax error in SQL
    Syntax,
    /// Positional parameter count does not match the placeholder count
    Parameter,
    /// Constraint violation (unique, foreign key, not null)
    Constraint,
    /// Other execution failure
    Execute,
}

#[derive(Debug)]
pub struct TypeMismatchError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

#[derive(Debug)]
pub struct TransactionError {
    pub kind: TransactionErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionErrorKind {
    /// An inner scope failed, so the chain was rolled back instead of committed
    RollbackOnly,
}

impl Error {
    /// Did an inner scope failure force this chain to roll back?
    pub fn is_rollback_only(&self) -> bool {
        matches!(
            self,
            Error::Transaction(TransactionError {
                kind: TransactionErrorKind::RollbackOnly,
                ..
            })
        )
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Schema(e) => write!(f, "Schema error: {}", e.message),
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Query(e) => {
                if let Some(sql) = &e.sql {
                    write!(f, "Query error: {} (sql: {})", e.message, sql)
                } else {
                    write!(f, "Query error: {}", e.message)
                }
            }
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::Transaction(e) => write!(f, "Transaction error: {}", e.message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::Schema(err)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeMismatchError> for Error {
    fn from(err: TypeMismatchError) -> Self {
        Error::Type(err)
    }
}

impl From<TransactionError> for Error {
    fn from(err: TransactionError) -> Self {
        Error::Transaction(err)
    }
}

/// Result type alias for sqlscope operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_error_display_includes_sql() {
        let err = Error::Query(QueryError {
            kind: QueryErrorKind::Syntax,
            sql: Some("select *".to_string()),
            message: "near \"*\"".to_string(),
            source: None,
        });

        let rendered = err.to_string();
        assert!(rendered.contains("near"));
        assert!(rendered.contains("select *"));
        assert_eq!(err.sql(), Some("select *"));
    }

    #[test]
    fn rollback_only_flag() {
        let err = Error::Transaction(TransactionError {
            kind: TransactionErrorKind::RollbackOnly,
            message: "chain rolled back".to_string(),
        });
        assert!(err.is_rollback_only());

        let other = Error::Config(ConfigError {
            kind: ConfigErrorKind::AlreadyInitialized,
            message: "engine already initialized".to_string(),
        });
        assert!(!other.is_rollback_only());
    }

    #[test]
    fn type_error_display_names_column() {
        let err = Error::Type(TypeMismatchError {
            expected: "i64",
            actual: "text".to_string(),
            column: Some("age".to_string()),
        });
        assert!(err.to_string().contains("'age'"));
    }
}

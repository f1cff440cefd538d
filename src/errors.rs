use thiserror::Error;

/// Error type for schema copy operations.
#[derive(Error, Debug)]
pub enum DbError {
    /// Error that occurs during database interactions (e.g., SQL query failure).
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    /// Configuration error (e.g., invalid port or missing database name).
    #[error("Configuration error: {0}")]
    Config(String),
    /// Connection error (e.g., issues with network or authentication).
    #[error("Connection error: {0}")]
    Connection(String),
    /// Source schema could not be read.
    #[error("Introspection error: {0}")]
    Introspection(String),
    /// Target rejected the DDL for a table.
    #[error("DDL failed for table {table}: {message}")]
    Ddl { table: String, message: String },
}

impl DbError {
    pub fn ddl(table: impl Into<String>, message: impl ToString) -> Self {
        DbError::Ddl {
            table: table.into(),
            message: message.to_string(),
        }
    }
}

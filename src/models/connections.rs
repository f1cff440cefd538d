use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Postgres,
    MySql,
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbType::Postgres => write!(f, "PostgreSQL"),
            DbType::MySql => write!(f, "MySQL"),
        }
    }
}

/// Connection parameters for one engine.
#[derive(Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub db_type: DbType,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    /// Client character set, only meaningful for MySQL.
    pub charset: Option<String>,
}

impl ConnectionConfig {
    /// `host:port/database`, safe to log.
    pub fn address(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

// Keeps the password out of logs and panics.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("db_type", &self.db_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .field("charset", &self.charset)
            .finish()
    }
}

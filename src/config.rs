//! Connection settings for both engines, read from the environment.
//!
//! | Variable         | Default      |
//! |------------------|--------------|
//! | `MYSQL_HOST`     | `127.0.0.1`  |
//! | `MYSQL_PORT`     | `3306`       |
//! | `MYSQL_USER`     | `root`       |
//! | `MYSQL_PASSWORD` | empty        |
//! | `MYSQL_DATABASE` | required     |
//! | `MYSQL_CHARSET`  | `utf8mb4`    |
//! | `PG_HOST`        | `127.0.0.1`  |
//! | `PG_PORT`        | `5432`       |
//! | `PG_USER`        | `postgres`   |
//! | `PG_PASSWORD`    | empty        |
//! | `PG_DATABASE`    | `MYSQL_DATABASE` |
//! | `PG_IF_EXISTS`   | `fail`       |

use std::{collections::HashMap, env, path::Path};

use crate::{
    db::postgres::ExistingTablePolicy,
    errors::DbError,
    models::connections::{ConnectionConfig, DbType},
};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_MYSQL_PORT: u16 = 3306;
const DEFAULT_PG_PORT: u16 = 5432;
const DEFAULT_CHARSET: &str = "utf8mb4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    pub source: ConnectionConfig,
    pub target: ConnectionConfig,
    pub if_exists: ExistingTablePolicy,
}

impl MigrationConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, DbError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration from a dotenv file without touching the process environment.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref();
        let iter = dotenv::from_path_iter(path)
            .map_err(|e| DbError::Config(format!("reading {}: {}", path.display(), e)))?;

        let mut vars = HashMap::new();
        for item in iter {
            let (key, value) =
                item.map_err(|e| DbError::Config(format!("parsing {}: {}", path.display(), e)))?;
            vars.insert(key, value);
        }

        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let source_database = get("MYSQL_DATABASE")
            .ok_or_else(|| DbError::Config("MYSQL_DATABASE must be set".to_string()))?;

        let source = ConnectionConfig {
            db_type: DbType::MySql,
            host: get("MYSQL_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_port("MYSQL_PORT", get("MYSQL_PORT"), DEFAULT_MYSQL_PORT)?,
            username: get("MYSQL_USER").unwrap_or_else(|| "root".to_string()),
            password: lookup("MYSQL_PASSWORD").unwrap_or_default(),
            database: source_database.clone(),
            charset: Some(get("MYSQL_CHARSET").unwrap_or_else(|| DEFAULT_CHARSET.to_string())),
        };

        let target = ConnectionConfig {
            db_type: DbType::Postgres,
            host: get("PG_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_port("PG_PORT", get("PG_PORT"), DEFAULT_PG_PORT)?,
            username: get("PG_USER").unwrap_or_else(|| "postgres".to_string()),
            password: lookup("PG_PASSWORD").unwrap_or_default(),
            database: get("PG_DATABASE").unwrap_or(source_database),
            charset: None,
        };

        let if_exists = match get("PG_IF_EXISTS") {
            Some(value) => value.parse()?,
            None => ExistingTablePolicy::default(),
        };

        Ok(Self {
            source,
            target,
            if_exists,
        })
    }
}

fn parse_port(key: &str, value: Option<String>, default: u16) -> Result<u16, DbError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| DbError::Config(format!("{} is not a valid port: {}", key, value))),
        None => Ok(default),
    }
}

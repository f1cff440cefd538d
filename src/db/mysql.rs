use async_trait::async_trait;
use log::info;
use sqlx::{
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
    MySqlPool, Row,
};

use crate::{
    errors::DbError,
    models::{
        connections::ConnectionConfig,
        schema::{ColumnSchema, TableSchema},
        types::ColumnType,
    },
};

use super::DbClient;

// Views are listed alongside base tables.
const LIST_TABLES: &str = r#"
    SELECT CAST(TABLE_NAME AS CHAR(255)) AS table_name
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_SCHEMA = DATABASE()
    ORDER BY TABLE_NAME
"#;

// CAST to CHAR/SIGNED so information_schema's varbinary and unsigned
// columns decode the same way on every server version.
const DESCRIBE_TABLE: &str = r#"
    SELECT
        CAST(c.COLUMN_NAME AS CHAR(255)) AS column_name,
        CAST(c.COLUMN_TYPE AS CHAR) AS column_type,
        CAST(c.COLLATION_NAME AS CHAR(255)) AS collation_name,
        CAST(t.TABLE_COLLATION AS CHAR(255)) AS table_collation,
        CAST(IF(c.IS_NULLABLE = 'YES', 1, 0) AS SIGNED) AS is_nullable,
        CAST(IF(c.COLUMN_KEY = 'PRI', 1, 0) AS SIGNED) AS is_primary_key,
        CAST(IF(c.EXTRA LIKE '%auto_increment%', 1, 0) AS SIGNED) AS is_auto_increment
    FROM INFORMATION_SCHEMA.COLUMNS c
    JOIN INFORMATION_SCHEMA.TABLES t
        ON t.TABLE_SCHEMA = c.TABLE_SCHEMA AND t.TABLE_NAME = c.TABLE_NAME
    WHERE c.TABLE_SCHEMA = DATABASE() AND c.TABLE_NAME = ?
    ORDER BY c.ORDINAL_POSITION
"#;

pub struct MySqlClient {
    pub pool: MySqlPool,
}

impl MySqlClient {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, DbError> {
        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database);
        if let Some(charset) = &config.charset {
            options = options.charset(charset);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        info!("Connected to MySQL source: {}", config.address());
        Ok(Self { pool })
    }
}

/// Only a collation that differs from the table default counts as set on the column.
fn explicit_collation(column: Option<String>, table: Option<&str>) -> Option<String> {
    column.filter(|collation| Some(collation.as_str()) != table)
}

#[async_trait]
impl DbClient for MySqlClient {
    async fn execute(&self, query: &str) -> Result<(), DbError> {
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map_err(DbError::Sqlx)?;
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let rows = sqlx::query(LIST_TABLES)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DbError::Introspection(format!("listing tables: {}", e)))?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("table_name").map_err(DbError::Sqlx))
            .collect()
    }

    async fn describe_table(&self, table_name: &str) -> Result<TableSchema, DbError> {
        let rows = sqlx::query(DESCRIBE_TABLE)
            .bind(table_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DbError::Introspection(format!("describing {}: {}", table_name, e)))?;

        if rows.is_empty() {
            return Err(DbError::Introspection(format!(
                "table {} has no columns",
                table_name
            )));
        }

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let column_type: String = row.try_get("column_type")?;
            let table_collation: Option<String> = row.try_get("table_collation")?;
            let collation = explicit_collation(
                row.try_get("collation_name")?,
                table_collation.as_deref(),
            );

            columns.push(ColumnSchema {
                name: row.try_get("column_name")?,
                data_type: ColumnType::parse_mysql(&column_type, collation),
                is_nullable: row.try_get::<i64, _>("is_nullable")? == 1,
                is_primary_key: row.try_get::<i64, _>("is_primary_key")? == 1,
                is_auto_increment: row.try_get::<i64, _>("is_auto_increment")? == 1,
            });
        }

        Ok(TableSchema {
            table_name: table_name.to_string(),
            columns,
        })
    }
}

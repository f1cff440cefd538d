use std::{fmt, str::FromStr};

use async_trait::async_trait;
use log::info;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool, Row,
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

const LIST_TABLES: &str = r#"
    SELECT table_name::text AS table_name
    FROM information_schema.tables
    WHERE table_schema = current_schema()
    ORDER BY table_name
"#;

const DESCRIBE_TABLE: &str = r#"
    SELECT
        c.column_name::text AS column_name,
        c.data_type::text AS data_type,
        c.character_maximum_length::int4 AS char_length,
        c.numeric_precision::int4 AS num_precision,
        c.numeric_scale::int4 AS num_scale,
        (c.is_nullable = 'YES') AS is_nullable,
        COALESCE(c.column_default LIKE 'nextval(%', false) AS is_auto_increment,
        EXISTS (
            SELECT 1
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON kcu.constraint_name = tc.constraint_name
                AND kcu.table_schema = tc.table_schema
                AND kcu.table_name = tc.table_name
            WHERE tc.constraint_type = 'PRIMARY KEY'
                AND tc.table_schema = c.table_schema
                AND tc.table_name = c.table_name
                AND kcu.column_name = c.column_name
        ) AS is_primary_key
    FROM information_schema.columns c
    WHERE c.table_schema = current_schema() AND c.table_name = $1
    ORDER BY c.ordinal_position
"#;

/// What to do when a table about to be created already exists on the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExistingTablePolicy {
    /// Plain `CREATE TABLE`; the target's duplicate-table error aborts the run.
    #[default]
    Fail,
    /// `CREATE TABLE IF NOT EXISTS`.
    Skip,
    /// Drop the existing table first.
    Replace,
}

impl FromStr for ExistingTablePolicy {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(ExistingTablePolicy::Fail),
            "skip" => Ok(ExistingTablePolicy::Skip),
            "replace" => Ok(ExistingTablePolicy::Replace),
            other => Err(DbError::Config(format!(
                "unknown existing-table policy '{}' (expected fail, skip or replace)",
                other
            ))),
        }
    }
}

impl fmt::Display for ExistingTablePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExistingTablePolicy::Fail => write!(f, "fail"),
            ExistingTablePolicy::Skip => write!(f, "skip"),
            ExistingTablePolicy::Replace => write!(f, "replace"),
        }
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_definition(column: &ColumnSchema) -> String {
    // Only a key column gets a sequence-backed type.
    let serial = column.is_auto_increment && column.is_primary_key;
    let data_type = match (&column.data_type, serial) {
        (ColumnType::SmallInteger, true) => "SMALLSERIAL".to_string(),
        (ColumnType::Integer, true) => "SERIAL".to_string(),
        (ColumnType::BigInteger, true) => "BIGSERIAL".to_string(),
        (data_type, _) => data_type.to_string(),
    };

    format!(
        "{} {}{}",
        quote_ident(&column.name),
        data_type,
        if column.is_nullable { "" } else { " NOT NULL" }
    )
}

/// `CREATE TABLE` for a translated table: typed columns, nullability and
/// the primary key. Nothing else is carried over.
pub fn create_table_sql(table: &TableSchema, if_not_exists: bool) -> String {
    let mut query = format!(
        "CREATE TABLE {}{} (",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        quote_ident(&table.table_name)
    );

    let mut definitions: Vec<String> = table.columns.iter().map(column_definition).collect();

    let primary_key = table.primary_key();
    if !primary_key.is_empty() {
        let key_columns: Vec<String> = primary_key.iter().map(|c| quote_ident(c)).collect();
        definitions.push(format!("PRIMARY KEY ({})", key_columns.join(", ")));
    }

    query.push_str(&definitions.join(", "));
    query.push(')');
    query
}

pub fn drop_table_sql(table_name: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(table_name))
}

/// Statements that create `table` under the given policy, in execution order.
pub fn create_table_statements(table: &TableSchema, policy: ExistingTablePolicy) -> Vec<String> {
    match policy {
        ExistingTablePolicy::Fail => vec![create_table_sql(table, false)],
        ExistingTablePolicy::Skip => vec![create_table_sql(table, true)],
        ExistingTablePolicy::Replace => vec![
            drop_table_sql(&table.table_name),
            create_table_sql(table, false),
        ],
    }
}

pub struct PostgresClient {
    pub pool: PgPool,
}

impl PostgresClient {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, DbError> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database);

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        info!("Connected to PostgreSQL target: {}", config.address());
        Ok(Self { pool })
    }

    pub async fn drop_table(&self, table_name: &str) -> Result<(), DbError> {
        sqlx::query(&drop_table_sql(table_name))
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::ddl(table_name, e))?;

        Ok(())
    }
}

#[async_trait]
impl DbClient for PostgresClient {
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
            let data_type: String = row.try_get("data_type")?;

            columns.push(ColumnSchema {
                name: row.try_get("column_name")?,
                data_type: ColumnType::from_postgres(
                    &data_type,
                    row.try_get("char_length")?,
                    row.try_get("num_precision")?,
                    row.try_get("num_scale")?,
                ),
                is_nullable: row.try_get("is_nullable")?,
                is_primary_key: row.try_get("is_primary_key")?,
                is_auto_increment: row.try_get("is_auto_increment")?,
            });
        }

        Ok(TableSchema {
            table_name: table_name.to_string(),
            columns,
        })
    }
}

use config::MigrationConfig;
use db::{
    mysql::MySqlClient,
    postgres::{create_table_statements, ExistingTablePolicy, PostgresClient},
    BoxedDbClient,
};
use errors::DbError;
use log::{debug, info, warn};
use models::{connections::DbType, schema::TableSchema};

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod typemap;

/// Tables assembled for the target, in source introspection order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TargetCatalog {
    pub tables: Vec<TableSchema>,
    pub columns_rewritten: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyReport {
    pub tables_created: usize,
    pub columns_rewritten: usize,
}

/// Copies the table layout of a MySQL database into PostgreSQL.
pub struct SchemaCopier {
    source: BoxedDbClient,
    target: BoxedDbClient,
    if_exists: ExistingTablePolicy,
}

impl SchemaCopier {
    pub fn new(
        source: BoxedDbClient,
        target: BoxedDbClient,
        if_exists: ExistingTablePolicy,
    ) -> Self {
        SchemaCopier {
            source,
            target,
            if_exists,
        }
    }

    /// Open one source and one target connection. Both are held until the copier is dropped.
    pub async fn connect(config: &MigrationConfig) -> Result<Self, DbError> {
        let source: BoxedDbClient = match config.source.db_type {
            DbType::MySql => Box::new(MySqlClient::connect(&config.source).await?),
            other => {
                return Err(DbError::Config(format!(
                    "unsupported source engine: {}",
                    other
                )))
            }
        };
        let target: BoxedDbClient = match config.target.db_type {
            DbType::Postgres => Box::new(PostgresClient::connect(&config.target).await?),
            other => {
                return Err(DbError::Config(format!(
                    "unsupported target engine: {}",
                    other
                )))
            }
        };

        info!("Existing target tables: {}", config.if_exists);
        Ok(Self::new(source, target, config.if_exists))
    }

    /// Introspect every table of the source before anything is created.
    pub async fn reflect_source(&self) -> Result<Vec<TableSchema>, DbError> {
        let table_names = self.source.list_tables().await?;

        let mut tables = Vec::with_capacity(table_names.len());
        for table_name in &table_names {
            tables.push(self.source.describe_table(table_name).await?);
        }

        info!("Reflected {} tables from source", tables.len());
        Ok(tables)
    }

    pub fn translate_catalog(&self, source: &[TableSchema]) -> TargetCatalog {
        let mut catalog = TargetCatalog::default();

        for table in source {
            println!("Creating table schema for: {}", table.table_name);

            let (translated, rewrites) = typemap::translate_table(table);
            for rewrite in &rewrites {
                println!("{}", rewrite);
            }

            catalog.columns_rewritten += rewrites.len();
            catalog.tables.push(translated);
        }

        catalog
    }

    /// Issue the DDL for every table in order. There is no surrounding
    /// transaction: tables created before a failure stay on the target.
    pub async fn create_tables(&self, catalog: &TargetCatalog) -> Result<usize, DbError> {
        for table in &catalog.tables {
            if self.if_exists == ExistingTablePolicy::Replace {
                warn!("Replacing target table {} if it exists", table.table_name);
            }
            for statement in create_table_statements(table, self.if_exists) {
                debug!("{}", statement);
                self.target
                    .execute(&statement)
                    .await
                    .map_err(|e| DbError::ddl(&table.table_name, e))?;
            }
        }

        Ok(catalog.tables.len())
    }

    pub async fn copy_schema(&self) -> Result<CopyReport, DbError> {
        let source = self.reflect_source().await?;
        let catalog = self.translate_catalog(&source);

        println!("Creating tables in PostgreSQL...");
        let tables_created = self.create_tables(&catalog).await?;
        println!("Schema copy completed (no data copied).");

        Ok(CopyReport {
            tables_created,
            columns_rewritten: catalog.columns_rewritten,
        })
    }
}

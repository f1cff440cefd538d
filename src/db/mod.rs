use crate::{errors::DbError, models::schema::TableSchema};
use async_trait::async_trait;

pub mod mysql;
pub mod postgres;

#[async_trait]
pub trait DbClient {
    async fn execute(&self, query: &str) -> Result<(), DbError>;
    async fn list_tables(&self) -> Result<Vec<String>, DbError>;
    async fn describe_table(&self, table_name: &str) -> Result<TableSchema, DbError>;
}

pub type BoxedDbClient = Box<dyn DbClient + Send + Sync>;

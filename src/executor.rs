//! The statement-execution seam and the schema helpers built on top of it.

use async_trait::async_trait;
use tracing::debug;

use crate::ddl;
use crate::error::{Error, Result};
use crate::schema::{ColumnDefinition, ColumnInfo, TableDefinition, TableListEntry};
use crate::value::{Params, Row};

/// Outcome of a statement run through [`Executor::execute`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RunResult {
    /// Rowid of the most recent successful insert on the connection.
    pub last_id: i64,
    /// Rows changed by the statement.
    pub changes: u64,
}

/// Something that can run SQL. [`Database`](crate::Database) is the
/// production implementation.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, sql: &str, params: Params) -> Result<RunResult>;

    async fn fetch_one(&self, sql: &str, params: Params) -> Result<Option<Row>>;

    async fn fetch_all(&self, sql: &str, params: Params) -> Result<Vec<Row>>;
}

/// Schema helpers available on every [`Executor`].
///
/// Identifiers are passed through [`ddl::quote_identifier`]; the generated
/// statement is then run with [`Executor::execute`].
#[async_trait]
pub trait SchemaExt: Executor {
    async fn rename_table(&self, from: &str, to: &str) -> Result<RunResult> {
        let sql = ddl::rename_table(from, to)?;
        self.execute(&sql, Params::new()).await
    }

    async fn rename_column(&self, table: &str, from: &str, to: &str) -> Result<RunResult> {
        let sql = ddl::rename_column(table, from, to)?;
        self.execute(&sql, Params::new()).await
    }

    async fn add_column(
        &self,
        table: &str,
        name: &str,
        column: &ColumnDefinition,
    ) -> Result<RunResult> {
        let sql = ddl::add_column(table, name, column)?;
        self.execute(&sql, Params::new()).await
    }

    async fn drop_column(&self, table: &str, column: &str) -> Result<RunResult> {
        let sql = ddl::drop_column(table, column)?;
        self.execute(&sql, Params::new()).await
    }

    async fn drop_table(&self, table: &str) -> Result<RunResult> {
        let sql = ddl::drop_table(table)?;
        self.execute(&sql, Params::new()).await
    }

    /// Tables, views and virtual tables across attached schemas.
    async fn list_tables(&self) -> Result<Vec<TableListEntry>> {
        let rows = self
            .fetch_all("SELECT * FROM pragma_table_list", Params::new())
            .await?;
        Ok(rows.iter().map(TableListEntry::from_row).collect())
    }

    /// Columns of `table`, in declaration order. Empty if the table is missing.
    async fn table_info(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let rows = self
            .fetch_all(
                "SELECT * FROM pragma_table_info(?1)",
                Params::positional([table]),
            )
            .await?;
        Ok(rows.iter().map(ColumnInfo::from_row).collect())
    }

    /// Creates `table`, failing with [`Error::TableExists`] before any DDL
    /// runs if a table of that name is already listed.
    async fn create_table(&self, table: &str, definition: &TableDefinition) -> Result<RunResult> {
        let sql = ddl::create_table(table, definition)?;
        let exists = self
            .list_tables()
            .await?
            .iter()
            .any(|entry| entry.name.eq_ignore_ascii_case(table));
        if exists {
            debug!(table, "create_table skipped, table exists");
            return Err(Error::TableExists(table.to_string()));
        }
        self.execute(&sql, Params::new()).await
    }
}

impl<T: Executor> SchemaExt for T {}

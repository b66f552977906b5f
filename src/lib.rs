//! Async SQLite facade.
//!
//! # Intention
//!
//! - Own one SQLite handle and expose its statements as futures:
//!   [`Database::execute`], [`Database::fetch_one`], [`Database::fetch_all`],
//!   [`Database::for_each_row`].
//! - Provide schema helpers ([`SchemaExt`]) that render DDL from
//!   [`TableDefinition`]/[`ColumnDefinition`] and run it.
//! - Make the handle lifecycle explicit: fallible [`Database::open`],
//!   deterministic [`Database::close`].
//!
//! # Architectural Boundaries
//!
//! - Engine errors are passed through as [`Error::Engine`], never retried.
//! - No pooling, migrations, query building or transaction management.
//!
//! ```no_run
//! # async fn demo() -> sqlite_facade::Result<()> {
//! use sqlite_facade::{ColumnDefinition, DataType, Database, DatabaseConfig, SchemaExt, TableDefinition};
//!
//! let db = Database::open(DatabaseConfig::new("app.db")).await?;
//! let users = TableDefinition::new()
//!     .column("id", ColumnDefinition::new(DataType::Integer).primary_key().auto_increment())
//!     .column("name", ColumnDefinition::new(DataType::Text).not_null());
//! db.create_table("users", &users).await?;
//! let run = db.execute("INSERT INTO users(name) VALUES (?)", ["ada"]).await?;
//! assert_eq!(run.changes, 1);
//! db.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod ddl;
pub mod error;
pub mod executor;
pub mod schema;
pub mod sqlite;
pub mod value;

pub use config::{DatabaseConfig, OpenMode};
pub use error::{Error, Result};
pub use executor::{Executor, RunResult, SchemaExt};
pub use schema::{
    ColumnDefinition, ColumnInfo, DataType, DefaultValue, ForeignKeyAction, Reference,
    TableDefinition, TableListEntry,
};
pub use sqlite::{Database, RowStream};
pub use value::{Params, Row, Value};

/// Database Module
///
/// This module provides the database layer for sqlbridge, organized into
/// focused submodules.
///
/// ## Architecture
///
/// - **Connection Management** (`connection.rs`): connection parameters, the
///   `Driver`/`Connection` seam, and the scoped `Session`
/// - **Query Construction** (`query.rs`): identifier validation and
///   parameterized statement building
/// - **Dialects** (`dialect.rs`): quoting and introspection statements per backend
/// - **Schema Introspection** (`schema.rs`): table lists, column and index metadata
/// - **Result Mapping** (`rows.rs`): raw rows to ordered records
/// - **Backends** (`sqlite.rs`, `mysql.rs`)
///
/// ## Error Handling
///
/// All database operations return `DataError`, already classified into the
/// connection/execution/empty-input taxonomy by the backend that raised it.
pub mod connection;
pub mod dialect;
pub mod query;
pub mod rows;
pub mod schema;
pub mod sqlite;

#[cfg(feature = "mysql")]
pub mod mysql;

pub use connection::{Connection, ConnectionParams, Driver, Session};
pub use dialect::Dialect;
pub use query::{Aggregate, Ident, QueryBuilder, SortDirection, Statement, StatementType};
pub use rows::{GroupedData, RawRows, ResultMapper};
pub use schema::{fold_indexes, ColumnDescriptor, IndexEntry, IndexSpec, Schema, SchemaInspector, TableDescription};
pub use sqlite::SqliteDriver;

#[cfg(feature = "mysql")]
pub use mysql::MySqlDriver;

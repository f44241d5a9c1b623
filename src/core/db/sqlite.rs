//! SQLite backend built on rusqlite.
//!
//! `ConnectionParams::database` is the path of the database file. The
//! server-oriented fields (host, user, password, port) do not apply.
use crate::config::SqliteConfig;
use crate::core::db::connection::{Connection, ConnectionParams, Driver};
use crate::core::db::dialect::Dialect;
use crate::core::db::rows::RawRows;
use crate::core::{DataError, Result, Value};
use rusqlite::ffi::ErrorCode;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, OpenFlags};
use std::time::Duration;
use tracing::debug;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

fn value_from_ref(value: ValueRef) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

/// Errors that mean the database itself is unusable rather than the statement.
fn classify(e: rusqlite::Error) -> DataError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if matches!(
                err.code,
                ErrorCode::CannotOpen
                    | ErrorCode::NotADatabase
                    | ErrorCode::PermissionDenied
                    | ErrorCode::SystemIoFailure
                    | ErrorCode::DatabaseCorrupt
            ) =>
        {
            DataError::connection(e.to_string())
        }
        _ => DataError::execution(e.to_string()),
    }
}

pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl Connection for SqliteConnection {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<RawRows> {
        let mut stmt = self.conn.prepare(sql).map_err(classify)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = stmt.column_count();

        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    values.push(value_from_ref(row.get_ref(i)?));
                }
                Ok(values)
            })
            .map_err(classify)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(classify)?;

        Ok(RawRows::new(columns, rows))
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        self.conn
            .execute(sql, params_from_iter(params.iter()))
            .map(|n| n as u64)
            .map_err(classify)
    }

    fn commit(&mut self) -> Result<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT").map_err(classify)?;
        }
        Ok(())
    }

    fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| DataError::connection(e.to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SqliteDriver {
    config: SqliteConfig,
}

impl SqliteDriver {
    pub fn new(config: SqliteConfig) -> Self {
        SqliteDriver { config }
    }
}

impl Driver for SqliteDriver {
    type Conn = SqliteConnection;

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn connect(&self, params: &ConnectionParams) -> Result<SqliteConnection> {
        if params.database.is_empty() {
            return Err(DataError::connection("No database path given"));
        }
        if !params.host.is_empty() || !params.user.is_empty() {
            debug!("Host, user, password and port do not apply to SQLite and are ignored");
        }

        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.config.create_if_missing {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }

        let conn = rusqlite::Connection::open_with_flags(&params.database, flags).map_err(|e| {
            DataError::connection(format!("Cannot open database '{}': {}", params.database, e))
        })?;

        // Opening is lazy; reading the header is what rejects non-database files.
        conn.query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
            .map_err(|e| {
                DataError::connection(format!("Cannot open database '{}': {}", params.database, e))
            })?;

        conn.pragma_update(None, "foreign_keys", self.config.foreign_keys)
            .map_err(|e| DataError::connection(e.to_string()))?;
        conn.busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))
            .map_err(|e| DataError::connection(e.to_string()))?;

        Ok(SqliteConnection { conn })
    }
}

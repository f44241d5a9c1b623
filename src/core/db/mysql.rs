//! MySQL backend built on SQLx.
//!
//! SQLx is async; each call is driven to completion with `smol::block_on`
//! so the backend presents the same blocking contract as SQLite.

use crate::core::db::connection::{Connection, ConnectionParams, Driver};
use crate::core::db::dialect::Dialect;
use crate::core::db::rows::RawRows;
use crate::core::{DataError, Result, Value};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnectOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, Connection as _, Executor, Row, TypeInfo, ValueRef};

fn classify(e: sqlx::Error) -> DataError {
    match &e {
        sqlx::Error::Database(db) => DataError::execution(db.to_string()),
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => DataError::connection(e.to_string()),
        _ => DataError::execution(e.to_string()),
    }
}

fn bind<'q>(query: Query<'q, MySql, MySqlArguments>, value: &'q Value) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Integer(i) => query.bind(*i),
        Value::Real(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.as_str()),
        Value::Blob(b) => query.bind(b.as_slice()),
    }
}

fn prepared<'q>(sql: &'q str, params: &'q [Value]) -> Query<'q, MySql, MySqlArguments> {
    params.iter().fold(sqlx::query(sql), bind)
}

/// Decodes one cell by its MySQL type name.
fn decode(row: &MySqlRow, index: usize) -> Value {
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Err(_) => return Value::Null,
        _ => {}
    }

    let type_name = row.columns()[index].type_info().name().to_string();
    let decoded = match type_name.as_str() {
        "BOOLEAN" => row.try_get::<bool, _>(index).map(Value::from).ok(),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<i64, _>(index).map(Value::Integer).ok()
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row.try_get::<u64, _>(index).ok().map(|v| match i64::try_from(v) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Text(v.to_string()),
        }),
        "FLOAT" => row.try_get::<f32, _>(index).map(|f| Value::Real(f as f64)).ok(),
        "DOUBLE" => row.try_get::<f64, _>(index).map(Value::Real).ok(),
        "DECIMAL" => row
            .try_get::<Decimal, _>(index)
            .ok()
            .map(|d| d.to_f64().map(Value::Real).unwrap_or_else(|| Value::Text(d.to_string()))),
        "DATE" => row
            .try_get::<chrono::NaiveDate, _>(index)
            .map(|d| Value::Text(d.to_string()))
            .ok(),
        "DATETIME" => row
            .try_get::<chrono::NaiveDateTime, _>(index)
            .map(|d| Value::Text(d.to_string()))
            .ok(),
        "TIMESTAMP" => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(index)
            .map(|d| Value::Text(d.to_rfc3339()))
            .ok(),
        "TIME" => row
            .try_get::<chrono::NaiveTime, _>(index)
            .map(|t| Value::Text(t.to_string()))
            .ok(),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => row.try_get::<Vec<u8>, _>(index).map(Value::Blob).ok(),
        _ => row.try_get::<String, _>(index).map(Value::Text).ok(),
    };

    decoded
        .or_else(|| row.try_get::<Vec<u8>, _>(index).map(Value::Blob).ok())
        .unwrap_or(Value::Null)
}

fn raw_rows(rows: Vec<MySqlRow>) -> RawRows {
    let columns = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();
    let rows = rows
        .iter()
        .map(|row| (0..row.columns().len()).map(|i| decode(row, i)).collect())
        .collect();
    RawRows::new(columns, rows)
}

pub struct MySqlConnection {
    conn: sqlx::mysql::MySqlConnection,
}

impl Connection for MySqlConnection {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<RawRows> {
        let rows = smol::block_on(async {
            if params.is_empty() {
                // Text protocol: some statements (SHOW, DESCRIBE) are not preparable everywhere.
                (&mut self.conn).fetch_all(sql).await
            } else {
                prepared(sql, params).fetch_all(&mut self.conn).await
            }
        })
        .map_err(classify)?;
        Ok(raw_rows(rows))
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        let result = smol::block_on(async {
            if params.is_empty() {
                Executor::execute(&mut self.conn, sql).await
            } else {
                prepared(sql, params).execute(&mut self.conn).await
            }
        })
        .map_err(classify)?;
        Ok(result.rows_affected())
    }

    fn commit(&mut self) -> Result<()> {
        // SQLx connections run in autocommit mode; nothing is pending.
        Ok(())
    }

    fn close(self) -> Result<()> {
        smol::block_on(self.conn.close()).map_err(|e| DataError::connection(e.to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MySqlDriver;

impl MySqlDriver {
    pub fn new() -> Self {
        MySqlDriver
    }

    fn connect_options(params: &ConnectionParams) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.user)
            .password(&params.password)
            .database(&params.database)
    }
}

impl Driver for MySqlDriver {
    type Conn = MySqlConnection;

    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn connect(&self, params: &ConnectionParams) -> Result<MySqlConnection> {
        let options = Self::connect_options(params);
        // Every failure here (auth, network, unknown database) is a connection failure.
        let conn = smol::block_on(sqlx::mysql::MySqlConnection::connect_with(&options)).map_err(|e| {
            DataError::connection(format!(
                "Cannot connect to MySQL database '{}' at {}:{}: {}",
                params.database, params.host, params.port, e
            ))
        })?;
        Ok(MySqlConnection { conn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_host_is_connection_failure() {
        let params = ConnectionParams::new("127.0.0.1", "root", "pw", "app").with_port(1);
        let result = MySqlDriver::new().connect(&params);
        assert!(matches!(result, Err(DataError::Connection(_))));
    }

    #[test]
    fn test_database_errors_are_execution_failures() {
        let err = classify(sqlx::Error::RowNotFound);
        assert!(matches!(err, DataError::Execution(_)));
        let err = classify(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DataError::Connection(_)));
    }
}

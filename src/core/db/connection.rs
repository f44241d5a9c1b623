/// Connection Management Module
///
/// Every operation opens its own connection, uses it for one statement (or a
/// short fixed sequence), and releases it before returning. Nothing is pooled
/// or cached between calls. [`Session`] is the scoped handle that makes the
/// release unconditional: dropping it closes the connection on every exit
/// path, including `?` early returns.

use crate::core::db::dialect::Dialect;
use crate::core::db::rows::RawRows;
use crate::core::{DataError, Result, Value};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, warn};

/// Default MySQL port used when none is supplied.
pub const DEFAULT_PORT: u16 = 3306;

/// Identifies one target server and database. Supplied fresh on every call.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionParams {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ConnectionParams {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        ConnectionParams {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
            port: DEFAULT_PORT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

// Passwords must never reach the logs.
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("port", &self.port)
            .finish()
    }
}

/// A live connection as exposed by a driver.
///
/// Values are always bound positionally: `params[i]` fills the i-th `?`.
pub trait Connection {
    /// Executes a statement and fetches every row it yields.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<RawRows>;

    /// Executes a statement that yields no rows, returning the affected row count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Commits pending work. A no-op when the connection is in autocommit mode.
    fn commit(&mut self) -> Result<()>;

    /// Closes the connection.
    fn close(self) -> Result<()>;
}

/// Opens connections for one backend.
pub trait Driver {
    type Conn: Connection;

    /// SQL dialect spoken by connections from this driver.
    fn dialect(&self) -> Dialect;

    /// Opens a connection. Authentication failures, unreachable hosts and
    /// unknown databases all surface as `DataError::Connection`.
    fn connect(&self, params: &ConnectionParams) -> Result<Self::Conn>;
}

/// Scoped connection owned by exactly one operation.
///
/// The connection is closed when the session is dropped; [`Session::finish`]
/// closes it eagerly and reports close errors.
pub struct Session<C: Connection> {
    conn: Option<C>,
    dialect: Dialect,
    database: String,
}

impl<C: Connection> Session<C> {
    /// Acquires a connection from the driver. One failed attempt is final.
    pub fn acquire<D>(driver: &D, params: &ConnectionParams) -> Result<Self>
    where
        D: Driver<Conn = C>,
    {
        let conn = driver.connect(params)?;
        debug!(database = %params.database, "Connection opened");
        Ok(Session {
            conn: Some(conn),
            dialect: driver.dialect(),
            database: params.database.clone(),
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn query(&mut self, sql: &str, params: &[Value]) -> Result<RawRows> {
        debug!(sql, params = params.len(), "Executing query");
        self.conn_mut()?.query(sql, params)
    }

    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        debug!(sql, params = params.len(), "Executing statement");
        let affected = self.conn_mut()?.execute(sql, params)?;
        debug!(affected, "Statement executed");
        Ok(affected)
    }

    pub fn commit(&mut self) -> Result<()> {
        self.conn_mut()?.commit()
    }

    /// Closes the connection now, surfacing any close error.
    pub fn finish(mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => {
                debug!(database = %self.database, "Connection closed");
                conn.close()
            }
            None => Ok(()),
        }
    }

    fn conn_mut(&mut self) -> Result<&mut C> {
        self.conn
            .as_mut()
            .ok_or_else(|| DataError::connection("Connection already closed"))
    }
}

impl<C: Connection> Drop for Session<C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            match conn.close() {
                Ok(()) => debug!(database = %self.database, "Connection closed"),
                Err(e) => warn!(database = %self.database, "Error while closing connection: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Connection double that records whether it was closed.
    struct TrackingConnection {
        closed: Rc<Cell<u32>>,
        fail_queries: bool,
    }

    impl Connection for TrackingConnection {
        fn query(&mut self, _sql: &str, _params: &[Value]) -> Result<RawRows> {
            if self.fail_queries {
                return Err(DataError::execution("boom"));
            }
            Ok(RawRows::default())
        }

        fn execute(&mut self, _sql: &str, _params: &[Value]) -> Result<u64> {
            Ok(0)
        }

        fn commit(&mut self) -> Result<()> {
            Ok(())
        }

        fn close(self) -> Result<()> {
            self.closed.set(self.closed.get() + 1);
            Ok(())
        }
    }

    struct TrackingDriver {
        closed: Rc<Cell<u32>>,
        fail_queries: bool,
        refuse: bool,
    }

    impl Driver for TrackingDriver {
        type Conn = TrackingConnection;

        fn dialect(&self) -> Dialect {
            Dialect::Sqlite
        }

        fn connect(&self, _params: &ConnectionParams) -> Result<TrackingConnection> {
            if self.refuse {
                return Err(DataError::connection("refused"));
            }
            Ok(TrackingConnection {
                closed: self.closed.clone(),
                fail_queries: self.fail_queries,
            })
        }
    }

    fn params() -> ConnectionParams {
        ConnectionParams::new("localhost", "root", "secret", "app")
    }

    fn run_failing(driver: &TrackingDriver) -> Result<RawRows> {
        let mut session = Session::acquire(driver, &params())?;
        let rows = session.query("SELECT 1", &[])?;
        session.finish()?;
        Ok(rows)
    }

    #[test]
    fn test_session_closes_on_error_path() {
        let closed = Rc::new(Cell::new(0));
        let driver = TrackingDriver { closed: closed.clone(), fail_queries: true, refuse: false };
        assert!(run_failing(&driver).is_err());
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn test_session_closes_once_on_success() {
        let closed = Rc::new(Cell::new(0));
        let driver = TrackingDriver { closed: closed.clone(), fail_queries: false, refuse: false };
        assert!(run_failing(&driver).is_ok());
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn test_failed_acquire_is_connection_failure() {
        let closed = Rc::new(Cell::new(0));
        let driver = TrackingDriver { closed: closed.clone(), fail_queries: false, refuse: true };
        let err = run_failing(&driver).unwrap_err();
        assert!(matches!(err, DataError::Connection(_)));
        assert_eq!(closed.get(), 0);
    }

    #[test]
    fn test_params_debug_redacts_password() {
        let rendered = format!("{:?}", params());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("3306"));
    }

    #[test]
    fn test_params_deserialize_default_port() {
        let p: ConnectionParams = serde_json::from_str(
            r#"{"host":"db","user":"u","password":"p","database":"shop"}"#,
        )
        .unwrap();
        assert_eq!(p.port, DEFAULT_PORT);
    }
}

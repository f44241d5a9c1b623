//! Operation surface consumed by the dispatch layer.
//!
//! Each method on [`Database`] is one self-contained operation: it builds
//! its statement, opens a connection, runs the statement, shapes the result,
//! and closes the connection before returning. Statements are built before
//! the connection is opened, so rejected input never reaches the server.

mod ddl;
mod introspect;
mod reads;
mod writes;

use crate::config::{Config, IdentifierPolicy};
use crate::core::db::connection::{ConnectionParams, Driver, Session};
use crate::core::db::query::{QueryBuilder, Statement};
use crate::core::db::rows::RawRows;
use crate::core::db::schema::SchemaInspector;
use crate::core::db::sqlite::SqliteDriver;
use crate::core::{DataError, Result};

#[cfg(feature = "mysql")]
use crate::core::db::mysql::MySqlDriver;

pub struct Database<D: Driver> {
    driver: D,
    policy: IdentifierPolicy,
}

impl Database<SqliteDriver> {
    pub fn sqlite(config: &Config) -> Self {
        Database::new(SqliteDriver::new(config.sqlite.clone())).with_policy(config.safety.identifier_policy)
    }
}

#[cfg(feature = "mysql")]
impl Database<MySqlDriver> {
    pub fn mysql(config: &Config) -> Self {
        Database::new(MySqlDriver::new()).with_policy(config.safety.identifier_policy)
    }
}

impl<D: Driver> Database<D> {
    pub fn new(driver: D) -> Self {
        Database {
            driver,
            policy: IdentifierPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> IdentifierPolicy {
        self.policy
    }

    fn builder(&self) -> QueryBuilder {
        QueryBuilder::new(self.driver.dialect())
    }

    fn open(&self, params: &ConnectionParams) -> Result<Session<D::Conn>> {
        Session::acquire(&self.driver, params)
    }

    /// Under the schema policy, rejects tables the server does not know.
    fn check_table(&self, session: &mut Session<D::Conn>, table: &str) -> Result<()> {
        if self.policy == IdentifierPolicy::Schema && !SchemaInspector::new(session).table_exists(table)? {
            return Err(DataError::execution(format!("Unknown table '{}'", table)));
        }
        Ok(())
    }

    /// Runs one read statement against `table`.
    fn fetch(&self, params: &ConnectionParams, table: &str, stmt: Statement) -> Result<RawRows> {
        let mut session = self.open(params)?;
        self.check_table(&mut session, table)?;
        let raw = session.query(&stmt.sql, &stmt.params)?;
        session.finish()?;
        Ok(raw)
    }

    /// Runs one mutating statement and commits it.
    fn apply(&self, params: &ConnectionParams, table: Option<&str>, stmt: Statement) -> Result<u64> {
        let mut session = self.open(params)?;
        if let Some(table) = table {
            self.check_table(&mut session, table)?;
        }
        let affected = session.execute(&stmt.sql, &stmt.params)?;
        session.commit()?;
        session.finish()?;
        Ok(affected)
    }
}

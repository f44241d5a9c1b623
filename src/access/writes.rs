use super::Database;
use crate::core::db::connection::{ConnectionParams, Driver};
use crate::core::{Record, Result};
use tracing::{debug, info};

impl<D: Driver> Database<D> {
    /// Inserts one row. An empty row inserts the table's column defaults.
    pub fn insert_row(&self, params: &ConnectionParams, table: &str, row: &Record) -> Result<()> {
        let stmt = self.builder().insert(table, row)?;
        let affected = self.apply(params, Some(table), stmt)?;
        debug!("Insert into '{}' affected {} rows", table, affected);
        info!("Inserted row into table '{}'", table);
        Ok(())
    }

    /// Inserts every row with a single statement.
    ///
    /// # Errors
    ///
    /// `DataError::EmptyInput` when `rows` is empty. No connection is opened
    /// in that case.
    pub fn insert_multiple_rows(&self, params: &ConnectionParams, table: &str, rows: &[Record]) -> Result<()> {
        let stmt = self.builder().insert_many(table, rows)?;
        let affected = self.apply(params, Some(table), stmt)?;
        info!("Inserted {} rows into table '{}'", affected, table);
        Ok(())
    }

    /// Sets `data` on every row matching all of `conditions`. Matching no row
    /// is still a success.
    pub fn update_rows(&self, params: &ConnectionParams, table: &str, data: &Record, conditions: &Record) -> Result<()> {
        let stmt = self.builder().update(table, data, conditions)?;
        let affected = self.apply(params, Some(table), stmt)?;
        info!("Updated {} rows in table '{}'", affected, table);
        Ok(())
    }

    pub fn delete_rows(&self, params: &ConnectionParams, table: &str, conditions: &Record) -> Result<()> {
        let stmt = self.builder().delete(table, conditions)?;
        let affected = self.apply(params, Some(table), stmt)?;
        info!("Deleted {} rows from table '{}'", affected, table);
        Ok(())
    }
}

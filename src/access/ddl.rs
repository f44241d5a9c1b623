use super::Database;
use crate::core::db::connection::{ConnectionParams, Driver};
use crate::core::Result;
use std::collections::HashMap;
use tracing::info;

impl<D: Driver> Database<D> {
    /// Creates `table` with `columns` in the given order. `options` maps a
    /// column name to a modifier appended after its type.
    pub fn create_table(
        &self,
        params: &ConnectionParams,
        table: &str,
        columns: &[(String, String)],
        options: &HashMap<String, String>,
    ) -> Result<()> {
        let stmt = self.builder().create_table(table, columns, options)?;
        self.apply(params, None, stmt)?;
        info!("Table '{}' created with {} columns", table, columns.len());
        Ok(())
    }

    /// Drops `table`. Dropping a table that does not exist succeeds.
    pub fn drop_table(&self, params: &ConnectionParams, table: &str) -> Result<()> {
        let stmt = self.builder().drop_table(table)?;
        self.apply(params, None, stmt)?;
        info!("Table '{}' dropped", table);
        Ok(())
    }

    pub fn create_index(
        &self,
        params: &ConnectionParams,
        table: &str,
        index_name: &str,
        columns: &[String],
        unique: bool,
    ) -> Result<()> {
        let stmt = self.builder().create_index(table, index_name, columns, unique)?;
        self.apply(params, Some(table), stmt)?;
        info!("Index '{}' created on table '{}'", index_name, table);
        Ok(())
    }
}

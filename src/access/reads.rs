use super::Database;
use crate::core::db::connection::{ConnectionParams, Driver};
use crate::core::db::query::{Aggregate, SortDirection, StatementType};
use crate::core::db::rows::{GroupedData, ResultMapper};
use crate::core::{DataError, Record, Result, Value};
use tracing::{debug, info};

impl<D: Driver> Database<D> {
    pub fn get_all_rows(&self, params: &ConnectionParams, table: &str) -> Result<Vec<Record>> {
        let stmt = self.builder().select_all(table)?;
        let rows = ResultMapper::records(self.fetch(params, table, stmt)?);
        log_rows(table, rows.len());
        Ok(rows)
    }

    /// Rows whose columns equal every entry of `filters`. An empty filter
    /// returns the whole table; a filter that matches nothing returns an
    /// empty vector.
    pub fn get_filtered_rows(&self, params: &ConnectionParams, table: &str, filters: &Record) -> Result<Vec<Record>> {
        let stmt = self.builder().select_filtered(table, filters)?;
        let rows = ResultMapper::records(self.fetch(params, table, stmt)?);
        log_rows(table, rows.len());
        Ok(rows)
    }

    pub fn get_sorted_rows(
        &self,
        params: &ConnectionParams,
        table: &str,
        sort_by: &str,
        direction: SortDirection,
    ) -> Result<Vec<Record>> {
        let stmt = self.builder().select_sorted(table, sort_by, direction)?;
        let rows = ResultMapper::records(self.fetch(params, table, stmt)?);
        log_rows(table, rows.len());
        Ok(rows)
    }

    pub fn get_limited_rows(&self, params: &ConnectionParams, table: &str, limit: u64, offset: u64) -> Result<Vec<Record>> {
        let stmt = self.builder().select_limited(table, limit, offset)?;
        let rows = ResultMapper::records(self.fetch(params, table, stmt)?);
        log_rows(table, rows.len());
        Ok(rows)
    }

    pub fn get_distinct_values(&self, params: &ConnectionParams, table: &str, column: &str) -> Result<Vec<Value>> {
        let stmt = self.builder().select_distinct(table, column)?;
        let values = ResultMapper::first_column(self.fetch(params, table, stmt)?);
        info!("Retrieved {} distinct values of '{}' from table '{}'", values.len(), column, table);
        Ok(values)
    }

    /// Single aggregate over the whole table. COUNT of an empty table is 0;
    /// the other functions yield NULL there.
    pub fn get_aggregated_data(
        &self,
        params: &ConnectionParams,
        table: &str,
        function: Aggregate,
        column: &str,
    ) -> Result<Value> {
        let stmt = self.builder().aggregate(table, function, column)?;
        let value = ResultMapper::scalar(self.fetch(params, table, stmt)?);
        info!("{} of '{}' in table '{}' is {}", function.name(), column, table, value);
        Ok(value)
    }

    pub fn get_grouped_data(
        &self,
        params: &ConnectionParams,
        table: &str,
        group_by: &str,
        function: Aggregate,
        column: &str,
    ) -> Result<GroupedData> {
        let stmt = self.builder().grouped(table, group_by, function, column)?;
        let grouped = ResultMapper::grouped(self.fetch(params, table, stmt)?)?;
        info!("Retrieved {} groups of '{}' from table '{}'", grouped.len(), group_by, table);
        Ok(grouped)
    }

    /// Runs caller-supplied SQL as-is. Mutating statements are committed.
    /// Statements that produce no rows return an empty vector.
    pub fn execute_custom_query(&self, params: &ConnectionParams, sql: &str) -> Result<Vec<Record>> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(DataError::execution("Cannot execute empty SQL query"));
        }
        let statement_type = StatementType::from_sql(sql);

        let mut session = self.open(params)?;
        let raw = session.query(sql, &[])?;
        if statement_type.is_mutation() {
            session.commit()?;
        }
        session.finish()?;

        let rows = ResultMapper::records(raw);
        info!("Custom {:?} statement returned {} rows", statement_type, rows.len());
        Ok(rows)
    }
}

fn log_rows(table: &str, count: usize) {
    if count == 0 {
        debug!("No rows returned from table '{}'", table);
    } else {
        info!("Retrieved {} rows from table '{}'", count, table);
    }
}

use super::Database;
use crate::core::db::connection::{ConnectionParams, Driver};
use crate::core::db::query::Ident;
use crate::core::db::schema::{IndexEntry, Schema, SchemaInspector, TableDescription};
use crate::core::Result;
use tracing::info;

impl<D: Driver> Database<D> {
    /// Table names in server order (not necessarily alphabetical).
    pub fn list_tables(&self, params: &ConnectionParams) -> Result<Vec<String>> {
        let mut session = self.open(params)?;
        let tables = SchemaInspector::new(&mut session).list_tables()?;
        session.finish()?;

        if tables.is_empty() {
            info!("No tables inside database: '{}'", params.database);
        } else {
            info!("Retrieved {} tables from database '{}'", tables.len(), params.database);
        }
        Ok(tables)
    }

    /// Every table with its columns. Fails as a whole if any table cannot be
    /// described; never returns a partial schema.
    pub fn get_schema(&self, params: &ConnectionParams) -> Result<Schema> {
        let mut session = self.open(params)?;
        let schema = SchemaInspector::new(&mut session).schema()?;
        session.finish()?;

        info!("Schema retrieval completed for database '{}'", params.database);
        Ok(schema)
    }

    pub fn get_table_description(&self, params: &ConnectionParams, table: &str) -> Result<TableDescription> {
        Ident::parse(table)?;
        let mut session = self.open(params)?;
        let description = SchemaInspector::new(&mut session).describe(table)?;
        session.finish()?;

        info!("Description fetched for table '{}'", table);
        Ok(description)
    }

    /// One entry per indexed column, as the server reports them.
    /// Use [`fold_indexes`](crate::core::db::schema::fold_indexes) for one entry per index.
    pub fn show_indexes(&self, params: &ConnectionParams, table: &str) -> Result<Vec<IndexEntry>> {
        Ident::parse(table)?;
        let mut session = self.open(params)?;
        let entries = SchemaInspector::new(&mut session).indexes(table)?;
        session.finish()?;

        info!("Retrieved {} index entries from table '{}'", entries.len(), table);
        Ok(entries)
    }
}

/// Schema Introspection Module
///
/// Reads table lists, column metadata and index metadata from the live
/// server and normalizes them into driver-neutral types. Nothing here is
/// cached: every call reflects the server's state at that moment.

use crate::core::db::connection::{Connection, Session};
use crate::core::db::query::Ident;
use crate::core::db::rows::ResultMapper;
use crate::core::{DataError, Result, Value};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

/// Represents a table column with its metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// Type as declared on the server (e.g., "INTEGER", "varchar(50)")
    pub data_type: String,
    /// Whether the column allows NULL values
    pub nullable: bool,
    /// Default value as reported by the server, if any
    pub default: Option<Value>,
    /// Whether this column is part of the primary key
    pub primary_key: bool,
    /// Server-specific extras such as `auto_increment`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

/// Columns of one table in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescription {
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
}

// Serialized as `{ "<table>": [columns...] }`.
impl Serialize for TableDescription {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.table, &self.columns)?;
        map.end()
    }
}

/// Every table of a database, in the order the server listed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub tables: Vec<TableDescription>,
}

impl Schema {
    pub fn table(&self, name: &str) -> Option<&TableDescription> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.table.as_str())
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for table in &self.tables {
            map.serialize_entry(&table.table, &table.columns)?;
        }
        map.end()
    }
}

/// One row of index metadata. A composite index yields one entry per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    pub table: String,
    /// Index name
    pub name: String,
    /// Indexed column; `None` for expression indexes
    pub column: Option<String>,
    /// 1-based position of the column within the index
    pub sequence: i64,
    pub unique: bool,
}

/// A logical index: name, ordered columns, uniqueness.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSpec {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

/// Folds per-column index entries into one [`IndexSpec`] per index name,
/// keeping the order in which index names first appear.
pub fn fold_indexes(entries: &[IndexEntry]) -> Vec<IndexSpec> {
    let mut specs: Vec<(IndexSpec, Vec<(i64, String)>)> = Vec::new();
    for entry in entries {
        let slot = match specs.iter().position(|(spec, _)| spec.name == entry.name) {
            Some(pos) => pos,
            None => {
                specs.push((
                    IndexSpec {
                        name: entry.name.clone(),
                        columns: Vec::new(),
                        unique: entry.unique,
                    },
                    Vec::new(),
                ));
                specs.len() - 1
            }
        };
        if let Some(column) = &entry.column {
            specs[slot].1.push((entry.sequence, column.clone()));
        }
    }

    specs
        .into_iter()
        .map(|(mut spec, mut columns)| {
            columns.sort_by_key(|(seq, _)| *seq);
            spec.columns = columns.into_iter().map(|(_, c)| c).collect();
            spec
        })
        .collect()
}

/// Introspection over an open session.
pub struct SchemaInspector<'s, C: Connection> {
    session: &'s mut Session<C>,
}

impl<'s, C: Connection> SchemaInspector<'s, C> {
    pub fn new(session: &'s mut Session<C>) -> Self {
        SchemaInspector { session }
    }

    /// Table names in server order.
    pub fn list_tables(&mut self) -> Result<Vec<String>> {
        let stmt = self.session.dialect().list_tables();
        let raw = self.session.query(&stmt.sql, &stmt.params)?;
        // Whatever the column is called, the table name is the first one.
        Ok(raw
            .rows
            .into_iter()
            .filter_map(|row| row.into_iter().next().and_then(|v| v.to_text()))
            .collect())
    }

    pub fn table_exists(&mut self, table: &str) -> Result<bool> {
        Ok(self.list_tables()?.iter().any(|t| t == table))
    }

    /// Column metadata for one caller-named table. A missing table is an
    /// execution failure.
    pub fn describe(&mut self, table: &str) -> Result<TableDescription> {
        Ident::parse(table)?;
        self.describe_listed(table)
    }

    /// Describes a table name taken from [`list_tables`](Self::list_tables).
    /// Such names may be anything the server allows.
    fn describe_listed(&mut self, table: &str) -> Result<TableDescription> {
        let dialect = self.session.dialect();
        let stmt = dialect.describe(table);
        let rows = ResultMapper::records(self.session.query(&stmt.sql, &stmt.params)?);

        let columns = rows
            .iter()
            .map(|row| dialect.column_from_row(row))
            .collect::<Result<Vec<_>>>()?;

        if columns.is_empty() {
            return Err(DataError::execution(format!("no such table: {}", table)));
        }

        Ok(TableDescription {
            table: table.to_string(),
            columns,
        })
    }

    /// Lists tables, then describes each. Fails as a whole if any step fails.
    pub fn schema(&mut self) -> Result<Schema> {
        let names = self.list_tables()?;
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            debug!(table = %name, "Describing table");
            tables.push(self.describe_listed(&name)?);
        }
        Ok(Schema { tables })
    }

    /// Index metadata, one entry per indexed column.
    pub fn indexes(&mut self, table: &str) -> Result<Vec<IndexEntry>> {
        let ident = Ident::parse(table)?;
        let dialect = self.session.dialect();
        if !dialect.reports_missing_tables() && !self.table_exists(table)? {
            return Err(DataError::execution(format!("no such table: {}", table)));
        }
        let stmt = dialect.show_indexes(&ident);
        let rows = ResultMapper::records(self.session.query(&stmt.sql, &stmt.params)?);
        rows.iter()
            .map(|row| dialect.index_entry_from_row(table, row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, column: &str, sequence: i64, unique: bool) -> IndexEntry {
        IndexEntry {
            table: "users".to_string(),
            name: name.to_string(),
            column: Some(column.to_string()),
            sequence,
            unique,
        }
    }

    #[test]
    fn test_fold_indexes_groups_by_name() {
        let entries = vec![
            entry("PRIMARY", "id", 1, true),
            entry("idx_full", "last", 2, false),
            entry("idx_full", "first", 1, false),
            entry("idx_email", "email", 1, true),
        ];
        let specs = fold_indexes(&entries);
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[1].name, "idx_full");
        assert_eq!(specs[1].columns, vec!["first", "last"]);
        assert!(specs[2].unique);
    }

    #[test]
    fn test_table_description_serialization() {
        let desc = TableDescription {
            table: "users".to_string(),
            columns: vec![ColumnDescriptor {
                name: "id".to_string(),
                data_type: "INTEGER".to_string(),
                nullable: false,
                default: None,
                primary_key: true,
                extra: None,
            }],
        };
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["users"][0]["name"], "id");
        assert_eq!(json["users"][0]["nullable"], false);
        assert!(json["users"][0].get("extra").is_none());
    }
}

/// SQL dialect differences between the supported backends.
///
/// Everything that varies per server lives here: identifier quoting, the
/// statements used for introspection, and how the rows those statements
/// return are normalized into [`ColumnDescriptor`] and [`IndexEntry`].

use crate::core::db::query::{Ident, Statement};
use crate::core::db::schema::{ColumnDescriptor, IndexEntry};
use crate::core::{DataError, Record, Result, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    MySql,
}

impl Dialect {
    pub fn quote(&self, ident: &Ident) -> String {
        self.quote_name(ident.as_str())
    }

    /// Quotes any name, doubling embedded quote characters. Only for names
    /// the server itself reported; caller input goes through [`Ident`].
    pub fn quote_name(&self, name: &str) -> String {
        match self {
            Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
            Dialect::MySql => format!("`{}`", name.replace('`', "``")),
        }
    }

    /// Insert that fills every column with its default.
    pub fn default_values_insert(&self, quoted_table: &str) -> String {
        match self {
            Dialect::Sqlite => format!("INSERT INTO {} DEFAULT VALUES", quoted_table),
            Dialect::MySql => format!("INSERT INTO {} () VALUES ()", quoted_table),
        }
    }

    /// Whether describing or listing indexes of a missing table raises an
    /// error. SQLite's pragma functions just return no rows.
    pub fn reports_missing_tables(&self) -> bool {
        matches!(self, Dialect::MySql)
    }

    pub fn list_tables(&self) -> Statement {
        match self {
            Dialect::Sqlite => Statement::bare(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'",
            ),
            Dialect::MySql => Statement::bare("SHOW TABLES"),
        }
    }

    /// Column metadata statement for a table name already known to exist.
    pub fn describe(&self, table: &str) -> Statement {
        match self {
            Dialect::Sqlite => Statement::new(
                "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?)",
                vec![Value::from(table)],
            ),
            Dialect::MySql => Statement::bare(format!("DESCRIBE {}", self.quote_name(table))),
        }
    }

    pub fn show_indexes(&self, table: &Ident) -> Statement {
        match self {
            Dialect::Sqlite => Statement::new(
                "SELECT il.name AS index_name, il.\"unique\" AS is_unique, \
                 ii.seqno + 1 AS seq_in_index, ii.name AS column_name \
                 FROM pragma_index_list(?) AS il, pragma_index_info(il.name) AS ii \
                 ORDER BY il.seq, ii.seqno",
                vec![Value::from(table.as_str())],
            ),
            Dialect::MySql => Statement::bare(format!("SHOW INDEX FROM {}", self.quote(table))),
        }
    }

    /// Normalizes one row of the `describe` statement.
    pub fn column_from_row(&self, row: &Record) -> Result<ColumnDescriptor> {
        match self {
            Dialect::Sqlite => Ok(ColumnDescriptor {
                name: required_text(row, "name")?,
                data_type: optional_text(row, "type").unwrap_or_default(),
                nullable: !row.get("notnull").map(Value::is_truthy).unwrap_or(false),
                default: optional_text(row, "dflt_value").map(|d| Value::Text(unquote_literal(&d))),
                primary_key: row.get("pk").and_then(Value::as_i64).unwrap_or(0) > 0,
                extra: None,
            }),
            Dialect::MySql => Ok(ColumnDescriptor {
                name: required_text(row, "Field")?,
                data_type: optional_text(row, "Type").unwrap_or_default(),
                nullable: row.get("Null").map(Value::is_truthy).unwrap_or(false),
                default: optional_text(row, "Default").map(Value::Text),
                primary_key: optional_text(row, "Key").as_deref() == Some("PRI"),
                extra: optional_text(row, "Extra").filter(|s| !s.is_empty()),
            }),
        }
    }

    /// Normalizes one row of the `show_indexes` statement.
    pub fn index_entry_from_row(&self, table: &str, row: &Record) -> Result<IndexEntry> {
        match self {
            Dialect::Sqlite => Ok(IndexEntry {
                table: table.to_string(),
                name: required_text(row, "index_name")?,
                column: optional_text(row, "column_name"),
                sequence: row.get("seq_in_index").and_then(Value::as_i64).unwrap_or(1),
                unique: row.get("is_unique").map(Value::is_truthy).unwrap_or(false),
            }),
            Dialect::MySql => Ok(IndexEntry {
                table: optional_text(row, "Table").unwrap_or_else(|| table.to_string()),
                name: required_text(row, "Key_name")?,
                column: optional_text(row, "Column_name"),
                sequence: row.get("Seq_in_index").and_then(Value::as_i64).unwrap_or(1),
                unique: !row.get("Non_unique").map(Value::is_truthy).unwrap_or(true),
            }),
        }
    }
}

fn optional_text(row: &Record, column: &str) -> Option<String> {
    row.get(column).and_then(Value::to_text)
}

fn required_text(row: &Record, column: &str) -> Result<String> {
    optional_text(row, column)
        .ok_or_else(|| DataError::execution(format!("Metadata row is missing '{}'", column)))
}

/// `'it''s'` becomes `it's`. Numbers and expressions such as
/// `CURRENT_TIMESTAMP` are returned as written.
fn unquote_literal(default: &str) -> String {
    let trimmed = default.trim();
    match trimmed.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoting() {
        let id = Ident::parse("users").unwrap();
        assert_eq!(Dialect::Sqlite.quote(&id), "\"users\"");
        assert_eq!(Dialect::MySql.quote(&id), "`users`");
    }

    #[test]
    fn test_mysql_describe_row() {
        let row = Record::new()
            .with("Field", "id")
            .with("Type", Value::Blob(b"int".to_vec()))
            .with("Null", "NO")
            .with("Key", "PRI")
            .with("Default", Value::Null)
            .with("Extra", "auto_increment");
        let col = Dialect::MySql.column_from_row(&row).unwrap();
        assert_eq!(col.name, "id");
        assert_eq!(col.data_type, "int");
        assert!(!col.nullable);
        assert!(col.primary_key);
        assert_eq!(col.default, None);
        assert_eq!(col.extra.as_deref(), Some("auto_increment"));
    }

    #[test]
    fn test_sqlite_describe_row() {
        let row = Record::new()
            .with("name", "status")
            .with("type", "TEXT")
            .with("notnull", 1)
            .with("dflt_value", "'active'")
            .with("pk", 0);
        let col = Dialect::Sqlite.column_from_row(&row).unwrap();
        assert_eq!(col.data_type, "TEXT");
        assert!(!col.nullable);
        assert!(!col.primary_key);
        assert_eq!(col.default, Some(Value::from("active")));
    }

    #[test]
    fn test_sqlite_default_literals() {
        assert_eq!(unquote_literal("'it''s'"), "it's");
        assert_eq!(unquote_literal("''"), "");
        assert_eq!(unquote_literal("7"), "7");
        assert_eq!(unquote_literal("CURRENT_TIMESTAMP"), "CURRENT_TIMESTAMP");
        assert_eq!(unquote_literal("'"), "'");
    }

    #[test]
    fn test_mysql_binary_default_is_text() {
        let row = Record::new()
            .with("Field", "status")
            .with("Type", "varchar(10)")
            .with("Null", "YES")
            .with("Key", "")
            .with("Default", Value::Blob(b"active".to_vec()))
            .with("Extra", "");
        let col = Dialect::MySql.column_from_row(&row).unwrap();
        assert_eq!(col.default, Some(Value::from("active")));
        assert_eq!(col.extra, None);
    }

    #[test]
    fn test_quote_name_escapes() {
        assert_eq!(Dialect::Sqlite.quote_name("order-items"), "\"order-items\"");
        assert_eq!(Dialect::Sqlite.quote_name("a\"b"), "\"a\"\"b\"");
        assert_eq!(Dialect::MySql.quote_name("a`b"), "`a``b`");
    }

    #[test]
    fn test_mysql_index_row() {
        let row = Record::new()
            .with("Table", "users")
            .with("Non_unique", 1)
            .with("Key_name", "idx_name")
            .with("Seq_in_index", 1)
            .with("Column_name", "name");
        let entry = Dialect::MySql.index_entry_from_row("users", &row).unwrap();
        assert_eq!(entry.name, "idx_name");
        assert_eq!(entry.column.as_deref(), Some("name"));
        assert!(!entry.unique);
    }

    #[test]
    fn test_missing_metadata_column() {
        let row = Record::new().with("type", "TEXT");
        assert!(Dialect::Sqlite.column_from_row(&row).is_err());
    }
}

/// Query Construction Module
///
/// Builds parameterized SQL for reads, writes, DDL and aggregation.
///
/// Identifiers (tables, columns, indexes) cannot be bound as parameters, so
/// they are validated against a restrictive character class and then quoted
/// by the dialect before they are written into the SQL text. Values are
/// never interpolated: they always travel in [`Statement::params`], one per
/// `?`, in placeholder order.

use crate::core::db::dialect::Dialect;
use crate::core::{DataError, Record, Result, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Longest identifier accepted; matches the MySQL limit.
pub const MAX_IDENTIFIER_LEN: usize = 64;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("identifier pattern is valid"));

/// Tokens that may not appear in column type or modifier fragments.
const FORBIDDEN_FRAGMENT_TOKENS: &[&str] = &[";", "--", "/*", "*/", "`", "\""];

/// A validated SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    /// Validates a caller-supplied name.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Execution` if the name is empty, too long, or
    /// contains anything outside `[A-Za-z0-9_$]` (or starts with a digit or `$`).
    pub fn parse(name: &str) -> Result<Self> {
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(DataError::execution(format!(
                "Identifier exceeds {} characters: '{}'",
                MAX_IDENTIFIER_LEN, name
            )));
        }
        if !IDENTIFIER_RE.is_match(name) {
            return Err(DataError::execution(format!("Invalid identifier: '{}'", name)));
        }
        Ok(Ident(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks a column type or modifier fragment that is appended verbatim.
fn validate_fragment(fragment: &str, column: &str) -> Result<()> {
    if fragment.trim().is_empty() {
        return Err(DataError::execution(format!("Empty definition for column '{}'", column)));
    }
    if let Some(token) = FORBIDDEN_FRAGMENT_TOKENS.iter().find(|t| fragment.contains(**t)) {
        return Err(DataError::execution(format!(
            "Definition for column '{}' contains forbidden token '{}'",
            column, token
        )));
    }
    Ok(())
}

/// Sort direction for ordered reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(DataError::execution(format!(
                "Invalid sort direction '{}', expected ASC or DESC",
                s
            ))),
        }
    }
}

/// Supported aggregation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    pub fn name(&self) -> &'static str {
        match self {
            Aggregate::Count => "COUNT",
            Aggregate::CountDistinct => "COUNT_DISTINCT",
            Aggregate::Sum => "SUM",
            Aggregate::Avg => "AVG",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }

    fn render(&self, column: &str) -> String {
        match self {
            Aggregate::Count => format!("COUNT({})", column),
            Aggregate::CountDistinct => format!("COUNT(DISTINCT {})", column),
            Aggregate::Sum => format!("SUM({})", column),
            Aggregate::Avg => format!("AVG({})", column),
            Aggregate::Min => format!("MIN({})", column),
            Aggregate::Max => format!("MAX({})", column),
        }
    }
}

impl FromStr for Aggregate {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COUNT" => Ok(Aggregate::Count),
            "COUNT_DISTINCT" => Ok(Aggregate::CountDistinct),
            "SUM" => Ok(Aggregate::Sum),
            "AVG" => Ok(Aggregate::Avg),
            "MIN" => Ok(Aggregate::Min),
            "MAX" => Ok(Aggregate::Max),
            _ => Err(DataError::execution(format!("Unsupported aggregation function '{}'", s))),
        }
    }
}

/// Column alias used for the aggregate in grouped queries.
pub const AGGREGATE_ALIAS: &str = "aggregate";

/// Represents different SQL statement types for introspection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    /// Other statement types (SHOW, PRAGMA, WITH, ...)
    Other,
}

impl StatementType {
    /// Determines the statement type from the leading keyword of a SQL string
    pub fn from_sql(sql: &str) -> Self {
        let keyword = sql
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or("")
            .to_ascii_uppercase();

        match keyword.as_str() {
            "SELECT" => StatementType::Select,
            "INSERT" | "REPLACE" => StatementType::Insert,
            "UPDATE" => StatementType::Update,
            "DELETE" => StatementType::Delete,
            "CREATE" => StatementType::Create,
            "DROP" | "TRUNCATE" => StatementType::Drop,
            "ALTER" => StatementType::Alter,
            _ => StatementType::Other,
        }
    }

    /// Whether the statement changes data or schema and so needs a commit.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, StatementType::Select | StatementType::Other)
    }
}

/// SQL text plus the values for its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Statement { sql: sql.into(), params }
    }

    pub fn bare(sql: impl Into<String>) -> Self {
        Statement::new(sql, Vec::new())
    }

    /// Counts `?` placeholders. Built statements never contain `?` outside
    /// placeholders, since identifiers cannot contain it.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

/// Builds statements for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    dialect: Dialect,
}

impl QueryBuilder {
    pub fn new(dialect: Dialect) -> Self {
        QueryBuilder { dialect }
    }

    fn ident(&self, name: &str) -> Result<String> {
        Ident::parse(name).map(|id| self.dialect.quote(&id))
    }

    /// `<col> = ? AND ...` in record order, pushing values onto `params`.
    fn equality_terms(&self, record: &Record, sep: &str, params: &mut Vec<Value>) -> Result<String> {
        let mut terms = Vec::with_capacity(record.len());
        for (column, value) in record.iter() {
            terms.push(format!("{} = ?", self.ident(column)?));
            params.push(value.clone());
        }
        Ok(terms.join(sep))
    }

    /// `SELECT * FROM <table>`
    pub fn select_all(&self, table: &str) -> Result<Statement> {
        Ok(Statement::bare(format!("SELECT * FROM {}", self.ident(table)?)))
    }

    /// Equality filter, AND-combined. An empty filter selects every row.
    pub fn select_filtered(&self, table: &str, filters: &Record) -> Result<Statement> {
        let mut sql = format!("SELECT * FROM {}", self.ident(table)?);
        let mut params = Vec::with_capacity(filters.len());
        if !filters.is_empty() {
            let clause = self.equality_terms(filters, " AND ", &mut params)?;
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        Ok(Statement::new(sql, params))
    }

    pub fn select_sorted(&self, table: &str, sort_by: &str, direction: SortDirection) -> Result<Statement> {
        Ok(Statement::bare(format!(
            "SELECT * FROM {} ORDER BY {} {}",
            self.ident(table)?,
            self.ident(sort_by)?,
            direction.as_sql()
        )))
    }

    pub fn select_limited(&self, table: &str, limit: u64, offset: u64) -> Result<Statement> {
        let to_param = |n: u64, what: &str| {
            i64::try_from(n)
                .map(Value::Integer)
                .map_err(|_| DataError::execution(format!("{} out of range: {}", what, n)))
        };
        Ok(Statement::new(
            format!("SELECT * FROM {} LIMIT ? OFFSET ?", self.ident(table)?),
            vec![to_param(limit, "Limit")?, to_param(offset, "Offset")?],
        ))
    }

    pub fn select_distinct(&self, table: &str, column: &str) -> Result<Statement> {
        Ok(Statement::bare(format!(
            "SELECT DISTINCT {} FROM {}",
            self.ident(column)?,
            self.ident(table)?
        )))
    }

    /// Renders the aggregate target; `*` is only accepted for COUNT.
    fn aggregate_expr(&self, function: Aggregate, column: &str) -> Result<String> {
        let target = if column == "*" {
            if function != Aggregate::Count {
                return Err(DataError::execution("Only COUNT accepts '*' as its column"));
            }
            "*".to_string()
        } else {
            self.ident(column)?
        };
        Ok(function.render(&target))
    }

    pub fn aggregate(&self, table: &str, function: Aggregate, column: &str) -> Result<Statement> {
        Ok(Statement::bare(format!(
            "SELECT {} FROM {}",
            self.aggregate_expr(function, column)?,
            self.ident(table)?
        )))
    }

    pub fn grouped(&self, table: &str, group_by: &str, function: Aggregate, column: &str) -> Result<Statement> {
        let group = self.ident(group_by)?;
        Ok(Statement::bare(format!(
            "SELECT {group}, {} AS {AGGREGATE_ALIAS} FROM {} GROUP BY {group}",
            self.aggregate_expr(function, column)?,
            self.ident(table)?,
        )))
    }

    /// Single-row insert. An empty row inserts a row of column defaults.
    pub fn insert(&self, table: &str, row: &Record) -> Result<Statement> {
        let table = self.ident(table)?;
        if row.is_empty() {
            return Ok(Statement::bare(self.dialect.default_values_insert(&table)));
        }
        let columns = row.keys().map(|c| self.ident(c)).collect::<Result<Vec<_>>>()?;
        let placeholders = vec!["?"; row.len()].join(", ");
        Ok(Statement::new(
            format!("INSERT INTO {} ({}) VALUES ({})", table, columns.join(", "), placeholders),
            row.values().cloned().collect(),
        ))
    }

    /// One multi-row INSERT for the whole batch.
    ///
    /// # Errors
    ///
    /// `DataError::EmptyInput` for an empty batch; `DataError::Execution` when
    /// a row's columns differ from the first row's (names and order).
    pub fn insert_many(&self, table: &str, rows: &[Record]) -> Result<Statement> {
        let first = rows
            .first()
            .ok_or_else(|| DataError::empty_input(format!("No rows to insert into '{}'", table)))?;
        if first.is_empty() {
            return Err(DataError::execution("Batch rows must name at least one column"));
        }
        if let Some(pos) = rows.iter().position(|r| !r.same_columns(first)) {
            return Err(DataError::execution(format!(
                "Row {} has different columns than the first row",
                pos
            )));
        }

        let table = self.ident(table)?;
        let columns = first.keys().map(|c| self.ident(c)).collect::<Result<Vec<_>>>()?;
        let tuple = format!("({})", vec!["?"; first.len()].join(", "));
        let tuples = vec![tuple.as_str(); rows.len()].join(", ");
        let params = rows.iter().flat_map(|r| r.values().cloned()).collect();

        Ok(Statement::new(
            format!("INSERT INTO {} ({}) VALUES {}", table, columns.join(", "), tuples),
            params,
        ))
    }

    /// Parameters are the data values followed by the condition values.
    pub fn update(&self, table: &str, data: &Record, conditions: &Record) -> Result<Statement> {
        if data.is_empty() {
            return Err(DataError::execution("Update requires at least one column to set"));
        }
        if conditions.is_empty() {
            return Err(DataError::execution("Update requires at least one condition"));
        }
        let table = self.ident(table)?;
        let mut params = Vec::with_capacity(data.len() + conditions.len());
        let set_clause = self.equality_terms(data, ", ", &mut params)?;
        let where_clause = self.equality_terms(conditions, " AND ", &mut params)?;
        Ok(Statement::new(
            format!("UPDATE {} SET {} WHERE {}", table, set_clause, where_clause),
            params,
        ))
    }

    pub fn delete(&self, table: &str, conditions: &Record) -> Result<Statement> {
        if conditions.is_empty() {
            return Err(DataError::execution("Delete requires at least one condition"));
        }
        let table = self.ident(table)?;
        let mut params = Vec::with_capacity(conditions.len());
        let where_clause = self.equality_terms(conditions, " AND ", &mut params)?;
        Ok(Statement::new(format!("DELETE FROM {} WHERE {}", table, where_clause), params))
    }

    /// One definition per `(name, type)` pair, with the column's modifier
    /// from `options` appended verbatim.
    pub fn create_table(
        &self,
        table: &str,
        columns: &[(String, String)],
        options: &HashMap<String, String>,
    ) -> Result<Statement> {
        if columns.is_empty() {
            return Err(DataError::execution(format!("Table '{}' needs at least one column", table)));
        }
        if let Some(orphan) = options.keys().find(|k| !columns.iter().any(|(name, _)| name == *k)) {
            return Err(DataError::execution(format!(
                "Option given for unknown column '{}'",
                orphan
            )));
        }

        let mut definitions = Vec::with_capacity(columns.len());
        for (name, data_type) in columns {
            validate_fragment(data_type, name)?;
            let mut definition = format!("{} {}", self.ident(name)?, data_type.trim());
            if let Some(modifier) = options.get(name) {
                validate_fragment(modifier, name)?;
                definition.push(' ');
                definition.push_str(modifier.trim());
            }
            definitions.push(definition);
        }

        Ok(Statement::bare(format!(
            "CREATE TABLE {} ({})",
            self.ident(table)?,
            definitions.join(", ")
        )))
    }

    pub fn drop_table(&self, table: &str) -> Result<Statement> {
        Ok(Statement::bare(format!("DROP TABLE IF EXISTS {}", self.ident(table)?)))
    }

    pub fn create_index(&self, table: &str, index_name: &str, columns: &[String], unique: bool) -> Result<Statement> {
        if columns.is_empty() {
            return Err(DataError::execution(format!("Index '{}' needs at least one column", index_name)));
        }
        let cols = columns.iter().map(|c| self.ident(c)).collect::<Result<Vec<_>>>()?;
        Ok(Statement::bare(format!(
            "CREATE {}INDEX {} ON {} ({})",
            if unique { "UNIQUE " } else { "" },
            self.ident(index_name)?,
            self.ident(table)?,
            cols.join(", ")
        )))
    }
}

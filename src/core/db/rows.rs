/// Result shaping.
///
/// Drivers hand back [`RawRows`]: column names plus positional values.
/// [`ResultMapper`] turns them into the shapes operations return, always
/// keeping the statement's column order.

use crate::core::{DataError, Record, Result, Value};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

/// Rows exactly as fetched from a driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RawRows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        RawRows { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Aggregates keyed by group value, in server order.
///
/// A NULL group is kept as an entry keyed by [`Value::Null`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedData {
    entries: Vec<(Value, Value)>,
}

impl GroupedData {
    pub fn get(&self, group: &Value) -> Option<&Value> {
        self.entries.iter().find(|(g, _)| g == group).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(g, v)| (g, v))
    }
}

#[derive(Serialize)]
struct GroupEntry<'a> {
    group: &'a Value,
    aggregate: &'a Value,
}

// Serialized as a list of `{group, aggregate}` pairs: group values are not
// necessarily strings, and NULL must not collide with the text "NULL".
impl Serialize for GroupedData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for (group, aggregate) in &self.entries {
            seq.serialize_element(&GroupEntry { group, aggregate })?;
        }
        seq.end()
    }
}

pub struct ResultMapper;

impl ResultMapper {
    /// One [`Record`] per row, fields in statement column order.
    pub fn records(raw: RawRows) -> Vec<Record> {
        let RawRows { columns, rows } = raw;
        rows.into_iter()
            .map(|values| columns.iter().cloned().zip(values).collect())
            .collect()
    }

    /// First column of every row.
    pub fn first_column(raw: RawRows) -> Vec<Value> {
        raw.rows
            .into_iter()
            .map(|row| row.into_iter().next().unwrap_or(Value::Null))
            .collect()
    }

    /// First column of the first row; NULL when there is no row.
    pub fn scalar(raw: RawRows) -> Value {
        raw.rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .unwrap_or(Value::Null)
    }

    /// Reshapes `SELECT <group>, <fn> AS aggregate` rows into [`GroupedData`].
    /// Columns are read by position: the group column may itself be named
    /// `aggregate`.
    pub fn grouped(raw: RawRows) -> Result<GroupedData> {
        let mut entries = Vec::with_capacity(raw.rows.len());
        for row in raw.rows {
            let mut cells = row.into_iter();
            match (cells.next(), cells.next()) {
                (Some(group), Some(aggregate)) => entries.push((group, aggregate)),
                _ => return Err(DataError::execution("Grouped result needs a group and an aggregate column")),
            }
        }
        Ok(GroupedData { entries })
    }
}

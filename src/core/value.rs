/// Value Module
///
/// Driver-neutral cell values and the ordered record type used for result
/// rows, filters, and write payloads.
use crate::core::{DataError, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single SQL value as exchanged with a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Renders the value as text, decoding blobs lossily.
    ///
    /// Servers report some metadata columns (type names, defaults) as
    /// binary strings, so introspection reads them through this.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
        }
    }

    /// Interprets integer and textual flags ("1", "YES", "true") as a boolean.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(i) => *i != 0,
            Value::Real(f) => *f != 0.0,
            Value::Null => false,
            other => matches!(
                other.to_text().map(|s| s.to_ascii_uppercase()).as_deref(),
                Some("1" | "YES" | "TRUE")
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(b) => write!(f, "<BLOB: {} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = DataError;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::from(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Real(f))
                } else {
                    Err(DataError::execution(format!("Number out of range: {}", n)))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            // Blobs serialize as byte arrays, so byte arrays read back as blobs.
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .map(Value::Blob)
                .ok_or_else(|| DataError::execution("Arrays are only accepted as byte values (0-255)")),
            other => Err(DataError::execution(format!(
                "Unsupported value, expected a scalar: {}",
                other
            ))),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => serde_json::Value::from(i),
            Value::Real(f) => serde_json::Value::from(f),
            Value::Text(s) => serde_json::Value::String(s),
            Value::Blob(b) => serde_json::Value::from(b),
        }
    }
}

/// An ordered column-name-to-value record.
///
/// Column order is whatever order entries were inserted in. For result rows
/// that is the statement's column order; for filters and write payloads it
/// is the caller's order, which also fixes placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Record { fields: Vec::new() }
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Inserts a field, replacing the value in place if the column already exists.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns true when both records carry the same column names in the same order.
    pub fn same_columns(&self, other: &Record) -> bool {
        self.keys().eq(other.keys())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of column names to scalar values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Record, A::Error> {
        let mut record = Record::new();
        while let Some((name, value)) = access.next_entry::<String, Value>()? {
            record.insert(name, value);
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_insertion_order() {
        let record = Record::new().with("zeta", 1).with("alpha", 2).with("mid", 3);
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_record_insert_replaces_in_place() {
        let mut record = Record::new().with("a", 1).with("b", 2);
        record.insert("a", 10);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("a"), Some(&Value::Integer(10)));
        assert_eq!(record.keys().next(), Some("a"));
    }

    #[test]
    fn test_record_json_keeps_object_order() {
        let record: Record = serde_json::from_str(r#"{"name":"Ana","id":1,"score":2.5,"gone":null}"#).unwrap();
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["name", "id", "score", "gone"]);
        assert_eq!(record.get("score"), Some(&Value::Real(2.5)));
        assert!(record.get("gone").unwrap().is_null());

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"name":"Ana","id":1,"score":2.5,"gone":null}"#);
    }

    #[test]
    fn test_value_from_json_bool_and_nested() {
        let v: Value = serde_json::from_str("true").unwrap();
        assert_eq!(v, Value::Integer(1));

        let nested: std::result::Result<Value, _> = serde_json::from_str(r#"{"a": 1}"#);
        assert!(nested.is_err());
        let not_bytes: std::result::Result<Value, _> = serde_json::from_str("[1, 300]");
        assert!(not_bytes.is_err());
        let mixed: std::result::Result<Value, _> = serde_json::from_str(r#"[1, "x"]"#);
        assert!(mixed.is_err());
    }

    #[test]
    fn test_blob_survives_record_json() {
        let record = Record::new().with("id", 1).with("data", Value::Blob(vec![0, 7, 255]));
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"id":1,"data":[0,7,255]}"#);

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_value_truthiness() {
        assert!(Value::from("YES").is_truthy());
        assert!(Value::Blob(b"YES".to_vec()).is_truthy());
        assert!(!Value::from("NO").is_truthy());
        assert!(Value::Integer(1).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn test_same_columns() {
        let a = Record::new().with("x", 1).with("y", 2);
        let b = Record::new().with("x", 3).with("y", 4);
        let c = Record::new().with("y", 3).with("x", 4);
        assert!(a.same_columns(&b));
        assert!(!a.same_columns(&c));
    }
}

/// # Test Utilities Module
///
/// Fixtures shared by the unit and integration tests: an isolated SQLite
/// database file per test, connection parameters pointing at it, and a
/// small seeded `users` table.
use crate::access::Database;
use crate::config::{IdentifierPolicy, SqliteConfig};
use crate::core::db::connection::ConnectionParams;
use crate::core::db::sqlite::SqliteDriver;
use tempfile::NamedTempFile;

/// Connection parameters for a SQLite file. Server fields are left empty.
pub fn sqlite_params(path: &str) -> ConnectionParams {
    ConnectionParams::new("", "", "", path)
}

/// Builds the ordered `(column, type)` list taken by `create_table`.
pub fn columns(defs: &[(&str, &str)]) -> Vec<(String, String)> {
    defs.iter()
        .map(|(name, ty)| (name.to_string(), ty.to_string()))
        .collect()
}

/// Isolated database test fixture. The file is removed when dropped.
pub struct TestDb {
    pub file: NamedTempFile,
    pub params: ConnectionParams,
    pub db: Database<SqliteDriver>,
}

impl TestDb {
    pub fn new() -> Self {
        Self::with_policy(IdentifierPolicy::Charset)
    }

    pub fn with_policy(policy: IdentifierPolicy) -> Self {
        let file = NamedTempFile::new().expect("Failed to create temp database file");
        let params = sqlite_params(file.path().to_str().expect("Temp path is not UTF-8"));
        let db = Database::new(SqliteDriver::new(SqliteConfig::default())).with_policy(policy);
        TestDb { file, params, db }
    }

    /// Runs setup SQL directly, bypassing the operation layer.
    pub fn exec(&self, sql: &str) {
        let conn = rusqlite::Connection::open(self.file.path()).expect("Failed to open fixture database");
        conn.execute_batch(sql).expect("Fixture SQL failed");
    }
}

/// `users(id, name, age)` holding Ana (30), Ben (25) and Cleo (no age).
pub fn seeded_db() -> TestDb {
    let fixture = TestDb::new();
    fixture.exec(
        "
        CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            age INTEGER
        );
        INSERT INTO users (name, age) VALUES ('Ana', 30);
        INSERT INTO users (name, age) VALUES ('Ben', 25);
        INSERT INTO users (name, age) VALUES ('Cleo', NULL);
        ",
    );
    fixture
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_fixture() {
        let fixture = seeded_db();
        assert_eq!(fixture.db.list_tables(&fixture.params).unwrap(), vec!["users"]);
        assert_eq!(fixture.db.get_all_rows(&fixture.params, "users").unwrap().len(), 3);
    }

    #[test]
    fn test_fixtures_are_isolated() {
        let a = seeded_db();
        let b = TestDb::new();
        assert_ne!(a.params.database, b.params.database);
        assert!(b.db.list_tables(&b.params).unwrap().is_empty());
    }
}

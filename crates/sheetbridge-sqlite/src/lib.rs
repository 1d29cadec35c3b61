//! # sheetbridge-sqlite
//!
//! The [`Store`] boundary implemented over SQLite. One store wraps one
//! `rusqlite` connection; `begin`/`commit`/`rollback` map onto real
//! transactions so each table or spreadsheet is one atomic unit of work.

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use sheetbridge_core::Value;
use sheetbridge_engine::{Store, StoreError, StoreProvider};
use std::path::{Path, PathBuf};

/// A [`Store`] over a SQLite database
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(wrap)?;
        Ok(Self { conn })
    }

    /// An in-memory database, used by the test suites
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(wrap)?;
        Ok(Self { conn })
    }
}

impl Store for SqliteStore {
    fn execute(&mut self, sql: &str) -> Result<(), StoreError> {
        self.conn.execute_batch(sql).map_err(wrap)
    }

    fn query(&mut self, sql: &str) -> Result<Vec<Vec<Value>>, StoreError> {
        let mut statement = self.conn.prepare(sql).map_err(wrap)?;
        let columns = statement.column_count();

        let mut tuples = Vec::new();
        let mut rows = statement.query([]).map_err(wrap)?;
        while let Some(row) = rows.next().map_err(wrap)? {
            let mut tuple = Vec::with_capacity(columns);
            for index in 0..columns {
                let field = match row.get_ref(index).map_err(wrap)? {
                    ValueRef::Null => Value::Text(String::new()),
                    ValueRef::Integer(n) => Value::Integer(n),
                    ValueRef::Real(r) => Value::Real(r),
                    ValueRef::Text(bytes) => {
                        Value::Text(String::from_utf8_lossy(bytes).into_owned())
                    }
                    ValueRef::Blob(bytes) => {
                        Value::Text(String::from_utf8_lossy(bytes).into_owned())
                    }
                };
                tuple.push(field);
            }
            tuples.push(tuple);
        }
        Ok(tuples)
    }

    fn insert(
        &mut self,
        table: &str,
        columns: usize,
        rows: &[Vec<Value>],
    ) -> Result<(), StoreError> {
        let placeholders = vec!["?"; columns].join(", ");
        let sql = format!("INSERT INTO {table} VALUES ({placeholders})");
        let mut statement = self.conn.prepare(&sql).map_err(wrap)?;

        for row in rows {
            let params = rusqlite::params_from_iter(row.iter().map(to_sql));
            statement.execute(params).map_err(wrap)?;
        }
        Ok(())
    }

    fn table_exists(&mut self, name: &str) -> Result<bool, StoreError> {
        self.conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |row| row.get::<_, i64>(0),
            )
            .map(|count| count > 0)
            .map_err(wrap)
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("BEGIN").map_err(wrap)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("COMMIT").map_err(wrap)
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("ROLLBACK").map_err(wrap)
    }
}

/// Dates, datetimes and formulas bind as their textual forms, matching the
/// column types the schema generator emits
fn to_sql(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Integer(n) => rusqlite::types::Value::Integer(*n),
        Value::Real(r) => rusqlite::types::Value::Real(*r),
        Value::Text(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Date(_) | Value::DateTime(_) | Value::Formula(_) => {
            rusqlite::types::Value::Text(value.to_text())
        }
    }
}

fn wrap(error: rusqlite::Error) -> StoreError {
    StoreError(error.to_string())
}

/// Opens [`SqliteStore`]s by database path, resolving relative names
/// against an optional base directory
pub struct SqliteProvider {
    base: Option<PathBuf>,
}

impl SqliteProvider {
    pub fn new() -> Self {
        Self { base: None }
    }

    pub fn with_base<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base: Some(base.into()),
        }
    }
}

impl Default for SqliteProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreProvider for SqliteProvider {
    fn open(&self, database: &str) -> Result<Box<dyn Store>, StoreError> {
        let path = match &self.base {
            Some(base) => base.join(database),
            None => PathBuf::from(database),
        };
        Ok(Box::new(SqliteStore::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_execute_insert_query_roundtrip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .execute("CREATE TABLE t (a integer, b text, c real);")
            .unwrap();
        assert!(store.table_exists("t").unwrap());
        assert!(!store.table_exists("missing").unwrap());

        store
            .insert(
                "t",
                3,
                &[
                    vec![Value::Integer(1), Value::text("x"), Value::Real(0.5)],
                    vec![Value::Integer(2), Value::text("y"), Value::Real(1.5)],
                ],
            )
            .unwrap();

        let rows = store.query("SELECT a, b, c FROM t ORDER BY a").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec![Value::Integer(1), Value::text("x"), Value::Real(0.5)]
        );
    }

    #[test]
    fn test_rollback_discards_work() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.execute("CREATE TABLE t (a integer);").unwrap();

        store.begin().unwrap();
        store.insert("t", 1, &[vec![Value::Integer(1)]]).unwrap();
        store.rollback().unwrap();

        assert!(store.query("SELECT a FROM t").unwrap().is_empty());
    }

    #[test]
    fn test_null_fields_read_as_blank_text() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let rows = store.query("SELECT NULL").unwrap();
        assert_eq!(rows[0][0], Value::Text(String::new()));
    }

    #[test]
    fn test_dates_bind_as_text() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.execute("CREATE TABLE d (day date);").unwrap();
        store
            .insert(
                "d",
                1,
                &[vec![Value::Date(
                    chrono_date(2018, 7, 24),
                )]],
            )
            .unwrap();
        let rows = store.query("SELECT day FROM d").unwrap();
        assert_eq!(rows[0][0], Value::text("2018-07-24"));
    }

    fn chrono_date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_provider_resolves_against_its_base() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteProvider::with_base(dir.path());

        let mut store = provider.open("nested.db").unwrap();
        store.execute("CREATE TABLE t (a integer);").unwrap();
        drop(store);

        assert!(dir.path().join("nested.db").exists());
    }
}

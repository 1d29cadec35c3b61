//! The relational store boundary
//!
//! The engines only ever talk to this trait; the concrete adapter (SQLite
//! in this workspace) lives behind it. Implementations are expected to map
//! `begin`/`commit`/`rollback` onto real transactions so that one table or
//! one spreadsheet is one atomic unit of work.

use crate::error::StoreError;
use sheetbridge_core::Value;

/// A mutable connection to a relational store
pub trait Store {
    /// Execute one or more DDL/DML statements
    fn execute(&mut self, sql: &str) -> Result<(), StoreError>;

    /// Run a query and collect the result tuples
    fn query(&mut self, sql: &str) -> Result<Vec<Vec<Value>>, StoreError>;

    /// Batch-insert rows into a table; every row has `columns` fields
    fn insert(&mut self, table: &str, columns: usize, rows: &[Vec<Value>])
        -> Result<(), StoreError>;

    /// Whether a table of the given name exists
    fn table_exists(&mut self, name: &str) -> Result<bool, StoreError>;

    /// Open a transaction
    fn begin(&mut self) -> Result<(), StoreError>;

    /// Commit the open transaction
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Abandon the open transaction
    fn rollback(&mut self) -> Result<(), StoreError>;
}

/// Opens stores by name for the sheet-side executor, which may need a
/// different database per spreadsheet or even per query
pub trait StoreProvider {
    fn open(&self, database: &str) -> Result<Box<dyn Store>, StoreError>;
}

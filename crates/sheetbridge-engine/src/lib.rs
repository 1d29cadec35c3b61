//! # sheetbridge-engine
//!
//! Execution engines for parsed sheetbridge specifications:
//! - [`populate`]/[`materialize`] walk a table-spec [`Database`] and move
//!   spreadsheet data into a relational store
//! - [`execute_book`] walks a sheet-spec [`Book`] and renders query results
//!   and literals into grids, ready for a spreadsheet writer
//!
//! The relational store and the spreadsheets live behind the [`Store`],
//! [`StoreProvider`] and [`GridProvider`] boundaries; non-fatal
//! diagnostics go through an injected [`Reporter`].
//!
//! [`Database`]: sheetbridge_lang::table::Database
//! [`Book`]: sheetbridge_lang::sheet::Book

pub mod cast;
pub mod diag;
pub mod error;
pub mod execute;
pub mod populate;
pub mod rows;
pub mod schema;
pub mod store;
pub mod vars;

pub use diag::{BufferReporter, LogReporter, Reporter};
pub use error::{ExecError, ExecResult, StoreError};
pub use execute::{execute_book, ExecuteOptions, FileOutput, SheetOutput};
pub use populate::{materialize, populate, GridProvider, PopulateOptions};
pub use store::{Store, StoreProvider};

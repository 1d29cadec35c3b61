//! # sheetbridge
//!
//! sheetbridge compiles two small declarative languages and executes them
//! against a grid of cells and a SQLite store:
//!
//! - the **table-spec** language describes how to populate relational
//!   tables from spreadsheet regions
//! - the **sheet-spec** language describes how to populate spreadsheet
//!   regions from relational queries and literals
//!
//! ## Example
//!
//! ```rust
//! use sheetbridge::prelude::*;
//!
//! let db = parse_table_spec("people { name $A2:$A9 text; age $B2:$B9 integer; }").unwrap();
//! assert_eq!(db.tables().count(), 1);
//!
//! let book = parse_sheet_spec(r#"{ $A1 : $A3 right "header"; }"#).unwrap();
//! assert_eq!(book.spreadsheets.len(), 1);
//! ```

pub mod prelude;

pub use sheetbridge_engine::{execute_book, materialize, populate};
pub use sheetbridge_lang::{expand, parse_sheet_spec, parse_table_spec};

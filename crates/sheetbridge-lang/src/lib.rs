//! # sheetbridge-lang
//!
//! The two specification languages of sheetbridge:
//! - the **table-spec** language describes how to populate relational
//!   tables from spreadsheet regions ([`parse_table_spec`])
//! - the **sheet-spec** language describes how to populate spreadsheet
//!   regions from relational queries and literals ([`parse_sheet_spec`])
//!
//! Both share one scanner and run the [`template`] preprocessor before
//! parsing. Parsers are hand-written recursive descent over the token
//! stream; every failure carries the line and the offending token.

pub mod error;
pub mod lexer;
pub mod sheet;
pub mod table;
pub mod template;

mod cursor;

pub use error::{ParseError, ParseResult};
pub use sheet::parse_sheet_spec;
pub use table::parse_table_spec;
pub use template::{expand, Expansion, Template};

//! The sheet-spec language: grammar and AST

pub mod ast;
mod parser;

pub use ast::{
    Book, CellSpec, Command, Direction, LiteralCommand, QueryCommand, Registry, Spreadsheet,
};
pub use parser::parse_sheet_spec;

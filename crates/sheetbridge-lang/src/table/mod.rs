//! The table-spec language: grammar and AST

pub mod ast;
mod parser;

pub use ast::{
    Action, Block, Column, Content, Database, Expression, Modifier, Qualifier, SqlStatement, Table,
};
pub use parser::parse_table_spec;

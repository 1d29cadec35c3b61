//! Sheet-spec AST
//!
//! A sheet specification is an ordered list of spreadsheets, each holding a
//! registry of commands. A command writes either a literal value or the
//! result of a SQL query into a target range, optionally replicating in a
//! direction and registering its bounding box under a name.

use sheetbridge_core::{CellRef, DataType, Value};

/// An ordered list of spreadsheets, grouped by output file at execution time
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub spreadsheets: Vec<Spreadsheet>,
}

/// A registry of commands plus optional output overrides
#[derive(Debug, Clone, PartialEq)]
pub struct Spreadsheet {
    pub registry: Registry,
    /// Output spreadsheet file, when embedded in the specification
    pub file: Option<String>,
    /// Output sheet name, when embedded in the specification
    pub sheet: Option<String>,
    /// Database the queries run against, when embedded in the specification
    pub database: Option<String>,
}

/// An ordered list of commands, executed in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    pub commands: Vec<Command>,
}

/// One command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Literal(LiteralCommand),
    Query(QueryCommand),
}

impl Command {
    /// The name the command registers its bounding box under, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            Command::Literal(l) => l.name.as_deref(),
            Command::Query(q) => q.name.as_deref(),
        }
    }

    pub fn target(&self) -> &(CellSpec, CellSpec) {
        match self {
            Command::Literal(l) => &l.target,
            Command::Query(q) => &q.target,
        }
    }
}

/// Insert a typed value into every cell of the target range
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralCommand {
    pub name: Option<String>,
    pub target: (CellSpec, CellSpec),
    pub value: Value,
    pub data_type: DataType,
    pub direction: Option<Direction>,
    pub attributes: Vec<(String, Value)>,
}

/// Run a SQL query and spread the result tuples over the target range
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCommand {
    pub name: Option<String>,
    pub target: (CellSpec, CellSpec),
    pub sql: String,
    /// Database this particular query runs against, overriding the
    /// spreadsheet's
    pub database: Option<String>,
    pub direction: Option<Direction>,
    pub attributes: Vec<(String, Value)>,
}

/// Where multi-tuple results replicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Right,
    Down,
}

/// A target corner: an explicit cell or a registered bounding-box variable,
/// each with an optional offset
#[derive(Debug, Clone, PartialEq)]
pub enum CellSpec {
    Cell(CellRef),
    Variable {
        name: String,
        col_offset: i64,
        row_offset: i64,
    },
}

//! Table-spec AST
//!
//! A table specification is an ordered list of tables and raw SQL
//! statements. Each table owns one block: columns fed from spreadsheet
//! regions or explicit values, plus the modifiers governing row acceptance.

use sheetbridge_core::{Context, ContextKey, ContextValue, DataType, RangeRef, Value};
use std::fmt;

/// An ordered table specification, executed strictly in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    pub expressions: Vec<Expression>,
}

impl Database {
    /// The tables, skipping raw SQL statements
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.expressions.iter().filter_map(|e| match e {
            Expression::Table(t) => Some(t),
            Expression::Sql(_) => None,
        })
    }
}

/// One top-level expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Table(Table),
    Sql(SqlStatement),
}

/// A raw SQL statement executed when the walk reaches it
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub text: String,
}

/// A table: name, optional spreadsheet/sheet override and one block
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub spreadsheet: Option<String>,
    pub sheet: Option<String>,
    pub block: Block,
}

/// A repeating group of column definitions plus validation modifiers
#[derive(Debug, Clone)]
pub struct Block {
    pub columns: Vec<Column>,
    pub modifiers: Vec<Modifier>,
}

impl Block {
    /// Whether every column carries a declared type
    pub fn is_typed(&self) -> bool {
        self.columns.iter().all(|c| c.data_type.is_some())
    }

    /// The modifiers as a fresh execution context
    pub fn context(&self) -> Context {
        let mut context = Context::new();
        for modifier in &self.modifiers {
            match modifier {
                Modifier::EnforceUnique => {
                    context.set(ContextKey::EnforceUnique, ContextValue::Flag)
                }
                Modifier::CheckDuplicates => {
                    context.set(ContextKey::CheckDuplicates, ContextValue::Flag)
                }
                Modifier::Geq(n) => context.set(ContextKey::Geq, ContextValue::Number(*n)),
                Modifier::Leq(n) => context.set(ContextKey::Leq, ContextValue::Number(*n)),
                Modifier::Eq(n) => context.set(ContextKey::Eq, ContextValue::Number(*n)),
                Modifier::Neq(n) => context.set(ContextKey::Neq, ContextValue::Number(*n)),
                Modifier::Len(n) => context.set(ContextKey::Len, ContextValue::Number(*n)),
            }
        }
        context
    }

    /// The columns carrying the `key` qualifier
    pub fn keys(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_key())
    }

    /// The columns carrying the `index` qualifier
    pub fn indexes(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_index())
    }

    /// The columns carrying the `unique` qualifier
    pub fn uniques(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_unique())
    }
}

/// Two blocks are equal iff their column names are identical in order; a
/// table's repeating column pattern is validated with this
impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| a.name == b.name)
    }
}

/// A block-level directive controlling row acceptance or expected count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// Silently skip repeated rows
    EnforceUnique,
    /// Warn when a row repeats, but keep it
    CheckDuplicates,
    Geq(i64),
    Leq(i64),
    Eq(i64),
    Neq(i64),
    /// Recorded in the context; no validator consumes it yet
    Len(i64),
}

/// One column definition
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub contents: Vec<Content>,
    pub data_type: Option<DataType>,
    pub action: Action,
    pub qualifiers: Vec<Qualifier>,
}

impl Column {
    pub fn is_key(&self) -> bool {
        self.qualifiers.contains(&Qualifier::Key)
    }

    pub fn is_index(&self) -> bool {
        self.qualifiers.contains(&Qualifier::Index)
    }

    pub fn is_unique(&self) -> bool {
        self.qualifiers.contains(&Qualifier::Unique)
    }
}

/// A column-level annotation affecting the generated schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    Key,
    Index,
    Unique,
}

/// The payload of a column: an explicit scalar or a region of cells
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Explicit(Value),
    Cells(RangeRef),
}

/// The policy applied when a value is missing or fails to cast
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Abort the whole run
    Error,
    /// Report and substitute the default
    Warning(Option<Value>),
    /// Substitute the default silently
    None(Option<Value>),
}

impl Action {
    /// The default carried by this action, if any
    pub fn default_value(&self) -> Option<&Value> {
        match self {
            Action::Error => None,
            Action::Warning(default) | Action::None(default) => default.as_ref(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Error => f.write_str("Error"),
            Action::Warning(Some(d)) => write!(f, "Warning with default value: {d}"),
            Action::Warning(None) => f.write_str("Warning"),
            Action::None(Some(d)) => write!(f, "None with default value: {d}"),
            Action::None(None) => f.write_str("None"),
        }
    }
}

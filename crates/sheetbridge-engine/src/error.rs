//! Execution error types

use thiserror::Error;

/// Result type for execution operations
pub type ExecResult<T> = std::result::Result<T, ExecError>;

/// A failure raised by the relational store boundary
#[derive(Debug, Error)]
#[error("store error: {0}")]
pub struct StoreError(pub String);

/// Errors that can occur while executing a parsed specification
#[derive(Debug, Error)]
pub enum ExecError {
    /// Address or cast failure bubbling up from the core
    #[error(transparent)]
    Core(#[from] sheetbridge_core::Error),

    /// Store boundary failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Meaning-level failure: missing references, existing tables,
    /// untyped columns, inconsistent shapes
    #[error("{0}")]
    Semantic(String),

    /// The `Error` action fired for a missing or unconvertible value
    #[error("{0}")]
    Action(String),

    /// Column value sequences could not be aligned into rows
    #[error(
        "it is not possible to extend column '{column}' which contains {actual} items to hold {expected} items"
    )]
    Shape {
        column: String,
        actual: usize,
        expected: usize,
    },

    /// A configured default failed to cast; always fatal, whatever the action
    #[error(
        "it was not possible to cast the default value '{value}' defined for column '{column}' to the type '{data_type}'"
    )]
    DefaultCast {
        column: String,
        value: String,
        data_type: String,
    },
}

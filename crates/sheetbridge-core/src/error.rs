//! Error types for sheetbridge-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetbridge-core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell reference descriptor
    #[error("the cell '{0}' is not a legal reference, neither explicit nor implicit")]
    InvalidReference(String),

    /// Column arithmetic left the sheet
    #[error("shifting column {column} by {delta} goes beyond the left margin")]
    ColumnShift { column: u32, delta: i64 },

    /// Row arithmetic left the sheet
    #[error("shifting row {row} by {delta} goes above the first row")]
    RowShift { row: u32, delta: i64 },

    /// Content search walked past the grid's column bound
    #[error("column {column} out of range while looking for cell '{reference}'")]
    ColumnOutOfRange { column: String, reference: String },

    /// Content search walked past the grid's row bound
    #[error("row {row} out of range while looking for cell '{reference}'")]
    RowOutOfRange { row: u32, reference: String },

    /// Wildcard references parse but have no resolution algorithm yet
    #[error("the wildcard reference '{0}' is not supported yet")]
    UnresolvedWildcard(String),

    /// A context variable was referenced before being registered
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// Value not convertible to the requested type
    #[error("it was not possible to cast the value '{value}' to the type {target}")]
    Cast { value: String, target: &'static str },
}

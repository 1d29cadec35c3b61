//! Parse error types

use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors raised while turning specification text into an AST
///
/// All of these abort the compilation before anything executes.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Unrecognized character in the input
    #[error("illegal character '{character}' in line {line}")]
    Lex { line: u32, character: char },

    /// Grammar mismatch, carrying the line and the offending token
    #[error("syntax error in line {line} near '{token}': {message}")]
    Syntax {
        line: u32,
        token: String,
        message: String,
    },

    /// Name conflicts, unknown references and other meaning-level problems
    #[error("{0}")]
    Semantic(String),

    /// Malformed template definition or call
    #[error("{0}")]
    Template(String),

    /// A cell reference that does not fit any legal form
    #[error(transparent)]
    Reference(#[from] sheetbridge_core::Error),
}

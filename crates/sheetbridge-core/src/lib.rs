//! # sheetbridge-core
//!
//! Core data structures for the sheetbridge compiler:
//! - [`CellAddress`] and [`CellRange`] - cell addressing with bijective
//!   base-26 column names, normalized ranges and a restartable cursor
//! - [`Value`] and [`DataType`] - the typed scalars both languages deal in
//! - [`CellRef`] - explicit, content-matched and dot-bounded cell
//!   references, and their resolution against a grid
//! - [`Context`] - the per-execution symbol table
//! - [`SheetSource`] and [`DynamicArray`] - the grid boundary
//!
//! ## Example
//!
//! ```rust
//! use sheetbridge_core::{CellAddress, CellRange};
//!
//! let a = CellAddress::parse("B3").unwrap();
//! let b = CellAddress::parse("A1").unwrap();
//!
//! // Ranges normalize to NW/SE regardless of corner order
//! let range = CellRange::new(a, b);
//! assert_eq!(range.start(), b);
//! assert_eq!(range.end(), a);
//! ```

pub mod cell;
pub mod context;
pub mod error;
pub mod grid;
pub mod reference;

// Re-exports for convenience
pub use cell::{CellAddress, CellRange, DataType, RangeCursor, Value};
pub use context::{Context, ContextKey, ContextValue};
pub use error::{Error, Result};
pub use grid::{Cell, DynamicArray, GridBounds, SheetSource};
pub use reference::{CellRef, Descriptor, RangeRef};

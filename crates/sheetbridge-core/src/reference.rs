//! Cell references and their resolution against a grid
//!
//! A reference is a descriptor plus an optional column/row offset. The
//! descriptor names a cell explicitly ("B24"), by the content of a row or
//! column ("B[total]", "[total]3"), or by the context's recorded bounds
//! ("." and ".."). Resolution is two-phase: the descriptor resolves to a
//! concrete address, then the offset is applied.

use crate::cell::{CellAddress, CellRange};
use crate::context::{Context, ContextKey, ContextValue};
use crate::error::{Error, Result};
use crate::grid::SheetSource;
use std::fmt;

/// How a referenced cell is described
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    /// Explicit coordinates, e.g. "B24"
    Coord(CellAddress),
    /// Content-matched along a fixed column or a fixed row; exactly one of
    /// `column`/`row` is set
    Match {
        column: Option<u32>,
        row: Option<u32>,
        needle: String,
    },
    /// The context's minimum corner at a range start, maximum corner after a
    /// base
    Dot,
    /// Always the context's maximum corner
    DotDot,
    /// Declared in the vocabulary; resolution is not specified yet
    Wildcard,
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Coord(addr) => write!(f, "{addr}"),
            Descriptor::Match {
                column: Some(col),
                needle,
                ..
            } => write!(f, "{}[{}]", CellAddress::column_name(*col), needle),
            Descriptor::Match {
                row: Some(row),
                needle,
                ..
            } => write!(f, "[{needle}]{row}"),
            Descriptor::Match { .. } => write!(f, "[?]"),
            Descriptor::Dot => f.write_str("."),
            Descriptor::DotDot => f.write_str(".."),
            Descriptor::Wildcard => f.write_str("*"),
        }
    }
}

/// A cell reference: a descriptor plus integer offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRef {
    pub descriptor: Descriptor,
    pub col_offset: i64,
    pub row_offset: i64,
}

impl CellRef {
    /// A reference with no offset
    pub fn new(descriptor: Descriptor) -> Self {
        Self {
            descriptor,
            col_offset: 0,
            row_offset: 0,
        }
    }

    /// A reference with the given offsets
    pub fn with_offset(descriptor: Descriptor, col_offset: i64, row_offset: i64) -> Self {
        Self {
            descriptor,
            col_offset,
            row_offset,
        }
    }

    /// Parse a descriptor as it appears after the `$` sigil: `B24`,
    /// `B[needle]`, `[needle]3`, `.`, `..` or `*`
    pub fn parse(text: &str) -> Result<Self> {
        let descriptor = match text {
            "." => Descriptor::Dot,
            ".." => Descriptor::DotDot,
            "*" => Descriptor::Wildcard,
            _ => Self::parse_positional(text)?,
        };
        Ok(Self::new(descriptor))
    }

    fn parse_positional(text: &str) -> Result<Descriptor> {
        // [needle]ROW
        if let Some(rest) = text.strip_prefix('[') {
            let (needle, row) = rest
                .split_once(']')
                .ok_or_else(|| Error::InvalidReference(text.to_string()))?;
            let row: u32 = row
                .parse()
                .map_err(|_| Error::InvalidReference(text.to_string()))?;
            if row == 0 {
                return Err(Error::InvalidReference(text.to_string()));
            }
            return Ok(Descriptor::Match {
                column: None,
                row: Some(row),
                needle: needle.to_string(),
            });
        }

        // COLUMN[needle]
        if let Some((letters, rest)) = text.split_once('[') {
            let needle = rest
                .strip_suffix(']')
                .ok_or_else(|| Error::InvalidReference(text.to_string()))?;
            let column = CellAddress::column_index(letters)
                .map_err(|_| Error::InvalidReference(text.to_string()))?;
            return Ok(Descriptor::Match {
                column: Some(column),
                row: None,
                needle: needle.to_string(),
            });
        }

        // COLUMNROW
        CellAddress::parse(text)
            .map(Descriptor::Coord)
            .map_err(|_| Error::InvalidReference(text.to_string()))
    }

    /// Resolve to a concrete address
    ///
    /// Content-matched descriptors scan the grid starting at the base (or
    /// A1), one row at a time when the column is fixed and one column at a
    /// time when the row is fixed, until a cell's textual content equals the
    /// needle; walking past the grid's bounds is an error. Dot descriptors
    /// read the context's recorded bounds, seeding them from the grid on
    /// first use. The reference's offset is applied last.
    pub fn resolve(
        &self,
        grid: &dyn SheetSource,
        context: &mut Context,
        base: Option<CellAddress>,
    ) -> Result<CellAddress> {
        let located = self.locate(grid, context, base)?;
        located.offset(self.col_offset, self.row_offset)
    }

    fn locate(
        &self,
        grid: &dyn SheetSource,
        context: &mut Context,
        base: Option<CellAddress>,
    ) -> Result<CellAddress> {
        match &self.descriptor {
            Descriptor::Coord(addr) => Ok(*addr),
            Descriptor::Dot => {
                seed_bounds(context, grid);
                if base.is_none() {
                    Ok(min_corner(context))
                } else {
                    Ok(max_corner(context))
                }
            }
            Descriptor::DotDot => {
                seed_bounds(context, grid);
                Ok(max_corner(context))
            }
            Descriptor::Wildcard => Err(Error::UnresolvedWildcard(self.to_string())),
            Descriptor::Match {
                column,
                row,
                needle,
            } => self.search(grid, base, *column, *row, needle),
        }
    }

    fn search(
        &self,
        grid: &dyn SheetSource,
        base: Option<CellAddress>,
        column: Option<u32>,
        row: Option<u32>,
        needle: &str,
    ) -> Result<CellAddress> {
        let base = base.unwrap_or_else(|| CellAddress::new(0, 1));

        // pin the fixed coordinate and pick the advance direction
        let (mut current, delta) = match (column, row) {
            (Some(col), None) => (CellAddress::new(col, base.row), (0i64, 1i64)),
            (None, Some(row)) => (CellAddress::new(base.column, row), (1i64, 0i64)),
            _ => return Err(Error::InvalidReference(self.to_string())),
        };

        let bounds = grid.bounds();
        loop {
            if current.column >= bounds.columns {
                return Err(Error::ColumnOutOfRange {
                    column: CellAddress::column_name(current.column),
                    reference: self.to_string(),
                });
            }
            if current.row > bounds.rows {
                return Err(Error::RowOutOfRange {
                    row: current.row,
                    reference: self.to_string(),
                });
            }

            if grid.text(&current) == needle {
                return Ok(current);
            }

            current = current.offset(delta.0, delta.1)?;
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.col_offset != 0 || self.row_offset != 0 {
            write!(
                f,
                "{} + ({}, {})",
                self.descriptor, self.col_offset, self.row_offset
            )
        } else {
            write!(f, "{}", self.descriptor)
        }
    }
}

/// A range given as two cell references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRef {
    pub start: CellRef,
    pub end: CellRef,
}

impl RangeRef {
    pub fn new(start: CellRef, end: CellRef) -> Self {
        Self { start, end }
    }

    /// A range that names a single cell
    pub fn single(cell: CellRef) -> Self {
        Self {
            start: cell.clone(),
            end: cell,
        }
    }

    /// Resolve both ends and normalize
    ///
    /// The end resolves with the resolved start as its search base, so a
    /// content-matched end is found at or after the start.
    pub fn resolve(&self, grid: &dyn SheetSource, context: &mut Context) -> Result<CellRange> {
        let start = self.start.resolve(grid, context, None)?;
        let end = self.end.resolve(grid, context, Some(start))?;
        Ok(CellRange::new(start, end))
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

fn seed_bounds(context: &mut Context, grid: &dyn SheetSource) {
    if context.contains(&ContextKey::MinRow) {
        return;
    }
    let bounds = grid.bounds();
    context.set(ContextKey::MinColumn, ContextValue::Number(0));
    context.set(ContextKey::MinRow, ContextValue::Number(1));
    context.set(
        ContextKey::MaxColumn,
        ContextValue::Number(bounds.columns.saturating_sub(1) as i64),
    );
    context.set(
        ContextKey::MaxRow,
        ContextValue::Number(bounds.rows.max(1) as i64),
    );
}

fn min_corner(context: &Context) -> CellAddress {
    CellAddress::new(
        context.number(&ContextKey::MinColumn).unwrap_or(0) as u32,
        context.number(&ContextKey::MinRow).unwrap_or(1) as u32,
    )
}

fn max_corner(context: &Context) -> CellAddress {
    CellAddress::new(
        context.number(&ContextKey::MaxColumn).unwrap_or(0) as u32,
        context.number(&ContextKey::MaxRow).unwrap_or(1) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Value;
    use crate::grid::{Cell, DynamicArray};
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    fn grid() -> DynamicArray {
        // B1="name", B2..B4 = alpha/beta/alpha, C2..C4 = 1/2/3
        let mut grid = DynamicArray::new();
        grid.write(addr("B1"), Cell::new(Value::text("name")));
        for (row, word) in [(2, "alpha"), (3, "beta"), (4, "alpha")] {
            grid.write(
                CellAddress::new(1, row),
                Cell::new(Value::text(word)),
            );
            grid.write(
                CellAddress::new(2, row),
                Cell::new(Value::Integer(row as i64 - 1)),
            );
        }
        grid
    }

    #[test]
    fn test_parse_descriptors() {
        assert_eq!(
            CellRef::parse("B24").unwrap().descriptor,
            Descriptor::Coord(addr("B24"))
        );
        assert_eq!(
            CellRef::parse("B[100]").unwrap().descriptor,
            Descriptor::Match {
                column: Some(1),
                row: None,
                needle: "100".into()
            }
        );
        assert_eq!(
            CellRef::parse("[100]3").unwrap().descriptor,
            Descriptor::Match {
                column: None,
                row: Some(3),
                needle: "100".into()
            }
        );
        assert_eq!(CellRef::parse(".").unwrap().descriptor, Descriptor::Dot);
        assert_eq!(CellRef::parse("..").unwrap().descriptor, Descriptor::DotDot);
        assert_eq!(
            CellRef::parse("*").unwrap().descriptor,
            Descriptor::Wildcard
        );

        assert!(CellRef::parse("B[100").is_err());
        assert!(CellRef::parse("[100]0").is_err());
        assert!(CellRef::parse("24").is_err());
    }

    #[test]
    fn test_explicit_resolution_with_offset() {
        let grid = grid();
        let mut ctx = Context::new();

        let cell = CellRef::with_offset(Descriptor::Coord(addr("B2")), 1, 2);
        assert_eq!(cell.resolve(&grid, &mut ctx, None).unwrap(), addr("C4"));
    }

    #[test]
    fn test_content_search_down_a_column() {
        let grid = grid();
        let mut ctx = Context::new();

        let cell = CellRef::parse("B[alpha]").unwrap();
        assert_eq!(cell.resolve(&grid, &mut ctx, None).unwrap(), addr("B2"));

        // with a base past the first hit, the search finds the second one
        assert_eq!(
            cell.resolve(&grid, &mut ctx, Some(addr("B3"))).unwrap(),
            addr("B4")
        );
    }

    #[test]
    fn test_content_search_along_a_row() {
        let grid = grid();
        let mut ctx = Context::new();

        let cell = CellRef::parse("[name]1").unwrap();
        assert_eq!(cell.resolve(&grid, &mut ctx, None).unwrap(), addr("B1"));
    }

    #[test]
    fn test_search_misses_raise_an_index_error() {
        let grid = grid();
        let mut ctx = Context::new();

        let cell = CellRef::parse("B[gamma]").unwrap();
        assert!(matches!(
            cell.resolve(&grid, &mut ctx, None),
            Err(Error::RowOutOfRange { .. })
        ));

        let cell = CellRef::parse("[gamma]2").unwrap();
        assert!(matches!(
            cell.resolve(&grid, &mut ctx, None),
            Err(Error::ColumnOutOfRange { .. })
        ));
    }

    #[test]
    fn test_range_end_searches_after_start() {
        let grid = grid();
        let mut ctx = Context::new();

        let range = RangeRef::new(
            CellRef::parse("B[alpha]").unwrap(),
            CellRef::parse("B[alpha]").unwrap(),
        );
        let resolved = range.resolve(&grid, &mut ctx).unwrap();
        // the end matches the start cell itself: searches are inclusive of
        // their base
        assert_eq!(resolved.start(), addr("B2"));
        assert_eq!(resolved.end(), addr("B2"));
    }

    #[test]
    fn test_dot_forms() {
        let grid = grid();
        let mut ctx = Context::new();

        let range = RangeRef::new(CellRef::parse(".").unwrap(), CellRef::parse("..").unwrap());
        let resolved = range.resolve(&grid, &mut ctx).unwrap();
        assert_eq!(resolved.start(), addr("A1"));
        assert_eq!(resolved.end(), addr("C4"));
    }

    #[test]
    fn test_wildcard_is_an_explicit_extension_point() {
        let grid = grid();
        let mut ctx = Context::new();

        let cell = CellRef::parse("*").unwrap();
        assert!(matches!(
            cell.resolve(&grid, &mut ctx, None),
            Err(Error::UnresolvedWildcard(_))
        ));
    }
}

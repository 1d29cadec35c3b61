//! Normalized cell ranges and the column-major range cursor

use crate::cell::CellAddress;
use crate::error::Result;
use std::fmt;

/// A rectangular range of cells, stored normalized
///
/// Whatever corner order the two addresses arrive in, `start` is the
/// north-west corner and `end` the south-east corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRange {
    start: CellAddress,
    end: CellAddress,
}

impl CellRange {
    /// Create a range from any two corners, normalizing to NW/SE.
    ///
    /// Rows are compared first, then columns, which gives the four corner
    /// cases: NW-SE (kept), NE-SW, SW-NE and SE-NW (components swapped).
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        let (start, end) = if a.row <= b.row {
            if a.column <= b.column {
                (a, b)
            } else {
                // a is the NE corner
                (
                    CellAddress::new(b.column, a.row),
                    CellAddress::new(a.column, b.row),
                )
            }
        } else if a.column <= b.column {
            // a is the SW corner
            (
                CellAddress::new(a.column, b.row),
                CellAddress::new(b.column, a.row),
            )
        } else {
            (b, a)
        };

        Self { start, end }
    }

    /// Create a single-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// The north-west corner
    pub fn start(&self) -> CellAddress {
        self.start
    }

    /// The south-east corner
    pub fn end(&self) -> CellAddress {
        self.end
    }

    /// Number of rows in the range
    pub fn rows(&self) -> u32 {
        1 + self.end.row - self.start.row
    }

    /// Number of columns in the range
    pub fn columns(&self) -> u32 {
        1 + self.end.column - self.start.column
    }

    /// Total number of cells in the range
    pub fn len(&self) -> u64 {
        self.rows() as u64 * self.columns() as u64
    }

    /// Ranges are never empty; a bare cell is a 1x1 range
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check whether an address falls inside this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.column >= self.start.column
            && addr.column <= self.end.column
    }

    /// Return a copy of this range shifted by a number of rows
    pub fn add_rows(&self, delta: i64) -> Result<Self> {
        Ok(Self {
            start: self.start.add_rows(delta)?,
            end: self.end.add_rows(delta)?,
        })
    }

    /// Return a copy of this range shifted by a number of columns
    pub fn add_columns(&self, delta: i64) -> Result<Self> {
        Ok(Self {
            start: self.start.add_columns(delta)?,
            end: self.end.add_columns(delta)?,
        })
    }

    /// A restartable column-major cursor over the range's cells
    pub fn cursor(&self) -> RangeCursor {
        RangeCursor {
            range: *self,
            next: 0,
        }
    }

    /// A fresh column-major iterator over the range's cells
    pub fn cells(&self) -> impl Iterator<Item = CellAddress> + '_ {
        let rows = self.rows() as u64;
        (0..self.len()).map(move |i| {
            CellAddress::new(
                self.start.column + (i / rows) as u32,
                self.start.row + (i % rows) as u32,
            )
        })
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Column-major cursor over a [`CellRange`]
///
/// Walks all rows of the first column, then the next column, and so on.
/// After exhaustion the cursor rewinds itself, so the same cursor can drive
/// a range as many times as a command needs it; end-of-sequence is signalled
/// by `None`, never by state the caller has to repair.
#[derive(Debug, Clone)]
pub struct RangeCursor {
    range: CellRange,
    next: u64,
}

impl RangeCursor {
    /// The next cell, or `None` once the range is exhausted (after which the
    /// cursor is rewound and usable again)
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<CellAddress> {
        if self.next >= self.range.len() {
            self.next = 0;
            return None;
        }

        let i = self.next;
        self.next += 1;

        let rows = self.range.rows() as u64;
        Some(CellAddress::new(
            self.range.start.column + (i / rows) as u32,
            self.range.start.row + (i % rows) as u32,
        ))
    }

    /// Rewind to the first cell
    pub fn reset(&mut self) {
        self.next = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    #[test]
    fn test_normalization_all_corner_orders() {
        let nw = addr("B2");
        let se = addr("D5");
        let ne = addr("D2");
        let sw = addr("B5");

        for (a, b) in [(nw, se), (ne, sw), (sw, ne), (se, nw)] {
            let range = CellRange::new(a, b);
            assert_eq!(range.start(), nw);
            assert_eq!(range.end(), se);
        }
    }

    #[test]
    fn test_spans() {
        let range = CellRange::new(addr("B2"), addr("D5"));
        assert_eq!(range.rows(), 4);
        assert_eq!(range.columns(), 3);
        assert_eq!(range.len(), 12);

        let single = CellRange::single(addr("C3"));
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_cursor_is_column_major() {
        let range = CellRange::new(addr("A1"), addr("B2"));
        let mut cursor = range.cursor();

        assert_eq!(cursor.next(), Some(addr("A1")));
        assert_eq!(cursor.next(), Some(addr("A2")));
        assert_eq!(cursor.next(), Some(addr("B1")));
        assert_eq!(cursor.next(), Some(addr("B2")));
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn test_cursor_restarts_after_exhaustion() {
        let range = CellRange::new(addr("A1"), addr("A3"));
        let mut cursor = range.cursor();

        let first: Vec<_> = std::iter::from_fn(|| cursor.next()).collect();
        let second: Vec<_> = std::iter::from_fn(|| cursor.next()).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_iteration_order_independent_of_corner_order() {
        let fwd: Vec<_> = CellRange::new(addr("A1"), addr("C2")).cells().collect();
        let rev: Vec<_> = CellRange::new(addr("C2"), addr("A1")).cells().collect();
        assert_eq!(fwd, rev);
    }

    #[test]
    fn test_shifting() {
        let range = CellRange::new(addr("B2"), addr("C3"));

        let down = range.add_rows(2).unwrap();
        assert_eq!(down.start(), addr("B4"));
        assert_eq!(down.end(), addr("C5"));

        let right = range.add_columns(1).unwrap();
        assert_eq!(right.start(), addr("C2"));
        assert_eq!(right.end(), addr("D3"));

        assert!(range.add_rows(-2).is_err());
        assert!(range.add_columns(-2).is_err());
    }

    #[test]
    fn test_contains() {
        let range = CellRange::new(addr("B2"), addr("D4"));
        assert!(range.contains(&addr("B2")));
        assert!(range.contains(&addr("C3")));
        assert!(range.contains(&addr("D4")));
        assert!(!range.contains(&addr("A1")));
        assert!(!range.contains(&addr("B5")));
    }
}

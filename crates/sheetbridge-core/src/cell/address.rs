//! Cell addresses and bijective column-name arithmetic

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A cell address (e.g. "B24")
///
/// Columns are 0-based indices displayed as letters using bijective base-26
/// numbering (A=0, Z=25, AA=26, ...); rows are 1-based, the way they appear
/// on a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellAddress {
    /// Column index (0-based, A=0)
    pub column: u32,
    /// Row number (1-based)
    pub row: u32,
}

impl CellAddress {
    /// Create a new cell address. The row is 1-based.
    pub fn new(column: u32, row: u32) -> Self {
        debug_assert!(row >= 1, "rows are 1-based");
        Self { column, row }
    }

    /// Parse an address from COLUMNROW notation
    ///
    /// # Examples
    /// ```
    /// use sheetbridge_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("B24").unwrap();
    /// assert_eq!(addr.column, 1);
    /// assert_eq!(addr.row, 24);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| Error::InvalidAddress(format!("no row number in '{s}'")))?;
        if split == 0 {
            return Err(Error::InvalidAddress(format!("no column letters in '{s}'")));
        }

        let column = Self::column_index(&s[..split])?;
        let row: u32 = s[split..]
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{s}'")))?;
        if row == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{s}'"
            )));
        }

        Ok(Self { column, row })
    }

    /// Convert column letters to an index (A = 0, Z = 25, AA = 26, ...)
    pub fn column_index(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut index: u64 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{c}'"
                )));
            }
            index = index * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
            if index > u32::MAX as u64 {
                return Err(Error::InvalidAddress(format!(
                    "column '{letters}' is out of range"
                )));
            }
        }

        Ok((index - 1) as u32)
    }

    /// Convert a column index to letters (0 = A, 25 = Z, 26 = AA, ...)
    ///
    /// The leading digit of the bijective base-26 representation has no zero
    /// symbol, which is what makes this the exact inverse of
    /// [`column_index`](Self::column_index) for every index.
    pub fn column_name(index: u32) -> String {
        let mut name = String::new();
        let mut n = index as u64 + 1; // shift to the 1-based alphabet

        while n > 0 {
            n -= 1;
            name.insert(0, ((n % 26) as u8 + b'A') as char);
            n /= 26;
        }

        name
    }

    /// Return the address a number of rows away; negative values move up.
    pub fn add_rows(&self, delta: i64) -> Result<Self> {
        let row = self.row as i64 + delta;
        if row < 1 {
            return Err(Error::RowShift {
                row: self.row,
                delta,
            });
        }
        Ok(Self {
            column: self.column,
            row: row as u32,
        })
    }

    /// Return the address a number of columns away; negative values move left.
    pub fn add_columns(&self, delta: i64) -> Result<Self> {
        let column = self.column as i64 + delta;
        if column < 0 {
            return Err(Error::ColumnShift {
                column: self.column,
                delta,
            });
        }
        Ok(Self {
            column: column as u32,
            row: self.row,
        })
    }

    /// Apply a column and a row offset in one go.
    pub fn offset(&self, columns: i64, rows: i64) -> Result<Self> {
        self.add_columns(columns)?.add_rows(rows)
    }

    /// Format as a COLUMNROW string
    pub fn name(&self) -> String {
        format!("{}{}", Self::column_name(self.column), self.row)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

//! # sheetbridge-csv
//!
//! The CSV side of the grid boundary: [`CsvSheet`] reads a CSV file as a
//! [`SheetSource`] for the table-side executor, and [`write_sheet`] /
//! [`write_book`] persist finished grids.

mod error;

pub use error::{CsvError, CsvResult};

use sheetbridge_core::{Cell, CellAddress, DynamicArray, GridBounds, SheetSource, Value};
use sheetbridge_engine::{ExecError, ExecResult, FileOutput, GridProvider};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// A CSV file loaded as a grid of typed cells
pub struct CsvSheet {
    grid: DynamicArray,
    bounds: GridBounds,
}

impl CsvSheet {
    /// Read a CSV file
    pub fn read_file<P: AsRef<Path>>(path: P) -> CsvResult<Self> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read CSV from any reader
    pub fn read<R: Read>(reader: R) -> CsvResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut grid = DynamicArray::new();
        let (mut columns, mut rows) = (0u32, 0u32);

        for (row_index, record) in csv_reader.records().enumerate() {
            let record = record?;
            rows = row_index as u32 + 1;
            for (col_index, field) in record.iter().enumerate() {
                columns = columns.max(col_index as u32 + 1);
                if field.is_empty() {
                    continue;
                }
                grid.write(
                    CellAddress::new(col_index as u32, row_index as u32 + 1),
                    Cell::new(detect_type(field)),
                );
            }
        }

        Ok(Self {
            grid,
            bounds: GridBounds::new(columns, rows),
        })
    }
}

impl SheetSource for CsvSheet {
    fn value(&self, address: &CellAddress) -> Option<Value> {
        self.grid.value(address)
    }

    fn bounds(&self) -> GridBounds {
        self.bounds
    }
}

/// Detect the type of a field value
fn detect_type(field: &str) -> Value {
    let trimmed = field.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Integer(n);
    }
    if let Ok(r) = trimmed.parse::<f64>() {
        return Value::Real(r);
    }
    if let Ok(date) = Value::parse_date(trimmed) {
        return Value::Date(date);
    }
    if trimmed.starts_with('=') {
        return Value::Formula(trimmed.to_string());
    }
    Value::Text(field.to_string())
}

/// Write one finished grid as CSV
///
/// Cells that were never written come out empty; formatting attributes
/// have no CSV rendition and are dropped here.
pub fn write_sheet<W: Write>(grid: &DynamicArray, writer: W) -> CsvResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    if let Some(extent) = grid.extent() {
        for row in 1..=extent.end().row {
            let mut record = Vec::with_capacity(extent.end().column as usize + 1);
            for column in 0..=extent.end().column {
                let text = grid
                    .get(&CellAddress::new(column, row))
                    .map(|cell| cell.value.to_text())
                    .unwrap_or_default();
                record.push(text);
            }
            csv_writer.write_record(&record)?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

/// Persist a book's grouped output as CSV files
///
/// The first sheet of a file lands at `<file>`; further sheets of the same
/// file land next to it as `<stem>-<sheet>.csv`.
pub fn write_book(outputs: &[FileOutput]) -> CsvResult<()> {
    for output in outputs {
        for (index, sheet) in output.sheets.iter().enumerate() {
            let path = if index == 0 {
                PathBuf::from(&output.file)
            } else {
                sibling_path(&output.file, &sheet.name)
            };
            let file = File::create(path)?;
            write_sheet(&sheet.grid, file)?;
        }
    }
    Ok(())
}

fn sibling_path(file: &str, sheet: &str) -> PathBuf {
    let path = Path::new(file);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sheet".to_string());
    path.with_file_name(format!("{stem}-{sheet}.csv"))
}

/// A [`GridProvider`] opening CSV files, resolving relative names against
/// an optional base directory; CSV has a single sheet, so sheet names are
/// accepted and ignored
pub struct CsvGrids {
    base: Option<PathBuf>,
}

impl CsvGrids {
    pub fn new() -> Self {
        Self { base: None }
    }

    pub fn with_base<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base: Some(base.into()),
        }
    }
}

impl Default for CsvGrids {
    fn default() -> Self {
        Self::new()
    }
}

impl GridProvider for CsvGrids {
    fn open(&self, spreadsheet: &str, _sheet: Option<&str>) -> ExecResult<Box<dyn SheetSource>> {
        let path = match &self.base {
            Some(base) => base.join(spreadsheet),
            None => PathBuf::from(spreadsheet),
        };
        let sheet = CsvSheet::read_file(&path)
            .map_err(|e| ExecError::Semantic(format!("cannot read '{spreadsheet}': {e}")))?;
        Ok(Box::new(sheet))
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
    fn test_read_detects_types() {
        let sheet = CsvSheet::read("name,age,height\nann,34,1.62\n,27,".as_bytes()).unwrap();

        assert_eq!(sheet.value(&addr("A1")), Some(Value::text("name")));
        assert_eq!(sheet.value(&addr("B2")), Some(Value::Integer(34)));
        assert_eq!(sheet.value(&addr("C2")), Some(Value::Real(1.62)));
        // empty fields stay empty
        assert_eq!(sheet.value(&addr("A3")), None);

        let bounds = sheet.bounds();
        assert_eq!((bounds.columns, bounds.rows), (3, 3));
    }

    #[test]
    fn test_write_fills_gaps_with_empty_fields() {
        let mut grid = DynamicArray::new();
        grid.write(addr("A1"), Cell::new(Value::Integer(1)));
        grid.write(addr("C2"), Cell::new(Value::text("x")));

        let mut buffer = Vec::new();
        write_sheet(&grid, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "1,,\n,,x\n");
    }

    #[test]
    fn test_roundtrip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "1,2\n3,4\n").unwrap();

        let grids = CsvGrids::with_base(dir.path());
        let sheet = grids.open("data.csv", None).unwrap();
        assert_eq!(sheet.value(&addr("B2")), Some(Value::Integer(4)));
        assert_eq!(sheet.text(&addr("A1")), "1");
    }
}

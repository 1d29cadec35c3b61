//! Convenience re-exports for typical use

pub use sheetbridge_core::{
    Cell, CellAddress, CellRange, CellRef, Context, DataType, DynamicArray, GridBounds,
    RangeRef, SheetSource, Value,
};
pub use sheetbridge_csv::{write_book, write_sheet, CsvGrids, CsvSheet};
pub use sheetbridge_engine::{
    execute_book, materialize, populate, BufferReporter, ExecError, ExecuteOptions, FileOutput,
    GridProvider, LogReporter, PopulateOptions, Reporter, Store, StoreProvider,
};
pub use sheetbridge_lang::{parse_sheet_spec, parse_table_spec, ParseError};
pub use sheetbridge_sqlite::{SqliteProvider, SqliteStore};

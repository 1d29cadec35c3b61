//! The sheet-side executor: relational data into spreadsheet grids
//!
//! Each spreadsheet in a book executes its registry in order against a
//! fresh [`DynamicArray`] and a fresh context. Literals fill their range
//! (or replicate from its start when a direction is given), formulas are
//! dragged like a spreadsheet fill, queries spread their tuples and slide
//! when they overflow, and every named command registers its bounding box
//! for the commands after it. Finished grids are grouped by output file
//! for whatever writer persists them.

use crate::diag::Reporter;
use crate::error::{ExecError, ExecResult};
use crate::store::StoreProvider;
use crate::vars::{evaluate, register_box, substitute};
use lazy_regex::{regex, Lazy};
use regex::Regex;
use sheetbridge_core::{
    Cell, CellAddress, CellRange, Context, DynamicArray, Descriptor, Error as CoreError, Value,
};
use sheetbridge_lang::sheet::{
    Book, CellSpec, Command, Direction, LiteralCommand, QueryCommand, Spreadsheet,
};

/// Call-site parameters for [`execute_book`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecuteOptions<'a> {
    pub database: Option<&'a str>,
    pub spreadsheet: Option<&'a str>,
    pub sheet: Option<&'a str>,
    /// When set, the call-site values win over values embedded in the
    /// specification
    pub override_spec: bool,
}

/// One finished sheet
#[derive(Debug)]
pub struct SheetOutput {
    pub name: String,
    pub grid: DynamicArray,
}

/// The finished sheets of one output file
#[derive(Debug)]
pub struct FileOutput {
    pub file: String,
    pub sheets: Vec<SheetOutput>,
}

/// Execute every spreadsheet of a book, grouping the results by output file
pub fn execute_book(
    book: &Book,
    stores: &dyn StoreProvider,
    options: &ExecuteOptions<'_>,
    reporter: &mut dyn Reporter,
) -> ExecResult<Vec<FileOutput>> {
    let mut outputs: Vec<FileOutput> = Vec::new();

    for spreadsheet in &book.spreadsheets {
        let file = pick(
            options.override_spec,
            options.spreadsheet,
            spreadsheet.file.as_deref(),
        )
        .ok_or_else(|| ExecError::Semantic("no spreadsheet has been given".into()))?
        .to_string();
        let sheet = pick(
            options.override_spec,
            options.sheet,
            spreadsheet.sheet.as_deref(),
        )
        .unwrap_or("Sheet1")
        .to_string();

        reporter.info(&format!("spreadsheet '{file}::{sheet}'"));
        let grid = execute_registry(spreadsheet, stores, options, reporter)?;

        let output = SheetOutput { name: sheet, grid };
        match outputs.iter_mut().find(|o| o.file == file) {
            Some(existing) => existing.sheets.push(output),
            None => outputs.push(FileOutput {
                file,
                sheets: vec![output],
            }),
        }
    }

    Ok(outputs)
}

/// The call-site parameter wins only under `override`; otherwise the value
/// embedded in the specification has precedence
fn pick<'a>(override_spec: bool, call_site: Option<&'a str>, spec: Option<&'a str>) -> Option<&'a str> {
    if override_spec {
        call_site.or(spec)
    } else {
        spec.or(call_site)
    }
}

fn execute_registry(
    spreadsheet: &Spreadsheet,
    stores: &dyn StoreProvider,
    options: &ExecuteOptions<'_>,
    reporter: &mut dyn Reporter,
) -> ExecResult<DynamicArray> {
    let database = pick(
        options.override_spec,
        options.database,
        spreadsheet.database.as_deref(),
    );

    let mut grid = DynamicArray::new();
    let mut context = Context::new();

    for command in &spreadsheet.registry.commands {
        match command {
            Command::Literal(literal) => {
                execute_literal(literal, &mut grid, &mut context, reporter)?;
            }
            Command::Query(query) => {
                execute_query(query, database, stores, &mut grid, &mut context, reporter)?;
            }
        }
    }

    Ok(grid)
}

fn execute_literal(
    literal: &LiteralCommand,
    grid: &mut DynamicArray,
    context: &mut Context,
    _reporter: &mut dyn Reporter,
) -> ExecResult<()> {
    let range = resolve_target(&literal.target, context)?;

    // both substitution passes run over textual content before writing
    let value = match &literal.value {
        Value::Text(text) => Value::Text(substitute(&evaluate(text, context)?, context)?),
        Value::Formula(text) => Value::Formula(substitute(&evaluate(text, context)?, context)?),
        other => other.clone(),
    };

    let mut touched = BoundingBox::new();
    for address in targets(&range, literal.direction) {
        let address = address?;
        // formulas behave like a spreadsheet fill: unqualified references
        // move with the cell
        let cell_value = match &value {
            Value::Formula(text) => Value::Formula(drag_formula(
                text,
                (address.column - range.start().column) as i64,
                (address.row - range.start().row) as i64,
            )?),
            other => other.clone(),
        };
        grid.write(
            address,
            Cell::with_attributes(cell_value, literal.attributes.clone()),
        );
        touched.grow(address);
    }

    if let (Some(name), Some(bounding)) = (&literal.name, touched.range()) {
        register_box(context, "literal", name, bounding);
    }
    Ok(())
}

fn execute_query(
    query: &QueryCommand,
    spreadsheet_db: Option<&str>,
    stores: &dyn StoreProvider,
    grid: &mut DynamicArray,
    context: &mut Context,
    reporter: &mut dyn Reporter,
) -> ExecResult<()> {
    let database = query
        .database
        .as_deref()
        .or(spreadsheet_db)
        .ok_or_else(|| ExecError::Semantic("no database has been given".into()))?;
    let mut store = stores.open(database)?;

    let sql = substitute(&evaluate(&query.sql, context)?, context)?;
    let tuples = store.query(&sql)?;

    let range = resolve_target(&query.target, context)?;
    let start = range.start();
    let mut touched = BoundingBox::new();

    for (index, tuple) in tuples.iter().enumerate() {
        // a range without a direction holds only as many tuples as it has
        // rows; replication beyond it needs an explicit direction
        if query.direction.is_none() && index as u64 >= range.rows() as u64 {
            reporter.warning(&format!(
                "query produced {} tuples but the range {range} holds {}; dropping the rest",
                tuples.len(),
                range.rows()
            ));
            break;
        }

        for (field, value) in tuple.iter().enumerate() {
            // tuples lie along rows and slide down by default; under
            // `right` they lie along columns and slide right
            let address = match query.direction {
                Some(Direction::Right) => start.offset(index as i64, field as i64)?,
                _ => start.offset(field as i64, index as i64)?,
            };
            grid.write(
                address,
                Cell::with_attributes(value.clone(), query.attributes.clone()),
            );
            touched.grow(address);
        }
    }

    if let (Some(name), Some(bounding)) = (&query.name, touched.range()) {
        register_box(context, "query", name, bounding);
    }
    Ok(())
}

/// The cells a literal writes: its range as declared, or the same number of
/// cells walked from the range's start when a direction reinterprets it
fn targets(
    range: &CellRange,
    direction: Option<Direction>,
) -> Box<dyn Iterator<Item = ExecResult<CellAddress>> + '_> {
    let start = range.start();
    match direction {
        None => Box::new(range.cells().map(Ok)),
        Some(Direction::Right) => Box::new(
            (0..range.len()).map(move |i| start.add_columns(i as i64).map_err(Into::into)),
        ),
        Some(Direction::Down) => Box::new(
            (0..range.len()).map(move |i| start.add_rows(i as i64).map_err(Into::into)),
        ),
    }
}

fn resolve_target(
    target: &(CellSpec, CellSpec),
    context: &Context,
) -> ExecResult<CellRange> {
    let start = resolve_spec(&target.0, context)?;
    let end = resolve_spec(&target.1, context)?;
    Ok(CellRange::new(start, end))
}

fn resolve_spec(spec: &CellSpec, context: &Context) -> ExecResult<CellAddress> {
    match spec {
        CellSpec::Cell(cell) => match cell.descriptor {
            Descriptor::Coord(address) => {
                Ok(address.offset(cell.col_offset, cell.row_offset)?)
            }
            // the parser only lets explicit cells through
            _ => Err(ExecError::Semantic(format!(
                "cell '{cell}' cannot target a spreadsheet"
            ))),
        },
        CellSpec::Variable {
            name,
            col_offset,
            row_offset,
        } => {
            let address = context
                .named(name)
                .ok_or_else(|| CoreError::UnknownVariable(name.clone()))?;
            Ok(address.offset(*col_offset, *row_offset)?)
        }
    }
}

static FORMULA_REF: &Lazy<Regex> = regex!(r"\$?[A-Za-z]+\$?\d+");

/// Shift every unqualified cell reference in a formula by the given offset
///
/// References carrying a `$` stay put, as do candidates embedded in longer
/// words or followed by `(` (function names such as LOG10).
fn drag_formula(text: &str, columns: i64, rows: i64) -> ExecResult<String> {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;

    for site in FORMULA_REF.find_iter(text) {
        let before = text[..site.start()].chars().next_back();
        let after = text[site.end()..].chars().next();
        let embedded = matches!(before, Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '$')
            || matches!(after, Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '(');
        let qualified = site.as_str().contains('$');

        result.push_str(&text[last..site.start()]);
        if embedded || qualified {
            result.push_str(site.as_str());
        } else {
            match CellAddress::parse(site.as_str()) {
                Ok(address) => result.push_str(&address.offset(columns, rows)?.name()),
                Err(_) => result.push_str(site.as_str()),
            }
        }
        last = site.end();
    }
    result.push_str(&text[last..]);
    Ok(result)
}

/// Tracks the rectangle of cells a command actually writes
struct BoundingBox {
    range: Option<CellRange>,
}

impl BoundingBox {
    fn new() -> Self {
        Self { range: None }
    }

    fn grow(&mut self, address: CellAddress) {
        self.range = Some(match self.range {
            None => CellRange::single(address),
            Some(range) => {
                let start = CellAddress::new(
                    range.start().column.min(address.column),
                    range.start().row.min(address.row),
                );
                let end = CellAddress::new(
                    range.end().column.max(address.column),
                    range.end().row.max(address.row),
                );
                CellRange::new(start, end)
            }
        });
    }

    fn range(&self) -> Option<CellRange> {
        self.range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::BufferReporter;
    use crate::error::StoreError;
    use crate::store::Store;
    use pretty_assertions::assert_eq;
    use sheetbridge_lang::parse_sheet_spec;

    /// Store double handing out canned tuples
    #[derive(Default)]
    struct CannedStore {
        tuples: Vec<Vec<Value>>,
    }

    impl Store for CannedStore {
        fn execute(&mut self, _sql: &str) -> Result<(), StoreError> {
            Ok(())
        }

        fn query(&mut self, _sql: &str) -> Result<Vec<Vec<Value>>, StoreError> {
            Ok(self.tuples.clone())
        }

        fn insert(
            &mut self,
            _table: &str,
            _columns: usize,
            _rows: &[Vec<Value>],
        ) -> Result<(), StoreError> {
            Ok(())
        }

        fn table_exists(&mut self, _name: &str) -> Result<bool, StoreError> {
            Ok(false)
        }

        fn begin(&mut self) -> Result<(), StoreError> {
            Ok(())
        }

        fn commit(&mut self) -> Result<(), StoreError> {
            Ok(())
        }

        fn rollback(&mut self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct CannedProvider {
        tuples: Vec<Vec<Value>>,
    }

    impl StoreProvider for CannedProvider {
        fn open(&self, _database: &str) -> Result<Box<dyn Store>, StoreError> {
            Ok(Box::new(CannedStore {
                tuples: self.tuples.clone(),
            }))
        }
    }

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    fn run(spec: &str, tuples: Vec<Vec<Value>>) -> (Vec<FileOutput>, BufferReporter) {
        let book = parse_sheet_spec(spec).unwrap();
        let provider = CannedProvider { tuples };
        let mut reporter = BufferReporter::new();
        let outputs = execute_book(
            &book,
            &provider,
            &ExecuteOptions {
                database: Some("test.db"),
                spreadsheet: Some("out"),
                ..Default::default()
            },
            &mut reporter,
        )
        .unwrap();
        (outputs, reporter)
    }

    fn text_at(grid: &DynamicArray, cell: &str) -> Option<String> {
        grid.get(&addr(cell)).map(|c| c.value.to_text())
    }

    #[test]
    fn test_literal_fills_its_range() {
        let (outputs, _) = run(r#"{ $B2 : $C3 down "x"; }"#, vec![]);
        let grid = &outputs[0].sheets[0].grid;
        assert_eq!(grid.len(), 4);
        for cell in ["B2", "B3", "C2", "C3"] {
            assert_eq!(text_at(grid, cell).as_deref(), Some("x"));
        }
    }

    #[test]
    fn test_directed_literal_replicates_from_the_start() {
        // three cells declared down column A, replicated to the right
        let (outputs, _) = run(r#"{ $A1 : $A3 right "x"; }"#, vec![]);
        let grid = &outputs[0].sheets[0].grid;
        assert_eq!(grid.len(), 3);
        for cell in ["A1", "B1", "C1"] {
            assert_eq!(text_at(grid, cell).as_deref(), Some("x"));
        }
        assert_eq!(grid.get(&addr("A2")), None);
    }

    #[test]
    fn test_query_tuples_lie_along_rows_and_slide_down() {
        let tuples = vec![
            vec![Value::text("ann"), Value::Integer(34)],
            vec![Value::text("bob"), Value::Integer(27)],
            vec![Value::text("cho"), Value::Integer(41)],
        ];
        let (outputs, _) = run(
            r#"query q "SELECT name, age FROM people"
               { $A2 : $B2 down query.q; }"#,
            tuples,
        );
        let grid = &outputs[0].sheets[0].grid;
        assert_eq!(text_at(grid, "A2").as_deref(), Some("ann"));
        assert_eq!(text_at(grid, "B2").as_deref(), Some("34"));
        assert_eq!(text_at(grid, "A4").as_deref(), Some("cho"));
        assert_eq!(text_at(grid, "B4").as_deref(), Some("41"));
    }

    #[test]
    fn test_query_direction_right_transposes() {
        let tuples = vec![
            vec![Value::Integer(1), Value::Integer(2)],
            vec![Value::Integer(3), Value::Integer(4)],
        ];
        let (outputs, _) = run(
            r#"query q "SELECT a, b FROM t"
               { $B2 : $B3 right query.q; }"#,
            tuples,
        );
        let grid = &outputs[0].sheets[0].grid;
        // first tuple down column B, second down column C
        assert_eq!(text_at(grid, "B2").as_deref(), Some("1"));
        assert_eq!(text_at(grid, "B3").as_deref(), Some("2"));
        assert_eq!(text_at(grid, "C2").as_deref(), Some("3"));
        assert_eq!(text_at(grid, "C3").as_deref(), Some("4"));
    }

    #[test]
    fn test_directionless_query_drops_excess_tuples_with_a_warning() {
        let tuples = vec![
            vec![Value::Integer(1)],
            vec![Value::Integer(2)],
        ];
        let (outputs, reporter) = run(
            r#"query q "SELECT a FROM t"
               { $A1 query.q; }"#,
            tuples,
        );
        let grid = &outputs[0].sheets[0].grid;
        assert_eq!(grid.len(), 1);
        assert_eq!(text_at(grid, "A1").as_deref(), Some("1"));
        assert_eq!(reporter.warnings().len(), 1);
    }

    #[test]
    fn test_named_query_registers_box_for_later_commands() {
        let tuples = vec![
            vec![Value::Integer(1), Value::Integer(2)],
            vec![Value::Integer(3), Value::Integer(4)],
        ];
        let (outputs, _) = run(
            r#"query q "SELECT a, b FROM t"
               { $A1 : $B1 down query.q;
                 $query.q.se + (1, 0) "total"; }"#,
            tuples,
        );
        let grid = &outputs[0].sheets[0].grid;
        // the query touched A1:B2, so se + (1,0) is C2
        assert_eq!(text_at(grid, "C2").as_deref(), Some("total"));
    }

    #[test]
    fn test_formula_dragging() {
        let (outputs, _) = run(r#"{ $C1 : $C3 down "=A1+B$1+LOG10(A1)"; }"#, vec![]);
        let grid = &outputs[0].sheets[0].grid;
        assert_eq!(
            text_at(grid, "C1").as_deref(),
            Some("=A1+B$1+LOG10(A1)")
        );
        assert_eq!(
            text_at(grid, "C3").as_deref(),
            Some("=A3+B$1+LOG10(A3)")
        );
    }

    #[test]
    fn test_variable_substitution_inside_literal_text() {
        let (outputs, _) = run(
            r#"literal header "totals"
               { $A1 : $A2 down literal.header;
                 $D1 "=SUM($literal.header.nw:$literal.header.se)";
                 $D2 "rate is $$literal.header.nw"; }"#,
            vec![],
        );
        let grid = &outputs[0].sheets[0].grid;
        assert_eq!(text_at(grid, "D1").as_deref(), Some("=SUM(A1:A2)"));
        // the doubled sigil keeps one dollar for the spreadsheet
        assert_eq!(text_at(grid, "D2").as_deref(), Some("rate is $A1"));
    }

    #[test]
    fn test_attributes_reach_the_grid() {
        let (outputs, _) = run(r#"{ $A1 [bold : 1] "x"; }"#, vec![]);
        let grid = &outputs[0].sheets[0].grid;
        let cell = grid.get(&addr("A1")).unwrap();
        assert_eq!(
            cell.attributes,
            vec![("bold".to_string(), Value::Integer(1))]
        );
    }

    #[test]
    fn test_outputs_group_by_file() {
        let (outputs, _) = run(
            r#""a.csv" : "one" { $A1 1; }
               "b.csv" : { $A1 2; }
               "a.csv" : "two" { $A1 3; }"#,
            vec![],
        );
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].file, "a.csv");
        assert_eq!(outputs[0].sheets.len(), 2);
        assert_eq!(outputs[0].sheets[1].name, "two");
        assert_eq!(outputs[1].file, "b.csv");
    }

    #[test]
    fn test_missing_file_and_database_are_semantic_errors() {
        let book = parse_sheet_spec("{ $A1 1; }").unwrap();
        let provider = CannedProvider { tuples: vec![] };
        let mut reporter = BufferReporter::new();
        let result = execute_book(
            &book,
            &provider,
            &ExecuteOptions::default(),
            &mut reporter,
        );
        assert!(matches!(result, Err(ExecError::Semantic(_))));

        let book = parse_sheet_spec(r#"query q "SELECT 1" { $A1 query.q; }"#).unwrap();
        let result = execute_book(
            &book,
            &provider,
            &ExecuteOptions {
                spreadsheet: Some("out"),
                ..Default::default()
            },
            &mut reporter,
        );
        assert!(matches!(result, Err(ExecError::Semantic(_))));
    }
}

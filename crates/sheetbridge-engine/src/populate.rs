//! The table-side executor: spreadsheet regions into relational tables
//!
//! Walks a parsed [`Database`] strictly in declaration order. Tables
//! resolve their columns against the grid, assemble rows and insert them;
//! `exec` statements run verbatim when the walk reaches them. Each table's
//! insertions happen inside one store transaction, so a fatal abort leaves
//! previously committed tables intact and nothing half-written.

use crate::cast::resolve_value;
use crate::diag::Reporter;
use crate::error::{ExecError, ExecResult};
use crate::rows::{assemble_rows, ResolvedColumn};
use crate::schema::{create_index_sql, create_table_sql};
use crate::store::Store;
use sheetbridge_core::SheetSource;
use sheetbridge_lang::table::{Content, Database, Expression, Table};

/// Opens the spreadsheets named by table specifications
pub trait GridProvider {
    fn open(&self, spreadsheet: &str, sheet: Option<&str>) -> ExecResult<Box<dyn SheetSource>>;
}

/// Call-site parameters for [`populate`]
#[derive(Debug, Default, Clone, Copy)]
pub struct PopulateOptions<'a> {
    pub spreadsheet: Option<&'a str>,
    pub sheet: Option<&'a str>,
    /// When set, the call-site spreadsheet/sheet win over values embedded
    /// in the specification
    pub override_spec: bool,
}

/// Create the schema of every table, in declaration order
///
/// An already existing table is an error unless `append` is set, in which
/// case it is left alone.
pub fn materialize(db: &Database, store: &mut dyn Store, append: bool) -> ExecResult<()> {
    store.begin()?;
    let result = materialize_inner(db, store, append);
    match result {
        Ok(()) => store.commit().map_err(Into::into),
        Err(err) => {
            store.rollback().ok();
            Err(err)
        }
    }
}

fn materialize_inner(db: &Database, store: &mut dyn Store, append: bool) -> ExecResult<()> {
    for table in db.tables() {
        if store.table_exists(&table.name)? {
            if !append {
                return Err(ExecError::Semantic(format!(
                    "table '{}' already exists",
                    table.name
                )));
            }
            continue;
        }

        ensure_typed(table)?;
        store.execute(&create_table_sql(table))?;
        if let Some(index) = create_index_sql(table) {
            store.execute(&index)?;
        }
    }
    Ok(())
}

/// Transfer data from the spreadsheets into the store
pub fn populate(
    db: &Database,
    store: &mut dyn Store,
    grids: &dyn GridProvider,
    options: &PopulateOptions<'_>,
    reporter: &mut dyn Reporter,
) -> ExecResult<()> {
    for expression in &db.expressions {
        match expression {
            Expression::Sql(statement) => {
                reporter.info(&format!("sql statement '{}'", statement.text));
                store.execute(&statement.text)?;
            }
            Expression::Table(table) => {
                reporter.info(&format!("block {}", table.name));
                populate_table(table, store, grids, options, reporter)?;
            }
        }
    }
    Ok(())
}

fn populate_table(
    table: &Table,
    store: &mut dyn Store,
    grids: &dyn GridProvider,
    options: &PopulateOptions<'_>,
    reporter: &mut dyn Reporter,
) -> ExecResult<()> {
    ensure_typed(table)?;

    // the specification wins unless the caller overrides
    let (spreadsheet, sheet) = if options.override_spec {
        (
            options.spreadsheet.or(table.spreadsheet.as_deref()),
            options.sheet.or(table.sheet.as_deref()),
        )
    } else {
        (
            table.spreadsheet.as_deref().or(options.spreadsheet),
            table.sheet.as_deref().or(options.sheet),
        )
    };
    let spreadsheet =
        spreadsheet.ok_or_else(|| ExecError::Semantic("no spreadsheet has been given".into()))?;

    let grid = grids.open(spreadsheet, sheet)?;
    let place_sheet = sheet.unwrap_or("default");

    let mut context = table.block.context();
    let mut resolved = Vec::with_capacity(table.block.columns.len());

    for column in &table.block.columns {
        reporter.info(&format!("looking up column {}", column.name));
        let data_type = column.data_type.expect("checked by ensure_typed");
        let mut values = Vec::new();

        for content in &column.contents {
            match content {
                Content::Explicit(value) => {
                    values.push(resolve_value(
                        Some(value.clone()),
                        data_type,
                        &column.action,
                        &column.name,
                        &format!("'{}::{}'", spreadsheet, place_sheet),
                        reporter,
                    )?);
                }
                Content::Cells(range_ref) => {
                    let range = range_ref.resolve(grid.as_ref(), &mut context)?;
                    for address in range.cells() {
                        let found = grid.value(&address).filter(|v| !v.is_blank());
                        values.push(resolve_value(
                            found,
                            data_type,
                            &column.action,
                            &column.name,
                            &format!("cell {address} in '{}::{}'", spreadsheet, place_sheet),
                            reporter,
                        )?);
                    }
                }
            }
        }

        resolved.push(ResolvedColumn {
            name: column.name.clone(),
            values,
        });
    }

    let rows = assemble_rows(resolved, &context, reporter)?;

    store.begin()?;
    match store.insert(&table.name, table.block.columns.len(), &rows) {
        Ok(()) => store.commit().map_err(Into::into),
        Err(err) => {
            store.rollback().ok();
            Err(err.into())
        }
    }
}

fn ensure_typed(table: &Table) -> ExecResult<()> {
    if table.block.is_typed() {
        Ok(())
    } else {
        Err(ExecError::Semantic(format!(
            "the block in table '{}' contains columns with unspecified types",
            table.name
        )))
    }
}

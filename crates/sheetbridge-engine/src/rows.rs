//! The row assembler and its validators
//!
//! Resolved column value sequences are aligned positionally into rows:
//! length-1 columns broadcast to the longest column's length, any other
//! mismatch is a fatal shape error. Rows containing a missing marker are
//! dropped, then the block's modifiers decide acceptance and the count
//! validators report on the final tally.

use crate::diag::Reporter;
use crate::error::{ExecError, ExecResult};
use ahash::AHashMap;
use sheetbridge_core::{Context, ContextKey, Value};

/// A resolved column: its name and its value sequence, with `None` marking
/// values that stayed missing
pub struct ResolvedColumn {
    pub name: String,
    pub values: Vec<Option<Value>>,
}

/// Align columns into rows and apply the block's modifiers
pub fn assemble_rows(
    mut columns: Vec<ResolvedColumn>,
    modifiers: &Context,
    reporter: &mut dyn Reporter,
) -> ExecResult<Vec<Vec<Value>>> {
    let longest = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);

    for column in &mut columns {
        if column.values.len() == 1 && longest > 1 {
            let only = column.values[0].clone();
            column.values.resize(longest, only);
        } else if column.values.len() != longest {
            return Err(ExecError::Shape {
                column: column.name.clone(),
                actual: column.values.len(),
                expected: longest,
            });
        }
    }

    let enforce_unique = modifiers.contains(&ContextKey::EnforceUnique);
    let check_duplicates = modifiers.contains(&ContextKey::CheckDuplicates);

    let mut seen: AHashMap<String, u32> = AHashMap::new();
    let mut rows: Vec<Vec<Value>> = Vec::new();

    for index in 0..longest {
        let mut row = Vec::with_capacity(columns.len());
        let mut complete = true;
        for column in &columns {
            match &column.values[index] {
                Some(value) => row.push(value.clone()),
                None => {
                    complete = false;
                    break;
                }
            }
        }
        // a row with an unresolved missing marker is dropped
        if !complete {
            continue;
        }

        let occurrences = seen.entry(row_key(&row)).or_insert(0);
        *occurrences += 1;

        if *occurrences > 1 {
            if check_duplicates && *occurrences == 2 {
                reporter.warning(&format!("duplicated row: {}", describe(&row)));
            }
            if enforce_unique {
                continue;
            }
        }

        rows.push(row);
    }

    report_counts(rows.len() as i64, modifiers, reporter);
    Ok(rows)
}

fn report_counts(accepted: i64, modifiers: &Context, reporter: &mut dyn Reporter) {
    if let Some(bound) = modifiers.number(&ContextKey::Geq) {
        if bound > accepted {
            reporter.warning(&format!("{accepted} < {bound} rows generated"));
        }
    }
    if let Some(bound) = modifiers.number(&ContextKey::Leq) {
        if bound < accepted {
            reporter.warning(&format!("{accepted} > {bound} rows generated"));
        }
    }
    if let Some(bound) = modifiers.number(&ContextKey::Eq) {
        if bound != accepted {
            reporter.warning(&format!("{accepted} != {bound} rows generated"));
        }
    }
    if let Some(bound) = modifiers.number(&ContextKey::Neq) {
        if bound == accepted {
            reporter.warning(&format!("{accepted} = {bound} rows generated"));
        }
    }
}

/// Rows are deduplicated by their rendered fields; fields never mix types
/// within a column, so the textual form is discriminating enough
fn row_key(row: &[Value]) -> String {
    let mut key = String::new();
    for value in row {
        key.push_str(&value.to_text());
        key.push('\u{1f}');
    }
    key
}

fn describe(row: &[Value]) -> String {
    let fields: Vec<String> = row.iter().map(|v| v.to_text()).collect();
    format!("({})", fields.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::BufferReporter;
    use pretty_assertions::assert_eq;
    use sheetbridge_core::ContextValue;

    fn column(name: &str, values: Vec<Option<Value>>) -> ResolvedColumn {
        ResolvedColumn {
            name: name.to_string(),
            values,
        }
    }

    fn ints(values: &[i64]) -> Vec<Option<Value>> {
        values.iter().map(|n| Some(Value::Integer(*n))).collect()
    }

    #[test]
    fn test_rows_align_positionally() {
        let mut reporter = BufferReporter::new();
        let rows = assemble_rows(
            vec![
                column("a", ints(&[1, 2, 3])),
                column("b", ints(&[4, 5, 6])),
            ],
            &Context::new(),
            &mut reporter,
        )
        .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec![Value::Integer(2), Value::Integer(5)]);
    }

    #[test]
    fn test_short_columns_broadcast() {
        let mut reporter = BufferReporter::new();
        let rows = assemble_rows(
            vec![column("a", ints(&[7])), column("b", ints(&[1, 2, 3]))],
            &Context::new(),
            &mut reporter,
        )
        .unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r[0] == Value::Integer(7)));
    }

    #[test]
    fn test_other_length_mismatches_are_fatal() {
        let mut reporter = BufferReporter::new();
        let result = assemble_rows(
            vec![column("a", ints(&[1, 2])), column("b", ints(&[1, 2, 3]))],
            &Context::new(),
            &mut reporter,
        );
        assert!(matches!(result, Err(ExecError::Shape { .. })));
    }

    #[test]
    fn test_rows_with_missing_markers_are_dropped() {
        let mut reporter = BufferReporter::new();
        let rows = assemble_rows(
            vec![
                column("a", vec![Some(Value::Integer(1)), None, Some(Value::Integer(3))]),
                column("b", ints(&[4, 5, 6])),
            ],
            &Context::new(),
            &mut reporter,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_enforce_unique_skips_repeats() {
        let mut modifiers = Context::new();
        modifiers.set(ContextKey::EnforceUnique, ContextValue::Flag);

        let mut reporter = BufferReporter::new();
        let rows = assemble_rows(
            vec![
                column("a", ints(&[1, 1])),
                column(
                    "b",
                    vec![Some(Value::text("a")), Some(Value::text("a"))],
                ),
            ],
            &modifiers,
            &mut reporter,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn test_check_duplicates_keeps_repeats_but_warns_once() {
        let mut modifiers = Context::new();
        modifiers.set(ContextKey::CheckDuplicates, ContextValue::Flag);

        let mut reporter = BufferReporter::new();
        let rows = assemble_rows(
            vec![
                column("a", ints(&[1, 1])),
                column(
                    "b",
                    vec![Some(Value::text("a")), Some(Value::text("a"))],
                ),
            ],
            &modifiers,
            &mut reporter,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(reporter.warnings().len(), 1);
    }

    #[test]
    fn test_count_validators_warn_without_aborting() {
        let mut modifiers = Context::new();
        modifiers.set(ContextKey::Geq, ContextValue::Number(5));
        modifiers.set(ContextKey::Neq, ContextValue::Number(2));

        let mut reporter = BufferReporter::new();
        let rows = assemble_rows(
            vec![column("a", ints(&[1, 2]))],
            &modifiers,
            &mut reporter,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        // 2 < 5, and exactly 2 == the neq bound
        assert_eq!(reporter.warnings().len(), 2);
    }
}

//! The cast/action engine
//!
//! Every value a column reads goes through one state machine: missing data
//! and failed casts both route through the column's action, which decides
//! between aborting, warning with a default, or silently defaulting. A
//! default is computed once, in the branch that selected it, and a default
//! that cannot cast to the column type is fatal no matter what the action
//! says: defaults are assumed well-formed by the author.

use crate::diag::Reporter;
use crate::error::{ExecError, ExecResult};
use sheetbridge_core::{DataType, Value};
use sheetbridge_lang::table::Action;

/// Resolve one value lookup for a column
///
/// `found` is the raw value (or nothing, for an empty cell); `place`
/// describes where it came from, for diagnostics. Returns `Ok(None)` when
/// the action substitutes no default: the row assembler drops such rows.
pub fn resolve_value(
    found: Option<Value>,
    data_type: DataType,
    action: &Action,
    column: &str,
    place: &str,
    reporter: &mut dyn Reporter,
) -> ExecResult<Option<Value>> {
    match found {
        None => {
            let message = format!("no data was found in {place}");
            apply_action(action, data_type, column, &message, reporter)
        }
        Some(value) => match value.cast(data_type) {
            Ok(cast) => Ok(Some(cast)),
            Err(_) => {
                let message = format!(
                    "it was not possible to cast the value '{value}' in {place} to the type {data_type}"
                );
                apply_action(action, data_type, column, &message, reporter)
            }
        },
    }
}

fn apply_action(
    action: &Action,
    data_type: DataType,
    column: &str,
    message: &str,
    reporter: &mut dyn Reporter,
) -> ExecResult<Option<Value>> {
    match action {
        Action::Error => Err(ExecError::Action(message.to_string())),
        Action::Warning(default) => {
            reporter.warning(message);
            cast_default(default.as_ref(), data_type, column)
        }
        Action::None(default) => cast_default(default.as_ref(), data_type, column),
    }
}

fn cast_default(
    default: Option<&Value>,
    data_type: DataType,
    column: &str,
) -> ExecResult<Option<Value>> {
    match default {
        None => Ok(None),
        Some(value) => value
            .cast(data_type)
            .map(Some)
            .map_err(|_| ExecError::DefaultCast {
                column: column.to_string(),
                value: value.to_text(),
                data_type: data_type.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::BufferReporter;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_present_value_casts() {
        let mut reporter = BufferReporter::new();
        let value = resolve_value(
            Some(Value::text("42")),
            DataType::Integer,
            &Action::Error,
            "a",
            "cell A1",
            &mut reporter,
        )
        .unwrap();
        assert_eq!(value, Some(Value::Integer(42)));
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn test_missing_value_with_error_action_aborts() {
        let mut reporter = BufferReporter::new();
        let result = resolve_value(
            None,
            DataType::Integer,
            &Action::Error,
            "a",
            "cell B2",
            &mut reporter,
        );
        assert!(matches!(result, Err(ExecError::Action(_))));
    }

    #[test]
    fn test_missing_value_with_warning_action_defaults() {
        let mut reporter = BufferReporter::new();
        let value = resolve_value(
            None,
            DataType::Integer,
            &Action::Warning(Some(Value::Integer(0))),
            "a",
            "cell B2",
            &mut reporter,
        )
        .unwrap();
        assert_eq!(value, Some(Value::Integer(0)));
        assert_eq!(reporter.warnings().len(), 1);
    }

    #[test]
    fn test_silent_action_without_default_yields_a_missing_marker() {
        let mut reporter = BufferReporter::new();
        let value = resolve_value(
            None,
            DataType::Text,
            &Action::None(None),
            "a",
            "cell B2",
            &mut reporter,
        )
        .unwrap();
        assert_eq!(value, None);
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn test_cast_failure_routes_through_the_action() {
        let mut reporter = BufferReporter::new();
        let value = resolve_value(
            Some(Value::text("not a number")),
            DataType::Integer,
            &Action::Warning(Some(Value::Integer(-1))),
            "a",
            "cell C3",
            &mut reporter,
        )
        .unwrap();
        assert_eq!(value, Some(Value::Integer(-1)));
        assert_eq!(reporter.warnings().len(), 1);
    }

    #[test]
    fn test_uncastable_default_is_always_fatal() {
        let mut reporter = BufferReporter::new();
        let result = resolve_value(
            None,
            DataType::Integer,
            &Action::None(Some(Value::text("oops"))),
            "a",
            "cell D4",
            &mut reporter,
        );
        assert!(matches!(result, Err(ExecError::DefaultCast { .. })));
    }

    #[test]
    fn test_defaults_cast_to_the_column_type() {
        let mut reporter = BufferReporter::new();
        let value = resolve_value(
            None,
            DataType::Real,
            &Action::None(Some(Value::Integer(3))),
            "a",
            "cell E5",
            &mut reporter,
        )
        .unwrap();
        assert_eq!(value, Some(Value::Real(3.0)));
    }
}

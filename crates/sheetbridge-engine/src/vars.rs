//! Bounding-box context variables and textual substitution
//!
//! After a named command executes, the rectangle of cells it actually
//! touched is registered under eight symbolic names. Later command content
//! goes through two passes: [`evaluate`] rewrites `$var + (dx,dy)` forms,
//! then [`substitute`] rewrites bare `$var` forms; a doubled `$$var` keeps
//! one leading `$` so formulas can escape the sigil.

use crate::error::{ExecError, ExecResult};
use lazy_regex::{regex, Lazy};
use regex::Regex;
use sheetbridge_core::{CellAddress, CellRange, Context, Error as CoreError};

/// The variable name shape: `prefix.name.corner`
const VAR_NAME: &str = r"[A-Za-z_]+\.[A-Za-z_][A-Za-z_0-9]*\.[A-Za-z_]+";

static EVALUATE: &Lazy<Regex> = regex!(
    r"\$(?P<name>[A-Za-z_]+\.[A-Za-z_][A-Za-z_0-9]*\.[A-Za-z_]+)\s*\+\s*\(\s*(?P<cols>[+-]?\d+)\s*,\s*(?P<rows>[+-]?\d+)\s*\)"
);

/// Register the eight corner/midpoint variables of a command's bounding box
///
/// Midpoints use floor division when the span is odd.
pub fn register_box(context: &mut Context, prefix: &str, name: &str, bounding: CellRange) {
    let (start, end) = (bounding.start(), bounding.end());
    let mid_column = (start.column + end.column) / 2;
    let mid_row = (start.row + end.row) / 2;

    let corners = [
        ("nw", CellAddress::new(start.column, start.row)),
        ("ne", CellAddress::new(end.column, start.row)),
        ("sw", CellAddress::new(start.column, end.row)),
        ("se", CellAddress::new(end.column, end.row)),
        ("north", CellAddress::new(mid_column, start.row)),
        ("south", CellAddress::new(mid_column, end.row)),
        ("west", CellAddress::new(start.column, mid_row)),
        ("east", CellAddress::new(end.column, mid_row)),
    ];
    for (corner, address) in corners {
        context.set_named(format!("{prefix}.{name}.{corner}"), address);
    }
}

/// First pass: replace every `$var + (dx,dy)` with the offset cell's name
pub fn evaluate(text: &str, context: &Context) -> ExecResult<String> {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;

    for captures in EVALUATE.captures_iter(text) {
        let whole = captures.get(0).expect("group 0 always matches");
        let name = &captures["name"];

        let address = context
            .named(name)
            .ok_or_else(|| CoreError::UnknownVariable(name.to_string()))?;
        let columns: i64 = captures["cols"].parse().expect("matched as an integer");
        let rows: i64 = captures["rows"].parse().expect("matched as an integer");
        let shifted = address.offset(columns, rows)?;

        result.push_str(&text[last..whole.start()]);
        result.push_str(&shifted.name());
        last = whole.end();
    }
    result.push_str(&text[last..]);
    Ok(result)
}

/// Second pass: replace every bare `$var` with the cell's name
///
/// A `$$var` keeps one `$` in front of the substituted name. Exposed with
/// the name pattern as a parameter so the escaping behavior is testable on
/// its own.
pub fn substitute(text: &str, context: &Context) -> ExecResult<String> {
    substitute_pattern(VAR_NAME, text, &|name| {
        context.named(name).map(|addr| addr.name())
    })
}

/// [`substitute`] over an arbitrary variable-name pattern and lookup
pub fn substitute_pattern(
    name_pattern: &str,
    text: &str,
    resolve: &dyn Fn(&str) -> Option<String>,
) -> ExecResult<String> {
    // the regex crate has no lookbehind; capture an optional extra sigil
    // instead and re-emit it
    let pattern = Regex::new(&format!(r"(?P<escape>\$?)\$(?P<name>{name_pattern})"))
        .map_err(|e| ExecError::Semantic(format!("bad variable pattern: {e}")))?;

    let mut result = String::with_capacity(text.len());
    let mut last = 0;

    for captures in pattern.captures_iter(text) {
        let whole = captures.get(0).expect("group 0 always matches");
        let name = &captures["name"];
        let value = resolve(name).ok_or_else(|| CoreError::UnknownVariable(name.to_string()))?;

        result.push_str(&text[last..whole.start()]);
        if !captures["escape"].is_empty() {
            result.push('$');
        }
        result.push_str(&value);
        last = whole.end();
    }
    result.push_str(&text[last..]);
    Ok(result)
}

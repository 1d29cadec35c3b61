//! The per-execution symbol table
//!
//! One context lives for the duration of one table block or one command
//! registry. It starts empty, gets populated lazily as resolution and
//! execution proceed, and is thrown away afterwards.

use crate::cell::CellAddress;
use std::fmt;

/// Keys of the context
///
/// The closed variants cover the bounds and modifiers the languages define;
/// `Named` covers the open-ended `literal.<name>.<corner>` /
/// `query.<name>.<corner>` variable space registered at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContextKey {
    MinRow,
    MaxRow,
    MinColumn,
    MaxColumn,
    Geq,
    Leq,
    Eq,
    Neq,
    Len,
    EnforceUnique,
    CheckDuplicates,
    Named(String),
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKey::MinRow => f.write_str("min_row"),
            ContextKey::MaxRow => f.write_str("max_row"),
            ContextKey::MinColumn => f.write_str("min_column"),
            ContextKey::MaxColumn => f.write_str("max_column"),
            ContextKey::Geq => f.write_str("geq"),
            ContextKey::Leq => f.write_str("leq"),
            ContextKey::Eq => f.write_str("eq"),
            ContextKey::Neq => f.write_str("neq"),
            ContextKey::Len => f.write_str("len"),
            ContextKey::EnforceUnique => f.write_str("enforce_unique"),
            ContextKey::CheckDuplicates => f.write_str("check_duplicates"),
            ContextKey::Named(name) => f.write_str(name),
        }
    }
}

/// What a context entry holds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContextValue {
    /// A resolved cell address
    Address(CellAddress),
    /// A numeric bound or modifier argument
    Number(i64),
    /// A bare presence flag
    Flag,
}

impl ContextValue {
    /// The address, if this entry holds one
    pub fn as_address(&self) -> Option<CellAddress> {
        match self {
            ContextValue::Address(addr) => Some(*addr),
            _ => None,
        }
    }

    /// The number, if this entry holds one
    pub fn as_number(&self) -> Option<i64> {
        match self {
            ContextValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// An insertion-ordered map from [`ContextKey`] to [`ContextValue`]
///
/// The contexts in play are tiny (a handful of bounds plus a few named
/// corners per command), so a vector of pairs beats a hash map and keeps
/// the registration order for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Context {
    entries: Vec<(ContextKey, ContextValue)>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry
    pub fn set(&mut self, key: ContextKey, value: ContextValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up an entry
    pub fn get(&self, key: &ContextKey) -> Option<&ContextValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Whether the key is present at all (used for flags)
    pub fn contains(&self, key: &ContextKey) -> bool {
        self.get(key).is_some()
    }

    /// Numeric entry, if present and numeric
    pub fn number(&self, key: &ContextKey) -> Option<i64> {
        self.get(key).and_then(ContextValue::as_number)
    }

    /// Address entry, if present and an address
    pub fn address(&self, key: &ContextKey) -> Option<CellAddress> {
        self.get(key).and_then(ContextValue::as_address)
    }

    /// Register a named variable such as `query.q.nw`
    pub fn set_named<S: Into<String>>(&mut self, name: S, addr: CellAddress) {
        self.set(ContextKey::Named(name.into()), ContextValue::Address(addr));
    }

    /// Look up a named variable
    pub fn named(&self, name: &str) -> Option<CellAddress> {
        self.address(&ContextKey::Named(name.to_string()))
    }

    /// Whether nothing has been registered yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &(ContextKey, ContextValue)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_replace() {
        let mut ctx = Context::new();
        assert!(ctx.is_empty());

        ctx.set(ContextKey::MinRow, ContextValue::Number(1));
        ctx.set(ContextKey::MaxRow, ContextValue::Number(10));
        ctx.set(ContextKey::MinRow, ContextValue::Number(2));

        assert_eq!(ctx.number(&ContextKey::MinRow), Some(2));
        assert_eq!(ctx.number(&ContextKey::MaxRow), Some(10));
        assert_eq!(ctx.iter().count(), 2);
    }

    #[test]
    fn test_named_variables() {
        let mut ctx = Context::new();
        let addr = CellAddress::parse("C7").unwrap();

        ctx.set_named("query.q.nw", addr);
        assert_eq!(ctx.named("query.q.nw"), Some(addr));
        assert_eq!(ctx.named("query.q.se"), None);
    }

    #[test]
    fn test_flags() {
        let mut ctx = Context::new();
        ctx.set(ContextKey::EnforceUnique, ContextValue::Flag);

        assert!(ctx.contains(&ContextKey::EnforceUnique));
        assert!(!ctx.contains(&ContextKey::CheckDuplicates));
        assert_eq!(ctx.number(&ContextKey::EnforceUnique), None);
    }
}

//! Internal tableau symbols.
//!
//! A [`Symbol`] is never exposed to callers; it tags the slack, error, dummy
//! and external variables that make up the simplex tableau. Ordering by id
//! gives the deterministic iteration order the pivoting rules depend on.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SymbolKind {
    Invalid,
    External,
    Slack,
    Error,
    Dummy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Symbol {
    id: i64,
    kind: SymbolKind,
}

impl Symbol {
    /// Sentinel meaning "no symbol". Always sorts before every real symbol.
    pub(crate) const INVALID: Symbol = Symbol { id: -1, kind: SymbolKind::Invalid };

    pub(crate) fn new(id: i64, kind: SymbolKind) -> Self {
        Self { id, kind }
    }

    pub(crate) fn id(self) -> i64 {
        self.id
    }

    pub(crate) fn is_external(self) -> bool {
        matches!(self.kind, SymbolKind::External)
    }

    pub(crate) fn is_slack(self) -> bool {
        matches!(self.kind, SymbolKind::Slack)
    }

    pub(crate) fn is_error(self) -> bool {
        matches!(self.kind, SymbolKind::Error)
    }

    pub(crate) fn is_dummy(self) -> bool {
        matches!(self.kind, SymbolKind::Dummy)
    }

    /// Slack and error symbols are free to become basic during pivoting;
    /// dummies and externals are not picked as pivot candidates this way.
    pub(crate) fn is_pivotable(self) -> bool {
        self.is_slack() || self.is_error()
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_sorts_first() {
        let s = Symbol::new(0, SymbolKind::External);
        assert!(Symbol::INVALID < s);
    }

    #[test]
    fn pivotable_kinds() {
        assert!(Symbol::new(0, SymbolKind::Slack).is_pivotable());
        assert!(Symbol::new(0, SymbolKind::Error).is_pivotable());
        assert!(!Symbol::new(0, SymbolKind::Dummy).is_pivotable());
        assert!(!Symbol::new(0, SymbolKind::External).is_pivotable());
    }
}

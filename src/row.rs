//! Tableau rows and the elementary operations pivoting is built from.

use std::collections::BTreeMap;

use crate::symbol::Symbol;

/// A single row of the simplex tableau: `constant + Σ(coefficient * symbol) = 0`
/// relative to whichever symbol is basic for this row.
///
/// Cells are kept in a `BTreeMap` ordered by symbol id, not a hash map: entering-
/// symbol selection and marker-removal scans both depend on scanning cells in a
/// stable, id-monotonic order to reproduce the same pivot sequence every run.
#[derive(Debug, Clone)]
pub(crate) struct Row {
    pub(crate) constant: f64,
    pub(crate) cells: BTreeMap<Symbol, f64>,
}

impl Row {
    pub(crate) fn new(constant: f64) -> Self {
        Self { constant, cells: BTreeMap::new() }
    }

    /// Adds `coefficient` to the cell for `symbol`, erasing it if the result
    /// is within `epsilon` of zero.
    pub(crate) fn insert_symbol(&mut self, symbol: Symbol, coefficient: f64, epsilon: f64) {
        let entry = self.cells.entry(symbol).or_insert(0.0);
        *entry += coefficient;
        if entry.abs() < epsilon {
            self.cells.remove(&symbol);
        }
    }

    /// Adds `coefficient * other` to this row.
    pub(crate) fn insert_row(&mut self, other: &Row, coefficient: f64, epsilon: f64) {
        self.constant += other.constant * coefficient;
        for (&symbol, &c) in other.cells.iter() {
            self.insert_symbol(symbol, c * coefficient, epsilon);
        }
    }

    pub(crate) fn remove(&mut self, symbol: Symbol) -> Option<f64> {
        self.cells.remove(&symbol)
    }

    pub(crate) fn has(&self, symbol: Symbol) -> bool {
        self.cells.contains_key(&symbol)
    }

    pub(crate) fn coefficient_for(&self, symbol: Symbol) -> f64 {
        self.cells.get(&symbol).copied().unwrap_or(0.0)
    }

    pub(crate) fn reverse_sign(&mut self) {
        self.constant = -self.constant;
        for c in self.cells.values_mut() {
            *c = -*c;
        }
    }

    /// Rearranges `... + k*symbol + ... + constant = 0` into `symbol = ...`.
    /// `symbol` must currently be a cell of this row.
    pub(crate) fn solve_for_symbol(&mut self, symbol: Symbol, epsilon: f64) {
        let coefficient = self
            .cells
            .remove(&symbol)
            .expect("solve_for_symbol: symbol must be present in the row");
        let multiplier = -1.0 / coefficient;
        self.constant *= multiplier;
        for c in self.cells.values_mut() {
            *c *= multiplier;
        }
        self.cells.retain(|_, c| c.abs() >= epsilon);
    }

    /// Re-solves a row currently expressed with `lhs` basic so that `rhs` is
    /// basic instead. Used whenever a different symbol takes over the basis.
    pub(crate) fn solve_for_pair(&mut self, lhs: Symbol, rhs: Symbol, epsilon: f64) {
        self.insert_symbol(lhs, -1.0, epsilon);
        self.solve_for_symbol(rhs, epsilon);
    }

    /// Replaces occurrences of `symbol` in this row with `row`.
    pub(crate) fn substitute(&mut self, symbol: Symbol, row: &Row, epsilon: f64) {
        if let Some(coefficient) = self.cells.remove(&symbol) {
            self.insert_row(row, coefficient, epsilon);
        }
    }

    pub(crate) fn all_dummies(&self) -> bool {
        self.cells.keys().all(|s| s.is_dummy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolKind;

    const EPS: f64 = 1e-8;

    #[test]
    fn insert_symbol_erases_near_zero() {
        let mut row = Row::new(0.0);
        let s = Symbol::new(0, SymbolKind::Slack);
        row.insert_symbol(s, 1.0, EPS);
        row.insert_symbol(s, -1.0, EPS);
        assert!(!row.has(s));
    }

    #[test]
    fn solve_for_symbol_rearranges() {
        // 2*s1 + 3*s2 + 4 = 0  =>  s1 = -1.5*s2 - 2
        let mut row = Row::new(4.0);
        let s1 = Symbol::new(0, SymbolKind::Slack);
        let s2 = Symbol::new(1, SymbolKind::Slack);
        row.insert_symbol(s1, 2.0, EPS);
        row.insert_symbol(s2, 3.0, EPS);
        row.solve_for_symbol(s1, EPS);
        assert!((row.constant - -2.0).abs() < EPS);
        assert!((row.coefficient_for(s2) - -1.5).abs() < EPS);
        assert!(!row.has(s1));
    }

    #[test]
    fn all_dummies_true_for_empty_row() {
        assert!(Row::new(0.0).all_dummies());
    }
}

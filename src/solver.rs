//! The Cassowary solver core: tableau, objective, and the incremental
//! add/remove/edit protocol that keeps the basis optimal and feasible.

use std::collections::BTreeMap;

use tracing::{debug, instrument, trace};

use crate::config::SolverConfig;
use crate::constraint::{Constraint, RelationalOperator};
use crate::error::SolverError;
use crate::expression::Expression;
use crate::row::Row;
use crate::symbol::{Symbol, SymbolKind};
use crate::variable::Variable;

/// The one or two symbols that identify an admitted constraint in the
/// tableau, for later removal.
#[derive(Debug, Clone, Copy)]
struct Tag {
    marker: Symbol,
    other: Symbol,
}

/// Bookkeeping for a variable the caller is actively dragging via
/// `suggest_value`.
#[derive(Debug, Clone)]
struct EditInfo {
    tag: Tag,
    constraint: Constraint,
    constant: f64,
}

/// Which row `optimize` is currently driving toward non-negative
/// coefficients: the solver's real objective, or the transient row used
/// while admitting a constraint via an artificial variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Objective,
    Artificial,
}

/// An incremental Cassowary constraint solver.
///
/// Owns its own tableau, symbol generator, and constraint/edit registries.
/// Single-threaded: every method runs to completion synchronously and
/// either commits or returns a [`SolverError`] with no partial mutation
/// visible to the caller (except the documented `vars` leak on failed
/// `add_constraint`, see [`SolverError`]'s docs).
#[derive(Debug)]
pub struct Solver {
    config: SolverConfig,
    next_symbol_id: i64,
    /// Basic symbol -> its row. The current basis.
    rows: BTreeMap<Symbol, Row>,
    /// User variable -> its external symbol. Ordered by variable id.
    vars: BTreeMap<Variable, Symbol>,
    /// Admitted constraint -> its tag. Ordered by constraint id.
    constraints: BTreeMap<Constraint, Tag>,
    /// Edit variable -> its bookkeeping.
    edits: BTreeMap<Variable, EditInfo>,
    /// Rows whose constant just went negative and need dual-optimizing.
    infeasible: Vec<Symbol>,
    objective: Row,
    /// Live only during artificial-variable admission.
    artificial: Option<Row>,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            config,
            next_symbol_id: 0,
            rows: BTreeMap::new(),
            vars: BTreeMap::new(),
            constraints: BTreeMap::new(),
            edits: BTreeMap::new(),
            infeasible: Vec::new(),
            objective: Row::new(0.0),
            artificial: None,
        }
    }

    pub fn config(&self) -> SolverConfig {
        self.config
    }

    /// Builds `lhs <op> rhs` at `strength` without touching solver state.
    /// A thin convenience wrapper; equivalent to [`Constraint::with_rhs`].
    pub fn create_constraint(
        &self,
        lhs: impl crate::expression::IntoExpression,
        operator: RelationalOperator,
        rhs: impl crate::expression::IntoExpression,
        strength: crate::strength::Strength,
    ) -> Constraint {
        Constraint::with_rhs(lhs, operator, rhs, strength)
    }

    pub fn has_constraint(&self, constraint: &Constraint) -> bool {
        self.constraints.contains_key(constraint)
    }

    pub fn has_edit_variable(&self, variable: &Variable) -> bool {
        self.edits.contains_key(variable)
    }

    fn new_symbol(&mut self, kind: SymbolKind) -> Symbol {
        let id = self.next_symbol_id;
        self.next_symbol_id += 1;
        Symbol::new(id, kind)
    }

    /// Looks up (or allocates) the external symbol standing in for `variable`.
    fn symbol_for_variable(&mut self, variable: &Variable) -> Symbol {
        if let Some(&symbol) = self.vars.get(variable) {
            return symbol;
        }
        let symbol = self.new_symbol(SymbolKind::External);
        self.vars.insert(variable.clone(), symbol);
        symbol
    }

    // ---- constraints --------------------------------------------------

    #[instrument(level = "debug", skip_all, fields(constraint_id = constraint.id()))]
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), SolverError> {
        if self.has_constraint(&constraint) {
            return Err(SolverError::DuplicateConstraint(constraint));
        }
        let eps = self.config.epsilon;

        let (mut row, tag) = self.create_row(&constraint);
        let mut subject = self.choose_subject(&row, &tag);

        if subject.is_none() && row.all_dummies() {
            if row.constant.abs() > eps {
                debug!("required constraint conflicts with an all-dummy row");
                return Err(SolverError::UnsatisfiableConstraint(constraint));
            }
            subject = Some(tag.marker);
        }

        match subject {
            Some(subject) => {
                row.solve_for_symbol(subject, eps);
                self.substitute(subject, &row);
                self.rows.insert(subject, row);
            }
            None => {
                if !self.add_with_artificial_variable(&row)? {
                    debug!("artificial variable admission failed, constraint unsatisfiable");
                    return Err(SolverError::UnsatisfiableConstraint(constraint));
                }
            }
        }

        self.constraints.insert(constraint, tag);
        self.optimize(Target::Objective)
    }

    #[instrument(level = "debug", skip_all, fields(constraint_id = constraint.id()))]
    pub fn remove_constraint(&mut self, constraint: &Constraint) -> Result<(), SolverError> {
        let tag = self
            .constraints
            .remove(constraint)
            .ok_or_else(|| SolverError::UnknownConstraint(constraint.clone()))?;
        let eps = self.config.epsilon;

        self.remove_constraint_effects(&tag, constraint.strength().value());

        if self.rows.remove(&tag.marker).is_none() {
            let leaving = self
                .get_marker_leaving_row(tag.marker)
                .ok_or(SolverError::InternalSolverError(
                    "remove_constraint: no leaving row found for marker",
                ))?;
            let mut row = self
                .rows
                .remove(&leaving)
                .expect("leaving row returned by get_marker_leaving_row must exist");
            row.solve_for_pair(leaving, tag.marker, eps);
            self.substitute(tag.marker, &row);
        }

        self.optimize(Target::Objective)
    }

    /// Builds the tableau row for `constraint`'s expression, substituting
    /// already-basic variables in eagerly, and appends the slack/error/dummy
    /// symbols the relation and strength call for.
    fn create_row(&mut self, constraint: &Constraint) -> (Row, Tag) {
        let eps = self.config.epsilon;
        let mut row = Row::new(constraint.expression().constant());

        for (variable, &coefficient) in constraint.expression().terms() {
            if coefficient.abs() < eps {
                continue;
            }
            let symbol = self.symbol_for_variable(variable);
            if let Some(basic_row) = self.rows.get(&symbol) {
                row.insert_row(basic_row, coefficient, eps);
            } else {
                row.insert_symbol(symbol, coefficient, eps);
            }
        }

        let tag = match constraint.relation() {
            RelationalOperator::LessOrEqual | RelationalOperator::GreaterOrEqual => {
                let coefficient = if constraint.relation() == RelationalOperator::LessOrEqual { 1.0 } else { -1.0 };
                let slack = self.new_symbol(SymbolKind::Slack);
                row.insert_symbol(slack, coefficient, eps);

                if constraint.strength().is_required() {
                    Tag { marker: slack, other: Symbol::INVALID }
                } else {
                    let error = self.new_symbol(SymbolKind::Error);
                    row.insert_symbol(error, -coefficient, eps);
                    self.objective.insert_symbol(error, constraint.strength().value(), eps);
                    Tag { marker: slack, other: error }
                }
            }
            RelationalOperator::Equal => {
                if constraint.strength().is_required() {
                    let dummy = self.new_symbol(SymbolKind::Dummy);
                    row.insert_symbol(dummy, 1.0, eps);
                    Tag { marker: dummy, other: Symbol::INVALID }
                } else {
                    let err_plus = self.new_symbol(SymbolKind::Error);
                    let err_minus = self.new_symbol(SymbolKind::Error);
                    row.insert_symbol(err_plus, -1.0, eps);
                    row.insert_symbol(err_minus, 1.0, eps);
                    self.objective.insert_symbol(err_plus, constraint.strength().value(), eps);
                    self.objective.insert_symbol(err_minus, constraint.strength().value(), eps);
                    Tag { marker: err_plus, other: err_minus }
                }
            }
        };

        if row.constant < 0.0 {
            row.reverse_sign();
        }

        (row, tag)
    }

    /// First external symbol in the row, else whichever of marker/other has
    /// a negative coefficient; `None` means no natural pivot subject exists.
    fn choose_subject(&self, row: &Row, tag: &Tag) -> Option<Symbol> {
        if let Some((&symbol, _)) = row.cells.iter().find(|(s, _)| s.is_external()) {
            return Some(symbol);
        }
        if tag.marker.is_pivotable() && row.coefficient_for(tag.marker) < -self.config.epsilon {
            return Some(tag.marker);
        }
        if tag.other.is_pivotable() && row.coefficient_for(tag.other) < -self.config.epsilon {
            return Some(tag.other);
        }
        None
    }

    /// Admits a row with no natural pivot subject by introducing a fresh
    /// artificial variable, minimizing it to (near) zero, then pivoting it
    /// back out. Returns whether the row was actually satisfiable.
    #[instrument(level = "trace", skip_all)]
    fn add_with_artificial_variable(&mut self, row: &Row) -> Result<bool, SolverError> {
        let eps = self.config.epsilon;
        let art = self.new_symbol(SymbolKind::Slack);
        self.rows.insert(art, row.clone());
        self.artificial = Some(row.clone());

        self.optimize(Target::Artificial)?;

        let success = self.artificial.as_ref().map_or(true, |r| r.constant.abs() < eps);
        self.artificial = None;
        trace!(satisfiable = success, "artificial objective minimized");

        if let Some(art_row) = self.rows.remove(&art) {
            if !art_row.cells.is_empty() {
                let entering = art_row.cells.keys().find(|s| s.is_pivotable()).copied();
                match entering {
                    Some(entering) => {
                        let mut art_row = art_row;
                        art_row.solve_for_pair(art, entering, eps);
                        self.substitute(entering, &art_row);
                        self.rows.insert(entering, art_row);
                    }
                    None => return Ok(false),
                }
            }
        }

        for row in self.rows.values_mut() {
            row.remove(art);
        }
        self.objective.remove(art);

        Ok(success)
    }

    /// Walks every row (plus the objective, plus the live artificial row if
    /// any) replacing occurrences of `symbol` with `row`. Any non-external
    /// basic row whose constant goes negative as a result is queued onto
    /// `infeasible` for the next `dual_optimize` pass.
    fn substitute(&mut self, symbol: Symbol, row: &Row) {
        let eps = self.config.epsilon;
        let mut newly_infeasible = Vec::new();
        for (&basic, r) in self.rows.iter_mut() {
            r.substitute(symbol, row, eps);
            if !basic.is_external() && r.constant < -eps {
                newly_infeasible.push(basic);
            }
        }
        self.infeasible.extend(newly_infeasible);

        self.objective.substitute(symbol, row, eps);
        if let Some(artificial) = self.artificial.as_mut() {
            artificial.substitute(symbol, row, eps);
        }
    }

    /// Drives `target`'s coefficients to non-negative on every non-dummy
    /// symbol via the primal simplex method.
    fn optimize(&mut self, target: Target) -> Result<(), SolverError> {
        let eps = self.config.epsilon;
        loop {
            let Some(entering) = self.entering_symbol(target) else {
                return Ok(());
            };
            let Some(leaving) = self.leaving_row(entering) else {
                return Err(SolverError::InternalSolverError("optimize: objective is unbounded"));
            };

            let mut row = self.rows.remove(&leaving).expect("leaving row must exist");
            row.solve_for_pair(leaving, entering, eps);
            // `substitute` already folds this row into the objective and the
            // live artificial row (if any), so `target` only decides which
            // one `entering_symbol` reads from next iteration.
            self.substitute(entering, &row);
            self.rows.insert(entering, row);
        }
    }

    /// First (lowest-id) non-dummy symbol with a negative coefficient in the
    /// target row.
    fn entering_symbol(&self, target: Target) -> Option<Symbol> {
        let row = match target {
            Target::Objective => &self.objective,
            Target::Artificial => self.artificial.as_ref()?,
        };
        row.cells
            .iter()
            .find(|(s, &c)| !s.is_dummy() && c < -self.config.epsilon)
            .map(|(&s, _)| s)
    }

    /// Minimum-ratio test restricted to non-external basic rows.
    fn leaving_row(&self, entering: Symbol) -> Option<Symbol> {
        let mut min_ratio = f64::INFINITY;
        let mut found = None;
        for (&symbol, row) in self.rows.iter() {
            if symbol.is_external() {
                continue;
            }
            let coefficient = row.coefficient_for(entering);
            if coefficient < -self.config.epsilon {
                let ratio = -row.constant / coefficient;
                if ratio < min_ratio {
                    min_ratio = ratio;
                    found = Some(symbol);
                }
            }
        }
        found
    }

    // ---- dual optimization ---------------------------------------------

    /// Drains `infeasible`, re-pivoting each row whose constant is still
    /// negative back to feasibility without losing dual optimality.
    fn dual_optimize(&mut self) -> Result<(), SolverError> {
        let eps = self.config.epsilon;
        while let Some(leaving) = self.infeasible.pop() {
            let Some(row) = self.rows.get(&leaving) else {
                continue;
            };
            if row.constant >= -eps {
                continue;
            }
            let entering = self.dual_entering_symbol(leaving)?;

            let mut row = self.rows.remove(&leaving).expect("row checked present above");
            row.solve_for_pair(leaving, entering, eps);
            self.substitute(entering, &row);
            self.rows.insert(entering, row);
        }
        Ok(())
    }

    fn dual_entering_symbol(&self, leaving: Symbol) -> Result<Symbol, SolverError> {
        let row = self.rows.get(&leaving).expect("caller checked row exists");
        let mut min_ratio = f64::INFINITY;
        let mut found = None;
        for (&symbol, &coefficient) in row.cells.iter() {
            if coefficient > self.config.epsilon && !symbol.is_dummy() {
                let ratio = self.objective.coefficient_for(symbol) / coefficient;
                if ratio < min_ratio {
                    min_ratio = ratio;
                    found = Some(symbol);
                }
            }
        }
        found.ok_or(SolverError::InternalSolverError("dual_optimize: no entering symbol found"))
    }

    /// Undoes an error symbol's contribution to the objective before its
    /// constraint's marker is dropped from the tableau.
    fn remove_constraint_effects(&mut self, tag: &Tag, strength: f64) {
        if tag.marker.is_error() {
            self.remove_marker_effects(tag.marker, strength);
        } else if tag.other.is_error() {
            self.remove_marker_effects(tag.other, strength);
        }
    }

    fn remove_marker_effects(&mut self, marker: Symbol, strength: f64) {
        let eps = self.config.epsilon;
        if let Some(row) = self.rows.get(&marker).cloned() {
            self.objective.insert_row(&row, -strength, eps);
        } else {
            self.objective.insert_symbol(marker, -strength, eps);
        }
    }

    /// The three-tier rule for picking which row to pivot `marker` out of
    /// when `marker` itself is not currently basic.
    fn get_marker_leaving_row(&self, marker: Symbol) -> Option<Symbol> {
        let mut r1 = f64::INFINITY;
        let mut r2 = f64::INFINITY;
        let mut first = None;
        let mut second = None;
        let mut third = None;

        for (&symbol, row) in self.rows.iter() {
            let coefficient = row.coefficient_for(marker);
            if coefficient == 0.0 {
                continue;
            }
            if symbol.is_external() {
                third = Some(symbol);
            } else if coefficient < 0.0 {
                let ratio = -row.constant / coefficient;
                if ratio < r1 {
                    r1 = ratio;
                    first = Some(symbol);
                }
            } else {
                let ratio = row.constant / coefficient;
                if ratio < r2 {
                    r2 = ratio;
                    second = Some(symbol);
                }
            }
        }

        first.or(second).or(third)
    }

    // ---- edit variables --------------------------------------------------

    #[instrument(level = "debug", skip_all, fields(variable_id = variable.id()))]
    pub fn add_edit_variable(&mut self, variable: &Variable, strength: crate::strength::Strength) -> Result<(), SolverError> {
        if self.has_edit_variable(variable) {
            return Err(SolverError::DuplicateEditVariable(variable.clone()));
        }
        if strength.is_required() {
            return Err(SolverError::BadRequiredStrength(variable.clone()));
        }

        let constraint = Constraint::new(
            Expression::from_variable(variable.clone()),
            RelationalOperator::Equal,
            strength,
        );
        self.add_constraint(constraint.clone())?;
        let tag = *self
            .constraints
            .get(&constraint)
            .expect("constraint was just admitted by add_constraint above");
        self.edits.insert(variable.clone(), EditInfo { tag, constraint, constant: 0.0 });
        Ok(())
    }

    #[instrument(level = "debug", skip_all, fields(variable_id = variable.id()))]
    pub fn remove_edit_variable(&mut self, variable: &Variable) -> Result<(), SolverError> {
        let info = self
            .edits
            .remove(variable)
            .ok_or_else(|| SolverError::UnknownEditVariable(variable.clone()))?;
        self.remove_constraint(&info.constraint)
    }

    #[instrument(level = "trace", skip_all, fields(variable_id = variable.id(), value))]
    pub fn suggest_value(&mut self, variable: &Variable, value: f64) -> Result<(), SolverError> {
        let eps = self.config.epsilon;
        let (tag, delta) = {
            let info = self
                .edits
                .get_mut(variable)
                .ok_or_else(|| SolverError::UnknownEditVariable(variable.clone()))?;
            let delta = value - info.constant;
            info.constant = value;
            (info.tag, delta)
        };

        if let Some(row) = self.rows.get_mut(&tag.marker) {
            row.constant -= delta;
            if row.constant < -eps {
                self.infeasible.push(tag.marker);
            }
            return self.dual_optimize();
        }

        if let Some(row) = self.rows.get_mut(&tag.other) {
            row.constant += delta;
            if row.constant < -eps {
                self.infeasible.push(tag.other);
            }
            return self.dual_optimize();
        }

        let mut newly_infeasible = Vec::new();
        for (&symbol, row) in self.rows.iter_mut() {
            let coefficient = row.coefficient_for(tag.marker);
            if coefficient == 0.0 {
                continue;
            }
            row.constant += delta * coefficient;
            if !symbol.is_external() && row.constant < -eps {
                newly_infeasible.push(symbol);
            }
        }
        self.infeasible.extend(newly_infeasible);
        self.dual_optimize()
    }

    // ---- publishing --------------------------------------------------

    /// Copies each registered variable's solved value out of the tableau.
    /// Call after a batch of mutations; the solver never writes to a
    /// variable outside of this method.
    #[instrument(level = "trace", skip_all)]
    pub fn update_variables(&mut self) {
        for (variable, symbol) in self.vars.iter() {
            let value = self.rows.get(symbol).map_or(0.0, |row| row.constant);
            variable.set_value(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strength::Strength;

    #[test]
    fn simple_required_equality() {
        let mut solver = Solver::new();
        let x = Variable::new();
        solver.add_constraint(Constraint::required(x.clone(), RelationalOperator::Equal, 20.0)).unwrap();
        solver.update_variables();
        assert!((x.value() - 20.0).abs() < 1e-6);
    }

    #[test]
    fn chained_inequalities_prefer_strong_target() {
        let mut solver = Solver::new();
        let x = Variable::new();
        solver.add_constraint(Constraint::required(x.clone(), RelationalOperator::GreaterOrEqual, 10.0)).unwrap();
        solver.add_constraint(Constraint::required(x.clone(), RelationalOperator::LessOrEqual, 20.0)).unwrap();
        solver
            .add_constraint(Constraint::with_rhs(x.clone(), RelationalOperator::Equal, 15.0, Strength::STRONG))
            .unwrap();
        solver.update_variables();
        assert!((x.value() - 15.0).abs() < 1e-6);
    }

    #[test]
    fn conflicting_required_constraints_are_rejected_and_state_is_unchanged() {
        let mut solver = Solver::new();
        let x = Variable::new();
        solver.add_constraint(Constraint::required(x.clone(), RelationalOperator::Equal, 10.0)).unwrap();
        solver.update_variables();
        assert_eq!(x.value(), 10.0);

        let conflicting = Constraint::required(x.clone(), RelationalOperator::Equal, 20.0);
        let err = solver.add_constraint(conflicting.clone()).unwrap_err();
        assert!(matches!(err, SolverError::UnsatisfiableConstraint(_)));
        assert!(!solver.has_constraint(&conflicting));

        solver.update_variables();
        assert_eq!(x.value(), 10.0);
    }

    #[test]
    fn duplicate_constraint_is_rejected() {
        let mut solver = Solver::new();
        let x = Variable::new();
        let c = Constraint::required(x, RelationalOperator::Equal, 1.0);
        solver.add_constraint(c.clone()).unwrap();
        assert!(matches!(solver.add_constraint(c).unwrap_err(), SolverError::DuplicateConstraint(_)));
    }

    #[test]
    fn removing_unknown_constraint_errors() {
        let mut solver = Solver::new();
        let x = Variable::new();
        let c = Constraint::required(x, RelationalOperator::Equal, 1.0);
        assert!(matches!(solver.remove_constraint(&c).unwrap_err(), SolverError::UnknownConstraint(_)));
    }

    #[test]
    fn edit_variable_at_required_strength_is_rejected() {
        let mut solver = Solver::new();
        let x = Variable::new();
        assert!(matches!(
            solver.add_edit_variable(&x, Strength::REQUIRED).unwrap_err(),
            SolverError::BadRequiredStrength(_)
        ));
    }

    #[test]
    fn removing_every_constraint_in_reverse_order_empties_the_solver() {
        let mut solver = Solver::new();
        let x = Variable::named("x");
        let y = Variable::named("y");

        let constraints = vec![
            Constraint::required(x.clone(), RelationalOperator::GreaterOrEqual, 0.0),
            Constraint::required(y.clone(), RelationalOperator::GreaterOrEqual, 0.0),
            Constraint::with_rhs(x.clone() + y.clone(), RelationalOperator::Equal, 10.0, Strength::STRONG),
            Constraint::with_rhs(x.clone(), RelationalOperator::Equal, 3.0, Strength::WEAK),
        ];
        for c in &constraints {
            solver.add_constraint(c.clone()).unwrap();
        }
        solver.update_variables();

        for c in constraints.iter().rev() {
            solver.remove_constraint(c).unwrap();
        }

        for c in &constraints {
            assert!(!solver.has_constraint(c));
        }
        assert!(solver.rows.is_empty());
        assert!(solver.constraints.is_empty());
        assert!(solver.objective.cells.is_empty());
        assert_eq!(solver.objective.constant, 0.0);
    }

    #[test]
    fn suggest_value_respects_a_required_lower_bound() {
        let mut solver = Solver::new();
        let x = Variable::new();
        solver.add_constraint(Constraint::required(x.clone(), RelationalOperator::GreaterOrEqual, 0.0)).unwrap();
        solver.add_edit_variable(&x, Strength::STRONG).unwrap();

        solver.suggest_value(&x, 42.0).unwrap();
        solver.update_variables();
        assert!((x.value() - 42.0).abs() < 1e-6);

        solver.suggest_value(&x, -5.0).unwrap();
        solver.update_variables();
        assert!(x.value().abs() < 1e-6);
    }
}

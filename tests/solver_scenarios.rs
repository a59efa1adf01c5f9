//! End-to-end scenarios exercising the public solver protocol.

use cassowary::{Constraint, RelationalOperator, Solver, Strength, Variable};

#[test]
fn s1_simple_equality() {
    let mut solver = Solver::new();
    let x = Variable::named("x");
    solver.add_constraint(Constraint::required(x.clone(), RelationalOperator::Equal, 20.0)).unwrap();
    solver.update_variables();
    assert!((x.value() - 20.0).abs() < 1e-6);
}

#[test]
fn s2_chained_inequalities() {
    let mut solver = Solver::new();
    let x = Variable::named("x");
    solver.add_constraint(Constraint::required(x.clone(), RelationalOperator::GreaterOrEqual, 10.0)).unwrap();
    solver.add_constraint(Constraint::required(x.clone(), RelationalOperator::LessOrEqual, 20.0)).unwrap();
    solver
        .add_constraint(Constraint::with_rhs(x.clone(), RelationalOperator::Equal, 15.0, Strength::STRONG))
        .unwrap();
    solver.update_variables();
    assert!((x.value() - 15.0).abs() < 1e-6);
}

#[test]
fn s3_conflict_leaves_solver_unchanged() {
    let mut solver = Solver::new();
    let x = Variable::named("x");
    solver.add_constraint(Constraint::required(x.clone(), RelationalOperator::Equal, 10.0)).unwrap();
    solver.update_variables();
    assert!((x.value() - 10.0).abs() < 1e-6);

    let conflicting = Constraint::required(x.clone(), RelationalOperator::Equal, 20.0);
    let err = solver.add_constraint(conflicting.clone());
    assert!(err.is_err());
    assert!(!solver.has_constraint(&conflicting));

    solver.update_variables();
    assert!((x.value() - 10.0).abs() < 1e-6);
}

#[test]
fn s4_weighted_compromise_splits_evenly() {
    let mut solver = Solver::new();
    let x = Variable::named("x");
    let y = Variable::named("y");
    solver
        .add_constraint(Constraint::required(x.clone() + y.clone(), RelationalOperator::Equal, 20.0))
        .unwrap();
    solver.add_constraint(Constraint::with_rhs(x.clone(), RelationalOperator::Equal, 0.0, Strength::WEAK)).unwrap();
    solver.add_constraint(Constraint::with_rhs(y.clone(), RelationalOperator::Equal, 0.0, Strength::WEAK)).unwrap();
    solver.update_variables();
    assert!((x.value() - 10.0).abs() < 1e-6);
    assert!((y.value() - 10.0).abs() < 1e-6);
}

#[test]
fn s5_edit_variable_holds_a_required_bound() {
    let mut solver = Solver::new();
    let x = Variable::named("x");
    solver.add_constraint(Constraint::required(x.clone(), RelationalOperator::GreaterOrEqual, 0.0)).unwrap();
    solver.add_edit_variable(&x, Strength::STRONG).unwrap();

    solver.suggest_value(&x, 42.0).unwrap();
    solver.update_variables();
    assert!((x.value() - 42.0).abs() < 1e-6);

    solver.suggest_value(&x, -5.0).unwrap();
    solver.update_variables();
    assert!(x.value().abs() < 1e-6);
}

#[test]
fn s6_strength_hierarchy_falls_back_after_removal() {
    let mut solver = Solver::new();
    let x = Variable::named("x");
    let medium = Constraint::with_rhs(x.clone(), RelationalOperator::Equal, 100.0, Strength::MEDIUM);
    let weak = Constraint::with_rhs(x.clone(), RelationalOperator::Equal, 0.0, Strength::WEAK);
    solver.add_constraint(medium.clone()).unwrap();
    solver.add_constraint(weak).unwrap();
    solver.update_variables();
    assert!((x.value() - 100.0).abs() < 1e-6);

    solver.remove_constraint(&medium).unwrap();
    solver.update_variables();
    assert!(x.value().abs() < 1e-6);
}

#[test]
fn required_constraints_are_satisfied_within_epsilon_after_update() {
    let mut solver = Solver::new();
    let x = Variable::named("x");
    let y = Variable::named("y");
    solver.add_constraint(Constraint::required(x.clone(), RelationalOperator::GreaterOrEqual, 5.0)).unwrap();
    solver.add_constraint(Constraint::required(y.clone(), RelationalOperator::LessOrEqual, x.clone())).unwrap();
    solver.add_constraint(Constraint::with_rhs(y.clone(), RelationalOperator::Equal, 2.0, Strength::STRONG)).unwrap();
    solver.update_variables();

    assert!(x.value() >= 5.0 - 1e-6);
    assert!(y.value() <= x.value() + 1e-6);
}

#[test]
fn duplicate_and_unknown_constraint_errors_round_trip() {
    let mut solver = Solver::new();
    let x = Variable::new();
    let c = Constraint::required(x, RelationalOperator::Equal, 1.0);
    solver.add_constraint(c.clone()).unwrap();
    assert!(solver.add_constraint(c.clone()).is_err());
    solver.remove_constraint(&c).unwrap();
    assert!(solver.remove_constraint(&c).is_err());
}

#[test]
fn edit_variable_lifecycle_rejects_duplicates_and_unknowns() {
    let mut solver = Solver::new();
    let x = Variable::new();
    assert!(solver.suggest_value(&x, 1.0).is_err());
    solver.add_edit_variable(&x, Strength::MEDIUM).unwrap();
    assert!(solver.add_edit_variable(&x, Strength::MEDIUM).is_err());
    solver.remove_edit_variable(&x).unwrap();
    assert!(solver.remove_edit_variable(&x).is_err());
}

//! Typed failures. Every public mutation either commits or raises one of
//! these — never a bare bool or sentinel return code.

use thiserror::Error;

use crate::constraint::Constraint;
use crate::variable::Variable;

/// Failure modes of the solver's public API. All are raised before any
/// visible mutation commits, with one documented exception: when
/// `add_constraint` fails partway through, external symbols it allocated for
/// previously-unseen variables are left registered (see
/// `Solver::symbol_for_variable`) so a later constraint on the same variable
/// doesn't need to re-allocate. That is intentional, not a bug.
#[derive(Debug, Clone, Error)]
pub enum SolverError {
    #[error("constraint is already present in the solver: {0}")]
    DuplicateConstraint(Constraint),

    #[error("constraint is not present in the solver: {0}")]
    UnknownConstraint(Constraint),

    #[error("required constraint cannot be satisfied: {0}")]
    UnsatisfiableConstraint(Constraint),

    #[error("variable {0} already has an edit variable")]
    DuplicateEditVariable(Variable),

    #[error("variable {0} has no edit variable")]
    UnknownEditVariable(Variable),

    #[error("edit variables cannot be created with Strength::REQUIRED: {0}")]
    BadRequiredStrength(Variable),

    #[error("internal solver invariant violated: {0}")]
    InternalSolverError(&'static str),

    #[error("malformed expression: {0}")]
    MalformedExpression(&'static str),
}

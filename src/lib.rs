//! An incremental linear constraint solver implementing the Cassowary
//! algorithm: an extension of the two-phase simplex method that finds
//! optimal solutions to systems of linear equalities and inequalities
//! annotated with priority strengths, and that can re-solve incrementally
//! as constraints and edit values are added, removed, or nudged.
//!
//! ```
//! use cassowary::{RelationalOperator, Solver, Strength, Variable};
//!
//! let mut solver = Solver::new();
//! let left = Variable::named("left");
//! let width = Variable::named("width");
//!
//! solver.add_constraint(cassowary::Constraint::required(left.clone(), RelationalOperator::Equal, 0.0)).unwrap();
//! solver.add_constraint(cassowary::Constraint::with_rhs(
//!     width.clone(),
//!     RelationalOperator::Equal,
//!     100.0,
//!     Strength::STRONG,
//! )).unwrap();
//!
//! solver.update_variables();
//! assert_eq!(width.value(), 100.0);
//! ```

mod config;
mod constraint;
mod error;
mod expression;
mod row;
mod solver;
mod strength;
mod symbol;
mod variable;

pub use config::SolverConfig;
pub use constraint::{Constraint, RelationalOperator};
pub use error::SolverError;
pub use expression::{Expression, IntoExpression};
pub use solver::Solver;
pub use strength::Strength;
pub use variable::Variable;

/// Default near-zero threshold for cell erasure, redundancy detection, and
/// artificial-variable admission. Override per-solver via
/// [`SolverConfig::with_epsilon`].
pub const EPSILON: f64 = 1e-8;

//! The immutable `expression <relation> 0` tuples the solver consumes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::expression::{Expression, IntoExpression};
use crate::strength::Strength;

static NEXT_CONSTRAINT_ID: AtomicU64 = AtomicU64::new(0);

/// The relation a constraint's (already RHS-folded) expression must satisfy
/// against zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOperator {
    LessOrEqual,
    Equal,
    GreaterOrEqual,
}

impl fmt::Display for RelationalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::LessOrEqual => "<=",
            Self::Equal => "==",
            Self::GreaterOrEqual => ">=",
        };
        write!(f, "{symbol}")
    }
}

#[derive(Debug)]
struct ConstraintData {
    id: u64,
    expression: Expression,
    operator: RelationalOperator,
    strength: Strength,
}

/// A weighted linear (in)equality. Cheap to clone; clones are the same
/// constraint (compared and hashed by id), which is what lets a `Constraint`
/// be used both as a solver input and, after admission, as the key the
/// caller later passes back to `remove_constraint`.
#[derive(Debug, Clone)]
pub struct Constraint(Rc<ConstraintData>);

impl Constraint {
    /// Builds `lhs <operator> 0` directly, with no RHS folding. Use this
    /// when `lhs` is already the normalized expression (e.g. the result of
    /// `Variable::minus`).
    pub fn new(lhs: impl IntoExpression, operator: RelationalOperator, strength: Strength) -> Self {
        Self::from_expression(lhs.into_expression(), operator, strength)
    }

    /// Builds `lhs <operator> rhs`, folding `rhs` into the expression by
    /// subtraction as the data model requires.
    pub fn with_rhs(
        lhs: impl IntoExpression,
        operator: RelationalOperator,
        rhs: impl IntoExpression,
        strength: Strength,
    ) -> Self {
        let expression = lhs.into_expression() - rhs.into_expression();
        Self::from_expression(expression, operator, strength)
    }

    /// `with_rhs` at `Strength::REQUIRED`.
    pub fn required(lhs: impl IntoExpression, operator: RelationalOperator, rhs: impl IntoExpression) -> Self {
        Self::with_rhs(lhs, operator, rhs, Strength::REQUIRED)
    }

    fn from_expression(expression: Expression, operator: RelationalOperator, strength: Strength) -> Self {
        let id = NEXT_CONSTRAINT_ID.fetch_add(1, Ordering::Relaxed);
        Self(Rc::new(ConstraintData {
            id,
            expression,
            operator,
            strength: strength.clip(),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn expression(&self) -> &Expression {
        &self.0.expression
    }

    pub fn relation(&self) -> RelationalOperator {
        self.0.operator
    }

    pub fn strength(&self) -> Strength {
        self.0.strength
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Constraint {}

impl Hash for Constraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl PartialOrd for Constraint {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Constraint {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} 0 [strength {}]",
            self.expression(),
            self.relation(),
            self.strength().value()
        )
    }
}

//! Linear expressions over [`Variable`]s: a constant plus a bag of weighted terms.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use indexmap::IndexMap;

use crate::variable::Variable;
use crate::EPSILON;

/// `constant + Σ(coefficient * variable)`. Immutable from the outside:
/// every arithmetic operator returns a fresh `Expression`.
///
/// Terms are kept in an `IndexMap` rather than a `BTreeMap`: unlike tableau
/// rows, nothing about constraint semantics depends on scan order here, and
/// `IndexMap`'s equality (used by property tests asserting that summation is
/// commutative/associative) already compares contents regardless of
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    constant: f64,
    terms: IndexMap<Variable, f64>,
}

impl Expression {
    pub fn from_constant(constant: f64) -> Self {
        Self { constant, terms: IndexMap::new() }
    }

    pub fn from_variable(variable: Variable) -> Self {
        let mut terms = IndexMap::new();
        terms.insert(variable, 1.0);
        Self { constant: 0.0, terms }
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Variable, &f64)> {
        self.terms.iter()
    }

    /// True if every term's coefficient is within epsilon of zero, i.e. the
    /// expression reduces to its constant.
    pub fn is_constant(&self) -> bool {
        self.terms.values().all(|c| c.abs() < EPSILON)
    }

    /// Evaluates the expression against the variables' current values.
    pub fn value(&self) -> f64 {
        self.constant + self.terms.iter().map(|(v, c)| v.value() * c).sum::<f64>()
    }

    fn add_term(&mut self, variable: Variable, coefficient: f64) {
        *self.terms.entry(variable).or_insert(0.0) += coefficient;
    }

    fn merged(mut self, other: &Expression, multiplier: f64) -> Self {
        self.constant += other.constant * multiplier;
        for (variable, coefficient) in other.terms.iter() {
            self.add_term(variable.clone(), coefficient * multiplier);
        }
        self
    }
}

/// Accepts the mix of scalar, variable and expression operands that the
/// constraint/expression builders take, standing in for the dynamically
/// typed variadic constructor of the original algorithm: Rust's type system
/// enforces the "right shape" at compile time, so there is no runtime
/// malformed-input case to reject here (see `SolverError::MalformedExpression`
/// for where that error lives for callers building their own dynamic layer
/// on top of this crate).
pub trait IntoExpression {
    fn into_expression(self) -> Expression;
}

impl IntoExpression for Expression {
    fn into_expression(self) -> Expression {
        self
    }
}

impl IntoExpression for &Expression {
    fn into_expression(self) -> Expression {
        self.clone()
    }
}

impl IntoExpression for Variable {
    fn into_expression(self) -> Expression {
        Expression::from_variable(self)
    }
}

impl IntoExpression for &Variable {
    fn into_expression(self) -> Expression {
        Expression::from_variable(self.clone())
    }
}

impl IntoExpression for f64 {
    fn into_expression(self) -> Expression {
        Expression::from_constant(self)
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::from_constant(value)
    }
}

impl From<Variable> for Expression {
    fn from(value: Variable) -> Self {
        Expression::from_variable(value)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote_any = false;
        for (variable, coefficient) in self.terms.iter() {
            if coefficient.abs() < EPSILON {
                continue;
            }
            if wrote_any {
                write!(f, " + ")?;
            }
            write!(f, "{coefficient}*{variable}")?;
            wrote_any = true;
        }
        if !wrote_any || self.constant.abs() >= EPSILON {
            if wrote_any {
                write!(f, " + ")?;
            }
            write!(f, "{}", self.constant)?;
        }
        Ok(())
    }
}

impl Add<f64> for Expression {
    type Output = Expression;
    fn add(mut self, rhs: f64) -> Expression {
        self.constant += rhs;
        self
    }
}

impl Add<Variable> for Expression {
    type Output = Expression;
    fn add(self, rhs: Variable) -> Expression {
        self.merged(&Expression::from_variable(rhs), 1.0)
    }
}

impl Add<Expression> for Expression {
    type Output = Expression;
    fn add(self, rhs: Expression) -> Expression {
        self.merged(&rhs, 1.0)
    }
}

impl Add<&Expression> for Expression {
    type Output = Expression;
    fn add(self, rhs: &Expression) -> Expression {
        self.merged(rhs, 1.0)
    }
}

impl Sub<f64> for Expression {
    type Output = Expression;
    fn sub(mut self, rhs: f64) -> Expression {
        self.constant -= rhs;
        self
    }
}

impl Sub<Variable> for Expression {
    type Output = Expression;
    fn sub(self, rhs: Variable) -> Expression {
        self.merged(&Expression::from_variable(rhs), -1.0)
    }
}

impl Sub<Expression> for Expression {
    type Output = Expression;
    fn sub(self, rhs: Expression) -> Expression {
        self.merged(&rhs, -1.0)
    }
}

impl Sub<&Expression> for Expression {
    type Output = Expression;
    fn sub(self, rhs: &Expression) -> Expression {
        self.merged(rhs, -1.0)
    }
}

impl Mul<f64> for Expression {
    type Output = Expression;
    fn mul(mut self, rhs: f64) -> Expression {
        self.constant *= rhs;
        for c in self.terms.values_mut() {
            *c *= rhs;
        }
        self
    }
}

impl Mul<Expression> for f64 {
    type Output = Expression;
    fn mul(self, rhs: Expression) -> Expression {
        rhs * self
    }
}

impl Div<f64> for Expression {
    type Output = Expression;
    fn div(self, rhs: f64) -> Expression {
        self * (1.0 / rhs)
    }
}

impl Neg for Expression {
    type Output = Expression;
    fn neg(self) -> Expression {
        self * -1.0
    }
}

impl Add<f64> for Variable {
    type Output = Expression;
    fn add(self, rhs: f64) -> Expression {
        Expression::from_variable(self) + rhs
    }
}

impl Add<Variable> for Variable {
    type Output = Expression;
    fn add(self, rhs: Variable) -> Expression {
        Expression::from_variable(self) + rhs
    }
}

impl Add<Expression> for Variable {
    type Output = Expression;
    fn add(self, rhs: Expression) -> Expression {
        rhs + self
    }
}

impl Sub<f64> for Variable {
    type Output = Expression;
    fn sub(self, rhs: f64) -> Expression {
        Expression::from_variable(self) - rhs
    }
}

impl Sub<Variable> for Variable {
    type Output = Expression;
    fn sub(self, rhs: Variable) -> Expression {
        Expression::from_variable(self) - rhs
    }
}

impl Sub<Expression> for Variable {
    type Output = Expression;
    fn sub(self, rhs: Expression) -> Expression {
        Expression::from_variable(self) - rhs
    }
}

impl Mul<f64> for Variable {
    type Output = Expression;
    fn mul(self, rhs: f64) -> Expression {
        Expression::from_variable(self) * rhs
    }
}

impl Mul<Variable> for f64 {
    type Output = Expression;
    fn mul(self, rhs: Variable) -> Expression {
        Expression::from_variable(rhs) * self
    }
}

impl Div<f64> for Variable {
    type Output = Expression;
    fn div(self, rhs: f64) -> Expression {
        Expression::from_variable(self) / rhs
    }
}

impl Neg for Variable {
    type Output = Expression;
    fn neg(self) -> Expression {
        -Expression::from_variable(self)
    }
}

impl Add<Expression> for f64 {
    type Output = Expression;
    fn add(self, rhs: Expression) -> Expression {
        rhs + self
    }
}

impl Add<Variable> for f64 {
    type Output = Expression;
    fn add(self, rhs: Variable) -> Expression {
        Expression::from_variable(rhs) + self
    }
}

impl Sub<Expression> for f64 {
    type Output = Expression;
    fn sub(self, rhs: Expression) -> Expression {
        Expression::from_constant(self) - rhs
    }
}

impl Sub<Variable> for f64 {
    type Output = Expression;
    fn sub(self, rhs: Variable) -> Expression {
        Expression::from_constant(self) - rhs
    }
}

//! User-visible decision variables.

use std::any::Any;
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::expression::{Expression, IntoExpression};

// A module-scoped allocator rather than a solver-owned one: variables are
// created by the user before (and independently of) any particular solver,
// so their ids can't live on a `Solver`. Symbol ids, by contrast, are owned
// per-solver (see `Solver::new_symbol`) since they only ever matter inside
// one tableau.
static NEXT_VARIABLE_ID: AtomicU64 = AtomicU64::new(0);

struct VariableData {
    id: u64,
    name: RefCell<Option<String>>,
    value: Cell<f64>,
    context: RefCell<Option<Box<dyn Any>>>,
}

impl fmt::Debug for VariableData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableData")
            .field("id", &self.id)
            .field("name", &self.name.borrow())
            .field("value", &self.value.get())
            .finish()
    }
}

/// A decision variable. Cheap to clone: clones share the same underlying id,
/// name and value, so the solver's own copy (kept in `vars`) and the
/// caller's copy always agree after [`crate::Solver::update_variables`].
#[derive(Debug, Clone)]
pub struct Variable(Rc<VariableData>);

impl Variable {
    pub fn new() -> Self {
        Self::with_name_opt(None)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::with_name_opt(Some(name.into()))
    }

    fn with_name_opt(name: Option<String>) -> Self {
        let id = NEXT_VARIABLE_ID.fetch_add(1, Ordering::Relaxed);
        Self(Rc::new(VariableData {
            id,
            name: RefCell::new(name),
            value: Cell::new(0.0),
            context: RefCell::new(None),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> Option<String> {
        self.0.name.borrow().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.0.name.borrow_mut() = Some(name.into());
    }

    pub fn value(&self) -> f64 {
        self.0.value.get()
    }

    /// Only the solver calls this, from `update_variables`.
    pub(crate) fn set_value(&self, value: f64) {
        self.0.value.set(value);
    }

    /// Attaches arbitrary caller-owned data to the variable (e.g. the UI
    /// widget it backs). Overwrites any previous context.
    pub fn set_context<T: 'static>(&self, context: T) {
        *self.0.context.borrow_mut() = Some(Box::new(context));
    }

    pub fn context<T: 'static>(&self) -> Option<Ref<'_, T>> {
        let borrowed = self.0.context.borrow();
        borrowed.as_ref()?.downcast_ref::<T>()?;
        Some(Ref::map(borrowed, |b| b.as_ref().unwrap().downcast_ref::<T>().unwrap()))
    }

    pub fn minus(&self, rhs: impl IntoExpression) -> Expression {
        Expression::from_variable(self.clone()) - rhs.into_expression()
    }
}

impl Default for Variable {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "var{}", self.0.id),
        }
    }
}

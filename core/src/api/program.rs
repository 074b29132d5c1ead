use crate::activation::Activation;
use crate::interpreter::{Cost, EvalState, Interpretable, TrackingActivation};
use crate::values::{EvalError, FromVal, Val};

/// A planned expression, evaluable any number of times and from any number
/// of threads.
#[derive(Debug)]
pub struct Program {
    root: Interpretable,
    cost: Cost,
}

impl Program {
    pub(crate) fn new(root: Interpretable) -> Self {
        let cost = root.cost();
        Self { root, cost }
    }

    /// Evaluates the program against `activation`.
    ///
    /// Failures are returned as `Val::Err`, unresolved inputs of a partial
    /// activation as `Val::Unknown`.
    pub fn eval(&self, activation: &dyn Activation) -> Val {
        self.root.eval(activation)
    }

    /// Evaluates with `state` collecting the value of every node.
    ///
    /// Values are recorded only when the program was planned with
    /// [`PlanOptions::track_state`](super::PlanOptions::track_state) or
    /// [`PlanOptions::exhaustive`](super::PlanOptions::exhaustive). The
    /// state is not cleared first; call [`EvalState::reset`] between
    /// evaluations that reuse it.
    pub fn eval_with_state(&self, activation: &dyn Activation, state: &EvalState) -> Val {
        self.root.eval(&TrackingActivation::new(activation, state))
    }

    /// Evaluates into a fresh [`EvalState`].
    pub fn eval_tracked(&self, activation: &dyn Activation) -> (Val, EvalState) {
        let state = EvalState::new();
        let value = self.eval_with_state(activation, &state);
        (value, state)
    }

    /// Evaluates and converts the result to a host type.
    pub fn eval_native<T: FromVal>(&self, activation: &dyn Activation) -> Result<T, EvalError> {
        self.eval(activation).convert_to_native()
    }

    /// Static bound on the work one evaluation performs.
    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn root(&self) -> &Interpretable {
        &self.root
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }
}

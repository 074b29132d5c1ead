//! Per-evaluation record of node values.

use std::cell::RefCell;
use std::fmt;

use hashbrown::HashMap;

use crate::activation::{Activation, AttributePattern};
use crate::values::Val;

/// Values observed during evaluation, keyed by expression id.
///
/// Programs planned with
/// [`PlanOptions::track_state`](crate::api::PlanOptions::track_state) write
/// into the state reachable from the activation. A node evaluated several
/// times, such as a comprehension step, keeps its last value.
///
/// The state is single-threaded; give each concurrent evaluation its own.
#[derive(Default)]
pub struct EvalState {
    values: RefCell<HashMap<i64, Val>>,
}

impl EvalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids with a recorded value, ascending.
    pub fn ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.values.borrow().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn value(&self, id: i64) -> Option<Val> {
        self.values.borrow().get(&id).cloned()
    }

    pub fn set_value(&self, id: i64, value: Val) {
        self.values.borrow_mut().insert(id, value);
    }

    /// Forgets every recorded value.
    pub fn reset(&self) {
        self.values.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}

impl fmt::Debug for EvalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.values.borrow();
        let mut entries: Vec<_> = values.iter().collect();
        entries.sort_unstable_by_key(|(id, _)| **id);
        f.debug_map().entries(entries).finish()
    }
}

/// Exposes an [`EvalState`] to the nodes evaluated against `inner`.
pub struct TrackingActivation<'a> {
    inner: &'a dyn Activation,
    state: &'a EvalState,
}

impl<'a> TrackingActivation<'a> {
    pub fn new(inner: &'a dyn Activation, state: &'a EvalState) -> Self {
        Self { inner, state }
    }
}

impl Activation for TrackingActivation<'_> {
    fn resolve_name(&self, name: &str) -> Option<Val> {
        self.inner.resolve_name(name)
    }

    fn parent(&self) -> Option<&dyn Activation> {
        Some(self.inner)
    }

    fn unknown_patterns(&self) -> &[AttributePattern] {
        self.inner.unknown_patterns()
    }

    fn eval_state(&self) -> Option<&EvalState> {
        Some(self.state)
    }
}

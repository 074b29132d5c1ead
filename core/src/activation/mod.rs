//! Variable bindings for one evaluation call.
//!
//! An [`Activation`] resolves names to values. Activations chain through
//! non-owning parent references: a comprehension pushes a [`VarFrame`] per
//! iteration that shadows outer bindings only while the frame is alive.
//!
//! - [`MapActivation`]: owned name table with eager, lazy and host-native
//!   bindings.
//! - [`FnActivation`]: resolves names through a closure.
//! - [`HierarchicalActivation`]: a child activation over a parent.
//! - [`PartialActivation`]: adds [`AttributePattern`]s marking inputs as
//!   unknown.

mod pattern;

#[cfg(test)]
mod activation_test;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use ecow::EcoString;
use hashbrown::HashMap;
use once_cell::sync::OnceCell;

use crate::interpreter::EvalState;
use crate::types::{DefaultTypeAdapter, TypeAdapter};
use crate::values::Val;

pub use pattern::{AttributePattern, QualifierPattern};

/// Hierarchical name lookup.
pub trait Activation {
    /// Resolves `name` in this frame, then in the parent chain.
    fn resolve_name(&self, name: &str) -> Option<Val>;

    fn parent(&self) -> Option<&dyn Activation> {
        None
    }

    /// Patterns naming attributes whose values are unknown.
    fn unknown_patterns(&self) -> &[AttributePattern] {
        &[]
    }

    /// Where nodes planned with state tracking record their values.
    fn eval_state(&self) -> Option<&EvalState> {
        None
    }
}

impl<A: Activation + ?Sized> Activation for &A {
    fn resolve_name(&self, name: &str) -> Option<Val> {
        (**self).resolve_name(name)
    }

    fn parent(&self) -> Option<&dyn Activation> {
        (**self).parent()
    }

    fn unknown_patterns(&self) -> &[AttributePattern] {
        (**self).unknown_patterns()
    }

    fn eval_state(&self) -> Option<&EvalState> {
        (**self).eval_state()
    }
}

impl<A: Activation + ?Sized> Activation for Box<A> {
    fn resolve_name(&self, name: &str) -> Option<Val> {
        (**self).resolve_name(name)
    }

    fn parent(&self) -> Option<&dyn Activation> {
        (**self).parent()
    }

    fn unknown_patterns(&self) -> &[AttributePattern] {
        (**self).unknown_patterns()
    }

    fn eval_state(&self) -> Option<&EvalState> {
        (**self).eval_state()
    }
}

/// Activation with no bindings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyActivation;

impl Activation for EmptyActivation {
    fn resolve_name(&self, _name: &str) -> Option<Val> {
        None
    }
}

// ============================================================================
// MapActivation
// ============================================================================

struct LazyBinding {
    init: Box<dyn Fn() -> Val + Send + Sync>,
    cell: OnceCell<Val>,
}

#[derive(Clone)]
enum Binding {
    Value(Val),
    Lazy(Arc<LazyBinding>),
    Native(Arc<dyn Any + Send + Sync>),
}

/// Name table activation.
///
/// ```
/// use celeste_core::activation::{Activation, MapActivation};
/// use celeste_core::Val;
///
/// let vars = MapActivation::new()
///     .bind("x", 1i64)
///     .bind_lazy("expensive", || Val::from("computed once"));
/// assert_eq!(vars.resolve_name("x"), Some(Val::Int(1)));
/// ```
#[derive(Clone)]
pub struct MapActivation {
    bindings: HashMap<EcoString, Binding>,
    adapter: Arc<dyn TypeAdapter>,
}

impl Default for MapActivation {
    fn default() -> Self {
        Self::with_adapter(Arc::new(DefaultTypeAdapter))
    }
}

impl MapActivation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `adapter` to convert values bound with [`MapActivation::bind_native`].
    pub fn with_adapter(adapter: Arc<dyn TypeAdapter>) -> Self {
        Self {
            bindings: HashMap::new(),
            adapter,
        }
    }

    pub fn bind(mut self, name: impl Into<EcoString>, value: impl Into<Val>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<EcoString>, value: impl Into<Val>) {
        self.bindings
            .insert(name.into(), Binding::Value(value.into()));
    }

    /// Binds a value computed on first resolution and cached afterwards.
    pub fn bind_lazy(
        mut self,
        name: impl Into<EcoString>,
        init: impl Fn() -> Val + Send + Sync + 'static,
    ) -> Self {
        let lazy = LazyBinding {
            init: Box::new(init),
            cell: OnceCell::new(),
        };
        self.bindings
            .insert(name.into(), Binding::Lazy(Arc::new(lazy)));
        self
    }

    /// Binds a host value converted through the [`TypeAdapter`] on each
    /// resolution.
    pub fn bind_native<T: Any + Send + Sync>(mut self, name: impl Into<EcoString>, value: T) -> Self {
        self.bindings
            .insert(name.into(), Binding::Native(Arc::new(value)));
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Activation for MapActivation {
    fn resolve_name(&self, name: &str) -> Option<Val> {
        let binding = self.bindings.get(name)?;
        Some(match binding {
            Binding::Value(v) => v.clone(),
            Binding::Lazy(lazy) => lazy.cell.get_or_init(|| (lazy.init)()).clone(),
            Binding::Native(native) => self.adapter.native_to_value(native.as_ref()),
        })
    }
}

impl fmt::Debug for MapActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.bindings.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("MapActivation")
            .field("names", &names)
            .finish()
    }
}

// ============================================================================
// Other activations
// ============================================================================

/// Resolves names through a closure.
pub struct FnActivation<F>(pub F);

impl<F: Fn(&str) -> Option<Val>> Activation for FnActivation<F> {
    fn resolve_name(&self, name: &str) -> Option<Val> {
        (self.0)(name)
    }
}

/// A child activation layered over a parent; the child shadows the parent.
pub struct HierarchicalActivation<P, C> {
    parent: P,
    child: C,
}

impl<P: Activation, C: Activation> HierarchicalActivation<P, C> {
    pub fn new(parent: P, child: C) -> Self {
        Self { parent, child }
    }
}

impl<P: Activation, C: Activation> Activation for HierarchicalActivation<P, C> {
    fn resolve_name(&self, name: &str) -> Option<Val> {
        self.child
            .resolve_name(name)
            .or_else(|| self.parent.resolve_name(name))
    }

    fn parent(&self) -> Option<&dyn Activation> {
        Some(&self.parent)
    }

    fn unknown_patterns(&self) -> &[AttributePattern] {
        let patterns = self.child.unknown_patterns();
        if patterns.is_empty() {
            self.parent.unknown_patterns()
        } else {
            patterns
        }
    }

    fn eval_state(&self) -> Option<&EvalState> {
        self.child
            .eval_state()
            .or_else(|| self.parent.eval_state())
    }
}

/// Single-variable frame pushed by comprehension evaluation.
pub struct VarFrame<'a> {
    parent: &'a dyn Activation,
    name: &'a str,
    value: Val,
}

impl<'a> VarFrame<'a> {
    pub fn new(parent: &'a dyn Activation, name: &'a str, value: Val) -> Self {
        Self {
            parent,
            name,
            value,
        }
    }

    pub fn value(&self) -> &Val {
        &self.value
    }

    pub fn set_value(&mut self, value: Val) {
        self.value = value;
    }
}

impl Activation for VarFrame<'_> {
    fn resolve_name(&self, name: &str) -> Option<Val> {
        if name == self.name {
            Some(self.value.clone())
        } else {
            self.parent.resolve_name(name)
        }
    }

    fn parent(&self) -> Option<&dyn Activation> {
        Some(self.parent)
    }

    fn unknown_patterns(&self) -> &[AttributePattern] {
        self.parent.unknown_patterns()
    }

    fn eval_state(&self) -> Option<&EvalState> {
        self.parent.eval_state()
    }
}

/// Activation whose bindings may be partially unknown.
pub struct PartialActivation<A> {
    inner: A,
    patterns: Vec<AttributePattern>,
}

impl<A: Activation> PartialActivation<A> {
    pub fn new(inner: A, patterns: Vec<AttributePattern>) -> Self {
        Self { inner, patterns }
    }
}

impl<A: Activation> Activation for PartialActivation<A> {
    fn resolve_name(&self, name: &str) -> Option<Val> {
        self.inner.resolve_name(name)
    }

    fn parent(&self) -> Option<&dyn Activation> {
        Some(&self.inner)
    }

    fn unknown_patterns(&self) -> &[AttributePattern] {
        &self.patterns
    }

    fn eval_state(&self) -> Option<&EvalState> {
        self.inner.eval_state()
    }
}

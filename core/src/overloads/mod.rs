//! Operator and function overloads.
//!
//! An [`Overload`] is one trait-guarded implementation of a function name.
//! Overloads are collected by a [`RegistryBuilder`], which rejects ambiguous
//! registrations, into an immutable [`Registry`] shared by every program
//! planned from the same environment.

pub mod operators;
mod standard;

#[cfg(test)]
mod registry_test;

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use ecow::EcoString;
use hashbrown::HashMap;

use crate::interpreter::Cost;
use crate::types::Traits;
use crate::values::{ErrorKind, EvalError, PanicCause, Val, propagate};

pub type UnaryOp = Arc<dyn Fn(&Val) -> Val + Send + Sync>;
pub type BinaryOp = Arc<dyn Fn(&Val, &Val) -> Val + Send + Sync>;
pub type FunctionOp = Arc<dyn Fn(&[Val]) -> Val + Send + Sync>;
pub type CostFn = Arc<dyn Fn(&[Option<u64>]) -> Cost + Send + Sync>;

/// Exactly one implementation shape per overload.
#[derive(Clone)]
pub enum Implementation {
    Unary(UnaryOp),
    Binary(BinaryOp),
    Function(FunctionOp),
}

/// Static cost contribution of one overload invocation.
#[derive(Clone)]
pub enum OverloadCost {
    Const(u64),
    /// Computed from the static size hints of the arguments, when known.
    Fn(CostFn),
}

impl fmt::Debug for OverloadCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverloadCost::Const(c) => write!(f, "Const({})", c),
            OverloadCost::Fn(_) => write!(f, "Fn(..)"),
        }
    }
}

/// A named, trait-guarded implementation.
#[derive(Clone)]
pub struct Overload {
    id: EcoString,
    operand_trait: Option<Traits>,
    trait_operand: usize,
    non_strict: bool,
    imp: Implementation,
    cost: OverloadCost,
}

impl Overload {
    fn with_impl(id: impl Into<EcoString>, imp: Implementation) -> Self {
        Self {
            id: id.into(),
            operand_trait: None,
            trait_operand: 0,
            non_strict: false,
            imp,
            cost: OverloadCost::Const(1),
        }
    }

    pub fn unary(id: impl Into<EcoString>, f: impl Fn(&Val) -> Val + Send + Sync + 'static) -> Self {
        Self::with_impl(id, Implementation::Unary(Arc::new(f)))
    }

    pub fn binary(
        id: impl Into<EcoString>,
        f: impl Fn(&Val, &Val) -> Val + Send + Sync + 'static,
    ) -> Self {
        Self::with_impl(id, Implementation::Binary(Arc::new(f)))
    }

    /// Overload taking any number of arguments.
    pub fn function(
        id: impl Into<EcoString>,
        f: impl Fn(&[Val]) -> Val + Send + Sync + 'static,
    ) -> Self {
        Self::with_impl(id, Implementation::Function(Arc::new(f)))
    }

    /// Requires the first operand's type to support `traits`.
    pub fn with_trait(self, traits: Traits) -> Self {
        self.with_trait_on(0, traits)
    }

    /// Requires the operand at `index` to support `traits`.
    pub fn with_trait_on(mut self, index: usize, traits: Traits) -> Self {
        self.operand_trait = Some(traits);
        self.trait_operand = index;
        self
    }

    pub fn with_cost(mut self, cost: OverloadCost) -> Self {
        self.cost = cost;
        self
    }

    /// Receives `Err`/`Unknown` arguments instead of having them propagated
    /// by the caller.
    pub fn non_strict(mut self) -> Self {
        self.non_strict = true;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn operand_trait(&self) -> Option<Traits> {
        self.operand_trait
    }

    pub fn is_non_strict(&self) -> bool {
        self.non_strict
    }

    /// Fixed arity, or `None` for variadic overloads.
    pub fn arity(&self) -> Option<usize> {
        match self.imp {
            Implementation::Unary(_) => Some(1),
            Implementation::Binary(_) => Some(2),
            Implementation::Function(_) => None,
        }
    }

    /// True when this overload can take `args`: matching arity and the
    /// required trait on the guarded operand.
    pub fn accepts(&self, args: &[Val]) -> bool {
        if self.arity().is_some_and(|n| n != args.len()) {
            return false;
        }
        match self.operand_trait {
            None => true,
            Some(traits) => args
                .get(self.trait_operand)
                .is_some_and(|v| v.ty().has_trait(traits)),
        }
    }

    /// Invokes the implementation.
    ///
    /// A panic inside the implementation is caught and returned as an
    /// `Internal` error value.
    pub fn invoke(&self, args: &[Val]) -> Val {
        let result = catch_unwind(AssertUnwindSafe(|| match (&self.imp, args) {
            (Implementation::Unary(f), [a]) => f(a),
            (Implementation::Binary(f), [a, b]) => f(a, b),
            (Implementation::Function(f), args) => f(args),
            _ => {
                let operands: Vec<&Val> = args.iter().collect();
                Val::no_such_overload(&self.id, &operands)
            }
        }));
        result.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            tracing::warn!(overload = %self.id, %message, "Overload panicked");
            Val::Err(Arc::new(
                EvalError::new(
                    ErrorKind::Internal,
                    format!("overload '{}' failed", self.id),
                )
                .with_cause(PanicCause { message }),
            ))
        })
    }

    pub fn cost(&self, size_hints: &[Option<u64>]) -> Cost {
        match &self.cost {
            OverloadCost::Const(c) => Cost::constant(*c),
            OverloadCost::Fn(f) => f(size_hints),
        }
    }

    fn overlaps(&self, other: &Overload) -> bool {
        let arity_overlaps = match (self.arity(), other.arity()) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        let traits_overlap = match (self.operand_trait, other.operand_trait) {
            (Some(a), Some(b)) => self.trait_operand == other.trait_operand && a.intersects(b),
            _ => true,
        };
        arity_overlaps && traits_overlap
    }
}

impl fmt::Debug for Overload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overload")
            .field("id", &self.id)
            .field("operand_trait", &self.operand_trait)
            .field("arity", &self.arity())
            .field("cost", &self.cost)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Picks the overload accepting `args` and invokes it.
///
/// Falls back to receiver dispatch on the first argument, then to
/// `NoSuchOverload`. Arguments are expected to be free of `Err`/`Unknown`
/// unless the chosen overload is non-strict.
pub fn dispatch(function: &str, candidates: &[Overload], args: &[Val]) -> Val {
    if let Some(overload) = candidates.iter().find(|o| o.accepts(args)) {
        if !overload.non_strict {
            let operands: Vec<&Val> = args.iter().collect();
            if let Some(v) = propagate(&operands) {
                return v;
            }
        }
        return overload.invoke(args);
    }
    let operands: Vec<&Val> = args.iter().collect();
    if let Some(v) = propagate(&operands) {
        return v;
    }
    match args.split_first() {
        Some((receiver, rest)) if receiver.ty().has_trait(Traits::RECEIVER) => {
            receiver.receive(function, rest)
        }
        _ => Val::no_such_overload(function, &operands),
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Configuration error raised while building a [`Registry`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum RegistryError {
    #[error("overload '{id}' collides with an overload of the same arity and operand trait")]
    #[diagnostic(
        code(celeste::registry::collision),
        help("give the overload a different operand trait or arity, or register it under another id")
    )]
    Collision { id: EcoString },

    #[error("overload id must not be empty")]
    #[diagnostic(code(celeste::registry::empty_id))]
    EmptyId,
}

/// Immutable table of overloads keyed by function name.
#[derive(Clone, Default)]
pub struct Registry {
    overloads: HashMap<EcoString, Vec<Overload>>,
}

static_assertions::assert_impl_all!(Registry: Send, Sync);

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry holding the standard operators and functions.
    pub fn standard() -> Registry {
        RegistryBuilder::default().with_standard_library().build()
    }

    /// Overloads registered for `function`, in registration order.
    pub fn find(&self, function: &str) -> &[Overload] {
        self.overloads
            .get(function)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, function: &str) -> bool {
        self.overloads.contains_key(function)
    }

    pub fn len(&self) -> usize {
        self.overloads.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.overloads.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.overloads.keys().map(|k| k.as_str()).collect();
        ids.sort_unstable();
        f.debug_struct("Registry").field("functions", &ids).finish()
    }
}

/// Collects overloads, rejecting collisions.
#[derive(Default)]
pub struct RegistryBuilder {
    overloads: HashMap<EcoString, Vec<Overload>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, overload: Overload) -> Result<&mut Self, RegistryError> {
        if overload.id.is_empty() {
            return Err(RegistryError::EmptyId);
        }
        let entry = self.overloads.entry(overload.id.clone()).or_default();
        if entry.iter().any(|existing| existing.overlaps(&overload)) {
            return Err(RegistryError::Collision {
                id: overload.id.clone(),
            });
        }
        entry.push(overload);
        Ok(self)
    }

    /// Adds the standard library. The builder must not already hold any of
    /// its ids.
    pub fn with_standard_library(mut self) -> Self {
        for overload in standard::overloads() {
            // Standard overloads are disjoint by construction; a collision
            // here means the caller pre-registered a standard id, and the
            // caller's overload is kept.
            if let Err(err) = self.add(overload) {
                tracing::debug!(%err, "Skipping standard overload");
            }
        }
        self
    }

    pub fn build(self) -> Registry {
        let registry = Registry {
            overloads: self.overloads,
        };
        tracing::debug!(
            functions = registry.overloads.len(),
            overloads = registry.len(),
            "Built overload registry"
        );
        registry
    }
}

//! Annotated syntax trees consumed by the planner.
//!
//! Parsing and type checking happen outside this crate. A front end hands
//! the planner an [`Expr`] tree, optionally wrapped in a [`CheckedExpr`]
//! carrying the checker's resolved references and types keyed by node id.
//! [`ExprBuilder`] assembles trees by hand, including the standard macro
//! expansions.

mod builder;

#[cfg(test)]
mod builder_test;

use ecow::EcoString;
use hashbrown::HashMap;

use crate::types::Type;
use crate::values::Val;

pub use builder::{ACCUMULATOR, ExprBuilder};

/// One node of the syntax tree. `id` is unique within a tree and is used to
/// correlate errors and unknowns with the expression that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: i64,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Val),
    Ident(EcoString),
    /// `operand.field`, or `has(operand.field)` when `test_only` is set.
    Select {
        operand: Box<Expr>,
        field: EcoString,
        test_only: bool,
    },
    /// Global call `function(args)` or member call `target.function(args)`.
    Call {
        target: Option<Box<Expr>>,
        function: EcoString,
        args: Vec<Expr>,
    },
    CreateList {
        elements: Vec<Expr>,
    },
    /// Map literal when `type_name` is `None`, object construction otherwise.
    CreateStruct {
        type_name: Option<EcoString>,
        entries: Vec<Entry>,
    },
    Comprehension(Box<Comprehension>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: i64,
    pub key: EntryKey,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryKey {
    /// Field name of an object construction.
    Field(EcoString),
    /// Key expression of a map literal.
    Key(Expr),
}

/// The bounded loop that macros such as `all` and `map` expand into.
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub iter_var: EcoString,
    pub iter_range: Expr,
    pub accu_var: EcoString,
    pub accu_init: Expr,
    pub loop_condition: Expr,
    pub loop_step: Expr,
    pub result: Expr,
}

/// What the checker resolved an identifier, select or call to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reference {
    /// Fully-qualified variable name.
    pub name: Option<EcoString>,
    /// Overload ids for calls.
    pub overload_ids: Vec<EcoString>,
    /// Constant value, e.g. for enum constants.
    pub value: Option<Val>,
}

impl Reference {
    pub fn ident(name: impl Into<EcoString>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn constant(value: Val) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }
}

/// An expression plus the checker's annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedExpr {
    pub expr: Expr,
    pub references: HashMap<i64, Reference>,
    pub types: HashMap<i64, Type>,
}

impl CheckedExpr {
    /// Wraps an expression that went through no checker.
    pub fn unchecked(expr: Expr) -> Self {
        Self {
            expr,
            references: HashMap::new(),
            types: HashMap::new(),
        }
    }

    pub fn with_reference(mut self, id: i64, reference: Reference) -> Self {
        self.references.insert(id, reference);
        self
    }

    pub fn with_type(mut self, id: i64, ty: Type) -> Self {
        self.types.insert(id, ty);
        self
    }

    pub fn reference(&self, id: i64) -> Option<&Reference> {
        self.references.get(&id)
    }

    pub fn type_of(&self, id: i64) -> Option<&Type> {
        self.types.get(&id)
    }
}

impl From<Expr> for CheckedExpr {
    fn from(expr: Expr) -> Self {
        Self::unchecked(expr)
    }
}

impl Expr {
    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + match &self.kind {
            ExprKind::Literal(_) | ExprKind::Ident(_) => 0,
            ExprKind::Select { operand, .. } => operand.node_count(),
            ExprKind::Call { target, args, .. } => {
                target.as_ref().map_or(0, |t| t.node_count())
                    + args.iter().map(Expr::node_count).sum::<usize>()
            }
            ExprKind::CreateList { elements } => elements.iter().map(Expr::node_count).sum(),
            ExprKind::CreateStruct { entries, .. } => entries
                .iter()
                .map(|e| {
                    let key = match &e.key {
                        EntryKey::Field(_) => 0,
                        EntryKey::Key(k) => k.node_count(),
                    };
                    key + e.value.node_count()
                })
                .sum(),
            ExprKind::Comprehension(c) => {
                c.iter_range.node_count()
                    + c.accu_init.node_count()
                    + c.loop_condition.node_count()
                    + c.loop_step.node_count()
                    + c.result.node_count()
            }
        }
    }
}

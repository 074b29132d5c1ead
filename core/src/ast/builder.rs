use std::cell::Cell;

use ecow::EcoString;

use super::{Comprehension, Entry, EntryKey, Expr, ExprKind};
use crate::overloads::operators::{
    ADD, CONDITIONAL, EQUALS, INDEX, LOGICAL_AND, LOGICAL_NOT, LOGICAL_OR, NOT_STRICTLY_FALSE,
};
use crate::values::Val;

/// Accumulator variable used by macro expansions.
pub const ACCUMULATOR: &str = "__result__";

/// Builds expression trees with fresh, increasing node ids.
///
/// ```
/// use celeste_core::ast::ExprBuilder;
///
/// let b = ExprBuilder::new();
/// // [1, 2, 3].exists(x, x > 1)
/// let range = b.list(vec![b.literal(1i64), b.literal(2i64), b.literal(3i64)]);
/// let pred = b.call("_>_", vec![b.ident("x"), b.literal(1i64)]);
/// let expr = b.exists(range, "x", pred);
/// assert!(expr.id > 0);
/// ```
#[derive(Debug)]
pub struct ExprBuilder {
    next_id: Cell<i64>,
}

impl Default for ExprBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprBuilder {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(id: i64) -> Self {
        Self {
            next_id: Cell::new(id),
        }
    }

    /// Id the next node will receive.
    pub fn peek_id(&self) -> i64 {
        self.next_id.get()
    }

    fn node(&self, kind: ExprKind) -> Expr {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Expr { id, kind }
    }

    // ========================================================================
    // Primitive nodes
    // ========================================================================

    pub fn literal(&self, value: impl Into<Val>) -> Expr {
        self.node(ExprKind::Literal(value.into()))
    }

    pub fn null(&self) -> Expr {
        self.node(ExprKind::Literal(Val::Null))
    }

    pub fn ident(&self, name: impl Into<EcoString>) -> Expr {
        self.node(ExprKind::Ident(name.into()))
    }

    pub fn select(&self, operand: Expr, field: impl Into<EcoString>) -> Expr {
        self.node(ExprKind::Select {
            operand: Box::new(operand),
            field: field.into(),
            test_only: false,
        })
    }

    /// `has(operand.field)`.
    pub fn presence_test(&self, operand: Expr, field: impl Into<EcoString>) -> Expr {
        self.node(ExprKind::Select {
            operand: Box::new(operand),
            field: field.into(),
            test_only: true,
        })
    }

    pub fn call(&self, function: impl Into<EcoString>, args: Vec<Expr>) -> Expr {
        self.node(ExprKind::Call {
            target: None,
            function: function.into(),
            args,
        })
    }

    pub fn member_call(
        &self,
        target: Expr,
        function: impl Into<EcoString>,
        args: Vec<Expr>,
    ) -> Expr {
        self.node(ExprKind::Call {
            target: Some(Box::new(target)),
            function: function.into(),
            args,
        })
    }

    pub fn list(&self, elements: Vec<Expr>) -> Expr {
        self.node(ExprKind::CreateList { elements })
    }

    pub fn map(&self, entries: Vec<(Expr, Expr)>) -> Expr {
        let entries = entries
            .into_iter()
            .map(|(key, value)| Entry {
                id: self.node_id(),
                key: EntryKey::Key(key),
                value,
            })
            .collect();
        self.node(ExprKind::CreateStruct {
            type_name: None,
            entries,
        })
    }

    pub fn object(&self, type_name: impl Into<EcoString>, fields: Vec<(&str, Expr)>) -> Expr {
        let entries = fields
            .into_iter()
            .map(|(name, value)| Entry {
                id: self.node_id(),
                key: EntryKey::Field(name.into()),
                value,
            })
            .collect();
        self.node(ExprKind::CreateStruct {
            type_name: Some(type_name.into()),
            entries,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn comprehension(
        &self,
        iter_var: impl Into<EcoString>,
        iter_range: Expr,
        accu_var: impl Into<EcoString>,
        accu_init: Expr,
        loop_condition: Expr,
        loop_step: Expr,
        result: Expr,
    ) -> Expr {
        self.node(ExprKind::Comprehension(Box::new(Comprehension {
            iter_var: iter_var.into(),
            iter_range,
            accu_var: accu_var.into(),
            accu_init,
            loop_condition,
            loop_step,
            result,
        })))
    }

    fn node_id(&self) -> i64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    // ========================================================================
    // Operators
    // ========================================================================

    pub fn and(&self, lhs: Expr, rhs: Expr) -> Expr {
        self.call(LOGICAL_AND, vec![lhs, rhs])
    }

    pub fn or(&self, lhs: Expr, rhs: Expr) -> Expr {
        self.call(LOGICAL_OR, vec![lhs, rhs])
    }

    pub fn not(&self, operand: Expr) -> Expr {
        self.call(LOGICAL_NOT, vec![operand])
    }

    pub fn conditional(&self, cond: Expr, truthy: Expr, falsy: Expr) -> Expr {
        self.call(CONDITIONAL, vec![cond, truthy, falsy])
    }

    pub fn index(&self, operand: Expr, key: Expr) -> Expr {
        self.call(INDEX, vec![operand, key])
    }

    pub fn binary(&self, op: &str, lhs: Expr, rhs: Expr) -> Expr {
        self.call(op, vec![lhs, rhs])
    }

    // ========================================================================
    // Macros
    // ========================================================================

    /// `has(operand.field)`.
    pub fn has(&self, operand: Expr, field: impl Into<EcoString>) -> Expr {
        self.presence_test(operand, field)
    }

    /// `range.all(var, predicate)`.
    pub fn all(&self, range: Expr, var: &str, predicate: Expr) -> Expr {
        let init = self.literal(true);
        let accu = self.ident(ACCUMULATOR);
        let cond = self.call(NOT_STRICTLY_FALSE, vec![accu]);
        let step = self.and(self.ident(ACCUMULATOR), predicate);
        let result = self.ident(ACCUMULATOR);
        self.comprehension(var, range, ACCUMULATOR, init, cond, step, result)
    }

    /// `range.exists(var, predicate)`.
    pub fn exists(&self, range: Expr, var: &str, predicate: Expr) -> Expr {
        let init = self.literal(false);
        let not_accu = self.not(self.ident(ACCUMULATOR));
        let cond = self.call(NOT_STRICTLY_FALSE, vec![not_accu]);
        let step = self.or(self.ident(ACCUMULATOR), predicate);
        let result = self.ident(ACCUMULATOR);
        self.comprehension(var, range, ACCUMULATOR, init, cond, step, result)
    }

    /// `range.exists_one(var, predicate)`.
    pub fn exists_one(&self, range: Expr, var: &str, predicate: Expr) -> Expr {
        let init = self.literal(0i64);
        let cond = self.literal(true);
        let bumped = self.binary(ADD, self.ident(ACCUMULATOR), self.literal(1i64));
        let step = self.conditional(predicate, bumped, self.ident(ACCUMULATOR));
        let result = self.binary(EQUALS, self.ident(ACCUMULATOR), self.literal(1i64));
        self.comprehension(var, range, ACCUMULATOR, init, cond, step, result)
    }

    /// `range.map(var, transform)`.
    pub fn map_macro(&self, range: Expr, var: &str, transform: Expr) -> Expr {
        let init = self.list(Vec::new());
        let cond = self.literal(true);
        let step = self.binary(ADD, self.ident(ACCUMULATOR), self.list(vec![transform]));
        let result = self.ident(ACCUMULATOR);
        self.comprehension(var, range, ACCUMULATOR, init, cond, step, result)
    }

    /// `range.map(var, filter, transform)`.
    pub fn map_filter(&self, range: Expr, var: &str, filter: Expr, transform: Expr) -> Expr {
        let init = self.list(Vec::new());
        let cond = self.literal(true);
        let appended = self.binary(ADD, self.ident(ACCUMULATOR), self.list(vec![transform]));
        let step = self.conditional(filter, appended, self.ident(ACCUMULATOR));
        let result = self.ident(ACCUMULATOR);
        self.comprehension(var, range, ACCUMULATOR, init, cond, step, result)
    }

    /// `range.filter(var, predicate)`.
    pub fn filter(&self, range: Expr, var: &str, predicate: Expr) -> Expr {
        let init = self.list(Vec::new());
        let cond = self.literal(true);
        let appended = self.binary(ADD, self.ident(ACCUMULATOR), self.list(vec![self.ident(var)]));
        let step = self.conditional(predicate, appended, self.ident(ACCUMULATOR));
        let result = self.ident(ACCUMULATOR);
        self.comprehension(var, range, ACCUMULATOR, init, cond, step, result)
    }
}

//! Turns an annotated [`Expr`] into an [`Interpretable`] tree.
//!
//! Identifiers and select chains become [`Attribute`]s, index operations
//! become attribute qualifiers, `&&`, `||` and `?:` become dedicated
//! short-circuit nodes, and every other call is bound to the overloads the
//! registry holds for its name and arity. With
//! [`PlanOptions::optimize`] set, constant subtrees are folded as they are
//! planned. State tracking and exhaustive evaluation wrap each planned node
//! once its children are final.

use std::sync::Arc;

use ecow::{EcoString, eco_format};
use hashbrown::HashSet;
use regex::Regex;
use smallvec::SmallVec;

use super::attribute::{Attribute, Qualifier};
use super::container::NameResolver;
use super::interpretable::{
    Call, Comprehension, ConstMatch, CreateStruct, Fallback, HasField, Interpretable, Node,
    SetMembership,
};
use crate::activation::EmptyActivation;
use crate::api::{PlanError, PlanOptions};
use crate::ast::{self, CheckedExpr, EntryKey, Expr, ExprKind};
use crate::overloads::Registry;
use crate::overloads::operators::{
    CONDITIONAL, IN, INDEX, LOGICAL_AND, LOGICAL_OR, MATCHES, OLD_IN,
};
use crate::types::{FieldType, TypeKind, TypeProvider};
use crate::values::{MapKey, Val};

pub struct Planner<'a> {
    registry: &'a Registry,
    provider: &'a Arc<dyn TypeProvider>,
    resolver: &'a dyn NameResolver,
    checked: &'a CheckedExpr,
    options: &'a PlanOptions,
    /// Comprehension variables in scope, innermost last.
    locals: SmallVec<[EcoString; 4]>,
}

impl<'a> Planner<'a> {
    pub fn new(
        registry: &'a Registry,
        provider: &'a Arc<dyn TypeProvider>,
        resolver: &'a dyn NameResolver,
        checked: &'a CheckedExpr,
        options: &'a PlanOptions,
    ) -> Self {
        Self {
            registry,
            provider,
            resolver,
            checked,
            options,
            locals: SmallVec::new(),
        }
    }

    pub fn plan(mut self) -> Result<Interpretable, PlanError> {
        let checked = self.checked;
        self.plan_expr(&checked.expr)
    }

    fn plan_expr(&mut self, expr: &Expr) -> Result<Interpretable, PlanError> {
        let id = expr.id;
        let planned = match &expr.kind {
            ExprKind::Literal(value) => Interpretable::constant(id, value.clone()),
            ExprKind::Ident(name) => self.plan_ident(id, name),
            ExprKind::Select {
                operand,
                field,
                test_only,
            } => self.plan_select(id, operand, field, *test_only)?,
            ExprKind::Call {
                target,
                function,
                args,
            } => self.plan_call(id, target.as_deref(), function, args)?,
            ExprKind::CreateList { elements } => {
                let elements = elements
                    .iter()
                    .map(|e| self.plan_expr(e))
                    .collect::<Result<Vec<_>, _>>()?;
                Interpretable::new(id, Node::CreateList(elements))
            }
            ExprKind::CreateStruct { type_name, entries } => {
                self.plan_struct(id, type_name.as_ref(), entries)?
            }
            ExprKind::Comprehension(c) => self.plan_comprehension(id, c)?,
        };
        let planned = if self.options.optimize {
            fold(planned)
        } else {
            planned
        };
        Ok(decorate(planned, self.options))
    }

    fn plan_ident(&self, id: i64, name: &str) -> Interpretable {
        if let Some(reference) = self.checked.reference(id) {
            if let Some(value) = &reference.value {
                return Interpretable::constant(id, value.clone());
            }
            if let Some(resolved) = &reference.name {
                let attr = Attribute::absolute(id, vec![resolved.clone()], self.provider.clone());
                return Interpretable::new(id, Node::Attribute(attr));
            }
        }
        let attr = if self.locals.iter().any(|local| local == name) {
            Attribute::local(id, EcoString::from(name), self.provider.clone())
        } else {
            Attribute::maybe(id, self.resolver.candidate_names(name), self.provider.clone())
        };
        Interpretable::new(id, Node::Attribute(attr))
    }

    fn plan_select(
        &mut self,
        id: i64,
        operand: &Expr,
        field: &EcoString,
        test_only: bool,
    ) -> Result<Interpretable, PlanError> {
        if test_only {
            let tester = self.field_type(operand.id, field);
            let operand = self.plan_expr(operand)?;
            return Ok(Interpretable::new(
                id,
                Node::HasField(HasField {
                    operand: Box::new(operand),
                    field: field.clone(),
                    tester,
                }),
            ));
        }

        // The checker may have resolved the whole chain to a qualified
        // variable or a constant.
        if self
            .checked
            .reference(id)
            .is_some_and(|r| r.name.is_some() || r.value.is_some())
        {
            return Ok(self.plan_ident(id, field));
        }

        let qualifier = match self.field_type(operand.id, field) {
            Some((type_name, getter)) => Qualifier::typed_field(id, field.clone(), type_name, getter),
            None => Qualifier::field(id, field.clone()),
        };
        let operand = self.plan_expr(operand)?;
        Ok(qualify(id, operand, qualifier))
    }

    /// Structured accessor for `field` when the checker typed `operand_id` as
    /// a known object type.
    fn field_type(&self, operand_id: i64, field: &str) -> Option<(EcoString, FieldType)> {
        let ty = self.checked.type_of(operand_id)?;
        if ty.kind() != TypeKind::Object {
            return None;
        }
        let getter = self.provider.find_field_type(ty.name(), field)?;
        Some((EcoString::from(ty.name()), getter))
    }

    fn plan_call(
        &mut self,
        id: i64,
        target: Option<&Expr>,
        function: &EcoString,
        args: &[Expr],
    ) -> Result<Interpretable, PlanError> {
        match (function.as_str(), target, args) {
            (LOGICAL_AND, None, [lhs, rhs]) => {
                let (lhs, rhs) = (self.plan_expr(lhs)?, self.plan_expr(rhs)?);
                return Ok(Interpretable::new(
                    id,
                    Node::LogicalAnd(Box::new(lhs), Box::new(rhs)),
                ));
            }
            (LOGICAL_OR, None, [lhs, rhs]) => {
                let (lhs, rhs) = (self.plan_expr(lhs)?, self.plan_expr(rhs)?);
                return Ok(Interpretable::new(
                    id,
                    Node::LogicalOr(Box::new(lhs), Box::new(rhs)),
                ));
            }
            (CONDITIONAL, None, [cond, truthy, falsy]) => {
                let cond = self.plan_expr(cond)?;
                let truthy = self.plan_expr(truthy)?;
                let falsy = self.plan_expr(falsy)?;
                return Ok(Interpretable::new(
                    id,
                    Node::Conditional {
                        cond: Box::new(cond),
                        truthy: Box::new(truthy),
                        falsy: Box::new(falsy),
                    },
                ));
            }
            (INDEX, None, [operand, key]) => {
                let operand = self.plan_expr(operand)?;
                let key = self.plan_expr(key)?;
                let qualifier = match key.as_const().cloned() {
                    Some(value) => Qualifier::constant(id, value),
                    None => Qualifier::computed(id, key),
                };
                return Ok(qualify(id, operand, qualifier));
            }
            (LOGICAL_AND | LOGICAL_OR | CONDITIONAL | INDEX, _, _) => {
                return Err(PlanError::Malformed {
                    id,
                    reason: eco_format!("'{}' takes {} operands", function, operator_arity(function)),
                });
            }
            _ => {}
        }

        let mut planned = Vec::with_capacity(args.len() + 1);
        if let Some(target) = target {
            planned.push(self.plan_expr(target)?);
        }
        for arg in args {
            planned.push(self.plan_expr(arg)?);
        }

        let registered = self.registry.find(function);
        let arity = planned.len();
        let overloads: Vec<_> = registered
            .iter()
            .filter(|o| o.arity().is_none_or(|n| n == arity))
            .cloned()
            .collect();
        // Member calls without a matching overload go to the receiver at
        // evaluation time.
        if target.is_none() {
            if registered.is_empty() {
                return Err(PlanError::UnknownFunction {
                    function: function.clone(),
                    id,
                });
            }
            if overloads.is_empty() {
                return Err(PlanError::ArityMismatch {
                    function: function.clone(),
                    found: arity,
                    id,
                });
            }
        }
        Ok(Interpretable::new(
            id,
            Node::Call(Call::new(function.clone(), planned, overloads)),
        ))
    }

    fn plan_struct(
        &mut self,
        id: i64,
        type_name: Option<&EcoString>,
        entries: &[ast::Entry],
    ) -> Result<Interpretable, PlanError> {
        let Some(type_name) = type_name else {
            let mut planned = Vec::with_capacity(entries.len());
            for entry in entries {
                let EntryKey::Key(key) = &entry.key else {
                    return Err(PlanError::Malformed {
                        id: entry.id,
                        reason: "map literal entry without a key expression".into(),
                    });
                };
                planned.push((self.plan_expr(key)?, self.plan_expr(&entry.value)?));
            }
            return Ok(Interpretable::new(id, Node::CreateMap(planned)));
        };

        let resolved = self.resolve_type_name(id, type_name)?;
        let mut fields = Vec::with_capacity(entries.len());
        for entry in entries {
            let EntryKey::Field(name) = &entry.key else {
                return Err(PlanError::Malformed {
                    id: entry.id,
                    reason: eco_format!("object construction of '{}' with a computed key", resolved),
                });
            };
            fields.push((name.clone(), self.plan_expr(&entry.value)?));
        }
        Ok(Interpretable::new(
            id,
            Node::CreateStruct(CreateStruct {
                type_name: resolved,
                fields,
                provider: self.provider.clone(),
            }),
        ))
    }

    fn resolve_type_name(&self, id: i64, type_name: &EcoString) -> Result<EcoString, PlanError> {
        if let Some(name) = self.checked.reference(id).and_then(|r| r.name.clone()) {
            return Ok(name);
        }
        self.resolver
            .candidate_names(type_name)
            .into_iter()
            .find(|candidate| self.provider.find_type(candidate).is_some())
            .ok_or_else(|| PlanError::UnknownType {
                type_name: type_name.clone(),
                id,
            })
    }

    fn plan_comprehension(
        &mut self,
        id: i64,
        c: &ast::Comprehension,
    ) -> Result<Interpretable, PlanError> {
        let iter_range = self.plan_expr(&c.iter_range)?;
        let accu_init = self.plan_expr(&c.accu_init)?;
        let loop_condition = self.plan_in_scope(&[&c.accu_var, &c.iter_var], &c.loop_condition)?;
        let loop_step = self.plan_in_scope(&[&c.accu_var, &c.iter_var], &c.loop_step)?;
        let result = self.plan_in_scope(&[&c.accu_var], &c.result)?;

        Ok(Interpretable::new(
            id,
            Node::Comprehension(Box::new(Comprehension {
                iter_var: c.iter_var.clone(),
                iter_range,
                accu_var: c.accu_var.clone(),
                accu_init,
                loop_condition,
                loop_step,
                result,
            })),
        ))
    }

    /// Plans `expr` with comprehension variables `vars` shadowing outer names.
    fn plan_in_scope(
        &mut self,
        vars: &[&EcoString],
        expr: &Expr,
    ) -> Result<Interpretable, PlanError> {
        let scope = self.locals.len();
        self.locals.extend(vars.iter().map(|v| (*v).clone()));
        let planned = self.plan_expr(expr);
        self.locals.truncate(scope);
        planned
    }
}

fn operator_arity(function: &str) -> usize {
    match function {
        CONDITIONAL => 3,
        _ => 2,
    }
}

/// Appends `qualifier` to the attribute `operand` evaluates through, turning
/// other nodes into relative or conditional attributes first.
fn qualify(id: i64, operand: Interpretable, qualifier: Qualifier) -> Interpretable {
    let mut attr = into_attribute(operand);
    attr.add_qualifier(qualifier);
    Interpretable::new(id, Node::Attribute(attr))
}

fn into_attribute(node: Interpretable) -> Attribute {
    let id = node.id();
    match node.into_node() {
        // The qualified attribute is wrapped again once planned.
        Node::Observe(inner) | Node::Exhaustive(inner) => into_attribute(*inner),
        Node::Attribute(attr) => attr,
        Node::Conditional {
            cond,
            truthy,
            falsy,
        } => Attribute::conditional(id, *cond, into_attribute(*truthy), into_attribute(*falsy)),
        other => Attribute::relative(id, Interpretable::new(id, other)),
    }
}

// ============================================================================
// Constant folding
// ============================================================================

/// Replaces `node` with a constant when every input is constant and the
/// result is a regular value.
fn fold(node: Interpretable) -> Interpretable {
    let guard = match node.node() {
        Node::Conditional { cond, .. } => cond.as_const().and_then(|v| v.as_bool()),
        _ => None,
    };
    if let Some(guard) = guard {
        return select_branch(node, guard);
    }

    let foldable = match node.node() {
        Node::Call(call) => call.args.iter().all(Interpretable::is_const),
        Node::LogicalAnd(l, r) | Node::LogicalOr(l, r) => l.is_const() && r.is_const(),
        Node::CreateList(elements) => elements.iter().all(Interpretable::is_const),
        Node::CreateMap(entries) => entries.iter().all(|(k, v)| k.is_const() && v.is_const()),
        _ => false,
    };
    if !foldable {
        return specialize(node);
    }
    let value = node.eval(&EmptyActivation);
    if value.is_err_or_unknown() {
        return node;
    }
    tracing::debug!(id = node.id(), value = %value, "Folded constant subtree");
    Interpretable::constant(node.id(), value)
}

fn select_branch(node: Interpretable, guard: bool) -> Interpretable {
    let id = node.id();
    match node.into_node() {
        Node::Conditional { truthy, falsy, .. } => {
            tracing::debug!(id, guard, "Folded constant conditional");
            if guard { *truthy } else { *falsy }
        }
        other => Interpretable::new(id, other),
    }
}

/// Operand precomputed from the constant argument of a call.
enum Precomputed {
    Set(HashSet<MapKey>),
    Regex(Regex),
}

/// Turns `x in [constants]` into a hash lookup and compiles the constant
/// pattern of `x.matches(pattern)`.
fn specialize(node: Interpretable) -> Interpretable {
    let id = node.id();
    match node.into_node() {
        Node::Call(call) => specialize_call(id, call),
        other => Interpretable::new(id, other),
    }
}

fn specialize_call(id: i64, call: Call) -> Interpretable {
    let precomputed = match (call.function(), call.args.as_slice()) {
        _ if call.is_non_strict() => None,
        (IN | OLD_IN, [_, list]) => match list.as_const() {
            Some(list @ Val::List(items)) => items
                .iter()
                .map(MapKey::from_val)
                .collect::<Option<HashSet<_>>>()
                .map(|set| (list.clone(), Precomputed::Set(set))),
            _ => None,
        },
        (MATCHES, [_, pattern]) => match pattern.as_const() {
            Some(value @ Val::String(source)) => match Regex::new(source) {
                Ok(regex) => Some((value.clone(), Precomputed::Regex(regex))),
                // Reported by the regular overload on each evaluation.
                Err(_) => None,
            },
            _ => None,
        },
        _ => None,
    };
    let Some((constant, precomputed)) = precomputed else {
        return Interpretable::new(id, Node::Call(call));
    };

    let Call {
        function,
        args,
        overloads,
        ..
    } = call;
    let [operand, _] = match <[Interpretable; 2]>::try_from(args) {
        Ok(pair) => pair,
        Err(args) => return Interpretable::new(id, Node::Call(Call::new(function, args, overloads))),
    };
    let fallback = Fallback::new(function, overloads);
    let node = match precomputed {
        Precomputed::Set(set) => {
            tracing::debug!(id, size = set.len(), "Planned set membership test");
            Node::SetMembership(Box::new(SetMembership {
                elem: operand,
                list: constant,
                set,
                fallback,
            }))
        }
        Precomputed::Regex(regex) => {
            tracing::debug!(id, pattern = %constant, "Precompiled regular expression");
            Node::ConstMatch(Box::new(ConstMatch {
                text: operand,
                pattern: constant,
                regex,
                fallback,
            }))
        }
    };
    Interpretable::new(id, node)
}

/// Wraps `node` for exhaustive evaluation and state tracking as `options`
/// request.
fn decorate(node: Interpretable, options: &PlanOptions) -> Interpretable {
    let id = node.id();
    let node = if options.exhaustive && short_circuits(node.node()) {
        Interpretable::new(id, Node::Exhaustive(Box::new(node)))
    } else {
        node
    };
    if options.observes() && !matches!(node.node(), Node::Observe(_)) {
        Interpretable::new(id, Node::Observe(Box::new(node)))
    } else {
        node
    }
}

fn short_circuits(node: &Node) -> bool {
    matches!(
        node,
        Node::LogicalAnd(..)
            | Node::LogicalOr(..)
            | Node::Conditional { .. }
            | Node::Comprehension(_)
            | Node::Attribute(Attribute::Conditional(_))
    )
}

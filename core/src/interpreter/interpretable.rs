//! Executable node tree.
//!
//! An [`Interpretable`] is produced once by the planner and evaluated any
//! number of times, possibly from several threads at once. Evaluation never
//! fails in the Rust sense: every failure is an `Err` value, every
//! unresolved input an `Unknown` value.

use std::fmt;
use std::sync::Arc;

use ecow::EcoString;
use hashbrown::HashSet;
use regex::Regex;
use smallvec::SmallVec;

use super::attribute::Attribute;
use super::cost::Cost;
use crate::activation::{Activation, VarFrame};
use crate::overloads::operators::{CONDITIONAL, LOGICAL_AND, LOGICAL_OR};
use crate::overloads::{Overload, dispatch};
use crate::types::{FieldType, TypeProvider};
use crate::values::{ErrorKind, MapKey, Val, propagate};

/// One node of the executable tree, tagged with the id of the expression it
/// was planned from.
#[derive(Debug)]
pub struct Interpretable {
    id: i64,
    node: Node,
}

#[derive(Debug)]
pub enum Node {
    Const(Val),
    Attribute(Attribute),
    LogicalAnd(Box<Interpretable>, Box<Interpretable>),
    LogicalOr(Box<Interpretable>, Box<Interpretable>),
    Conditional {
        cond: Box<Interpretable>,
        truthy: Box<Interpretable>,
        falsy: Box<Interpretable>,
    },
    Call(Call),
    CreateList(Vec<Interpretable>),
    CreateMap(Vec<(Interpretable, Interpretable)>),
    CreateStruct(CreateStruct),
    HasField(HasField),
    Comprehension(Box<Comprehension>),
    /// `elem in [constants]` answered by a hash lookup.
    SetMembership(Box<SetMembership>),
    /// `text.matches(constant)` with the pattern compiled once.
    ConstMatch(Box<ConstMatch>),
    /// Evaluates every operand of `&&`, `||`, `?:`, conditional attributes
    /// and comprehensions, whether or not the result is already decided.
    Exhaustive(Box<Interpretable>),
    /// Records the wrapped node's value in the activation's
    /// [`EvalState`](super::EvalState).
    Observe(Box<Interpretable>),
}

/// A strict function call bound to its candidate overloads.
pub struct Call {
    pub(crate) function: EcoString,
    pub(crate) args: Vec<Interpretable>,
    pub(crate) overloads: Vec<Overload>,
    non_strict: bool,
}

impl Call {
    pub fn new(function: EcoString, args: Vec<Interpretable>, overloads: Vec<Overload>) -> Self {
        let non_strict = overloads.iter().any(Overload::is_non_strict);
        Self {
            function,
            args,
            overloads,
            non_strict,
        }
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn is_non_strict(&self) -> bool {
        self.non_strict
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("function", &self.function)
            .field("args", &self.args)
            .field("overloads", &self.overloads.len())
            .finish()
    }
}

/// Object construction through the type provider.
pub struct CreateStruct {
    pub(crate) type_name: EcoString,
    pub(crate) fields: Vec<(EcoString, Interpretable)>,
    pub(crate) provider: Arc<dyn TypeProvider>,
}

impl fmt::Debug for CreateStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateStruct")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// `has(operand.field)`.
pub struct HasField {
    pub(crate) operand: Box<Interpretable>,
    pub(crate) field: EcoString,
    /// Structured presence test for objects of the named type.
    pub(crate) tester: Option<(EcoString, FieldType)>,
}

impl fmt::Debug for HasField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HasField")
            .field("operand", &self.operand)
            .field("field", &self.field)
            .finish()
    }
}

/// Strict call to a registered membership or regex function, kept for
/// operands the precomputed fast path does not cover.
pub struct Fallback {
    pub(crate) function: EcoString,
    pub(crate) overloads: Vec<Overload>,
}

impl Fallback {
    pub fn new(function: EcoString, overloads: Vec<Overload>) -> Self {
        Self {
            function,
            overloads,
        }
    }

    fn dispatch(&self, id: i64, args: &[Val]) -> Val {
        dispatch(&self.function, &self.overloads, args).with_expr_id(id)
    }
}

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.function, self.overloads.len())
    }
}

/// `elem in list` where `list` is a constant whose elements can all key a
/// map.
#[derive(Debug)]
pub struct SetMembership {
    pub(crate) elem: Interpretable,
    pub(crate) list: Val,
    pub(crate) set: HashSet<MapKey>,
    pub(crate) fallback: Fallback,
}

/// `text.matches(pattern)` where `pattern` is a constant string.
#[derive(Debug)]
pub struct ConstMatch {
    pub(crate) text: Interpretable,
    pub(crate) pattern: Val,
    pub(crate) regex: Regex,
    pub(crate) fallback: Fallback,
}

#[derive(Debug)]
pub struct Comprehension {
    pub(crate) iter_var: EcoString,
    pub(crate) iter_range: Interpretable,
    pub(crate) accu_var: EcoString,
    pub(crate) accu_init: Interpretable,
    pub(crate) loop_condition: Interpretable,
    pub(crate) loop_step: Interpretable,
    pub(crate) result: Interpretable,
}

impl Interpretable {
    pub fn new(id: i64, node: Node) -> Self {
        Self { id, node }
    }

    pub fn constant(id: i64, value: Val) -> Self {
        Self::new(id, Node::Const(value))
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn into_node(self) -> Node {
        self.node
    }

    /// The value of a constant node.
    pub fn as_const(&self) -> Option<&Val> {
        match &self.node {
            Node::Const(v) => Some(v),
            Node::Observe(inner) => inner.as_const(),
            _ => None,
        }
    }

    pub fn is_const(&self) -> bool {
        self.as_const().is_some()
    }

    /// Number of nodes in this tree, attributes counting as one.
    ///
    /// Observing and exhaustive wrappers are not counted.
    pub fn node_count(&self) -> usize {
        1 + match &self.node {
            Node::Exhaustive(inner) | Node::Observe(inner) => return inner.node_count(),
            Node::Const(_) | Node::Attribute(_) => 0,
            Node::LogicalAnd(l, r) | Node::LogicalOr(l, r) => l.node_count() + r.node_count(),
            Node::Conditional {
                cond,
                truthy,
                falsy,
            } => cond.node_count() + truthy.node_count() + falsy.node_count(),
            Node::Call(call) => call.args.iter().map(Interpretable::node_count).sum(),
            Node::CreateList(elements) => elements.iter().map(Interpretable::node_count).sum(),
            Node::CreateMap(entries) => entries
                .iter()
                .map(|(k, v)| k.node_count() + v.node_count())
                .sum(),
            Node::CreateStruct(s) => s.fields.iter().map(|(_, v)| v.node_count()).sum(),
            Node::HasField(h) => h.operand.node_count(),
            Node::Comprehension(c) => {
                c.iter_range.node_count()
                    + c.accu_init.node_count()
                    + c.loop_condition.node_count()
                    + c.loop_step.node_count()
                    + c.result.node_count()
            }
            Node::SetMembership(m) => m.elem.node_count() + 1,
            Node::ConstMatch(m) => m.text.node_count() + 1,
        }
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    pub fn eval(&self, activation: &dyn Activation) -> Val {
        match &self.node {
            Node::Const(v) => v.clone(),
            Node::Attribute(attr) => attr.resolve(activation),
            Node::LogicalAnd(lhs, rhs) => self.eval_logical(lhs, rhs, false, activation),
            Node::LogicalOr(lhs, rhs) => self.eval_logical(lhs, rhs, true, activation),
            Node::Conditional {
                cond,
                truthy,
                falsy,
            } => match cond.eval(activation) {
                Val::Bool(true) => truthy.eval(activation),
                Val::Bool(false) => falsy.eval(activation),
                guard @ (Val::Err(_) | Val::Unknown(_)) => guard,
                guard => Val::no_such_overload(CONDITIONAL, &[&guard]).with_expr_id(self.id),
            },
            Node::Call(call) => self.eval_call(call, activation),
            Node::CreateList(elements) => {
                let values: Vec<Val> = elements.iter().map(|e| e.eval(activation)).collect();
                if let Some(v) = first_failure(&values) {
                    return v;
                }
                Val::list(values)
            }
            Node::CreateMap(entries) => {
                let mut values = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    values.push((key.eval(activation), value.eval(activation)));
                }
                if let Some(v) = first_failure(values.iter().flat_map(|(k, v)| [k, v])) {
                    return v;
                }
                Val::map(values).with_expr_id(self.id)
            }
            Node::CreateStruct(s) => {
                let fields: Vec<(EcoString, Val)> = s
                    .fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.eval(activation)))
                    .collect();
                if let Some(v) = first_failure(fields.iter().map(|(_, v)| v)) {
                    return v;
                }
                s.provider
                    .new_value(&s.type_name, fields)
                    .with_expr_id(self.id)
            }
            Node::HasField(h) => {
                let operand = h.operand.eval(activation);
                if let (Val::Object(obj), Some((type_name, tester))) = (&operand, &h.tester) {
                    if obj.ty().name() == type_name.as_str() {
                        return Val::Bool(tester.is_set(obj.as_ref()));
                    }
                }
                operand.has_field(&h.field).with_expr_id(self.id)
            }
            Node::Comprehension(c) => self.eval_comprehension(c, false, activation),
            Node::SetMembership(m) => {
                let elem = m.elem.eval(activation);
                if elem.is_err_or_unknown() {
                    return elem;
                }
                match MapKey::from_val(&elem) {
                    Some(key) => Val::Bool(m.set.contains(&key)),
                    None => m.fallback.dispatch(self.id, &[elem, m.list.clone()]),
                }
            }
            Node::ConstMatch(m) => {
                let text = m.text.eval(activation);
                if let Val::String(s) = &text {
                    return Val::Bool(m.regex.is_match(s));
                }
                if text.is_err_or_unknown() {
                    return text;
                }
                m.fallback.dispatch(self.id, &[text, m.pattern.clone()])
            }
            Node::Exhaustive(inner) => inner.eval_exhaustive(activation),
            Node::Observe(inner) => {
                let value = inner.eval(activation);
                if let Some(state) = activation.eval_state() {
                    state.set_value(inner.id, value.clone());
                }
                value
            }
        }
    }

    /// Like [`Interpretable::eval`], but every operand of a short-circuiting
    /// node is evaluated before the result is combined.
    fn eval_exhaustive(&self, activation: &dyn Activation) -> Val {
        match &self.node {
            Node::LogicalAnd(lhs, rhs) => {
                let (left, right) = (lhs.eval(activation), rhs.eval(activation));
                self.combine_logical(left, right, false)
            }
            Node::LogicalOr(lhs, rhs) => {
                let (left, right) = (lhs.eval(activation), rhs.eval(activation));
                self.combine_logical(left, right, true)
            }
            Node::Conditional {
                cond,
                truthy,
                falsy,
            } => {
                let guard = cond.eval(activation);
                let (truthy, falsy) = (truthy.eval(activation), falsy.eval(activation));
                match guard {
                    Val::Bool(true) => truthy,
                    Val::Bool(false) => falsy,
                    Val::Err(_) | Val::Unknown(_) => guard,
                    guard => Val::no_such_overload(CONDITIONAL, &[&guard]).with_expr_id(self.id),
                }
            }
            Node::Attribute(attr) => attr.resolve_exhaustive(activation),
            Node::Comprehension(c) => self.eval_comprehension(c, true, activation),
            _ => self.eval(activation),
        }
    }

    /// Short-circuit `&&` (`short_value == false`) or `||`
    /// (`short_value == true`).
    ///
    /// Either operand equal to `short_value` decides the result, even when
    /// the other one failed.
    fn eval_logical(
        &self,
        lhs: &Interpretable,
        rhs: &Interpretable,
        short_value: bool,
        activation: &dyn Activation,
    ) -> Val {
        let left = lhs.eval(activation);
        if left.as_bool() == Some(short_value) {
            return left;
        }
        let right = rhs.eval(activation);
        self.combine_logical(left, right, short_value)
    }

    fn combine_logical(&self, left: Val, right: Val, short_value: bool) -> Val {
        if left.as_bool() == Some(short_value) {
            return left;
        }
        if right.as_bool() == Some(short_value) {
            return right;
        }
        if let (Val::Bool(_), Val::Bool(_)) = (&left, &right) {
            return Val::Bool(!short_value);
        }
        if let Some(v) = propagate(&[&left, &right]) {
            return v;
        }
        let function = if short_value { LOGICAL_OR } else { LOGICAL_AND };
        Val::no_such_overload(function, &[&left, &right]).with_expr_id(self.id)
    }

    fn eval_call(&self, call: &Call, activation: &dyn Activation) -> Val {
        let args: SmallVec<[Val; 4]> = call.args.iter().map(|a| a.eval(activation)).collect();
        if !call.non_strict {
            let operands: SmallVec<[&Val; 4]> = args.iter().collect();
            if let Some(v) = propagate(&operands) {
                return v;
            }
        }
        dispatch(&call.function, &call.overloads, &args).with_expr_id(self.id)
    }

    /// Folds the range into the accumulator. Exhaustive evaluation keeps
    /// iterating after the loop condition turns false.
    fn eval_comprehension(
        &self,
        c: &Comprehension,
        exhaustive: bool,
        activation: &dyn Activation,
    ) -> Val {
        let range = c.iter_range.eval(activation);
        if range.is_err_or_unknown() {
            return range;
        }
        let Some(elements) = range.iter() else {
            return Val::error(
                ErrorKind::NoSuchOverload,
                format!("type '{}' is not iterable", range.ty()),
            )
            .with_expr_id(c.iter_range.id);
        };

        let init = c.accu_init.eval(activation);
        let mut accu = VarFrame::new(activation, &c.accu_var, init);
        for element in elements {
            let frame = VarFrame::new(&accu, &c.iter_var, element);
            match c.loop_condition.eval(&frame) {
                Val::Bool(false) if !exhaustive => break,
                cond @ Val::Err(_) => return cond,
                _ => {}
            }
            let step = c.loop_step.eval(&frame);
            if step.is_err() {
                return step;
            }
            accu.set_value(step);
        }
        c.result.eval(&accu)
    }

    // ========================================================================
    // Cost
    // ========================================================================

    /// Static `(min, max)` bound on the work evaluating this node performs.
    pub fn cost(&self) -> Cost {
        match &self.node {
            Node::Const(_) => Cost::ZERO,
            Node::Observe(inner) => inner.cost(),
            Node::Exhaustive(inner) => match &inner.node {
                Node::LogicalAnd(lhs, rhs) | Node::LogicalOr(lhs, rhs) => {
                    lhs.cost() + rhs.cost() + Cost::ONE
                }
                Node::Conditional {
                    cond,
                    truthy,
                    falsy,
                } => cond.cost() + truthy.cost() + falsy.cost(),
                _ => inner.cost(),
            },
            Node::SetMembership(m) => m.elem.cost() + Cost::ONE,
            Node::ConstMatch(m) => {
                let own = m
                    .fallback
                    .overloads
                    .iter()
                    .map(|o| o.cost(&[m.text.size_hint(), None]))
                    .reduce(Cost::either)
                    .unwrap_or(Cost::ONE);
                m.text.cost() + own
            }
            Node::Attribute(attr) => attr.cost(),
            Node::LogicalAnd(lhs, rhs) | Node::LogicalOr(lhs, rhs) => {
                let (l, r) = (lhs.cost(), rhs.cost());
                Cost::new(l.min, l.max.saturating_add(r.max).saturating_add(1))
            }
            Node::Conditional {
                cond,
                truthy,
                falsy,
            } => cond.cost() + truthy.cost().either(falsy.cost()),
            Node::Call(call) => {
                let hints: SmallVec<[Option<u64>; 4]> =
                    call.args.iter().map(Interpretable::size_hint).collect();
                let own = call
                    .overloads
                    .iter()
                    .map(|o| o.cost(&hints))
                    .reduce(Cost::either)
                    .unwrap_or(Cost::ONE);
                call.args.iter().map(Interpretable::cost).sum::<Cost>() + own
            }
            Node::CreateList(elements) => elements.iter().map(Interpretable::cost).sum(),
            Node::CreateMap(entries) => entries.iter().map(|(k, v)| k.cost() + v.cost()).sum(),
            Node::CreateStruct(s) => s.fields.iter().map(|(_, v)| v.cost()).sum(),
            Node::HasField(h) => h.operand.cost() + Cost::ONE,
            Node::Comprehension(c) => {
                let count = c.iter_range.size_hint();
                let per_iteration = c.loop_condition.cost() + c.loop_step.cost();
                c.iter_range.cost()
                    + c.accu_init.cost()
                    + per_iteration.repeat(count)
                    + c.result.cost()
            }
        }
    }

    /// Statically known size of the value this node evaluates to.
    pub fn size_hint(&self) -> Option<u64> {
        let len = match &self.node {
            Node::Const(Val::String(s)) => s.chars().count(),
            Node::Const(Val::Bytes(b)) => b.len(),
            Node::Const(Val::List(items)) => items.len(),
            Node::Const(Val::Map(map)) => map.len(),
            Node::CreateList(elements) => elements.len(),
            Node::CreateMap(entries) => entries.len(),
            Node::Observe(inner) | Node::Exhaustive(inner) => return inner.size_hint(),
            _ => return None,
        };
        u64::try_from(len).ok()
    }
}

/// The merged unknown or first error among `operands`, if any.
fn first_failure<'a>(operands: impl IntoIterator<Item = &'a Val>) -> Option<Val> {
    let operands: SmallVec<[&Val; 8]> = operands.into_iter().collect();
    propagate(&operands)
}

//! The standard overload library.

use std::sync::Arc;

use super::operators::*;
use super::{Overload, OverloadCost};
use crate::interpreter::{Cost, UNBOUNDED};
use crate::types::{
    BOOL_TYPE, BYTES_TYPE, DOUBLE_TYPE, DURATION_TYPE, INT_TYPE, STRING_TYPE, TIMESTAMP_TYPE,
    TYPE_TYPE, Traits, UINT_TYPE, Type,
};
use crate::values::{ErrorKind, Val};

/// Cost linear in the size of the first argument when it is statically
/// known, unbounded otherwise.
fn size_linear_cost() -> OverloadCost {
    OverloadCost::Fn(Arc::new(|hints: &[Option<u64>]| {
        match hints.first().copied().flatten() {
            Some(n) => Cost::new(1, n.max(1)),
            None => Cost::new(1, UNBOUNDED),
        }
    }))
}

/// Comparison operator; mismatched operands report the operator itself.
fn ordering(id: &'static str, classify: fn(i64) -> bool) -> Overload {
    Overload::binary(id, move |a, b| match a.compare(b) {
        Val::Int(c) => Val::Bool(classify(c)),
        Val::Err(e) if e.kind() == ErrorKind::NoSuchOverload => Val::no_such_overload(id, &[a, b]),
        other => other,
    })
    .with_trait(Traits::COMPARER)
}

fn conversion(id: &'static str, target: &'static Type) -> Overload {
    Overload::unary(id, move |v| v.convert_to_type(target))
}

fn string_receiver(id: &'static str) -> Overload {
    Overload::binary(id, move |a, b| a.receive(id, std::slice::from_ref(b)))
        .with_trait(Traits::RECEIVER)
        .with_cost(size_linear_cost())
}

fn not_strictly_false(id: &'static str) -> Overload {
    Overload::unary(id, |v| match v {
        Val::Bool(_) => v.clone(),
        _ => Val::Bool(true),
    })
    .non_strict()
}

pub(super) fn overloads() -> Vec<Overload> {
    vec![
        // Arithmetic
        Overload::binary(ADD, Val::add).with_trait(Traits::ADDER),
        Overload::binary(SUBTRACT, Val::subtract).with_trait(Traits::SUBTRACTOR),
        Overload::binary(MULTIPLY, Val::multiply).with_trait(Traits::MULTIPLIER),
        Overload::binary(DIVIDE, Val::divide).with_trait(Traits::DIVIDER),
        Overload::binary(MODULO, Val::modulo).with_trait(Traits::MODDER),
        Overload::unary(NEGATE, Val::negate).with_trait(Traits::NEGATER),
        Overload::unary(LOGICAL_NOT, Val::logical_not),
        // Equality and ordering
        Overload::binary(EQUALS, Val::equal),
        Overload::binary(NOT_EQUALS, |a, b| a.equal(b).logical_not()),
        ordering(LESS, |c| c < 0),
        ordering(LESS_EQUALS, |c| c <= 0),
        ordering(GREATER, |c| c > 0),
        ordering(GREATER_EQUALS, |c| c >= 0),
        // Containers
        Overload::binary(INDEX, Val::index).with_trait(Traits::INDEXER),
        Overload::binary(IN, |elem, container| container.contains(elem))
            .with_trait_on(1, Traits::CONTAINER),
        Overload::binary(OLD_IN, |elem, container| container.contains(elem))
            .with_trait_on(1, Traits::CONTAINER),
        Overload::unary(SIZE, Val::size)
            .with_trait(Traits::SIZER)
            .with_cost(size_linear_cost()),
        // Strings
        Overload::binary(MATCHES, Val::matches)
            .with_trait(Traits::MATCHER)
            .with_cost(size_linear_cost()),
        string_receiver(CONTAINS),
        string_receiver(STARTS_WITH),
        string_receiver(ENDS_WITH),
        // Comprehension support
        not_strictly_false(NOT_STRICTLY_FALSE),
        not_strictly_false(OLD_NOT_STRICTLY_FALSE),
        // Conversions
        conversion(TO_INT, &INT_TYPE),
        conversion(TO_UINT, &UINT_TYPE),
        conversion(TO_DOUBLE, &DOUBLE_TYPE),
        conversion(TO_STRING, &STRING_TYPE),
        conversion(TO_BYTES, &BYTES_TYPE),
        conversion(TO_BOOL, &BOOL_TYPE),
        conversion(TO_TIMESTAMP, &TIMESTAMP_TYPE),
        conversion(TO_DURATION, &DURATION_TYPE),
        conversion(TO_TYPE, &TYPE_TYPE),
        Overload::unary(TO_DYN, Val::clone),
    ]
}

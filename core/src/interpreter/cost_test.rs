use pretty_assertions::assert_eq;

use super::{Cost, UNBOUNDED};
use crate::api::Env;
use crate::ast::{Expr, ExprBuilder};
use crate::overloads::operators::*;

fn cost_of(expr: Expr) -> Cost {
    Env::new().plan_unchecked(expr).expect("plans").cost()
}

#[test]
fn test_cost_arithmetic() {
    assert_eq!(Cost::new(1, 2) + Cost::new(3, 4), Cost::new(4, 6));
    assert_eq!(Cost::new(1, UNBOUNDED) + Cost::ONE, Cost::new(2, UNBOUNDED));
    assert_eq!(Cost::new(1, 5).either(Cost::new(2, 3)), Cost::new(1, 5));
    assert_eq!(Cost::new(1, 2).repeat(Some(3)), Cost::new(3, 6));
    assert_eq!(Cost::new(1, 2).repeat(None), Cost::UNKNOWN);
    assert_eq!(Cost::ZERO.repeat(None), Cost::ZERO);
    assert_eq!(Cost::new(2, 3).to_string(), "[2, 3]");
    assert_eq!(Cost::UNKNOWN.to_string(), "[0, unbounded]");
}

#[test]
fn test_constants_and_variables_are_free() {
    let b = ExprBuilder::new();
    assert_eq!(cost_of(b.literal(1i64)), Cost::ZERO);
    assert_eq!(cost_of(b.ident("x")), Cost::ZERO);
}

#[test]
fn test_call_costs() {
    let b = ExprBuilder::new();
    assert_eq!(
        cost_of(b.binary(ADD, b.literal(1i64), b.literal(2i64))),
        Cost::ONE
    );

    let b = ExprBuilder::new();
    assert_eq!(cost_of(b.call(SIZE, vec![b.literal("abc")])), Cost::new(1, 3));

    let b = ExprBuilder::new();
    assert_eq!(
        cost_of(b.call(SIZE, vec![b.ident("s")])),
        Cost::new(1, UNBOUNDED)
    );
}

#[test]
fn test_conditional_cost_covers_both_branches() {
    let b = ExprBuilder::new();
    let expr = b.conditional(
        b.ident("flag"),
        b.call(SIZE, vec![b.literal("abc")]),
        b.literal(0i64),
    );
    let cost = cost_of(expr);
    assert_eq!(cost, Cost::new(0, 3));
    assert!(cost.min <= Cost::ZERO.min && cost.max >= Cost::new(1, 3).max);
}

#[test]
fn test_logical_cost() {
    let b = ExprBuilder::new();
    let lhs = b.binary(LESS, b.ident("a"), b.literal(1i64));
    let rhs = b.binary(LESS, b.ident("b"), b.literal(1i64));
    assert_eq!(cost_of(b.and(lhs, rhs)), Cost::new(1, 3));

    let b = ExprBuilder::new();
    assert_eq!(
        cost_of(b.or(b.ident("a"), b.ident("b"))),
        Cost::new(0, 1)
    );
}

#[test]
fn test_comprehension_cost_scales_with_range() {
    let b = ExprBuilder::new();
    let range = b.list(vec![b.literal(1i64), b.literal(2i64), b.literal(3i64)]);
    let pred = b.binary(GREATER, b.ident("x"), b.literal(0i64));
    // Per iteration: the loop condition call plus the `&&` step.
    assert_eq!(cost_of(b.all(range, "x", pred)), Cost::new(3, 9));

    let b = ExprBuilder::new();
    let pred = b.binary(GREATER, b.ident("x"), b.literal(0i64));
    let cost = cost_of(b.all(b.ident("xs"), "x", pred));
    assert_eq!(cost, Cost::UNKNOWN);
    assert!(!cost.is_bounded());
}

#[test]
fn test_index_and_presence_costs() {
    let b = ExprBuilder::new();
    let expr = b.index(b.ident("m"), b.ident("k"));
    assert_eq!(cost_of(expr), Cost::ONE);

    let b = ExprBuilder::new();
    assert_eq!(cost_of(b.has(b.ident("m"), "f")), Cost::ONE);
}

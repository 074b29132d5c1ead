use crate::interpreter::{Cost, UNBOUNDED};
use crate::overloads::operators::{ADD, GREATER_EQUALS, IN, LESS, NOT_STRICTLY_FALSE, SIZE};
use crate::overloads::{Overload, OverloadCost, Registry, RegistryError, dispatch};
use crate::types::Traits;
use crate::values::{ErrorKind, Val};

fn kind(v: &Val) -> Option<ErrorKind> {
    v.as_error().map(|e| e.kind())
}

#[test]
fn test_collisions_are_rejected() {
    let mut builder = Registry::builder();
    builder
        .add(Overload::binary("join", |a, _| a.clone()).with_trait(Traits::ADDER))
        .expect("first registration");

    // Same arity, overlapping trait.
    let err = builder
        .add(Overload::binary("join", |_, b| b.clone()).with_trait(Traits::ADDER))
        .err();
    assert_eq!(err, Some(RegistryError::Collision { id: "join".into() }));

    // No trait overlaps any trait.
    assert!(builder.add(Overload::binary("join", |a, _| a.clone())).is_err());

    // Different arity is fine.
    assert!(builder.add(Overload::unary("join", Val::clone)).is_ok());

    // Disjoint traits are fine.
    assert!(
        builder
            .add(Overload::binary("join", |a, _| a.clone()).with_trait(Traits::MATCHER))
            .is_ok()
    );

    assert_eq!(
        builder.add(Overload::unary("", Val::clone)).err(),
        Some(RegistryError::EmptyId)
    );

    let registry = builder.build();
    assert_eq!(registry.find("join").len(), 3);
    assert!(registry.find("missing").is_empty());
}

#[test]
fn test_standard_dispatch_checks_traits() {
    let registry = Registry::standard();
    let add = registry.find(ADD);
    assert_eq!(dispatch(ADD, add, &[Val::Int(1), Val::Int(2)]), Val::Int(3));
    // Bool is not an Adder.
    assert_eq!(
        kind(&dispatch(ADD, add, &[Val::Bool(true), Val::Bool(false)])),
        Some(ErrorKind::NoSuchOverload)
    );
    assert_eq!(
        dispatch(LESS, registry.find(LESS), &[Val::Int(1), Val::Int(2)]),
        Val::Bool(true)
    );
}

#[test]
fn test_in_dispatches_on_right_operand() {
    let registry = Registry::standard();
    let list = Val::list([Val::Int(1), Val::Int(2)]);
    assert_eq!(
        dispatch(IN, registry.find(IN), &[Val::Int(2), list.clone()]),
        Val::Bool(true)
    );
    assert_eq!(
        kind(&dispatch(IN, registry.find(IN), &[list, Val::Int(2)])),
        Some(ErrorKind::NoSuchOverload)
    );
}

#[test]
fn test_dispatch_propagates_unknown_over_err() {
    let registry = Registry::standard();
    let err = Val::error(ErrorKind::DivideByZero, "divide by zero");
    assert_eq!(
        dispatch(ADD, registry.find(ADD), &[err.clone(), Val::unknown(4)]),
        Val::unknown(4)
    );
    assert_eq!(
        kind(&dispatch(ADD, registry.find(ADD), &[Val::Int(1), err])),
        Some(ErrorKind::DivideByZero)
    );
}

#[test]
fn test_mismatched_comparison_names_the_operator() {
    let registry = Registry::standard();
    let result = dispatch(LESS, registry.find(LESS), &[Val::Int(1), Val::from("a")]);
    let err = result.as_error().expect("error value");
    assert_eq!(err.kind(), ErrorKind::NoSuchOverload);
    assert_eq!(err.message(), "no such overload: _<_(int, string)");

    let ge = registry.find(GREATER_EQUALS);
    let result = dispatch(GREATER_EQUALS, ge, &[Val::Bool(true), Val::Int(0)]);
    let message = result.as_error().map(|e| e.message().to_string());
    assert_eq!(message.as_deref(), Some("no such overload: _>=_(bool, int)"));
}

#[test]
fn test_non_strict_overload_sees_errors() {
    let registry = Registry::standard();
    let nsf = registry.find(NOT_STRICTLY_FALSE);
    let err = Val::error(ErrorKind::NoSuchKey, "no such key: 'a'");
    assert_eq!(dispatch(NOT_STRICTLY_FALSE, nsf, &[err]), Val::Bool(true));
    assert_eq!(
        dispatch(NOT_STRICTLY_FALSE, nsf, &[Val::Bool(false)]),
        Val::Bool(false)
    );
}

#[test]
fn test_receiver_fallback() {
    let registry = Registry::standard();
    let t = Val::from("2024-05-06T07:08:09Z").convert_to_type(&crate::types::TIMESTAMP_TYPE);
    assert_eq!(dispatch("getHours", registry.find("getHours"), &[t]), Val::Int(7));
    assert_eq!(
        kind(&dispatch("frobnicate", &[], &[Val::Int(1)])),
        Some(ErrorKind::NoSuchOverload)
    );
}

#[test]
fn test_panicking_overload_becomes_internal_error() {
    crate::test_utils::init_test_logging();

    let boom = Overload::unary("boom", |_| panic!("kaboom"));
    let result = boom.invoke(&[Val::Int(1)]);
    let err = result.as_error().expect("error value");
    assert_eq!(err.kind(), ErrorKind::Internal);
    let cause = err.cause().map(|c| c.to_string());
    assert_eq!(cause.as_deref(), Some("overload panicked: kaboom"));
}

#[test]
fn test_overload_costs() {
    let registry = Registry::standard();
    let add = &registry.find(ADD)[0];
    assert_eq!(add.cost(&[None, None]), Cost::new(1, 1));

    let size = &registry.find(SIZE)[0];
    assert_eq!(size.cost(&[Some(40)]), Cost::new(1, 40));
    assert_eq!(size.cost(&[None]), Cost::new(1, UNBOUNDED));

    let custom = Overload::unary("slow", Val::clone).with_cost(OverloadCost::Const(25));
    assert_eq!(custom.cost(&[None]), Cost::constant(25));
}

use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::{Env, PlanOptions};
use crate::ast::ExprBuilder;
use crate::overloads::operators::{ADD, GREATER, MULTIPLY};
use crate::overloads::{Overload, Registry};
use crate::values::{ErrorKind, Val};

#[test]
fn test_default_env() {
    crate::test_utils::init_test_logging();
    let env = Env::new();
    assert!(env.registry().contains(ADD));
    assert!(!env.options().optimize);

    let b = ExprBuilder::new();
    let program = env
        .plan_unchecked(b.binary(ADD, b.ident("x"), b.literal(1i64)))
        .expect("plans");
    let vars = env.activation().bind("x", 41i64);
    assert_eq!(program.eval(&vars), Val::Int(42));
}

#[test]
fn test_container_resolution() {
    let env = Env::builder().container("acme.billing").build();
    let b = ExprBuilder::new();
    let program = env.plan_unchecked(b.ident("limit")).expect("plans");

    let vars = env.activation().bind("limit", 1i64);
    assert_eq!(program.eval(&vars), Val::Int(1));

    let vars = vars.bind("acme.limit", 2i64);
    assert_eq!(program.eval(&vars), Val::Int(2));

    let vars = vars.bind("acme.billing.limit", 3i64);
    assert_eq!(program.eval(&vars), Val::Int(3));
}

#[test]
fn test_custom_overloads() {
    let mut builder = Registry::builder().with_standard_library();
    builder
        .add(Overload::binary("clamp_max", |v, limit| {
            match (v, limit) {
                (Val::Int(v), Val::Int(limit)) => Val::Int(*v.min(limit)),
                _ => Val::no_such_overload("clamp_max", &[v, limit]),
            }
        }))
        .expect("registers");
    let env = Env::builder().registry(builder.build()).build();

    let b = ExprBuilder::new();
    let expr = b.call("clamp_max", vec![b.ident("n"), b.literal(10i64)]);
    let program = env.plan_unchecked(expr).expect("plans");

    assert_eq!(program.eval(&env.activation().bind("n", 25i64)), Val::Int(10));
    assert_eq!(program.eval(&env.activation().bind("n", 3i64)), Val::Int(3));
    assert_eq!(
        program
            .eval(&env.activation().bind("n", "x"))
            .as_error()
            .map(|e| e.kind()),
        Some(ErrorKind::NoSuchOverload)
    );
}

#[test]
fn test_shared_registry() {
    let registry = Arc::new(Registry::standard());
    let plain = Env::builder().shared_registry(registry.clone()).build();
    let optimizing = Env::builder()
        .shared_registry(registry)
        .options(PlanOptions {
            optimize: true,
            ..PlanOptions::default()
        })
        .build();

    let b = ExprBuilder::new();
    let expr = b.binary(MULTIPLY, b.literal(6i64), b.literal(7i64));
    let a = plain.plan_unchecked(expr.clone()).expect("plans");
    let c = optimizing.plan_unchecked(expr).expect("plans");
    assert_eq!(a.eval(&plain.activation()), c.eval(&optimizing.activation()));
    assert!(c.root().is_const());
}

#[test]
fn test_eval_native() {
    let env = Env::new();
    let b = ExprBuilder::new();
    let expr = b.binary(GREATER, b.ident("x"), b.literal(1i64));
    let program = env.plan_unchecked(expr).expect("plans");

    let yes: bool = program
        .eval_native(&env.activation().bind("x", 2i64))
        .expect("bool result");
    assert!(yes);

    let err = program
        .eval_native::<bool>(&env.activation())
        .expect_err("x is unbound");
    assert_eq!(err.kind(), ErrorKind::NoSuchAttribute);

    let err = program
        .eval_native::<String>(&env.activation().bind("x", 2i64))
        .expect_err("not a string");
    assert_eq!(err.kind(), ErrorKind::UnsupportedConversion);
}

#[test]
fn test_programs_evaluate_concurrently() {
    let env = Env::new();
    let b = ExprBuilder::new();
    let doubled = b.map_macro(
        b.ident("xs"),
        "x",
        b.binary(MULTIPLY, b.ident("x"), b.literal(2i64)),
    );
    let program = env.plan_unchecked(doubled).expect("plans");

    std::thread::scope(|scope| {
        for n in 0..4i64 {
            let program = &program;
            let env = &env;
            scope.spawn(move || {
                let vars = env
                    .activation()
                    .bind("xs", Val::list([Val::Int(n), Val::Int(n + 1)]));
                for _ in 0..100 {
                    assert_eq!(
                        program.eval(&vars),
                        Val::list([Val::Int(2 * n), Val::Int(2 * n + 2)])
                    );
                }
            });
        }
    });
}

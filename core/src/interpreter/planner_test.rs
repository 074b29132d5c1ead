use pretty_assertions::assert_eq;

use super::interpretable::Node;
use crate::activation::MapActivation;
use crate::api::{Env, PlanError, PlanOptions};
use crate::ast::{CheckedExpr, Expr, ExprBuilder, ExprKind, Reference};
use crate::overloads::operators::*;
use crate::types::{INT_TYPE, ObjectType, TypeProvider, TypeRegistry};
use crate::values::{ErrorKind, Val};

fn optimizing() -> Env {
    Env::builder()
        .options(PlanOptions {
            optimize: true,
            ..PlanOptions::default()
        })
        .build()
}

#[test]
fn test_unknown_global_function() {
    let b = ExprBuilder::new();
    let expr = b.call("nope", vec![b.literal(1i64)]);
    let id = expr.id;
    assert_eq!(
        Env::new().plan_unchecked(expr).unwrap_err(),
        PlanError::UnknownFunction {
            function: "nope".into(),
            id,
        }
    );
}

#[test]
fn test_arity_mismatch() {
    let b = ExprBuilder::new();
    let expr = b.call(SIZE, vec![b.literal("a"), b.literal("b"), b.literal("c")]);
    let id = expr.id;
    let err = Env::new().plan_unchecked(expr).unwrap_err();
    assert_eq!(
        err,
        PlanError::ArityMismatch {
            function: SIZE.into(),
            found: 3,
            id,
        }
    );
    assert_eq!(err.expr_id(), id);
}

#[test]
fn test_malformed_operator_call() {
    let b = ExprBuilder::new();
    let expr = b.call(LOGICAL_AND, vec![b.literal(true)]);
    let err = Env::new().plan_unchecked(expr).unwrap_err();
    assert!(matches!(err, PlanError::Malformed { .. }), "{err:?}");
    assert_eq!(err.to_string(), "malformed expression 2: '_&&_' takes 2 operands");

    let b = ExprBuilder::new();
    let expr = Expr {
        id: 10,
        kind: ExprKind::CreateStruct {
            type_name: None,
            entries: vec![crate::ast::Entry {
                id: 11,
                key: crate::ast::EntryKey::Field("a".into()),
                value: b.literal(1i64),
            }],
        },
    };
    let err = Env::new().plan_unchecked(expr).unwrap_err();
    assert!(matches!(err, PlanError::Malformed { id: 11, .. }), "{err:?}");
}

#[test]
fn test_unknown_object_type() {
    let b = ExprBuilder::new();
    let expr = b.object("Missing", vec![]);
    let id = expr.id;
    assert_eq!(
        Env::new().plan_unchecked(expr).unwrap_err(),
        PlanError::UnknownType {
            type_name: "Missing".into(),
            id,
        }
    );
}

#[test]
fn test_unregistered_member_call_plans() {
    let b = ExprBuilder::new();
    let expr = b.member_call(b.ident("x"), "frobnicate", vec![]);
    let program = Env::new().plan_unchecked(expr).expect("member calls plan");
    let result = program.eval(&MapActivation::new().bind("x", 1i64));
    assert_eq!(
        result.as_error().map(|e| e.kind()),
        Some(ErrorKind::NoSuchOverload)
    );
}

#[test]
fn test_folds_constant_calls() {
    let b = ExprBuilder::new();
    let expr = b.binary(ADD, b.literal(1i64), b.literal(2i64));
    let program = optimizing().plan_unchecked(expr).expect("plans");
    assert_eq!(program.root().as_const(), Some(&Val::Int(3)));
    assert_eq!(program.node_count(), 1);

    let b = ExprBuilder::new();
    let expr = b.list(vec![
        b.binary(ADD, b.literal(1i64), b.literal(2i64)),
        b.literal(4i64),
    ]);
    let program = optimizing().plan_unchecked(expr).expect("plans");
    assert_eq!(
        program.root().as_const(),
        Some(&Val::list([Val::Int(3), Val::Int(4)]))
    );
}

#[test]
fn test_does_not_fold_errors() {
    let b = ExprBuilder::new();
    let expr = b.binary(DIVIDE, b.literal(1i64), b.literal(0i64));
    let program = optimizing().plan_unchecked(expr).expect("plans");
    assert!(!program.root().is_const());
    assert!(matches!(program.root().node(), Node::Call(_)));
    assert_eq!(
        program
            .eval(&MapActivation::new())
            .as_error()
            .map(|e| e.kind()),
        Some(ErrorKind::DivideByZero)
    );
}

#[test]
fn test_folds_constant_conditional_to_branch() {
    let b = ExprBuilder::new();
    let x = b.ident("x");
    let x_id = x.id;
    let expr = b.conditional(b.literal(true), x, b.ident("y"));
    let program = optimizing().plan_unchecked(expr).expect("plans");
    assert_eq!(program.root().id(), x_id);
    assert!(matches!(program.root().node(), Node::Attribute(_)));
}

#[test]
fn test_no_folding_without_optimize() {
    let b = ExprBuilder::new();
    let expr = b.binary(ADD, b.literal(1i64), b.literal(2i64));
    let program = Env::new().plan_unchecked(expr).expect("plans");
    assert!(matches!(program.root().node(), Node::Call(_)));
    assert_eq!(program.node_count(), 3);
}

#[test]
fn test_folding_preserves_results() {
    let build = || {
        let b = ExprBuilder::new();
        let sum = b.binary(ADD, b.literal(2i64), b.literal(3i64));
        let cmp = b.binary(LESS, b.ident("x"), sum);
        let gt = b.binary(GREATER, b.ident("v"), b.literal(1i64));
        let any = b.exists(
            b.list(vec![b.literal(1i64), b.literal(2i64)]),
            "v",
            gt,
        );
        b.and(cmp, any)
    };
    let plain = Env::new().plan_unchecked(build()).expect("plans");
    let folded = optimizing().plan_unchecked(build()).expect("plans");
    assert!(folded.node_count() < plain.node_count());

    for x in [1i64, 5, 9] {
        let vars = MapActivation::new().bind("x", x);
        assert_eq!(plain.eval(&vars), folded.eval(&vars));
    }
    let empty = MapActivation::new();
    assert_eq!(
        plain.eval(&empty).as_error().map(|e| e.kind()),
        folded.eval(&empty).as_error().map(|e| e.kind())
    );
}

#[test]
fn test_checked_references() {
    let b = ExprBuilder::new();
    let ident = b.ident("b");
    let ident_id = ident.id;
    let checked = CheckedExpr::unchecked(ident).with_reference(ident_id, Reference::ident("a.b"));
    let program = Env::new().plan(&checked).expect("plans");
    let vars = MapActivation::new().bind("a.b", 1i64).bind("b", 2i64);
    assert_eq!(program.eval(&vars), Val::Int(1));

    let b = ExprBuilder::new();
    let select = b.select(b.ident("Color"), "RED");
    let select_id = select.id;
    let checked =
        CheckedExpr::unchecked(select).with_reference(select_id, Reference::constant(Val::Int(0)));
    let program = Env::new().plan(&checked).expect("plans");
    assert_eq!(program.root().as_const(), Some(&Val::Int(0)));
}

#[test]
fn test_checked_types_select_typed_getters() {
    let mut types = TypeRegistry::new();
    types.register(ObjectType::new("acme.Account").field("id", &INT_TYPE));
    let account_type = types.find_type("acme.Account").expect("registered");
    let env = Env::builder().types(types).build();

    let b = ExprBuilder::new();
    let operand = b.ident("account");
    let operand_id = operand.id;
    let has = b.has(operand, "id");
    let checked = CheckedExpr::unchecked(has).with_type(operand_id, account_type.clone());
    let program = env.plan(&checked).expect("plans");
    let Node::HasField(has) = program.root().node() else {
        panic!("expected a presence test");
    };
    assert!(has.tester.is_some());

    let b = ExprBuilder::new();
    let operand = b.ident("account");
    let operand_id = operand.id;
    let select = b.select(operand, "id");
    let checked = CheckedExpr::unchecked(select).with_type(operand_id, account_type);
    let program = env.plan(&checked).expect("plans");

    let b = ExprBuilder::new();
    let ctor = b.object("acme.Account", vec![("id", b.literal(9i64))]);
    let account = env
        .plan_unchecked(ctor)
        .expect("plans")
        .eval(&MapActivation::new());
    let vars = MapActivation::new().bind("account", account);
    assert_eq!(program.eval(&vars), Val::Int(9));
}

#[test]
fn test_constant_lists_become_membership_sets() {
    let build = || {
        let b = ExprBuilder::new();
        let list = b.list(vec![b.literal("red"), b.literal("green"), b.literal("blue")]);
        b.binary(IN, b.ident("color"), list)
    };
    let program = optimizing().plan_unchecked(build()).expect("plans");
    let Node::SetMembership(m) = program.root().node() else {
        panic!("expected a set membership test");
    };
    assert_eq!(m.set.len(), 3);
    assert_eq!(program.node_count(), 3);

    let plain = Env::new().plan_unchecked(build()).expect("plans");
    let inputs = [
        Val::from("green"),
        Val::from("pink"),
        Val::Int(1),
        Val::Double(1.5),
        Val::list([Val::from("red")]),
    ];
    for color in inputs {
        let vars = MapActivation::new().bind("color", color.clone());
        assert_eq!(program.eval(&vars), plain.eval(&vars), "{color}");
    }
    let missing = program.eval(&MapActivation::new());
    assert_eq!(
        missing.as_error().map(|e| e.kind()),
        Some(ErrorKind::NoSuchAttribute)
    );

    // Lists with elements that cannot key a map keep the regular call.
    let b = ExprBuilder::new();
    let list = b.list(vec![b.literal(1.5f64), b.literal(2i64)]);
    let expr = b.binary(IN, b.ident("x"), list);
    let program = optimizing().plan_unchecked(expr).expect("plans");
    assert!(matches!(program.root().node(), Node::Call(_)));
    let vars = MapActivation::new().bind("x", 1.5f64);
    assert_eq!(program.eval(&vars), Val::Bool(true));
}

#[test]
fn test_constant_patterns_are_compiled_once() {
    let build = |pattern: &str| {
        let b = ExprBuilder::new();
        b.member_call(b.ident("name"), MATCHES, vec![b.literal(pattern)])
    };
    let program = optimizing().plan_unchecked(build("^a+b$")).expect("plans");
    assert!(matches!(program.root().node(), Node::ConstMatch(_)));
    let plain = Env::new().plan_unchecked(build("^a+b$")).expect("plans");
    for name in [Val::from("aab"), Val::from("abc"), Val::Int(3)] {
        let vars = MapActivation::new().bind("name", name.clone());
        assert_eq!(program.eval(&vars), plain.eval(&vars), "{name}");
    }

    // Invalid patterns are left to fail at evaluation.
    let program = optimizing().plan_unchecked(build("(")).expect("plans");
    assert!(matches!(program.root().node(), Node::Call(_)));
    let vars = MapActivation::new().bind("name", "x");
    assert_eq!(
        program.eval(&vars).as_error().map(|e| e.kind()),
        Some(ErrorKind::InvalidArgument)
    );
}

#[test]
fn test_tracking_wraps_nodes_without_changing_results() {
    let options = PlanOptions {
        optimize: true,
        track_state: true,
        ..PlanOptions::default()
    };
    let env = Env::builder().options(options).build();
    let build = || {
        let b = ExprBuilder::new();
        let sum = b.binary(ADD, b.literal(1i64), b.literal(2i64));
        let user = b.select(b.ident("request"), "user");
        b.and(b.binary(LESS, b.ident("x"), sum), b.binary(EQUALS, user, b.literal("ada")))
    };
    let tracked = env.plan_unchecked(build()).expect("plans");
    let folded = optimizing().plan_unchecked(build()).expect("plans");
    assert!(matches!(tracked.root().node(), Node::Observe(_)));
    assert_eq!(tracked.node_count(), folded.node_count());
    assert_eq!(tracked.cost(), folded.cost());

    let vars = MapActivation::new().bind("x", 1i64).bind(
        "request",
        Val::map([(Val::from("user"), Val::from("ada"))]),
    );
    let (value, state) = tracked.eval_tracked(&vars);
    assert_eq!(value, folded.eval(&vars));
    assert_eq!(value, Val::Bool(true));
    // The folded sum is observed as a constant.
    assert!(state.ids().iter().any(|id| state.value(*id) == Some(Val::Int(3))));
}

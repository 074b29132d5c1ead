use pretty_assertions::assert_eq;

use super::{ACCUMULATOR, CheckedExpr, EntryKey, ExprBuilder, ExprKind, Reference};
use crate::overloads::operators::{LOGICAL_AND, NOT_STRICTLY_FALSE};
use crate::values::Val;

#[test]
fn test_ids_are_unique_and_increasing() {
    let b = ExprBuilder::new();
    let x = b.ident("x");
    let one = b.literal(1i64);
    let sum = b.binary("_+_", x, one);
    assert_eq!(sum.id, 3);
    assert_eq!(b.peek_id(), 4);
    assert_eq!(sum.node_count(), 3);
}

#[test]
fn test_all_expansion() {
    let b = ExprBuilder::new();
    let range = b.ident("xs");
    let pred = b.binary("_>_", b.ident("x"), b.literal(0i64));
    let expr = b.all(range, "x", pred);

    let ExprKind::Comprehension(c) = &expr.kind else {
        panic!("expected comprehension, got {:?}", expr.kind);
    };
    assert_eq!(c.iter_var, "x");
    assert_eq!(c.accu_var, ACCUMULATOR);
    assert_eq!(c.accu_init.kind, ExprKind::Literal(Val::Bool(true)));
    match &c.loop_condition.kind {
        ExprKind::Call { function, args, .. } => {
            assert_eq!(function, NOT_STRICTLY_FALSE);
            assert_eq!(args.len(), 1);
        }
        other => panic!("unexpected loop condition {:?}", other),
    }
    match &c.loop_step.kind {
        ExprKind::Call { function, .. } => assert_eq!(function, LOGICAL_AND),
        other => panic!("unexpected loop step {:?}", other),
    }
    assert_eq!(c.result.kind, ExprKind::Ident(ACCUMULATOR.into()));
}

#[test]
fn test_map_and_object_entries() {
    let b = ExprBuilder::new();
    let map = b.map(vec![(b.literal("k"), b.literal(1i64))]);
    match &map.kind {
        ExprKind::CreateStruct { type_name, entries } => {
            assert!(type_name.is_none());
            assert!(matches!(entries[0].key, EntryKey::Key(_)));
        }
        other => panic!("unexpected {:?}", other),
    }

    let obj = b.object("acme.Account", vec![("id", b.literal(7i64))]);
    match &obj.kind {
        ExprKind::CreateStruct { type_name, entries } => {
            assert_eq!(type_name.as_deref(), Some("acme.Account"));
            assert_eq!(entries[0].key, EntryKey::Field("id".into()));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_checked_expr_annotations() {
    let b = ExprBuilder::new();
    let expr = b.ident("x");
    let id = expr.id;
    let checked = CheckedExpr::unchecked(expr)
        .with_reference(id, Reference::ident("pkg.x"))
        .with_type(id, crate::types::INT_TYPE.clone());
    assert_eq!(
        checked.reference(id).and_then(|r| r.name.as_deref()),
        Some("pkg.x")
    );
    assert_eq!(checked.type_of(id), Some(&crate::types::INT_TYPE));
    assert!(checked.reference(id + 1).is_none());
}

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::activation::{
    Activation, AttributePattern, EmptyActivation, FnActivation, HierarchicalActivation,
    MapActivation, PartialActivation, QualifierPattern, VarFrame,
};
use crate::values::Val;

#[test]
fn test_map_activation_lookup() {
    let vars = MapActivation::new().bind("a", 1i64).bind("b", "two");
    assert_eq!(vars.resolve_name("a"), Some(Val::Int(1)));
    assert_eq!(vars.resolve_name("b"), Some(Val::from("two")));
    assert_eq!(vars.resolve_name("c"), None);
    assert_eq!(vars.len(), 2);
}

#[test]
fn test_lazy_binding_is_computed_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let vars = MapActivation::new().bind_lazy("slow", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Val::Int(42)
    });
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(vars.resolve_name("slow"), Some(Val::Int(42)));
    assert_eq!(vars.resolve_name("slow"), Some(Val::Int(42)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_native_binding_goes_through_adapter() {
    let vars = MapActivation::new()
        .bind_native("n", 7u32)
        .bind_native("names", vec!["a".to_string(), "b".to_string()])
        .bind_native("opaque", std::time::Instant::now());
    assert_eq!(vars.resolve_name("n"), Some(Val::Uint(7)));
    assert_eq!(
        vars.resolve_name("names"),
        Some(Val::list([Val::from("a"), Val::from("b")]))
    );
    assert!(vars.resolve_name("opaque").is_some_and(|v| v.is_err()));
}

#[test]
fn test_hierarchical_child_shadows_parent() {
    let parent = MapActivation::new().bind("x", 1i64).bind("y", 2i64);
    let child = MapActivation::new().bind("x", 10i64);
    let act = HierarchicalActivation::new(parent, child);
    assert_eq!(act.resolve_name("x"), Some(Val::Int(10)));
    assert_eq!(act.resolve_name("y"), Some(Val::Int(2)));
    assert!(act.parent().is_some());
}

#[test]
fn test_var_frames_shadow_for_their_lifetime() {
    let outer = MapActivation::new().bind("x", 1i64);
    {
        let mut frame = VarFrame::new(&outer, "x", Val::Int(5));
        assert_eq!(frame.resolve_name("x"), Some(Val::Int(5)));
        frame.set_value(Val::Int(6));
        let inner = VarFrame::new(&frame, "y", Val::Int(7));
        assert_eq!(inner.resolve_name("x"), Some(Val::Int(6)));
        assert_eq!(inner.resolve_name("y"), Some(Val::Int(7)));
    }
    assert_eq!(outer.resolve_name("x"), Some(Val::Int(1)));
}

#[test]
fn test_fn_activation() {
    let act = FnActivation(|name: &str| (name == "now").then(|| Val::Int(0)));
    assert_eq!(act.resolve_name("now"), Some(Val::Int(0)));
    assert_eq!(act.resolve_name("later"), None);
    assert_eq!(EmptyActivation.resolve_name("now"), None);
}

#[test]
fn test_partial_patterns_are_visible_through_frames() {
    let partial = PartialActivation::new(
        MapActivation::new(),
        vec![AttributePattern::new("request").field("auth")],
    );
    let frame = VarFrame::new(&partial, "i", Val::Int(0));
    assert_eq!(frame.unknown_patterns().len(), 1);

    let layered = HierarchicalActivation::new(&partial, MapActivation::new());
    assert_eq!(layered.unknown_patterns()[0].variable(), "request");
}

#[test]
fn test_qualifier_pattern_matching() {
    let pattern = AttributePattern::new("a").field("b").int(0).wildcard();
    let quals = pattern.qualifiers();
    assert!(quals[0].matches(&Val::from("b")));
    assert!(!quals[0].matches(&Val::from("c")));
    assert!(quals[1].matches(&Val::Int(0)));
    assert!(!quals[1].matches(&Val::Uint(0)));
    assert_eq!(quals[2], QualifierPattern::Wildcard);
    assert!(quals[2].matches(&Val::Double(1.5)));
}

#![allow(dead_code)]

use celeste::ast::Expr;
use celeste::{Activation, Env, ErrorKind, PlanOptions, Val};
use once_cell::sync::Lazy;

/// Standard environment shared by every test in a binary.
pub static ENV: Lazy<Env> = Lazy::new(Env::new);

/// Same environment with constant folding.
pub static FOLDING_ENV: Lazy<Env> = Lazy::new(|| {
    Env::builder()
        .options(PlanOptions {
            optimize: true,
            ..PlanOptions::default()
        })
        .build()
});

/// Evaluates `expr` with and without folding and checks both agree.
pub fn eval(expr: Expr, vars: &dyn Activation) -> Val {
    let plain = ENV.plan_unchecked(expr.clone()).expect("plans");
    let folded = FOLDING_ENV.plan_unchecked(expr).expect("plans");
    let result = plain.eval(vars);
    let folded_result = folded.eval(vars);
    assert_eq!(
        error_kind(&result),
        error_kind(&folded_result),
        "folding changed the error kind"
    );
    if !result.is_err() {
        assert_eq!(result, folded_result, "folding changed the result");
    }
    result
}

pub fn error_kind(v: &Val) -> Option<ErrorKind> {
    v.as_error().map(|e| e.kind())
}

/// Declares a test evaluating an expression built with an `ExprBuilder`
/// against an empty activation.
#[macro_export]
macro_rules! eval_case {
    ($name:ident, |$b:ident| $expr:expr, $expected:expr $(,)?) => {
        #[test]
        fn $name() {
            let $b = celeste::ast::ExprBuilder::new();
            let result = cases::eval($expr, &celeste::MapActivation::new());
            pretty_assertions::assert_eq!(result, $expected);
        }
    };
}

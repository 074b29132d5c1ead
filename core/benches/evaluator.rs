//! Benchmarks for the evaluator.
//!
//! Run with: `cargo bench` in the core/ directory.
//!
//! Benchmark groups:
//! 1. eval_only: evaluation of a program planned once
//! 2. plan_and_eval: planning plus evaluation, for comparison
//! 3. comprehension: macro loops over bound lists of growing size

use celeste_core::activation::MapActivation;
use celeste_core::api::{Env, PlanOptions};
use celeste_core::ast::{Expr, ExprBuilder};
use celeste_core::overloads::operators::{ADD, GREATER};
use celeste_core::values::Val;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

/// `x + 1 + 1 + ... + 1` with `n` additions.
fn arithmetic_chain(n: usize) -> Expr {
    let b = ExprBuilder::new();
    let mut expr = b.ident("x");
    for _ in 0..n {
        expr = b.binary(ADD, expr, b.literal(1i64));
    }
    expr
}

fn bench_eval_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("eval_only");
    let env = Env::new();

    for size in [10, 100, 400] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let program = env.plan_unchecked(arithmetic_chain(size)).expect("plans");
            let vars = env.activation().bind("x", 0i64);
            b.iter(|| black_box(program.eval(black_box(&vars))));
        });
    }
    group.finish();
}

fn bench_plan_and_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_and_eval");

    for optimize in [false, true] {
        let options = PlanOptions {
            optimize,
            ..PlanOptions::default()
        };
        let env = Env::builder().options(options).build();
        group.bench_with_input(
            BenchmarkId::new("optimize", optimize),
            &optimize,
            |b, _| {
                let vars = env.activation().bind("x", 0i64);
                b.iter(|| {
                    let program = env.plan_unchecked(arithmetic_chain(100)).expect("plans");
                    black_box(program.eval(&vars))
                });
            },
        );
    }
    group.finish();
}

fn bench_comprehension(c: &mut Criterion) {
    let mut group = c.benchmark_group("comprehension");
    let env = Env::new();
    let b = ExprBuilder::new();
    let pred = b.binary(GREATER, b.ident("x"), b.literal(-1i64));
    let program = env
        .plan_unchecked(b.all(b.ident("xs"), "x", pred))
        .expect("plans");

    for size in [10i64, 100, 1000] {
        group.throughput(Throughput::Elements(size as u64));
        let vars = MapActivation::new().bind("xs", Val::list((0..size).map(Val::Int)));
        group.bench_with_input(BenchmarkId::from_parameter(size), &vars, |bench, vars| {
            bench.iter(|| black_box(program.eval(vars)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_eval_only, bench_plan_and_eval, bench_comprehension);
criterion_main!(benches);

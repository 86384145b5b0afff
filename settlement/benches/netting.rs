//! Optimizer scaling benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ledger_core::{UserBalance, UserId};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rust_decimal::Decimal;
use settlement::SettlementOptimizer;

/// Balanced random positions for `n` members
fn random_balances(n: usize, seed: u64) -> Vec<UserBalance> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut cents: Vec<i64> = (0..n - 1).map(|_| rng.gen_range(-100_000..100_000)).collect();
    let sum: i64 = cents.iter().sum();
    cents.push(-sum);

    cents
        .into_iter()
        .enumerate()
        .map(|(i, c)| UserBalance {
            user_id: UserId::new(format!("user-{:04}", i)),
            total_paid: Decimal::ZERO,
            total_owed: Decimal::ZERO,
            net_balance: Decimal::new(c, 2),
        })
        .collect()
}

fn bench_optimize(c: &mut Criterion) {
    let optimizer = SettlementOptimizer::new();
    let mut group = c.benchmark_group("optimize");

    for size in [4usize, 16, 64, 256] {
        let balances = random_balances(size, 42);
        group.bench_with_input(BenchmarkId::from_parameter(size), &balances, |b, input| {
            b.iter(|| optimizer.optimize(black_box(input)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_optimize);
criterion_main!(benches);

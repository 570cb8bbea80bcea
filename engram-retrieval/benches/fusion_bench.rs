use criterion::{black_box, criterion_group, criterion_main, Criterion};

use engram_retrieval::{fuse, BranchOutput};

fn branch(name: &'static str, weight: f64, n: usize, seed: u64) -> BranchOutput {
    // Deterministic pseudo-random scores; no RNG dependency needed.
    let results = (0..n)
        .map(|i| {
            let x = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(seed);
            (format!("object-{}", x % (n as u64 * 2)), (x % 1000) as f64 / 10.0)
        })
        .collect();
    BranchOutput::new(name, weight, results)
}

fn bench_fuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("fusion");

    for n in [50usize, 500, 5000] {
        let branches = vec![
            branch("lexical", 0.5, n, 17),
            branch("vector", 0.4, n, 101),
            branch("token", 0.1, n / 2, 9001),
        ];
        group.bench_function(format!("fuse_{n}"), |b| {
            b.iter(|| fuse(black_box(&branches)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fuse);
criterion_main!(benches);

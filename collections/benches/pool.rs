use criterion::{black_box, criterion_group, criterion_main, Criterion};
use latplan_collections::create_ref_type;
use latplan_collections::pool::Pool;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

create_ref_type!(Id);

fn churn(pool: &mut Pool<Id, u64>, values: &[u64]) {
    let keys: Vec<Id> = values.iter().map(|&v| pool.alloc(v)).collect();
    for k in keys {
        pool.release(k);
    }
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(79837224973);
    for &n in &[100, 1000, 10000] {
        let values: Vec<u64> = (0..n).map(|_| rng.random()).collect();
        let mut pool: Pool<Id, u64> = Pool::with_capacity(n);
        let name = format!("pool-alloc-release-{}", n);
        c.bench_function(&name, |b| b.iter(|| churn(&mut pool, black_box(&values))));
    }
}

criterion_group!(benches, criterion_benchmark);

criterion_main!(benches);

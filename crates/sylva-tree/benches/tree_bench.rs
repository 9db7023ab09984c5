//! Criterion benchmarks for sylva-tree: induction and cross-validation.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use sylva_tree::{CrossValidation, Table, TreeConfig};

fn make_table(n_rows: usize, n_attributes: usize, n_categories: u32, seed: u64) -> Table {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let rows = (0..n_rows)
        .map(|_| {
            let attrs: Vec<u32> = (0..n_attributes)
                .map(|_| rng.gen_range(0..n_categories))
                .collect();
            let label = u32::from(attrs[0] + attrs[1] >= n_categories);
            let mut row = vec![label];
            row.extend(attrs);
            row
        })
        .collect();
    Table::new(rows).unwrap()
}

fn bench_fit(c: &mut Criterion) {
    let table = make_table(300, 9, 6, 42);
    let config = TreeConfig::new();

    c.bench_function("id3_fit_300x9_6cat", |b| {
        b.iter(|| config.fit(&table).unwrap());
    });
}

fn bench_cross_validate(c: &mut Criterion) {
    let table = make_table(300, 9, 6, 42);
    let config = TreeConfig::new();
    let cv = CrossValidation::new(10).unwrap().with_seed(42);

    c.bench_function("id3_cv10_300x9_6cat", |b| {
        b.iter(|| cv.evaluate(&config, &table).unwrap());
    });
}

criterion_group!(benches, bench_fit, bench_cross_validate);
criterion_main!(benches);

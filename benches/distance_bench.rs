use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use neighbourspace::builder::NeighbourSearchBuilder;
use neighbourspace::core::{Item, ItemSet};
use neighbourspace::distance::{DistanceEngine, Metric};
use neighbourspace::fingerprint::Fingerprint;
use rand::prelude::*;
use std::collections::HashSet;
use std::hint::black_box;
use std::time::Duration;

const N_BITS: usize = 2048;
const DIM: usize = 300;

fn make_set(rng: &mut StdRng, n: usize, prefix: &str, scored: bool) -> ItemSet {
    let items = (0..n)
        .map(|i| {
            // ~50 active bits, in the range of a radius-2 Morgan fingerprint
            let active: Vec<usize> = (0..50).map(|_| rng.random_range(0..N_BITS)).collect();
            let vector: Vec<f64> = (0..DIM).map(|_| rng.random_range(-1.0..1.0)).collect();
            let item = Item::new(
                format!("{}{}", prefix, i),
                Fingerprint::from_indices(N_BITS, &active),
                vector,
            );
            if scored {
                item.with_score(rng.random::<f64>())
            } else {
                item
            }
        })
        .collect();
    ItemSet::new(items).unwrap()
}

fn bench_distances(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let reference = make_set(&mut rng, 2000, "r", false);

    let mut group = c.benchmark_group("distance_engine");
    group.measurement_time(Duration::from_secs(10));
    for n_query in [10usize, 100, 500] {
        let query = make_set(&mut rng, n_query, "q", true);
        group.bench_with_input(BenchmarkId::new("compute", n_query), &query, |b, q| {
            b.iter(|| {
                black_box(DistanceEngine::compute(q.items(), reference.items()).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let reference = make_set(&mut rng, 2000, "r", false);
    let query = make_set(&mut rng, 200, "q", true);
    let labels: HashSet<String> = reference.iter().step_by(10).map(|it| it.id.clone()).collect();

    let mut group = c.benchmark_group("search");
    group.measurement_time(Duration::from_secs(10));
    for (name, metric, block) in [
        ("vector", Metric::Vector, None),
        ("fingerprint", Metric::Fingerprint, None),
        ("vector_blocked_32", Metric::Vector, Some(32)),
    ] {
        let search = NeighbourSearchBuilder::new()
            .with_metric(metric)
            .with_neighbours(5)
            .with_query_block(block)
            .build()
            .unwrap();
        group.bench_function(name, |b| {
            b.iter(|| black_box(search.run(&query, &reference, &labels).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_distances, bench_search);
criterion_main!(benches);

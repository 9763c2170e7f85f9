//! Property tests over arbitrary small query/reference sets.
//!
//! 1. One record per query, scores non-increasing
//! 2. Selection distances non-decreasing within each neighbour set
//! 3. Means equal the mean of the reported neighbour distances
//! 4. Every reference appears at most once per query; K >= |reference| selects all
//! 5. Distances stay inside each metric's range
//! 6. Equal scores keep query-set order

use std::collections::HashSet;

use approx::relative_eq;
use proptest::collection::vec as prop_vec;
use proptest::prelude::*;

use crate::builder::NeighbourSearchBuilder;
use crate::core::{Item, ItemSet};
use crate::distance::Metric;
use crate::fingerprint::Fingerprint;
use crate::operators::mean;

/// (active bits, vector, score bucket)
fn arb_item(n_bits: usize, dim: usize) -> impl Strategy<Value = (Vec<bool>, Vec<f64>, u8)> {
    (
        prop_vec(any::<bool>(), n_bits),
        prop_vec(-10.0f64..10.0, dim),
        0u8..4,
    )
}

fn to_set(prefix: &str, raw: Vec<(Vec<bool>, Vec<f64>, u8)>, scored: bool) -> ItemSet {
    let items = raw
        .into_iter()
        .enumerate()
        .map(|(i, (bits, vector, s))| {
            let active: Vec<usize> = bits
                .iter()
                .enumerate()
                .filter(|(_, b)| **b)
                .map(|(j, _)| j)
                .collect();
            let item = Item::new(
                format!("{}{}", prefix, i),
                Fingerprint::from_indices(bits.len(), &active),
                vector,
            );
            if scored {
                item.with_score(s as f64 / 4.0)
            } else {
                item
            }
        })
        .collect();
    ItemSet::new(items).unwrap()
}

fn arb_case() -> impl Strategy<Value = (ItemSet, ItemSet, usize, Metric)> {
    (1usize..24, 1usize..5).prop_flat_map(|(n_bits, dim)| {
        (
            prop_vec(arb_item(n_bits, dim), 0..8),
            prop_vec(arb_item(n_bits, dim), 1..10),
            1usize..12,
            prop_oneof![Just(Metric::Vector), Just(Metric::Fingerprint)],
        )
            .prop_map(|(q, r, k, metric)| (to_set("q", q, true), to_set("r", r, false), k, metric))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_report_invariants((query, reference, k, metric) in arb_case()) {
        let labels: HashSet<String> = HashSet::new();
        let search = NeighbourSearchBuilder::new()
            .with_metric(metric)
            .with_neighbours(k)
            .build()
            .unwrap();
        let report = search.run(&query, &reference, &labels).unwrap();
        let k_eff = k.min(reference.len());

        prop_assert_eq!(report.len(), query.len());
        for w in report.windows(2) {
            prop_assert!(w[0].score >= w[1].score);
            if w[0].score == w[1].score {
                prop_assert!(w[0].query_index < w[1].query_index);
            }
        }

        for r in &report {
            prop_assert_eq!(r.neighbours.len(), k_eff);

            let ids: HashSet<&str> = r.neighbours.iter().map(|n| n.id.as_str()).collect();
            prop_assert_eq!(ids.len(), k_eff);

            for n in &r.neighbours {
                prop_assert!((0.0..=2.0).contains(&n.vector_distance));
                prop_assert!((0.0..=1.0).contains(&n.fingerprint_distance));
            }
            for w in r.neighbours.windows(2) {
                let (a, b) = match metric {
                    Metric::Vector => (w[0].vector_distance, w[1].vector_distance),
                    Metric::Fingerprint => (w[0].fingerprint_distance, w[1].fingerprint_distance),
                };
                prop_assert!(a <= b);
            }

            let mv = mean(r.neighbours.iter().map(|n| n.vector_distance)).unwrap();
            let mf = mean(r.neighbours.iter().map(|n| n.fingerprint_distance)).unwrap();
            prop_assert!(relative_eq!(r.mean_vector_distance, mv, epsilon = 1e-12));
            prop_assert!(relative_eq!(r.mean_fingerprint_distance, mf, epsilon = 1e-12));
        }
    }

    #[test]
    fn prop_block_size_does_not_change_output(
        (query, reference, k, metric) in arb_case(),
        block in 1usize..6,
    ) {
        let labels: HashSet<String> = reference.iter().step_by(2).map(|it| it.id.clone()).collect();
        let full = NeighbourSearchBuilder::new()
            .with_metric(metric)
            .with_neighbours(k)
            .build()
            .unwrap()
            .run(&query, &reference, &labels)
            .unwrap();

        let blocked = NeighbourSearchBuilder::new()
            .with_metric(metric)
            .with_neighbours(k)
            .with_query_block(Some(block))
            .build()
            .unwrap()
            .run(&query, &reference, &labels)
            .unwrap();
        prop_assert_eq!(full, blocked);
    }
}

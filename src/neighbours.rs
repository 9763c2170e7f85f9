//! Neighbour selection: the K nearest references per query row.
//!
//! Rows are ranked by `(distance, reference index)` under the selection
//! metric, so equal distances always resolve to the lower reference index and
//! the result is exactly what a stable ascending sort would give. Selection
//! uses `select_nth_unstable_by` on that total order and then sorts only the
//! first K, which keeps each row at `O(|reference| + K log K)`.
//!
//! For every selected reference the distance under the other metric is read
//! from the second matrix, so both metrics are available whichever one drove
//! the selection.

use std::cmp::Ordering;

use log::{debug, warn};
use rayon::prelude::*;

use crate::distance::{DistanceMatrix, Metric};
use crate::errors::{NeighbourError, Result};

/// One selected reference item for a query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbour {
    /// Index into the reference set.
    pub index: usize,
    pub vector_distance: f64,
    pub fingerprint_distance: f64,
}

impl Neighbour {
    #[inline]
    pub fn distance(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Vector => self.vector_distance,
            Metric::Fingerprint => self.fingerprint_distance,
        }
    }
}

/// Neighbours of one query, nearest first under the selection metric.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighbourSet {
    pub query_index: usize,
    pub metric: Metric,
    pub neighbours: Vec<Neighbour>,
}

impl NeighbourSet {
    #[inline]
    pub fn len(&self) -> usize {
        self.neighbours.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.neighbours.iter().map(|n| n.index)
    }
}

/// `K` after clamping to the reference size.
#[inline]
pub fn effective_k(k: usize, n_reference: usize) -> usize {
    k.min(n_reference)
}

#[inline]
fn rank_order(row: &[f64], a: usize, b: usize) -> Ordering {
    row[a].total_cmp(&row[b]).then(a.cmp(&b))
}

/// Indices of the `k` smallest values of `row`, ascending, lower index first on ties.
pub fn nearest_indices(row: &[f64], k: usize) -> Vec<usize> {
    let k = k.min(row.len());
    let mut idx: Vec<usize> = (0..row.len()).collect();
    if k == 0 {
        return Vec::new();
    }
    if k < idx.len() {
        idx.select_nth_unstable_by(k - 1, |&a, &b| rank_order(row, a, b));
        idx.truncate(k);
    }
    idx.sort_unstable_by(|&a, &b| rank_order(row, a, b));
    idx
}

/// Selects the `k` nearest references for every query row of `selection`,
/// reading the matching distances from `other`.
///
/// `k` larger than the number of references is clamped. Fails if `k == 0`,
/// if the two matrices share a metric, or if their shapes differ.
pub fn select_neighbours(
    selection: &DistanceMatrix,
    other: &DistanceMatrix,
    k: usize,
) -> Result<Vec<NeighbourSet>> {
    if k == 0 {
        return Err(NeighbourError::InvalidNeighbourCount(k));
    }
    if selection.metric == other.metric || selection.shape() != other.shape() {
        return Err(NeighbourError::ShapeMismatch {
            selection: selection.metric,
            selection_shape: selection.shape(),
            other: other.metric,
            other_shape: other.shape(),
        });
    }

    let (n_query, n_reference) = selection.shape();
    if n_query > 0 && n_reference == 0 {
        return Err(NeighbourError::EmptyReference(k));
    }
    let k_eff = effective_k(k, n_reference);
    if k_eff < k {
        warn!(
            "Requested {} neighbours but only {} reference items exist, clamping",
            k, n_reference
        );
    }
    debug!(
        "Selecting {} neighbours by {} for {} queries",
        k_eff, selection.metric, n_query
    );

    let metric = selection.metric;
    let sets: Vec<NeighbourSet> = (0..n_query)
        .into_par_iter()
        .map(|i| {
            let row = selection.row(i);
            let neighbours = nearest_indices(&row, k_eff)
                .into_iter()
                .map(|j| {
                    let (sel, oth) = (row[j], other.get(i, j));
                    match metric {
                        Metric::Vector => Neighbour {
                            index: j,
                            vector_distance: sel,
                            fingerprint_distance: oth,
                        },
                        Metric::Fingerprint => Neighbour {
                            index: j,
                            vector_distance: oth,
                            fingerprint_distance: sel,
                        },
                    }
                })
                .collect();
            NeighbourSet {
                query_index: i,
                metric,
                neighbours,
            }
        })
        .collect();
    Ok(sets)
}

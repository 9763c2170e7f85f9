//! Distance engine: dense query x reference matrices under both metrics.
//!
//! - `Metric::Fingerprint`: Jaccard distance over fingerprint active bits, in `[0, 1]`
//! - `Metric::Vector`: cosine distance over embeddings, in `[0, 2]`
//!
//! Reference-side quantities (vector norms, fingerprint popcounts) are computed
//! once per call; query rows are then filled in parallel with rayon. The
//! result is stored row-major in a smartcore `DenseMatrix<f64>`.
//!
//! ## Complexity
//! `O(|query| x |reference| x d)` per metric, which dominates the whole run.
//! Memory is `O(|query| x |reference|)` per matrix; see
//! `NeighbourSearch::with_query_block` to bound it.

use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::{Array, Array2};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::core::Item;
use crate::errors::{NeighbourError, Result};
use crate::operators::{cosine_distance_with_norms, jaccard_distance_with_counts, norm};

/// The two supported distance metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Cosine distance between learned embedding vectors.
    #[default]
    #[serde(alias = "vec")]
    Vector,
    /// Jaccard distance between structural fingerprints.
    #[serde(alias = "morgan")]
    Fingerprint,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Vector => "vector",
            Metric::Fingerprint => "fingerprint",
        }
    }

    /// The metric that is not `self`.
    pub fn other(&self) -> Metric {
        match self {
            Metric::Vector => Metric::Fingerprint,
            Metric::Fingerprint => Metric::Vector,
        }
    }

    /// Upper bound of the metric's range.
    pub fn max_distance(&self) -> f64 {
        match self {
            Metric::Vector => 2.0,
            Metric::Fingerprint => 1.0,
        }
    }
}

impl FromStr for Metric {
    type Err = NeighbourError;

    /// Accepts `vector`/`vec` and `fingerprint`/`morgan`, case-insensitive.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "vector" | "vec" => Ok(Metric::Vector),
            "fingerprint" | "morgan" => Ok(Metric::Fingerprint),
            _ => Err(NeighbourError::UnsupportedMetric(s.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dense (query x reference) distance matrix tagged with its metric.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    pub metric: Metric,
    pub matrix: DenseMatrix<f64>,
}

impl DistanceMatrix {
    fn from_rows(metric: Metric, rows: Vec<Vec<f64>>, ncols: usize) -> Self {
        let nrows = rows.len();
        let matrix =
            DenseMatrix::<f64>::from_iterator(rows.into_iter().flatten(), nrows, ncols, 0);
        Self { metric, matrix }
    }

    /// (number of query rows, number of reference columns)
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    /// Distance between query `i` and reference `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        *self.matrix.get((i, j))
    }

    /// Owned copy of query row `i`.
    pub fn row(&self, i: usize) -> Vec<f64> {
        let (_, ncols) = self.shape();
        (0..ncols).map(|j| self.get(i, j)).collect()
    }
}

/// Both distance matrices for one (query, reference) pair.
#[derive(Debug, Clone)]
pub struct Distances {
    pub fingerprint: DistanceMatrix,
    pub vector: DistanceMatrix,
}

impl Distances {
    pub fn get(&self, metric: Metric) -> &DistanceMatrix {
        match metric {
            Metric::Vector => &self.vector,
            Metric::Fingerprint => &self.fingerprint,
        }
    }

    /// `(selection matrix, other matrix)` for a selection metric.
    pub fn split(&self, selection: Metric) -> (&DistanceMatrix, &DistanceMatrix) {
        (self.get(selection), self.get(selection.other()))
    }
}

/// Computes pairwise distance matrices; every method is a pure function.
pub struct DistanceEngine;

impl DistanceEngine {
    /// Fails if query and reference disagree on fingerprint length or vector
    /// dimensionality. An empty side has nothing to disagree with.
    pub fn check_dimensions(query: &[Item], reference: &[Item]) -> Result<()> {
        let (Some(q), Some(r)) = (query.first(), reference.first()) else {
            return Ok(());
        };
        if q.fingerprint.len() != r.fingerprint.len() {
            return Err(NeighbourError::DimensionMismatch {
                representation: "fingerprint",
                query: q.fingerprint.len(),
                reference: r.fingerprint.len(),
            });
        }
        if q.vector.len() != r.vector.len() {
            return Err(NeighbourError::DimensionMismatch {
                representation: "vector",
                query: q.vector.len(),
                reference: r.vector.len(),
            });
        }
        Ok(())
    }

    /// Jaccard distances between every query and reference fingerprint.
    pub fn fingerprint_distances(query: &[Item], reference: &[Item]) -> Result<DistanceMatrix> {
        Self::check_dimensions(query, reference)?;
        debug!(
            "Jaccard distances: {} x {} fingerprints",
            query.len(),
            reference.len()
        );

        let ref_ones: Vec<u32> = reference
            .par_iter()
            .map(|r| r.fingerprint.count_ones())
            .collect();

        let rows: Vec<Vec<f64>> = query
            .par_iter()
            .map(|q| {
                let q_ones = q.fingerprint.count_ones();
                reference
                    .iter()
                    .zip(&ref_ones)
                    .map(|(r, &r_ones)| {
                        jaccard_distance_with_counts(&q.fingerprint, q_ones, &r.fingerprint, r_ones)
                    })
                    .collect()
            })
            .collect();

        Ok(DistanceMatrix::from_rows(Metric::Fingerprint, rows, reference.len()))
    }

    /// Cosine distances between every query and reference vector.
    pub fn vector_distances(query: &[Item], reference: &[Item]) -> Result<DistanceMatrix> {
        Self::check_dimensions(query, reference)?;
        debug!(
            "Cosine distances: {} x {} vectors",
            query.len(),
            reference.len()
        );

        let ref_norms: Vec<f64> = reference.par_iter().map(|r| norm(&r.vector)).collect();

        let rows: Vec<Vec<f64>> = query
            .par_iter()
            .map(|q| {
                let q_norm = norm(&q.vector);
                reference
                    .iter()
                    .zip(&ref_norms)
                    .map(|(r, &r_norm)| {
                        cosine_distance_with_norms(&q.vector, q_norm, &r.vector, r_norm)
                    })
                    .collect()
            })
            .collect();

        Ok(DistanceMatrix::from_rows(Metric::Vector, rows, reference.len()))
    }

    /// Both matrices; dimensions are checked once, before either is computed.
    pub fn compute(query: &[Item], reference: &[Item]) -> Result<Distances> {
        Self::check_dimensions(query, reference)?;
        info!(
            "Computing distances for {} queries against {} references",
            query.len(),
            reference.len()
        );
        let (fingerprint, vector) = rayon::join(
            || Self::fingerprint_distances(query, reference),
            || Self::vector_distances(query, reference),
        );
        Ok(Distances {
            fingerprint: fingerprint?,
            vector: vector?,
        })
    }
}

//! Pairwise distance kernels used by the distance engine.
//!
//! - Cosine distance `1 - u.v / (|u||v|)`, clamped into `[0, 2]`
//! - Jaccard distance over active-bit sets, computed with popcount on packed words
//!
//! Degenerate inputs have a fixed convention: a zero-norm vector on either
//! side gives cosine distance 1.0 (similarity 0), and two empty fingerprints
//! give Jaccard distance 1.0. Neither case ever produces NaN.

use crate::fingerprint::Fingerprint;

/// Computes the Euclidean norm (L2) without allocating.
#[inline]
pub fn norm(a: &[f64]) -> f64 {
    a.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

/// Dot product of two equally sized slices.
///
/// # Panics
///
/// Panics if the lengths differ.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "Dimension mismatch");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine distance when both norms are already known.
///
/// The distance engine precomputes reference norms once per run and calls
/// this in the inner loop.
#[inline]
pub fn cosine_distance_with_norms(a: &[f64], norm_a: f64, b: &[f64], norm_b: f64) -> f64 {
    let denom = norm_a * norm_b;
    if denom > 0.0 {
        (1.0 - dot(a, b) / denom).clamp(0.0, 2.0)
    } else {
        1.0
    }
}

/// Cosine distance `1 - cos(a, b)`.
///
/// # Examples
///
/// ```
/// use neighbourspace::operators::cosine_distance;
/// assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-12);
/// assert!(cosine_distance(&[1.0, 0.0], &[2.0, 0.0]).abs() < 1e-12);
/// assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-12);
/// ```
#[inline]
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    cosine_distance_with_norms(a, norm(a), b, norm(b))
}

/// Jaccard distance when the popcounts of both fingerprints are known.
#[inline]
pub fn jaccard_distance_with_counts(a: &Fingerprint, ones_a: u32, b: &Fingerprint, ones_b: u32) -> f64 {
    let intersection = a.intersection_count(b);
    let union = ones_a + ones_b - intersection;
    if union == 0 {
        1.0
    } else {
        1.0 - intersection as f64 / union as f64
    }
}

/// Jaccard distance `1 - |A & B| / |A | B|` over active bits.
///
/// # Examples
///
/// ```
/// use neighbourspace::fingerprint::Fingerprint;
/// use neighbourspace::operators::jaccard_distance;
///
/// let a = Fingerprint::from_dense(&[1.0, 0.0, 1.0, 0.0]);
/// let b = Fingerprint::from_dense(&[1.0, 0.0, 0.0, 0.0]);
/// assert!((jaccard_distance(&a, &b) - 0.5).abs() < 1e-12);
/// ```
#[inline]
pub fn jaccard_distance(a: &Fingerprint, b: &Fingerprint) -> f64 {
    jaccard_distance_with_counts(a, a.count_ones(), b, b.count_ones())
}

/// Arithmetic mean; `None` for an empty iterator.
#[inline]
pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0f64, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

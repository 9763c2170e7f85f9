//! Error type shared by every stage of the neighbour search.
//!
//! Configuration problems (bad metric name, zero neighbours, mismatched
//! dimensions, empty reference set) are all surfaced before any distance is
//! computed; I/O and CSV failures are wrapped so callers only handle one type.

use std::path::PathBuf;

use crate::distance::Metric;

/// Errors raised while building item sets, searching, or reading/writing files.
#[derive(Debug, thiserror::Error)]
pub enum NeighbourError {
    /// Selection metric name is not one of the supported metrics.
    #[error("distance measure \"{0}\" not supported (expected \"vector\" or \"fingerprint\")")]
    UnsupportedMetric(String),

    /// The number of neighbours must be at least one.
    #[error("number of neighbours must be positive, got {0}")]
    InvalidNeighbourCount(usize),

    /// The query block size must be at least one when set.
    #[error("query block size must be positive, got {0}")]
    InvalidBlockSize(usize),

    /// Model batches must hold at least one item.
    #[error("batch size must be positive, got {0}")]
    InvalidBatchSize(usize),

    /// Neighbours were requested but the reference set has no items.
    #[error("reference set is empty, cannot select {0} neighbours")]
    EmptyReference(usize),

    /// Query and reference representations disagree on inner dimensionality.
    #[error("{representation} dimension mismatch: query has {query}, reference has {reference}")]
    DimensionMismatch {
        representation: &'static str,
        query: usize,
        reference: usize,
    },

    /// Items inside one set disagree on a representation's length.
    #[error("{representation} of item {index} has length {got}, expected {expected}")]
    InconsistentItem {
        representation: &'static str,
        index: usize,
        expected: usize,
        got: usize,
    },

    /// An embedding component is NaN or infinite.
    #[error("vector of item {index} contains a non-finite value")]
    NonFiniteVector { index: usize },

    /// A query item has no score, or its score is NaN.
    #[error("query item {index} ({id}) has no usable score")]
    MissingScore { index: usize, id: String },

    /// Two distance matrices that must line up do not.
    #[error("distance matrices do not line up: {selection:?} {selection_shape:?} vs {other:?} {other_shape:?}")]
    ShapeMismatch {
        selection: Metric,
        selection_shape: (usize, usize),
        other: Metric,
        other_shape: (usize, usize),
    },

    /// The embedding model has no entry for an identifier.
    #[error("no representation available for item \"{0}\"")]
    UnknownItem(String),

    /// The embedding model returned a different number of predictions than requested.
    #[error("model returned {got} predictions for a batch of {expected}")]
    BatchSizeMismatch { expected: usize, got: usize },

    /// A value in an input table could not be parsed.
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, NeighbourError>;

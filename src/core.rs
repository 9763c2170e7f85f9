//! Item and ItemSet: the composite records the whole search runs over.
//!
//! Each [`Item`] carries everything known about one molecule (identifier,
//! fingerprint, embedding vector and, for query items, a score) so that no
//! stage ever has to keep parallel arrays in step. An [`ItemSet`] is an
//! ordered, validated `Vec<Item>`; position in the set is the index used by
//! distance matrices and neighbour sets.
//!
//! # Examples
//!
//! ```
//! use neighbourspace::core::{Item, ItemSet};
//! use neighbourspace::fingerprint::Fingerprint;
//!
//! let set = ItemSet::new(vec![
//!     Item::new("CCO", Fingerprint::from_dense(&[1.0, 0.0, 1.0]), vec![0.2, 0.8]),
//!     Item::new("CCN", Fingerprint::from_dense(&[1.0, 1.0, 0.0]), vec![0.9, 0.1]),
//! ]).unwrap();
//!
//! assert_eq!(set.len(), 2);
//! assert_eq!(set.vector_dim(), Some(2));
//! assert_eq!(set.fingerprint_len(), Some(3));
//! ```
//!
//! # Invariants
//!
//! - All fingerprints in a set have the same length.
//! - All vectors in a set have the same dimensionality and only finite values.

use std::collections::HashSet;

use log::{debug, info, trace};
use rayon::prelude::*;

use crate::errors::{NeighbourError, Result};
use crate::fingerprint::{Fingerprint, Fingerprinter};
use crate::model::EmbeddingModel;

/// One molecule with both representations and an optional model score.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub id: String,
    pub fingerprint: Fingerprint,
    pub vector: Vec<f64>,
    pub score: Option<f64>,
}

impl Item {
    #[inline]
    pub fn new(id: impl Into<String>, fingerprint: Fingerprint, vector: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            fingerprint,
            vector,
            score: None,
        }
    }

    /// Attaches a model score (query items need one).
    #[inline]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

/// Ordered, validated collection of items from one origin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemSet {
    items: Vec<Item>,
}

impl ItemSet {
    /// Validates and wraps `items`.
    ///
    /// Fails on ragged fingerprints or vectors, or on non-finite vector values.
    pub fn new(items: Vec<Item>) -> Result<Self> {
        if let Some(first) = items.first() {
            let fp_len = first.fingerprint.len();
            let dim = first.vector.len();
            for (index, item) in items.iter().enumerate() {
                if item.fingerprint.len() != fp_len {
                    return Err(NeighbourError::InconsistentItem {
                        representation: "fingerprint",
                        index,
                        expected: fp_len,
                        got: item.fingerprint.len(),
                    });
                }
                if item.vector.len() != dim {
                    return Err(NeighbourError::InconsistentItem {
                        representation: "vector",
                        index,
                        expected: dim,
                        got: item.vector.len(),
                    });
                }
                if item.vector.iter().any(|v| !v.is_finite()) {
                    return Err(NeighbourError::NonFiniteVector { index });
                }
            }
        }
        Ok(Self { items })
    }

    /// Builds a set from index-aligned columns.
    ///
    /// `scores`, when given, must line up with `ids` as well.
    pub fn from_columns(
        ids: Vec<String>,
        fingerprints: Vec<Fingerprint>,
        vectors: Vec<Vec<f64>>,
        scores: Option<Vec<f64>>,
    ) -> Result<Self> {
        let n = ids.len();
        let check = |representation: &'static str, got: usize| {
            if got == n {
                Ok(())
            } else {
                Err(NeighbourError::InconsistentItem {
                    representation,
                    index: got.min(n),
                    expected: n,
                    got,
                })
            }
        };
        check("fingerprint column", fingerprints.len())?;
        check("vector column", vectors.len())?;
        if let Some(s) = &scores {
            check("score column", s.len())?;
        }

        let mut scores = scores.map(|s| s.into_iter());
        let items = ids
            .into_iter()
            .zip(fingerprints)
            .zip(vectors)
            .map(|((id, fingerprint), vector)| Item {
                id,
                fingerprint,
                vector,
                score: scores.as_mut().and_then(|s| s.next()),
            })
            .collect();
        Self::new(items)
    }

    /// Runs the fingerprint extractor and the model over `ids`.
    ///
    /// Fingerprints are computed in parallel; the model is called in batches of
    /// `batch_size`, in order. Scores are requested only when `with_scores`.
    pub fn featurise<F, M>(
        ids: &[String],
        fingerprinter: &F,
        model: &M,
        batch_size: usize,
        with_scores: bool,
    ) -> Result<Self>
    where
        F: Fingerprinter + ?Sized,
        M: EmbeddingModel + ?Sized,
    {
        if batch_size == 0 {
            return Err(NeighbourError::InvalidBatchSize(batch_size));
        }
        info!(
            "Featurising {} items ({} fingerprint bits, batch size {})",
            ids.len(),
            fingerprinter.n_bits(),
            batch_size
        );

        let fingerprints: Vec<Fingerprint> =
            ids.par_iter().map(|id| fingerprinter.fingerprint(id)).collect();
        debug!("Computed {} fingerprints", fingerprints.len());

        let mut predictions = Vec::with_capacity(ids.len());
        for (b, batch) in ids.chunks(batch_size).enumerate() {
            trace!("Predicting batch {} ({} items)", b, batch.len());
            let preds = model.predict_batch(batch, with_scores)?;
            if preds.len() != batch.len() {
                return Err(NeighbourError::BatchSizeMismatch {
                    expected: batch.len(),
                    got: preds.len(),
                });
            }
            predictions.extend(preds);
        }

        let items = ids
            .iter()
            .zip(fingerprints)
            .zip(predictions)
            .map(|((id, fingerprint), p)| Item {
                id: id.clone(),
                fingerprint,
                vector: p.vector,
                score: p.score,
            })
            .collect();
        Self::new(items)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    /// # Panics
    ///
    /// Panics if `i >= len()`.
    #[inline]
    pub fn get(&self, i: usize) -> &Item {
        assert!(i < self.items.len(), "Item index out of bounds");
        &self.items[i]
    }

    /// Fingerprint length shared by every item, `None` when empty.
    pub fn fingerprint_len(&self) -> Option<usize> {
        self.items.first().map(|it| it.fingerprint.len())
    }

    /// Embedding dimensionality shared by every item, `None` when empty.
    pub fn vector_dim(&self) -> Option<usize> {
        self.items.first().map(|it| it.vector.len())
    }

    /// Identifiers as a set, for membership tests.
    pub fn id_set(&self) -> HashSet<&str> {
        self.items.iter().map(|it| it.id.as_str()).collect()
    }

    /// Returns the score of every item, failing on the first missing or NaN one.
    pub fn scores(&self) -> Result<Vec<f64>> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, it)| match it.score {
                Some(s) if !s.is_nan() => Ok(s),
                _ => Err(NeighbourError::MissingScore {
                    index,
                    id: it.id.clone(),
                }),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ItemSet {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

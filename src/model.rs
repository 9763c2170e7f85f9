//! The learned-model collaborator, seen only through its capabilities.
//!
//! The search never needs to know how a model is trained or evaluated: it
//! asks for an embedding vector and a scalar score per identifier. Anything
//! implementing [`EmbeddingModel`] can drive the pipeline, including
//! synthetic models in tests.

use std::collections::HashMap;

use log::debug;

use crate::errors::{NeighbourError, Result};

/// Embedding plus (optional) score for one identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub vector: Vec<f64>,
    pub score: Option<f64>,
}

/// Produces embeddings and prediction scores for item identifiers.
pub trait EmbeddingModel: Sync {
    /// Learned embedding vector for `id`.
    fn embed(&self, id: &str) -> Result<Vec<f64>>;

    /// Scalar prediction for `id`.
    fn score(&self, id: &str) -> Result<f64>;

    /// Predicts a batch; scores are only requested when `with_scores` is set.
    ///
    /// The default calls `embed`/`score` per id. Models that gain from
    /// batching (a network forward pass, a remote service) should override it.
    fn predict_batch(&self, ids: &[String], with_scores: bool) -> Result<Vec<Prediction>> {
        ids.iter()
            .map(|id| {
                let vector = self.embed(id)?;
                let score = if with_scores { Some(self.score(id)?) } else { None };
                Ok(Prediction { vector, score })
            })
            .collect()
    }
}

/// Model backed by a table of precomputed predictions.
///
/// Rows for reference-only items may omit the score.
#[derive(Clone, Debug, Default)]
pub struct PrecomputedModel {
    entries: HashMap<String, Prediction>,
    dim: Option<usize>,
}

impl PrecomputedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the prediction for `id`.
    ///
    /// Returns an error if the vector length differs from earlier entries.
    pub fn insert(&mut self, id: impl Into<String>, vector: Vec<f64>, score: Option<f64>) -> Result<()> {
        let id = id.into();
        match self.dim {
            Some(d) if d != vector.len() => {
                return Err(NeighbourError::InconsistentItem {
                    representation: "embedding",
                    index: self.entries.len(),
                    expected: d,
                    got: vector.len(),
                });
            }
            None => self.dim = Some(vector.len()),
            _ => {}
        }
        if self.entries.insert(id.clone(), Prediction { vector, score }).is_some() {
            debug!("Replacing precomputed prediction for {}", id);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding dimensionality, once at least one entry exists.
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    fn get(&self, id: &str) -> Result<&Prediction> {
        self.entries
            .get(id)
            .ok_or_else(|| NeighbourError::UnknownItem(id.to_string()))
    }
}

impl EmbeddingModel for PrecomputedModel {
    fn embed(&self, id: &str) -> Result<Vec<f64>> {
        Ok(self.get(id)?.vector.clone())
    }

    fn score(&self, id: &str) -> Result<f64> {
        self.get(id)?.score.ok_or_else(|| NeighbourError::MissingScore {
            index: 0,
            id: id.to_string(),
        })
    }
}

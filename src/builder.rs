use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::{Item, ItemSet};
use crate::distance::{DistanceEngine, Distances, Metric};
use crate::errors::{NeighbourError, Result};
use crate::neighbours::{effective_k, select_neighbours, NeighbourSet};
use crate::report::{sort_by_score, ReportBuilder, ReportRecord};

// Add logging
use log::{debug, info, trace};

/// Search configuration, loadable from JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Metric that decides which references count as nearest.
    pub metric: Metric,
    /// Neighbours kept per query (clamped to the reference size).
    pub num_neighbours: usize,
    /// Process the query set in blocks of this many rows to bound memory.
    pub query_block_size: Option<usize>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            metric: Metric::Vector,
            num_neighbours: 5,
            query_block_size: None,
        }
    }
}

pub struct NeighbourSearchBuilder {
    params: SearchParams,
}

impl Default for NeighbourSearchBuilder {
    fn default() -> Self {
        debug!("Creating NeighbourSearchBuilder with default parameters");
        Self {
            params: SearchParams::default(),
        }
    }
}

impl NeighbourSearchBuilder {
    pub fn new() -> Self {
        info!("Initializing new NeighbourSearchBuilder");
        Self::default()
    }

    /// Starts from an existing parameter set (e.g. a JSON config file).
    pub fn from_params(params: SearchParams) -> Self {
        debug!("NeighbourSearchBuilder from params: {:?}", params);
        Self { params }
    }

    /// Metric used to pick the nearest references; the other one is still reported.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        info!("Setting selection metric: {}", metric);
        self.params.metric = metric;
        self
    }

    pub fn with_neighbours(mut self, k: usize) -> Self {
        info!("Setting number of neighbours: {}", k);
        self.params.num_neighbours = k;
        self
    }

    /// `None` computes the full query x reference matrices in one go.
    pub fn with_query_block(mut self, block_size: Option<usize>) -> Self {
        info!("Setting query block size: {:?}", block_size);
        self.params.query_block_size = block_size;
        self
    }

    /// Validates the configuration.
    ///
    /// Fails on zero neighbours or a zero block size; nothing is computed here.
    pub fn build(self) -> Result<NeighbourSearch> {
        if self.params.num_neighbours == 0 {
            return Err(NeighbourError::InvalidNeighbourCount(0));
        }
        if let Some(0) = self.params.query_block_size {
            return Err(NeighbourError::InvalidBlockSize(0));
        }
        debug!("Search configuration: {:?}", self.params);
        Ok(NeighbourSearch {
            params: self.params,
        })
    }
}

/// A validated search, ready to run over any (query, reference) pair.
#[derive(Clone, Debug)]
pub struct NeighbourSearch {
    params: SearchParams,
}

impl NeighbourSearch {
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn metric(&self) -> Metric {
        self.params.metric
    }

    /// Neighbours per query once clamped to `reference`.
    pub fn effective_k(&self, reference: &ItemSet) -> usize {
        effective_k(self.params.num_neighbours, reference.len())
    }

    /// Every input check, run before any distance is computed.
    pub fn validate(&self, query: &ItemSet, reference: &ItemSet) -> Result<()> {
        if reference.is_empty() {
            return Err(NeighbourError::EmptyReference(self.params.num_neighbours));
        }
        DistanceEngine::check_dimensions(query.items(), reference.items())?;
        query.scores()?;
        Ok(())
    }

    /// Full distance matrices for the pair (no blocking).
    pub fn distances(&self, query: &ItemSet, reference: &ItemSet) -> Result<Distances> {
        DistanceEngine::compute(query.items(), reference.items())
    }

    /// Neighbour sets for the whole query set, block by block.
    pub fn neighbours(&self, query: &ItemSet, reference: &ItemSet) -> Result<Vec<NeighbourSet>> {
        if reference.is_empty() {
            return Err(NeighbourError::EmptyReference(self.params.num_neighbours));
        }
        let mut sets = Vec::with_capacity(query.len());
        self.for_each_block(query, reference, |offset, _, block_sets| {
            sets.extend(block_sets.into_iter().map(|mut s| {
                s.query_index += offset;
                s
            }));
            Ok(())
        })?;
        Ok(sets)
    }

    /// Runs distances, neighbour selection and report assembly.
    ///
    /// Returns one record per query item, sorted by score descending. An
    /// empty query set gives an empty report.
    pub fn run(
        &self,
        query: &ItemSet,
        reference: &ItemSet,
        labels: &HashSet<String>,
    ) -> Result<Vec<ReportRecord>> {
        info!(
            "Searching {} queries against {} references ({} neighbours by {})",
            query.len(),
            reference.len(),
            self.params.num_neighbours,
            self.params.metric
        );
        self.validate(query, reference)?;

        let report_builder = ReportBuilder::new(reference, labels);
        let mut records = Vec::with_capacity(query.len());
        self.for_each_block(query, reference, |offset, block, sets| {
            records.extend(report_builder.records(block, &sets, offset)?);
            Ok(())
        })?;

        sort_by_score(&mut records);

        let stats = {
            let n = records.len().max(1) as f64;
            let in_ref = records.iter().filter(|r| r.in_reference).count();
            let mean_vec = records.iter().map(|r| r.mean_vector_distance).sum::<f64>() / n;
            let mean_fp = records.iter().map(|r| r.mean_fingerprint_distance).sum::<f64>() / n;
            (in_ref, mean_vec, mean_fp)
        };
        debug!(
            "Report stats - in reference: {}, mean vec dist: {:.6}, mean fingerprint dist: {:.6}",
            stats.0, stats.1, stats.2
        );

        info!("Search completed with {} records", records.len());
        Ok(records)
    }

    fn for_each_block<F>(&self, query: &ItemSet, reference: &ItemSet, mut f: F) -> Result<()>
    where
        F: FnMut(usize, &[Item], Vec<NeighbourSet>) -> Result<()>,
    {
        if query.is_empty() {
            return Ok(());
        }
        let block_size = self.params.query_block_size.unwrap_or(query.len());
        let n_blocks = query.len().div_ceil(block_size);
        if n_blocks > 1 {
            info!("Processing queries in {} blocks of {}", n_blocks, block_size);
        }

        for (b, block) in query.items().chunks(block_size).enumerate() {
            let offset = b * block_size;
            trace!("Block {}: queries {}..{}", b, offset, offset + block.len());
            let distances = DistanceEngine::compute(block, reference.items())?;
            let (selection, other) = distances.split(self.params.metric);
            let sets = select_neighbours(selection, other, self.params.num_neighbours)?;
            f(offset, block, sets)?;
        }
        Ok(())
    }
}

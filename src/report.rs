//! Report records: one row per query, ordered by model score.
//!
//! A record holds the query identity, whether the query itself appears in the
//! reference set, its score, the mean neighbour distance under each metric,
//! and the neighbours in selection-rank order. The report is sorted by score
//! descending with a stable sort, so equal scores keep query-set order.
//!
//! Flattened, a record is a fixed-width row whose schema depends only on K:
//!
//! ```text
//! query_id, in_reference, score,
//! reference_{K}_avg_vec_cosine_dist, reference_{K}_avg_fingerprint_jaccard_dist,
//! reference_id_1, reference_is_labeled_1, reference_vec_cosine_dist_1, reference_fingerprint_jaccard_dist_1,
//! ...
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;

use log::debug;

use crate::core::{Item, ItemSet};
use crate::errors::{NeighbourError, Result};
use crate::neighbours::NeighbourSet;
use crate::operators::mean;

/// A neighbour as it appears in the report.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighbourDetail {
    pub id: String,
    /// Whether the neighbour is in the reference label set.
    pub is_labeled: bool,
    pub vector_distance: f64,
    pub fingerprint_distance: f64,
}

/// One query's line in the report.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportRecord {
    /// Position of the query in its input set.
    pub query_index: usize,
    pub id: String,
    pub in_reference: bool,
    pub score: f64,
    pub mean_vector_distance: f64,
    pub mean_fingerprint_distance: f64,
    pub neighbours: Vec<NeighbourDetail>,
}

impl ReportRecord {
    /// Values in `report_header` order.
    pub fn to_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(row_width(self.neighbours.len()));
        row.push(self.id.clone());
        row.push(self.in_reference.to_string());
        row.push(self.score.to_string());
        row.push(self.mean_vector_distance.to_string());
        row.push(self.mean_fingerprint_distance.to_string());
        for n in &self.neighbours {
            row.push(n.id.clone());
            row.push(n.is_labeled.to_string());
            row.push(n.vector_distance.to_string());
            row.push(n.fingerprint_distance.to_string());
        }
        row
    }
}

/// Number of columns for `k` neighbours.
#[inline]
pub fn row_width(k: usize) -> usize {
    5 + 4 * k
}

/// Column names for a report with `k` neighbours per query.
pub fn report_header(k: usize) -> Vec<String> {
    let mut header = Vec::with_capacity(row_width(k));
    header.push("query_id".to_string());
    header.push("in_reference".to_string());
    header.push("score".to_string());
    header.push(format!("reference_{}_avg_vec_cosine_dist", k));
    header.push(format!("reference_{}_avg_fingerprint_jaccard_dist", k));
    for n in 1..=k {
        header.push(format!("reference_id_{}", n));
        header.push(format!("reference_is_labeled_{}", n));
        header.push(format!("reference_vec_cosine_dist_{}", n));
        header.push(format!("reference_fingerprint_jaccard_dist_{}", n));
    }
    header
}

/// Sorts by score descending; equal scores keep their relative order.
pub fn sort_by_score(records: &mut [ReportRecord]) {
    records.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// Turns neighbour sets into report records against a fixed reference set.
pub struct ReportBuilder<'a> {
    reference: &'a [Item],
    reference_ids: HashSet<&'a str>,
    labels: &'a HashSet<String>,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(reference: &'a ItemSet, labels: &'a HashSet<String>) -> Self {
        Self {
            reference: reference.items(),
            reference_ids: reference.id_set(),
            labels,
        }
    }

    /// Records in query order, unsorted.
    ///
    /// `sets[i]` must describe `query[i]`; `query_offset` is added to each
    /// record's `query_index` when `query` is a block of a larger set.
    pub fn records(
        &self,
        query: &[Item],
        sets: &[NeighbourSet],
        query_offset: usize,
    ) -> Result<Vec<ReportRecord>> {
        if query.len() != sets.len() {
            return Err(NeighbourError::InconsistentItem {
                representation: "neighbour sets",
                index: query_offset,
                expected: query.len(),
                got: sets.len(),
            });
        }

        query
            .iter()
            .zip(sets)
            .enumerate()
            .map(|(i, (item, set))| {
                let query_index = query_offset + i;
                let score = match item.score {
                    Some(s) if !s.is_nan() => s,
                    _ => {
                        return Err(NeighbourError::MissingScore {
                            index: query_index,
                            id: item.id.clone(),
                        })
                    }
                };
                let mean_vector_distance = mean(set.neighbours.iter().map(|n| n.vector_distance))
                    .ok_or(NeighbourError::InvalidNeighbourCount(0))?;
                let mean_fingerprint_distance =
                    mean(set.neighbours.iter().map(|n| n.fingerprint_distance))
                        .ok_or(NeighbourError::InvalidNeighbourCount(0))?;

                let neighbours = set
                    .neighbours
                    .iter()
                    .map(|n| {
                        let id = &self.reference[n.index].id;
                        NeighbourDetail {
                            id: id.clone(),
                            is_labeled: self.labels.contains(id),
                            vector_distance: n.vector_distance,
                            fingerprint_distance: n.fingerprint_distance,
                        }
                    })
                    .collect();

                Ok(ReportRecord {
                    query_index,
                    id: item.id.clone(),
                    in_reference: self.reference_ids.contains(item.id.as_str()),
                    score,
                    mean_vector_distance,
                    mean_fingerprint_distance,
                    neighbours,
                })
            })
            .collect()
    }

    /// Records for the whole query set, sorted by score descending.
    pub fn build(&self, query: &[Item], sets: &[NeighbourSet]) -> Result<Vec<ReportRecord>> {
        let mut records = self.records(query, sets, 0)?;
        sort_by_score(&mut records);
        debug!("Report built with {} records", records.len());
        Ok(records)
    }
}

/// One-shot form of [`ReportBuilder::build`].
pub fn build_report(
    query: &ItemSet,
    reference: &ItemSet,
    labels: &HashSet<String>,
    sets: &[NeighbourSet],
) -> Result<Vec<ReportRecord>> {
    ReportBuilder::new(reference, labels).build(query.items(), sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_width_matches_k() {
        for k in [1, 2, 5] {
            let h = report_header(k);
            assert_eq!(h.len(), row_width(k));
            assert_eq!(h[3], format!("reference_{}_avg_vec_cosine_dist", k));
            assert_eq!(h.last().unwrap(), &format!("reference_fingerprint_jaccard_dist_{}", k));
        }
    }

    #[test]
    fn sort_is_stable_for_equal_scores() {
        let rec = |i: usize, score: f64| ReportRecord {
            query_index: i,
            id: format!("q{}", i),
            in_reference: false,
            score,
            mean_vector_distance: 0.0,
            mean_fingerprint_distance: 0.0,
            neighbours: vec![],
        };
        let mut records = vec![rec(0, 0.1), rec(1, 0.5), rec(2, 0.1), rec(3, 0.5), rec(4, -0.0), rec(5, 0.0)];
        sort_by_score(&mut records);
        let order: Vec<usize> = records.iter().map(|r| r.query_index).collect();
        assert_eq!(order, vec![1, 3, 0, 2, 4, 5]);
    }
}

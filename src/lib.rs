//! Nearest-neighbour ranking of scored query items against a reference set.
//!
//! Each item carries a structural fingerprint and a learned embedding. For
//! every query the crate finds the K nearest reference items under a chosen
//! metric (Jaccard over fingerprints or cosine over embeddings), reports
//! both distances for each neighbour, and orders the queries by model score.
//! The question it answers: are high-scoring queries close to known
//! positives in the reference set, or is the model extrapolating?
//!
//! ```
//! use std::collections::HashSet;
//! use neighbourspace::builder::NeighbourSearchBuilder;
//! use neighbourspace::core::{Item, ItemSet};
//! use neighbourspace::distance::Metric;
//! use neighbourspace::fingerprint::Fingerprint;
//!
//! let query = ItemSet::new(vec![
//!     Item::new("A", Fingerprint::from_dense(&[1., 0., 1., 0.]), vec![1.0, 0.0]).with_score(0.9),
//! ]).unwrap();
//! let reference = ItemSet::new(vec![
//!     Item::new("B", Fingerprint::from_dense(&[1., 0., 0., 0.]), vec![1.0, 0.0]),
//!     Item::new("C", Fingerprint::from_dense(&[0., 1., 0., 1.]), vec![0.0, 1.0]),
//! ]).unwrap();
//! let labels: HashSet<String> = ["B".to_string()].into_iter().collect();
//!
//! let search = NeighbourSearchBuilder::new()
//!     .with_metric(Metric::Vector)
//!     .with_neighbours(2)
//!     .build()
//!     .unwrap();
//! let report = search.run(&query, &reference, &labels).unwrap();
//!
//! assert_eq!(report[0].neighbours[0].id, "B");
//! assert!(report[0].neighbours[0].is_labeled);
//! ```

pub mod builder;
pub mod core;
pub mod distance;
pub mod errors;
pub mod fingerprint;
pub mod io;
pub mod model;
pub mod neighbours;
pub mod operators;
pub mod report;

pub use errors::{NeighbourError, Result};

#[cfg(test)]
mod tests;

use approx::assert_relative_eq;

use crate::core::{Item, ItemSet};
use crate::distance::{DistanceEngine, Metric};
use crate::errors::NeighbourError;
use crate::fingerprint::Fingerprint;
use crate::neighbours::select_neighbours;
use crate::report::{build_report, report_header, row_width, ReportBuilder};
use crate::tests::test_data::{labels, random_items, scenario_a};

#[test]
fn test_scenario_a_report() {
    let (query, reference, labels) = scenario_a();
    let d = DistanceEngine::compute(query.items(), reference.items()).unwrap();
    let (sel, other) = d.split(Metric::Vector);
    let sets = select_neighbours(sel, other, 2).unwrap();
    let report = build_report(&query, &reference, &labels, &sets).unwrap();

    assert_eq!(report.len(), 1);
    let r = &report[0];
    assert_eq!(r.id, "A");
    assert!(!r.in_reference);
    assert_eq!(r.score, 0.9);
    let ids: Vec<&str> = r.neighbours.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["B", "C"]);
    assert!(r.neighbours[0].is_labeled);
    assert!(!r.neighbours[1].is_labeled);
    assert_relative_eq!(r.mean_vector_distance, 0.5, epsilon = 1e-12);
    assert_relative_eq!(r.mean_fingerprint_distance, 0.75, epsilon = 1e-12);
}

#[test]
fn test_query_in_reference_regardless_of_distance() {
    let (_, reference, labels) = scenario_a();
    // Same id as reference C but a representation nothing like it
    let query = ItemSet::new(vec![
        Item::new("C", Fingerprint::from_dense(&[1., 0., 0., 0.]), vec![1.0, 0.0]).with_score(0.4),
        Item::new("D", Fingerprint::from_dense(&[0., 1., 0., 1.]), vec![0.0, 1.0]).with_score(0.3),
    ])
    .unwrap();
    let d = DistanceEngine::compute(query.items(), reference.items()).unwrap();
    let (sel, other) = d.split(Metric::Vector);
    let sets = select_neighbours(sel, other, 1).unwrap();
    let report = build_report(&query, &reference, &labels, &sets).unwrap();

    assert!(report[0].in_reference);
    assert_eq!(report[0].neighbours[0].id, "B");
    assert!(!report[1].in_reference);
}

#[test]
fn test_equal_scores_keep_input_order() {
    let reference = random_items(51, 5, 16, 3, "r", false);
    let base = random_items(52, 6, 16, 3, "q", false);
    let scores = [0.2, 0.7, 0.2, 0.7, 0.5, 0.2];
    let query = ItemSet::new(
        base.iter()
            .zip(scores)
            .map(|(it, s)| it.clone().with_score(s))
            .collect(),
    )
    .unwrap();

    let d = DistanceEngine::compute(query.items(), reference.items()).unwrap();
    let (sel, other) = d.split(Metric::Fingerprint);
    let sets = select_neighbours(sel, other, 2).unwrap();
    let report = build_report(&query, &reference, &labels(&[]), &sets).unwrap();

    let order: Vec<usize> = report.iter().map(|r| r.query_index).collect();
    assert_eq!(order, vec![1, 3, 4, 0, 2, 5]);
}

#[test]
fn test_means_match_neighbour_distances() {
    let query = random_items(61, 12, 40, 6, "q", true);
    let reference = random_items(62, 25, 40, 6, "r", false);
    let d = DistanceEngine::compute(query.items(), reference.items()).unwrap();
    let (sel, other) = d.split(Metric::Vector);
    let sets = select_neighbours(sel, other, 5).unwrap();
    let report = build_report(&query, &reference, &labels(&[]), &sets).unwrap();

    assert_eq!(report.len(), query.len());
    for r in &report {
        let set = &sets[r.query_index];
        let expect_vec: f64 = set
            .indices()
            .map(|j| d.vector.get(r.query_index, j))
            .sum::<f64>()
            / set.len() as f64;
        let expect_fp: f64 = set
            .indices()
            .map(|j| d.fingerprint.get(r.query_index, j))
            .sum::<f64>()
            / set.len() as f64;
        assert_relative_eq!(r.mean_vector_distance, expect_vec, epsilon = 1e-12);
        assert_relative_eq!(r.mean_fingerprint_distance, expect_fp, epsilon = 1e-12);
    }
    for w in report.windows(2) {
        assert!(w[0].score >= w[1].score);
    }
}

#[test]
fn test_missing_score_is_an_error() {
    let (_, reference, labels) = scenario_a();
    let query = ItemSet::new(vec![
        Item::new("X", Fingerprint::from_dense(&[1., 0., 0., 0.]), vec![1.0, 0.0]).with_score(0.1),
        Item::new("Y", Fingerprint::from_dense(&[1., 0., 0., 0.]), vec![1.0, 0.0]),
    ])
    .unwrap();
    let d = DistanceEngine::compute(query.items(), reference.items()).unwrap();
    let (sel, other) = d.split(Metric::Vector);
    let sets = select_neighbours(sel, other, 1).unwrap();

    let err = build_report(&query, &reference, &labels, &sets).unwrap_err();
    assert!(matches!(err, NeighbourError::MissingScore { index: 1, ref id } if id == "Y"));
}

#[test]
fn test_rows_match_header_width() {
    let query = random_items(71, 4, 16, 3, "q", true);
    let reference = random_items(72, 9, 16, 3, "r", false);
    let d = DistanceEngine::compute(query.items(), reference.items()).unwrap();
    let (sel, other) = d.split(Metric::Vector);

    for k in [1, 3, 9] {
        let sets = select_neighbours(sel, other, k).unwrap();
        let report = ReportBuilder::new(&reference, &labels(&["r0"]))
            .build(query.items(), &sets)
            .unwrap();
        let header = report_header(k);
        assert_eq!(header.len(), row_width(k));
        for r in &report {
            let row = r.to_row();
            assert_eq!(row.len(), header.len());
            assert_eq!(row[0], r.id);
        }
    }
}

#[test]
fn test_block_offsets_carry_into_records() {
    let query = random_items(81, 6, 16, 3, "q", true);
    let reference = random_items(82, 4, 16, 3, "r", false);
    let tail = &query.items()[4..];
    let d = DistanceEngine::compute(tail, reference.items()).unwrap();
    let (sel, other) = d.split(Metric::Vector);
    let sets = select_neighbours(sel, other, 2).unwrap();

    let records = ReportBuilder::new(&reference, &labels(&[]))
        .records(tail, &sets, 4)
        .unwrap();
    assert_eq!(records[0].query_index, 4);
    assert_eq!(records[1].query_index, 5);
    assert_eq!(records[1].id, "q5");
}

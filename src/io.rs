//! Delimited-text input and output.
//!
//! Input tables are CSV with a header row. Identifier files keep the
//! identifier in the first column and ignore the rest (target columns and
//! the like). Embedding tables are `id,score,v0,v1,...` with an optional
//! empty score for reference-only rows. The report is written with the
//! header from [`report_header`].

use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::{debug, info};

use crate::errors::{NeighbourError, Result};
use crate::model::PrecomputedModel;
use crate::report::{report_header, ReportRecord};

fn reader(path: &Path) -> Result<csv::Reader<File>> {
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?)
}

/// Identifiers from the first column, in file order; blank cells are skipped.
pub fn read_identifiers(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut ids = Vec::new();
    for record in reader(path)?.records() {
        let record = record?;
        match record.get(0) {
            Some(id) if !id.is_empty() => ids.push(id.to_string()),
            _ => continue,
        }
    }
    info!("Read {} identifiers from {}", ids.len(), path.display());
    Ok(ids)
}

/// First-column identifiers as a set (reference labels).
pub fn read_labels(path: impl AsRef<Path>) -> Result<HashSet<String>> {
    let labels: HashSet<String> = read_identifiers(path)?.into_iter().collect();
    debug!("{} distinct labels", labels.len());
    Ok(labels)
}

/// Loads an `id,score,v0,v1,...` table into a [`PrecomputedModel`].
pub fn read_embeddings(path: impl AsRef<Path>) -> Result<PrecomputedModel> {
    let path = path.as_ref();
    let mut model = PrecomputedModel::new();

    for record in reader(path)?.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let parse_err = |message: String| NeighbourError::Parse {
            path: path.to_path_buf(),
            line,
            message,
        };

        let id = match record.get(0) {
            Some(id) if !id.is_empty() => id,
            _ => continue,
        };
        let score = match record.get(1) {
            None | Some("") => None,
            Some(s) => Some(
                s.parse::<f64>()
                    .map_err(|e| parse_err(format!("score \"{}\": {}", s, e)))?,
            ),
        };
        let vector = record
            .iter()
            .skip(2)
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|e| parse_err(format!("vector value \"{}\": {}", v, e)))
            })
            .collect::<Result<Vec<f64>>>()?;
        if vector.is_empty() {
            return Err(parse_err(format!("no vector values for \"{}\"", id)));
        }

        model
            .insert(id, vector, score)
            .map_err(|e| parse_err(e.to_string()))?;
    }

    info!(
        "Loaded {} precomputed embeddings (dim {:?}) from {}",
        model.len(),
        model.dim(),
        path.display()
    );
    Ok(model)
}

/// Writes the report as CSV; the header is written even when `report` is empty.
pub fn write_report<W: Write>(writer: W, report: &[ReportRecord], k: usize) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(report_header(k))?;
    for record in report {
        wtr.write_record(record.to_row())?;
    }
    wtr.flush()?;
    Ok(())
}

/// [`write_report`] to a new file at `path`.
pub fn write_report_file(path: impl AsRef<Path>, report: &[ReportRecord], k: usize) -> Result<()> {
    let path = path.as_ref();
    write_report(File::create(path)?, report, k)?;
    info!("Saved {} records to {}", report.len(), path.display());
    Ok(())
}

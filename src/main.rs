use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use neighbourspace::builder::{NeighbourSearchBuilder, SearchParams};
use neighbourspace::core::ItemSet;
use neighbourspace::distance::Metric;
use neighbourspace::fingerprint::HashedNgramFingerprinter;
use neighbourspace::io::{read_embeddings, read_identifiers, read_labels, write_report_file};

/// Find the nearest reference items to each scored query, under a fingerprint
/// or an embedding metric, and report both distances per neighbour.
#[derive(Parser, Debug)]
#[command(name = "find-similar-preds", version)]
struct Args {
    /// CSV of query identifiers (first column), with a header row
    #[arg(long)]
    query_path: PathBuf,
    /// CSV of reference identifiers (first column), with a header row
    #[arg(long)]
    reference_path: PathBuf,
    /// CSV of labelled reference identifiers (first column)
    #[arg(long)]
    labels_path: PathBuf,
    /// CSV of precomputed predictions: id,score,v0,v1,...
    #[arg(long)]
    embeddings_path: PathBuf,
    /// Where to write the report CSV
    #[arg(long)]
    save_path: PathBuf,
    /// Search configuration (JSON); explicit flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,
    /// Selection metric: vector (vec) or fingerprint (morgan)
    #[arg(long)]
    metric: Option<String>,
    /// Neighbours per query
    #[arg(long)]
    num_neighbours: Option<usize>,
    /// Process queries in blocks of this many rows
    #[arg(long)]
    query_block_size: Option<usize>,
    /// Identifiers per model call
    #[arg(long, default_value_t = 50)]
    batch_size: usize,
    /// Fingerprint length in bits
    #[arg(long, default_value_t = 2048)]
    fingerprint_bits: usize,
    /// Longest character n-gram hashed into the fingerprint
    #[arg(long, default_value_t = 3)]
    fingerprint_max_ngram: usize,
}

impl Args {
    fn search_params(&self) -> anyhow::Result<SearchParams> {
        let mut params = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str::<SearchParams>(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => SearchParams::default(),
        };
        if let Some(m) = &self.metric {
            params.metric = m.parse::<Metric>()?;
        }
        if let Some(k) = self.num_neighbours {
            params.num_neighbours = k;
        }
        if self.query_block_size.is_some() {
            params.query_block_size = self.query_block_size;
        }
        Ok(params)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let search = NeighbourSearchBuilder::from_params(args.search_params()?)
        .build()
        .context("invalid search configuration")?;
    anyhow::ensure!(args.batch_size > 0, "--batch-size must be positive");
    anyhow::ensure!(
        args.fingerprint_bits > 0 && args.fingerprint_max_ngram > 0,
        "fingerprint bits and n-gram length must be positive"
    );
    let fingerprinter =
        HashedNgramFingerprinter::new(args.fingerprint_bits, args.fingerprint_max_ngram);

    let query_ids = read_identifiers(&args.query_path)
        .with_context(|| format!("reading queries from {}", args.query_path.display()))?;
    let reference_ids = read_identifiers(&args.reference_path)
        .with_context(|| format!("reading references from {}", args.reference_path.display()))?;
    let labels = read_labels(&args.labels_path)
        .with_context(|| format!("reading labels from {}", args.labels_path.display()))?;
    let model = read_embeddings(&args.embeddings_path)
        .with_context(|| format!("reading embeddings from {}", args.embeddings_path.display()))?;

    info!("Featurising reference set");
    let reference = ItemSet::featurise(&reference_ids, &fingerprinter, &model, args.batch_size, false)
        .context("featurising reference set")?;
    info!("Featurising query set");
    let query = ItemSet::featurise(&query_ids, &fingerprinter, &model, args.batch_size, true)
        .context("featurising query set")?;

    let report = search.run(&query, &reference, &labels)?;

    write_report_file(&args.save_path, &report, search.effective_k(&reference))
        .with_context(|| format!("writing report to {}", args.save_path.display()))?;
    Ok(())
}

//! Command-line entry point: cluster a file of strings by similarity.
//!
//! ```bash
//! # Cluster the strings in foods.txt with the defaults
//! # (levenshtein + affinity propagation):
//! strclump --input foods.txt
//!
//! # N-gram cosine distance with DBSCAN, artifacts into ./out:
//! strclump --input foods.txt --metric cosine --algorithm dbscan --output-dir out
//! ```

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use strclump::{Error, RunConfig, DEFAULT_MAX_TOKENS, DEFAULT_NGRAM_SIZE};

/// Cluster short strings by pairwise similarity.
#[derive(Parser, Debug)]
#[command(name = "strclump")]
#[command(about = "Compare strings with different distance metrics and cluster them \
                   according to the pairwise distances between them")]
struct Args {
    /// Input file containing the strings to cluster, one per line.
    #[arg(short, long)]
    input: PathBuf,

    /// Directory receiving the cluster and distance-matrix artifacts.
    #[arg(short, long, default_value = "strclump-output")]
    output_dir: PathBuf,

    /// Distance metric (levenshtein | damerau | jaro | winkler | jaccard | cosine).
    #[arg(short = 'd', long, default_value = "levenshtein")]
    metric: String,

    /// Clustering algorithm (affinity-propagation | dbscan | hdbscan | mean-shift).
    #[arg(short = 'c', long, default_value = "affinity-propagation")]
    algorithm: String,

    /// n-gram length used by the jaccard and cosine metrics.
    #[arg(long, default_value_t = DEFAULT_NGRAM_SIZE)]
    ngram_size: usize,

    /// Maximum token-set size before the run fails fast.
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    max_tokens: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    // Validate the configuration before reading any input.
    let mut config = RunConfig::new(
        args.metric.parse()?,
        args.algorithm.parse()?,
        args.output_dir,
    );
    config.ngram_size = args.ngram_size;
    config.max_tokens = args.max_tokens;

    let raw = fs::read_to_string(&args.input).map_err(|source| Error::Io {
        path: args.input.clone(),
        source,
    })?;
    let lines: Vec<String> = raw.lines().map(str::to_owned).collect();

    let clusters = strclump::run(&lines, &config)?;
    info!(clusters = clusters.len(), "run complete");
    Ok(())
}

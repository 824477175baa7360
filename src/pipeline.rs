//! One-shot batch pipeline: normalize → distances → cluster → write.
//!
//! The pipeline is single-threaded and strictly sequential at the stage
//! level; no stage begins before the previous stage's output is fully
//! materialized. (The distance engine parallelizes its own matrix fill
//! internally, which is the only safe parallelization point.) Configuration
//! is validated up front so no distance work happens on a bad config, and
//! nothing here retries on failure.

use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::cluster::{cluster, Algorithm, ClusterMap};
use crate::distance::{DistanceEngine, Metric, DEFAULT_NGRAM_SIZE};
use crate::error::{Error, Result};
use crate::normalize::normalize_tokens;
use crate::output::OutputWriter;

/// Default cap on the token-set size.
///
/// The matrix is dense, so memory grows with N²; past this the run fails
/// fast instead of attempting the allocation.
pub const DEFAULT_MAX_TOKENS: usize = 10_000;

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Pairwise metric for the distance matrix.
    pub metric: Metric,
    /// Clustering strategy.
    pub algorithm: Algorithm,
    /// n-gram length for the Jaccard/Cosine metrics.
    pub ngram_size: usize,
    /// Maximum token-set size before failing fast.
    pub max_tokens: usize,
    /// Directory receiving the two output artifacts.
    pub output_dir: PathBuf,
}

impl RunConfig {
    /// A config with the default knobs for `metric` and `algorithm`.
    pub fn new(metric: Metric, algorithm: Algorithm, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            metric,
            algorithm,
            ngram_size: DEFAULT_NGRAM_SIZE,
            max_tokens: DEFAULT_MAX_TOKENS,
            output_dir: output_dir.into(),
        }
    }
}

fn execute(raw: &[String], config: &RunConfig) -> Result<(crate::matrix::DistanceMatrix, ClusterMap)> {
    // Engine construction validates ngram_size before any work happens.
    let engine = DistanceEngine::new(config.metric, config.ngram_size)?;

    let start = Instant::now();
    let tokens = normalize_tokens(raw);
    if tokens.is_empty() {
        return Err(Error::EmptyInput);
    }
    if tokens.len() > config.max_tokens {
        return Err(Error::TooManyTokens {
            n: tokens.len(),
            max: config.max_tokens,
        });
    }
    info!(
        raw = raw.len(),
        tokens = tokens.len(),
        elapsed = ?start.elapsed(),
        "normalized input"
    );

    let start = Instant::now();
    let matrix = engine.get_distances(&tokens)?;
    info!(
        metric = %config.metric,
        n = matrix.len(),
        elapsed = ?start.elapsed(),
        "built distance matrix"
    );

    let start = Instant::now();
    let clusters = cluster(&matrix, config.algorithm)?;
    info!(
        algorithm = %config.algorithm,
        clusters = clusters.len(),
        elapsed = ?start.elapsed(),
        "clustered tokens"
    );

    Ok((matrix, clusters))
}

/// Normalize and cluster `raw` without touching the filesystem.
///
/// This is the library entry point; [`run`] adds the artifact writes.
pub fn cluster_strings(raw: &[String], config: &RunConfig) -> Result<ClusterMap> {
    execute(raw, config).map(|(_, clusters)| clusters)
}

/// Run the full pipeline and write both artifacts.
///
/// Returns the cluster map after writing `clusters_<algorithm>.json` and
/// `distances_<metric>.csv` into the configured output directory.
pub fn run(raw: &[String], config: &RunConfig) -> Result<ClusterMap> {
    let (matrix, clusters) = execute(raw, config)?;

    let writer = OutputWriter::new(&config.output_dir)?;
    let clusters_path = writer.write_clusters(&clusters, config.algorithm)?;
    let distances_path = writer.write_distances(&matrix)?;
    info!(
        clusters = %clusters_path.display(),
        distances = %distances_path.display(),
        "wrote artifacts"
    );

    Ok(clusters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn empty_after_normalization_is_fatal() {
        let config = RunConfig::new(Metric::Levenshtein, Algorithm::Dbscan, "unused");
        let result = cluster_strings(&raw(&["???", "---", "  "]), &config);
        assert!(matches!(result, Err(Error::EmptyInput)));
    }

    #[test]
    fn token_cap_fails_fast() {
        let mut config = RunConfig::new(Metric::Levenshtein, Algorithm::Dbscan, "unused");
        config.max_tokens = 2;
        let result = cluster_strings(&raw(&["cat", "dog", "bird"]), &config);
        assert!(matches!(result, Err(Error::TooManyTokens { n: 3, max: 2 })));
    }

    #[test]
    fn bad_ngram_size_rejected_before_any_work() {
        let mut config = RunConfig::new(Metric::Jaccard, Algorithm::Dbscan, "unused");
        config.ngram_size = 0;
        assert!(cluster_strings(&raw(&["cat"]), &config).is_err());
    }

    #[test]
    fn duplicate_raw_forms_collapse() {
        let config = RunConfig::new(Metric::Levenshtein, Algorithm::MeanShift, "unused");
        let clusters = cluster_strings(&raw(&["Cat", "cat", "CAT"]), &config).unwrap();
        assert_eq!(clusters.member_count(), 1);
    }
}

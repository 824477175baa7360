use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the clustering pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// No tokens survived normalization.
    #[error("empty input: no tokens left after normalization")]
    EmptyInput,

    /// Unrecognized distance metric name.
    #[error("unknown distance metric '{name}'; supported metrics are: levenshtein, damerau, jaro, winkler, jaccard, cosine")]
    InvalidMetric {
        /// The rejected metric name.
        name: String,
    },

    /// Unrecognized clustering algorithm name.
    #[error("unknown clustering algorithm '{name}'; supported algorithms are: affinity-propagation, dbscan, hdbscan, mean-shift")]
    InvalidAlgorithm {
        /// The rejected algorithm name.
        name: String,
    },

    /// Affinity propagation failed to stabilize its exemplar set.
    #[error("affinity propagation did not converge within {iterations} iterations")]
    NonConvergence {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// Token set exceeds the configured size cap for the dense matrix.
    #[error("token set has {n} entries, exceeding the configured maximum of {max}")]
    TooManyTokens {
        /// Number of tokens after normalization.
        n: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Reading or writing an artifact failed.
    #[error("i/o failure on {path}: {source}")]
    Io {
        /// The offending path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;

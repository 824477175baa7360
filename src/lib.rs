//! Similarity clustering for short strings.
//!
//! `strclump` groups a finite collection of short strings (terms, labels,
//! names) into clusters of mutually similar strings. The pipeline is a
//! one-shot batch:
//!
//! 1. [`normalize::normalize_tokens`] canonicalizes raw strings and
//!    deduplicates them.
//! 2. [`distance::DistanceEngine`] builds a dense pairwise
//!    [`matrix::DistanceMatrix`] for one of six metrics (Levenshtein,
//!    Damerau-Levenshtein, Jaro, Jaro-Winkler, n-gram Jaccard, n-gram
//!    Cosine).
//! 3. [`cluster::cluster`] dispatches to one of four strategies (affinity
//!    propagation, DBSCAN, HDBSCAN, mean shift) and normalizes the result
//!    into a [`cluster::ClusterMap`].
//! 4. [`output::OutputWriter`] serializes the cluster map and the matrix to
//!    flat artifacts.
//!
//! [`pipeline::run`] wires the stages together; the `strclump` binary wraps
//! it in a CLI.

#![forbid(unsafe_code)]

pub mod cluster;
pub mod distance;
pub mod error;
pub mod matrix;
pub mod normalize;
pub mod output;
pub mod pipeline;

pub use cluster::{
    cluster, AffinityPropagation, Algorithm, ClusterFit, ClusterMap, Dbscan, FitOutcome, Hdbscan,
    MeanShift, NOISE,
};
pub use distance::{DistanceEngine, Metric, ValueSemantics, DEFAULT_NGRAM_SIZE};
pub use error::{Error, Result};
pub use matrix::DistanceMatrix;
pub use normalize::{normalize, normalize_tokens};
pub use output::OutputWriter;
pub use pipeline::{cluster_strings, run, RunConfig, DEFAULT_MAX_TOKENS};

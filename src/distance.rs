//! Pairwise distance computation over a token set.
//!
//! Six metrics are supported, all reported on a "0 = identical" scale:
//!
//! - [`Metric::Levenshtein`] / [`Metric::Damerau`]: raw integer edit counts
//!   (the Damerau variant credits an adjacent transposition as one edit).
//! - [`Metric::Jaro`] / [`Metric::Winkler`]: the standard similarity in
//!   `[0, 1]` reported as `100 × (1 − similarity)`, so 100 means maximally
//!   dissimilar.
//! - [`Metric::Jaccard`] / [`Metric::Cosine`]: character n-gram overlap
//!   (set-based for Jaccard, count-vector for Cosine), reported as
//!   `100 × (1 − coefficient)`. A string shorter than `n` contributes a
//!   single n-gram equal to itself.
//!
//! Each matrix cell is an independent function of two tokens, so the O(N²)
//! fill is parallelized across rows with rayon.

use std::collections::HashMap;
use std::str::FromStr;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::matrix::DistanceMatrix;

/// Default n-gram length for the Jaccard and Cosine metrics.
pub const DEFAULT_NGRAM_SIZE: usize = 4;

/// How a metric's reported values are to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSemantics {
    /// Lower is more similar; 0 means identical.
    Distance,
    /// Higher is more similar.
    Similarity,
}

/// A pairwise string comparison metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Plain edit distance (insert, delete, substitute).
    Levenshtein,
    /// Damerau-Levenshtein edit distance (adds adjacent transposition).
    Damerau,
    /// Jaro similarity, reported as a distance on a 0–100 scale.
    Jaro,
    /// Jaro-Winkler similarity (common-prefix boost), same reporting scale.
    Winkler,
    /// Jaccard coefficient over character n-gram sets, 0–100 distance scale.
    Jaccard,
    /// Cosine similarity over character n-gram count vectors, 0–100 scale.
    Cosine,
}

impl Metric {
    /// All supported metrics, in canonical order.
    pub const ALL: [Metric; 6] = [
        Metric::Levenshtein,
        Metric::Damerau,
        Metric::Jaro,
        Metric::Winkler,
        Metric::Jaccard,
        Metric::Cosine,
    ];

    /// The configuration name of this metric.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Levenshtein => "levenshtein",
            Metric::Damerau => "damerau",
            Metric::Jaro => "jaro",
            Metric::Winkler => "winkler",
            Metric::Jaccard => "jaccard",
            Metric::Cosine => "cosine",
        }
    }

    /// Value semantics of the matrices this metric produces.
    ///
    /// Every supported metric currently reports distance-like values; the
    /// tag is what downstream consumers branch on (affinity propagation
    /// negates distance-like matrices to obtain similarities).
    pub fn semantics(&self) -> ValueSemantics {
        ValueSemantics::Distance
    }

    /// True if this metric compares character n-grams.
    pub fn uses_ngrams(&self) -> bool {
        matches!(self, Metric::Jaccard | Metric::Cosine)
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| Error::InvalidMetric {
                name: s.to_string(),
            })
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Character n-gram profile of one token: gram counts plus the vector norm.
///
/// The key set doubles as the gram set for Jaccard; the counts and norm feed
/// the cosine computation.
struct GramProfile {
    counts: HashMap<String, u32>,
    norm: f64,
}

impl GramProfile {
    fn build(token: &str, n: usize) -> Self {
        let chars: Vec<char> = token.chars().collect();
        let mut counts: HashMap<String, u32> = HashMap::new();
        if chars.len() < n {
            counts.insert(token.to_string(), 1);
        } else {
            for window in chars.windows(n) {
                *counts.entry(window.iter().collect()).or_insert(0) += 1;
            }
        }
        let norm = counts
            .values()
            .map(|&c| f64::from(c) * f64::from(c))
            .sum::<f64>()
            .sqrt();
        Self { counts, norm }
    }

    fn jaccard_distance(&self, other: &Self) -> f64 {
        let intersection = self
            .counts
            .keys()
            .filter(|g| other.counts.contains_key(*g))
            .count();
        let union = self.counts.len() + other.counts.len() - intersection;
        100.0 * (1.0 - intersection as f64 / union as f64)
    }

    fn cosine_distance(&self, other: &Self) -> f64 {
        let dot: f64 = self
            .counts
            .iter()
            .filter_map(|(g, &c)| other.counts.get(g).map(|&o| f64::from(c) * f64::from(o)))
            .sum();
        // Rounding in the norm product can push the coefficient past 1;
        // clamp so the distance never dips below 0.
        let coefficient = (dot / (self.norm * other.norm)).clamp(0.0, 1.0);
        100.0 * (1.0 - coefficient)
    }
}

/// Computes dense pairwise distance matrices for one configured metric.
///
/// The engine owns a per-run n-gram cache: gram profiles are built once per
/// `get_distances` call and never shared across runs or threads.
#[derive(Debug, Clone)]
pub struct DistanceEngine {
    metric: Metric,
    ngram_size: usize,
}

impl DistanceEngine {
    /// Create an engine for `metric`.
    ///
    /// `ngram_size` is only consulted by the Jaccard and Cosine metrics and
    /// must be at least 1.
    pub fn new(metric: Metric, ngram_size: usize) -> Result<Self> {
        if ngram_size == 0 {
            return Err(Error::InvalidParameter {
                name: "ngram_size",
                message: "must be at least 1",
            });
        }
        Ok(Self { metric, ngram_size })
    }

    /// Compute the full pairwise matrix over `tokens`.
    ///
    /// The diagonal is exactly 0 and the matrix is symmetric. Tokens are
    /// expected to be canonical (non-empty, deduplicated).
    pub fn get_distances(&self, tokens: &[String]) -> Result<DistanceMatrix> {
        if tokens.is_empty() {
            return Err(Error::EmptyInput);
        }

        // Per-run gram cache; only the n-gram metrics read it.
        let profiles: Vec<GramProfile> = if self.metric.uses_ngrams() {
            tokens
                .iter()
                .map(|t| GramProfile::build(t, self.ngram_size))
                .collect()
        } else {
            Vec::new()
        };

        // Fill the upper triangle in parallel, then mirror: the cells are
        // independent reads of the token list, and mirroring keeps the
        // matrix exactly symmetric.
        let n = tokens.len();
        let mut values = vec![0.0f64; n * n];
        values
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(i, row)| {
                for j in (i + 1)..n {
                    row[j] = self.cell(tokens, &profiles, i, j);
                }
            });
        for i in 1..n {
            for j in 0..i {
                values[i * n + j] = values[j * n + i];
            }
        }

        Ok(DistanceMatrix::new(tokens.to_vec(), values, self.metric))
    }

    fn cell(&self, tokens: &[String], profiles: &[GramProfile], i: usize, j: usize) -> f64 {
        let (a, b) = (&tokens[i], &tokens[j]);
        match self.metric {
            Metric::Levenshtein => strsim::levenshtein(a, b) as f64,
            Metric::Damerau => strsim::damerau_levenshtein(a, b) as f64,
            Metric::Jaro => 100.0 * (1.0 - strsim::jaro(a, b)),
            Metric::Winkler => 100.0 * (1.0 - strsim::jaro_winkler(a, b)),
            Metric::Jaccard => profiles[i].jaccard_distance(&profiles[j]),
            Metric::Cosine => profiles[i].cosine_distance(&profiles[j]),
        }
    }
}

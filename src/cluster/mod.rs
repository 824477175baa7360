//! Clustering strategies over a precomputed distance matrix.
//!
//! Four strategies are supported, each behind the uniform [`ClusterFit`]
//! interface and each with a fixed, metric-aware tuning policy:
//!
//! - **Affinity propagation** negates the matrix into similarities and keys
//!   its output by exemplar token.
//! - **DBSCAN** reads the matrix as true distance with a per-metric radius;
//!   noise points form their own explicit group.
//! - **HDBSCAN** builds a density hierarchy over the same matrix; same noise
//!   rule.
//! - **Mean shift** treats matrix rows as points and forces every token into
//!   some cluster.
//!
//! [`cluster`] dispatches on [`Algorithm`] and normalizes each strategy's
//! raw labels into a [`ClusterMap`]: exemplar-keyed for affinity
//! propagation, 0-based contiguous integer keys otherwise, member lists
//! always sorted and deduplicated, and the union of all members exactly the
//! token set.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matrix::DistanceMatrix;

mod affinity;
mod dbscan;
mod hdbscan;
mod meanshift;
mod traits;
mod util;

pub use affinity::AffinityPropagation;
pub use dbscan::Dbscan;
pub use hdbscan::Hdbscan;
pub use meanshift::MeanShift;
pub use traits::{ClusterFit, FitOutcome, NOISE};

/// A clustering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Exemplar-based message passing.
    AffinityPropagation,
    /// Density clustering with a fixed per-metric radius.
    Dbscan,
    /// Hierarchical density clustering.
    Hdbscan,
    /// Mode seeking over matrix rows.
    MeanShift,
}

impl Algorithm {
    /// All supported algorithms, in canonical order.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::AffinityPropagation,
        Algorithm::Dbscan,
        Algorithm::Hdbscan,
        Algorithm::MeanShift,
    ];

    /// The configuration name of this algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::AffinityPropagation => "affinity-propagation",
            Algorithm::Dbscan => "dbscan",
            Algorithm::Hdbscan => "hdbscan",
            Algorithm::MeanShift => "mean-shift",
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // "ap" and "ms" are accepted as short forms.
        match s {
            "ap" => return Ok(Algorithm::AffinityPropagation),
            "ms" => return Ok(Algorithm::MeanShift),
            _ => {}
        }
        Algorithm::ALL
            .iter()
            .copied()
            .find(|a| a.name() == s)
            .ok_or_else(|| Error::InvalidAlgorithm {
                name: s.to_string(),
            })
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The complete partition of a token set into clusters.
///
/// Keys are either exemplar tokens (affinity propagation) or stringified
/// 0-based integers (the other strategies); values are sorted, deduplicated
/// member lists. The `BTreeMap` keeps key order deterministic for
/// serialization. This shape is a stable contract for downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterMap(pub BTreeMap<String, Vec<String>>);

impl ClusterMap {
    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no clusters were produced.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Members of the cluster keyed by `key`, if present.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Iterate over `(key, members)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// Total number of member tokens across all clusters.
    pub fn member_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

/// Run `algorithm` over `matrix` and normalize its output.
///
/// The matrix's own metric drives the per-metric tuning policy (DBSCAN's
/// radius table, affinity propagation's similarity conversion).
pub fn cluster(matrix: &DistanceMatrix, algorithm: Algorithm) -> Result<ClusterMap> {
    let outcome = match algorithm {
        Algorithm::AffinityPropagation => AffinityPropagation::new().fit(matrix)?,
        Algorithm::Dbscan => Dbscan::for_metric(matrix.metric()).fit(matrix)?,
        Algorithm::Hdbscan => Hdbscan::new().fit(matrix)?,
        Algorithm::MeanShift => MeanShift::new().fit(matrix)?,
    };

    let tokens = matrix.tokens();
    match outcome.exemplars {
        Some(exemplars) => Ok(group_by_exemplar(&outcome.labels, &exemplars, tokens)),
        None => Ok(group_by_label(&outcome.labels, tokens)),
    }
}

/// Exemplar-keyed grouping: each cluster is keyed by its exemplar token and
/// contains the exemplar among its members.
fn group_by_exemplar(labels: &[usize], exemplars: &[usize], tokens: &[String]) -> ClusterMap {
    let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        let exemplar = &tokens[exemplars[label]];
        map.entry(exemplar.clone()).or_default().insert(tokens[i].clone());
    }
    ClusterMap(
        map.into_iter()
            .map(|(k, members)| (k, members.into_iter().collect()))
            .collect(),
    )
}

/// Integer-keyed grouping: labels are remapped to 0-based contiguous ids,
/// with the noise group (if any) as the final id.
fn group_by_label(labels: &[usize], tokens: &[String]) -> ClusterMap {
    let mut distinct: Vec<usize> = labels
        .iter()
        .copied()
        .filter(|&l| l != NOISE)
        .collect::<BTreeSet<usize>>()
        .into_iter()
        .collect();
    let has_noise = labels.iter().any(|&l| l == NOISE);
    if has_noise {
        distinct.push(NOISE);
    }

    let mut groups: Vec<BTreeSet<String>> = vec![BTreeSet::new(); distinct.len()];
    for (i, &label) in labels.iter().enumerate() {
        // Position lookup is fine here: cluster counts stay small.
        let id = distinct
            .iter()
            .position(|&l| l == label)
            .unwrap_or(distinct.len() - 1);
        groups[id].insert(tokens[i].clone());
    }

    ClusterMap(
        groups
            .into_iter()
            .enumerate()
            .map(|(id, members)| (id.to_string(), members.into_iter().collect()))
            .collect(),
    )
}

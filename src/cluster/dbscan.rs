//! DBSCAN over a precomputed distance matrix.
//!
//! Density clustering in the style of Ester et al. (1996): a point with at
//! least `min_samples` neighbors (itself included) inside the `eps` radius is
//! a core point; clusters grow by expanding from core points; everything not
//! density-reachable from a core point is noise.
//!
//! The matrix is treated as true distance (never negated). The neighborhood
//! radius is metric-dependent, since each metric family reports values on a
//! different scale; [`Dbscan::for_metric`] applies the tuning table.

use crate::distance::Metric;
use crate::error::{Error, Result};
use crate::matrix::DistanceMatrix;

use super::traits::{ClusterFit, FitOutcome, NOISE};

/// Neighborhood radius for the Jaro family (0–100 distance scale).
pub const EPS_JARO: f64 = 16.0;
/// Neighborhood radius for the n-gram metrics (0–100 distance scale).
pub const EPS_NGRAM: f64 = 40.0;
/// Neighborhood radius for the edit-distance metrics (raw edit counts).
pub const EPS_EDIT: f64 = 3.0;
/// Fallback radius when no metric-specific tuning applies.
pub const EPS_FALLBACK: f64 = 0.5;
/// Minimum neighborhood size (the point itself included) for a core point.
pub const MIN_SAMPLES: usize = 2;

// Internal label encoding.
// - UNCLASSIFIED: never assigned yet
// - NOISE_LABEL: visited, but not density-reachable from any core point (may be promoted later)
const UNCLASSIFIED: i32 = -2;
const NOISE_LABEL: i32 = -1;

/// DBSCAN clustering over a precomputed distance matrix.
#[derive(Debug, Clone)]
pub struct Dbscan {
    eps: f64,
    min_samples: usize,
}

impl Dbscan {
    /// Create a DBSCAN clusterer with an explicit radius.
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    /// Create a DBSCAN clusterer tuned for `metric`'s value scale.
    ///
    /// The radii are empirically tuned per metric family; see the `EPS_*`
    /// constants. `min_samples` is fixed at [`MIN_SAMPLES`].
    pub fn for_metric(metric: Metric) -> Self {
        let eps = match metric {
            Metric::Jaro | Metric::Winkler => EPS_JARO,
            Metric::Jaccard | Metric::Cosine => EPS_NGRAM,
            Metric::Levenshtein | Metric::Damerau => EPS_EDIT,
        };
        Self::new(eps, MIN_SAMPLES)
    }

    /// Override the neighborhood radius.
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Override the minimum neighborhood size.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Neighbors of `point` strictly inside the radius (the point excluded).
    fn region_query(&self, matrix: &DistanceMatrix, point: usize) -> Vec<usize> {
        (0..matrix.len())
            .filter(|&other| other != point && matrix.get(point, other) < self.eps)
            .collect()
    }

    /// Expand a cluster from a core point.
    fn expand_cluster(
        &self,
        matrix: &DistanceMatrix,
        point: usize,
        neighbors: &[usize],
        labels: &mut [i32],
        cluster_id: i32,
        visited: &mut [bool],
    ) {
        labels[point] = cluster_id;

        // Queue-based expansion to avoid deep recursion.
        let mut to_process: Vec<usize> = neighbors.to_vec();

        while let Some(neighbor) = to_process.pop() {
            // A point previously labeled noise can still become a border
            // point, so assign labels before the `visited` check.
            if labels[neighbor] == UNCLASSIFIED || labels[neighbor] == NOISE_LABEL {
                labels[neighbor] = cluster_id;
            }

            if visited[neighbor] {
                continue;
            }
            visited[neighbor] = true;

            let next = self.region_query(matrix, neighbor);

            // min_samples counts the point itself.
            if next.len() + 1 >= self.min_samples {
                for nn in next {
                    if !visited[nn] {
                        to_process.push(nn);
                    }
                }
            }
        }
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(EPS_FALLBACK, MIN_SAMPLES)
    }
}

impl ClusterFit for Dbscan {
    fn fit(&self, matrix: &DistanceMatrix) -> Result<FitOutcome> {
        let n = matrix.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        if self.eps <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "eps",
                message: "must be positive",
            });
        }

        if self.min_samples == 0 {
            return Err(Error::InvalidParameter {
                name: "min_samples",
                message: "must be at least 1",
            });
        }

        let mut labels = vec![UNCLASSIFIED; n];
        let mut visited = vec![false; n];
        let mut cluster_id: i32 = 0;

        for point in 0..n {
            if visited[point] {
                continue;
            }
            visited[point] = true;

            let neighbors = self.region_query(matrix, point);

            if neighbors.len() + 1 < self.min_samples {
                // Not enough neighbors: noise for now, may become border later.
                labels[point] = NOISE_LABEL;
                continue;
            }

            self.expand_cluster(matrix, point, &neighbors, &mut labels, cluster_id, &mut visited);
            cluster_id += 1;
        }

        Ok(FitOutcome {
            labels: labels
                .into_iter()
                .map(|l| if l >= 0 { l as usize } else { NOISE })
                .collect(),
            exemplars: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceEngine;

    fn lev_matrix(words: &[&str]) -> DistanceMatrix {
        let tokens: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        DistanceEngine::new(Metric::Levenshtein, 4)
            .unwrap()
            .get_distances(&tokens)
            .unwrap()
    }

    #[test]
    fn cat_and_cats_cluster_together_dog_does_not() {
        let matrix = lev_matrix(&["cat", "cats", "dog"]);
        let outcome = Dbscan::for_metric(Metric::Levenshtein).fit(&matrix).unwrap();

        assert_eq!(outcome.labels[0], outcome.labels[1]);
        assert_ne!(outcome.labels[0], outcome.labels[2]);
        // "dog" has no neighbor within the edit radius.
        assert_eq!(outcome.labels[2], NOISE);
    }

    fn custom_matrix(n: usize, pairs: &[(usize, usize, f64)]) -> DistanceMatrix {
        let tokens: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();
        let mut values = vec![0.0; n * n];
        for &(i, j, d) in pairs {
            values[i * n + j] = d;
            values[j * n + i] = d;
        }
        DistanceMatrix::new(tokens, values, Metric::Levenshtein)
    }

    #[test]
    fn noise_promoted_to_border_point() {
        // Point 0 is visited first, has only one neighbor (not core), and is
        // marked noise; once point 1 turns out to be core, 0 must be promoted
        // to a border point of that cluster.
        let matrix = custom_matrix(
            4,
            &[(0, 1, 2.0), (0, 2, 10.0), (0, 3, 10.0), (1, 2, 1.0), (1, 3, 1.0), (2, 3, 1.0)],
        );
        let outcome = Dbscan::new(2.5, 3).fit(&matrix).unwrap();

        let core = outcome.labels[1];
        assert_ne!(core, NOISE);
        assert_eq!(outcome.labels[0], core);
        assert_eq!(outcome.labels[2], core);
        assert_eq!(outcome.labels[3], core);
    }

    #[test]
    fn all_points_apart_is_all_noise() {
        let matrix = lev_matrix(&["apple", "zebra", "quartz"]);
        let outcome = Dbscan::for_metric(Metric::Levenshtein).fit(&matrix).unwrap();
        assert!(outcome.labels.iter().all(|&l| l == NOISE));
    }

    #[test]
    fn chain_of_close_words_is_one_cluster() {
        let matrix = lev_matrix(&["aaaa", "aaab", "aabb", "abbb", "bbbb"]);
        let outcome = Dbscan::new(1.5, 2).fit(&matrix).unwrap();
        let first = outcome.labels[0];
        assert_ne!(first, NOISE);
        assert!(outcome.labels.iter().all(|&l| l == first));
    }

    #[test]
    fn invalid_parameters_rejected() {
        let matrix = lev_matrix(&["cat", "cats"]);
        assert!(Dbscan::new(0.0, 2).fit(&matrix).is_err());
        assert!(Dbscan::new(-1.0, 2).fit(&matrix).is_err());
        assert!(Dbscan::new(1.0, 0).fit(&matrix).is_err());
    }

    #[test]
    fn metric_tuning_table() {
        assert_eq!(Dbscan::for_metric(Metric::Jaro).eps, EPS_JARO);
        assert_eq!(Dbscan::for_metric(Metric::Winkler).eps, EPS_JARO);
        assert_eq!(Dbscan::for_metric(Metric::Jaccard).eps, EPS_NGRAM);
        assert_eq!(Dbscan::for_metric(Metric::Cosine).eps, EPS_NGRAM);
        assert_eq!(Dbscan::for_metric(Metric::Levenshtein).eps, EPS_EDIT);
        assert_eq!(Dbscan::for_metric(Metric::Damerau).eps, EPS_EDIT);
    }
}

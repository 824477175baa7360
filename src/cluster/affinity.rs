//! Affinity propagation over a precomputed distance matrix.
//!
//! Message-passing clustering in the style of Frey and Dueck (2007). Every
//! point exchanges two kinds of messages with every candidate exemplar:
//!
//! - responsibility `r(i, k)`: how well suited `k` is to serve as the
//!   exemplar for `i`, relative to other candidates;
//! - availability `a(i, k)`: how appropriate it would be for `i` to pick `k`,
//!   given the support `k` has accumulated from other points.
//!
//! Both message matrices are damped between iterations to avoid
//! oscillation. Points whose self responsibility plus self availability is
//! positive become exemplars; every other point joins its best exemplar.
//!
//! The matrix is treated as dissimilarity and negated into similarities
//! before fitting (the metric's value-semantics tag decides the sign). The
//! self similarity (preference) is the median pairwise similarity, which
//! biases toward a moderate number of clusters.
//!
//! String distance matrices are full of exact ties (two tokens each one edit
//! from the other), and on a perfectly symmetric tie the deterministic
//! message dynamics cannot pick a winner: both competitors decay to a
//! degenerate saddle where neither becomes an exemplar. A tiny seeded jitter
//! on the similarities breaks those ties, the standard remedy since Frey and
//! Dueck's reference implementation. The convergence window must also
//! outlast the damped transient that follows symmetry breaking, during
//! which both tied competitors briefly look like exemplars.
//!
//! If the exemplar set fails to stay stable for a full convergence window
//! within the iteration budget, the fit fails with `NonConvergence` rather
//! than collapsing everything into one degenerate cluster.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::distance::ValueSemantics;
use crate::error::{Error, Result};
use crate::matrix::DistanceMatrix;

use super::traits::{ClusterFit, FitOutcome};

/// Damping factor applied to message updates.
pub const DAMPING: f64 = 0.9;
/// Iteration budget.
pub const MAX_ITER: usize = 500;
/// Number of consecutive iterations the exemplar set must stay unchanged.
pub const CONVERGENCE_ITER: usize = 40;

/// Tie-breaking jitter amplitude, relative to the largest similarity
/// magnitude. Large enough to break exact ties well within the iteration
/// budget, far too small to reorder genuinely distinct similarities.
const JITTER: f64 = 1e-6;

/// Fixed jitter seed, for reproducible fits.
const JITTER_SEED: u64 = 0;

/// Affinity propagation clustering over a precomputed matrix.
#[derive(Debug, Clone)]
pub struct AffinityPropagation {
    damping: f64,
    max_iter: usize,
    convergence_iter: usize,
}

impl AffinityPropagation {
    /// Create a clusterer with the fixed tuning constants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the damping factor (must lie in `[0.5, 1)`).
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Override the iteration budget.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Convert matrix values into similarities, honoring the metric's
    /// value-semantics tag, place the preference on the diagonal, and
    /// jitter every cell to break exact ties.
    fn similarities(matrix: &DistanceMatrix) -> Vec<f64> {
        let n = matrix.len();
        let mut s = vec![0.0f64; n * n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let v = matrix.get(i, j);
                    s[i * n + j] = match matrix.metric().semantics() {
                        ValueSemantics::Distance => -v,
                        ValueSemantics::Similarity => v,
                    };
                }
            }
        }

        // Preference: median off-diagonal similarity.
        let mut off: Vec<f64> = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| s[i * n + j])
            .collect();
        off.sort_by(|a, b| a.total_cmp(b));
        let preference = if off.is_empty() {
            0.0
        } else {
            let mid = off.len() / 2;
            if off.len() % 2 == 0 {
                (off[mid - 1] + off[mid]) / 2.0
            } else {
                off[mid]
            }
        };
        for i in 0..n {
            s[i * n + i] = preference;
        }

        let scale = JITTER * s.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        if scale > 0.0 {
            let mut rng = StdRng::seed_from_u64(JITTER_SEED);
            for v in &mut s {
                *v += scale * rng.random_range(-1.0..1.0);
            }
        }
        s
    }
}

impl Default for AffinityPropagation {
    fn default() -> Self {
        Self {
            damping: DAMPING,
            max_iter: MAX_ITER,
            convergence_iter: CONVERGENCE_ITER,
        }
    }
}

impl ClusterFit for AffinityPropagation {
    fn fit(&self, matrix: &DistanceMatrix) -> Result<FitOutcome> {
        let n = matrix.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        if !(0.5..1.0).contains(&self.damping) {
            return Err(Error::InvalidParameter {
                name: "damping",
                message: "must lie in [0.5, 1)",
            });
        }

        if n == 1 {
            return Ok(FitOutcome {
                labels: vec![0],
                exemplars: Some(vec![0]),
            });
        }

        let s = Self::similarities(matrix);
        let mut r = vec![0.0f64; n * n];
        let mut a = vec![0.0f64; n * n];

        let mut prev_exemplars: Vec<bool> = vec![false; n];
        let mut stable_for = 0usize;
        let mut converged = false;

        for _ in 0..self.max_iter {
            // Responsibilities: r(i,k) = s(i,k) - max_{k' != k} (a(i,k') + s(i,k')).
            for i in 0..n {
                let row = i * n;
                let mut max1 = f64::NEG_INFINITY;
                let mut max2 = f64::NEG_INFINITY;
                let mut argmax = 0usize;
                for k in 0..n {
                    let v = a[row + k] + s[row + k];
                    if v > max1 {
                        max2 = max1;
                        max1 = v;
                        argmax = k;
                    } else if v > max2 {
                        max2 = v;
                    }
                }
                for k in 0..n {
                    let competing = if k == argmax { max2 } else { max1 };
                    let r_new = s[row + k] - competing;
                    r[row + k] = self.damping * r[row + k] + (1.0 - self.damping) * r_new;
                }
            }

            // Availabilities: a(i,k) = min(0, r(k,k) + sum_{i' not in {i,k}} max(0, r(i',k)));
            // a(k,k) = sum_{i' != k} max(0, r(i',k)).
            for k in 0..n {
                let mut sum_pos = 0.0f64;
                for i in 0..n {
                    if i != k {
                        sum_pos += r[i * n + k].max(0.0);
                    }
                }
                for i in 0..n {
                    let a_new = if i == k {
                        sum_pos
                    } else {
                        (r[k * n + k] + sum_pos - r[i * n + k].max(0.0)).min(0.0)
                    };
                    a[i * n + k] = self.damping * a[i * n + k] + (1.0 - self.damping) * a_new;
                }
            }

            // Convergence: the exemplar set must hold steady for a window.
            let exemplars: Vec<bool> = (0..n).map(|k| r[k * n + k] + a[k * n + k] > 0.0).collect();
            if exemplars == prev_exemplars {
                stable_for += 1;
                if stable_for >= self.convergence_iter && exemplars.iter().any(|&e| e) {
                    converged = true;
                    break;
                }
            } else {
                stable_for = 0;
                prev_exemplars = exemplars;
            }
        }

        if !converged {
            return Err(Error::NonConvergence {
                iterations: self.max_iter,
            });
        }

        let exemplars: Vec<usize> = (0..n)
            .filter(|&k| r[k * n + k] + a[k * n + k] > 0.0)
            .collect();
        if exemplars.is_empty() {
            return Err(Error::NonConvergence {
                iterations: self.max_iter,
            });
        }

        // Each point joins its most similar exemplar; exemplars join themselves.
        let mut labels = vec![0usize; n];
        for i in 0..n {
            if let Some(pos) = exemplars.iter().position(|&k| k == i) {
                labels[i] = pos;
                continue;
            }
            let mut best = 0usize;
            let mut best_sim = f64::NEG_INFINITY;
            for (pos, &k) in exemplars.iter().enumerate() {
                let sim = s[i * n + k];
                if sim > best_sim {
                    best_sim = sim;
                    best = pos;
                }
            }
            labels[i] = best;
        }

        Ok(FitOutcome {
            labels,
            exemplars: Some(exemplars),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{DistanceEngine, Metric};

    fn lev_matrix(words: &[&str]) -> DistanceMatrix {
        let tokens: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        DistanceEngine::new(Metric::Levenshtein, 4)
            .unwrap()
            .get_distances(&tokens)
            .unwrap()
    }

    #[test]
    fn two_word_families_get_two_exemplars() {
        let matrix = lev_matrix(&[
            "cluster",
            "clusters",
            "clustered",
            "elephant",
            "elephants",
            "elephantine",
        ]);
        let outcome = AffinityPropagation::new().fit(&matrix).unwrap();
        let exemplars = outcome.exemplars.expect("exemplar-keyed strategy");

        assert_eq!(exemplars.len(), 2);
        // The first three tokens share a label, as do the last three.
        assert_eq!(outcome.labels[0], outcome.labels[1]);
        assert_eq!(outcome.labels[1], outcome.labels[2]);
        assert_eq!(outcome.labels[3], outcome.labels[4]);
        assert_eq!(outcome.labels[4], outcome.labels[5]);
        assert_ne!(outcome.labels[0], outcome.labels[3]);
    }

    #[test]
    fn exemplar_labels_itself() {
        let matrix = lev_matrix(&["cat", "cats", "dog", "dogs"]);
        let outcome = AffinityPropagation::new().fit(&matrix).unwrap();
        let exemplars = outcome.exemplars.expect("exemplar-keyed strategy");
        for (pos, &k) in exemplars.iter().enumerate() {
            assert_eq!(outcome.labels[k], pos);
        }
    }

    #[test]
    fn exhausted_budget_is_nonconvergence() {
        let matrix = lev_matrix(&["cat", "cats", "dog"]);
        let result = AffinityPropagation::new().with_max_iter(3).fit(&matrix);
        assert!(matches!(result, Err(Error::NonConvergence { iterations: 3 })));
    }

    #[test]
    fn single_token_is_its_own_exemplar() {
        let matrix = lev_matrix(&["alone"]);
        let outcome = AffinityPropagation::new().fit(&matrix).unwrap();
        assert_eq!(outcome.labels, vec![0]);
        assert_eq!(outcome.exemplars, Some(vec![0]));
    }

    #[test]
    fn invalid_damping_rejected() {
        let matrix = lev_matrix(&["cat", "cats"]);
        assert!(AffinityPropagation::new().with_damping(0.2).fit(&matrix).is_err());
        assert!(AffinityPropagation::new().with_damping(1.0).fit(&matrix).is_err());
    }
}

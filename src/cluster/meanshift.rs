//! Mean shift over the rows of a precomputed distance matrix.
//!
//! Each token's matrix row (its distance profile against every token) is
//! treated as a point in R^N. Every point hill-climbs to a density mode
//! under a flat kernel: repeatedly replace the current position with the
//! mean of all rows within one bandwidth of it, until it stops moving.
//! Modes closer than one bandwidth are merged, and every point is assigned
//! to its nearest surviving mode.
//!
//! Mean shift emits no noise label: every token lands in some cluster.
//!
//! The bandwidth is estimated from the matrix itself: the mean distance from
//! each row to its k-th nearest row, with k a fixed quantile of the point
//! count. The quantile is empirically tuned; override it only with
//! independent validation.

use crate::error::{Error, Result};
use crate::matrix::DistanceMatrix;

use super::traits::{ClusterFit, FitOutcome};
use super::util::euclidean;

/// Quantile of the point count used for the bandwidth neighbor index.
pub const BANDWIDTH_QUANTILE: f64 = 0.3;
/// Hill-climbing iteration cap per seed.
pub const MAX_ITER: usize = 300;

/// Mean-shift clustering over a precomputed distance matrix.
#[derive(Debug, Clone)]
pub struct MeanShift {
    quantile: f64,
    max_iter: usize,
}

impl MeanShift {
    /// Create a mean-shift clusterer with the fixed tuning constants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the bandwidth-estimation quantile (must lie in `(0, 1]`).
    pub fn with_quantile(mut self, quantile: f64) -> Self {
        self.quantile = quantile;
        self
    }

    /// Estimate the kernel bandwidth from pairwise row distances.
    ///
    /// For each row, take the distance to its k-th nearest row (itself
    /// included at distance 0), where `k = ceil(quantile * n)`; the
    /// bandwidth is the mean of those distances.
    fn estimate_bandwidth(&self, rows: &[&[f64]]) -> f64 {
        let n = rows.len();
        let k = ((self.quantile * n as f64).ceil() as usize).clamp(1, n);
        let mut total = 0.0f64;
        for a in rows {
            let mut dists: Vec<f64> = rows.iter().map(|b| euclidean(a, b)).collect();
            dists.sort_by(|x, y| x.total_cmp(y));
            total += dists[k - 1];
        }
        total / n as f64
    }

    /// Shift one seed to its mode under a flat kernel.
    fn climb(&self, rows: &[&[f64]], seed: &[f64], bandwidth: f64) -> (Vec<f64>, usize) {
        let stop = 1e-3 * bandwidth;
        let mut mode = seed.to_vec();
        let mut support = 1usize;
        for _ in 0..self.max_iter {
            let members: Vec<&[f64]> = rows
                .iter()
                .copied()
                .filter(|r| euclidean(&mode, r) <= bandwidth)
                .collect();
            if members.is_empty() {
                break;
            }
            support = members.len();
            let mut next = vec![0.0f64; mode.len()];
            for r in &members {
                for (acc, &v) in next.iter_mut().zip(r.iter()) {
                    *acc += v;
                }
            }
            for acc in &mut next {
                *acc /= support as f64;
            }
            let moved = euclidean(&mode, &next);
            mode = next;
            if moved < stop {
                break;
            }
        }
        (mode, support)
    }
}

impl Default for MeanShift {
    fn default() -> Self {
        Self {
            quantile: BANDWIDTH_QUANTILE,
            max_iter: MAX_ITER,
        }
    }
}

impl ClusterFit for MeanShift {
    fn fit(&self, matrix: &DistanceMatrix) -> Result<FitOutcome> {
        let n = matrix.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        if !(0.0..=1.0).contains(&self.quantile) || self.quantile == 0.0 {
            return Err(Error::InvalidParameter {
                name: "quantile",
                message: "must lie in (0, 1]",
            });
        }

        let rows: Vec<&[f64]> = (0..n).map(|i| matrix.row(i)).collect();
        let bandwidth = self.estimate_bandwidth(&rows);

        // Zero bandwidth means every row is identical: one cluster.
        if bandwidth <= 0.0 {
            return Ok(FitOutcome {
                labels: vec![0; n],
                exemplars: None,
            });
        }

        // Seed a climb from every point.
        let climbs: Vec<(Vec<f64>, usize)> =
            rows.iter().map(|seed| self.climb(&rows, seed, bandwidth)).collect();

        // Merge modes within one bandwidth of each other, preferring the
        // mode with the larger support.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| climbs[b].1.cmp(&climbs[a].1).then(a.cmp(&b)));

        let mut kept: Vec<Vec<f64>> = Vec::new();
        for &i in &order {
            let (mode, _) = &climbs[i];
            if !kept.iter().any(|m| euclidean(m, mode) <= bandwidth) {
                kept.push(mode.clone());
            }
        }

        // Every point joins its nearest surviving mode; no noise.
        let labels: Vec<usize> = climbs
            .iter()
            .map(|(mode, _)| {
                let mut best = 0usize;
                let mut best_dist = f64::INFINITY;
                for (idx, m) in kept.iter().enumerate() {
                    let d = euclidean(m, mode);
                    if d < best_dist {
                        best_dist = d;
                        best = idx;
                    }
                }
                best
            })
            .collect();

        Ok(FitOutcome {
            labels,
            exemplars: None,
        })
    }
}

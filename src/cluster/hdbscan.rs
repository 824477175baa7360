//! HDBSCAN over a precomputed distance matrix.
//!
//! Hierarchical density clustering in the style of Campello, Moulavi and
//! Sander (2013). The epsilon parameter of DBSCAN is replaced by a cluster
//! hierarchy built from mutual reachability distances:
//!
//! 1. Core distance per point: distance to its `min_samples`-th nearest
//!    neighbor.
//! 2. Mutual reachability: `mrd(i, j) = max(d(i, j) / alpha, core[i], core[j])`.
//! 3. Minimum spanning tree over the mutual reachability graph.
//! 4. Condensed cluster tree: walk MST edges in ascending order, merging
//!    components; components below `min_cluster_size` fall out as noise
//!    rather than forming splits.
//! 5. Stability-based extraction: select the non-overlapping set of clusters
//!    maximizing total stability; everything unselected is noise.
//!
//! Distances come straight from the matrix (treated as true distance, never
//! negated); noise points are reported as [`NOISE`] and grouped explicitly
//! by output normalization.

use crate::error::{Error, Result};
use crate::matrix::DistanceMatrix;

use super::traits::{ClusterFit, FitOutcome, NOISE};
use super::util::{self, UnionFind};

/// Core-distance neighbor count.
pub const MIN_SAMPLES: usize = 2;
/// Minimum component size for a cluster to persist in the hierarchy.
pub const MIN_CLUSTER_SIZE: usize = 2;
/// Distance scaling applied inside mutual reachability.
pub const ALPHA: f64 = 1.0;

/// HDBSCAN clustering over a precomputed distance matrix.
#[derive(Debug, Clone)]
pub struct Hdbscan {
    min_samples: usize,
    min_cluster_size: usize,
    alpha: f64,
}

impl Hdbscan {
    /// Create an HDBSCAN clusterer with the fixed tuning constants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override `min_samples` (k for core distance computation).
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Override `min_cluster_size`.
    pub fn with_min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size;
        self
    }

    fn core_distances(&self, matrix: &DistanceMatrix) -> Vec<f64> {
        let n = matrix.len();
        let k = self.min_samples.min(n - 1).max(1);
        let mut core = Vec::with_capacity(n);
        for i in 0..n {
            let mut row: Vec<f64> = (0..n)
                .filter(|&j| j != i)
                .map(|j| matrix.get(i, j))
                .collect();
            row.sort_by(|a, b| a.total_cmp(b));
            core.push(row[k - 1]);
        }
        core
    }
}

impl Default for Hdbscan {
    fn default() -> Self {
        Self {
            min_samples: MIN_SAMPLES,
            min_cluster_size: MIN_CLUSTER_SIZE,
            alpha: ALPHA,
        }
    }
}

impl ClusterFit for Hdbscan {
    fn fit(&self, matrix: &DistanceMatrix) -> Result<FitOutcome> {
        let n = matrix.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        if self.min_samples == 0 {
            return Err(Error::InvalidParameter {
                name: "min_samples",
                message: "must be at least 1",
            });
        }

        if self.min_cluster_size < 2 {
            return Err(Error::InvalidParameter {
                name: "min_cluster_size",
                message: "must be at least 2",
            });
        }

        if n == 1 {
            return Ok(FitOutcome {
                labels: vec![NOISE],
                exemplars: None,
            });
        }

        let core = self.core_distances(matrix);
        let alpha = self.alpha;
        let mut mst = util::prim_mst(n, |i, j| {
            (matrix.get(i, j) / alpha).max(core[i]).max(core[j])
        });
        mst.sort_by(|a, b| a.2.total_cmp(&b.2));

        let tree = CondensedTree::build(&mst, n, self.min_cluster_size);
        Ok(FitOutcome {
            labels: tree.extract_labels(n),
            exemplars: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Condensed cluster tree
// ---------------------------------------------------------------------------

/// One row of the condensed tree, in flat form.
///
/// Either a point falling out of a cluster (`child < n`, `child_size == 1`)
/// or a cluster splitting into a child cluster (`child >= n`).
struct CondensedRow {
    parent: usize,
    child: usize,
    lambda: f64, // 1/distance at which this happened
    child_size: usize,
}

struct CondensedTree {
    rows: Vec<CondensedRow>,
    num_clusters: usize,
    n: usize,
}

impl CondensedTree {
    /// Walk MST edges in ascending order, recording cluster births, splits,
    /// and point fallouts. Cluster ids start at `n`; point ids are `0..n`.
    fn build(mst: &[(usize, usize, f64)], n: usize, min_cluster_size: usize) -> Self {
        let mut next_cluster_id = n;
        let mut uf = UnionFind::new(n);
        // UF root -> current cluster id (None if no cluster formed yet).
        let mut comp_cluster: Vec<Option<usize>> = vec![None; n];
        let mut rows: Vec<CondensedRow> = Vec::new();

        for &(u, v, dist) in mst {
            let ru = uf.find(u);
            let rv = uf.find(v);
            if ru == rv {
                continue;
            }

            let lambda = if dist > 0.0 { 1.0 / dist } else { f64::INFINITY };
            let ru_size = uf.size[ru];
            let rv_size = uf.size[rv];

            let left_big = ru_size >= min_cluster_size;
            let right_big = rv_size >= min_cluster_size;

            if left_big && right_big {
                // Genuine split: both sides are large enough to be clusters.
                let new_cluster = next_cluster_id;
                next_cluster_id += 1;

                let left_child = comp_cluster[ru].unwrap_or_else(|| {
                    let id = next_cluster_id;
                    next_cluster_id += 1;
                    id
                });
                let right_child = comp_cluster[rv].unwrap_or_else(|| {
                    let id = next_cluster_id;
                    next_cluster_id += 1;
                    id
                });

                rows.push(CondensedRow {
                    parent: new_cluster,
                    child: left_child,
                    lambda,
                    child_size: ru_size,
                });
                rows.push(CondensedRow {
                    parent: new_cluster,
                    child: right_child,
                    lambda,
                    child_size: rv_size,
                });

                // Children without a prior cluster have all their points born
                // into the freshly created child.
                if comp_cluster[ru].is_none() {
                    record_fallouts(&mut rows, &uf, ru, left_child, lambda, n);
                }
                if comp_cluster[rv].is_none() {
                    record_fallouts(&mut rows, &uf, rv, right_child, lambda, n);
                }

                let new_root = uf.union_roots(ru, rv);
                comp_cluster[new_root] = Some(new_cluster);
            } else if left_big || right_big {
                let (big, small) = if left_big { (ru, rv) } else { (rv, ru) };

                let cluster = comp_cluster[big].unwrap_or_else(|| {
                    let id = next_cluster_id;
                    next_cluster_id += 1;
                    record_fallouts(&mut rows, &uf, big, id, lambda, n);
                    id
                });

                // Small side's points fall out into the big side's cluster.
                record_fallouts(&mut rows, &uf, small, cluster, lambda, n);

                let new_root = uf.union_roots(big, small);
                comp_cluster[new_root] = Some(cluster);
            } else {
                // Neither is large. Just merge; no cluster event.
                let existing = comp_cluster[ru].or(comp_cluster[rv]);
                let new_root = uf.union_roots(ru, rv);
                comp_cluster[new_root] = existing;
            }
        }

        Self {
            rows,
            num_clusters: next_cluster_id - n,
            n,
        }
    }

    /// Stability-based cluster selection, then one label per point.
    fn extract_labels(&self, n: usize) -> Vec<usize> {
        if self.num_clusters == 0 {
            return vec![NOISE; n];
        }

        // A cluster is "born" when it first appears as a child; the root
        // (never a child) is born at lambda = 0.
        let mut lambda_birth = vec![0.0f64; self.num_clusters];
        for row in &self.rows {
            if row.child_size > 1 && row.child >= n {
                lambda_birth[row.child - n] = row.lambda;
            }
        }

        // stability(c) = sum over condensed rows with parent c of
        // child_size * (lambda - lambda_birth(c)).
        let mut stability = vec![0.0f64; self.num_clusters];
        for row in &self.rows {
            if row.parent < n {
                continue;
            }
            let c = row.parent - n;
            stability[c] += row.child_size as f64 * (row.lambda - lambda_birth[c]);
        }

        // Parent -> child cluster edges.
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); self.num_clusters];
        for row in &self.rows {
            if row.parent >= n && row.child >= n && row.child_size > 1 {
                children[row.parent - n].push(row.child - n);
            }
        }

        // Bottom-up selection: a parent is chosen over its children only if
        // its own stability beats their combined subtree stability. Ids do
        // not order the tree (a merge allocates its parent id before any
        // fresh child id), so walk in explicit post-order: every child's
        // subtree stability is aggregated before its parent is judged.
        let mut is_child = vec![false; self.num_clusters];
        for kids in &children {
            for &c in kids {
                is_child[c] = true;
            }
        }
        let mut order = Vec::with_capacity(self.num_clusters);
        let mut stack: Vec<(usize, bool)> = (0..self.num_clusters)
            .filter(|&i| !is_child[i])
            .map(|i| (i, false))
            .collect();
        while let Some((node, visited)) = stack.pop() {
            if visited {
                order.push(node);
                continue;
            }
            stack.push((node, true));
            for &c in &children[node] {
                stack.push((c, false));
            }
        }

        let mut selected = vec![false; self.num_clusters];
        let mut subtree_stab = stability.clone();
        for &i in &order {
            if children[i].is_empty() {
                selected[i] = true;
            } else {
                let child_sum: f64 = children[i].iter().map(|&c| subtree_stab[c]).sum();
                if stability[i] > child_sum {
                    selected[i] = true;
                    deselect_descendants(&children, i, &mut selected);
                    subtree_stab[i] = stability[i];
                } else {
                    subtree_stab[i] = child_sum;
                }
            }
        }

        let mut label_map = vec![usize::MAX; self.num_clusters];
        let mut next_label = 0usize;
        for (i, &sel) in selected.iter().enumerate() {
            if sel {
                label_map[i] = next_label;
                next_label += 1;
            }
        }

        let mut labels = vec![NOISE; n];
        for i in 0..self.num_clusters {
            if selected[i] {
                self.label_points(&selected, i, label_map[i], &mut labels);
            }
        }
        labels
    }

    /// Label every point under cluster `cluster_idx`, descending through
    /// non-selected child clusters.
    fn label_points(&self, selected: &[bool], cluster_idx: usize, label: usize, labels: &mut [usize]) {
        let cluster_id = cluster_idx + self.n;

        for row in &self.rows {
            if row.parent != cluster_id {
                continue;
            }
            if row.child_size == 1 && row.child < self.n {
                labels[row.child] = label;
            } else if row.child_size > 1 && row.child >= self.n {
                let child_idx = row.child - self.n;
                if !selected[child_idx] {
                    self.label_points(selected, child_idx, label, labels);
                }
            }
        }
    }
}

/// Record a point-fallout row for every point in the component at `comp_root`.
fn record_fallouts(
    rows: &mut Vec<CondensedRow>,
    uf: &UnionFind,
    comp_root: usize,
    parent_cluster: usize,
    lambda: f64,
    n: usize,
) {
    // UnionFind tracks no member lists, so scan all points for the root.
    for p in 0..n {
        if uf.root_readonly(p) == comp_root {
            rows.push(CondensedRow {
                parent: parent_cluster,
                child: p,
                lambda,
                child_size: 1,
            });
        }
    }
}

fn deselect_descendants(children: &[Vec<usize>], node: usize, selected: &mut [bool]) {
    for &child in &children[node] {
        selected[child] = false;
        deselect_descendants(children, child, selected);
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
    fn two_tight_families_of_words() {
        // Two groups of near-identical words, far apart from each other.
        let matrix = lev_matrix(&[
            "clustering",
            "clusterings",
            "clustered",
            "xylophone",
            "xylophones",
            "xylophonist",
        ]);
        let outcome = Hdbscan::new().fit(&matrix).unwrap();
        let labels = outcome.labels;

        assert_eq!(labels.len(), 6);
        let a = labels[0];
        assert_ne!(a, NOISE);
        assert_eq!(labels[1], a);
        assert_eq!(labels[2], a);

        let b = labels[3];
        assert_ne!(b, NOISE);
        assert_eq!(labels[4], b);
        assert_eq!(labels[5], b);

        assert_ne!(a, b);
    }

    /// Three tight blocks of three points, the first two joined into a
    /// mid-level cluster before everything merges at the top, plus one
    /// straggler point that only attaches above the final merge.
    fn three_block_matrix_with_straggler() -> DistanceMatrix {
        let n = 10;
        let tokens: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();
        let block = |p: usize| p / 3;
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                values[i * n + j] = if i == 9 || j == 9 {
                    2.6
                } else if block(i) == block(j) {
                    1.0
                } else if block(i) < 2 && block(j) < 2 {
                    2.0
                } else {
                    2.5
                };
            }
        }
        DistanceMatrix::new(tokens, values, Metric::Levenshtein)
    }

    #[test]
    fn nested_splits_keep_leaf_clusters_and_drop_the_straggler() {
        // The top merge's own stability beats its children's raw values but
        // not their aggregated subtrees, so the three leaf blocks win and
        // the straggler, which only ever belonged to the top merge, stays
        // noise rather than inheriting a label from a wrongly kept ancestor.
        let matrix = three_block_matrix_with_straggler();
        let outcome = Hdbscan::new().fit(&matrix).unwrap();

        assert_eq!(outcome.labels.len(), 10);
        for block in 0..3 {
            let label = outcome.labels[block * 3];
            assert_ne!(label, NOISE);
            assert_eq!(outcome.labels[block * 3 + 1], label);
            assert_eq!(outcome.labels[block * 3 + 2], label);
        }
        assert_ne!(outcome.labels[0], outcome.labels[3]);
        assert_ne!(outcome.labels[3], outcome.labels[6]);
        assert_ne!(outcome.labels[0], outcome.labels[6]);
        assert_eq!(outcome.labels[9], NOISE);
    }

    #[test]
    fn single_token_is_noise() {
        let matrix = lev_matrix(&["alone"]);
        let outcome = Hdbscan::new().fit(&matrix).unwrap();
        assert_eq!(outcome.labels, vec![NOISE]);
    }

    #[test]
    fn oversized_min_cluster_size_yields_all_noise() {
        let matrix = lev_matrix(&["cat", "cats", "dog"]);
        let outcome = Hdbscan::new().with_min_cluster_size(100).fit(&matrix).unwrap();
        assert!(outcome.labels.iter().all(|&l| l == NOISE));
    }

    #[test]
    fn empty_matrix_rejected() {
        // An empty matrix cannot be built through the engine, so drive the
        // validation directly.
        let matrix = DistanceMatrix::new(Vec::new(), Vec::new(), Metric::Levenshtein);
        assert!(Hdbscan::new().fit(&matrix).is_err());
    }

    #[test]
    fn invalid_parameters_rejected() {
        let matrix = lev_matrix(&["cat", "cats"]);
        assert!(Hdbscan::new().with_min_samples(0).fit(&matrix).is_err());
        assert!(Hdbscan::new().with_min_cluster_size(1).fit(&matrix).is_err());
    }

    #[test]
    fn every_label_is_cluster_or_noise() {
        let matrix = lev_matrix(&["aa", "ab", "ba", "zzzz", "zzzy", "qqqq"]);
        let outcome = Hdbscan::new().fit(&matrix).unwrap();
        assert_eq!(outcome.labels.len(), 6);
        // Labels are contiguous from 0 for non-noise points.
        let max = outcome.labels.iter().filter(|&&l| l != NOISE).max();
        if let Some(&max) = max {
            for l in 0..=max {
                assert!(outcome.labels.contains(&l));
            }
        }
    }
}

use crate::error::Result;
use crate::matrix::DistanceMatrix;

/// Label assigned to points that no density cluster claims.
///
/// Noise points are never dropped: output normalization places them in an
/// explicit final cluster group.
pub const NOISE: usize = usize::MAX;

/// Raw result of one clustering strategy: one label per token, plus the
/// exemplar indices for exemplar-keyed strategies.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    /// Cluster label per token, [`NOISE`] for unassigned points.
    pub labels: Vec<usize>,
    /// For affinity propagation: token indices of the cluster exemplars,
    /// where `labels[i]` indexes into this list.
    pub exemplars: Option<Vec<usize>>,
}

/// Common interface for clustering strategies over a precomputed matrix.
pub trait ClusterFit {
    /// Fit the model and return one label per matrix token.
    fn fit(&self, matrix: &DistanceMatrix) -> Result<FitOutcome>;
}

//! Dense pairwise distance matrix.

use crate::distance::Metric;

/// A symmetric N×N matrix of pairwise metric values over a token set.
///
/// The matrix owns the index↔token bijection: `get(i, j)` is the metric value
/// between `tokens()[i]` and `tokens()[j]`. It is tagged with the [`Metric`]
/// that produced it, built once by the distance engine, and read-only
/// afterward.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    tokens: Vec<String>,
    values: Vec<f64>,
    metric: Metric,
}

impl DistanceMatrix {
    pub(crate) fn new(tokens: Vec<String>, values: Vec<f64>, metric: Metric) -> Self {
        debug_assert_eq!(values.len(), tokens.len() * tokens.len());
        Self {
            tokens,
            values,
            metric,
        }
    }

    /// Number of tokens (the matrix is `len × len`).
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True if the matrix covers no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The token list, in matrix index order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The metric that produced this matrix.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Metric value between tokens `i` and `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.tokens.len() + j]
    }

    /// Row `i` as a slice (the value profile of token `i` against all tokens).
    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.tokens.len();
        &self.values[i * n..(i + 1) * n]
    }
}

use proptest::prelude::*;
use std::collections::BTreeSet;

use strclump::{cluster, normalize, normalize_tokens, Algorithm, DistanceEngine, Metric};

proptest! {
    #[test]
    fn prop_normalize_idempotent(raw in ".{0,40}") {
        let once = normalize(&raw);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn prop_normalized_tokens_nonempty_and_unique(
        raws in prop::collection::vec(".{0,20}", 0..20)
    ) {
        let tokens = normalize_tokens(&raws);
        let unique: BTreeSet<&String> = tokens.iter().collect();
        prop_assert_eq!(unique.len(), tokens.len());
        for t in &tokens {
            prop_assert!(!t.is_empty());
        }
    }

    #[test]
    fn prop_matrices_symmetric_with_zero_diagonal(
        words in prop::collection::vec("[a-z]{1,8}", 1..12),
        metric_idx in 0usize..6
    ) {
        let tokens = normalize_tokens(&words);
        let metric = Metric::ALL[metric_idx];
        let matrix = DistanceEngine::new(metric, 2).unwrap().get_distances(&tokens).unwrap();

        for i in 0..matrix.len() {
            prop_assert_eq!(matrix.get(i, i), 0.0);
            for j in 0..matrix.len() {
                prop_assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
    }

    #[test]
    fn prop_cluster_map_is_exact_partition(
        words in prop::collection::vec("[a-z]{1,8}", 1..12),
        algo_idx in 0usize..3
    ) {
        // Affinity propagation is exercised separately: on adversarial random
        // inputs it may legitimately fail with NonConvergence.
        let algorithm = [Algorithm::Dbscan, Algorithm::Hdbscan, Algorithm::MeanShift][algo_idx];
        let tokens = normalize_tokens(&words);
        let matrix = DistanceEngine::new(Metric::Levenshtein, 4)
            .unwrap()
            .get_distances(&tokens)
            .unwrap();
        let map = cluster(&matrix, algorithm).unwrap();

        let mut members: Vec<String> = map.iter().flat_map(|(_, m)| m.clone()).collect();
        members.sort_unstable();
        prop_assert_eq!(members, tokens);
    }
}

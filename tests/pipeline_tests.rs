use std::fs;

use strclump::{run, Algorithm, ClusterMap, Error, Metric, RunConfig};

fn raw(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[test]
fn dbscan_run_writes_both_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::new(Metric::Levenshtein, Algorithm::Dbscan, dir.path());

    let clusters = run(&raw(&["cat", "cats", "dog"]), &config).unwrap();

    // "cat" and "cats" (edit distance 1) share a cluster; "dog" is noise.
    assert_eq!(clusters.get("0").unwrap(), &["cat".to_string(), "cats".to_string()]);
    assert_eq!(clusters.get("1").unwrap(), &["dog".to_string()]);

    let clusters_path = dir.path().join("clusters_dbscan.json");
    let distances_path = dir.path().join("distances_levenshtein.csv");
    assert!(clusters_path.exists());
    assert!(distances_path.exists());

    // The JSON artifact reproduces the identical map.
    let reread: ClusterMap =
        serde_json::from_str(&fs::read_to_string(&clusters_path).unwrap()).unwrap();
    assert_eq!(reread, clusters);

    // The CSV headers are the token list in matrix order (sorted).
    let csv = fs::read_to_string(&distances_path).unwrap();
    let first = csv.lines().next().unwrap();
    assert_eq!(first, ",cat,cats,dog");
}

#[test]
fn affinity_run_keys_clusters_by_exemplar() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::new(Metric::Levenshtein, Algorithm::AffinityPropagation, dir.path());

    let clusters = run(
        &raw(&["cluster", "clusters", "clustered", "elephant", "elephants", "elephantine"]),
        &config,
    )
    .unwrap();

    for (exemplar, members) in clusters.iter() {
        assert!(members.contains(exemplar));
    }
    assert!(dir.path().join("clusters_affinity-propagation.json").exists());
}

#[test]
fn normalization_feeds_the_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::new(Metric::Levenshtein, Algorithm::MeanShift, dir.path());

    // Punctuated and camel-cased variants of the same term collapse.
    let clusters = run(&raw(&["Heart-Attack", "heartAttack", "heart attack"]), &config).unwrap();
    assert_eq!(clusters.member_count(), 1);
    assert_eq!(clusters.get("0").unwrap(), &["heart attack".to_string()]);
}

#[test]
fn jaccard_unigram_distance_lands_in_the_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = RunConfig::new(Metric::Jaccard, Algorithm::MeanShift, dir.path());
    config.ngram_size = 1;

    run(&raw(&["abc", "abd"]), &config).unwrap();

    let csv = fs::read_to_string(dir.path().join("distances_jaccard.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], ",abc,abd");
    assert_eq!(lines[1], "abc,0,50");
    assert_eq!(lines[2], "abd,50,0");
}

#[test]
fn unwritable_output_propagates_the_path() {
    let config = RunConfig::new(
        Metric::Levenshtein,
        Algorithm::Dbscan,
        "/proc/definitely-not-writable/out",
    );
    let err = run(&raw(&["cat", "cats"]), &config).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

//! Cluster a handful of food names with two different strategies.

use strclump::{cluster, normalize_tokens, Algorithm, DistanceEngine, Metric};

fn main() -> strclump::Result<()> {
    let raw = vec![
        "green apple".to_string(),
        "Green Apples".to_string(),
        "greenApple".to_string(),
        "red onion".to_string(),
        "red onions".to_string(),
        "RedOnion".to_string(),
        "sparkling water".to_string(),
    ];

    let tokens = normalize_tokens(&raw);
    println!("=== canonical tokens ===");
    for t in &tokens {
        println!("  {t}");
    }

    let engine = DistanceEngine::new(Metric::Levenshtein, 4)?;
    let matrix = engine.get_distances(&tokens)?;

    for algorithm in [Algorithm::Dbscan, Algorithm::AffinityPropagation] {
        let clusters = cluster(&matrix, algorithm)?;
        println!("\n=== {algorithm} ===");
        for (key, members) in clusters.iter() {
            println!("  {key}: {members:?}");
        }
    }

    Ok(())
}

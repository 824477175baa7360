//! Artifact serialization.
//!
//! Two artifacts are produced per run, both assembled fully in memory and
//! written with a single call, so a failure mid-run never leaves a partially
//! valid file behind:
//!
//! - `clusters_<algorithm>.json`: the cluster map as a JSON object with
//!   sorted keys and 2-space indentation.
//! - `distances_<metric>.csv`: the distance matrix as a delimited table
//!   whose header row and header column are the token list in matrix order.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cluster::{Algorithm, ClusterMap};
use crate::error::{Error, Result};
use crate::matrix::DistanceMatrix;

/// Writes run artifacts into one output directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    /// Create a writer rooted at `dir`. The directory is created if missing.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| Error::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// The output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serialize the cluster map to `clusters_<algorithm>.json`.
    ///
    /// Returns the path written.
    pub fn write_clusters(&self, clusters: &ClusterMap, algorithm: Algorithm) -> Result<PathBuf> {
        let path = self.dir.join(format!("clusters_{}.json", algorithm.name()));
        let mut body = serde_json::to_string_pretty(clusters).map_err(|source| Error::Io {
            path: path.clone(),
            source: source.into(),
        })?;
        body.push('\n');
        fs::write(&path, body).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Serialize the matrix to `distances_<metric>.csv`.
    ///
    /// Canonical tokens contain only lowercase ASCII alphanumerics and
    /// spaces, so no CSV quoting is needed.
    pub fn write_distances(&self, matrix: &DistanceMatrix) -> Result<PathBuf> {
        let path = self.dir.join(format!("distances_{}.csv", matrix.metric().name()));

        let n = matrix.len();
        let mut body = String::with_capacity(n * n * 8);
        for token in matrix.tokens() {
            body.push(',');
            body.push_str(token);
        }
        body.push('\n');
        for (i, token) in matrix.tokens().iter().enumerate() {
            body.push_str(token);
            for j in 0..n {
                // Infallible: writing to a String cannot fail.
                let _ = write!(body, ",{}", matrix.get(i, j));
            }
            body.push('\n');
        }

        fs::write(&path, body).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

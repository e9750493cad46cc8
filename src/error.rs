//! Typed errors for the deduplication run.
//!
//! Every fatal failure carries the [`Stage`] it came from so the operator can
//! tell an embedding outage apart from a clustering bug or a full disk.
//! Row-level data problems are not errors at this level; they are reported as
//! [`RowError`] and the row is dropped.

use crate::embeddings::EmbedError;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Pipeline stage a fatal error originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Ingest,
    Embedding,
    Clustering,
    Selection,
    Assembly,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Ingest => "ingest",
            Stage::Embedding => "embedding",
            Stage::Clustering => "clustering",
            Stage::Selection => "selection",
            Stage::Assembly => "assembly",
        };
        f.write_str(name)
    }
}

/// Errors that abort a deduplication run.
#[derive(Debug, Error)]
pub enum DedupError {
    /// A tunable is outside its valid range
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The input table could not be read
    #[error("failed to read input table {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The input file is not a JSON array
    #[error("input table {path} is not a JSON array of records: {source}")]
    Table {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Provider unreachable, rate limited past the retry budget, or rejected the request
    #[error("embedding provider failed: {0}")]
    Embed(#[from] EmbedError),

    /// Provider returned a different number of vectors than titles sent
    #[error("embedding provider returned {got} vectors for {expected} titles")]
    Alignment { expected: usize, got: usize },

    /// Vectors in one batch disagree on dimensionality
    #[error("embedding {index} has dimension {got}, expected {expected}")]
    Dimension {
        index: usize,
        expected: usize,
        got: usize,
    },

    /// Cluster labels do not line up with the article list
    #[error("clustering produced {got} labels for {expected} articles")]
    LabelCount { expected: usize, got: usize },

    /// Partition bookkeeping produced a cluster nobody belongs to
    #[error("cluster {cluster_id} has no members")]
    EmptyCluster { cluster_id: usize },

    /// The final feed could not be written
    #[error("failed to write feed {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl DedupError {
    /// The stage that failed, for diagnostics.
    pub fn stage(&self) -> Stage {
        match self {
            DedupError::Config(_) => Stage::Config,
            DedupError::Read { .. } | DedupError::Table { .. } => Stage::Ingest,
            DedupError::Embed(_) | DedupError::Alignment { .. } | DedupError::Dimension { .. } => {
                Stage::Embedding
            }
            DedupError::LabelCount { .. } => Stage::Clustering,
            DedupError::EmptyCluster { .. } => Stage::Selection,
            DedupError::Write { .. } => Stage::Assembly,
        }
    }
}

/// Why a single input row was excluded from clustering.
#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("row is not a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("hype_score {0} is not an integer between 1 and 10")]
    InvalidHypeScore(Value),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_attribution() {
        assert_eq!(
            DedupError::Alignment { expected: 5, got: 4 }.stage(),
            Stage::Embedding
        );
        assert_eq!(
            DedupError::EmptyCluster { cluster_id: 3 }.stage(),
            Stage::Selection
        );
        assert_eq!(
            DedupError::LabelCount { expected: 2, got: 1 }.stage(),
            Stage::Clustering
        );
        assert_eq!(DedupError::Config("eps".into()).stage(), Stage::Config);
    }

    #[test]
    fn test_alignment_message() {
        let e = DedupError::Alignment { expected: 5, got: 4 };
        assert_eq!(
            e.to_string(),
            "embedding provider returned 4 vectors for 5 titles"
        );
        assert_eq!(Stage::Embedding.to_string(), "embedding");
    }
}

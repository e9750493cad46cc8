//! Loading the processed article table for deduplication.
//!
//! The table is a JSON array of objects. Rows that fail validation are
//! dropped one by one with a warning; only an unreadable file or a document
//! that is not an array stops the run.

use crate::error::DedupError;
use crate::models::Article;
use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Valid articles plus how many rows were thrown away.
#[derive(Debug, Default)]
pub struct Ingested {
    pub articles: Vec<Article>,
    pub dropped: usize,
}

/// Validate every row of an already parsed table.
///
/// Each article keeps its row position as its id, so ids are stable even
/// when earlier rows are dropped.
pub fn validate_rows(rows: Vec<Value>) -> Ingested {
    let mut ingested = Ingested::default();
    for (id, row) in rows.into_iter().enumerate() {
        match Article::from_row(id, row) {
            Ok(article) => ingested.articles.push(article),
            Err(e) => {
                warn!(row = id, error = %e, "Dropping input row");
                ingested.dropped += 1;
            }
        }
    }
    ingested
}

/// Read and validate the processed article table at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_articles(path: &Path) -> Result<Ingested, DedupError> {
    let bytes = fs::read(path).await.map_err(|source| DedupError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let rows: Vec<Value> = serde_json::from_slice(&bytes).map_err(|source| DedupError::Table {
        path: path.display().to_string(),
        source,
    })?;

    let total = rows.len();
    let ingested = validate_rows(rows);
    info!(
        rows = total,
        valid = ingested.articles.len(),
        dropped = ingested.dropped,
        "Loaded article table"
    );
    Ok(ingested)
}

//! JSON output of the deduplicated feed.
//!
//! Rows appear in ascending `cluster_id` order. Each row is the winning
//! article's full input record plus its `cluster_id`.

use crate::cluster::Representative;
use crate::error::DedupError;
use crate::models::{Article, FeedRow};
use crate::utils::write_json_atomic;
use std::path::Path;
use tracing::{error, info, instrument};

/// Materialise the representatives as feed rows.
pub fn assemble_feed(articles: &[Article], representatives: &[Representative]) -> Vec<FeedRow> {
    representatives
        .iter()
        .map(|rep| articles[rep.index].to_feed_row(rep.cluster_id))
        .collect()
}

/// Write the feed to `path`, replacing any previous file atomically.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = rows.len()))]
pub async fn write_feed(rows: &[FeedRow], path: &Path) -> Result<(), DedupError> {
    if let Err(source) = write_json_atomic(rows, path).await {
        error!(error = %source, "Failed to write feed");
        return Err(DedupError::Write {
            path: path.display().to_string(),
            source,
        });
    }
    info!("Wrote deduplicated feed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article(id: usize, title: &str, hype: u8) -> Article {
        Article::from_row(
            id,
            json!({"new_title": title, "hype_score": hype, "category": "Tech"}),
        )
        .unwrap()
    }

    #[test]
    fn test_assemble_feed_uses_winners() {
        let articles = vec![article(0, "a", 4), article(1, "b", 1), article(2, "c", 6)];
        let reps = vec![
            Representative { cluster_id: 0, index: 1, cluster_size: 2 },
            Representative { cluster_id: 1, index: 2, cluster_size: 1 },
        ];
        let rows = assemble_feed(&articles, &reps);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cluster_id, 0);
        assert_eq!(rows[0].new_title(), Some("b"));
        assert_eq!(rows[1].new_title(), Some("c"));
        assert_eq!(rows[1].category(), Some("Tech"));
    }

    #[tokio::test]
    async fn test_write_feed_round_trip() {
        let dir = std::env::temp_dir().join(format!("no_hype_outputs_{}", std::process::id()));
        let path = dir.join("final_feed.json");
        let rows = assemble_feed(
            &[article(0, "a", 4)],
            &[Representative { cluster_id: 3, index: 0, cluster_size: 1 }],
        );

        write_feed(&rows, &path).await.unwrap();
        let back: Vec<FeedRow> = crate::utils::read_json(&path).await.unwrap();
        assert_eq!(back, rows);

        let _ = std::fs::remove_dir_all(&dir);
    }
}

//! Run-level observability: counts and a preview of merged stories.

use crate::cluster::Clustering;
use crate::models::Article;
use tracing::info;

/// How many clusters the duplicate preview shows.
pub const PREVIEW_GROUPS: usize = 3;

/// Counts reported at the end of a deduplication run.
///
/// `output_count + duplicates_removed == input_count` always holds; rows
/// dropped during ingest are counted separately and are not part of
/// `input_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub input_count: usize,
    pub output_count: usize,
    pub duplicates_removed: usize,
    pub dropped_rows: usize,
}

impl RunSummary {
    pub fn new(input_count: usize, output_count: usize, dropped_rows: usize) -> Self {
        Self {
            input_count,
            output_count,
            duplicates_removed: input_count.saturating_sub(output_count),
            dropped_rows,
        }
    }

    pub fn log(&self) {
        info!(
            input_count = self.input_count,
            output_count = self.output_count,
            duplicates_removed = self.duplicates_removed,
            dropped_rows = self.dropped_rows,
            "Deduplication complete: {} articles in, {} unique stories out, {} duplicates removed",
            self.input_count,
            self.output_count,
            self.duplicates_removed
        );
    }
}

/// Titles in the largest multi-member clusters, largest first.
pub fn duplicate_preview(
    articles: &[Article],
    clustering: &Clustering,
    limit: usize,
) -> Vec<(usize, Vec<String>)> {
    clustering
        .largest_duplicate_groups(limit)
        .into_iter()
        .map(|(cluster_id, members)| {
            let titles = members
                .iter()
                .map(|&i| articles[i].new_title.clone())
                .collect();
            (cluster_id, titles)
        })
        .collect()
}

/// Log the duplicate preview so an operator can sanity-check `eps`.
pub fn log_duplicate_preview(articles: &[Article], clustering: &Clustering) {
    if clustering.is_empty() {
        return;
    }
    for (cluster_id, titles) in duplicate_preview(articles, clustering, PREVIEW_GROUPS) {
        info!(cluster_id, size = titles.len(), titles = ?titles, "Duplicate group");
    }
}

//! The deduplication run: ingest, embed, cluster, select, assemble.
//!
//! Each stage consumes the previous stage's complete output. Nothing is
//! written until every stage has succeeded, so a failed run leaves any
//! existing feed file untouched.

use crate::cluster::{Clustering, Dbscan, KeepStrategy, select_representatives};
use crate::embeddings::{EmbedBatch, request_embeddings};
use crate::error::DedupError;
use crate::ingest::load_articles;
use crate::models::{Article, FeedRow};
use crate::outputs::json::{assemble_feed, write_feed};
use crate::outputs::summary::{RunSummary, log_duplicate_preview};
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument};

/// Tunables for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DedupConfig {
    /// Maximum cosine distance for two titles to count as the same story.
    pub eps: f32,
    pub keep: KeepStrategy,
    /// Titles per embedding request.
    pub batch_size: usize,
    /// Embedding requests in flight at once.
    pub concurrency: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            eps: 0.4,
            keep: KeepStrategy::LowestHype,
            batch_size: 512,
            concurrency: 4,
        }
    }
}

/// Feed rows and counts produced by [`deduplicate`].
#[derive(Debug, Clone, PartialEq)]
pub struct DedupOutcome {
    pub rows: Vec<FeedRow>,
    pub summary: RunSummary,
}

/// Collapse near-duplicate articles into one row per story.
#[instrument(level = "info", skip_all, fields(articles = articles.len(), eps = config.eps, keep = %config.keep))]
pub async fn deduplicate<P: EmbedBatch>(
    provider: &P,
    articles: &[Article],
    config: &DedupConfig,
) -> Result<DedupOutcome, DedupError> {
    let dbscan = Dbscan::new(config.eps)?;

    let texts: Vec<String> = articles
        .iter()
        .map(|a| a.text_for_embedding().to_string())
        .collect();
    let embeddings =
        request_embeddings(provider, &texts, config.batch_size, config.concurrency).await?;

    let t0 = Instant::now();
    let clustering = Clustering::from_labels(dbscan.fit_predict(&embeddings));
    info!(
        clusters = clustering.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Clustered articles"
    );
    log_duplicate_preview(articles, &clustering);

    let representatives = select_representatives(articles, &clustering, config.keep)?;
    let merged = representatives.iter().filter(|r| r.cluster_size > 1).count();
    info!(merged_stories = merged, strategy = %config.keep, "Selected representatives");
    let rows = assemble_feed(articles, &representatives);

    Ok(DedupOutcome {
        summary: RunSummary::new(articles.len(), rows.len(), 0),
        rows,
    })
}

/// Run the whole pipeline from `input` to `output`.
///
/// `connect` builds the embedding provider. It is only called when the table
/// holds at least one valid article, so an empty run needs no credentials.
#[instrument(level = "info", skip_all, fields(input = %input.display(), output = %output.display()))]
pub async fn run_dedup<P, F>(
    connect: F,
    input: &Path,
    output: &Path,
    config: &DedupConfig,
) -> Result<RunSummary, DedupError>
where
    P: EmbedBatch,
    F: FnOnce() -> Result<P, DedupError>,
{
    let ingested = load_articles(input).await?;
    let mut outcome = if ingested.articles.is_empty() {
        Dbscan::new(config.eps)?;
        info!("No valid articles; skipping the embedding provider");
        DedupOutcome {
            rows: Vec::new(),
            summary: RunSummary::default(),
        }
    } else {
        let provider = connect()?;
        deduplicate(&provider, &ingested.articles, config).await?
    };
    outcome.summary.dropped_rows = ingested.dropped;

    write_feed(&outcome.rows, output).await?;
    outcome.summary.log();
    Ok(outcome.summary)
}

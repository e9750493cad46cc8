//! Feed scraping: the first stage of the pipeline.
//!
//! Every configured feed is fetched and parsed into [`ScrapedArticle`]
//! records, which are written to `news_data_YYYYMMDD.json`.
//!
//! # Submodules
//!
//! - [`sources`]: the built-in feed list and the YAML override
//! - [`rss`]: downloading and parsing RSS 2.0, RSS 1.0 and Atom
//!
//! A feed that fails to download or parse, or that has no entries, is
//! logged and skipped; the rest of the run continues.

pub mod rss;
pub mod sources;

use crate::models::ScrapedArticle;
use crate::utils::write_json_atomic;
use chrono::Local;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use sources::FeedSource;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Feeds downloaded at the same time.
const FETCH_CONCURRENCY: usize = 4;

/// File name for a scrape taken on `date`.
pub fn output_filename(date: chrono::NaiveDate) -> String {
    format!("news_data_{}.json", date.format("%Y%m%d"))
}

fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()
}

/// Fetch every feed, keeping feed order in the result.
#[instrument(level = "info", skip_all, fields(feeds = feeds.len()))]
pub async fn scrape_all(feeds: &[FeedSource]) -> Result<Vec<ScrapedArticle>, Box<dyn Error>> {
    let client = http_client()?;
    let scraped_at = Local::now().to_rfc3339();

    let per_feed: Vec<Vec<ScrapedArticle>> = stream::iter(feeds)
        .map(|feed| {
            let client = &client;
            let scraped_at = scraped_at.as_str();
            async move {
                match rss::fetch_feed(client, feed, scraped_at).await {
                    Ok(articles) if articles.is_empty() => {
                        warn!(source = %feed.name, "No entries found; skipping feed");
                        Vec::new()
                    }
                    Ok(articles) => articles,
                    Err(e) => {
                        error!(source = %feed.name, url = %feed.url, error = %e, "Feed fetch failed; skipping feed");
                        Vec::new()
                    }
                }
            }
        })
        .buffered(FETCH_CONCURRENCY)
        .collect()
        .await;

    let articles: Vec<ScrapedArticle> = per_feed.into_iter().flatten().collect();
    info!(count = articles.len(), "Scraping complete");
    Ok(articles)
}

/// Scrape all feeds and write today's `news_data_YYYYMMDD.json` under `output_dir`.
///
/// Returns the path that was written.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn run_scrape(
    feed_list: Option<&Path>,
    output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let feeds = sources::load_feed_list(feed_list).await?;
    let articles = scrape_all(&feeds).await?;

    let path = output_dir.join(output_filename(Local::now().date_naive()));
    write_json_atomic(&articles, &path).await?;
    info!(path = %path.display(), count = articles.len(), "Saved scraped articles");
    Ok(path)
}

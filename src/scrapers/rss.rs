//! RSS 2.0, RSS 1.0 (RDF) and Atom parsing.
//!
//! `feed-rs` normalises all three dialects into one entry model and keeps
//! namespaced extensions (`atom:link`, `media:*`, `dc:*`) apart from the core
//! elements they shadow.

use super::sources::FeedSource;
use crate::models::ScrapedArticle;
use crate::utils::strip_html;
use feed_rs::model::{Entry, Link};
use feed_rs::parser::ParseFeedError;
use reqwest::Client;
use std::error::Error;
use tracing::{debug, info, instrument};

const NOT_AVAILABLE: &str = "N/A";

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// The `alternate` link, or the first link when none is marked.
fn alternate_link(links: &[Link]) -> Option<&str> {
    links
        .iter()
        .find(|l| l.rel.as_deref().is_none_or(|r| r == "alternate"))
        .or_else(|| links.first())
        .map(|l| l.href.as_str())
}

fn to_record(entry: Entry, source: &str, scraped_at: &str) -> Option<ScrapedArticle> {
    let title = non_empty(entry.title.as_ref().map(|t| t.content.as_str()));
    let link = non_empty(alternate_link(&entry.links));
    let (Some(title), Some(link)) = (title, link) else {
        debug!(source, "Skipping feed item without title or link");
        return None;
    };
    let published = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let summary = entry
        .summary
        .map(|t| t.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .map(|s| strip_html(&s))
        .unwrap_or_default();

    Some(ScrapedArticle {
        source: source.to_string(),
        title,
        link,
        published,
        summary,
        scraped_at: scraped_at.to_string(),
    })
}

/// Parse a feed document into scraped records.
///
/// Items without a title or a link are skipped. Dates are normalised to
/// RFC 3339.
pub fn parse_feed(
    xml: &str,
    source: &str,
    scraped_at: &str,
) -> Result<Vec<ScrapedArticle>, ParseFeedError> {
    let feed = feed_rs::parser::parse(xml.as_bytes())?;
    Ok(feed
        .entries
        .into_iter()
        .filter_map(|entry| to_record(entry, source, scraped_at))
        .collect())
}

/// Download and parse one feed.
#[instrument(level = "info", skip(client, scraped_at), fields(source = %feed.name))]
pub async fn fetch_feed(
    client: &Client,
    feed: &FeedSource,
    scraped_at: &str,
) -> Result<Vec<ScrapedArticle>, Box<dyn Error>> {
    let body = client
        .get(&feed.url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let articles = parse_feed(&body, &feed.name, scraped_at)?;
    info!(count = articles.len(), url = %feed.url, "Parsed feed");
    Ok(articles)
}

//! The list of feeds the scraper visits.
//!
//! The built-in list mixes tech, AI and science outlets so that the same
//! story tends to show up under several sources. A YAML file can replace it:
//!
//! ```yaml
//! - name: Ars Technica
//!   url: https://feeds.arstechnica.com/arstechnica/index
//! - name: NASA
//!   url: https://www.nasa.gov/rss/dyn/breaking_news.rss
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// One RSS or Atom feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedSource {
    /// Display name written into every scraped record.
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// The built-in feed list.
pub fn default_feeds() -> Vec<FeedSource> {
    vec![
        // Tech & business
        FeedSource::new("The Verge", "https://www.theverge.com/rss/index.xml"),
        FeedSource::new("TechCrunch", "https://techcrunch.com/feed/"),
        FeedSource::new("Ars Technica", "https://feeds.arstechnica.com/arstechnica/index"),
        FeedSource::new("Engadget", "https://www.engadget.com/rss.xml"),
        FeedSource::new("Wired", "https://www.wired.com/feed/rss"),
        FeedSource::new("VentureBeat", "http://feeds.feedburner.com/venturebeat/SZYF"),
        FeedSource::new("BBC Tech", "http://feeds.bbci.co.uk/news/technology/rss.xml"),
        FeedSource::new("NYT Tech", "https://rss.nytimes.com/services/xml/rss/nyt/Technology.xml"),
        FeedSource::new("CNBC Tech", "https://www.cnbc.com/id/19854910/device/rss/rss.html"),
        // AI, where duplicates are most common
        FeedSource::new("OpenAI Blog", "https://openai.com/blog/rss.xml"),
        FeedSource::new("MIT AI News", "https://news.mit.edu/rss/topic/artificial-intelligence2"),
        FeedSource::new("Google AI", "http://googleaiblog.blogspot.com/atom.xml"),
        // Science
        FeedSource::new("NASA", "https://www.nasa.gov/rss/dyn/breaking_news.rss"),
        FeedSource::new("Space.com", "https://www.space.com/feeds/all"),
        FeedSource::new("Science Daily", "https://www.sciencedaily.com/rss/top/science.xml"),
    ]
}

/// Parse a YAML feed list.
pub fn parse_feed_list(yaml: &str) -> Result<Vec<FeedSource>, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

/// Load the feed list from `path`, or fall back to [`default_feeds`].
#[instrument(level = "info")]
pub async fn load_feed_list(path: Option<&Path>) -> Result<Vec<FeedSource>, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(default_feeds());
    };
    let yaml = tokio::fs::read_to_string(path).await?;
    let feeds = parse_feed_list(&yaml)?;
    info!(count = feeds.len(), path = %path.display(), "Loaded feed list");
    Ok(feeds)
}

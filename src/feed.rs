//! The reader-facing view of `final_feed.json`.
//!
//! Filtering, headline metrics and hype analytics live here; turning them
//! into Markdown is [`crate::outputs::markdown`]'s job.

use crate::models::FeedRow;
use crate::outputs::markdown::{FeedPage, render_feed};
use crate::utils::read_json;
use itertools::Itertools;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::io;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Articles above this score count as clickbait the reader was spared.
pub const CLICKBAIT_THRESHOLD: u8 = 7;

/// Label used when a row has no usable category or link.
pub const UNKNOWN: &str = "unknown";

/// Load the feed, treating a missing file as an empty feed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_feed(path: &Path) -> Result<Vec<FeedRow>, Box<dyn Error>> {
    match read_json::<Vec<FeedRow>>(path).await {
        Ok(rows) => {
            info!(rows = rows.len(), "Loaded feed");
            Ok(rows)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("No feed found; run the dedup stage first");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Source label for a row: its link's domain.
pub fn row_source(row: &FeedRow) -> String {
    row.source_domain().unwrap_or_else(|| UNKNOWN.to_string())
}

fn row_category(row: &FeedRow) -> &str {
    row.category().unwrap_or(UNKNOWN)
}

/// Reader-side filters. `None` means no restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFilter {
    pub category: Option<String>,
    pub source: Option<String>,
    /// Rows scoring above this are hidden (1..=10).
    pub max_hype: u8,
}

impl Default for FeedFilter {
    fn default() -> Self {
        Self {
            category: None,
            source: None,
            max_hype: 10,
        }
    }
}

impl FeedFilter {
    pub fn matches(&self, row: &FeedRow) -> bool {
        let Some(hype) = row.hype_score() else {
            return false;
        };
        if hype > self.max_hype {
            return false;
        }
        if let Some(category) = &self.category {
            if !row_category(row).eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(source) = &self.source {
            if !row_source(row).eq_ignore_ascii_case(source) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, rows: &'a [FeedRow]) -> Vec<&'a FeedRow> {
        rows.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Colour band for a hype score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HypeBand {
    Green,
    Orange,
    Red,
}

impl HypeBand {
    pub fn for_score(score: u8) -> Self {
        match score {
            s if s > 7 => HypeBand::Red,
            s if s > 4 => HypeBand::Orange,
            _ => HypeBand::Green,
        }
    }
}

impl fmt::Display for HypeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HypeBand::Green => "green",
            HypeBand::Orange => "orange",
            HypeBand::Red => "red",
        })
    }
}

/// The headline numbers shown above the story cards.
///
/// `articles` and `avg_hype` describe the filtered view; `clickbait_avoided`
/// and `sources_tracked` describe the whole feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedMetrics {
    pub articles: usize,
    pub avg_hype: Option<f64>,
    pub clickbait_avoided: usize,
    pub sources_tracked: usize,
}

fn mean(scores: impl IntoIterator<Item = u8>) -> Option<f64> {
    let (sum, n) = scores
        .into_iter()
        .fold((0u32, 0u32), |(s, n), x| (s + u32::from(x), n + 1));
    (n > 0).then(|| f64::from(sum) / f64::from(n))
}

pub fn compute_metrics(all: &[FeedRow], shown: &[&FeedRow]) -> FeedMetrics {
    FeedMetrics {
        articles: shown.len(),
        avg_hype: mean(shown.iter().filter_map(|r| r.hype_score())),
        clickbait_avoided: all
            .iter()
            .filter(|r| r.hype_score().is_some_and(|h| h > CLICKBAIT_THRESHOLD))
            .count(),
        sources_tracked: all.iter().map(row_source).unique().count(),
    }
}

/// Hype statistics for one group of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub name: String,
    pub count: usize,
    pub mean_hype: f64,
}

/// Per-group counts and means, keyed by `key`.
fn group_stats<F>(rows: &[FeedRow], key: F) -> Vec<GroupStats>
where
    F: Fn(&FeedRow) -> String,
{
    rows.iter()
        .filter_map(|r| r.hype_score().map(|h| (key(r), h)))
        .into_group_map()
        .into_iter()
        .map(|(name, scores)| GroupStats {
            name,
            count: scores.len(),
            mean_hype: mean(scores).unwrap_or_default(),
        })
        .collect()
}

/// Hype by category, alphabetical.
pub fn hype_by_category(rows: &[FeedRow]) -> Vec<GroupStats> {
    let mut stats = group_stats(rows, |r| row_category(r).to_string());
    stats.sort_by(|a, b| a.name.cmp(&b.name));
    stats
}

/// Sources ranked by mean hype, worst first.
pub fn worst_offenders(rows: &[FeedRow]) -> Vec<GroupStats> {
    let mut stats = group_stats(rows, row_source);
    stats.sort_by(|a, b| {
        b.mean_hype
            .partial_cmp(&a.mean_hype)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    stats
}

/// Load, filter and render the feed.
///
/// The Markdown goes to `output` when given, to stdout otherwise.
#[instrument(level = "info", skip_all, fields(input = %input.display(), filter = ?filter, analytics = analytics))]
pub async fn run_feed(
    input: &Path,
    filter: &FeedFilter,
    analytics: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let rows = load_feed(input).await?;
    let stories = filter.apply(&rows);
    let page = FeedPage {
        metrics: compute_metrics(&rows, &stories),
        analytics: analytics.then(|| (hype_by_category(&rows), worst_offenders(&rows))),
        stories,
    };
    info!(shown = page.stories.len(), total = rows.len(), "Rendering feed");
    let md = render_feed(&page)?;

    match output {
        Some(path) => {
            tokio::fs::write(path, md).await?;
            info!(path = %path.display(), "Wrote feed Markdown");
        }
        None => print!("{md}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: usize, hype: u8, category: &str, link: &str) -> FeedRow {
        serde_json::from_value(json!({
            "cluster_id": id,
            "new_title": format!("story {id}"),
            "hype_score": hype,
            "category": category,
            "original_link": link,
        }))
        .unwrap()
    }

    fn sample() -> Vec<FeedRow> {
        vec![
            row(0, 9, "Tech", "https://www.wired.com/a"),
            row(1, 2, "Science", "https://www.nasa.gov/b"),
            row(2, 5, "Tech", "https://techcrunch.com/c"),
            row(3, 8, "Tech", "https://www.wired.com/d"),
        ]
    }

    #[test]
    fn test_hype_band() {
        assert_eq!(HypeBand::for_score(10), HypeBand::Red);
        assert_eq!(HypeBand::for_score(8), HypeBand::Red);
        assert_eq!(HypeBand::for_score(7), HypeBand::Orange);
        assert_eq!(HypeBand::for_score(5), HypeBand::Orange);
        assert_eq!(HypeBand::for_score(4), HypeBand::Green);
        assert_eq!(HypeBand::for_score(1).to_string(), "green");
    }

    #[test]
    fn test_filter() {
        let rows = sample();
        assert_eq!(FeedFilter::default().apply(&rows).len(), 4);

        let tech = FeedFilter { category: Some("tech".into()), ..Default::default() };
        assert_eq!(tech.apply(&rows).len(), 3);

        let calm = FeedFilter { max_hype: 5, ..Default::default() };
        let ids: Vec<usize> = calm.apply(&rows).iter().map(|r| r.cluster_id).collect();
        assert_eq!(ids, vec![1, 2]);

        let wired = FeedFilter { source: Some("wired.com".into()), max_hype: 8, ..Default::default() };
        let ids: Vec<usize> = wired.apply(&rows).iter().map(|r| r.cluster_id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn test_metrics() {
        let rows = sample();
        let shown = FeedFilter { max_hype: 5, ..Default::default() }.apply(&rows);
        let m = compute_metrics(&rows, &shown);
        assert_eq!(m.articles, 2);
        assert_eq!(m.avg_hype, Some(3.5));
        assert_eq!(m.clickbait_avoided, 2);
        assert_eq!(m.sources_tracked, 3);
    }

    #[test]
    fn test_metrics_empty() {
        let m = compute_metrics(&[], &[]);
        assert_eq!(m.articles, 0);
        assert_eq!(m.avg_hype, None);
    }

    #[test]
    fn test_analytics() {
        let rows = sample();
        let cats = hype_by_category(&rows);
        assert_eq!(cats.len(), 2);
        assert_eq!(cats[0].name, "Science");
        assert_eq!(cats[1], GroupStats { name: "Tech".into(), count: 3, mean_hype: 22.0 / 3.0 });

        let worst = worst_offenders(&rows);
        let names: Vec<&str> = worst.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["wired.com", "techcrunch.com", "nasa.gov"]);
        assert_eq!(worst[0].mean_hype, 8.5);
    }

    #[tokio::test]
    async fn test_run_feed_writes_markdown() {
        let dir = std::env::temp_dir().join(format!("no_hype_feed_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("final_feed.json");
        let output = dir.join("feed.md");
        std::fs::write(&input, serde_json::to_vec(&sample()).unwrap()).unwrap();

        let filter = FeedFilter { category: Some("Science".into()), ..Default::default() };
        run_feed(&input, &filter, true, Some(&output)).await.unwrap();
        let md = std::fs::read_to_string(&output).unwrap();
        assert!(md.contains("## story 1"));
        assert!(!md.contains("## story 0"));
        assert!(md.contains("Worst Offenders"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_load_feed_missing_is_empty() {
        let path = std::env::temp_dir().join("no_hype_feed_does_not_exist.json");
        assert!(load_feed(&path).await.unwrap().is_empty());
    }
}

//! Markdown rendering of the feed view.
//!
//! The page has three parts: the headline metrics, one card per story, and
//! (optionally) the hype analytics tables.

use crate::feed::{FeedMetrics, GroupStats, HypeBand, row_source};
use crate::models::FeedRow;
use std::fmt::{self, Write};

/// Everything the page shows.
#[derive(Debug)]
pub struct FeedPage<'a> {
    pub metrics: FeedMetrics,
    pub stories: Vec<&'a FeedRow>,
    /// Hype by category and worst offenders, when analytics were requested.
    pub analytics: Option<(Vec<GroupStats>, Vec<GroupStats>)>,
}

fn write_metrics(md: &mut String, m: &FeedMetrics) -> fmt::Result {
    writeln!(md, "# The No-Hype News Feed\n")?;
    writeln!(md, "| Articles | Avg Hype Score | Clickbait Avoided | Sources Tracked |")?;
    writeln!(md, "|---|---|---|---|")?;
    let avg = m
        .avg_hype
        .map(|a| format!("{a:.1}/10"))
        .unwrap_or_else(|| "-".to_string());
    writeln!(
        md,
        "| {} | {} | {} | {} |\n",
        m.articles, avg, m.clickbait_avoided, m.sources_tracked
    )
}

fn write_card(md: &mut String, row: &FeedRow) -> fmt::Result {
    let title = row.new_title().unwrap_or("(untitled)");
    writeln!(md, "## {title}\n")?;
    writeln!(
        md,
        "*{} • {}*\n",
        row_source(row),
        row.category().unwrap_or("Uncategorized")
    )?;
    if let Some(score) = row.hype_score() {
        writeln!(md, "**Hype Score:** {score}/10 ({})\n", HypeBand::for_score(score))?;
    }
    if let Some(original) = row.original_title() {
        writeln!(md, "- **Original Title:** *{original}*")?;
    }
    if let Some(element) = row.clickbait_element() {
        writeln!(md, "- **Clickbait Element:** `{element}`")?;
    }
    if let Some(fact) = row.main_fact() {
        writeln!(md, "- **Core Fact:** {fact}")?;
    }
    if let Some(link) = row.original_link() {
        writeln!(md, "- [Read Full Article]({link})")?;
    }
    writeln!(md, "\n---\n")
}

fn write_analytics(md: &mut String, by_category: &[GroupStats], offenders: &[GroupStats]) -> fmt::Result {
    writeln!(md, "# Hype Analytics\n")?;

    writeln!(md, "## Hype by Category\n")?;
    writeln!(md, "| Category | Articles | Mean Hype |")?;
    writeln!(md, "|---|---|---|")?;
    for s in by_category {
        writeln!(md, "| {} | {} | {:.1} |", s.name, s.count, s.mean_hype)?;
    }

    writeln!(md, "\n## Worst Offenders (Avg Hype Score)\n")?;
    writeln!(md, "| Source | Articles | Mean Hype |")?;
    writeln!(md, "|---|---|---|")?;
    for s in offenders {
        writeln!(md, "| {} | {} | {:.1} |", s.name, s.count, s.mean_hype)?;
    }
    Ok(())
}

/// Render the page as Markdown.
pub fn render_feed(page: &FeedPage<'_>) -> Result<String, fmt::Error> {
    let mut md = String::new();
    write_metrics(&mut md, &page.metrics)?;

    if page.stories.is_empty() {
        writeln!(md, "_No stories match the current filters._\n")?;
    }
    for row in &page.stories {
        write_card(&mut md, row)?;
    }

    if let Some((by_category, offenders)) = &page.analytics {
        write_analytics(&mut md, by_category, offenders)?;
    }
    Ok(md)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn story() -> FeedRow {
        serde_json::from_value(json!({
            "cluster_id": 0,
            "new_title": "NASA schedules launch",
            "original_title": "NASA's SHOCKING new plan",
            "clickbait_element": "SHOCKING",
            "main_fact": "A launch is scheduled",
            "hype_score": 8,
            "category": "Science",
            "original_link": "https://www.nasa.gov/launch"
        }))
        .unwrap()
    }

    fn metrics(articles: usize, avg_hype: Option<f64>) -> FeedMetrics {
        FeedMetrics { articles, avg_hype, clickbait_avoided: 1, sources_tracked: 1 }
    }

    #[test]
    fn test_render_card() {
        let row = story();
        let page = FeedPage { metrics: metrics(1, Some(8.0)), stories: vec![&row], analytics: None };
        let md = render_feed(&page).unwrap();
        assert!(md.contains("| 1 | 8.0/10 | 1 | 1 |"));
        assert!(md.contains("## NASA schedules launch"));
        assert!(md.contains("*nasa.gov • Science*"));
        assert!(md.contains("**Hype Score:** 8/10 (red)"));
        assert!(md.contains("`SHOCKING`"));
        assert!(md.contains("[Read Full Article](https://www.nasa.gov/launch)"));
        assert!(!md.contains("Hype Analytics"));
    }

    #[test]
    fn test_render_empty_with_analytics() {
        let page = FeedPage {
            metrics: metrics(0, None),
            stories: vec![],
            analytics: Some((
                vec![GroupStats { name: "Tech".into(), count: 2, mean_hype: 6.5 }],
                vec![GroupStats { name: "wired.com".into(), count: 2, mean_hype: 6.5 }],
            )),
        };
        let md = render_feed(&page).unwrap();
        assert!(md.contains("| 0 | - |"));
        assert!(md.contains("No stories match"));
        assert!(md.contains("| Tech | 2 | 6.5 |"));
        assert!(md.contains("| wired.com | 2 | 6.5 |"));
    }
}

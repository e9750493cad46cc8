//! Data models for each stage of the pipeline.
//!
//! - [`ScrapedArticle`]: raw feed item as fetched from an RSS/Atom source
//! - [`ArticleAnalysis`]: the LLM's structured reply for one headline
//! - [`ProcessedArticle`]: analysis plus the original title and link, one row of
//!   `processed_news.json`
//! - [`Article`]: a validated row handed to the deduplication core
//! - [`FeedRow`]: one surviving story in `final_feed.json`
//!
//! The core never looks inside the pass-through fields of a row. It reads
//! `new_title` and `hype_score` and carries the rest of the JSON object along
//! untouched, so columns added upstream survive into the final feed.

use crate::error::RowError;
use crate::utils::source_domain;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw item as scraped from a news feed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScrapedArticle {
    /// Display name of the feed (e.g. "Ars Technica").
    pub source: String,
    pub title: String,
    pub link: String,
    /// RFC 3339 publication timestamp, or `"N/A"` when the feed gives none.
    pub published: String,
    /// Summary with HTML tags stripped.
    pub summary: String,
    /// RFC 3339 timestamp of when the item was fetched.
    pub scraped_at: String,
}

/// The LLM's structured analysis of one headline.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleAnalysis {
    /// The part of the original title that is hype, if any.
    #[serde(default)]
    pub clickbait_element: Option<String>,
    /// The core piece of information the article conveys.
    pub main_fact: String,
    /// A dry, factual rewrite of the main fact.
    pub new_title: String,
    /// 1 (factual) to 10 (pure clickbait), rating the original title.
    pub hype_score: u8,
    pub category: String,
}

/// One row of `processed_news.json`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProcessedArticle {
    #[serde(flatten)]
    pub analysis: ArticleAnalysis,
    pub original_title: String,
    pub original_link: String,
    pub source: String,
}

impl ProcessedArticle {
    pub fn new(analysis: ArticleAnalysis, scraped: &ScrapedArticle) -> Self {
        Self {
            analysis,
            original_title: scraped.title.clone(),
            original_link: scraped.link.clone(),
            source: scraped.source.clone(),
        }
    }
}

/// A validated input row for the deduplication core.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// 0-based position of the row in the input table. Used as the canonical
    /// tie-break when two articles share a hype score.
    pub id: usize,
    /// The factual rewritten title; this is what gets embedded.
    pub new_title: String,
    pub hype_score: u8,
    /// The full input row, carried through unchanged.
    pub fields: Map<String, Value>,
}

impl Article {
    /// Validate one input row.
    ///
    /// A row must be an object with a non-blank `new_title` and a `hype_score`
    /// between 1 and 10. Scores written as `7.0` or `"7"` are accepted since
    /// tabular tooling upstream tends to produce both.
    pub fn from_row(id: usize, row: Value) -> Result<Self, RowError> {
        let Value::Object(fields) = row else {
            return Err(RowError::NotAnObject);
        };

        let new_title = match fields.get("new_title") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return Err(RowError::MissingField("new_title")),
        };

        let hype_score = match fields.get("hype_score") {
            None | Some(Value::Null) => return Err(RowError::MissingField("hype_score")),
            Some(v) => parse_hype_score(v).ok_or_else(|| RowError::InvalidHypeScore(v.clone()))?,
        };

        Ok(Self {
            id,
            new_title,
            hype_score,
            fields,
        })
    }

    /// Text handed to the embedding provider.
    pub fn text_for_embedding(&self) -> &str {
        &self.new_title
    }

    /// Build the output row for this article under the given cluster.
    pub fn to_feed_row(&self, cluster_id: usize) -> FeedRow {
        let mut fields = self.fields.clone();
        // A stale id from an earlier run must not shadow the one assigned now.
        fields.remove("cluster_id");
        FeedRow { cluster_id, fields }
    }
}

/// Interpret a JSON value as a hype score in `1..=10`.
pub fn parse_hype_score(value: &Value) -> Option<u8> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.fract() != 0.0 || !(1.0..=10.0).contains(&n) {
        return None;
    }
    Some(n as u8)
}

/// One surviving story in the deduplicated feed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeedRow {
    /// Opaque grouping id; useful for auditing which stories were merged.
    pub cluster_id: usize,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl FeedRow {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn new_title(&self) -> Option<&str> {
        self.str_field("new_title")
    }

    pub fn original_title(&self) -> Option<&str> {
        self.str_field("original_title")
    }

    pub fn original_link(&self) -> Option<&str> {
        self.str_field("original_link")
    }

    pub fn main_fact(&self) -> Option<&str> {
        self.str_field("main_fact")
    }

    pub fn category(&self) -> Option<&str> {
        self.str_field("category")
    }

    /// The clickbait element, treating an empty string as absent.
    pub fn clickbait_element(&self) -> Option<&str> {
        self.str_field("clickbait_element")
            .filter(|s| !s.trim().is_empty())
    }

    pub fn hype_score(&self) -> Option<u8> {
        self.fields.get("hype_score").and_then(parse_hype_score)
    }

    /// Host of `original_link` with any leading `www.` removed.
    ///
    /// For example: `"https://www.theverge.com/2025/1/1/story"` -> `"theverge.com"`
    pub fn source_domain(&self) -> Option<String> {
        self.original_link().and_then(source_domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_article_from_complete_row() {
        let row = json!({
            "new_title": "  Company releases quarterly earnings report ",
            "hype_score": 3,
            "category": "Business",
            "original_link": "https://example.com/a"
        });
        let article = Article::from_row(4, row).unwrap();
        assert_eq!(article.id, 4);
        assert_eq!(article.new_title, "Company releases quarterly earnings report");
        assert_eq!(article.hype_score, 3);
        assert_eq!(article.fields["category"], "Business");
    }

    #[test]
    fn test_article_missing_new_title() {
        let err = Article::from_row(0, json!({"hype_score": 5})).unwrap_err();
        assert_eq!(err, RowError::MissingField("new_title"));

        let err = Article::from_row(0, json!({"new_title": "   ", "hype_score": 5})).unwrap_err();
        assert_eq!(err, RowError::MissingField("new_title"));
    }

    #[test]
    fn test_article_missing_hype_score() {
        let err = Article::from_row(0, json!({"new_title": "A"})).unwrap_err();
        assert_eq!(err, RowError::MissingField("hype_score"));

        let err = Article::from_row(0, json!({"new_title": "A", "hype_score": null})).unwrap_err();
        assert_eq!(err, RowError::MissingField("hype_score"));
    }

    #[test]
    fn test_article_invalid_hype_score() {
        for bad in [json!(0), json!(11), json!(7.5), json!("high"), json!([7])] {
            let err = Article::from_row(0, json!({"new_title": "A", "hype_score": bad.clone()}))
                .unwrap_err();
            assert_eq!(err, RowError::InvalidHypeScore(bad));
        }
    }

    #[test]
    fn test_article_row_not_object() {
        assert_eq!(
            Article::from_row(0, json!("just a string")).unwrap_err(),
            RowError::NotAnObject
        );
    }

    #[test]
    fn test_parse_hype_score_lenient_forms() {
        assert_eq!(parse_hype_score(&json!(7)), Some(7));
        assert_eq!(parse_hype_score(&json!(7.0)), Some(7));
        assert_eq!(parse_hype_score(&json!(" 10 ")), Some(10));
        assert_eq!(parse_hype_score(&json!(1)), Some(1));
        assert_eq!(parse_hype_score(&json!(-3)), None);
    }

    #[test]
    fn test_feed_row_keeps_pass_through_fields() {
        let article = Article::from_row(
            2,
            json!({
                "new_title": "NASA schedules launch",
                "hype_score": 2,
                "original_title": "You won't BELIEVE what NASA just did",
                "cluster_id": 99,
                "extra_column": {"nested": true}
            }),
        )
        .unwrap();

        let row = article.to_feed_row(5);
        assert_eq!(row.cluster_id, 5);
        assert!(!row.fields.contains_key("cluster_id"));
        assert_eq!(row.fields["extra_column"], json!({"nested": true}));

        let serialized = serde_json::to_value(&row).unwrap();
        assert_eq!(serialized["cluster_id"], 5);
        assert_eq!(serialized["new_title"], "NASA schedules launch");
        assert_eq!(
            serialized["original_title"],
            "You won't BELIEVE what NASA just did"
        );
    }

    #[test]
    fn test_feed_row_accessors() {
        let row: FeedRow = serde_json::from_value(json!({
            "cluster_id": 1,
            "new_title": "Title",
            "hype_score": "8",
            "clickbait_element": "",
            "category": "Tech",
            "original_link": "https://www.wired.com/story/x"
        }))
        .unwrap();
        assert_eq!(row.hype_score(), Some(8));
        assert_eq!(row.clickbait_element(), None);
        assert_eq!(row.category(), Some("Tech"));
        assert_eq!(row.source_domain().as_deref(), Some("wired.com"));
    }

    #[test]
    fn test_processed_article_serialization_is_flat() {
        let scraped = ScrapedArticle {
            source: "Wired".into(),
            title: "SHOCKING: new phone".into(),
            link: "https://wired.com/p".into(),
            published: "N/A".into(),
            summary: String::new(),
            scraped_at: "2025-05-06T08:00:00Z".into(),
        };
        let analysis = ArticleAnalysis {
            clickbait_element: Some("SHOCKING".into()),
            main_fact: "A phone was released".into(),
            new_title: "Company releases new phone".into(),
            hype_score: 8,
            category: "Tech".into(),
        };
        let value = serde_json::to_value(ProcessedArticle::new(analysis, &scraped)).unwrap();
        assert_eq!(value["new_title"], "Company releases new phone");
        assert_eq!(value["original_title"], "SHOCKING: new phone");
        assert_eq!(value["hype_score"], 8);
        assert!(value.get("analysis").is_none());
    }

    #[test]
    fn test_analysis_without_clickbait_element() {
        let analysis: ArticleAnalysis = serde_json::from_str(
            r#"{"main_fact":"f","new_title":"t","hype_score":1,"category":"Science"}"#,
        )
        .unwrap();
        assert_eq!(analysis.clickbait_element, None);
    }
}

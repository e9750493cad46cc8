//! Headline rewriting: the second stage of the pipeline.
//!
//! Each scraped article is sent to the LLM with the `hype_editor` chat
//! template. The model rates how sensational the original title is, names
//! the clickbait phrase, and writes a dry factual replacement title. Replies
//! are parsed into [`ArticleAnalysis`] and written to `processed_news.json`.
//!
//! Failed articles are logged and skipped. A reply that was cut off mid-JSON
//! is asked for once more before giving up.

use crate::api::{AskAsync, AskFnWrapper, RetryAsk};
use crate::models::{ArticleAnalysis, ProcessedArticle, ScrapedArticle};
use crate::retry::Backoff;
use crate::utils::{looks_truncated, read_json, truncate_for_log, write_json_atomic};
use awful_aj::{config, config_dir, template};
use futures::stream::{self, StreamExt};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

/// Articles analysed at the same time.
pub const PARALLEL_BATCH_SIZE: usize = 12;

/// Name of the `awful_aj` chat template holding the editor persona.
pub const TEMPLATE_NAME: &str = "hype_editor";

/// Build the user prompt for one article.
pub fn build_prompt(article: &ScrapedArticle) -> String {
    format!(
        "Input Title: {}\nInput Summary: {}",
        article.title, article.summary
    )
}

/// Parse the model's reply.
///
/// Models like to wrap JSON in a markdown code fence; the fence is removed
/// before parsing.
pub fn parse_analysis(reply: &str) -> Result<ArticleAnalysis, serde_json::Error> {
    let trimmed = reply.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(body.trim())
}

/// Ask about one article, re-asking once if the reply was truncated.
#[instrument(level = "info", skip_all, fields(index = index, title = %truncate_for_log(&article.title, 60)))]
async fn analyze_article<A>(llm: &A, index: usize, article: &ScrapedArticle) -> Option<ProcessedArticle>
where
    A: AskAsync<Response = String>,
{
    let prompt = build_prompt(article);

    let reply = match llm.ask(&prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(index, source = %article.source, error = %e, "API call failed; skipping article");
            return None;
        }
    };

    let mut parsed = parse_analysis(&reply);
    if let Err(ref e) = parsed {
        if looks_truncated(e) {
            warn!(index, error = %e, "EOF while parsing; re-asking once");
            match llm.ask(&prompt).await {
                Ok(r2) => parsed = parse_analysis(&r2),
                Err(e2) => warn!(index, error = %e2, "Re-ask failed; will skip article"),
            }
        }
    }

    match parsed {
        Ok(analysis) if !(1..=10).contains(&analysis.hype_score) => {
            warn!(index, hype_score = analysis.hype_score, "Hype score out of range; skipping article");
            None
        }
        Ok(analysis) => {
            debug!(index, hype_score = analysis.hype_score, "Successfully processed article");
            Some(ProcessedArticle::new(analysis, article))
        }
        Err(e) => {
            warn!(
                index,
                error = %e,
                response_preview = %truncate_for_log(&reply, 300),
                "Model returned non-conforming JSON; skipping article"
            );
            None
        }
    }
}

/// Analyse up to `limit` articles, `parallel` at a time, keeping input order.
#[instrument(level = "info", skip_all, fields(total = articles.len(), limit = limit, parallel = parallel))]
pub async fn process_articles<A>(
    llm: &A,
    articles: &[ScrapedArticle],
    limit: usize,
    parallel: usize,
) -> Vec<ProcessedArticle>
where
    A: AskAsync<Response = String>,
{
    let subset = &articles[..articles.len().min(limit)];

    let results: Vec<Option<ProcessedArticle>> = stream::iter(subset.iter().enumerate())
        .map(|(i, article)| analyze_article(llm, i, article))
        .buffered(parallel.max(1))
        .collect()
        .await;

    let processed: Vec<ProcessedArticle> = results.into_iter().flatten().collect();
    info!(
        total = subset.len(),
        successful = processed.len(),
        failed = subset.len() - processed.len(),
        "Completed parallel article processing"
    );
    processed
}

/// The newest `news_data_*.json` in `dir`, judged by its date-stamped name.
pub async fn latest_news_data(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut latest: Option<PathBuf> = None;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !(name.starts_with("news_data_") && name.ends_with(".json")) {
            continue;
        }
        let path = entry.path();
        if latest.as_ref().is_none_or(|l| l.file_name() < path.file_name()) {
            latest = Some(path);
        }
    }
    Ok(latest)
}

/// Run the `process` stage end to end.
///
/// When `input` is `None`, the latest scrape under `data_dir` is used.
/// Returns the number of articles written.
#[instrument(level = "info", skip_all)]
pub async fn run_process(
    input: Option<&Path>,
    data_dir: &Path,
    output: &Path,
    config_path: Option<&Path>,
    limit: usize,
) -> Result<usize, Box<dyn Error>> {
    let input = match input {
        Some(p) => p.to_path_buf(),
        None => latest_news_data(data_dir)
            .await?
            .ok_or_else(|| format!("no news_data_*.json found in {}", data_dir.display()))?,
    };
    info!(path = %input.display(), "Loading scraped articles");
    let articles: Vec<ScrapedArticle> = read_json(&input).await?;

    let template = template::load_template(TEMPLATE_NAME).await?;
    info!(template = TEMPLATE_NAME, "Loaded template");
    let conf_file = match config_path {
        Some(p) => p.to_path_buf(),
        None => config_dir()?.join("config.yaml"),
    };
    let conf_str = conf_file
        .to_str()
        .ok_or_else(|| format!("not a valid config filename: {}", conf_file.display()))?;
    let config = config::load_config(conf_str)?;
    info!(config_path = conf_str, "Loaded configuration");

    let llm = RetryAsk::new(
        AskFnWrapper {
            config: &config,
            template: &template,
        },
        Backoff::default(),
    );
    let processed = process_articles(&llm, &articles, limit, PARALLEL_BATCH_SIZE).await;

    write_json_atomic(&processed, output).await?;
    info!(path = %output.display(), count = processed.len(), "Saved processed articles");
    Ok(processed.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Replies keyed by prompt; each key holds a queue of replies.
    struct Scripted {
        replies: Mutex<HashMap<String, Vec<Result<String, String>>>>,
    }

    impl Scripted {
        fn new(pairs: Vec<(&ScrapedArticle, Vec<Result<&str, &str>>)>) -> Self {
            let replies = pairs
                .into_iter()
                .map(|(a, rs)| {
                    let rs = rs
                        .into_iter()
                        .rev()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect();
                    (build_prompt(a), rs)
                })
                .collect();
            Self { replies: Mutex::new(replies) }
        }
    }

    impl AskAsync for Scripted {
        type Response = String;

        async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
            let next = self
                .replies
                .lock()
                .unwrap()
                .get_mut(text)
                .and_then(|q| q.pop());
            match next {
                Some(Ok(r)) => Ok(r),
                Some(Err(e)) => Err(e.into()),
                None => Err("no scripted reply".into()),
            }
        }
    }

    fn scraped(title: &str) -> ScrapedArticle {
        ScrapedArticle {
            source: "Wired".into(),
            title: title.into(),
            link: format!("https://wired.com/{}", title.len()),
            published: "N/A".into(),
            summary: format!("About {title}"),
            scraped_at: "2025-01-01T00:00:00Z".into(),
        }
    }

    const GOOD: &str = r#"{"clickbait_element":"SHOCKING","main_fact":"A phone shipped","new_title":"Company ships phone","hype_score":8,"category":"Tech"}"#;

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt(&scraped("SHOCKING phone"));
        assert_eq!(prompt, "Input Title: SHOCKING phone\nInput Summary: About SHOCKING phone");
    }

    #[test]
    fn test_parse_analysis_fenced() {
        let fenced = format!("```json\n{GOOD}\n```");
        assert_eq!(parse_analysis(&fenced).unwrap().hype_score, 8);
        assert_eq!(parse_analysis(GOOD).unwrap().new_title, "Company ships phone");
        assert!(parse_analysis("not json").is_err());
    }

    #[tokio::test]
    async fn test_process_articles_keeps_order_and_skips_failures() {
        let a = scraped("first");
        let b = scraped("second story");
        let c = scraped("third one here");
        let llm = Scripted::new(vec![
            (&a, vec![Ok(GOOD)]),
            (&b, vec![Err("api down")]),
            (&c, vec![Ok(r#"{"main_fact":"f","new_title":"Third","hype_score":2,"category":"Science"}"#)]),
        ]);

        let out = process_articles(&llm, &[a.clone(), b, c.clone()], 200, 3).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].original_title, "first");
        assert_eq!(out[0].source, "Wired");
        assert_eq!(out[1].analysis.new_title, "Third");
        assert_eq!(out[1].original_link, c.link);
    }

    #[tokio::test]
    async fn test_truncated_reply_is_re_asked_once() {
        let a = scraped("cut off");
        let llm = Scripted::new(vec![(&a, vec![Ok(r#"{"main_fact": "A ph"#), Ok(GOOD)])]);
        let out = process_articles(&llm, &[a], 200, 1).await;
        assert_eq!(out.len(), 1);

        let b = scraped("cut twice");
        let trunc = r#"{"main_fact": "A ph"#;
        let llm = Scripted::new(vec![(&b, vec![Ok(trunc), Ok(trunc), Ok(GOOD)])]);
        assert!(process_articles(&llm, &[b], 200, 1).await.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_score_skipped() {
        let a = scraped("eleven");
        let llm = Scripted::new(vec![(
            &a,
            vec![Ok(r#"{"main_fact":"f","new_title":"t","hype_score":11,"category":"x"}"#)],
        )]);
        assert!(process_articles(&llm, &[a], 200, 1).await.is_empty());
    }

    #[tokio::test]
    async fn test_limit_applies() {
        let articles: Vec<ScrapedArticle> = ["a", "bb", "ccc"].iter().map(|t| scraped(t)).collect();
        let llm = Scripted::new(articles.iter().map(|a| (a, vec![Ok(GOOD)])).collect());
        assert_eq!(process_articles(&llm, &articles, 2, 12).await.len(), 2);
    }

    #[tokio::test]
    async fn test_latest_news_data() {
        let dir = std::env::temp_dir().join(format!("no_hype_process_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        assert_eq!(latest_news_data(&dir).await.unwrap(), None);

        for name in ["news_data_20250101.json", "news_data_20250309.json", "processed_news.json"] {
            std::fs::write(dir.join(name), "[]").unwrap();
        }
        let latest = latest_news_data(&dir).await.unwrap().unwrap();
        assert_eq!(latest.file_name().unwrap(), "news_data_20250309.json");

        let _ = std::fs::remove_dir_all(&dir);
    }
}

//! Command-line interface definitions for No-Hype News.
//!
//! Each pipeline stage is a subcommand. Tunables can be given as flags or
//! environment variables (a `.env` file is honoured too).

use crate::cluster::KeepStrategy;
use crate::dedup::DedupConfig;
use crate::feed::FeedFilter;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the No-Hype News pipeline.
///
/// # Examples
///
/// ```sh
/// no_hype_news scrape
/// no_hype_news process --limit 50
/// no_hype_news dedup --eps 0.35
/// no_hype_news feed --max-hype 6 --analytics
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the configured RSS/Atom feeds into news_data_YYYYMMDD.json
    Scrape(ScrapeArgs),
    /// Rewrite headlines and rate their hype with the LLM
    Process(ProcessArgs),
    /// Collapse near-duplicate stories into one row each
    Dedup(DedupArgs),
    /// Render the deduplicated feed as Markdown
    Feed(FeedArgs),
}

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// YAML file replacing the built-in feed list
    #[arg(long, env = "FEED_LIST")]
    pub feeds: Option<PathBuf>,

    /// Directory for the news_data_YYYYMMDD.json file
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Scraped articles to process (defaults to the newest news_data_*.json in --data-dir)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory searched for scraped articles when --input is not given
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,

    #[arg(short, long, default_value = "processed_news.json")]
    pub output: PathBuf,

    /// Optional path to the awful_aj config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum number of articles sent to the LLM
    #[arg(long, default_value_t = 200)]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct DedupArgs {
    #[arg(short, long, default_value = "processed_news.json")]
    pub input: PathBuf,

    #[arg(short, long, default_value = "final_feed.json")]
    pub output: PathBuf,

    /// Maximum cosine distance for two titles to count as the same story (0 to 2)
    #[arg(long, env = "DEDUP_EPS", default_value_t = 0.4)]
    pub eps: f32,

    /// Which article of a duplicate group is kept
    #[arg(long, value_enum, default_value_t = KeepStrategy::LowestHype)]
    pub keep: KeepStrategy,

    #[arg(long, env = "EMBEDDING_MODEL", default_value = "text-embedding-3-small")]
    pub embedding_model: String,

    /// Base URL of an OpenAI-compatible embeddings API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub embedding_base_url: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Titles per embedding request
    #[arg(long, default_value_t = 512)]
    pub embed_batch_size: usize,

    /// Embedding requests in flight at once
    #[arg(long, default_value_t = 4)]
    pub embed_concurrency: usize,

    /// Retries for a transient embedding failure
    #[arg(long, default_value_t = 5)]
    pub max_retries: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,
}

impl DedupArgs {
    pub fn config(&self) -> DedupConfig {
        DedupConfig {
            eps: self.eps,
            keep: self.keep,
            batch_size: self.embed_batch_size,
            concurrency: self.embed_concurrency,
        }
    }
}

#[derive(Args, Debug)]
pub struct FeedArgs {
    #[arg(short, long, default_value = "final_feed.json")]
    pub input: PathBuf,

    /// Only show this category
    #[arg(long)]
    pub category: Option<String>,

    /// Only show this source domain (e.g. wired.com)
    #[arg(long)]
    pub source: Option<String>,

    /// Hide stories scoring above this
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_hype: u8,

    /// Append hype-by-category and worst-offender tables
    #[arg(long)]
    pub analytics: bool,

    /// Write the Markdown here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl FeedArgs {
    pub fn filter(&self) -> FeedFilter {
        FeedFilter {
            category: self.category.clone(),
            source: self.source.clone(),
            max_hype: self.max_hype,
        }
    }
}

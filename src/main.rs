//! # No-Hype News
//!
//! A news pipeline that scrapes tech and science feeds, has an LLM rewrite
//! each sensational headline into a dry factual one, collapses reports of the
//! same story into a single entry, and renders the result as a calm feed.
//!
//! ## Usage
//!
//! ```sh
//! no_hype_news scrape
//! no_hype_news process
//! no_hype_news dedup
//! no_hype_news feed --analytics
//! ```
//!
//! ## Architecture
//!
//! 1. **Scrape**: fetch RSS/Atom feeds into `news_data_YYYYMMDD.json`
//! 2. **Process**: rate and rewrite headlines (12 at a time) into `processed_news.json`
//! 3. **Dedup**: embed the rewritten titles, cluster them by cosine distance and keep
//!    the least hyped article per story in `final_feed.json`
//! 4. **Feed**: filter the feed and render metrics, story cards and analytics

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod cluster;
mod dedup;
mod embeddings;
mod error;
mod feed;
mod ingest;
mod models;
mod outputs;
mod processor;
mod retry;
mod scrapers;
mod utils;

use cli::{Cli, Command, DedupArgs};
use embeddings::{OpenAiEmbedder, RetryEmbed};
use error::DedupError;
use retry::Backoff;

/// Run deduplication, building the retrying embedding client on first need.
async fn dedup_command(args: &DedupArgs) -> Result<(), DedupError> {
    let connect = || -> Result<_, DedupError> {
        let embedder = OpenAiEmbedder::new(
            args.api_key.as_deref().unwrap_or_default(),
            &args.embedding_base_url,
            args.embedding_model.as_str(),
            Duration::from_secs(args.timeout_secs),
        )?;
        info!(model = %embedder.model(), base_url = %args.embedding_base_url, "Embedding provider ready");
        Ok(RetryEmbed::new(embedder, Backoff::new(args.max_retries, Duration::from_secs(1))))
    };

    dedup::run_dedup(connect, &args.input, &args.output, &args.config()).await?;
    Ok(())
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "Loaded .env");
    }

    let start_time = std::time::Instant::now();
    let args = Cli::parse();

    match &args.command {
        Command::Scrape(a) => {
            let path = scrapers::run_scrape(a.feeds.as_deref(), &a.output_dir).await?;
            info!(path = %path.display(), "Scrape finished");
        }
        Command::Process(a) => {
            let count = processor::run_process(
                a.input.as_deref(),
                &a.data_dir,
                &a.output,
                a.config.as_deref(),
                a.limit,
            )
            .await?;
            info!(count, path = %a.output.display(), "Process finished");
        }
        Command::Dedup(a) => {
            if let Err(e) = dedup_command(a).await {
                error!(stage = %e.stage(), error = %e, "Deduplication failed");
                return Err(e.into());
            }
        }
        Command::Feed(a) => {
            feed::run_feed(&a.input, &a.filter(), a.analytics, a.output.as_deref()).await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

//! Utility functions for string handling, URLs and the file system.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for logging
//! - JSON error detection for handling LLM response truncation
//! - HTML stripping for feed summaries
//! - Source domain extraction from article links
//! - JSON file reading and atomic writing

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};
use url::Url;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes (backed off to a char boundary) with
/// an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the LLM response is cut off by its token limit the reply fails to
/// parse with an EOF error; those are worth asking again.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Remove HTML markup from a feed summary and collapse whitespace.
pub fn strip_html(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let text = parsed.root_element().text().collect::<Vec<_>>().join(" ");
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Host of a URL with a leading `www.` stripped.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(source_domain("https://www.theverge.com/a").as_deref(), Some("theverge.com"));
/// assert_eq!(source_domain("not a url"), None);
/// ```
pub fn source_domain(link: &str) -> Option<String> {
    let parsed = Url::parse(link).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Read a JSON document from disk.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> io::Result<T> {
    let bytes = fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Serialize `value` as pretty JSON and move it into place atomically.
///
/// The document is written to a sibling `*.tmp` file first and renamed over
/// `path`, so a reader never sees a half-written feed and a failed run never
/// leaves a partial one behind.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_json_atomic<T: Serialize + ?Sized>(value: &T, path: &Path) -> io::Result<()> {
    let json = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let tmp = tmp_path(path);
    debug!(tmp = %tmp.display(), bytes = json.len(), "Writing temporary file");
    if let Err(e) = fs::write(&tmp, &json).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    info!(bytes = json.len(), "Wrote JSON file");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

//! Output Assembler: the deduplicated feed, the run summary and the
//! rendered feed page.
//!
//! # Submodules
//!
//! - [`json`]: builds the one-row-per-story table and writes `final_feed.json`
//! - [`summary`]: run-level counts and the duplicate preview, reported
//!   through `tracing` rather than written into the data
//! - [`markdown`]: the reader-facing page with metrics, story cards and
//!   analytics
//!
//! # Output Structure
//!
//! ```text
//! final_feed.json
//! [
//!   { "cluster_id": 0, "new_title": "...", "hype_score": 2, "category": "...", ... },
//!   { "cluster_id": 1, ... }
//! ]
//! ```

pub mod json;
pub mod markdown;
pub mod summary;

//! Embedding Batch Requester.
//!
//! Turns the ordered list of factual titles into an ordered list of vectors,
//! one per title. Positional alignment is the contract the clustering engine
//! relies on: vector `i` belongs to article `i`. Anything that would break it
//! (a short reply, a vector of the wrong length, a provider outage) aborts
//! the batch instead of letting misaligned vectors reach the clusterer.
//!
//! # Architecture
//!
//! - [`EmbedBatch`]: the narrow capability the core depends on
//! - [`OpenAiEmbedder`]: talks to an OpenAI-compatible `/embeddings` endpoint
//! - [`RetryEmbed`]: decorator adding exponential backoff on transient failures
//! - [`Batcher`]: splits titles into provider-sized chunks
//! - [`request_embeddings`]: fans the chunks out, reassembles them in input
//!   order and validates count and dimensionality

mod batcher;
mod openai;

pub use batcher::Batcher;
pub use openai::OpenAiEmbedder;

use crate::error::DedupError;
use crate::retry::Backoff;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::StatusCode;
use std::fmt;
use std::time::Instant;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// A dense embedding vector. Immutable once produced.
pub type Embedding = Vec<f32>;

/// Errors returned by an embedding provider.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("embedding provider returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("no API key configured for the embedding provider")]
    MissingApiKey,

    #[error("API key contains characters not allowed in a header")]
    InvalidApiKey,
}

impl EmbedError {
    /// Whether retrying the same request could succeed.
    ///
    /// Connection failures, timeouts, rate limiting and server errors are
    /// transient. Client errors and configuration problems are not.
    pub fn is_transient(&self) -> bool {
        match self {
            EmbedError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            EmbedError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            EmbedError::MissingApiKey | EmbedError::InvalidApiKey => false,
        }
    }
}

/// Maps an ordered batch of texts to an ordered batch of vectors.
///
/// Implementations must return exactly one vector per input text, in input
/// order. [`request_embeddings`] verifies this and refuses to proceed if the
/// provider gets it wrong.
pub trait EmbedBatch {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbedError>;
}

/// Wrapper that retries transient failures of any [`EmbedBatch`] with
/// exponential backoff and jitter.
pub struct RetryEmbed<T> {
    inner: T,
    backoff: Backoff,
}

impl<T: EmbedBatch> RetryEmbed<T> {
    pub fn new(inner: T, backoff: Backoff) -> Self {
        Self { inner, backoff }
    }
}

impl<T> fmt::Debug for RetryEmbed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryEmbed")
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl<T: EmbedBatch> EmbedBatch for RetryEmbed<T> {
    #[instrument(level = "info", skip_all, fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbedError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.embed_batch(texts).await {
                Ok(vectors) => return Ok(vectors),
                Err(e) if !e.is_transient() => {
                    error!(error = %e, "embed_batch() failed with a permanent error");
                    return Err(e);
                }
                Err(e) => {
                    attempt += 1;
                    if !self.backoff.allows(attempt) {
                        error!(
                            attempt,
                            max = self.backoff.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "embed_batch() exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff.delay_for(attempt);
                    warn!(
                        attempt,
                        max = self.backoff.max_retries,
                        ?delay,
                        error = %e,
                        "embed_batch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Embed every text, preserving input order.
///
/// Chunks are requested with at most `concurrency` calls in flight. The
/// stream is `buffered`, not `buffer_unordered`, so chunk results come back
/// in submission order regardless of which call finishes first.
///
/// # Errors
///
/// - [`DedupError::Embed`] if any chunk fails after retries
/// - [`DedupError::Alignment`] if the provider returns the wrong number of vectors
/// - [`DedupError::Dimension`] if the vectors disagree on dimensionality or
///   one is empty
#[instrument(level = "info", skip_all, fields(count = texts.len(), batch_size = batch_size, concurrency = concurrency))]
pub async fn request_embeddings<P: EmbedBatch>(
    provider: &P,
    texts: &[String],
    batch_size: usize,
    concurrency: usize,
) -> Result<Vec<Embedding>, DedupError> {
    if texts.is_empty() {
        info!("No titles to embed");
        return Ok(Vec::new());
    }

    let t0 = Instant::now();
    let chunks = Batcher::new(batch_size).split(texts);
    let chunk_count = chunks.len();

    let per_chunk: Vec<Vec<Embedding>> = stream::iter(chunks)
        .map(|chunk| async move {
            let vectors = provider.embed_batch(chunk).await?;
            if vectors.len() != chunk.len() {
                return Err(DedupError::Alignment {
                    expected: chunk.len(),
                    got: vectors.len(),
                });
            }
            Ok::<_, DedupError>(vectors)
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let embeddings: Vec<Embedding> = per_chunk.into_iter().flatten().collect();
    if embeddings.len() != texts.len() {
        return Err(DedupError::Alignment {
            expected: texts.len(),
            got: embeddings.len(),
        });
    }
    let dim = validate_dimensions(&embeddings)?;

    info!(
        count = embeddings.len(),
        dim,
        chunks = chunk_count,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Embeddings received"
    );
    Ok(embeddings)
}

/// Check every vector has the dimensionality of the first; returns it.
fn validate_dimensions(embeddings: &[Embedding]) -> Result<usize, DedupError> {
    let expected = embeddings.first().map(Vec::len).unwrap_or(0);
    for (index, vector) in embeddings.iter().enumerate() {
        if vector.len() != expected || vector.is_empty() {
            return Err(DedupError::Dimension {
                index,
                expected,
                got: vector.len(),
            });
        }
    }
    Ok(expected)
}

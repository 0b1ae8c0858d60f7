//! Collaborator traits for the pipeline's I/O edges.
//!
//! The pipeline only sees these traits; the arXiv implementations live in the
//! `preprint-alert-feed` and `preprint-alert-fetcher` crates.

use async_trait::async_trait;

use crate::error::{FetchError, Result};
use crate::types::{ExtendedContent, Paper, PaperId};

/// Yields today's candidate papers.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current day's papers. An empty feed is a valid result.
    async fn fetch_today(&self) -> Result<Vec<Paper>>;
}

/// Retrieves extended content for a single paper.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch and extract content for `id`. A failure is scoped to that paper.
    async fn fetch(&self, id: &PaperId) -> std::result::Result<ExtendedContent, FetchError>;
}

//! Source connector boundary: the trait the ingestion pipeline fetches
//! through, plus the HTTP feed implementation.
//!
//! Site-specific DOM scraping stays outside this crate; the feed endpoint
//! is the integration point.

pub mod feed;

use async_trait::async_trait;

use jobcast_core::Job;

pub use feed::FeedConnector;

/// Errors that can occur while fetching from a source.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned {status} for category '{category}'")]
    Status {
        status: reqwest::StatusCode,
        category: String,
    },

    #[error("connector not configured: {0}")]
    Unavailable(String),
}

/// Trait for job-posting sources.
///
/// One call fetches one category; failures are category-local and never
/// abort sibling fetches.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// Fetch current postings for `category`.
    ///
    /// `keywords` narrows the search at the source where supported;
    /// `lookback_hours` bounds how far back postings may date. May block on
    /// network I/O for the connector's configured timeout.
    async fn fetch(
        &self,
        category: &str,
        keywords: &[String],
        lookback_hours: u32,
    ) -> Result<Vec<Job>, ConnectorError>;

    /// Cheap availability check. Lifecycle start fails fast when this errors.
    async fn health_check(&self) -> Result<(), ConnectorError>;

    /// Human-readable source name for logs (e.g., "feed").
    fn source_name(&self) -> &str;
}

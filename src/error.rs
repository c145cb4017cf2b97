//! Error types for the review pipeline.

use thiserror::Error;

/// Pipeline-level failures. Any of these aborts the request.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid query {0:?}: must be non-empty and usable as a file name")]
    InvalidQuery(String),

    #[error("Network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Could not find product listings on the search page. HTML structure might have changed.")]
    NoListingsFound,

    #[error("No product listings left after skipping {skipped} of {found}. Check search page structure.")]
    NoListingsAfterFilter { found: usize, skipped: usize },

    #[error("Could not extract product link: {0}")]
    LinkExtraction(String),

    #[error("No reviews found for this product: {0}")]
    NoReviewsFound(String),

    #[error("Invalid selector for {name} ({selector:?}): {reason}")]
    InvalidSelector { name: String, selector: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ScrapeError {
    /// Builds a network error for the given URL.
    pub fn network(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        ScrapeError::Network { url: url.into(), reason: reason.to_string() }
    }
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;

//! Review command: search, open the first product, collect its reviews.

use crate::config::Config;
use crate::error::{Result, ScrapeError};
use crate::flipkart::parser::ReviewPage;
use crate::flipkart::{FlipkartClient, Parser, Query, ReviewRecord, ReviewSource};
use crate::sink::CsvSink;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Pipeline position for one request. Logged on every transition and on failure.
///
/// There is no separate failed state: when a step fails, the stage stays at
/// that step and the error is reported alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    FetchingSearch,
    LocatingProduct,
    FetchingProduct,
    ResolvingReviews,
    FetchingAllReviews,
    Extracting,
    Sunk,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::FetchingSearch => "fetching search page",
            Stage::LocatingProduct => "locating product",
            Stage::FetchingProduct => "fetching product page",
            Stage::ResolvingReviews => "resolving reviews",
            Stage::FetchingAllReviews => "fetching all-reviews page",
            Stage::Extracting => "extracting reviews",
            Stage::Sunk => "reviews saved",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// What the caller gets back: reviews on success, or an empty list and a message.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    pub query: String,
    pub reviews: Vec<ReviewRecord>,
    pub output_file: Option<PathBuf>,
    pub error: Option<String>,
}

impl ReviewResponse {
    fn success(query: &Query, reviews: Vec<ReviewRecord>, output_file: PathBuf) -> Self {
        Self { query: query.to_string(), reviews, output_file: Some(output_file), error: None }
    }

    fn failure(query: &str, err: &ScrapeError) -> Self {
        Self {
            query: query.to_string(),
            reviews: Vec::new(),
            output_file: None,
            error: Some(format!("Something went wrong: {}. Please check the logs for details.", err)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs the review pipeline for one query at a time.
pub struct ReviewCommand {
    config: Config,
    parser: Parser,
}

impl ReviewCommand {
    /// Creates a new review command. Fails if a structural selector does not compile.
    pub fn new(config: Config) -> Result<Self> {
        let parser = Parser::new(&config.selectors, config.skip_listings)?;
        Ok(Self { config, parser })
    }

    /// Scrapes reviews for a raw query using a real HTTP client.
    pub async fn respond(&self, raw_query: &str) -> ReviewResponse {
        match FlipkartClient::new(&self.config) {
            Ok(client) => self.respond_with_client(&client, raw_query).await,
            Err(e) => {
                error!("Failed to create HTTP client: {}", e);
                ReviewResponse::failure(raw_query, &e)
            }
        }
    }

    /// Scrapes reviews with a provided client (for testing).
    ///
    /// Never fails: pipeline errors are logged and folded into the response.
    pub async fn respond_with_client(
        &self,
        client: &impl ReviewSource,
        raw_query: &str,
    ) -> ReviewResponse {
        let query = match Query::new(raw_query) {
            Ok(query) => query,
            Err(e) => {
                error!("Rejected query: {}", e);
                return ReviewResponse::failure(raw_query, &e);
            }
        };

        info!("Search string received: {}", query);

        let mut stage = Stage::Idle;
        let span = info_span!("review_scrape", query = %query);
        let result = self.run(client, &query, &mut stage).instrument(span).await;

        match result {
            Ok((reviews, path)) => {
                info!("Scraping completed. Total reviews collected: {}", reviews.len());
                ReviewResponse::success(&query, reviews, path)
            }
            Err(e) => {
                error!(query = %query, stage = %stage, "Scraping failed: {}", e);
                ReviewResponse::failure(query.as_str(), &e)
            }
        }
    }

    /// Runs every stage in order. `stage` is left at the stage that failed.
    pub async fn run(
        &self,
        client: &impl ReviewSource,
        query: &Query,
        stage: &mut Stage,
    ) -> Result<(Vec<ReviewRecord>, PathBuf)> {
        advance(stage, Stage::FetchingSearch);
        let search_html = client.search(query).await?;

        advance(stage, Stage::LocatingProduct);
        let product_link = self.parser.locate_product(&search_html, client.base_url())?;

        advance(stage, Stage::FetchingProduct);
        let product_html = client.fetch(&product_link).await?;

        advance(stage, Stage::ResolvingReviews);
        let review_html = match self.parser.resolve_reviews(&product_html, client.base_url())? {
            ReviewPage::Inline => product_html,
            ReviewPage::AllReviews(link) => {
                advance(stage, Stage::FetchingAllReviews);
                client.fetch(&link).await?
            }
        };

        advance(stage, Stage::Extracting);
        let records = self.parser.extract_reviews(&review_html, query);

        // Inline pages always have containers; only the all-reviews page can come back empty
        if records.is_empty() {
            warn!("Still no review containers on the all-reviews page");
            return Err(ScrapeError::NoReviewsFound(
                "all-reviews page has no reviews either".to_string(),
            ));
        }

        let mut sink = CsvSink::create(&self.config.output_dir, query)?;
        for record in records {
            sink.push(record)?;
        }

        advance(stage, Stage::Sunk);
        let output = sink.finish()?;

        advance(stage, Stage::Done);
        Ok(output)
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!("{} -> {}", stage, next);
    *stage = next;
}

//! HTML parser for Flipkart search results, product pages and review pages.

use crate::error::{Result, ScrapeError};
use crate::flipkart::models::{ProductLink, Query, ReviewField, ReviewRecord};
use crate::flipkart::selectors::{CompiledSelectors, SelectorTable};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Why a single review field could not be read. Never leaves this module.
#[derive(Debug, Error)]
enum FieldError {
    #[error("selector unusable: {0}")]
    Unavailable(String),

    #[error("no element for path step {0}")]
    MissingStep(usize),

    #[error("no matching element")]
    NoMatch,

    #[error("matched element has no text")]
    Empty,
}

/// Where the reviews for a product live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewPage {
    /// The product page itself has review containers.
    Inline,
    /// The product page has none but links a dedicated reviews page.
    AllReviews(ProductLink),
}

/// Parser for Flipkart HTML pages.
#[derive(Debug)]
pub struct Parser {
    selectors: CompiledSelectors,
    skip_listings: usize,
}

impl Parser {
    /// Creates a parser from a selector table.
    ///
    /// `skip_listings` is the number of leading search containers that are
    /// ads or filter panels rather than products.
    pub fn new(table: &SelectorTable, skip_listings: usize) -> Result<Self> {
        Ok(Self { selectors: table.compile()?, skip_listings })
    }

    /// Finds the first real product on a search results page and returns its URL.
    pub fn locate_product(&self, html: &str, base_url: &str) -> Result<ProductLink> {
        let document = Html::parse_document(html);

        let listings: Vec<ElementRef> = document.select(&self.selectors.listing).collect();
        if listings.is_empty() {
            warn!("No listing containers matched. Check the listing selector.");
            return Err(ScrapeError::NoListingsFound);
        }

        debug!("Found {} listing containers, skipping {}", listings.len(), self.skip_listings);

        let Some(listing) = listings.get(self.skip_listings) else {
            warn!(
                "Only {} listing containers, none left after skipping {}",
                listings.len(),
                self.skip_listings
            );
            return Err(ScrapeError::NoListingsAfterFilter {
                found: listings.len(),
                skipped: self.skip_listings,
            });
        };

        let anchor = descend(*listing, &self.selectors.product_link).map_err(|step| {
            ScrapeError::LinkExtraction(format!(
                "listing has no element for path step {} of {}",
                step + 1,
                self.selectors.product_link.len()
            ))
        })?;

        let href = anchor
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .ok_or_else(|| ScrapeError::LinkExtraction("product anchor has no href".to_string()))?;

        let link = ProductLink::resolve(base_url, href);
        debug!("Found product link: {}", link);
        Ok(link)
    }

    /// Returns every review container on a page.
    pub fn review_containers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&self.selectors.review_container).collect()
    }

    /// Returns the absolute URL of the "all reviews" page, if the page links one.
    pub fn all_reviews_link(&self, document: &Html, base_url: &str) -> Option<ProductLink> {
        let anchor = document.select(&self.selectors.all_reviews_link).next()?;

        match anchor.value().attr("href").map(str::trim).filter(|href| !href.is_empty()) {
            Some(href) => Some(ProductLink::resolve(base_url, href)),
            None => {
                debug!("All-reviews anchor found without href");
                None
            }
        }
    }

    /// Decides where to read reviews from, given a product page.
    pub fn resolve_reviews(&self, html: &str, base_url: &str) -> Result<ReviewPage> {
        let document = Html::parse_document(html);

        let count = self.review_containers(&document).len();
        if count > 0 {
            debug!("Found {} review containers on product page", count);
            return Ok(ReviewPage::Inline);
        }

        warn!("No review containers on product page. Looking for an all-reviews link.");
        match self.all_reviews_link(&document, base_url) {
            Some(link) => {
                info!("Found all-reviews link: {}", link);
                Ok(ReviewPage::AllReviews(link))
            }
            None => Err(ScrapeError::NoReviewsFound(
                "product page has no reviews and no all-reviews link".to_string(),
            )),
        }
    }

    /// Extracts one record per review container on the page, in document order.
    pub fn extract_reviews(&self, html: &str, query: &Query) -> Vec<ReviewRecord> {
        let document = Html::parse_document(html);

        self.review_containers(&document)
            .into_iter()
            .enumerate()
            .map(|(index, container)| self.extract_review(container, query, index))
            .collect()
    }

    /// Extracts a single review. Fields that cannot be read get their placeholder.
    pub fn extract_review(
        &self,
        container: ElementRef,
        query: &Query,
        index: usize,
    ) -> ReviewRecord {
        let [name, rating, heading, comment] = ReviewField::ALL.map(|field| {
            self.extract_field(container, field).unwrap_or_else(|e| {
                warn!("Error extracting {} for review {}: {}", field, index, e);
                field.placeholder().to_string()
            })
        });

        trace!("Review {}: {} / {} / {}", index, name, rating, heading);

        ReviewRecord { product: query.to_string(), name, rating, heading, comment }
    }

    fn extract_field(
        &self,
        container: ElementRef,
        field: ReviewField,
    ) -> std::result::Result<String, FieldError> {
        let lookup =
            self.selectors.field(field).map_err(|reason| FieldError::Unavailable(reason.into()))?;

        let scope = descend(container, &lookup.within).map_err(FieldError::MissingStep)?;
        let element = scope.select(&lookup.select).next().ok_or(FieldError::NoMatch)?;

        let text = element_text(element);
        if text.is_empty() {
            return Err(FieldError::Empty);
        }

        Ok(text)
    }
}

/// Walks `steps`, taking the first matching descendant at each one.
/// On failure returns the index of the step that matched nothing.
fn descend<'a>(
    start: ElementRef<'a>,
    steps: &[Selector],
) -> std::result::Result<ElementRef<'a>, usize> {
    steps
        .iter()
        .enumerate()
        .try_fold(start, |current, (i, step)| current.select(step).next().ok_or(i))
}

/// Text content with whitespace runs collapsed, so a field always fits on one line.
fn element_text(element: ElementRef) -> String {
    let text = element.text().collect::<String>();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

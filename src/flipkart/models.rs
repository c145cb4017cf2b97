//! Data models for queries, product links and review records.

use crate::error::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A search query with all whitespace removed.
///
/// Doubles as the output file stem, so it must be non-empty and free of
/// path separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    /// Normalizes raw user input into a query.
    pub fn new(raw: &str) -> Result<Self> {
        let normalized: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

        if normalized.is_empty()
            || normalized == "."
            || normalized == ".."
            || normalized.contains(['/', '\\'])
        {
            return Err(ScrapeError::InvalidQuery(raw.to_string()));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the CSV file this query's reviews are written to.
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.0)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absolute URL of a page reached from a relative link on another page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLink(String);

impl ProductLink {
    /// Joins an href found in a document with the site base URL.
    pub fn resolve(base_url: &str, href: &str) -> Self {
        if href.starts_with("http://") || href.starts_with("https://") {
            Self(href.to_string())
        } else {
            Self(format!("{}{}", base_url.trim_end_matches('/'), href))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The four text fields pulled out of every review container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewField {
    Name,
    Rating,
    Heading,
    Comment,
}

impl ReviewField {
    /// All fields, in CSV column order.
    pub const ALL: [ReviewField; 4] =
        [ReviewField::Name, ReviewField::Rating, ReviewField::Heading, ReviewField::Comment];

    /// Text substituted when extraction fails.
    pub fn placeholder(self) -> &'static str {
        match self {
            ReviewField::Name => "No Name",
            ReviewField::Rating => "No Rating",
            ReviewField::Heading => "No Comment Heading",
            ReviewField::Comment => "No Comment",
        }
    }

    /// Key used in the selector table.
    pub fn key(self) -> &'static str {
        match self {
            ReviewField::Name => "name",
            ReviewField::Rating => "rating",
            ReviewField::Heading => "heading",
            ReviewField::Comment => "comment",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ReviewField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One customer review. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Query the review was collected for
    pub product: String,
    /// Reviewer name
    pub name: String,
    /// Star rating as displayed
    pub rating: String,
    /// Review title
    pub heading: String,
    /// Review body
    pub comment: String,
}

impl ReviewRecord {
    /// Fields in CSV column order.
    pub fn to_row(&self) -> [&str; 5] {
        [
            self.product.as_str(),
            self.name.as_str(),
            self.rating.as_str(),
            self.heading.as_str(),
            self.comment.as_str(),
        ]
    }

    /// Returns the value of an extracted field.
    pub fn get(&self, field: ReviewField) -> &str {
        match field {
            ReviewField::Name => &self.name,
            ReviewField::Rating => &self.rating,
            ReviewField::Heading => &self.heading,
            ReviewField::Comment => &self.comment,
        }
    }

    /// True if the field holds its placeholder rather than extracted text.
    pub fn is_placeholder(&self, field: ReviewField) -> bool {
        self.get(field) == field.placeholder()
    }
}

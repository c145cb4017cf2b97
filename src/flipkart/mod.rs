//! Flipkart-specific modules for HTTP client, parsing, selectors and data models.

pub mod client;
pub mod models;
pub mod parser;
pub mod selectors;

pub use client::{FlipkartClient, ReviewSource};
pub use models::{ProductLink, Query, ReviewField, ReviewRecord};
pub use parser::Parser;
pub use selectors::SelectorTable;

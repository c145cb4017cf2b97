//! fk-reviews - Flipkart customer review scraper
//!
//! Searches Flipkart for a query, opens the first product, collects its
//! customer reviews and writes them to `<output_dir>/<query>.csv`.

pub mod commands;
pub mod config;
pub mod error;
pub mod flipkart;
pub mod format;
pub mod sink;

pub use commands::{ReviewCommand, ReviewResponse};
pub use config::Config;
pub use error::ScrapeError;
pub use flipkart::models::{Query, ReviewRecord};

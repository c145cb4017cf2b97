//! Per-query CSV output.
//!
//! Rows are comma-joined without quoting, matching the files downstream
//! tooling already reads. A comma inside a field shifts the columns of that row.

use crate::error::Result;
use crate::flipkart::models::{Query, ReviewRecord};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Header row of every review file.
pub const CSV_HEADER: [&str; 5] = ["Product", " Customer Name", " Rating", " Heading", " Comment"];

/// Collects review records in memory while writing each one to `<dir>/<query>.csv`.
pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    records: Vec<ReviewRecord>,
}

impl CsvSink {
    /// Creates the output directory if needed and truncates the query's file.
    pub fn create(output_dir: &Path, query: &Query) -> Result<Self> {
        fs::create_dir_all(output_dir)?;

        let path = output_dir.join(query.file_name());
        debug!("Writing reviews to {}", path.display());

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_path(&path)?;

        writer.write_record(CSV_HEADER)?;

        Ok(Self { writer, path, records: Vec::new() })
    }

    /// Appends a record to the result set and writes its row.
    pub fn push(&mut self, record: ReviewRecord) -> Result<()> {
        self.writer.write_record(record.to_row())?;
        self.records.push(record);
        Ok(())
    }

    /// Flushes the file and hands back the records in the order they were written.
    pub fn finish(mut self) -> Result<(Vec<ReviewRecord>, PathBuf)> {
        self.writer.flush()?;
        info!("Saved {} reviews to {}", self.records.len(), self.path.display());
        Ok((self.records, self.path))
    }
}

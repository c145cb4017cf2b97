//! Output formatting for reviews (table, JSON, markdown, CSV).

use crate::commands::ReviewResponse;
use crate::config::OutputFormat;
use crate::flipkart::ReviewRecord;

/// Formats review results for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a full response. Failed responses render as their error message,
    /// except JSON, which always serializes the whole response.
    pub fn format_response(&self, response: &ReviewResponse) -> String {
        if self.format == OutputFormat::Json {
            return serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string());
        }

        if let Some(error) = &response.error {
            return error.clone();
        }

        let mut output = self.format_reviews(&response.reviews);

        if let (Some(path), OutputFormat::Table | OutputFormat::Markdown) =
            (&response.output_file, self.format)
        {
            output.push_str(&format!("\nSaved to: {}", path.display()));
        }

        output
    }

    /// Formats a list of reviews.
    pub fn format_reviews(&self, reviews: &[ReviewRecord]) -> String {
        if reviews.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => self.csv_header(),
                _ => "No reviews found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_reviews(reviews),
            OutputFormat::Table => self.table_reviews(reviews),
            OutputFormat::Markdown => self.markdown_reviews(reviews),
            OutputFormat::Csv => self.csv_reviews(reviews),
        }
    }

    // JSON formatting

    fn json_reviews(&self, reviews: &[ReviewRecord]) -> String {
        serde_json::to_string_pretty(reviews).unwrap_or_else(|_| "[]".to_string())
    }

    // Table formatting

    fn table_reviews(&self, reviews: &[ReviewRecord]) -> String {
        let name_width = 20;
        let rating_width = 9;
        let heading_width = 30;
        let comment_width = 60;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<name_width$}  {:<rating_width$}  {:<heading_width$}  {}",
            "Name", "Rating", "Heading", "Comment"
        ));
        lines.push(format!(
            "{:-<name_width$}  {:-<rating_width$}  {:-<heading_width$}  {:-<comment_width$}",
            "", "", "", ""
        ));

        for review in reviews {
            lines.push(format!(
                "{:<name_width$}  {:<rating_width$}  {:<heading_width$}  {}",
                truncate(&review.name, name_width),
                truncate(&review.rating, rating_width),
                truncate(&review.heading, heading_width),
                truncate(&review.comment, comment_width)
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} reviews", reviews.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_reviews(&self, reviews: &[ReviewRecord]) -> String {
        let mut lines = Vec::new();

        lines.push("| Name | Rating | Heading | Comment |".to_string());
        lines.push("|------|--------|---------|---------|".to_string());

        for review in reviews {
            lines.push(format!(
                "| {} | {} | {} | {} |",
                markdown_escape(&review.name),
                markdown_escape(&review.rating),
                markdown_escape(&review.heading),
                markdown_escape(&truncate(&review.comment, 120))
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} reviews found*", reviews.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        "product,name,rating,heading,comment".to_string()
    }

    fn csv_reviews(&self, reviews: &[ReviewRecord]) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        for review in reviews {
            let row: Vec<String> = review.to_row().iter().map(|f| Self::csv_escape(f)).collect();
            lines.push(row.join(","));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

/// Shortens to at most `width` characters, marking the cut with "...".
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let kept: String = s.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn markdown_escape(s: &str) -> String {
    s.replace('|', "\\|")
}

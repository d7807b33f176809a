//! Royalty statement fixtures

use royalty_engine::ProcessSummaryOptions;

pub const ARTIST_ID: &str = "artist-1";

/// Options for the default test artist, Q1 2024
pub fn options(csv_content: impl Into<String>) -> ProcessSummaryOptions {
    ProcessSummaryOptions::new(ARTIST_ID, 2024, 1, csv_content)
}

/// Builds statement CSV text line by line
pub struct StatementBuilder {
    lines: Vec<String>,
}

impl StatementBuilder {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            lines: vec![headers.join(",")],
        }
    }

    /// Standard export layout
    pub fn standard() -> Self {
        Self::new(&[
            "Song Title", "ISWC", "Composer", "Date", "Territory", "Source", "Usage Count", "Gross",
            "Admin %", "Net",
        ])
    }

    pub fn row(mut self, fields: &[&str]) -> Self {
        self.lines.push(fields.join(","));
        self
    }

    pub fn build(self) -> String {
        let mut csv = self.lines.join("\n");
        csv.push('\n');
        csv
    }
}

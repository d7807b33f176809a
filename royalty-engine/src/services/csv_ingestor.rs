//! CSV ingestion
//!
//! Parses the whole export up front into an in-memory row list. Later stages
//! walk the rows more than once (title collection, then aggregation), so
//! nothing here is lazy.

use indexmap::IndexMap;
use royalty_common::Result;
use tracing::debug;

/// One data line keyed by source header, in header order
///
/// Short lines simply lack the trailing keys.
pub type RawRow = IndexMap<String, String>;

/// Parsed export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestedCsv {
    /// Header line, each trimmed; blank headers are kept as empty strings
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Parse raw export text
///
/// The first line is the header. Lines whose fields are all blank are
/// skipped. Malformed or short lines are kept; fields past the last header
/// are dropped. When two columns share a header the first one wins.
pub fn ingest(content: &str) -> Result<IngestedCsv> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut records = reader.records();

    let headers: Vec<String> = match records.next() {
        Some(first) => first?.iter().map(|h| h.trim().to_string()).collect(),
        None => return Ok(IngestedCsv::default()),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let mut row = RawRow::with_capacity(headers.len());
        for (header, value) in headers.iter().zip(record.iter()) {
            row.entry(header.clone()).or_insert_with(|| value.to_string());
        }
        rows.push(row);
    }

    debug!("Ingested {} headers, {} data rows", headers.len(), rows.len());

    Ok(IngestedCsv { headers, rows })
}

//! Column mapping
//!
//! Royalty exports from different societies and distributors spell the same
//! column many ways. Each canonical field has an ordered list of known
//! spellings; the first spelling found among the headers wins.
//!
//! Matching order per field:
//! 1. Exact, case-sensitive match against the spelling list
//! 2. Case-insensitive match against the same list
//! 3. `UsageCount` only: the first blank header (some exports ship the usage
//!    column unlabeled between "Source" and "Gross")

use std::fmt;
use tracing::{debug, warn};

use super::csv_ingestor::RawRow;

/// Canonical statement fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    SongTitle,
    Iswc,
    Composer,
    Date,
    Territory,
    Source,
    UsageCount,
    Gross,
    AdminPercent,
    Net,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 10] = [
        CanonicalField::SongTitle,
        CanonicalField::Iswc,
        CanonicalField::Composer,
        CanonicalField::Date,
        CanonicalField::Territory,
        CanonicalField::Source,
        CanonicalField::UsageCount,
        CanonicalField::Gross,
        CanonicalField::AdminPercent,
        CanonicalField::Net,
    ];

    /// Known header spellings, most specific first
    pub fn variations(self) -> &'static [&'static str] {
        match self {
            CanonicalField::SongTitle => &[
                "Song Title",
                "Song",
                "Title",
                "Track Title",
                "Track",
                "Song Name",
                "Track Name",
                "Work Title",
            ],
            CanonicalField::Iswc => &["ISWC", "ISWC Code", "Work ISWC"],
            CanonicalField::Composer => &["Composer", "Composers", "Writer", "Writers", "Songwriter"],
            CanonicalField::Date => &[
                "Date",
                "Usage Date",
                "Period",
                "Sales Date",
                "Transaction Date",
                "Statement Date",
            ],
            CanonicalField::Territory => &["Territory", "Country", "Region", "Market"],
            CanonicalField::Source => &["Source", "Platform", "Service", "DSP", "Store", "Channel"],
            CanonicalField::UsageCount => &[
                "Usage Count",
                "Usage",
                "Units",
                "Plays",
                "Streams",
                "Quantity",
                "Count",
            ],
            CanonicalField::Gross => &["Gross", "Gross Amount", "Gross Revenue", "Revenue", "Amount"],
            CanonicalField::AdminPercent => &["Admin %", "Admin Percent", "Admin Fee %", "Admin Fee", "Admin"],
            CanonicalField::Net => &["Net", "Net Amount", "Net Revenue", "Royalty", "Payable"],
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CanonicalField::SongTitle => "songTitle",
            CanonicalField::Iswc => "iswc",
            CanonicalField::Composer => "composer",
            CanonicalField::Date => "date",
            CanonicalField::Territory => "territory",
            CanonicalField::Source => "source",
            CanonicalField::UsageCount => "usageCount",
            CanonicalField::Gross => "gross",
            CanonicalField::AdminPercent => "adminPercent",
            CanonicalField::Net => "net",
        };
        f.write_str(name)
    }
}

/// Canonical field → source header, built once per run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    headers: [Option<String>; 10],
}

impl ColumnMapping {
    /// Header bound to `field`, if any
    pub fn header(&self, field: CanonicalField) -> Option<&str> {
        self.headers[field.index()].as_deref()
    }

    pub fn is_mapped(&self, field: CanonicalField) -> bool {
        self.headers[field.index()].is_some()
    }

    /// Trimmed row value for `field`; empty when unbound or missing from the row
    pub fn value<'a>(&self, row: &'a RawRow, field: CanonicalField) -> &'a str {
        self.header(field)
            .and_then(|header| row.get(header))
            .map(|value| value.trim())
            .unwrap_or("")
    }

    /// Trimmed, non-empty row value for `field`
    pub fn non_empty<'a>(&self, row: &'a RawRow, field: CanonicalField) -> Option<&'a str> {
        Some(self.value(row, field)).filter(|v| !v.is_empty())
    }

    fn bind(&mut self, field: CanonicalField, header: &str) {
        self.headers[field.index()] = Some(header.to_string());
    }
}

/// Infer the mapping from a header line
pub fn infer_mapping(headers: &[String]) -> ColumnMapping {
    let mut mapping = ColumnMapping::default();

    for field in CanonicalField::ALL {
        if let Some(header) = match_header(headers, field.variations()) {
            mapping.bind(field, header);
        }
    }

    if !mapping.is_mapped(CanonicalField::UsageCount) {
        if let Some(blank) = headers.iter().find(|h| h.trim().is_empty()) {
            debug!("Binding unlabeled column to usageCount");
            mapping.bind(CanonicalField::UsageCount, blank);
        }
    }

    for field in CanonicalField::ALL {
        match mapping.header(field) {
            Some(header) => debug!("Column {} -> {:?}", field, header),
            None if field != CanonicalField::SongTitle => {
                warn!("No column found for {}; values default to empty", field)
            }
            None => {}
        }
    }

    mapping
}

fn match_header<'h>(headers: &'h [String], variations: &[&str]) -> Option<&'h str> {
    let exact = variations
        .iter()
        .find_map(|variation| headers.iter().find(|h| h.as_str() == *variation));
    if let Some(header) = exact {
        return Some(header);
    }

    variations
        .iter()
        .find_map(|variation| {
            headers
                .iter()
                .find(|h| h.trim().to_lowercase() == variation.to_lowercase())
        })
        .map(String::as_str)
}

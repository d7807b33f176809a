//! Engine input

use serde::{Deserialize, Serialize};

use crate::error::{SummaryError, SummaryResult};

/// Input for one summary run
///
/// The caller has already authorized `artist_id`; the engine does not check
/// ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSummaryOptions {
    pub artist_id: String,
    pub year: i32,
    /// Reporting quarter, 1-4
    pub quarter: u8,
    /// Raw royalty export text
    pub csv_content: String,
    #[serde(default)]
    pub upload_id: Option<String>,
}

impl ProcessSummaryOptions {
    pub fn new(artist_id: impl Into<String>, year: i32, quarter: u8, csv_content: impl Into<String>) -> Self {
        Self {
            artist_id: artist_id.into(),
            year,
            quarter,
            csv_content: csv_content.into(),
            upload_id: None,
        }
    }

    pub fn with_upload_id(mut self, upload_id: impl Into<String>) -> Self {
        self.upload_id = Some(upload_id.into());
        self
    }

    /// Reject options no run could succeed with
    pub fn validate(&self) -> SummaryResult<()> {
        if self.artist_id.trim().is_empty() {
            return Err(SummaryError::InvalidOptions("artist id is blank".to_string()));
        }
        if !(1..=4).contains(&self.quarter) {
            return Err(SummaryError::InvalidOptions(format!(
                "quarter must be 1-4, got {}",
                self.quarter
            )));
        }
        if !(1900..=9999).contains(&self.year) {
            return Err(SummaryError::InvalidOptions(format!(
                "year out of range: {}",
                self.year
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(ProcessSummaryOptions::new("artist-1", 2024, 1, "").validate().is_ok());
        assert!(ProcessSummaryOptions::new("artist-1", 2024, 4, "").validate().is_ok());

        for bad in [
            ProcessSummaryOptions::new("  ", 2024, 1, ""),
            ProcessSummaryOptions::new("artist-1", 2024, 0, ""),
            ProcessSummaryOptions::new("artist-1", 2024, 5, ""),
            ProcessSummaryOptions::new("artist-1", 24, 2, ""),
        ] {
            assert!(
                matches!(bad.validate(), Err(SummaryError::InvalidOptions(_))),
                "expected rejection for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{"artistId":"a1","year":2023,"quarter":3,"csvContent":"Song Title\nX","uploadId":"u-9"}"#;
        let options: ProcessSummaryOptions = serde_json::from_str(json).unwrap();

        assert_eq!(options.artist_id, "a1");
        assert_eq!(options.quarter, 3);
        assert_eq!(options.upload_id.as_deref(), Some("u-9"));
    }
}

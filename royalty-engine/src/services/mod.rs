//! Service modules for the royalty summary pipeline
//!
//! One module per stage, in run order:
//! - `csv_ingestor`: statement text → header line + rows
//! - `column_mapper`: headers → canonical field bindings
//! - `track_resolver`: distinct titles → track ids (bulk find, then create)
//! - `aggregation`: rows → per-track running totals
//! - `distribution`: totals → shares, top items, rates
//! - `summary_writer`: batched idempotent upsert
//! - `failed_rows`: rejected row collection and CSV export
//! - `orchestrator`: sequences the stages for one run

pub mod aggregation;
pub mod column_mapper;
pub mod csv_ingestor;
pub mod distribution;
pub mod failed_rows;
pub mod orchestrator;
pub mod summary_writer;
pub mod track_resolver;

pub use aggregation::{aggregate_rows, month_label, AggregationEngine, BreakdownEntry, TrackAggregation};
pub use column_mapper::{infer_mapping, CanonicalField, ColumnMapping};
pub use csv_ingestor::{ingest, IngestedCsv, RawRow};
pub use distribution::{compute_metrics, distribution, top_item, TrackMetrics};
pub use failed_rows::{export_failed_rows_csv, FailedRowCollector, RowFailure};
pub use orchestrator::SummaryEngine;
pub use summary_writer::{SummaryWriter, WriteReport};
pub use track_resolver::{resolve_tracks, TrackResolution};

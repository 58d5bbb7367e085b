//! Catalog pipeline.
//!
//! - Ingest flow (scraper output → per-spec upsert → report)
//! - Comparison (offerings + usage → ranked cost report)

pub mod compare;
pub mod ingest;

pub use compare::{
    compare, compare_models, ComparisonReport, ComparisonRequest, ComparisonSummary,
    ModelComparison, OfferingPricing, UsageScenario,
};
pub use ingest::{ingest, upsert_offering, IngestFailure, IngestReport, UpsertOutcome};

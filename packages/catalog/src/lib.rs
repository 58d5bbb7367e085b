//! Normalized Model-Pricing Catalog
//!
//! Ingests pricing and capability data for hosted model offerings,
//! normalizes it into providers, models and offerings, and computes
//! ranked cost comparisons over the result.
//!
//! # Usage
//!
//! ```rust,ignore
//! use catalog::{ingest, compare_models, ComparisonRequest, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let specs = scraper.scrape().await?;
//! let report = ingest(&store, scraper.name(), &specs).await;
//!
//! let request = ComparisonRequest::new(["gpt-4o", "claude-3-opus"]);
//! let comparison = compare_models(&store, &request).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (CatalogStore, Scraper)
//! - [`types`] - Providers, models, offerings and scraped specs
//! - [`pipeline`] - Ingestion and comparison
//! - [`registry`] - Named scraper factories and discovery
//! - [`stores`] - Storage implementations (MemoryStore, SqliteStore, PostgresStore)
//! - [`testing`] - Mock scrapers for testing

pub mod error;
pub mod pipeline;
pub mod registry;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{CatalogError, ScrapeError};
pub use traits::{
    scraper::Scraper,
    store::{CatalogStore, CatalogTransaction, DEFAULT_LIST_LIMIT},
};
pub use types::{
    filter::OfferingFilter,
    id::{Id, ModelId, OfferingId, ProviderId},
    modality::{Modality, ModalitySet},
    offering::{CatalogCounts, DiscountWindow, Model, NewProvider, Offering, OfferingFields, OfferingView, Provider},
    spec::OfferingSpec,
};

pub use pipeline::{
    // Ingest
    ingest, upsert_offering, IngestFailure, IngestReport, UpsertOutcome,
    // Comparison
    compare, compare_models, ComparisonReport, ComparisonRequest, ComparisonSummary,
    ModelComparison, OfferingPricing, UsageScenario,
};
pub use registry::{DiscoveredScraper, ScraperRegistry};

// Re-export stores
pub use stores::MemoryStore;

#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;

#[cfg(feature = "postgres")]
pub use stores::PostgresStore;

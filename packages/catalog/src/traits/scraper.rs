//! Scraper trait for pluggable offering extraction.
//!
//! A scraper is an independent, swappable extraction unit: it fetches
//! pricing data from one source and returns it as [`OfferingSpec`]s.
//! How it does so (HTML parsing, APIs, static tables) is its own business.
//!
//! # Usage
//!
//! ```rust,ignore
//! use catalog::traits::scraper::Scraper;
//!
//! let specs = scraper.scrape().await?;
//! let report = catalog::ingest(&store, scraper.name(), &specs).await;
//! ```

use async_trait::async_trait;

use crate::error::ScrapeResult;
use crate::types::spec::OfferingSpec;

/// An extraction unit.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Stable identity used in logs and job names.
    fn name(&self) -> &str;

    /// Extract the source's current offerings.
    ///
    /// Implementations that block (page rendering, synchronous parsing)
    /// should move that work onto `tokio::task::spawn_blocking`.
    async fn scrape(&self) -> ScrapeResult<Vec<OfferingSpec>>;
}
